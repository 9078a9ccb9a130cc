use crate::module::options::{HttpOptions, TokenOptions};
use structopt::StructOpt;

/// Options for the auth module
#[derive(Debug, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub http: HttpOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub token: TokenOptions,
}
