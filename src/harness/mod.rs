//! Runtime harness to execute modules and their background jobs

mod broker;
mod consumer;
mod heart;
mod module;

pub use broker::*;
pub use consumer::*;
pub use heart::*;
pub use module::*;
