//! Requests exchanged synchronously between the service roles

mod valuation;
mod wealth;

pub use valuation::{CompanyValuationRequest, CompanyValuationResponse};
pub use wealth::{ClientWealthRequest, ClientWealthResponse};
