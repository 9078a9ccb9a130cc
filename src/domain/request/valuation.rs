use crate::library::communication::request::Request;
use serde::{Deserialize, Serialize};

/// Asks for the estimated valuation of a company
///
/// Answering it for a known company publishes a
/// [`CompanyHeadcountNotification`](crate::domain::event::CompanyHeadcountNotification).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyValuationRequest {
    /// Name of the company
    pub name: String,
}

/// Response to a [`CompanyValuationRequest`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyValuationResponse {
    /// Estimated valuation
    pub valoare_estimata: String,
}

impl Request for CompanyValuationRequest {
    type Response = CompanyValuationResponse;

    const PATH: &'static str = "/rpc/company-valuation";
}
