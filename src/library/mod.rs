//! Independent and project agnostic libraries
//!
//! Any of the submodules in this module could be extracted into their own crate. They have been
//! developed with crosslink in mind but everything domain specific lives in the [`domain`](super::domain) module.

pub mod communication;
pub mod helpers;
pub mod http;

/// Generic error type
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result with no value and a [`BoxedError`]
pub type EmptyResult = Result<(), BoxedError>;
