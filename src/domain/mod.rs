//! Domain specific structures, implementations, and logic

mod directory;
mod subject;

pub mod event;
pub mod request;
pub mod search;
pub mod token;

pub use directory::*;
pub use subject::*;
