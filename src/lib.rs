//! This library crate contains everything needed to run a crosslink deployment.
//!
//! A search request enters through the [`gateway`](module::gateway), is routed by subject kind to one of
//! two [backend services](module::service) and answered by joining a synchronous RPC response with a fact
//! that the peer service publishes asynchronously onto a shared topic exchange.
//!
//! Submodules form a chain of dependencies from the low-level, project agnostic [`library`], over the
//! [`domain`] specific structures, through the executable [`harness`], up to the runnable [`modules`](module).

#![deny(missing_docs)]
#![allow(clippy::nonstandard_macro_braces)]

pub mod constants;
pub mod domain;
pub mod harness;
pub mod library;
pub mod module;
