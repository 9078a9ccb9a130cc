//! Runnable modules each bundling multiple jobs and providing a unified configuration

pub mod options;

pub mod auth;
pub mod gateway;
pub mod service;
