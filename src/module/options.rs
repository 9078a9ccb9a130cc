//! Various options usable by modules
//!
//! The structs in this module allow other modules to flatten them into
//! their own options struct. This allows for a unified yet non-cluttered
//! option set.

use crate::library::communication::correlation::{
    DEFAULT_EARLY_FACT_CAPACITY, DEFAULT_EARLY_FACT_TTL,
};
use crate::library::helpers::{parse_millis, parse_seconds};
use std::str::FromStr;
use std::time::Duration;
use structopt::StructOpt;
use thiserror::Error;

/// Options for connecting to the message broker
#[derive(Debug, StructOpt)]
pub struct BrokerOptions {
    /// Redis server URL used as topic exchange
    #[structopt(
        short = "r",
        long = "redis",
        env = "REDIS",
        default_value = "redis://localhost:6379/",
        value_name = "url"
    )]
    pub url: String,
}

/// What a search does when the asynchronous fact does not arrive in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutBehaviour {
    /// Answer with an error
    Fail,
    /// Answer with the configured fallback value in place of the fact
    Fallback,
}

/// Raised when parsing an unknown [`TimeoutBehaviour`]
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown timeout behaviour '{0}', expected 'fail' or 'fallback'")]
pub struct UnknownTimeoutBehaviour(String);

impl FromStr for TimeoutBehaviour {
    type Err = UnknownTimeoutBehaviour;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(TimeoutBehaviour::Fail),
            "fallback" => Ok(TimeoutBehaviour::Fallback),
            _ => Err(UnknownTimeoutBehaviour(s.to_owned())),
        }
    }
}

/// Options controlling how asynchronous facts are awaited
#[derive(Debug, StructOpt)]
pub struct CorrelationOptions {
    /// Seconds to wait for the asynchronous fact of a search
    #[structopt(
        long = "correlation-timeout",
        env = "CORRELATION_TIMEOUT",
        default_value = "10",
        parse(try_from_str = parse_seconds),
        value_name = "seconds"
    )]
    pub timeout: Duration,

    /// What to do once the timeout passes: `fail` or `fallback`.
    /// Omitting it uses the default of the service role.
    #[structopt(long, env, value_name = "behaviour")]
    pub on_timeout: Option<TimeoutBehaviour>,

    /// Value substituted for the missing fact when falling back
    #[structopt(long, env, default_value = "Unknown", value_name = "value")]
    pub fallback_value: String,

    /// Maximum number of facts retained while nobody is waiting for them yet.
    /// Setting it to zero drops such facts right away.
    #[structopt(long, env, default_value = "1024")]
    pub early_fact_capacity: usize,

    /// Milliseconds a retained fact stays eligible for pickup
    #[structopt(
        long,
        env,
        default_value = "5000",
        parse(try_from_str = parse_millis),
        value_name = "millis"
    )]
    pub early_fact_ttl: Duration,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            on_timeout: None,
            fallback_value: "Unknown".into(),
            early_fact_capacity: DEFAULT_EARLY_FACT_CAPACITY,
            early_fact_ttl: DEFAULT_EARLY_FACT_TTL,
        }
    }
}

/// Options for the HTTP listener of a module
#[derive(Debug, StructOpt)]
pub struct HttpOptions {
    /// Port on which to listen, defaults to the well-known port of the module
    #[structopt(short, long, env, value_name = "port")]
    pub port: Option<u16>,
}

/// Options for issuing and verifying access tokens
#[derive(Debug, StructOpt)]
pub struct TokenOptions {
    /// Shared secret with which tokens are signed
    #[structopt(
        long = "jwt-secret",
        env = "JWT_SECRET",
        default_value = "123",
        hide_env_values = true,
        value_name = "secret"
    )]
    pub secret: String,

    /// Seconds an issued token stays valid
    #[structopt(
        long = "token-lifetime",
        env = "TOKEN_LIFETIME",
        default_value = "3600",
        parse(try_from_str = parse_seconds),
        value_name = "seconds"
    )]
    pub lifetime: Duration,
}

#[cfg(test)]
mod does {
    use super::*;

    #[test]
    fn parse_timeout_behaviour_case_insensitively() {
        assert_eq!("Fallback".parse(), Ok(TimeoutBehaviour::Fallback));
        assert_eq!("fail".parse(), Ok(TimeoutBehaviour::Fail));
        assert!("retry".parse::<TimeoutBehaviour>().is_err());
    }
}
