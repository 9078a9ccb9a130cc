//! Various small helper functions

mod backoff;

pub use backoff::Backoff;

use std::num::ParseIntError;
use std::time::Duration;

/// Parses a Duration from a string containing seconds.
/// Useful for command line parsing
pub fn parse_seconds(src: &str) -> Result<Duration, ParseIntError> {
    let seconds = src.parse::<u64>()?;
    Ok(Duration::from_secs(seconds))
}

/// Parses a Duration from a string containing milliseconds.
/// Useful for command line parsing
pub fn parse_millis(src: &str) -> Result<Duration, ParseIntError> {
    let millis = src.parse::<u64>()?;
    Ok(Duration::from_millis(millis))
}

/// Reduces a name to lowercase alphanumeric characters so it can be embedded into a routing key
///
/// `"Elon Musk"` becomes `"elonmusk"`. Names without any alphanumeric character collapse to `"_"`
/// so that the resulting routing key never contains an empty word.
pub fn slugify(input: &str) -> String {
    let slug: String = input
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();

    if slug.is_empty() {
        "_".into()
    } else {
        slug
    }
}
