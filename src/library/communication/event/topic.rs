use std::fmt;

const WORD_SEPARATOR: char = '.';
const SINGLE_WORD_WILDCARD: &str = "*";
const MULTI_WORD_WILDCARD: &str = "#";

/// Describes the family of routing keys a [`Notification`](super::Notification) type is published under
///
/// Routing keys have the form `<prefix>.<suffix>` where the prefix is fixed per notification type
/// (e.g. `client.details`) and the suffix identifies the individual subject (e.g. `elonmusk`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDescriptor {
    prefix: String,
}

impl TopicDescriptor {
    /// Creates a new instance from a dot separated prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Fixed part of all routing keys within this topic
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Routing key for a single subject within this topic
    pub fn routing_key(&self, suffix: &str) -> String {
        format!("{}{}{}", self.prefix, WORD_SEPARATOR, suffix)
    }

    /// Pattern which matches every routing key within this topic
    pub fn binding(&self) -> TopicPattern {
        TopicPattern::new(format!(
            "{}{}{}",
            self.prefix, WORD_SEPARATOR, MULTI_WORD_WILDCARD
        ))
    }
}

/// Binding pattern for routing keys on a topic exchange
///
/// Patterns consist of dot separated words. A `*` word matches exactly one word of the routing key
/// while a `#` word matches zero or more words. All other words have to match literally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPattern {
    raw: String,
}

impl TopicPattern {
    /// Creates a new pattern from its textual representation
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Textual representation of the pattern
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the given routing key is matched by this pattern
    pub fn matches(&self, routing_key: &str) -> bool {
        let pattern: Vec<&str> = self.raw.split(WORD_SEPARATOR).collect();
        let key: Vec<&str> = routing_key.split(WORD_SEPARATOR).collect();

        matches_words(&pattern, &key)
    }

    /// Glob pattern that selects a superset of the routing keys this pattern matches
    ///
    /// Glob based transports (e.g. Redis `PSUBSCRIBE`) have no notion of words, so everything from the
    /// first wildcard onwards is collapsed into a single `*`. Deliveries have to be re-filtered using
    /// [`matches`](TopicPattern::matches) afterwards.
    pub fn to_glob(&self) -> String {
        let mut literal = Vec::new();

        for word in self.raw.split(WORD_SEPARATOR) {
            if word == SINGLE_WORD_WILDCARD || word == MULTI_WORD_WILDCARD {
                return format!("{}*", escape_glob(&literal.join(".")));
            }

            literal.push(word);
        }

        escape_glob(&self.raw)
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn matches_words(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&MULTI_WORD_WILDCARD, rest)) => {
            (0..=key.len()).any(|skipped| matches_words(rest, &key[skipped..]))
        }
        Some((word, rest)) => match key.split_first() {
            Some((candidate, key_rest)) => {
                (*word == SINGLE_WORD_WILDCARD || word == candidate)
                    && matches_words(rest, key_rest)
            }
            None => false,
        },
    }
}

fn escape_glob(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for c in input.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}
