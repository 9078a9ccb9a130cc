use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of subject a search is about, determines which service role answers it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
    /// A person, answered by the client service
    Client,
    /// A company, answered by the company service
    Companie,
}

/// Raised when parsing an unknown [`SubjectKind`]
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid search type '{0}', must be 'Client' or 'Companie'")]
pub struct UnknownSubjectKind(pub String);

impl SubjectKind {
    /// Textual representation as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Client => "Client",
            SubjectKind::Companie => "Companie",
        }
    }

    /// Path under which the responsible service answers searches
    pub fn search_path(&self) -> &'static str {
        match self {
            SubjectKind::Client => "/customers",
            SubjectKind::Companie => "/companies",
        }
    }
}

impl FromStr for SubjectKind {
    type Err = UnknownSubjectKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Client" => Ok(SubjectKind::Client),
            "Companie" => Ok(SubjectKind::Companie),
            other => Err(UnknownSubjectKind(other.to_owned())),
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod does {
    use super::*;

    #[test]
    fn parse_wire_names_exactly() {
        assert_eq!("Client".parse(), Ok(SubjectKind::Client));
        assert_eq!("Companie".parse(), Ok(SubjectKind::Companie));
        assert_eq!(
            "company".parse::<SubjectKind>(),
            Err(UnknownSubjectKind("company".into()))
        );
    }

    #[test]
    fn serialize_as_wire_name() {
        assert_eq!(
            serde_json::to_string(&SubjectKind::Companie).unwrap(),
            "\"Companie\""
        );
    }
}
