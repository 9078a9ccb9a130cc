//! Bodies of search requests and their responses

use super::{SubjectKind, UnknownSubjectKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NOT_FOUND_MESSAGE: &str = "Nu s-a găsit niciun rezultat în baza de date.";

/// Search as submitted by a caller, fields are validated after parsing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    /// Kind of subject, either `Client` or `Companie`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Name of the subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Reasons for rejecting a [`SearchRequest`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchValidationError {
    /// Type or name is absent
    #[error("Type and name are required in POST body for /search.")]
    MissingFields,
    /// Name is absent or blank
    #[error("{} name is required in body", subject_label(.0))]
    MissingName(SubjectKind),
    /// Type is not one of the known kinds
    #[error("Invalid search type. Must be 'Client' or 'Companie'.")]
    InvalidKind(#[from] UnknownSubjectKind),
    /// Type is known but answered by another service
    #[error("{actual} searches are not answered here, expected {expected}")]
    WrongKind {
        /// Kind this service answers
        expected: SubjectKind,
        /// Kind that has been requested
        actual: SubjectKind,
    },
}

fn subject_label(kind: &SubjectKind) -> &'static str {
    match kind {
        SubjectKind::Client => "Client",
        SubjectKind::Companie => "Company",
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl SearchRequest {
    /// Creates a well-formed search
    pub fn new(kind: SubjectKind, name: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.as_str().into()),
            name: Some(name.into()),
        }
    }

    /// Validates both fields as required by the gateway for routing
    pub fn route(&self) -> Result<(SubjectKind, &str), SearchValidationError> {
        match (non_blank(&self.kind), non_blank(&self.name)) {
            (Some(kind), Some(name)) => Ok((kind.parse()?, name)),
            _ => Err(SearchValidationError::MissingFields),
        }
    }

    /// Validates the search as received by the service answering `expected` searches
    ///
    /// The name is required while the type may be omitted. When present it has to match.
    pub fn subject(&self, expected: SubjectKind) -> Result<&str, SearchValidationError> {
        if let Some(kind) = non_blank(&self.kind) {
            let actual: SubjectKind = kind.parse()?;

            if actual != expected {
                return Err(SearchValidationError::WrongKind { expected, actual });
            }
        }

        non_blank(&self.name).ok_or(SearchValidationError::MissingName(expected))
    }
}

/// Combined answer of a successful client search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientDetails {
    /// Name of the client
    pub name: String,
    /// Always [`SubjectKind::Client`]
    #[serde(rename = "type")]
    pub kind: SubjectKind,
    /// Wealth, obtained synchronously
    pub avere_detinuta: String,
    /// Role within their company, obtained asynchronously
    pub functie_in_companie: String,
}

/// Combined answer of a successful company search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyDetails {
    /// Name of the company
    pub name: String,
    /// Always [`SubjectKind::Companie`]
    #[serde(rename = "type")]
    pub kind: SubjectKind,
    /// Estimated valuation, obtained synchronously
    pub valoare_estimata: String,
    /// Headcount, obtained asynchronously
    pub numar_de_angajati: String,
}

/// Answer for subjects that are not known
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectNotFound {
    /// Always `false`
    pub found: bool,
    /// Human readable summary
    pub message: String,
    /// What exactly has not been found
    pub details: String,
}

impl SubjectNotFound {
    /// Describes a missing subject of the given kind
    pub fn new(kind: SubjectKind, name: &str) -> Self {
        Self {
            found: false,
            message: NOT_FOUND_MESSAGE.into(),
            details: format!("{} '{}' not found.", subject_label(&kind), name),
        }
    }
}

/// Answer for searches that failed while being processed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchFailure {
    /// Human readable summary
    pub message: String,
    /// Cause of the failure
    pub error: String,
}

#[cfg(test)]
mod does {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(raw: &str) -> SearchRequest {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn route_complete_searches() {
        let search = parse(r#"{"type":"Companie","name":"Tesla"}"#);
        assert_eq!(search.route(), Ok((SubjectKind::Companie, "Tesla")));
    }

    #[test]
    fn refuse_to_route_incomplete_or_unknown_searches() {
        assert_eq!(
            parse(r#"{"name":"Tesla"}"#).route(),
            Err(SearchValidationError::MissingFields)
        );
        assert_eq!(
            parse(r#"{"type":"Client","name":"  "}"#).route(),
            Err(SearchValidationError::MissingFields)
        );
        assert!(matches!(
            parse(r#"{"type":"Person","name":"Elon Musk"}"#).route(),
            Err(SearchValidationError::InvalidKind(_))
        ));
    }

    #[test]
    fn require_only_a_name_for_services() {
        let search = parse(r#"{"name":"Elon Musk"}"#);
        assert_eq!(search.subject(SubjectKind::Client), Ok("Elon Musk"));

        assert_eq!(
            parse("{}").subject(SubjectKind::Client).unwrap_err().to_string(),
            "Client name is required in body"
        );
    }

    #[test]
    fn reject_searches_of_the_other_kind() {
        let search = SearchRequest::new(SubjectKind::Companie, "Tesla");

        assert_eq!(
            search.subject(SubjectKind::Client),
            Err(SearchValidationError::WrongKind {
                expected: SubjectKind::Client,
                actual: SubjectKind::Companie
            })
        );
    }

    #[test]
    fn serialize_details_with_type_tag() {
        let details = ClientDetails {
            name: "Elon Musk".into(),
            kind: SubjectKind::Client,
            avere_detinuta: "$USD 10,000,000".into(),
            functie_in_companie: "CEO".into(),
        };

        assert_eq!(
            serde_json::to_value(&details).unwrap(),
            serde_json::json!({
                "name": "Elon Musk",
                "type": "Client",
                "avere_detinuta": "$USD 10,000,000",
                "functie_in_companie": "CEO"
            })
        );
    }
}
