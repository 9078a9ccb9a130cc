use super::DetailFact;
use crate::library::communication::event::{Notification, TopicDescriptor};
use crate::library::helpers::slugify;
use serde::{Deserialize, Serialize};

const TOPIC: &str = "company.details";

/// Headcount of a company became known
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyHeadcountNotification {
    /// Name of the company
    pub name: String,
    /// Number of employees
    pub numar_de_angajati: String,
}

impl Notification for CompanyHeadcountNotification {
    fn topic() -> TopicDescriptor {
        TopicDescriptor::new(TOPIC)
    }

    fn routing_suffix(&self) -> String {
        slugify(&self.name)
    }
}

impl DetailFact for CompanyHeadcountNotification {
    fn subject(&self) -> &str {
        &self.name
    }

    fn into_value(self) -> String {
        self.numar_de_angajati
    }
}
