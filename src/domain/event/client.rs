use super::DetailFact;
use crate::library::communication::event::{Notification, TopicDescriptor};
use crate::library::helpers::slugify;
use serde::{Deserialize, Serialize};

const TOPIC: &str = "client.details";

/// Role of a client within their company became known
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientFunctionNotification {
    /// Name of the client
    pub name: String,
    /// Role of the client within their company
    pub functie_in_companie: String,
}

impl Notification for ClientFunctionNotification {
    fn topic() -> TopicDescriptor {
        TopicDescriptor::new(TOPIC)
    }

    fn routing_suffix(&self) -> String {
        slugify(&self.name)
    }
}

impl DetailFact for ClientFunctionNotification {
    fn subject(&self) -> &str {
        &self.name
    }

    fn into_value(self) -> String {
        self.functie_in_companie
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn route_by_slugified_name() {
        let fact = ClientFunctionNotification {
            name: "Elon Musk".into(),
            functie_in_companie: "CEO".into(),
        };

        assert_eq!(fact.routing_key(), "client.details.elonmusk");
    }

    #[test]
    fn tolerate_unknown_fields() {
        let fact: ClientFunctionNotification = serde_json::from_str(
            r#"{"name":"Elon Musk","functie_in_companie":"CEO","since":2008}"#,
        )
        .unwrap();

        assert_eq!(fact.into_value(), "CEO");
    }
}
