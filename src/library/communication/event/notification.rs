use super::TopicDescriptor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Entity to notify other services about a fact that became known
pub trait Notification: Serialize + DeserializeOwned + PartialEq + Debug {
    /// Topic onto which this implementation is published and from which it is consumed
    fn topic() -> TopicDescriptor;

    /// Last word of the routing key which identifies the subject of this instance within its topic
    fn routing_suffix(&self) -> String;

    /// Full routing key under which this instance is published
    fn routing_key(&self) -> String {
        Self::topic().routing_key(&self.routing_suffix())
    }
}
