use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Query for information which is answered synchronously
///
/// Processing a request may have side effects (like publishing a fact about the requested subject)
/// but those have to be idempotent since callers are free to repeat a request.
pub trait Request: Serialize + DeserializeOwned + Debug {
    /// Expected response type
    type Response: Serialize + DeserializeOwned + Debug + PartialEq;

    /// Path under which processors of this request are reachable
    const PATH: &'static str;
}
