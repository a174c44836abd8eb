use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String-keyed payload carried by pipeline events.
pub type Payload = Map<String, Value>;

/// An entry on the host's event log. Connectors read payloads as
/// interpolation input and emit new events; they never mutate one in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub payload: Payload,
}

impl PipelineEvent {
    pub fn new(payload: Payload) -> Self {
        Self { payload }
    }

    /// Convenience constructor for a single-field payload.
    pub fn with_field(key: &str, value: Value) -> Self {
        let mut payload = Payload::new();
        payload.insert(key.to_string(), value);
        Self { payload }
    }
}
