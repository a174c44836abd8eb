use serde::{Deserialize, Serialize};

/// An active task as returned by the sync endpoint. Request-scoped copy;
/// the remote service owns the entity.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub id: u64,
    pub content: String,
    /// Due date/time in the service's string format, when the task has one.
    #[serde(default)]
    pub due_date: Option<String>,
    /// IDs of the labels attached to the task.
    #[serde(default)]
    pub labels: Vec<u64>,
    /// 1 (natural) through 4 (highest).
    #[serde(default = "natural_priority")]
    pub priority: u8,
}

fn natural_priority() -> u8 {
    1
}

/// A label known to the account. Used only as a name → id lookup table.
#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub id: u64,
    pub name: String,
}

/// Fields staged for a task creation. Optional fields are omitted from the
/// serialized form entirely rather than sent as empty values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemFields {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<u64>>,
}

impl ItemFields {
    pub fn with_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            ..Self::default()
        }
    }
}
