use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{Command, TodoistApi};
use crate::model::item::{Item, ItemFields, Label};

const SYNC_URL: &str = "https://api.todoist.com/sync/v9/sync";

/// Client for the Todoist sync endpoint. Reads fetch full collections;
/// writes are staged locally and flushed as a command batch by `commit`.
pub struct SyncClient {
    auth_header: String,
    client: reqwest::Client,
    staged: Mutex<Vec<Command>>,
}

impl SyncClient {
    pub fn new(token: String) -> Self {
        Self {
            auth_header: format!("Bearer {token}"),
            client: reqwest::Client::new(),
            staged: Mutex::new(Vec::new()),
        }
    }

    async fn read(&self, resource: &str) -> Result<SyncResponse> {
        let body = json!({
            "sync_token": "*",
            "resource_types": [resource],
        });
        let resp = self
            .client
            .post(SYNC_URL)
            .header("Authorization", &self.auth_header)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Todoist sync read of {resource} failed"))?
            .error_for_status()
            .with_context(|| format!("Todoist rejected the {resource} read"))?;

        resp.json()
            .await
            .context("Failed to parse Todoist sync response")
    }
}

#[derive(Deserialize)]
struct SyncResponse {
    #[serde(default)]
    items: Vec<WireItem>,
    #[serde(default)]
    labels: Vec<WireLabel>,
    #[serde(default)]
    sync_status: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct WireItem {
    id: u64,
    content: String,
    due: Option<WireDue>,
    #[serde(default)]
    labels: Vec<u64>,
    #[serde(default = "natural_priority")]
    priority: u8,
    #[serde(default)]
    checked: bool,
    #[serde(default)]
    is_deleted: bool,
}

fn natural_priority() -> u8 {
    1
}

#[derive(Deserialize)]
struct WireDue {
    date: String,
}

#[derive(Deserialize)]
struct WireLabel {
    id: u64,
    name: String,
}

fn command_envelope(command: &Command) -> Value {
    match command {
        Command::ItemAdd(fields) => json!({
            "type": "item_add",
            "temp_id": Uuid::new_v4().to_string(),
            "uuid": Uuid::new_v4().to_string(),
            "args": fields,
        }),
        Command::ItemComplete { id } => json!({
            "type": "item_complete",
            "uuid": Uuid::new_v4().to_string(),
            "args": { "id": id },
        }),
    }
}

#[async_trait]
impl TodoistApi for SyncClient {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        let resp = self.read("items").await?;
        let items = resp
            .items
            .into_iter()
            .filter(|item| !item.checked && !item.is_deleted)
            .map(|item| Item {
                id: item.id,
                content: item.content,
                due_date: item.due.map(|due| due.date),
                labels: item.labels,
                priority: item.priority,
            })
            .collect();
        Ok(items)
    }

    async fn fetch_labels(&self) -> Result<Vec<Label>> {
        let resp = self.read("labels").await?;
        Ok(resp
            .labels
            .into_iter()
            .map(|label| Label {
                id: label.id,
                name: label.name,
            })
            .collect())
    }

    fn add_item(&self, fields: ItemFields) {
        self.staged.lock().unwrap().push(Command::ItemAdd(fields));
    }

    fn complete_item(&self, id: u64) {
        self.staged.lock().unwrap().push(Command::ItemComplete { id });
    }

    async fn commit(&self) -> Result<()> {
        let staged: Vec<Command> = self.staged.lock().unwrap().drain(..).collect();
        if staged.is_empty() {
            return Ok(());
        }

        let commands: Vec<Value> = staged.iter().map(command_envelope).collect();
        tracing::debug!(count = commands.len(), "committing staged Todoist commands");

        let resp = self
            .client
            .post(SYNC_URL)
            .header("Authorization", &self.auth_header)
            .json(&json!({ "commands": commands }))
            .send()
            .await
            .context("Todoist sync commit failed")?
            .error_for_status()
            .context("Todoist rejected the sync commit")?;

        let status: SyncResponse = resp
            .json()
            .await
            .context("Failed to parse Todoist commit response")?;
        for (uuid, outcome) in &status.sync_status {
            if outcome.as_str() != Some("ok") {
                bail!("Todoist command {uuid} failed: {outcome}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_add_envelope_carries_fields_and_temp_id() {
        let fields = ItemFields::with_content("Buy milk");
        let envelope = command_envelope(&Command::ItemAdd(fields));
        assert_eq!(envelope["type"], "item_add");
        assert_eq!(envelope["args"]["content"], "Buy milk");
        assert!(envelope["temp_id"].is_string());
        assert!(envelope["uuid"].is_string());
        // Absent optional fields stay absent in the command args.
        assert!(envelope["args"].get("project_id").is_none());
    }

    #[test]
    fn item_complete_envelope_carries_id() {
        let envelope = command_envelope(&Command::ItemComplete { id: 42 });
        assert_eq!(envelope["type"], "item_complete");
        assert_eq!(envelope["args"]["id"], 42);
        assert!(envelope.get("temp_id").is_none());
    }

    #[test]
    fn staging_without_commit_accumulates() {
        let client = SyncClient::new("token".into());
        client.add_item(ItemFields::with_content("A"));
        client.complete_item(7);
        let staged = client.staged.lock().unwrap();
        assert_eq!(staged.len(), 2);
        assert_eq!(staged[1], Command::ItemComplete { id: 7 });
    }

    #[test]
    fn wire_item_maps_due_and_filters_flags() {
        let raw = r#"{
            "items": [
                {"id": 1, "content": "open", "due": {"date": "2024-05-01"}, "labels": [3]},
                {"id": 2, "content": "done", "checked": true}
            ]
        }"#;
        let resp: SyncResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.items.len(), 2);
        assert!(resp.items[1].checked);
        assert_eq!(resp.items[0].due.as_ref().unwrap().date, "2024-05-01");
    }
}
