use anyhow::{bail, Result};
use tokio::sync::OnceCell;

use crate::host::{CredentialStore, TODOIST_TOKEN_CREDENTIAL};
use crate::model::item::{Item, ItemFields, Label};
use crate::todoist::{Connect, TodoistApi};

/// Picks the API token for an invocation: the interpolated `api_token`
/// option wins, otherwise the `todoist_api_token` credential.
pub fn resolve_api_token(
    configured: &str,
    credentials: &dyn CredentialStore,
) -> Option<String> {
    if !configured.is_empty() {
        return Some(configured.to_string());
    }
    credentials
        .credential(TODOIST_TOKEN_CREDENTIAL)
        .filter(|token| !token.is_empty())
}

/// The shared Todoist capability, scoped to a single invocation: an
/// authenticated client handle plus the item and label collections, each
/// fetched at most once per invocation.
pub struct Session {
    client: Box<dyn TodoistApi>,
    items: OnceCell<Vec<Item>>,
    labels: OnceCell<Vec<Label>>,
}

impl Session {
    /// Resolves credentials and connects. Construct at the start of an
    /// invocation, use for every remote call in it, then drop.
    pub fn open(
        configured_token: &str,
        credentials: &dyn CredentialStore,
        connect: &dyn Connect,
    ) -> Result<Self> {
        let Some(token) = resolve_api_token(configured_token, credentials) else {
            bail!("no Todoist API token available");
        };
        Ok(Self {
            client: connect.connect(&token),
            items: OnceCell::new(),
            labels: OnceCell::new(),
        })
    }

    pub async fn items(&self) -> Result<&[Item]> {
        let items = self
            .items
            .get_or_try_init(|| self.client.fetch_items())
            .await?;
        Ok(items.as_slice())
    }

    pub async fn labels(&self) -> Result<&[Label]> {
        let labels = self
            .labels
            .get_or_try_init(|| self.client.fetch_labels())
            .await?;
        Ok(labels.as_slice())
    }

    /// Resolves a comma-separated list of label names to label IDs. Names
    /// with no matching label are dropped, not reported.
    pub async fn label_ids_for(&self, label_list: &str) -> Result<Vec<u64>> {
        if label_list.is_empty() {
            return Ok(Vec::new());
        }
        let labels = self.labels().await?;
        let ids = label_list
            .split(',')
            .map(str::trim_start)
            .filter_map(|name| {
                let id = labels.iter().find(|label| label.name == name).map(|l| l.id);
                if id.is_none() {
                    tracing::debug!(label = name, "no label with this name, dropping");
                }
                id
            })
            .collect();
        Ok(ids)
    }

    /// Stages a task creation and commits it in the same invocation.
    pub async fn add_item(&self, fields: ItemFields) -> Result<()> {
        self.client.add_item(fields);
        self.client.commit().await
    }

    /// Stages a task completion and commits it in the same invocation.
    pub async fn complete_item(&self, id: u64) -> Result<()> {
        self.client.complete_item(id);
        self.client.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticCredentials;
    use std::collections::HashMap;

    fn store(entries: &[(&str, &str)]) -> StaticCredentials {
        StaticCredentials::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn configured_token_wins_over_credential() {
        let credentials = store(&[("todoist_api_token", "stored")]);
        assert_eq!(
            resolve_api_token("configured", &credentials).as_deref(),
            Some("configured")
        );
    }

    #[test]
    fn falls_back_to_stored_credential() {
        let credentials = store(&[("todoist_api_token", "stored")]);
        assert_eq!(
            resolve_api_token("", &credentials).as_deref(),
            Some("stored")
        );
    }

    #[test]
    fn no_source_resolves_to_none() {
        let credentials = store(&[]);
        assert_eq!(resolve_api_token("", &credentials), None);
    }

    #[test]
    fn empty_stored_credential_counts_as_absent() {
        let credentials = store(&[("todoist_api_token", "")]);
        assert_eq!(resolve_api_token("", &credentials), None);
    }
}
