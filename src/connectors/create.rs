use anyhow::{Context, Result};
use async_trait::async_trait;

use super::session::resolve_api_token;
use super::{ConfigError, Connector, HostContext, Session};
use crate::config::TaskCreateOptions;
use crate::host::CredentialStore;
use crate::model::event::PipelineEvent;
use crate::model::item::ItemFields;

/// Creates one new Todoist item per invocation per inbound event. Emits no
/// pipeline events.
pub struct TaskCreateConnector {
    options: TaskCreateOptions,
}

impl TaskCreateConnector {
    pub fn new(options: TaskCreateOptions) -> Self {
        Self { options }
    }

    async fn handle(&self, host: &HostContext<'_>, event: Option<&PipelineEvent>) -> Result<()> {
        let options = self.options.interpolated(event)?;
        let session = Session::open(&options.api_token, host.credentials, host.connect)?;

        // Only present options become fields; empty optionals are omitted,
        // not sent as empty values.
        let mut fields = ItemFields::with_content(&options.content);
        if !options.date_string.is_empty() {
            fields.date_string = Some(options.date_string.clone());
        }
        if !options.project_id.is_empty() {
            fields.project_id = Some(
                options
                    .project_id
                    .parse()
                    .context("project_id must be an integer")?,
            );
        }
        if !options.priority.is_empty() {
            fields.priority = Some(
                options
                    .priority
                    .parse()
                    .context("priority must be an integer from 1 to 4")?,
            );
        }
        let labels = session.label_ids_for(&options.labels).await?;
        if !labels.is_empty() {
            fields.labels = Some(labels);
        }

        tracing::debug!(content = %fields.content, "staging new Todoist item");
        session.add_item(fields).await
    }
}

#[async_trait]
impl Connector for TaskCreateConnector {
    fn name(&self) -> &str {
        "task_create"
    }

    fn validate(&self, credentials: &dyn CredentialStore) -> Result<(), ConfigError> {
        if resolve_api_token(&self.options.api_token, credentials).is_none() {
            return Err(ConfigError::MissingApiToken);
        }
        Ok(())
    }

    async fn check(&self, host: &HostContext<'_>) -> Result<()> {
        self.handle(host, None).await
    }

    async fn receive(&self, host: &HostContext<'_>, events: &[PipelineEvent]) -> Result<()> {
        for event in events {
            self.handle(host, Some(event)).await?;
        }
        Ok(())
    }
}
