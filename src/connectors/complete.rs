use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use super::session::resolve_api_token;
use super::{ConfigError, Connector, HostContext, Session};
use crate::config::TaskCompleteOptions;
use crate::host::CredentialStore;
use crate::model::event::PipelineEvent;

/// Marks an existing task complete, either on a schedule (fixed `task_id`)
/// or once per inbound event. Re-completing an already-complete task is a
/// pass-through to whatever the service does with it.
pub struct TaskCompleteConnector {
    options: TaskCompleteOptions,
}

impl TaskCompleteConnector {
    pub fn new(options: TaskCompleteOptions) -> Self {
        Self { options }
    }

    async fn handle(&self, host: &HostContext<'_>, event: Option<&PipelineEvent>) -> Result<()> {
        let options = self.options.interpolated(event)?;
        if options.task_id.is_empty() {
            bail!("task_id interpolated to an empty string");
        }
        let id: u64 = options
            .task_id
            .parse()
            .with_context(|| format!("task_id {:?} is not an integer", options.task_id))?;

        let session = Session::open(&options.api_token, host.credentials, host.connect)?;
        tracing::debug!(id, "completing Todoist item");
        session.complete_item(id).await
    }
}

#[async_trait]
impl Connector for TaskCompleteConnector {
    fn name(&self) -> &str {
        "task_complete"
    }

    fn validate(&self, credentials: &dyn CredentialStore) -> Result<(), ConfigError> {
        if self.options.task_id.is_empty() {
            return Err(ConfigError::MissingTaskId);
        }
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
