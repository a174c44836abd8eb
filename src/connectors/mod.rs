pub mod complete;
pub mod create;
pub mod finder;
pub mod session;

pub use complete::TaskCompleteConnector;
pub use create::TaskCreateConnector;
pub use finder::TaskFinderConnector;
pub use session::Session;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::host::{CredentialStore, EventBus, StaticCredentials};
use crate::model::event::PipelineEvent;
use crate::todoist::Connect;

/// A configuration problem that prevents a connector from running. Detected
/// at validation time and surfaced through the host's validation messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "you need to specify your Todoist API token or provide a credential named todoist_api_token"
    )]
    MissingApiToken,
    #[error("task_id must be present")]
    MissingTaskId,
    #[error("you must provide a regex, due date, or label(s)")]
    MissingCriteria,
    #[error("merge must be present")]
    MissingMerge,
    #[error("id_key must be present")]
    MissingIdKey,
}

/// Host capabilities handed to a connector for the duration of one
/// invocation. Nothing here outlives the call.
pub struct HostContext<'a> {
    pub credentials: &'a dyn CredentialStore,
    pub connect: &'a dyn Connect,
    pub bus: &'a dyn EventBus,
}

/// One independently configured unit reacting to scheduled ticks and/or
/// inbound events with a single category of task-API operation.
#[async_trait]
pub trait Connector: Send + Sync {
    fn name(&self) -> &str;

    /// Configuration-time validation. A connector that fails validation must
    /// not be invoked.
    fn validate(&self, credentials: &dyn CredentialStore) -> Result<(), ConfigError>;

    /// Scheduled activation. No event context: templated options resolve
    /// with static/default values only.
    async fn check(&self, host: &HostContext<'_>) -> Result<()>;

    /// Event-driven activation. Events are handled strictly in delivery
    /// order, each with its own fetch/filter/mutate cycle; the first failure
    /// aborts the remainder of the batch.
    async fn receive(&self, host: &HostContext<'_>, events: &[PipelineEvent]) -> Result<()>;
}

/// Builds the connector set declared by the pipeline config, one connector
/// per present section.
pub fn create_connectors(config: &PipelineConfig) -> Vec<Box<dyn Connector>> {
    let mut connectors: Vec<Box<dyn Connector>> = Vec::new();

    if let Some(options) = &config.task_create {
        connectors.push(Box::new(TaskCreateConnector::new(options.clone())));
    }
    if let Some(options) = &config.task_complete {
        connectors.push(Box::new(TaskCompleteConnector::new(options.clone())));
    }
    if let Some(options) = &config.task_finder {
        connectors.push(Box::new(TaskFinderConnector::new(options.clone())));
    }

    connectors
}

/// Credential store view over the config's `[credentials]` table.
pub fn config_credentials(config: &PipelineConfig) -> StaticCredentials {
    StaticCredentials::new(config.credentials.clone())
}
