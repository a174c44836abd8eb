use anyhow::Result;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use todoist_connectors::config;
use todoist_connectors::connectors::{self, HostContext};
use todoist_connectors::host::EventBus;
use todoist_connectors::model::event::Payload;
use todoist_connectors::todoist::SyncConnect;

/// Prints each emitted event as one JSON line.
struct StdoutBus;

impl EventBus for StdoutBus {
    fn emit(&self, payload: Payload) {
        if let Ok(line) = serde_json::to_string(&Value::Object(payload)) {
            println!("{line}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    // Load config and build the configured connector set
    let config = config::load_config()?;
    let credentials = connectors::config_credentials(&config);
    let connectors = connectors::create_connectors(&config);
    if connectors.is_empty() {
        anyhow::bail!(
            "No connectors configured. Add sections to ~/.todoist-connectors/config.toml"
        );
    }

    // Validate everything before running anything
    for connector in &connectors {
        if let Err(error) = connector.validate(&credentials) {
            anyhow::bail!("{} is not runnable: {error}", connector.name());
        }
    }

    // One scheduled pass over every connector
    let connect = SyncConnect;
    let bus = StdoutBus;
    let host = HostContext {
        credentials: &credentials,
        connect: &connect,
        bus: &bus,
    };
    for connector in &connectors {
        tracing::info!(connector = connector.name(), "running check");
        connector.check(&host).await?;
    }

    Ok(())
}
