pub mod sync;

pub use sync::SyncClient;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::item::{Item, ItemFields, Label};

/// A mutation staged in the client's local change-set. Nothing is visible
/// remotely until `commit` flushes the set in one sync call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ItemAdd(ItemFields),
    ItemComplete { id: u64 },
}

/// The remote task service, as seen by the connectors: read the item and
/// label collections, stage add/complete mutations, and commit staged
/// changes. Network and authentication failures surface as errors and are
/// never caught below the host's error log.
#[async_trait]
pub trait TodoistApi: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<Item>>;
    async fn fetch_labels(&self) -> Result<Vec<Label>>;
    fn add_item(&self, fields: ItemFields);
    fn complete_item(&self, id: u64);
    async fn commit(&self) -> Result<()>;
}

/// Builds an authenticated client handle for one invocation.
pub trait Connect: Send + Sync {
    fn connect(&self, token: &str) -> Box<dyn TodoistApi>;
}

/// Default factory producing the real sync-endpoint client.
pub struct SyncConnect;

impl Connect for SyncConnect {
    fn connect(&self, token: &str) -> Box<dyn TodoistApi> {
        Box::new(SyncClient::new(token.to_string()))
    }
}
