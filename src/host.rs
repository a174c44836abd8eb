use std::collections::HashMap;

use crate::model::event::Payload;

/// Credential name the connectors fall back to when no `api_token` option
/// is configured.
pub const TODOIST_TOKEN_CREDENTIAL: &str = "todoist_api_token";

/// Named-credential lookup supplied by the host platform.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored credential, or None when the name is unknown.
    fn credential(&self, name: &str) -> Option<String>;
}

/// Outbound side of the host's event bus. Delivery and persistence are the
/// bus's responsibility; connectors only hand over payloads.
pub trait EventBus: Send + Sync {
    fn emit(&self, payload: Payload);
}

/// Credential store backed by a fixed name → value table, as loaded from the
/// `[credentials]` section of the pipeline config.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    entries: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

impl CredentialStore for StaticCredentials {
    fn credential(&self, name: &str) -> Option<String> {
        self.entries.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_credentials_lookup() {
        let mut entries = HashMap::new();
        entries.insert("todoist_api_token".to_string(), "secret".to_string());
        let store = StaticCredentials::new(entries);
        assert_eq!(store.credential("todoist_api_token").as_deref(), Some("secret"));
        assert_eq!(store.credential("missing"), None);
    }
}
