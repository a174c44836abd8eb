//! Event-driven Todoist connectors for automation pipelines.
//!
//! Three connectors cover one task-API operation each: creating an item from
//! an inbound event, completing an item by ID, and finding items that match
//! declarative criteria (content regex, due-date day, label set) to emit one
//! pipeline event per match. The host platform owns scheduling, credential
//! storage, and event delivery; this crate consumes those through the traits
//! in [`host`] and drives the remote service through [`todoist::TodoistApi`].

pub mod config;
pub mod connectors;
pub mod host;
pub mod model;
pub mod template;
pub mod todoist;
