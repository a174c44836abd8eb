use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::json;

use super::session::resolve_api_token;
use super::{ConfigError, Connector, HostContext, Session};
use crate::config::TaskFinderOptions;
use crate::host::CredentialStore;
use crate::model::event::{Payload, PipelineEvent};
use crate::model::item::Item;

/// Fetches all tasks, filters them by an AND-combination of the configured
/// criteria, and emits one pipeline event per surviving task in fetch order.
pub struct TaskFinderConnector {
    options: TaskFinderOptions,
}

/// The per-invocation match criteria. An absent criterion is vacuously true.
struct Criteria {
    regex: Option<Regex>,
    due_day: Option<NaiveDate>,
    label_ids: Option<Vec<u64>>,
}

impl Criteria {
    fn matches(&self, item: &Item) -> bool {
        self.matches_regex(item) && self.matches_due_date(item) && self.matches_labels(item)
    }

    fn matches_regex(&self, item: &Item) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(&item.content),
            None => true,
        }
    }

    fn matches_due_date(&self, item: &Item) -> bool {
        let Some(target) = self.due_day else {
            return true;
        };
        let Some(due) = &item.due_date else {
            return false;
        };
        match parse_day(due) {
            Some(day) => day == target,
            None => {
                tracing::debug!(%due, "unparseable item due date, treating as no match");
                false
            }
        }
    }

    fn matches_labels(&self, item: &Item) -> bool {
        let Some(ids) = &self.label_ids else {
            return true;
        };
        ids.iter().all(|id| item.labels.contains(id))
    }
}

/// Truncates a date expression to a UTC calendar day. Values carrying an
/// offset are converted to UTC first; bare dates are taken as UTC days.
fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(day);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    // Older sync payloads: "Mon 07 Aug 2006 23:59:59 +0000"
    if let Ok(dt) = DateTime::parse_from_str(value, "%a %d %b %Y %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    None
}

/// Only the literal string "true" switches merging on.
fn boolish(value: &str) -> bool {
    value == "true"
}

fn output_payload(
    id_key: &str,
    item_id: u64,
    merge: bool,
    event: Option<&PipelineEvent>,
) -> Payload {
    let mut payload = Payload::new();
    payload.insert(id_key.to_string(), json!(item_id));
    if merge {
        if let Some(event) = event {
            // Reverse merge: keys already present win over event fields.
            for (key, value) in &event.payload {
                payload.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
    }
    payload
}

impl TaskFinderConnector {
    pub fn new(options: TaskFinderOptions) -> Self {
        Self { options }
    }

    async fn handle(&self, host: &HostContext<'_>, event: Option<&PipelineEvent>) -> Result<()> {
        let options = self.options.interpolated(event)?;
        let session = Session::open(&options.api_token, host.credentials, host.connect)?;
        let criteria = build_criteria(&options, &session).await?;
        let merge = boolish(&options.merge);

        for item in session.items().await? {
            if !criteria.matches(item) {
                continue;
            }
            tracing::debug!(id = item.id, "task matched, emitting event");
            host.bus
                .emit(output_payload(&options.id_key, item.id, merge, event));
        }
        Ok(())
    }
}

async fn build_criteria(options: &TaskFinderOptions, session: &Session) -> Result<Criteria> {
    let regex = if options.regex.is_empty() {
        None
    } else {
        Some(
            Regex::new(&options.regex)
                .with_context(|| format!("invalid regex {:?}", options.regex))?,
        )
    };
    let due_day = if options.due_date.is_empty() {
        None
    } else {
        Some(
            parse_day(&options.due_date)
                .with_context(|| format!("could not parse due_date {:?}", options.due_date))?,
        )
    };
    let label_ids = if options.labels.is_empty() {
        None
    } else {
        Some(session.label_ids_for(&options.labels).await?)
    };
    Ok(Criteria {
        regex,
        due_day,
        label_ids,
    })
}

#[async_trait]
impl Connector for TaskFinderConnector {
    fn name(&self) -> &str {
        "task_finder"
    }

    fn validate(&self, credentials: &dyn CredentialStore) -> Result<(), ConfigError> {
        let has_criterion = !self.options.regex.is_empty()
            || !self.options.due_date.is_empty()
            || !self.options.labels.is_empty();
        if !has_criterion {
            return Err(ConfigError::MissingCriteria);
        }
        if self.options.merge.is_empty() {
            return Err(ConfigError::MissingMerge);
        }
        if self.options.id_key.is_empty() {
            return Err(ConfigError::MissingIdKey);
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

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, content: &str) -> Item {
        Item {
            id,
            content: content.to_string(),
            due_date: None,
            labels: Vec::new(),
            priority: 1,
        }
    }

    #[test]
    fn regex_matches_anywhere_in_content() {
        let criteria = Criteria {
            regex: Some(Regex::new("milk").unwrap()),
            due_day: None,
            label_ids: None,
        };
        assert!(criteria.matches(&item(1, "Buy milk and eggs")));
        assert!(!criteria.matches(&item(2, "Buy bread")));
    }

    #[test]
    fn due_date_matches_at_day_granularity() {
        let criteria = Criteria {
            regex: None,
            due_day: parse_day("2024-05-01"),
            label_ids: None,
        };
        let mut due = item(1, "A");
        due.due_date = Some("2024-05-01T23:00:00Z".to_string());
        assert!(criteria.matches(&due));

        due.due_date = Some("2024-05-02T00:30:00Z".to_string());
        assert!(!criteria.matches(&due));
    }

    #[test]
    fn due_date_requires_item_due_date() {
        let criteria = Criteria {
            regex: None,
            due_day: parse_day("2024-05-01"),
            label_ids: None,
        };
        assert!(!criteria.matches(&item(1, "no due date")));
    }

    #[test]
    fn labels_require_every_requested_id() {
        let mut labeled = item(1, "A");
        labeled.labels = vec![1, 2, 3];

        let both_present = Criteria {
            regex: None,
            due_day: None,
            label_ids: Some(vec![2, 3]),
        };
        assert!(both_present.matches(&labeled));

        let one_absent = Criteria {
            regex: None,
            due_day: None,
            label_ids: Some(vec![2, 4]),
        };
        assert!(!one_absent.matches(&labeled));
    }

    #[test]
    fn absent_criteria_are_vacuously_true() {
        let criteria = Criteria {
            regex: None,
            due_day: None,
            label_ids: None,
        };
        assert!(criteria.matches(&item(1, "anything")));
    }

    #[test]
    fn parse_day_handles_common_forms() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(parse_day("2024-05-01"), Some(day));
        assert_eq!(parse_day("2024-05-01T23:00:00Z"), Some(day));
        assert_eq!(parse_day("2024-05-01 12:30:00"), Some(day));
        assert_eq!(parse_day("Wed 01 May 2024 23:59:59 +0000"), Some(day));
        assert_eq!(parse_day("not a date"), None);
    }

    #[test]
    fn parse_day_converts_offsets_to_utc() {
        // 23:30 at -02:00 is already the next day in UTC.
        assert_eq!(
            parse_day("2024-05-01T23:30:00-02:00"),
            NaiveDate::from_ymd_opt(2024, 5, 2)
        );
    }

    #[test]
    fn merge_is_strictly_true() {
        assert!(boolish("true"));
        assert!(!boolish("false"));
        assert!(!boolish("yes"));
        assert!(!boolish(""));
    }

    #[test]
    fn output_payload_reverse_merges_event_fields() {
        let event = PipelineEvent::with_field("foo", json!("bar"));
        let payload = output_payload("task_id", 42, true, Some(&event));
        assert_eq!(payload["task_id"], 42);
        assert_eq!(payload["foo"], "bar");
    }

    #[test]
    fn output_payload_existing_keys_win() {
        let event = PipelineEvent::with_field("task_id", json!("stale"));
        let payload = output_payload("task_id", 42, true, Some(&event));
        assert_eq!(payload["task_id"], 42);
    }

    #[test]
    fn output_payload_without_merge_is_id_only() {
        let event = PipelineEvent::with_field("foo", json!("bar"));
        let payload = output_payload("task_id", 42, false, Some(&event));
        assert_eq!(payload.len(), 1);
        assert_eq!(payload["task_id"], 42);
    }
}
