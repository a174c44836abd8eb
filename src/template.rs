use anyhow::{Context, Result};
use minijinja::Environment;

use crate::model::event::PipelineEvent;

/// Substitutes `{{ field }}` placeholders in a configured option value with
/// fields from the triggering event's payload. With no event, or when a
/// placeholder names a field the payload lacks, the placeholder renders as
/// an empty string.
pub fn interpolate(template: &str, event: Option<&PipelineEvent>) -> Result<String> {
    // Most option values carry no placeholders at all.
    if !template.contains("{{") && !template.contains("{%") {
        return Ok(template.to_string());
    }

    let environment = Environment::new();
    let context = event.map(|e| e.payload.clone()).unwrap_or_default();
    environment
        .render_str(template, context)
        .with_context(|| format!("failed to interpolate option value {template:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_value_passes_through() {
        assert_eq!(interpolate("Buy milk", None).unwrap(), "Buy milk");
    }

    #[test]
    fn placeholder_fills_from_event() {
        let event = PipelineEvent::with_field("content", json!("Buy milk"));
        assert_eq!(
            interpolate("{{ content }}", Some(&event)).unwrap(),
            "Buy milk"
        );
    }

    #[test]
    fn placeholder_composes_with_literal_text() {
        let event = PipelineEvent::with_field("task_id", json!(42));
        assert_eq!(
            interpolate("done: {{ task_id }}", Some(&event)).unwrap(),
            "done: 42"
        );
    }

    #[test]
    fn missing_field_renders_empty() {
        let event = PipelineEvent::default();
        assert_eq!(interpolate("{{ content }}", Some(&event)).unwrap(), "");
    }

    #[test]
    fn no_event_renders_empty() {
        assert_eq!(interpolate("{{ task_id }}", None).unwrap(), "");
    }
}
