use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::event::PipelineEvent;
use crate::template;

/// Pipeline configuration: one optional section per connector plus a
/// named-credential table. Option values are always strings; numeric fields
/// are parsed at the point of use, after interpolation.
#[derive(Debug, Deserialize, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub credentials: HashMap<String, String>,
    pub task_create: Option<TaskCreateOptions>,
    pub task_complete: Option<TaskCompleteOptions>,
    pub task_finder: Option<TaskFinderOptions>,
}

/// Options recognized by the task-creation connector.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaskCreateOptions {
    pub api_token: String,
    pub content: String,
    pub date_string: String,
    pub project_id: String,
    pub labels: String,
    pub priority: String,
}

impl Default for TaskCreateOptions {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            content: "{{ content }}".to_string(),
            date_string: "today".to_string(),
            project_id: String::new(),
            labels: String::new(),
            priority: String::new(),
        }
    }
}

impl TaskCreateOptions {
    /// Resolves every option against the triggering event into the concrete
    /// values used for this invocation.
    pub fn interpolated(&self, event: Option<&PipelineEvent>) -> Result<Self> {
        Ok(Self {
            api_token: template::interpolate(&self.api_token, event)?,
            content: template::interpolate(&self.content, event)?,
            date_string: template::interpolate(&self.date_string, event)?,
            project_id: template::interpolate(&self.project_id, event)?,
            labels: template::interpolate(&self.labels, event)?,
            priority: template::interpolate(&self.priority, event)?,
        })
    }
}

/// Options recognized by the task-completion connector.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaskCompleteOptions {
    pub api_token: String,
    pub task_id: String,
}

impl Default for TaskCompleteOptions {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            task_id: "{{ task_id }}".to_string(),
        }
    }
}

impl TaskCompleteOptions {
    pub fn interpolated(&self, event: Option<&PipelineEvent>) -> Result<Self> {
        Ok(Self {
            api_token: template::interpolate(&self.api_token, event)?,
            task_id: template::interpolate(&self.task_id, event)?,
        })
    }
}

/// Options recognized by the task-finder connector.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaskFinderOptions {
    pub api_token: String,
    pub regex: String,
    pub due_date: String,
    pub labels: String,
    pub id_key: String,
    pub merge: String,
}

impl Default for TaskFinderOptions {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            regex: String::new(),
            due_date: String::new(),
            labels: String::new(),
            id_key: "task_id".to_string(),
            merge: "true".to_string(),
        }
    }
}

impl TaskFinderOptions {
    pub fn interpolated(&self, event: Option<&PipelineEvent>) -> Result<Self> {
        Ok(Self {
            api_token: template::interpolate(&self.api_token, event)?,
            regex: template::interpolate(&self.regex, event)?,
            due_date: template::interpolate(&self.due_date, event)?,
            labels: template::interpolate(&self.labels, event)?,
            id_key: template::interpolate(&self.id_key, event)?,
            merge: template::interpolate(&self.merge, event)?,
        })
    }
}

fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".todoist-connectors")
        .join("config.toml")
}

pub fn load_config() -> Result<PipelineConfig> {
    load_config_from(&config_path())
}

fn load_config_from(path: &Path) -> Result<PipelineConfig> {
    if !path.exists() {
        return Ok(PipelineConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: PipelineConfig =
        toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?;
    Ok(config)
}
