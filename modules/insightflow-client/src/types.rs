use std::path::PathBuf;

use chrono::{DateTime, Utc};
use insightflow_common::TaskStatus;
use serde::Serialize;

/// Body for `POST /projects/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Multipart upload for `POST /sources/`. The file is read from `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUpload {
    pub project_id: String,
    pub path: PathBuf,
    pub kind: Option<String>,
    pub title: Option<String>,
    pub tags: Vec<String>,
}

/// Body for `POST /sources/import/obsidian`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObsidianImport {
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Body for `POST /insight-runs/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightRunCreate {
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Body for `PATCH /insight-runs/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightRunUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Body for `POST /decisions/` and `PUT /decisions/{id}`.
///
/// The id lists are always serialized, empty or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionInput {
    pub project_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pros: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cons: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub citation_source_ids: Vec<String>,
    pub linked_claim_ids: Vec<String>,
}

/// Body for `POST /tasks/`. `decision_id` is sent as `null` when unassigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskCreate {
    pub project_id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "insightflow_common::time::option::serialize"
    )]
    pub due_date: Option<DateTime<Utc>>,
    pub decision_id: Option<String>,
}

/// Body for `PATCH /tasks/{id}`. Only present fields are changed.
///
/// The backend treats `decision_id: ""` as "unlink"; see [`TaskUpdate::unlink_decision`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "insightflow_common::time::option::serialize"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_id: Option<String>,
}

impl TaskUpdate {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn link_decision(decision_id: &str) -> Self {
        Self {
            decision_id: Some(decision_id.to_string()),
            ..Default::default()
        }
    }

    pub fn unlink_decision() -> Self {
        Self {
            decision_id: Some(String::new()),
            ..Default::default()
        }
    }
}
