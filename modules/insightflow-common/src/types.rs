use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Projects & sources ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "crate::time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub project_id: String,
    pub kind: String,
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content_ptr: String,
    #[serde(with = "crate::time")]
    pub created_at: DateTime<Utc>,
}

impl Source {
    /// Title if present, otherwise the upload URI.
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.uri)
    }
}

// --- Synthesis output ---

/// Evidence snippet tied to one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub source_id: String,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// A synthesized assertion. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    /// Absent when the claim is embedded in a run payload.
    #[serde(default)]
    pub theme_id: Option<String>,
    pub statement: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    #[serde(default)]
    pub insight_run_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub claims: Vec<Claim>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRun {
    pub id: String,
    pub project_id: String,
    pub status: String,
    #[serde(with = "crate::time")]
    pub created_at: DateTime<Utc>,
    /// Free-form synthesis payload. Usually `{"themes": [...]}`.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

impl InsightRun {
    /// Themes embedded in the run payload. Empty when the payload is missing
    /// or does not match the expected shape.
    pub fn payload_themes(&self) -> Vec<Theme> {
        let Some(themes) = self.payload.as_ref().and_then(|p| p.get("themes")) else {
            return Vec::new();
        };
        match serde_json::from_value::<Vec<Theme>>(themes.clone()) {
            Ok(themes) => themes,
            Err(e) => {
                tracing::warn!(run_id = %self.id, error = %e, "Run payload themes are malformed");
                Vec::new()
            }
        }
    }
}

// --- Decisions & tasks ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub pros: Option<String>,
    #[serde(default)]
    pub cons: Option<String>,
    #[serde(default)]
    pub risks: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub linked_claim_ids: Vec<String>,
    #[serde(with = "crate::time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Board column order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To-Do",
            TaskStatus::InProgress => "Doing",
            TaskStatus::Done => "Done",
        }
    }

    /// Parse a wire status. Unknown values return `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::parse(s)
            .ok_or_else(|| format!("unknown task status {s:?} (expected todo, in_progress, done)"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    /// Kept as the raw wire value so unknown statuses survive a round trip.
    pub status: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default, with = "crate::time::option")]
    pub due_date: Option<DateTime<Utc>>,
    /// Weak reference. May point at a decision that no longer exists.
    #[serde(default)]
    pub decision_id: Option<String>,
    #[serde(with = "crate::time")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Column the task renders in. Unknown statuses fall back to `Todo`.
    pub fn board_status(&self) -> TaskStatus {
        TaskStatus::parse(&self.status).unwrap_or(TaskStatus::Todo)
    }
}
