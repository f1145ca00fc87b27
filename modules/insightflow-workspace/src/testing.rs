// Test double for the Backend trait.
//
// MockBackend is a stateful in-memory stand-in for the REST API. It keeps
// the backend's observable rules (project filters, newest-first listings,
// decision/project checks on task writes, tasks unlinked when their
// decision is deleted) and records every call so tests can assert on what
// was, or was not, sent.
//
// Builder pattern: `.with_project()`, `.with_decision()`, `.with_task()`,
// `.with_run()`, `.with_themes()`, `.failing_on()`.
//
// Plus fixture helpers for constructing projects, decisions, tasks, runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use insightflow_client::{
    ClientError, DecisionInput, InsightRunCreate, InsightRunUpdate, ObsidianImport, ProjectCreate, Result,
    SourceUpload, TaskCreate, TaskUpdate,
};
use insightflow_common::{
    Citation, Claim, Decision, InsightRun, Project, Source, Task, TaskStatus, Theme,
};

use crate::traits::Backend;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn project(id: &str, name: &str) -> Project {
    Project {
        id: id.into(),
        name: name.into(),
        description: None,
        created_at: Utc::now(),
    }
}

pub fn source(id: &str, project_id: &str, title: &str) -> Source {
    Source {
        id: id.into(),
        project_id: project_id.into(),
        kind: "note".into(),
        uri: format!("data/uploads/{id}.md"),
        title: Some(title.into()),
        tags: vec![],
        content_ptr: format!("data/content/{id}.txt"),
        created_at: Utc::now(),
    }
}

pub fn decision(id: &str, project_id: &str, title: &str) -> Decision {
    Decision {
        id: id.into(),
        project_id: project_id.into(),
        title: title.into(),
        rationale: None,
        pros: None,
        cons: None,
        risks: None,
        confidence: Some(0.6),
        linked_claim_ids: vec![],
        created_at: Utc::now(),
    }
}

pub fn task(id: &str, project_id: &str, status: TaskStatus, decision_id: Option<&str>) -> Task {
    Task {
        id: id.into(),
        project_id: project_id.into(),
        title: format!("Task {id}"),
        status: status.as_str().into(),
        owner: None,
        due_date: None,
        decision_id: decision_id.map(str::to_string),
        created_at: Utc::now(),
    }
}

pub fn claim(id: &str, statement: &str, confidence: f64, source_ids: &[&str]) -> Claim {
    Claim {
        id: id.into(),
        theme_id: None,
        statement: statement.into(),
        confidence,
        citations: source_ids
            .iter()
            .enumerate()
            .map(|(i, s)| Citation {
                id: format!("{id}-cit{i}"),
                source_id: s.to_string(),
                quote: Some(format!("quote from {s}")),
                location: None,
            })
            .collect(),
    }
}

pub fn theme(id: &str, title: &str, claims: Vec<Claim>) -> Theme {
    Theme {
        id: id.into(),
        insight_run_id: None,
        title: title.into(),
        summary: None,
        confidence: 0.7,
        claims,
    }
}

/// A completed run whose payload embeds `themes`.
pub fn run_with_themes(id: &str, project_id: &str, themes: &[Theme]) -> InsightRun {
    InsightRun {
        id: id.into(),
        project_id: project_id.into(),
        status: "completed".into(),
        created_at: Utc::now(),
        payload: Some(json!({ "themes": themes })),
    }
}

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Api(u16),
    Network,
}

impl MockFailure {
    fn to_error(self, op: &str) -> ClientError {
        match self {
            MockFailure::Api(status) => ClientError::Api {
                status,
                message: format!("MockBackend: {op} failed with {status}"),
            },
            MockFailure::Network => {
                ClientError::Network(format!("MockBackend: {op} connection refused"))
            }
        }
    }
}

#[derive(Default)]
struct State {
    projects: Vec<Project>,
    sources: Vec<Source>,
    runs: Vec<InsightRun>,
    /// Themes served by `list_themes`, keyed by run id.
    themes: HashMap<String, Vec<Theme>>,
    decisions: Vec<Decision>,
    /// Cited source ids per decision. The API stores these but does not
    /// return them on the decision.
    citations: HashMap<String, Vec<String>>,
    tasks: Vec<Task>,
}

#[derive(Default)]
pub struct MockBackend {
    state: Mutex<State>,
    failures: Mutex<HashMap<String, MockFailure>>,
    calls: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(self, project: Project) -> Self {
        self.lock().projects.push(project);
        self
    }

    pub fn with_source(self, source: Source) -> Self {
        self.lock().sources.push(source);
        self
    }

    pub fn with_decision(self, decision: Decision) -> Self {
        self.lock().decisions.push(decision);
        self
    }

    pub fn with_task(self, task: Task) -> Self {
        self.lock().tasks.push(task);
        self
    }

    pub fn with_run(self, run: InsightRun) -> Self {
        self.lock().runs.push(run);
        self
    }

    /// Themes returned by `list_themes(run_id)` and, through their claims,
    /// by `list_claims`.
    pub fn with_themes(self, run_id: &str, themes: Vec<Theme>) -> Self {
        self.lock().themes.insert(run_id.to_string(), themes);
        self
    }

    pub fn failing_on(self, op: &str, failure: MockFailure) -> Self {
        self.set_failure(op, Some(failure));
        self
    }

    /// Change failure injection mid-test. `None` lets the op succeed again.
    pub fn set_failure(&self, op: &str, failure: Option<MockFailure>) {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        match failure {
            Some(f) => failures.insert(op.to_string(), f),
            None => failures.remove(op),
        };
    }

    /// Every call so far, as `op` or `op(arg)`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.as_str() == op || c.starts_with(&format!("{op}(")))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn decisions(&self) -> Vec<Decision> {
        self.lock().decisions.clone()
    }

    /// Source ids recorded as citations for a decision.
    pub fn cited_sources(&self, decision_id: &str) -> Vec<String> {
        self.lock()
            .citations
            .get(decision_id)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call, then fail if a failure is injected for `op`.
    fn enter(&self, op: &str, arg: Option<&str>) -> Result<()> {
        let entry = match arg {
            Some(arg) => format!("{op}({arg})"),
            None => op.to_string(),
        };
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);

        let failure = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(op)
            .copied();
        match failure {
            Some(f) => Err(f.to_error(op)),
            None => Ok(()),
        }
    }
}

fn not_found(what: &str) -> ClientError {
    ClientError::Api {
        status: 404,
        message: format!("{what} not found"),
    }
}

fn bad_request(message: &str) -> ClientError {
    ClientError::Api {
        status: 400,
        message: message.to_string(),
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn scoped<T: Clone>(items: &[T], project_id: Option<&str>, owner: impl Fn(&T) -> &str) -> Vec<T> {
    items
        .iter()
        .filter(|item| project_id.map_or(true, |p| owner(item) == p))
        .cloned()
        .collect()
}

#[async_trait]
impl Backend for MockBackend {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.enter("list_projects", None)?;
        Ok(self.lock().projects.clone())
    }

    async fn create_project(&self, input: &ProjectCreate) -> Result<Project> {
        self.enter("create_project", Some(&input.name))?;
        let project = Project {
            id: new_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            created_at: Utc::now(),
        };
        self.lock().projects.insert(0, project.clone());
        Ok(project)
    }

    async fn delete_project(&self, project_id: &str) -> Result<()> {
        self.enter("delete_project", Some(project_id))?;
        let mut state = self.lock();
        let before = state.projects.len();
        state.projects.retain(|p| p.id != project_id);
        if state.projects.len() == before {
            return Err(not_found("Project"));
        }
        state.sources.retain(|s| s.project_id != project_id);
        state.runs.retain(|r| r.project_id != project_id);
        state.decisions.retain(|d| d.project_id != project_id);
        state.tasks.retain(|t| t.project_id != project_id);
        Ok(())
    }

    async fn list_sources(&self, project_id: Option<&str>) -> Result<Vec<Source>> {
        self.enter("list_sources", project_id)?;
        Ok(scoped(&self.lock().sources, project_id, |s| s.project_id.as_str()))
    }

    async fn upload_source(&self, upload: &SourceUpload) -> Result<Source> {
        self.enter("upload_source", Some(&upload.project_id))?;
        let mut state = self.lock();
        if !state.projects.iter().any(|p| p.id == upload.project_id) {
            return Err(not_found("Project"));
        }
        let id = new_id();
        let file_name = upload
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source = Source {
            id: id.clone(),
            project_id: upload.project_id.clone(),
            kind: upload.kind.clone().unwrap_or_else(|| "note".into()),
            uri: format!("data/uploads/{file_name}"),
            title: upload.title.clone().or(Some(file_name)),
            tags: upload.tags.clone(),
            content_ptr: format!("data/content/{id}.txt"),
            created_at: Utc::now(),
        };
        state.sources.insert(0, source.clone());
        Ok(source)
    }

    async fn delete_source(&self, source_id: &str) -> Result<()> {
        self.enter("delete_source", Some(source_id))?;
        let mut state = self.lock();
        let before = state.sources.len();
        state.sources.retain(|s| s.id != source_id);
        if state.sources.len() == before {
            return Err(not_found("Source"));
        }
        Ok(())
    }

    async fn import_obsidian(&self, input: &ObsidianImport) -> Result<Vec<Source>> {
        self.enter("import_obsidian", Some(&input.project_id))?;
        let mut state = self.lock();
        if !state.projects.iter().any(|p| p.id == input.project_id) {
            return Err(not_found("Project"));
        }
        let count = input.limit.unwrap_or(2).min(2) as usize;
        let imported: Vec<Source> = (0..count)
            .map(|i| Source {
                kind: "obsidian".into(),
                ..source(&new_id(), &input.project_id, &format!("Note {i}"))
            })
            .collect();
        for s in imported.iter().rev() {
            state.sources.insert(0, s.clone());
        }
        Ok(imported)
    }

    async fn list_insight_runs(&self, project_id: Option<&str>) -> Result<Vec<InsightRun>> {
        self.enter("list_insight_runs", project_id)?;
        Ok(scoped(&self.lock().runs, project_id, |r| r.project_id.as_str()))
    }

    async fn get_insight_run(&self, run_id: &str) -> Result<InsightRun> {
        self.enter("get_insight_run", Some(run_id))?;
        self.lock()
            .runs
            .iter()
            .find(|r| r.id == run_id)
            .cloned()
            .ok_or_else(|| not_found("Insight run"))
    }

    async fn create_insight_run(&self, input: &InsightRunCreate) -> Result<InsightRun> {
        self.enter("create_insight_run", Some(&input.project_id))?;
        let mut state = self.lock();
        if !state.projects.iter().any(|p| p.id == input.project_id) {
            return Err(not_found("Project"));
        }
        let run = InsightRun {
            id: new_id(),
            project_id: input.project_id.clone(),
            status: "completed".into(),
            created_at: Utc::now(),
            payload: Some(json!({ "themes": [] })),
        };
        state.runs.insert(0, run.clone());
        Ok(run)
    }

    async fn update_insight_run(
        &self,
        run_id: &str,
        input: &InsightRunUpdate,
    ) -> Result<InsightRun> {
        self.enter("update_insight_run", Some(run_id))?;
        let mut state = self.lock();
        let run = state
            .runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or_else(|| not_found("Insight run"))?;
        if let Some(status) = &input.status {
            run.status = status.clone();
        }
        if let Some(payload) = &input.payload {
            run.payload = Some(payload.clone());
        }
        Ok(run.clone())
    }

    async fn delete_insight_run(&self, run_id: &str) -> Result<()> {
        self.enter("delete_insight_run", Some(run_id))?;
        let mut state = self.lock();
        let before = state.runs.len();
        state.runs.retain(|r| r.id != run_id);
        if state.runs.len() == before {
            return Err(not_found("Insight run"));
        }
        state.themes.remove(run_id);
        Ok(())
    }

    async fn list_themes(&self, run_id: &str) -> Result<Vec<Theme>> {
        self.enter("list_themes", Some(run_id))?;
        let themes = self.lock().themes.get(run_id).cloned().unwrap_or_default();
        // The themes endpoint does not embed claims.
        Ok(themes
            .into_iter()
            .map(|t| Theme {
                insight_run_id: Some(run_id.to_string()),
                claims: vec![],
                ..t
            })
            .collect())
    }

    async fn list_claims(&self, theme_id: &str) -> Result<Vec<Claim>> {
        self.enter("list_claims", Some(theme_id))?;
        let state = self.lock();
        let claims = state
            .themes
            .values()
            .flatten()
            .find(|t| t.id == theme_id)
            .map(|t| t.claims.clone())
            .unwrap_or_default();
        Ok(claims
            .into_iter()
            .map(|c| Claim {
                theme_id: Some(theme_id.to_string()),
                ..c
            })
            .collect())
    }

    async fn list_decisions(&self, project_id: Option<&str>) -> Result<Vec<Decision>> {
        self.enter("list_decisions", project_id)?;
        Ok(scoped(&self.lock().decisions, project_id, |d| d.project_id.as_str()))
    }

    async fn create_decision(&self, input: &DecisionInput) -> Result<Decision> {
        self.enter("create_decision", Some(&input.project_id))?;
        let mut state = self.lock();
        if !state.projects.iter().any(|p| p.id == input.project_id) {
            return Err(not_found("Project"));
        }
        let decision = Decision {
            id: new_id(),
            project_id: input.project_id.clone(),
            title: input.title.clone(),
            rationale: input.rationale.clone(),
            pros: input.pros.clone(),
            cons: input.cons.clone(),
            risks: input.risks.clone(),
            confidence: input.confidence,
            linked_claim_ids: input.linked_claim_ids.clone(),
            created_at: Utc::now(),
        };
        state
            .citations
            .insert(decision.id.clone(), input.citation_source_ids.clone());
        state.decisions.insert(0, decision.clone());
        Ok(decision)
    }

    async fn update_decision(
        &self,
        decision_id: &str,
        input: &DecisionInput,
    ) -> Result<Decision> {
        self.enter("update_decision", Some(decision_id))?;
        let mut state = self.lock();
        let decision = state
            .decisions
            .iter_mut()
            .find(|d| d.id == decision_id)
            .ok_or_else(|| not_found("Decision"))?;
        decision.title = input.title.clone();
        decision.rationale = input.rationale.clone();
        decision.pros = input.pros.clone();
        decision.cons = input.cons.clone();
        decision.risks = input.risks.clone();
        decision.confidence = input.confidence;
        decision.linked_claim_ids = input.linked_claim_ids.clone();
        decision.project_id = input.project_id.clone();
        let updated = decision.clone();
        state
            .citations
            .insert(decision_id.to_string(), input.citation_source_ids.clone());
        Ok(updated)
    }

    async fn delete_decision(&self, decision_id: &str) -> Result<()> {
        self.enter("delete_decision", Some(decision_id))?;
        let mut state = self.lock();
        let before = state.decisions.len();
        state.decisions.retain(|d| d.id != decision_id);
        if state.decisions.len() == before {
            return Err(not_found("Decision"));
        }
        state.citations.remove(decision_id);
        for task in state.tasks.iter_mut() {
            if task.decision_id.as_deref() == Some(decision_id) {
                task.decision_id = None;
            }
        }
        Ok(())
    }

    async fn list_tasks(&self, project_id: Option<&str>) -> Result<Vec<Task>> {
        self.enter("list_tasks", project_id)?;
        Ok(scoped(&self.lock().tasks, project_id, |t| t.project_id.as_str()))
    }

    async fn create_task(&self, input: &TaskCreate) -> Result<Task> {
        self.enter("create_task", Some(&input.title))?;
        let mut state = self.lock();
        if !state.projects.iter().any(|p| p.id == input.project_id) {
            return Err(not_found("Project"));
        }
        if let Some(decision_id) = input.decision_id.as_deref().filter(|d| !d.is_empty()) {
            let known = state
                .decisions
                .iter()
                .any(|d| d.id == decision_id && d.project_id == input.project_id);
            if !known {
                return Err(bad_request("Decision not found for project"));
            }
        }
        let task = Task {
            id: new_id(),
            project_id: input.project_id.clone(),
            title: input.title.clone(),
            status: input.status.as_str().into(),
            owner: input.owner.clone(),
            due_date: input.due_date,
            decision_id: input.decision_id.clone().filter(|d| !d.is_empty()),
            created_at: Utc::now(),
        };
        state.tasks.insert(0, task.clone());
        Ok(task)
    }

    async fn update_task(&self, task_id: &str, input: &TaskUpdate) -> Result<Task> {
        self.enter("update_task", Some(task_id))?;
        let mut state = self.lock();
        let project_id = state
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|t| t.project_id.clone())
            .ok_or_else(|| not_found("Task"))?;

        let relink = match input.decision_id.as_deref() {
            None => None,
            Some("") => Some(None),
            Some(id) => {
                let known = state
                    .decisions
                    .iter()
                    .any(|d| d.id == id && d.project_id == project_id);
                if !known {
                    return Err(bad_request("Decision not found for project"));
                }
                Some(Some(id.to_string()))
            }
        };

        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| not_found("Task"))?;
        if let Some(title) = &input.title {
            task.title = title.clone();
        }
        if let Some(status) = input.status {
            task.status = status.as_str().into();
        }
        if let Some(owner) = &input.owner {
            task.owner = Some(owner.clone());
        }
        if input.due_date.is_some() {
            task.due_date = input.due_date;
        }
        if let Some(decision_id) = relink {
            task.decision_id = decision_id;
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.enter("delete_task", Some(task_id))?;
        let mut state = self.lock();
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != task_id);
        if state.tasks.len() == before {
            return Err(not_found("Task"));
        }
        Ok(())
    }

    async fn export_project_markdown(&self, project_id: &str) -> Result<String> {
        self.enter("export_project_markdown", Some(project_id))?;
        let state = self.lock();
        let project = state
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| not_found("Project"))?;
        let mut out = format!("# {}\n\n## Decisions\n", project.name);
        for d in state.decisions.iter().filter(|d| d.project_id == project_id) {
            out.push_str(&format!("- {}\n", d.title));
        }
        Ok(out)
    }

    async fn daily_digest(&self, project_id: &str, date: Option<&str>) -> Result<String> {
        self.enter("daily_digest", Some(project_id))?;
        let state = self.lock();
        if !state.projects.iter().any(|p| p.id == project_id) {
            return Err(not_found("Project"));
        }
        let day = date
            .map(str::to_string)
            .unwrap_or_else(|| Utc::now().date_naive().to_string());
        Ok(format!("# Daily digest {day}\n"))
    }
}
