//! The workspace session: one user's selected project, cached collections,
//! decision draft, UI state and board input text, wired to a [`Backend`].
//!
//! Reads go through the query cache. Mutations call the backend and, only
//! once it confirms, invalidate the affected cache keys. Every mutating
//! method takes `&mut self`, so a second submit cannot start while the
//! first is still in flight.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::try_join_all;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use insightflow_client::{
    DecisionInput, InsightRunCreate, InsightRunUpdate, ObsidianImport, ProjectCreate, SourceUpload, TaskUpdate,
};
use insightflow_common::{
    Citation, Decision, InsightRun, Project, Source, Task, TaskStatus, Theme,
};

use crate::actions::{Dialog, UiState};
use crate::board::{group_tasks, new_task_request, Board, CellDrafts, GroupKey};
use crate::cache::{Collection, QueryCache, QueryKey, Scope};
use crate::draft::{
    claim_citations, DecisionDraft, DecisionForm, DraftAccumulator, DraftField, EvidenceRef,
};
use crate::error::{Result, WorkspaceError};
use crate::traits::Backend;

/// Owned task and decision lists for one board render.
#[derive(Debug, Clone, Default)]
pub struct BoardSnapshot {
    pub tasks: Vec<Task>,
    pub decisions: Vec<Decision>,
}

impl BoardSnapshot {
    pub fn board(&self) -> Board<'_> {
        group_tasks(&self.tasks, &self.decisions)
    }
}

/// Optional metadata for a source upload.
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct UploadOptions {
    #[builder(default, setter(strip_option, into))]
    pub kind: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub title: Option<String>,
    #[builder(default)]
    pub tags: Vec<String>,
}

pub struct Workspace<B: Backend> {
    backend: B,
    cache: QueryCache,
    draft: DraftAccumulator,
    /// The decision dialog's fields while it is open.
    form: Option<DecisionForm>,
    ui: UiState,
    cells: CellDrafts,
}

impl<B: Backend> Workspace<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: QueryCache::new(),
            draft: DraftAccumulator::new(),
            form: None,
            ui: UiState::new(),
            cells: CellDrafts::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    // -----------------------------------------------------------------------
    // Project selection
    // -----------------------------------------------------------------------

    pub fn select_project(&mut self, project_id: Option<String>) {
        self.ui.select_project(project_id);
        info!(project_id = ?self.ui.selected_project(), "Project selected");
    }

    pub fn selected_project(&self) -> Option<&str> {
        self.ui.selected_project()
    }

    /// Cache scope of project-bound collections: the selected project, or
    /// everything when none is selected.
    pub fn scope(&self) -> Scope {
        Scope::project(self.ui.selected_project())
    }

    fn require_project(&self) -> Result<String> {
        self.ui
            .selected_project()
            .map(str::to_string)
            .ok_or_else(|| rejected(WorkspaceError::validation("Select a project first")))
    }

    // -----------------------------------------------------------------------
    // Cached reads
    // -----------------------------------------------------------------------

    pub async fn projects(&mut self) -> Result<Vec<Project>> {
        if let Some(hit) = self.cache.get::<Vec<Project>>(&Scope::All) {
            return Ok(hit.clone());
        }
        let projects = self.backend.list_projects().await?;
        info!(count = projects.len(), "Fetched projects");
        self.cache.put(Scope::All, projects.clone());
        Ok(projects)
    }

    pub async fn sources(&mut self) -> Result<Vec<Source>> {
        let scope = self.scope();
        if let Some(hit) = self.cache.get::<Vec<Source>>(&scope) {
            return Ok(hit.clone());
        }
        let sources = self.backend.list_sources(scope.id()).await?;
        info!(count = sources.len(), scope = %scope, "Fetched sources");
        self.cache.put(scope, sources.clone());
        Ok(sources)
    }

    pub async fn runs(&mut self) -> Result<Vec<InsightRun>> {
        let scope = self.scope();
        if let Some(hit) = self.cache.get::<Vec<InsightRun>>(&scope) {
            return Ok(hit.clone());
        }
        let runs = self.backend.list_insight_runs(scope.id()).await?;
        info!(count = runs.len(), scope = %scope, "Fetched insight runs");
        self.cache.put(scope, runs.clone());
        Ok(runs)
    }

    pub async fn run(&mut self, run_id: &str) -> Result<InsightRun> {
        let scope = Scope::Id(run_id.to_string());
        if let Some(hit) = self.cache.get::<InsightRun>(&scope) {
            return Ok(hit.clone());
        }
        let run = self.backend.get_insight_run(run_id).await?;
        self.cache.put(scope, run.clone());
        Ok(run)
    }

    /// Drop the cached run and its themes, then fetch the run again.
    pub async fn refresh_run(&mut self, run_id: &str) -> Result<InsightRun> {
        self.forget_run(run_id);
        self.run(run_id).await
    }

    fn forget_run(&mut self, run_id: &str) {
        let scope = Scope::Id(run_id.to_string());
        self.cache
            .invalidate(&QueryKey::new(Collection::Run, scope.clone()));
        self.cache.invalidate(&QueryKey::new(Collection::Themes, scope));
    }

    /// Themes of a run with their claims. Taken from the run payload when it
    /// embeds them, otherwise assembled from the themes and claims endpoints.
    pub async fn themes(&mut self, run_id: &str) -> Result<Vec<Theme>> {
        let scope = Scope::Id(run_id.to_string());
        if let Some(hit) = self.cache.get::<Vec<Theme>>(&scope) {
            return Ok(hit.clone());
        }

        let run = self.run(run_id).await?;
        let mut themes = run.payload_themes();
        if themes.is_empty() {
            themes = self.backend.list_themes(run_id).await?;
            let backend = &self.backend;
            let claims = try_join_all(themes.iter().map(|t| backend.list_claims(&t.id))).await?;
            for (theme, claims) in themes.iter_mut().zip(claims) {
                if theme.claims.is_empty() {
                    theme.claims = claims;
                }
            }
        }

        info!(
            run_id,
            themes = themes.len(),
            claims = themes.iter().map(|t| t.claims.len()).sum::<usize>(),
            "Loaded run themes"
        );
        self.cache.put(scope, themes.clone());
        Ok(themes)
    }

    pub async fn decisions(&mut self) -> Result<Vec<Decision>> {
        let scope = self.scope();
        if let Some(hit) = self.cache.get::<Vec<Decision>>(&scope) {
            return Ok(hit.clone());
        }
        let decisions = self.backend.list_decisions(scope.id()).await?;
        info!(count = decisions.len(), scope = %scope, "Fetched decisions");
        self.cache.put(scope, decisions.clone());
        Ok(decisions)
    }

    pub async fn tasks(&mut self) -> Result<Vec<Task>> {
        let scope = self.scope();
        if let Some(hit) = self.cache.get::<Vec<Task>>(&scope) {
            return Ok(hit.clone());
        }
        let tasks = self.backend.list_tasks(scope.id()).await?;
        info!(count = tasks.len(), scope = %scope, "Fetched tasks");
        self.cache.put(scope, tasks.clone());
        Ok(tasks)
    }

    /// Tasks and decisions for the board. Input text for groups that have
    /// disappeared is dropped.
    pub async fn board(&mut self) -> Result<BoardSnapshot> {
        let snapshot = BoardSnapshot {
            decisions: self.decisions().await?,
            tasks: self.tasks().await?,
        };
        self.cells.retain_groups(&snapshot.board());
        Ok(snapshot)
    }

    // -----------------------------------------------------------------------
    // Decision draft
    // -----------------------------------------------------------------------

    pub fn draft(&self) -> DecisionDraft {
        self.draft.read()
    }

    /// Merge one claim of a run into the draft.
    pub async fn add_claim_to_draft(
        &mut self,
        run_id: &str,
        claim_id: &str,
    ) -> Result<EvidenceRef> {
        let themes = self.themes(run_id).await?;
        let (theme, claim) =
            find_claim(&themes, claim_id).ok_or_else(|| claim_not_found(run_id, claim_id))?;
        let evidence = self.draft.add_claim(theme, claim);
        info!(
            run_id,
            claim_id,
            sources = evidence.source_ids.len(),
            "Added claim to decision draft"
        );
        Ok(evidence)
    }

    pub async fn claim_citations(
        &mut self,
        run_id: &str,
        claim_id: &str,
    ) -> Result<Vec<Citation>> {
        let themes = self.themes(run_id).await?;
        let (_, claim) =
            find_claim(&themes, claim_id).ok_or_else(|| claim_not_found(run_id, claim_id))?;
        Ok(claim_citations(claim)?.to_vec())
    }

    /// Overwrite one field on the draft and, when the decision dialog is
    /// open, on its form as well.
    pub fn edit_draft(&mut self, field: DraftField) {
        let open = self.ui.active_dialog() == Some(Dialog::Decision);
        if let Some(form) = self.form.as_mut().filter(|_| open) {
            form.apply(&field);
        }
        self.draft.set_field(field);
    }

    /// Toggle a citation source on the open form (or the draft when no form
    /// is open) and write the result through. Returns whether it is now cited.
    pub fn toggle_citation(&mut self, source_id: &str) -> bool {
        let mut ids = match self.decision_form() {
            Some(form) => form.citation_source_ids.clone(),
            None => self.draft.draft().citation_source_ids.clone(),
        };
        let cited = ids.toggle(source_id);
        self.edit_draft(DraftField::CitationSourceIds(ids.to_vec()));
        cited
    }

    /// Open the decision dialog, pre-filled from the draft. Returns a
    /// snapshot of the form; later edits go through [`Self::edit_draft`].
    pub fn open_decision_form(&mut self) -> DecisionForm {
        self.ui.open_dialog(Dialog::Decision);
        let form = DecisionForm::from_draft(self.draft.draft());
        self.form = Some(form.clone());
        form
    }

    /// The decision form, while its dialog is the active one.
    pub fn decision_form(&self) -> Option<&DecisionForm> {
        self.form
            .as_ref()
            .filter(|_| self.ui.active_dialog() == Some(Dialog::Decision))
    }

    /// Dismiss whichever dialog is open. The draft is kept.
    pub fn close_dialog(&mut self) {
        self.ui.close_dialog();
        self.form = None;
    }

    // -----------------------------------------------------------------------
    // Decisions
    // -----------------------------------------------------------------------

    /// Persist the open form as a new decision, or the draft when no form
    /// is open. On success the decisions cache is invalidated, then the
    /// draft is cleared and the dialog closed. On any failure the draft,
    /// form, cache and dialog are left exactly as they were.
    pub async fn submit_decision(&mut self) -> Result<Decision> {
        let input = match self.decision_form() {
            Some(form) => form.to_input(self.ui.selected_project()),
            None => DecisionForm::from_draft(self.draft.draft())
                .to_input(self.ui.selected_project()),
        }
        .map_err(rejected)?;
        let decision = self.backend.create_decision(&input).await?;

        self.cache
            .invalidate_scoped(Collection::Decisions, &Scope::Id(input.project_id.clone()));
        self.draft.clear();
        self.form = None;
        if self.ui.active_dialog() == Some(Dialog::Decision) {
            self.ui.close_dialog();
        }
        info!(
            decision_id = %decision.id,
            project_id = %decision.project_id,
            linked_claims = decision.linked_claim_ids.len(),
            "Decision created"
        );
        Ok(decision)
    }

    pub async fn update_decision(&mut self, decision_id: &str, form: &DecisionForm) -> Result<Decision> {
        let input: DecisionInput = form
            .to_input(self.ui.selected_project())
            .map_err(rejected)?;
        let decision = self.backend.update_decision(decision_id, &input).await?;
        self.cache
            .invalidate_scoped(Collection::Decisions, &Scope::Id(input.project_id));
        info!(decision_id, "Decision updated");
        Ok(decision)
    }

    /// Delete a decision. Tasks that pointed at it are refetched; any that
    /// still reference it show up as unassigned.
    pub async fn delete_decision(&mut self, decision_id: &str) -> Result<()> {
        self.backend.delete_decision(decision_id).await?;
        let scope = self.scope();
        self.cache.invalidate_scoped(Collection::Decisions, &scope);
        self.cache.invalidate_scoped(Collection::Tasks, &scope);
        info!(decision_id, "Decision deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub fn set_cell_text(&mut self, key: GroupKey, text: impl Into<String>) {
        self.cells.set(key, text);
    }

    pub fn cell_text(&self, key: &GroupKey) -> &str {
        self.cells.get(key)
    }

    /// Create a task from the text typed into a group's input. The text is
    /// cleared only once the backend has created the task.
    pub async fn add_task(&mut self, key: &GroupKey) -> Result<Task> {
        let request = new_task_request(self.ui.selected_project(), key, self.cells.get(key))
            .map_err(rejected)?;
        let task = self.backend.create_task(&request).await?;

        self.cache
            .invalidate_scoped(Collection::Tasks, &Scope::Id(request.project_id));
        self.cells.clear(key);
        info!(task_id = %task.id, group = %key, "Task added");
        Ok(task)
    }

    /// Create a task with full details, as the task dialog does.
    pub async fn create_task(
        &mut self,
        key: &GroupKey,
        title: &str,
        owner: Option<String>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Task> {
        let mut request =
            new_task_request(self.ui.selected_project(), key, title).map_err(rejected)?;
        request.owner = owner.filter(|o| !o.trim().is_empty());
        request.due_date = due_date;

        let task = self.backend.create_task(&request).await?;
        self.cache
            .invalidate_scoped(Collection::Tasks, &Scope::Id(request.project_id));
        if self.ui.active_dialog() == Some(Dialog::Task) {
            self.ui.close_dialog();
        }
        info!(task_id = %task.id, group = %key, "Task created");
        Ok(task)
    }

    pub async fn move_task(&mut self, task_id: &str, status: TaskStatus) -> Result<Task> {
        self.patch_task(task_id, &TaskUpdate::status(status)).await
    }

    /// Move a task to another decision's group, or to unassigned.
    pub async fn relink_task(&mut self, task_id: &str, key: &GroupKey) -> Result<Task> {
        let update = match key.decision_id() {
            Some(decision_id) => TaskUpdate::link_decision(decision_id),
            None => TaskUpdate::unlink_decision(),
        };
        self.patch_task(task_id, &update).await
    }

    /// Edit title, owner or due date. Absent fields are left unchanged.
    pub async fn edit_task(&mut self, task_id: &str, update: TaskUpdate) -> Result<Task> {
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(rejected(WorkspaceError::validation("Task title is required")));
        }
        self.patch_task(task_id, &update).await
    }

    pub async fn delete_task(&mut self, task_id: &str) -> Result<()> {
        self.backend.delete_task(task_id).await?;
        let scope = self.scope();
        self.cache.invalidate_scoped(Collection::Tasks, &scope);
        info!(task_id, "Task deleted");
        Ok(())
    }

    async fn patch_task(&mut self, task_id: &str, update: &TaskUpdate) -> Result<Task> {
        let task = self.backend.update_task(task_id, update).await?;
        self.cache
            .invalidate_scoped(Collection::Tasks, &Scope::Id(task.project_id.clone()));
        info!(task_id, status = %task.status, decision_id = ?task.decision_id, "Task updated");
        Ok(task)
    }

    // -----------------------------------------------------------------------
    // Projects, sources and runs
    // -----------------------------------------------------------------------

    /// Create a project and select it.
    pub async fn create_project(&mut self, name: &str, description: Option<String>) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(rejected(WorkspaceError::validation("Project name is required")));
        }
        let input = ProjectCreate {
            name: name.to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
        };
        let project = self.backend.create_project(&input).await?;

        self.cache
            .invalidate(&QueryKey::new(Collection::Projects, Scope::All));
        self.select_project(Some(project.id.clone()));
        if self.ui.active_dialog() == Some(Dialog::Project) {
            self.ui.close_dialog();
        }
        info!(project_id = %project.id, "Project created");
        Ok(project)
    }

    pub async fn delete_project(&mut self, project_id: &str) -> Result<()> {
        self.backend.delete_project(project_id).await?;
        self.cache
            .invalidate(&QueryKey::new(Collection::Projects, Scope::All));
        if self.ui.selected_project() == Some(project_id) {
            self.select_project(None);
        }
        info!(project_id, "Project deleted");
        Ok(())
    }

    pub async fn upload_source(&mut self, path: PathBuf, options: UploadOptions) -> Result<Source> {
        let project_id = self.require_project()?;
        let upload = SourceUpload {
            project_id: project_id.clone(),
            path,
            kind: options.kind,
            title: options.title,
            tags: options.tags,
        };
        let source = self.backend.upload_source(&upload).await?;
        self.cache
            .invalidate_scoped(Collection::Sources, &Scope::Id(project_id));
        info!(source_id = %source.id, "Source uploaded");
        Ok(source)
    }

    pub async fn delete_source(&mut self, source_id: &str) -> Result<()> {
        self.backend.delete_source(source_id).await?;
        let scope = self.scope();
        self.cache.invalidate_scoped(Collection::Sources, &scope);
        info!(source_id, "Source deleted");
        Ok(())
    }

    pub async fn import_obsidian(
        &mut self,
        folder: Option<String>,
        base_path: Option<String>,
        limit: Option<u32>,
    ) -> Result<Vec<Source>> {
        let project_id = self.require_project()?;
        let input = ObsidianImport {
            project_id: project_id.clone(),
            folder,
            base_path,
            limit,
        };
        let imported = self.backend.import_obsidian(&input).await?;
        self.cache
            .invalidate_scoped(Collection::Sources, &Scope::Id(project_id));
        info!(count = imported.len(), "Obsidian notes imported");
        Ok(imported)
    }

    pub async fn start_insight_run(&mut self, prompt: Option<String>) -> Result<InsightRun> {
        let project_id = self.require_project()?;
        let input = InsightRunCreate {
            project_id: project_id.clone(),
            prompt: prompt.filter(|p| !p.trim().is_empty()),
        };
        let run = self.backend.create_insight_run(&input).await?;

        self.cache
            .invalidate_scoped(Collection::InsightRuns, &Scope::Id(project_id));
        self.cache
            .invalidate(&QueryKey::new(Collection::Themes, Scope::Id(run.id.clone())));
        if self.ui.active_dialog() == Some(Dialog::Analyze) {
            self.ui.close_dialog();
        }
        info!(run_id = %run.id, status = %run.status, "Insight run started");
        Ok(run)
    }

    /// Set a run's status and, optionally, replace its payload.
    pub async fn update_insight_run(
        &mut self,
        run_id: &str,
        status: Option<String>,
        payload: Option<serde_json::Value>,
    ) -> Result<InsightRun> {
        if status.is_none() && payload.is_none() {
            return Err(rejected(WorkspaceError::validation("Nothing to update")));
        }
        let input = InsightRunUpdate { status, payload };
        let run = self.backend.update_insight_run(run_id, &input).await?;

        self.cache
            .invalidate_scoped(Collection::InsightRuns, &Scope::Id(run.project_id.clone()));
        self.forget_run(run_id);
        info!(run_id, status = %run.status, "Insight run updated");
        Ok(run)
    }

    pub async fn delete_insight_run(&mut self, run_id: &str) -> Result<()> {
        self.backend.delete_insight_run(run_id).await?;
        let scope = self.scope();
        self.cache.invalidate_scoped(Collection::InsightRuns, &scope);
        self.forget_run(run_id);
        info!(run_id, "Insight run deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Exports
    // -----------------------------------------------------------------------

    pub async fn export_markdown(&self) -> Result<String> {
        let project_id = self.require_project()?;
        Ok(self.backend.export_project_markdown(&project_id).await?)
    }

    pub async fn daily_digest(&self, date: Option<NaiveDate>) -> Result<String> {
        let project_id = self.require_project()?;
        let date = date.map(|d| d.format("%Y-%m-%d").to_string());
        Ok(self
            .backend
            .daily_digest(&project_id, date.as_deref())
            .await?)
    }
}

fn find_claim<'a>(
    themes: &'a [Theme],
    claim_id: &str,
) -> Option<(&'a Theme, &'a insightflow_common::Claim)> {
    themes.iter().find_map(|theme| {
        theme
            .claims
            .iter()
            .find(|c| c.id == claim_id)
            .map(|claim| (theme, claim))
    })
}

fn claim_not_found(run_id: &str, claim_id: &str) -> WorkspaceError {
    WorkspaceError::ConflictOrNotFound(format!("Claim {claim_id} not found in run {run_id}"))
}

fn rejected(err: WorkspaceError) -> WorkspaceError {
    warn!(error = %err, "Rejected before sending");
    err
}
