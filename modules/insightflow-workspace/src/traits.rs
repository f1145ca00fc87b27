// Backend boundary for the workspace.
//
// Workspace talks to the REST API only through this trait so the flows can
// run against MockBackend in tests: no network, no server.

use async_trait::async_trait;

use insightflow_client::{
    DecisionInput, InsightFlowClient, InsightRunCreate, InsightRunUpdate, ObsidianImport, ProjectCreate, Result,
    SourceUpload, TaskCreate, TaskUpdate,
};
use insightflow_common::{Claim, Decision, InsightRun, Project, Source, Task, Theme};

#[async_trait]
pub trait Backend: Send + Sync {
    // --- Projects ---
    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn create_project(&self, input: &ProjectCreate) -> Result<Project>;
    async fn delete_project(&self, project_id: &str) -> Result<()>;

    // --- Sources ---
    async fn list_sources(&self, project_id: Option<&str>) -> Result<Vec<Source>>;
    async fn upload_source(&self, upload: &SourceUpload) -> Result<Source>;
    async fn delete_source(&self, source_id: &str) -> Result<()>;
    async fn import_obsidian(&self, input: &ObsidianImport) -> Result<Vec<Source>>;

    // --- Insight runs ---
    async fn list_insight_runs(&self, project_id: Option<&str>) -> Result<Vec<InsightRun>>;
    async fn get_insight_run(&self, run_id: &str) -> Result<InsightRun>;
    async fn create_insight_run(&self, input: &InsightRunCreate) -> Result<InsightRun>;
    async fn update_insight_run(&self, run_id: &str, input: &InsightRunUpdate)
        -> Result<InsightRun>;
    async fn delete_insight_run(&self, run_id: &str) -> Result<()>;
    async fn list_themes(&self, run_id: &str) -> Result<Vec<Theme>>;
    async fn list_claims(&self, theme_id: &str) -> Result<Vec<Claim>>;

    // --- Decisions ---
    async fn list_decisions(&self, project_id: Option<&str>) -> Result<Vec<Decision>>;
    async fn create_decision(&self, input: &DecisionInput) -> Result<Decision>;
    async fn update_decision(&self, decision_id: &str, input: &DecisionInput)
        -> Result<Decision>;
    async fn delete_decision(&self, decision_id: &str) -> Result<()>;

    // --- Tasks ---
    async fn list_tasks(&self, project_id: Option<&str>) -> Result<Vec<Task>>;
    async fn create_task(&self, input: &TaskCreate) -> Result<Task>;
    async fn update_task(&self, task_id: &str, input: &TaskUpdate) -> Result<Task>;
    async fn delete_task(&self, task_id: &str) -> Result<()>;

    // --- Export ---
    async fn export_project_markdown(&self, project_id: &str) -> Result<String>;
    async fn daily_digest(&self, project_id: &str, date: Option<&str>) -> Result<String>;
}

#[async_trait]
impl Backend for InsightFlowClient {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.list_projects().await
    }

    async fn create_project(&self, input: &ProjectCreate) -> Result<Project> {
        self.create_project(input).await
    }

    async fn delete_project(&self, project_id: &str) -> Result<()> {
        self.delete_project(project_id).await
    }

    async fn list_sources(&self, project_id: Option<&str>) -> Result<Vec<Source>> {
        self.list_sources(project_id).await
    }

    async fn upload_source(&self, upload: &SourceUpload) -> Result<Source> {
        self.upload_source(upload).await
    }

    async fn delete_source(&self, source_id: &str) -> Result<()> {
        self.delete_source(source_id).await
    }

    async fn import_obsidian(&self, input: &ObsidianImport) -> Result<Vec<Source>> {
        self.import_obsidian(input).await
    }

    async fn list_insight_runs(&self, project_id: Option<&str>) -> Result<Vec<InsightRun>> {
        self.list_insight_runs(project_id).await
    }

    async fn get_insight_run(&self, run_id: &str) -> Result<InsightRun> {
        self.get_insight_run(run_id).await
    }

    async fn create_insight_run(&self, input: &InsightRunCreate) -> Result<InsightRun> {
        self.create_insight_run(input).await
    }

    async fn update_insight_run(
        &self,
        run_id: &str,
        input: &InsightRunUpdate,
    ) -> Result<InsightRun> {
        self.update_insight_run(run_id, input).await
    }

    async fn delete_insight_run(&self, run_id: &str) -> Result<()> {
        self.delete_insight_run(run_id).await
    }

    async fn list_themes(&self, run_id: &str) -> Result<Vec<Theme>> {
        self.list_themes(run_id).await
    }

    async fn list_claims(&self, theme_id: &str) -> Result<Vec<Claim>> {
        self.list_claims(theme_id).await
    }

    async fn list_decisions(&self, project_id: Option<&str>) -> Result<Vec<Decision>> {
        self.list_decisions(project_id).await
    }

    async fn create_decision(&self, input: &DecisionInput) -> Result<Decision> {
        self.create_decision(input).await
    }

    async fn update_decision(
        &self,
        decision_id: &str,
        input: &DecisionInput,
    ) -> Result<Decision> {
        self.update_decision(decision_id, input).await
    }

    async fn delete_decision(&self, decision_id: &str) -> Result<()> {
        self.delete_decision(decision_id).await
    }

    async fn list_tasks(&self, project_id: Option<&str>) -> Result<Vec<Task>> {
        self.list_tasks(project_id).await
    }

    async fn create_task(&self, input: &TaskCreate) -> Result<Task> {
        self.create_task(input).await
    }

    async fn update_task(&self, task_id: &str, input: &TaskUpdate) -> Result<Task> {
        self.update_task(task_id, input).await
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.delete_task(task_id).await
    }

    async fn export_project_markdown(&self, project_id: &str) -> Result<String> {
        self.export_project_markdown(project_id).await
    }

    async fn daily_digest(&self, project_id: &str, date: Option<&str>) -> Result<String> {
        self.daily_digest(project_id, date).await
    }
}
