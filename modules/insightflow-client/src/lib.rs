pub mod error;
pub mod types;

pub use error::{ClientError, Result};
pub use types::{
    DecisionInput, InsightRunCreate, InsightRunUpdate, ObsidianImport, ProjectCreate,
    SourceUpload, TaskCreate, TaskUpdate,
};

use insightflow_common::{
    Claim, Config, Decision, InsightRun, Project, Source, Task, Theme,
};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// REST client for the InsightFlow API. One method per endpoint, no caching.
#[derive(Clone)]
pub struct InsightFlowClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for InsightFlowClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl InsightFlowClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a client honoring the configured base URL and request timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // --- Projects ---

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.get_json("/projects/").await
    }

    pub async fn create_project(&self, input: &ProjectCreate) -> Result<Project> {
        self.send_json(self.client.post(self.url("/projects/")).json(input))
            .await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        self.send_empty(self.client.delete(self.url(&format!("/projects/{project_id}"))))
            .await
    }

    // --- Sources ---

    pub async fn list_sources(&self, project_id: Option<&str>) -> Result<Vec<Source>> {
        self.get_json(&with_project_filter("/sources/", project_id))
            .await
    }

    /// Upload a file as a new source (multipart form).
    pub async fn upload_source(&self, upload: &SourceUpload) -> Result<Source> {
        let bytes = tokio::fs::read(&upload.path).await?;
        let file_name = upload
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let mut form = Form::new()
            .text("project_id", upload.project_id.clone())
            .part("file", Part::bytes(bytes).file_name(file_name));
        if let Some(kind) = &upload.kind {
            form = form.text("kind", kind.clone());
        }
        if let Some(title) = &upload.title {
            form = form.text("title", title.clone());
        }
        if !upload.tags.is_empty() {
            form = form.text("tags", serde_json::to_string(&upload.tags)?);
        }

        debug!(project_id = %upload.project_id, path = %upload.path.display(), "Uploading source");
        self.send_json(self.client.post(self.url("/sources/")).multipart(form))
            .await
    }

    pub async fn delete_source(&self, source_id: &str) -> Result<()> {
        self.send_empty(self.client.delete(self.url(&format!("/sources/{source_id}"))))
            .await
    }

    pub async fn import_obsidian(&self, input: &ObsidianImport) -> Result<Vec<Source>> {
        self.send_json(
            self.client
                .post(self.url("/sources/import/obsidian"))
                .json(input),
        )
        .await
    }

    // --- Insight runs, themes, claims ---

    pub async fn list_insight_runs(&self, project_id: Option<&str>) -> Result<Vec<InsightRun>> {
        self.get_json(&with_project_filter("/insight-runs/", project_id))
            .await
    }

    pub async fn get_insight_run(&self, run_id: &str) -> Result<InsightRun> {
        self.get_json(&format!("/insight-runs/{run_id}")).await
    }

    pub async fn create_insight_run(&self, input: &InsightRunCreate) -> Result<InsightRun> {
        self.send_json(self.client.post(self.url("/insight-runs/")).json(input))
            .await
    }

    pub async fn update_insight_run(
        &self,
        run_id: &str,
        input: &InsightRunUpdate,
    ) -> Result<InsightRun> {
        self.send_json(
            self.client
                .patch(self.url(&format!("/insight-runs/{run_id}")))
                .json(input),
        )
        .await
    }

    pub async fn delete_insight_run(&self, run_id: &str) -> Result<()> {
        self.send_empty(
            self.client
                .delete(self.url(&format!("/insight-runs/{run_id}"))),
        )
        .await
    }

    pub async fn list_themes(&self, run_id: &str) -> Result<Vec<Theme>> {
        self.get_json(&format!("/themes/?run_id={run_id}")).await
    }

    pub async fn list_claims(&self, theme_id: &str) -> Result<Vec<Claim>> {
        self.get_json(&format!("/claims/?theme_id={theme_id}")).await
    }

    // --- Decisions ---

    pub async fn list_decisions(&self, project_id: Option<&str>) -> Result<Vec<Decision>> {
        self.get_json(&with_project_filter("/decisions/", project_id))
            .await
    }

    pub async fn create_decision(&self, input: &DecisionInput) -> Result<Decision> {
        self.send_json(self.client.post(self.url("/decisions/")).json(input))
            .await
    }

    pub async fn update_decision(&self, decision_id: &str, input: &DecisionInput) -> Result<Decision> {
        self.send_json(
            self.client
                .put(self.url(&format!("/decisions/{decision_id}")))
                .json(input),
        )
        .await
    }

    pub async fn delete_decision(&self, decision_id: &str) -> Result<()> {
        self.send_empty(
            self.client
                .delete(self.url(&format!("/decisions/{decision_id}"))),
        )
        .await
    }

    // --- Tasks ---

    pub async fn list_tasks(&self, project_id: Option<&str>) -> Result<Vec<Task>> {
        self.get_json(&with_project_filter("/tasks/", project_id))
            .await
    }

    pub async fn create_task(&self, input: &TaskCreate) -> Result<Task> {
        self.send_json(self.client.post(self.url("/tasks/")).json(input))
            .await
    }

    pub async fn update_task(&self, task_id: &str, input: &TaskUpdate) -> Result<Task> {
        self.send_json(
            self.client
                .patch(self.url(&format!("/tasks/{task_id}")))
                .json(input),
        )
        .await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.send_empty(self.client.delete(self.url(&format!("/tasks/{task_id}"))))
            .await
    }

    // --- Markdown exports ---

    pub async fn export_project_markdown(&self, project_id: &str) -> Result<String> {
        self.get_text(&format!("/export/{project_id}.md")).await
    }

    pub async fn daily_digest(&self, project_id: &str, date: Option<&str>) -> Result<String> {
        let path = match date {
            Some(date) => format!("/digest/{project_id}.md?date={date}"),
            None => format!("/digest/{project_id}.md"),
        };
        self.get_text(&path).await
    }

    // --- Plumbing ---

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(self.client.get(self.url(path))).await
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let resp = self.dispatch(self.client.get(self.url(path))).await?;
        Ok(resp.text().await?)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = self.dispatch(request).await?;
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        let resp = self.dispatch(request).await?;
        if resp.status() != StatusCode::NO_CONTENT {
            debug!(status = %resp.status(), "Expected 204, ignoring body");
        }
        Ok(())
    }

    /// Send a request and turn non-2xx responses into `ClientError::Api`.
    async fn dispatch(&self, request: RequestBuilder) -> Result<Response> {
        let resp = request.send().await?;
        let status = resp.status();
        debug!(url = %resp.url(), status = %status, "InsightFlow API response");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error::error_message(&body),
            });
        }
        Ok(resp)
    }
}

fn with_project_filter(path: &str, project_id: Option<&str>) -> String {
    match project_id {
        Some(id) => format!("{path}?project_id={id}"),
        None => path.to_string(),
    }
}
