use std::env;
use std::time::Duration;

use crate::error::InsightFlowError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration loaded from environment variables (and `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the InsightFlow API, without a trailing slash.
    pub api_url: String,

    /// Project selected on startup, if any.
    pub project_id: Option<String>,

    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            project_id: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from the environment. Reads `.env` first if present.
    pub fn from_env() -> Result<Self, InsightFlowError> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.log_values();
        Ok(config)
    }

    /// Build a config from an arbitrary key lookup. `from_env` delegates here.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InsightFlowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("INSIGHTFLOW_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let project_id = lookup("INSIGHTFLOW_PROJECT_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let timeout_secs = match lookup("INSIGHTFLOW_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                InsightFlowError::Config(format!(
                    "INSIGHTFLOW_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            project_id,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_project(mut self, project_id: Option<String>) -> Self {
        if project_id.is_some() {
            self.project_id = project_id;
        }
        self
    }

    fn log_values(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let head: String = v.chars().take(8).collect();
                    format!("{}...({} chars)", head, v.chars().count())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  INSIGHTFLOW_API_URL: {}", self.api_url);
        tracing::info!("  INSIGHTFLOW_PROJECT_ID: {}", preview_opt(&self.project_id));
        tracing::info!(
            "  INSIGHTFLOW_TIMEOUT_SECS: {}",
            self.request_timeout.as_secs()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn trailing_slash_is_stripped_from_api_url() {
        let config =
            Config::from_lookup(lookup(&[("INSIGHTFLOW_API_URL", "https://api.example.com/")]))
                .unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
    }

    #[test]
    fn blank_project_id_means_no_selection() {
        let config = Config::from_lookup(lookup(&[("INSIGHTFLOW_PROJECT_ID", "  ")])).unwrap();
        assert!(config.project_id.is_none());
    }

    #[test]
    fn bad_timeout_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("INSIGHTFLOW_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, InsightFlowError::Config(_)));
    }

    #[test]
    fn with_project_keeps_existing_selection_when_none_given() {
        let config = Config::from_lookup(lookup(&[("INSIGHTFLOW_PROJECT_ID", "p1")]))
            .unwrap()
            .with_project(None);
        assert_eq!(config.project_id.as_deref(), Some("p1"));
    }
}
