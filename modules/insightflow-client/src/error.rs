use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl ClientError {
    /// HTTP status for API errors, `None` for transport and decode failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err.to_string())
    }
}

/// Pull a human-readable message out of an error body.
/// FastAPI-style `{"detail": "..."}` bodies yield the detail string;
/// other JSON is passed through compact; plain text is used as-is.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => serde_json::Value::Object(map).to_string(),
        },
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) if body.trim().is_empty() => "Request failed".to_string(),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_extracted() {
        assert_eq!(error_message(r#"{"detail": "Task not found"}"#), "Task not found");
    }

    #[test]
    fn structured_detail_is_kept_as_json() {
        let msg = error_message(r#"{"detail": [{"loc": ["body", "title"]}]}"#);
        assert!(msg.starts_with('['));
        assert!(msg.contains("title"));
    }

    #[test]
    fn empty_body_gets_a_generic_message() {
        assert_eq!(error_message(""), "Request failed");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(error_message("Bad gateway"), "Bad gateway");
    }

    #[test]
    fn status_is_only_reported_for_api_errors() {
        let api = ClientError::Api { status: 404, message: "gone".into() };
        assert_eq!(api.status(), Some(404));
        assert_eq!(ClientError::Network("reset".into()).status(), None);
    }
}
