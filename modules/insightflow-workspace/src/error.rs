use insightflow_client::ClientError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkspaceError>;

/// Every failure is point-in-time and recoverable by repeating the action.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorkspaceError {
    /// Rejected locally before any request was sent, or rejected by the
    /// backend as malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The referenced project, decision, task, or run no longer exists.
    #[error("Not found or conflicting: {0}")]
    ConflictOrNotFound(String),

    /// Network or server failure. Safe to retry.
    #[error("Request failed: {0}")]
    Transient(String),
}

impl WorkspaceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        WorkspaceError::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, WorkspaceError::Validation(_))
    }
}

impl From<ClientError> for WorkspaceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { status: 404 | 409, message } => {
                WorkspaceError::ConflictOrNotFound(message)
            }
            ClientError::Api { status: 400 | 422, message } => WorkspaceError::Validation(message),
            other => WorkspaceError::Transient(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> ClientError {
        ClientError::Api {
            status,
            message: "boom".into(),
        }
    }

    #[test]
    fn missing_resources_map_to_conflict_or_not_found() {
        assert_eq!(
            WorkspaceError::from(api(404)),
            WorkspaceError::ConflictOrNotFound("boom".into())
        );
        assert!(matches!(
            WorkspaceError::from(api(409)),
            WorkspaceError::ConflictOrNotFound(_)
        ));
    }

    #[test]
    fn bad_requests_map_to_validation() {
        assert!(WorkspaceError::from(api(400)).is_validation());
        assert!(WorkspaceError::from(api(422)).is_validation());
    }

    #[test]
    fn server_and_network_failures_are_transient() {
        assert!(matches!(
            WorkspaceError::from(api(503)),
            WorkspaceError::Transient(_)
        ));
        assert!(matches!(
            WorkspaceError::from(ClientError::Network("connection reset".into())),
            WorkspaceError::Transient(_)
        ));
    }
}
