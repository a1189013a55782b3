/// Domain-level error shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure reported by an external collaborator (script generation or
/// speech synthesis).
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The collaborator could not be reached.
    #[error("{service} unreachable: {message}")]
    Unreachable {
        service: &'static str,
        message: String,
    },

    /// The collaborator answered, but not with something usable.
    #[error("{service} returned an invalid response: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },
}
