/// Rejections returned by the backend actor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Rejected(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

const AUTHORIZATION_MARKERS: [&str; 3] = ["unauthorized", "permission", "not registered"];

impl BackendError {
    /// Whether the backend refused the caller rather than the request.
    ///
    /// Backends often trap with a plain message, so rejections mentioning
    /// authorization count as well.
    pub fn is_authorization(&self) -> bool {
        match self {
            BackendError::Unauthorized(_) => true,
            BackendError::Rejected(message) => {
                let message = message.to_lowercase();
                AUTHORIZATION_MARKERS
                    .iter()
                    .any(|marker| message.contains(marker))
            }
            _ => false,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Transport(_))
    }
}
