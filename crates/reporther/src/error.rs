//! # Application Errors
//!
//! Every failure a user action can end in, and the short message shown for it.
//! Errors are caught at the boundary of the action (see [`Notification`]);
//! none of them is fatal to the process.

use crate::backend::BackendError;
use actor_cache::{CacheError, WaitError};
use std::time::Duration;

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
const MAX_INFORMATIVE_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    /// The backend handle is absent, failed to connect, or the wait was cancelled.
    #[error("Backend actor not ready: {0}")]
    ActorNotReady(String),
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),
    /// The one self-service role assignment did not fix an authorization failure.
    #[error("Permission setup failed: {0}")]
    PermissionSetupFailed(String),
    #[error("Backend actor not ready after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Backend(BackendError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("Local storage error: {0}")]
    Storage(String),
}

impl From<BackendError> for AppError {
    fn from(error: BackendError) -> Self {
        if error.is_authorization() {
            AppError::AuthorizationDenied(error.to_string())
        } else {
            AppError::Backend(error)
        }
    }
}

impl From<WaitError> for AppError {
    fn from(error: WaitError) -> Self {
        match error {
            WaitError::Timeout(after) => AppError::Timeout(after),
            WaitError::Cache(error) => AppError::Cache(error),
            other => AppError::ActorNotReady(other.to_string()),
        }
    }
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    /// The short, human-readable text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ActorNotReady(_) => {
                "The service is starting up. Please try again in a moment.".to_string()
            }
            AppError::AuthenticationRequired => "Please sign in to continue.".to_string(),
            AppError::AuthorizationDenied(_) => {
                "You do not have permission to do this.".to_string()
            }
            AppError::PermissionSetupFailed(_) => {
                "We could not set up your account permissions. Please contact support."
                    .to_string()
            }
            AppError::Timeout(_) => {
                "This is taking longer than expected. Please try again.".to_string()
            }
            AppError::Backend(error) => backend_message(error),
            AppError::InvalidInput(message) => message.clone(),
            AppError::Cache(_) => GENERIC_FAILURE.to_string(),
            AppError::Storage(_) => "Your settings could not be saved on this device.".to_string(),
        }
    }

    /// Whether trying the same action again later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::ActorNotReady(_) | AppError::Timeout(_) => true,
            AppError::Backend(error) => error.is_transport(),
            _ => false,
        }
    }

    pub fn to_notification(&self) -> Notification {
        Notification {
            message: self.user_message(),
            retryable: self.is_retryable(),
        }
    }
}

// Raw backend messages are shown when they read like a sentence meant for people.
fn backend_message(error: &BackendError) -> String {
    let raw = match error {
        BackendError::Transport(_) => return GENERIC_FAILURE.to_string(),
        BackendError::Unauthorized(message)
        | BackendError::NotFound(message)
        | BackendError::InvalidInput(message)
        | BackendError::Rejected(message) => message.trim(),
    };
    if raw.is_empty() || raw.len() > MAX_INFORMATIVE_LEN {
        GENERIC_FAILURE.to_string()
    } else {
        raw.to_string()
    }
}

/// A transient message displayed after a failed user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub retryable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_cache::share;

    #[test]
    fn test_wait_errors_map_to_taxonomy() {
        let timeout: AppError = WaitError::Timeout(Duration::from_secs(10)).into();
        assert_eq!(timeout, AppError::Timeout(Duration::from_secs(10)));
        assert!(timeout.is_retryable());

        let failed: AppError = WaitError::ActorFailed(share(std::io::Error::other("no replica"))).into();
        assert!(matches!(failed, AppError::ActorNotReady(ref reason) if reason.contains("no replica")));

        let closed: AppError = WaitError::Cache(CacheError::CacheClosed).into();
        assert_eq!(closed, AppError::Cache(CacheError::CacheClosed));
    }

    #[test]
    fn test_backend_errors_map_to_taxonomy() {
        let denied: AppError = BackendError::Rejected("Unauthorized: not a user".into()).into();
        assert!(matches!(denied, AppError::AuthorizationDenied(_)));

        let missing: AppError = BackendError::NotFound("Incident not found".into()).into();
        assert_eq!(missing.user_message(), "Incident not found");
        assert!(!missing.is_retryable());

        let transport: AppError = BackendError::Transport("socket closed".into()).into();
        assert_eq!(transport.user_message(), GENERIC_FAILURE);
        assert!(transport.is_retryable());

        let noisy: AppError = BackendError::Rejected("x".repeat(500)).into();
        assert_eq!(noisy.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_notifications() {
        let notification = AppError::AuthenticationRequired.to_notification();
        assert_eq!(notification.message, "Please sign in to continue.");
        assert!(!notification.retryable);

        let notification = AppError::PermissionSetupFailed("denied".into()).to_notification();
        assert!(notification.message.contains("contact support"));
    }
}
