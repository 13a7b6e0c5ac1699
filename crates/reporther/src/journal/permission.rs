//! Self-service permission repair used before journal writes.
//!
//! The caller's role is probed first. If the backend refuses the probe as
//! unauthorized (or reports a guest), the caller assigns itself the `User`
//! role once and probes again. A second failure is final.

use crate::backend::BackendHandle;
use crate::error::AppError;
use crate::model::UserRole;
use actor_cache::Principal;
use tracing::{debug, info, warn};

pub async fn ensure_user_role(handle: &BackendHandle, caller: &Principal) -> Result<(), AppError> {
    match handle.get_caller_user_role().await {
        Ok(role) if role.is_registered() => {
            debug!(%caller, ?role, "Permission probe ok");
            return Ok(());
        }
        Ok(role) => debug!(%caller, ?role, "Caller not registered"),
        Err(error) if error.is_authorization() => {
            debug!(%caller, error = %error, "Permission probe refused")
        }
        Err(error) => return Err(error.into()),
    }

    info!(%caller, "Assigning user role");
    if let Err(error) = handle
        .assign_caller_user_role(caller.clone(), UserRole::User)
        .await
    {
        warn!(%caller, error = %error, "Role assignment failed");
        return Err(AppError::PermissionSetupFailed(error.to_string()));
    }

    match handle.get_caller_user_role().await {
        Ok(role) if role.is_registered() => Ok(()),
        Ok(role) => Err(AppError::PermissionSetupFailed(format!(
            "role is still {role:?} after assignment"
        ))),
        Err(error) if error.is_authorization() => {
            Err(AppError::PermissionSetupFailed(error.to_string()))
        }
        Err(error) => Err(error.into()),
    }
}
