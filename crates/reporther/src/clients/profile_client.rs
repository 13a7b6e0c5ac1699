//! Account profile and role of the signed-in caller.

use crate::error::AppError;
use crate::keys::{self, CALLER_PROFILE, CALLER_ROLE, IS_ADMIN, USER_PROFILE};
use crate::model::{UserProfile, UserRole};
use crate::session::{Read, Session};
use crate::validate::{self, MAX_NAME_LEN};
use actor_cache::{KeyFilter, Principal};
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct ProfileClient {
    session: Session,
}

impl ProfileClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn get_caller_user_profile(&self) -> Result<Option<UserProfile>, AppError> {
        self.session
            .read(Read::user(CALLER_PROFILE), |actor| async move {
                actor.get_caller_user_profile().await
            })
            .await
    }

    #[instrument(skip(self, profile))]
    pub async fn save_caller_user_profile(&self, profile: UserProfile) -> Result<(), AppError> {
        let identity = self.session.require_identity()?;
        let profile = UserProfile {
            name: validate::required_text("Name", &profile.name, MAX_NAME_LEN)?,
            email: validate::optional_text(profile.email),
            phone: validate::optional_text(profile.phone),
        };

        self.session
            .mutate("save_caller_user_profile", |actor| async move {
                actor.save_caller_user_profile(profile).await
            })
            .await?;
        self.session
            .invalidate(keys::user(CALLER_PROFILE, &identity))
            .await?;
        info!(%identity, "Profile saved");
        Ok(())
    }

    /// Another principal's profile. Disabled until `user` is known.
    #[instrument(skip(self))]
    pub async fn get_user_profile(
        &self,
        user: Option<Principal>,
    ) -> Result<Option<UserProfile>, AppError> {
        let read = Read::shared(USER_PROFILE).required(user.as_ref());
        self.session
            .read(read, |actor| async move {
                match user {
                    Some(user) => actor.get_user_profile(user).await,
                    None => Ok(None),
                }
            })
            .await
    }

    /// The caller's role, `None` while it cannot be read yet.
    #[instrument(skip(self))]
    pub async fn get_caller_user_role(&self) -> Result<Option<UserRole>, AppError> {
        self.session
            .read(Read::user(CALLER_ROLE), |actor| async move {
                actor.get_caller_user_role().await.map(Some)
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn assign_caller_user_role(
        &self,
        user: Principal,
        role: UserRole,
    ) -> Result<(), AppError> {
        self.session.require_identity()?;
        self.session
            .mutate("assign_caller_user_role", |actor| async move {
                actor.assign_caller_user_role(user, role).await
            })
            .await?;
        self.session.invalidate(KeyFilter::scope(CALLER_ROLE)).await?;
        self.session.invalidate(KeyFilter::scope(IS_ADMIN)).await?;
        debug!(?role, "Role assigned");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn is_caller_admin(&self) -> Result<bool, AppError> {
        self.session
            .read(Read::user(IS_ADMIN), |actor| async move {
                actor.is_caller_admin().await
            })
            .await
    }
}
