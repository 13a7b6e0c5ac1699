//! Contact details used to fill police submissions.

use crate::error::AppError;
use crate::keys::{self, VICTIM_PROFILE};
use crate::model::VictimProfile;
use crate::session::{Read, Session};
use crate::validate::{self, MAX_NAME_LEN};
use tracing::{info, instrument};

#[derive(Clone)]
pub struct VictimClient {
    session: Session,
}

impl VictimClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn get_victim_profile(&self) -> Result<Option<VictimProfile>, AppError> {
        self.session
            .read(Read::user(VICTIM_PROFILE), |actor| async move {
                actor.get_victim_profile().await
            })
            .await
    }

    #[instrument(skip(self, profile))]
    pub async fn save_victim_profile(&self, profile: VictimProfile) -> Result<(), AppError> {
        let identity = self.session.require_identity()?;
        let profile = VictimProfile {
            full_name: validate::required_text("Full name", &profile.full_name, MAX_NAME_LEN)?,
            date_of_birth: validate::optional_text(profile.date_of_birth),
            phone: validate::optional_text(profile.phone),
            address: validate::optional_text(profile.address),
            emergency_contact: validate::optional_text(profile.emergency_contact),
        };

        self.session
            .mutate("save_victim_profile", |actor| async move {
                actor.save_victim_profile(profile).await
            })
            .await?;
        self.session
            .invalidate(keys::user(VICTIM_PROFILE, &identity))
            .await?;
        info!("Victim profile saved");
        Ok(())
    }
}
