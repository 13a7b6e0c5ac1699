//! # Stalker Client
//!
//! The caller's records about the people harassing them. Every write
//! invalidates the record list; updates and deletes also invalidate the
//! single-record entry they touched.

use crate::error::AppError;
use crate::keys::{self, STALKER_PROFILE, STALKER_PROFILES};
use crate::model::{StalkerDraft, StalkerId, StalkerProfile};
use crate::session::{Read, Session};
use crate::validate::{self, MAX_NAME_LEN, MAX_TEXT_LEN};
use actor_cache::{KeyFilter, Principal};
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct StalkerClient {
    session: Session,
}

impl StalkerClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn get_all_stalker_profiles(&self) -> Result<Vec<StalkerProfile>, AppError> {
        self.session
            .read(Read::user(STALKER_PROFILES), |actor| async move {
                actor.get_all_stalker_profiles().await
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_stalker_profile(
        &self,
        id: Option<StalkerId>,
    ) -> Result<Option<StalkerProfile>, AppError> {
        let read = Read::user(STALKER_PROFILE).required(id);
        self.session
            .read(read, |actor| async move {
                match id {
                    Some(id) => actor.get_stalker_profile(id).await,
                    None => Ok(None),
                }
            })
            .await
    }

    #[instrument(skip(self, draft))]
    pub async fn save_stalker_profile(&self, draft: StalkerDraft) -> Result<StalkerId, AppError> {
        let identity = self.session.require_identity()?;
        let draft = clean_draft(draft)?;

        let id = self
            .session
            .mutate("save_stalker_profile", |actor| async move {
                actor.save_stalker_profile(draft).await
            })
            .await?;
        self.invalidate_list(&identity).await?;
        info!(%id, "Stalker profile saved");
        Ok(id)
    }

    /// Saves several records in one remote call. An empty batch makes no call.
    #[instrument(skip(self, drafts), fields(count = drafts.len()))]
    pub async fn save_multiple_stalker_profiles(
        &self,
        drafts: Vec<StalkerDraft>,
    ) -> Result<Vec<StalkerId>, AppError> {
        let identity = self.session.require_identity()?;
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let drafts = drafts
            .into_iter()
            .map(clean_draft)
            .collect::<Result<Vec<_>, _>>()?;

        let ids = self
            .session
            .mutate("save_multiple_stalker_profile", |actor| async move {
                actor.save_multiple_stalker_profile(drafts).await
            })
            .await?;
        self.invalidate_list(&identity).await?;
        info!(count = ids.len(), "Stalker profiles saved");
        Ok(ids)
    }

    #[instrument(skip(self, draft))]
    pub async fn update_stalker_profile(
        &self,
        id: StalkerId,
        draft: StalkerDraft,
    ) -> Result<(), AppError> {
        let identity = self.session.require_identity()?;
        let draft = clean_draft(draft)?;

        self.session
            .mutate("update_stalker_profile", |actor| async move {
                actor.update_stalker_profile(id, draft).await
            })
            .await?;
        self.invalidate_record(&identity, id).await?;
        debug!(%id, "Stalker profile updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_stalker_profile(&self, id: StalkerId) -> Result<(), AppError> {
        let identity = self.session.require_identity()?;

        self.session
            .mutate("delete_stalker_profile", |actor| async move {
                actor.delete_stalker_profile(id).await
            })
            .await?;
        self.invalidate_record(&identity, id).await?;
        info!(%id, "Stalker profile deleted");
        Ok(())
    }

    async fn invalidate_list(&self, identity: &Principal) -> Result<(), AppError> {
        self.session
            .invalidate(keys::user(STALKER_PROFILES, identity))
            .await?;
        Ok(())
    }

    async fn invalidate_record(&self, identity: &Principal, id: StalkerId) -> Result<(), AppError> {
        self.invalidate_list(identity).await?;
        let record = keys::user(STALKER_PROFILE, identity).with_param(id);
        self.session.invalidate(KeyFilter::Exact(record)).await?;
        Ok(())
    }
}

fn clean_draft(draft: StalkerDraft) -> Result<StalkerDraft, AppError> {
    Ok(StalkerDraft {
        name: validate::required_text("Name", &draft.name, MAX_NAME_LEN)?,
        aliases: draft
            .aliases
            .into_iter()
            .filter_map(|alias| validate::optional_text(Some(alias)))
            .collect(),
        relationship: validate::optional_text(draft.relationship),
        description: validate::optional_text(draft.description)
            .map(|text| validate::required_text("Description", &text, MAX_TEXT_LEN))
            .transpose()?,
        vehicle: validate::optional_text(draft.vehicle),
        last_known_address: validate::optional_text(draft.last_known_address),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_draft_trims_and_drops_blanks() {
        let draft = StalkerDraft {
            name: "  J. Doe ".into(),
            aliases: vec![" Jay ".into(), "   ".into()],
            relationship: Some("   ".into()),
            ..StalkerDraft::default()
        };
        let cleaned = clean_draft(draft).unwrap();
        assert_eq!(cleaned.name, "J. Doe");
        assert_eq!(cleaned.aliases, vec!["Jay".to_string()]);
        assert_eq!(cleaned.relationship, None);

        assert!(clean_draft(StalkerDraft::new("  ")).is_err());
    }
}
