//! # Incident Client
//!
//! Reads and writes the caller's incident reports. The incident list always
//! refetches when it is read; summaries are generated by the backend and kept
//! for a short while since generating them is comparatively expensive.

use crate::error::AppError;
use crate::keys::{self, INCIDENT, INCIDENT_SUMMARY, SUMMARY_STALE_TIME, USER_INCIDENTS};
use crate::model::{Incident, IncidentDraft, IncidentId, IncidentSummary};
use crate::session::{Read, Session};
use crate::validate::{self, MAX_NAME_LEN, MAX_TEXT_LEN};
use tracing::{info, instrument};

#[derive(Clone)]
pub struct IncidentClient {
    session: Session,
}

impl IncidentClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn get_all_incidents(&self) -> Result<Vec<Incident>, AppError> {
        let read = Read::user(USER_INCIDENTS).refetch_on_mount();
        self.session
            .read(read, |actor| async move { actor.get_all_incidents().await })
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_incident(&self, id: Option<IncidentId>) -> Result<Option<Incident>, AppError> {
        let read = Read::user(INCIDENT).required(id);
        self.session
            .read(read, |actor| async move {
                match id {
                    Some(id) => actor.get_incident(id).await,
                    None => Ok(None),
                }
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn generate_incident_summary(
        &self,
        id: Option<IncidentId>,
    ) -> Result<Option<IncidentSummary>, AppError> {
        let read = Read::shared(INCIDENT_SUMMARY)
            .required(id)
            .stale_time(SUMMARY_STALE_TIME);
        self.session
            .read(read, |actor| async move {
                match id {
                    Some(id) => actor.generate_incident_summary(id).await.map(Some),
                    None => Ok(None),
                }
            })
            .await
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn save_incident(&self, draft: IncidentDraft) -> Result<IncidentId, AppError> {
        let identity = self.session.require_identity()?;
        let draft = IncidentDraft {
            title: validate::required_text("Title", &draft.title, MAX_NAME_LEN)?,
            description: validate::required_text("Description", &draft.description, MAX_TEXT_LEN)?,
            location: validate::optional_text(draft.location),
            ..draft
        };

        let id = self
            .session
            .mutate("save_incident", |actor| async move {
                actor.save_incident(draft).await
            })
            .await?;
        self.session
            .invalidate(keys::user(USER_INCIDENTS, &identity))
            .await?;
        info!(%id, "Incident saved");
        Ok(id)
    }
}
