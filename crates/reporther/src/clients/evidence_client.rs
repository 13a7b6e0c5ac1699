//! Files attached to incidents.

use crate::error::AppError;
use crate::keys::{self, EVIDENCE_STALE_TIME, INCIDENT_EVIDENCE};
use crate::model::{Evidence, EvidenceId, EvidenceUpload, IncidentId};
use crate::session::{Read, Session};
use crate::validate;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct EvidenceClient {
    session: Session,
}

impl EvidenceClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn get_evidence_for_incident(
        &self,
        incident_id: Option<IncidentId>,
    ) -> Result<Vec<Evidence>, AppError> {
        let read = Read::shared(INCIDENT_EVIDENCE)
            .required(incident_id)
            .stale_time(EVIDENCE_STALE_TIME);
        self.session
            .read(read, |actor| async move {
                match incident_id {
                    Some(id) => actor.get_evidence_for_incident(id).await,
                    None => Ok(Vec::new()),
                }
            })
            .await
    }

    #[instrument(skip(self, upload), fields(incident_id = %upload.incident_id, size = upload.bytes.len()))]
    pub async fn upload_evidence(&self, upload: EvidenceUpload) -> Result<EvidenceId, AppError> {
        self.session.require_identity()?;
        let upload = validate::evidence(upload)?;
        let incident_id = upload.incident_id;

        let id = self
            .session
            .mutate("upload_evidence", |actor| async move {
                actor.upload_evidence(upload).await
            })
            .await?;
        self.session
            .invalidate(keys::by_id(INCIDENT_EVIDENCE, incident_id))
            .await?;
        info!(%id, "Evidence uploaded");
        Ok(id)
    }
}
