//! Records of incident reports handed to police departments.

use crate::error::AppError;
use crate::keys::{self, SUBMISSION_LOGS};
use crate::model::{SubmissionId, SubmissionLog, SubmissionRequest};
use crate::session::{Read, Session};
use tracing::{info, instrument};

#[derive(Clone)]
pub struct SubmissionClient {
    session: Session,
}

impl SubmissionClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn get_police_submission_logs(&self) -> Result<Vec<SubmissionLog>, AppError> {
        self.session
            .read(Read::user(SUBMISSION_LOGS), |actor| async move {
                actor.get_police_submission_logs().await
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn log_police_submission(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionId, AppError> {
        let identity = self.session.require_identity()?;

        let id = self
            .session
            .mutate("log_police_submission", |actor| async move {
                actor.log_police_submission(request).await
            })
            .await?;
        self.session
            .invalidate(keys::user(SUBMISSION_LOGS, &identity))
            .await?;
        info!(%id, "Police submission logged");
        Ok(id)
    }
}
