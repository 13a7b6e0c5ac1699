//! Access to the motivational video.

use crate::error::AppError;
use crate::keys::{VIDEO_ACCESS, VIDEO_STORAGE_ID};
use crate::model::VideoAccess;
use crate::session::{Read, Session};
use tracing::instrument;

#[derive(Clone)]
pub struct MediaClient {
    session: Session,
}

impl MediaClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn get_motivational_video_access(&self) -> Result<VideoAccess, AppError> {
        self.session
            .read(Read::user(VIDEO_ACCESS), |actor| async move {
                actor.get_motivational_video_access().await
            })
            .await
    }

    /// Storage id of the video; only looked up once access is granted.
    #[instrument(skip(self))]
    pub async fn get_motivational_video_storage_id(&self) -> Result<Option<String>, AppError> {
        if !self.get_motivational_video_access().await?.granted {
            return Ok(None);
        }
        self.session
            .read(Read::shared(VIDEO_STORAGE_ID), |actor| async move {
                actor.get_motivational_video_storage_id().await
            })
            .await
    }
}
