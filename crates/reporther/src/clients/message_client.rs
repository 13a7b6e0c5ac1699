//! Warning messages generated from incidents, and SMS usage accounting.

use crate::error::AppError;
use crate::keys::{self, INCIDENT_MESSAGES};
use crate::model::{GeneratedMessage, IncidentId, MessageRequest, SmsUsage};
use crate::session::{Read, Session};
use crate::validate::{self, MAX_NAME_LEN};
use tracing::{debug, info, instrument};

const MAX_PHONE_LEN: usize = 32;

#[derive(Clone)]
pub struct MessageClient {
    session: Session,
}

impl MessageClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn get_messages_for_incident(
        &self,
        incident_id: Option<IncidentId>,
    ) -> Result<Vec<GeneratedMessage>, AppError> {
        let read = Read::shared(INCIDENT_MESSAGES).required(incident_id);
        self.session
            .read(read, |actor| async move {
                match incident_id {
                    Some(id) => actor.get_messages_for_incident(id).await,
                    None => Ok(Vec::new()),
                }
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn generate_message(
        &self,
        request: MessageRequest,
    ) -> Result<GeneratedMessage, AppError> {
        self.session.require_identity()?;
        let recipient_name = validate::optional_text(request.recipient_name)
            .map(|name| validate::required_text("Recipient name", &name, MAX_NAME_LEN))
            .transpose()?;
        let request = MessageRequest {
            recipient_name,
            ..request
        };
        let incident_id = request.incident_id;

        let message = self
            .session
            .mutate("generate_message", |actor| async move {
                actor.generate_message(request).await
            })
            .await?;
        self.session
            .invalidate(keys::by_id(INCIDENT_MESSAGES, incident_id))
            .await?;
        info!(id = %message.id, "Message generated");
        Ok(message)
    }

    #[instrument(skip(self, usage), fields(message_id = %usage.message_id))]
    pub async fn log_sms_usage(&self, usage: SmsUsage) -> Result<(), AppError> {
        self.session.require_identity()?;
        let phone_number = validate::required_text("Phone number", &usage.phone_number, MAX_PHONE_LEN)?;
        let usage = SmsUsage {
            phone_number,
            ..usage
        };

        self.session
            .mutate("log_sms_usage", |actor| async move {
                actor.log_sms_usage(usage).await
            })
            .await?;
        debug!("SMS usage logged");
        Ok(())
    }
}
