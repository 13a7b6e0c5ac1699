use crate::model::IncidentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

id_type!(MessageId, "message");

/// Register of a generated warning message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageTone {
    Firm,
    Formal,
    Legal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub incident_id: IncidentId,
    pub tone: MessageTone,
    pub recipient_name: Option<String>,
}

/// A warning message generated from an incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMessage {
    pub id: MessageId,
    pub incident_id: IncidentId,
    pub tone: MessageTone,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// One message sent by SMS, recorded for usage accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsUsage {
    pub message_id: MessageId,
    pub phone_number: String,
    pub sent_at: DateTime<Utc>,
}
