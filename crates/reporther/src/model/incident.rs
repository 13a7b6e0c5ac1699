use crate::model::StalkerId;
use actor_cache::Principal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

id_type!(
    /// Type-safe identifier for incident reports.
    IncidentId,
    "incident"
);

/// A documented harassment or stalking incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub owner: Principal,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub stalker_id: Option<StalkerId>,
    pub created_at: DateTime<Utc>,
}

/// Payload for reporting a new incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentDraft {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub stalker_id: Option<StalkerId>,
}

impl IncidentDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            location: None,
            occurred_at: Utc::now(),
            stalker_id: None,
        }
    }
}

/// A generated plain-text summary of one incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentSummary {
    pub incident_id: IncidentId,
    pub text: String,
    pub generated_at: DateTime<Utc>,
}
