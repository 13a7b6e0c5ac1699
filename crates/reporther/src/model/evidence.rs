use crate::model::IncidentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

id_type!(EvidenceId, "evidence");

/// Largest evidence file accepted for upload (10 MiB).
pub const MAX_EVIDENCE_BYTES: usize = 10 * 1024 * 1024;

/// Metadata and content of a file attached to an incident.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: EvidenceId,
    pub incident_id: IncidentId,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

/// Payload for attaching a file to an incident.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceUpload {
    pub incident_id: IncidentId,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

// Blobs are summarized by size in logs.
impl std::fmt::Debug for Evidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evidence")
            .field("id", &self.id)
            .field("incident_id", &self.incident_id)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .field("uploaded_at", &self.uploaded_at)
            .finish()
    }
}

impl std::fmt::Debug for EvidenceUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceUpload")
            .field("incident_id", &self.incident_id)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}
