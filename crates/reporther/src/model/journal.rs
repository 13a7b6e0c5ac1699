use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

id_type!(JournalEntryId, "entry");

/// One private journal entry.
///
/// Entries inserted optimistically on the client have no `id` until the
/// backend copy replaces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Option<JournalEntryId>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl JournalEntry {
    pub fn pending(content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Severe,
}

/// The backend's latest analysis of a caller's journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalAnalysis {
    pub risk_level: RiskLevel,
    pub summary: String,
    pub flagged_entries: usize,
    pub analyzed_at: DateTime<Utc>,
}
