use serde::{Deserialize, Serialize};

id_type!(StalkerId, "stalker");

/// What the caller knows about the person harassing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StalkerProfile {
    pub id: StalkerId,
    pub name: String,
    pub aliases: Vec<String>,
    pub relationship: Option<String>,
    pub description: Option<String>,
    pub vehicle: Option<String>,
    pub last_known_address: Option<String>,
}

/// Payload for creating or replacing a stalker record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StalkerDraft {
    pub name: String,
    pub aliases: Vec<String>,
    pub relationship: Option<String>,
    pub description: Option<String>,
    pub vehicle: Option<String>,
    pub last_known_address: Option<String>,
}

impl StalkerDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn into_profile(self, id: StalkerId) -> StalkerProfile {
        StalkerProfile {
            id,
            name: self.name,
            aliases: self.aliases,
            relationship: self.relationship,
            description: self.description,
            vehicle: self.vehicle,
            last_known_address: self.last_known_address,
        }
    }
}
