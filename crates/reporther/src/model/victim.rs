use serde::{Deserialize, Serialize};

/// Contact details of the person filing reports, used to fill police submissions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VictimProfile {
    pub full_name: String,
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}
