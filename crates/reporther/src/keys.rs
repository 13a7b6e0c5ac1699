//! Cache scopes and staleness of every backend read.
//!
//! User-scoped scopes are keyed by the caller's principal as well, so a
//! value fetched for one account can never be served to another.

use actor_cache::{Principal, QueryKey};
use std::fmt::Display;
use std::time::Duration;

// --- User-scoped ---
pub const CALLER_PROFILE: &str = "currentUserProfile";
pub const CALLER_ROLE: &str = "callerUserRole";
pub const IS_ADMIN: &str = "isCallerAdmin";
pub const USER_INCIDENTS: &str = "userIncidents";
pub const STALKER_PROFILES: &str = "stalkerProfiles";
pub const ABUSER_NAME: &str = "abuserName";
pub const JOURNAL_ENTRIES: &str = "journalEntries";
pub const JOURNAL_ANALYSIS: &str = "lastJournalAnalysis";
pub const VICTIM_PROFILE: &str = "victimProfile";
pub const SUBMISSION_LOGS: &str = "policeSubmissionLogs";
pub const VIDEO_ACCESS: &str = "motivationalVideoAccess";

// --- Keyed by id or search input ---
pub const USER_PROFILE: &str = "userProfile";
pub const INCIDENT: &str = "incident";
pub const INCIDENT_SUMMARY: &str = "incidentSummary";
pub const INCIDENT_EVIDENCE: &str = "incidentEvidence";
pub const INCIDENT_MESSAGES: &str = "incidentMessages";
pub const STALKER_PROFILE: &str = "stalkerProfile";
pub const POLICE_DEPARTMENTS: &str = "policeDepartments";
pub const NEAREST_DEPARTMENT: &str = "nearestPoliceDepartment";
pub const NEAREST_ADDRESSES: &str = "nearestAddresses";
pub const DEPARTMENTS_NEAR_ADDRESS: &str = "departmentsNearAddress";
pub const VIDEO_STORAGE_ID: &str = "motivationalVideoStorageId";

pub const SUMMARY_STALE_TIME: Duration = Duration::from_secs(30);
pub const EVIDENCE_STALE_TIME: Duration = Duration::from_secs(30);
pub const POLICE_STALE_TIME: Duration = Duration::from_secs(5 * 60);

pub fn user(scope: &str, identity: &Principal) -> QueryKey {
    QueryKey::new(scope).with_identity(identity.clone())
}

pub fn by_id(scope: &str, id: impl Display) -> QueryKey {
    QueryKey::new(scope).with_param(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IncidentId;

    #[test]
    fn test_key_shapes() {
        let alice = Principal::new("alice");
        assert_eq!(user(USER_INCIDENTS, &alice).to_string(), "userIncidents@alice");
        assert_eq!(
            by_id(INCIDENT_EVIDENCE, IncidentId(4)).to_string(),
            "incidentEvidence/incident_4"
        );
    }
}
