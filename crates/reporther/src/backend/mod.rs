//! # Backend Contract
//!
//! The RPC surface of the remote ReportHer actor. A handle is bound to the
//! identity it was created for: every call is made *as* that principal, and
//! user-scoped methods act on the caller's own records.
//!
//! Handles are produced by a [`Connector`](actor_cache::Connector) and kept in
//! the query cache by the [`ActorProvider`](actor_cache::ActorProvider); code in
//! this crate never constructs one directly.

pub mod error;
pub mod fake;

pub use error::BackendError;

use crate::model::*;
use actor_cache::Principal;
use async_trait::async_trait;
use std::sync::Arc;

pub type BackendResult<T> = Result<T, BackendError>;

/// A shareable, identity-bound backend handle.
pub type BackendHandle = Arc<dyn ReportHerBackend>;

#[async_trait]
pub trait ReportHerBackend: Send + Sync + 'static {
    // --- Profile ---
    async fn get_caller_user_profile(&self) -> BackendResult<Option<UserProfile>>;
    async fn save_caller_user_profile(&self, profile: UserProfile) -> BackendResult<()>;
    async fn get_user_profile(&self, user: Principal) -> BackendResult<Option<UserProfile>>;
    async fn get_caller_user_role(&self) -> BackendResult<UserRole>;
    async fn assign_caller_user_role(&self, user: Principal, role: UserRole) -> BackendResult<()>;
    async fn is_caller_admin(&self) -> BackendResult<bool>;

    // --- Incidents ---
    async fn save_incident(&self, draft: IncidentDraft) -> BackendResult<IncidentId>;
    async fn get_incident(&self, id: IncidentId) -> BackendResult<Option<Incident>>;
    async fn get_all_incidents(&self) -> BackendResult<Vec<Incident>>;
    async fn generate_incident_summary(&self, id: IncidentId) -> BackendResult<IncidentSummary>;

    // --- Evidence ---
    async fn upload_evidence(&self, upload: EvidenceUpload) -> BackendResult<EvidenceId>;
    async fn get_evidence_for_incident(&self, id: IncidentId) -> BackendResult<Vec<Evidence>>;

    // --- Messages ---
    async fn generate_message(&self, request: MessageRequest) -> BackendResult<GeneratedMessage>;
    async fn get_messages_for_incident(&self, id: IncidentId)
        -> BackendResult<Vec<GeneratedMessage>>;
    async fn log_sms_usage(&self, usage: SmsUsage) -> BackendResult<()>;

    // --- Stalker records ---
    async fn save_stalker_profile(&self, draft: StalkerDraft) -> BackendResult<StalkerId>;
    async fn get_stalker_profile(&self, id: StalkerId) -> BackendResult<Option<StalkerProfile>>;
    async fn save_multiple_stalker_profile(
        &self,
        drafts: Vec<StalkerDraft>,
    ) -> BackendResult<Vec<StalkerId>>;
    async fn get_all_stalker_profiles(&self) -> BackendResult<Vec<StalkerProfile>>;
    async fn update_stalker_profile(&self, id: StalkerId, draft: StalkerDraft)
        -> BackendResult<()>;
    async fn delete_stalker_profile(&self, id: StalkerId) -> BackendResult<()>;

    // --- Journal ---
    async fn get_abuser_name(&self) -> BackendResult<Option<String>>;
    async fn set_abuser_name(&self, name: String) -> BackendResult<()>;
    async fn get_journal_entries(&self) -> BackendResult<Vec<JournalEntry>>;
    async fn add_journal_entry(&self, content: String) -> BackendResult<JournalEntryId>;
    async fn analyze_journal(&self) -> BackendResult<JournalAnalysis>;
    async fn get_last_journal_analysis(&self) -> BackendResult<Option<JournalAnalysis>>;

    // --- Victim profile ---
    async fn get_victim_profile(&self) -> BackendResult<Option<VictimProfile>>;
    async fn save_victim_profile(&self, profile: VictimProfile) -> BackendResult<()>;

    // --- Police departments ---
    async fn save_police_department(&self, draft: PoliceDepartmentDraft)
        -> BackendResult<DepartmentId>;
    async fn update_police_department(
        &self,
        id: DepartmentId,
        draft: PoliceDepartmentDraft,
    ) -> BackendResult<()>;
    async fn delete_police_department(&self, id: DepartmentId) -> BackendResult<()>;
    async fn get_all_police_departments(&self) -> BackendResult<Vec<PoliceDepartment>>;
    async fn find_nearest_police_department(
        &self,
        location: Coordinates,
    ) -> BackendResult<Option<NearbyDepartment>>;
    async fn get_nearest_addresses(&self, query: String) -> BackendResult<Vec<AddressMatch>>;
    async fn get_nearest_police_departments_to_address(
        &self,
        address: String,
    ) -> BackendResult<Vec<NearbyDepartment>>;

    // --- Submission logs ---
    async fn log_police_submission(&self, request: SubmissionRequest)
        -> BackendResult<SubmissionId>;
    async fn get_police_submission_logs(&self) -> BackendResult<Vec<SubmissionLog>>;

    // --- Media ---
    async fn get_motivational_video_access(&self) -> BackendResult<VideoAccess>;
    async fn get_motivational_video_storage_id(&self) -> BackendResult<Option<String>>;

    /// Sanitizes a raw outbound HTTP response. Platform plumbing, not wrapped
    /// by any client.
    async fn transform(&self, args: TransformArgs) -> BackendResult<HttpResponse>;
}
