//! # In-Memory Backend
//!
//! A test double for the remote actor. All handles created from one
//! [`InMemoryBackend`] share a single store, so a test can act as several
//! principals against the same data. Every call is recorded, and latency or
//! failures can be injected per method.
//!
//! Authorization follows the real actor's shape closely enough to exercise
//! the client: anonymous callers are refused on user-scoped calls, journal
//! calls require a registered role, department management requires admin, and
//! a caller may assign itself the `User` role.

use super::{BackendError, BackendHandle, BackendResult, ReportHerBackend};
use crate::journal::risk::assess_entries;
use crate::model::*;
use actor_cache::{share, Connector, Principal, SharedError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub method: &'static str,
    pub caller: Option<Principal>,
}

#[derive(Default)]
struct Store {
    next_id: u64,
    roles: HashMap<Principal, UserRole>,
    profiles: HashMap<Principal, UserProfile>,
    incidents: BTreeMap<IncidentId, Incident>,
    evidence: Vec<Evidence>,
    messages: Vec<(Principal, GeneratedMessage)>,
    sms_usage: Vec<(Principal, SmsUsage)>,
    stalkers: BTreeMap<StalkerId, (Principal, StalkerProfile)>,
    abuser_names: HashMap<Principal, String>,
    journals: HashMap<Principal, Vec<JournalEntry>>,
    analyses: HashMap<Principal, JournalAnalysis>,
    victims: HashMap<Principal, VictimProfile>,
    departments: BTreeMap<DepartmentId, PoliceDepartment>,
    submissions: Vec<(Principal, SubmissionLog)>,
    video_storage_id: Option<String>,
    calls: Vec<CallRecord>,
    latency: HashMap<&'static str, Duration>,
    failures: HashMap<&'static str, VecDeque<BackendError>>,
    connect_latency: Duration,
    connect_failures: VecDeque<String>,
}

impl Store {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn require_user(&self, caller: &Principal) -> BackendResult<()> {
        match self.roles.get(caller) {
            Some(role) if role.is_registered() => Ok(()),
            _ => Err(BackendError::Rejected(
                "Unauthorized: caller is not registered as a user".into(),
            )),
        }
    }

    fn require_admin(&self, caller: &Principal) -> BackendResult<()> {
        match self.roles.get(caller) {
            Some(UserRole::Admin) => Ok(()),
            _ => Err(BackendError::Unauthorized("admin role required".into())),
        }
    }

    fn owned_incident(&self, caller: &Principal, id: IncidentId) -> BackendResult<&Incident> {
        self.incidents
            .get(&id)
            .filter(|incident| incident.owner == *caller)
            .ok_or_else(|| BackendError::NotFound(format!("Incident {id} not found")))
    }

    fn owned_stalker(&self, caller: &Principal, id: StalkerId) -> BackendResult<()> {
        match self.stalkers.get(&id) {
            Some((owner, _)) if owner == caller => Ok(()),
            _ => Err(BackendError::NotFound(format!("Stalker profile {id} not found"))),
        }
    }

    fn nearby(&self, location: &Coordinates) -> Vec<NearbyDepartment> {
        let mut nearby: Vec<NearbyDepartment> = self
            .departments
            .values()
            .map(|department| NearbyDepartment {
                distance_km: department.location.distance_km(location),
                department: department.clone(),
            })
            .collect();
        nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        nearby
    }
}

fn non_empty(field: &str, value: &str) -> BackendResult<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(BackendError::InvalidInput(format!("{field} is required")))
    } else {
        Ok(value.to_string())
    }
}

/// Shared state of the fake backend; hands out identity-bound handles.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<Mutex<Store>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that calls the backend as `caller`.
    pub fn handle(&self, caller: Option<Principal>) -> BackendHandle {
        Arc::new(FakeHandle {
            store: self.store.clone(),
            caller,
        })
    }

    pub fn connector(&self) -> InMemoryConnector {
        InMemoryConnector {
            backend: self.clone(),
        }
    }

    pub async fn register(&self, principal: Principal, role: UserRole) {
        self.store.lock().await.roles.insert(principal, role);
    }

    pub async fn role_of(&self, principal: &Principal) -> Option<UserRole> {
        self.store.lock().await.roles.get(principal).copied()
    }

    /// Delays every call of `method`.
    pub async fn set_latency(&self, method: &'static str, latency: Duration) {
        self.store.lock().await.latency.insert(method, latency);
    }

    /// Makes the next call of `method` fail with `error`.
    pub async fn fail_next(&self, method: &'static str, error: BackendError) {
        self.store
            .lock()
            .await
            .failures
            .entry(method)
            .or_default()
            .push_back(error);
    }

    pub async fn set_connect_latency(&self, latency: Duration) {
        self.store.lock().await.connect_latency = latency;
    }

    pub async fn fail_next_connect(&self, message: impl Into<String>) {
        self.store
            .lock()
            .await
            .connect_failures
            .push_back(message.into());
    }

    pub async fn calls(&self) -> Vec<CallRecord> {
        self.store.lock().await.calls.clone()
    }

    pub async fn call_count(&self, method: &str) -> usize {
        self.store
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    /// Adds a department directly, bypassing the admin check.
    pub async fn seed_department(&self, draft: PoliceDepartmentDraft) -> DepartmentId {
        let mut store = self.store.lock().await;
        let id = DepartmentId(store.next_id());
        store.departments.insert(id, draft.into_department(id));
        id
    }

    pub async fn set_video_storage_id(&self, storage_id: impl Into<String>) {
        self.store.lock().await.video_storage_id = Some(storage_id.into());
    }

    /// The stored journal of `principal`, newest first.
    pub async fn journal(&self, principal: &Principal) -> Vec<JournalEntry> {
        self.store
            .lock()
            .await
            .journals
            .get(principal)
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to connect to backend: {0}")]
pub struct ConnectError(String);

/// Connects to an [`InMemoryBackend`], honoring injected connect latency and failures.
#[derive(Clone)]
pub struct InMemoryConnector {
    backend: InMemoryBackend,
}

#[async_trait]
impl Connector<BackendHandle> for InMemoryConnector {
    async fn connect(&self, identity: Option<Principal>) -> Result<BackendHandle, SharedError> {
        let (latency, failure) = {
            let mut store = self.backend.store.lock().await;
            (store.connect_latency, store.connect_failures.pop_front())
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if let Some(message) = failure {
            return Err(share(ConnectError(message)));
        }
        debug!(identity = ?identity.as_ref().map(Principal::as_str), "Backend handle created");
        Ok(self.backend.handle(identity))
    }
}

struct FakeHandle {
    store: Arc<Mutex<Store>>,
    caller: Option<Principal>,
}

impl FakeHandle {
    /// Records the call, applies injected latency and failures, then locks the store.
    async fn enter(&self, method: &'static str) -> BackendResult<MutexGuard<'_, Store>> {
        let (latency, failure) = {
            let mut store = self.store.lock().await;
            store.calls.push(CallRecord {
                method,
                caller: self.caller.clone(),
            });
            let latency = store.latency.get(method).copied();
            let failure = store
                .failures
                .get_mut(method)
                .and_then(VecDeque::pop_front);
            (latency, failure)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = failure {
            return Err(error);
        }
        Ok(self.store.lock().await)
    }

    fn caller(&self) -> BackendResult<&Principal> {
        self.caller
            .as_ref()
            .ok_or_else(|| BackendError::Unauthorized("anonymous caller".into()))
    }
}

#[async_trait]
impl ReportHerBackend for FakeHandle {
    async fn get_caller_user_profile(&self) -> BackendResult<Option<UserProfile>> {
        let store = self.enter("get_caller_user_profile").await?;
        let caller = self.caller()?;
        Ok(store.profiles.get(caller).cloned())
    }

    async fn save_caller_user_profile(&self, profile: UserProfile) -> BackendResult<()> {
        let mut store = self.enter("save_caller_user_profile").await?;
        let caller = self.caller()?;
        non_empty("Name", &profile.name)?;
        store.profiles.insert(caller.clone(), profile);
        Ok(())
    }

    async fn get_user_profile(&self, user: Principal) -> BackendResult<Option<UserProfile>> {
        let store = self.enter("get_user_profile").await?;
        let caller = self.caller()?;
        if *caller != user {
            store.require_admin(caller)?;
        }
        Ok(store.profiles.get(&user).cloned())
    }

    async fn get_caller_user_role(&self) -> BackendResult<UserRole> {
        let store = self.enter("get_caller_user_role").await?;
        let Some(caller) = &self.caller else {
            return Ok(UserRole::Guest);
        };
        store.roles.get(caller).copied().ok_or_else(|| {
            BackendError::Rejected("Unauthorized: caller is not registered".into())
        })
    }

    async fn assign_caller_user_role(&self, user: Principal, role: UserRole) -> BackendResult<()> {
        let mut store = self.enter("assign_caller_user_role").await?;
        let caller = self.caller()?;
        let self_service = *caller == user && role == UserRole::User;
        if !self_service {
            store.require_admin(caller)?;
        }
        store.roles.insert(user, role);
        Ok(())
    }

    async fn is_caller_admin(&self) -> BackendResult<bool> {
        let store = self.enter("is_caller_admin").await?;
        Ok(self
            .caller
            .as_ref()
            .and_then(|caller| store.roles.get(caller))
            == Some(&UserRole::Admin))
    }

    async fn save_incident(&self, draft: IncidentDraft) -> BackendResult<IncidentId> {
        let mut store = self.enter("save_incident").await?;
        let caller = self.caller()?.clone();
        let title = non_empty("Title", &draft.title)?;
        let id = IncidentId(store.next_id());
        store.incidents.insert(
            id,
            Incident {
                id,
                owner: caller,
                title,
                description: draft.description,
                location: draft.location,
                occurred_at: draft.occurred_at,
                stalker_id: draft.stalker_id,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn get_incident(&self, id: IncidentId) -> BackendResult<Option<Incident>> {
        let store = self.enter("get_incident").await?;
        let caller = self.caller()?;
        Ok(store.owned_incident(caller, id).ok().cloned())
    }

    async fn get_all_incidents(&self) -> BackendResult<Vec<Incident>> {
        let store = self.enter("get_all_incidents").await?;
        let caller = self.caller()?;
        let mut incidents: Vec<Incident> = store
            .incidents
            .values()
            .filter(|incident| incident.owner == *caller)
            .cloned()
            .collect();
        incidents.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(incidents)
    }

    async fn generate_incident_summary(&self, id: IncidentId) -> BackendResult<IncidentSummary> {
        let store = self.enter("generate_incident_summary").await?;
        let caller = self.caller()?;
        let incident = store.owned_incident(caller, id)?;
        let location = incident.location.as_deref().unwrap_or("an unknown location");
        Ok(IncidentSummary {
            incident_id: id,
            text: format!(
                "{} on {} at {}: {}",
                incident.title,
                incident.occurred_at.format("%Y-%m-%d %H:%M"),
                location,
                incident.description
            ),
            generated_at: Utc::now(),
        })
    }

    async fn upload_evidence(&self, upload: EvidenceUpload) -> BackendResult<EvidenceId> {
        let mut store = self.enter("upload_evidence").await?;
        let caller = self.caller()?;
        store.owned_incident(caller, upload.incident_id)?;
        if upload.bytes.len() > MAX_EVIDENCE_BYTES {
            return Err(BackendError::InvalidInput("File too large".into()));
        }
        let id = EvidenceId(store.next_id());
        store.evidence.push(Evidence {
            id,
            incident_id: upload.incident_id,
            file_name: upload.file_name,
            content_type: upload.content_type,
            bytes: upload.bytes,
            uploaded_at: Utc::now(),
        });
        Ok(id)
    }

    async fn get_evidence_for_incident(&self, id: IncidentId) -> BackendResult<Vec<Evidence>> {
        let store = self.enter("get_evidence_for_incident").await?;
        let caller = self.caller()?;
        store.owned_incident(caller, id)?;
        Ok(store
            .evidence
            .iter()
            .filter(|evidence| evidence.incident_id == id)
            .cloned()
            .collect())
    }

    async fn generate_message(&self, request: MessageRequest) -> BackendResult<GeneratedMessage> {
        let mut store = self.enter("generate_message").await?;
        let caller = self.caller()?.clone();
        let incident = store.owned_incident(&caller, request.incident_id)?;
        let recipient = request.recipient_name.as_deref().unwrap_or("you");
        let text = match request.tone {
            MessageTone::Firm => format!(
                "Stop contacting me. What happened on {} is documented.",
                incident.occurred_at.format("%Y-%m-%d")
            ),
            MessageTone::Formal => format!(
                "To {recipient}: I am requesting that all contact cease. The incident \"{}\" has been recorded.",
                incident.title
            ),
            MessageTone::Legal => format!(
                "Notice to {recipient}: further contact will be reported to law enforcement. Reference: {}.",
                incident.id
            ),
        };
        let message = GeneratedMessage {
            id: MessageId(store.next_id()),
            incident_id: request.incident_id,
            tone: request.tone,
            text,
            created_at: Utc::now(),
        };
        store.messages.push((caller, message.clone()));
        Ok(message)
    }

    async fn get_messages_for_incident(
        &self,
        id: IncidentId,
    ) -> BackendResult<Vec<GeneratedMessage>> {
        let store = self.enter("get_messages_for_incident").await?;
        let caller = self.caller()?;
        Ok(store
            .messages
            .iter()
            .filter(|(owner, message)| owner == caller && message.incident_id == id)
            .map(|(_, message)| message.clone())
            .collect())
    }

    async fn log_sms_usage(&self, usage: SmsUsage) -> BackendResult<()> {
        let mut store = self.enter("log_sms_usage").await?;
        let caller = self.caller()?.clone();
        let known = store
            .messages
            .iter()
            .any(|(owner, message)| *owner == caller && message.id == usage.message_id);
        if !known {
            return Err(BackendError::NotFound(format!(
                "Message {} not found",
                usage.message_id
            )));
        }
        store.sms_usage.push((caller, usage));
        Ok(())
    }

    async fn save_stalker_profile(&self, draft: StalkerDraft) -> BackendResult<StalkerId> {
        let mut store = self.enter("save_stalker_profile").await?;
        let caller = self.caller()?.clone();
        non_empty("Name", &draft.name)?;
        let id = StalkerId(store.next_id());
        store.stalkers.insert(id, (caller, draft.into_profile(id)));
        Ok(id)
    }

    async fn get_stalker_profile(&self, id: StalkerId) -> BackendResult<Option<StalkerProfile>> {
        let store = self.enter("get_stalker_profile").await?;
        let caller = self.caller()?;
        Ok(store
            .stalkers
            .get(&id)
            .filter(|(owner, _)| owner == caller)
            .map(|(_, profile)| profile.clone()))
    }

    async fn save_multiple_stalker_profile(
        &self,
        drafts: Vec<StalkerDraft>,
    ) -> BackendResult<Vec<StalkerId>> {
        let mut store = self.enter("save_multiple_stalker_profile").await?;
        let caller = self.caller()?.clone();
        for draft in &drafts {
            non_empty("Name", &draft.name)?;
        }
        let mut ids = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let id = StalkerId(store.next_id());
            store.stalkers.insert(id, (caller.clone(), draft.into_profile(id)));
            ids.push(id);
        }
        Ok(ids)
    }

    async fn get_all_stalker_profiles(&self) -> BackendResult<Vec<StalkerProfile>> {
        let store = self.enter("get_all_stalker_profiles").await?;
        let caller = self.caller()?;
        Ok(store
            .stalkers
            .values()
            .filter(|(owner, _)| owner == caller)
            .map(|(_, profile)| profile.clone())
            .collect())
    }

    async fn update_stalker_profile(&self, id: StalkerId, draft: StalkerDraft) -> BackendResult<()> {
        let mut store = self.enter("update_stalker_profile").await?;
        let caller = self.caller()?.clone();
        store.owned_stalker(&caller, id)?;
        non_empty("Name", &draft.name)?;
        store.stalkers.insert(id, (caller, draft.into_profile(id)));
        Ok(())
    }

    async fn delete_stalker_profile(&self, id: StalkerId) -> BackendResult<()> {
        let mut store = self.enter("delete_stalker_profile").await?;
        let caller = self.caller()?;
        store.owned_stalker(caller, id)?;
        store.stalkers.remove(&id);
        Ok(())
    }

    async fn get_abuser_name(&self) -> BackendResult<Option<String>> {
        let store = self.enter("get_abuser_name").await?;
        let caller = self.caller()?;
        store.require_user(caller)?;
        Ok(store.abuser_names.get(caller).cloned())
    }

    async fn set_abuser_name(&self, name: String) -> BackendResult<()> {
        let mut store = self.enter("set_abuser_name").await?;
        let caller = self.caller()?;
        store.require_user(caller)?;
        let name = non_empty("Name", &name)?;
        store.abuser_names.insert(caller.clone(), name);
        Ok(())
    }

    async fn get_journal_entries(&self) -> BackendResult<Vec<JournalEntry>> {
        let store = self.enter("get_journal_entries").await?;
        let caller = self.caller()?;
        store.require_user(caller)?;
        Ok(store.journals.get(caller).cloned().unwrap_or_default())
    }

    async fn add_journal_entry(&self, content: String) -> BackendResult<JournalEntryId> {
        let mut store = self.enter("add_journal_entry").await?;
        let caller = self.caller()?;
        store.require_user(caller)?;
        let content = non_empty("Entry", &content)?;
        let id = JournalEntryId(store.next_id());
        store.journals.entry(caller.clone()).or_default().insert(
            0,
            JournalEntry {
                id: Some(id),
                content,
                timestamp: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn analyze_journal(&self) -> BackendResult<JournalAnalysis> {
        let mut store = self.enter("analyze_journal").await?;
        let caller = self.caller()?;
        store.require_user(caller)?;
        let entries = store.journals.get(caller).cloned().unwrap_or_default();
        let assessment = assess_entries(&entries);
        let analysis = JournalAnalysis {
            risk_level: assessment.level,
            summary: format!(
                "{} of {} entries contain risk indicators",
                assessment.flagged_entries,
                entries.len()
            ),
            flagged_entries: assessment.flagged_entries,
            analyzed_at: Utc::now(),
        };
        store.analyses.insert(caller.clone(), analysis.clone());
        Ok(analysis)
    }

    async fn get_last_journal_analysis(&self) -> BackendResult<Option<JournalAnalysis>> {
        let store = self.enter("get_last_journal_analysis").await?;
        let caller = self.caller()?;
        store.require_user(caller)?;
        Ok(store.analyses.get(caller).cloned())
    }

    async fn get_victim_profile(&self) -> BackendResult<Option<VictimProfile>> {
        let store = self.enter("get_victim_profile").await?;
        let caller = self.caller()?;
        Ok(store.victims.get(caller).cloned())
    }

    async fn save_victim_profile(&self, profile: VictimProfile) -> BackendResult<()> {
        let mut store = self.enter("save_victim_profile").await?;
        let caller = self.caller()?;
        non_empty("Full name", &profile.full_name)?;
        store.victims.insert(caller.clone(), profile);
        Ok(())
    }

    async fn save_police_department(
        &self,
        draft: PoliceDepartmentDraft,
    ) -> BackendResult<DepartmentId> {
        let mut store = self.enter("save_police_department").await?;
        let caller = self.caller()?;
        store.require_admin(caller)?;
        non_empty("Department name", &draft.name)?;
        let id = DepartmentId(store.next_id());
        store.departments.insert(id, draft.into_department(id));
        Ok(id)
    }

    async fn update_police_department(
        &self,
        id: DepartmentId,
        draft: PoliceDepartmentDraft,
    ) -> BackendResult<()> {
        let mut store = self.enter("update_police_department").await?;
        let caller = self.caller()?;
        store.require_admin(caller)?;
        if !store.departments.contains_key(&id) {
            return Err(BackendError::NotFound(format!("Department {id} not found")));
        }
        store.departments.insert(id, draft.into_department(id));
        Ok(())
    }

    async fn delete_police_department(&self, id: DepartmentId) -> BackendResult<()> {
        let mut store = self.enter("delete_police_department").await?;
        let caller = self.caller()?;
        store.require_admin(caller)?;
        store
            .departments
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("Department {id} not found")))
    }

    async fn get_all_police_departments(&self) -> BackendResult<Vec<PoliceDepartment>> {
        let store = self.enter("get_all_police_departments").await?;
        Ok(store.departments.values().cloned().collect())
    }

    async fn find_nearest_police_department(
        &self,
        location: Coordinates,
    ) -> BackendResult<Option<NearbyDepartment>> {
        let store = self.enter("find_nearest_police_department").await?;
        Ok(store.nearby(&location).into_iter().next())
    }

    async fn get_nearest_addresses(&self, query: String) -> BackendResult<Vec<AddressMatch>> {
        let store = self.enter("get_nearest_addresses").await?;
        let query = query.trim().to_lowercase();
        Ok(store
            .departments
            .values()
            .filter(|department| department.address.to_lowercase().contains(&query))
            .map(|department| AddressMatch {
                address: department.address.clone(),
                location: department.location,
            })
            .collect())
    }

    async fn get_nearest_police_departments_to_address(
        &self,
        address: String,
    ) -> BackendResult<Vec<NearbyDepartment>> {
        let store = self.enter("get_nearest_police_departments_to_address").await?;
        let location = store
            .departments
            .values()
            .find(|department| department.address.eq_ignore_ascii_case(address.trim()))
            .map(|department| department.location)
            .ok_or_else(|| BackendError::NotFound(format!("Address not found: {address}")))?;
        Ok(store.nearby(&location))
    }

    async fn log_police_submission(&self, request: SubmissionRequest) -> BackendResult<SubmissionId> {
        let mut store = self.enter("log_police_submission").await?;
        let caller = self.caller()?.clone();
        store.owned_incident(&caller, request.incident_id)?;
        if !store.departments.contains_key(&request.department_id) {
            return Err(BackendError::NotFound(format!(
                "Department {} not found",
                request.department_id
            )));
        }
        let log = SubmissionLog {
            id: SubmissionId(store.next_id()),
            incident_id: request.incident_id,
            department_id: request.department_id,
            channel: request.channel,
            submitted_at: Utc::now(),
        };
        let id = log.id;
        store.submissions.push((caller, log));
        Ok(id)
    }

    async fn get_police_submission_logs(&self) -> BackendResult<Vec<SubmissionLog>> {
        let store = self.enter("get_police_submission_logs").await?;
        let caller = self.caller()?;
        Ok(store
            .submissions
            .iter()
            .filter(|(owner, _)| owner == caller)
            .map(|(_, log)| log.clone())
            .collect())
    }

    async fn get_motivational_video_access(&self) -> BackendResult<VideoAccess> {
        let store = self.enter("get_motivational_video_access").await?;
        let caller = self.caller()?;
        Ok(VideoAccess {
            granted: store
                .roles
                .get(caller)
                .is_some_and(|role| role.is_registered()),
        })
    }

    async fn get_motivational_video_storage_id(&self) -> BackendResult<Option<String>> {
        let store = self.enter("get_motivational_video_storage_id").await?;
        Ok(store.video_storage_id.clone())
    }

    async fn transform(&self, args: TransformArgs) -> BackendResult<HttpResponse> {
        let _store = self.enter("transform").await?;
        Ok(HttpResponse {
            status: args.response.status,
            headers: Vec::new(),
            body: args.response.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Principal {
        Principal::new("alice")
    }

    #[tokio::test]
    async fn test_unregistered_caller_is_refused_journal_access() {
        let backend = InMemoryBackend::new();
        let handle = backend.handle(Some(alice()));

        let probe = handle.get_caller_user_role().await.unwrap_err();
        assert!(probe.is_authorization());
        let write = handle.add_journal_entry("note".into()).await.unwrap_err();
        assert!(write.is_authorization());

        handle
            .assign_caller_user_role(alice(), UserRole::User)
            .await
            .unwrap();
        assert_eq!(handle.get_caller_user_role().await.unwrap(), UserRole::User);
        handle.add_journal_entry("note".into()).await.unwrap();
        assert_eq!(backend.journal(&alice()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_self_service_cannot_grant_admin() {
        let backend = InMemoryBackend::new();
        let handle = backend.handle(Some(alice()));

        let result = handle
            .assign_caller_user_role(alice(), UserRole::Admin)
            .await;
        assert!(matches!(result, Err(BackendError::Unauthorized(_))));
        assert_eq!(backend.role_of(&alice()).await, None);
    }

    #[tokio::test]
    async fn test_incidents_are_private_to_their_owner() {
        let backend = InMemoryBackend::new();
        let alice_handle = backend.handle(Some(alice()));
        let bob_handle = backend.handle(Some(Principal::new("bob")));

        let id = alice_handle
            .save_incident(IncidentDraft::new("Followed home", "Grey car behind me"))
            .await
            .unwrap();

        assert_eq!(alice_handle.get_all_incidents().await.unwrap().len(), 1);
        assert!(bob_handle.get_all_incidents().await.unwrap().is_empty());
        assert_eq!(bob_handle.get_incident(id).await.unwrap(), None);
        assert!(matches!(
            bob_handle.generate_incident_summary(id).await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_anonymous_caller_is_refused() {
        let backend = InMemoryBackend::new();
        let handle = backend.handle(None);

        assert_eq!(handle.get_caller_user_role().await.unwrap(), UserRole::Guest);
        assert!(matches!(
            handle.get_all_incidents().await,
            Err(BackendError::Unauthorized(_))
        ));
        assert_eq!(backend.call_count("get_all_incidents").await, 1);
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let backend = InMemoryBackend::new();
        let handle = backend.handle(Some(alice()));
        backend
            .fail_next("get_all_incidents", BackendError::Transport("reset".into()))
            .await;

        assert!(handle.get_all_incidents().await.is_err());
        assert!(handle.get_all_incidents().await.is_ok());
    }

    #[tokio::test]
    async fn test_nearest_departments_sorted_by_distance() {
        let backend = InMemoryBackend::new();
        let far = backend
            .seed_department(PoliceDepartmentDraft {
                name: "North Station".into(),
                address: "1 North Rd".into(),
                phone: None,
                email: None,
                location: Coordinates::new(40.80, -73.95),
            })
            .await;
        let near = backend
            .seed_department(PoliceDepartmentDraft {
                name: "Central Precinct".into(),
                address: "10 Main St".into(),
                phone: None,
                email: None,
                location: Coordinates::new(40.71, -74.00),
            })
            .await;
        let handle = backend.handle(None);

        let nearest = handle
            .find_nearest_police_department(Coordinates::new(40.70, -74.01))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(nearest.department.id, near);

        let ordered = handle
            .get_nearest_police_departments_to_address("10 main st".into())
            .await
            .unwrap();
        let ids: Vec<DepartmentId> = ordered.iter().map(|n| n.department.id).collect();
        assert_eq!(ids, vec![near, far]);
    }
}
