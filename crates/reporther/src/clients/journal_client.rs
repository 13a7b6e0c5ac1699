//! # Journal Client
//!
//! The private journal: entries, the abuser's name and the backend's risk
//! analysis. Journal writes run the permission probe first (see
//! [`ensure_user_role`]) because a freshly signed-in caller may not have a role
//! yet.
//!
//! ## Optimistic entries
//!
//! [`JournalClient::add_journal_entry`] prepends a pending entry (no id, client
//! timestamp) to the cached list before the remote call, so the entry is
//! visible for the whole round trip. The cached write supersedes any journal
//! fetch already in flight; its older result is discarded. On success the list is invalidated and
//! refetched in the background, which replaces the pending entry with the
//! backend's copy. On failure the pending entry is removed again.

use crate::backend::BackendHandle;
use crate::error::AppError;
use crate::journal::{assess_entries, ensure_user_role, RiskAssessment};
use crate::keys::{self, ABUSER_NAME, JOURNAL_ANALYSIS, JOURNAL_ENTRIES};
use crate::model::{JournalAnalysis, JournalEntry, JournalEntryId};
use crate::session::{Read, Session};
use crate::validate::{self, MAX_NAME_LEN, MAX_TEXT_LEN};
use actor_cache::{Principal, QueryKey};
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct JournalClient {
    session: Session,
}

impl JournalClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn get_journal_entries(&self) -> Result<Vec<JournalEntry>, AppError> {
        self.session
            .read(Read::user(JOURNAL_ENTRIES), fetch_entries)
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_abuser_name(&self) -> Result<Option<String>, AppError> {
        self.session
            .read(Read::user(ABUSER_NAME), |actor| async move {
                actor.get_abuser_name().await
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_last_journal_analysis(&self) -> Result<Option<JournalAnalysis>, AppError> {
        self.session
            .read(Read::user(JOURNAL_ANALYSIS), |actor| async move {
                actor.get_last_journal_analysis().await
            })
            .await
    }

    /// Keyword-based risk assessment of the journal as currently cached or fetched.
    #[instrument(skip(self))]
    pub async fn assess_local_risk(&self) -> Result<RiskAssessment, AppError> {
        let entries = self.get_journal_entries().await?;
        let assessment = assess_entries(&entries);
        debug!(level = ?assessment.level, score = assessment.score, "Local risk assessed");
        Ok(assessment)
    }

    #[instrument(skip(self, name))]
    pub async fn set_abuser_name(&self, name: &str) -> Result<(), AppError> {
        let name = validate::required_text("Name", name, MAX_NAME_LEN)?;
        let (identity, actor) = self.permitted_actor().await?;
        let key = keys::user(ABUSER_NAME, &identity);
        let ticket = self.session.cache().issue_ticket(&key).await?;

        info!("Calling backend");
        let stored = name.clone();
        actor.set_abuser_name(name).await.map_err(|error| {
            warn!(error = %error, "Saving abuser name failed");
            AppError::from(error)
        })?;

        if !self
            .session
            .cache()
            .set_data_fenced(&key, ticket, Some(stored))
            .await?
        {
            debug!(%key, "Saved name superseded in cache");
        }
        self.session.invalidate(key).await?;
        Ok(())
    }

    /// Adds an entry, showing it in the cached list before the backend confirms it.
    #[instrument(skip(self, content))]
    pub async fn add_journal_entry(&self, content: &str) -> Result<JournalEntryId, AppError> {
        let content = validate::required_text("Journal entry", content, MAX_TEXT_LEN)?;
        let (identity, actor) = self.permitted_actor().await?;

        let key = keys::user(JOURNAL_ENTRIES, &identity);
        let pending = JournalEntry::pending(content.clone());
        let marker = pending.clone();
        self.session
            .cache()
            .update_data::<Vec<JournalEntry>, _>(&key, move |current| {
                let mut entries = current.unwrap_or_default();
                entries.insert(0, pending);
                Some(entries)
            })
            .await?;
        debug!(%key, "Pending entry inserted");

        info!("Calling backend");
        match actor.add_journal_entry(content).await {
            Ok(id) => {
                self.session.invalidate(key).await?;
                self.session
                    .refetch_in_background(Read::user(JOURNAL_ENTRIES), fetch_entries);
                info!(%id, "Journal entry added");
                Ok(id)
            }
            Err(error) => {
                warn!(error = %error, "Adding journal entry failed, rolling back");
                self.roll_back(&key, marker).await?;
                self.session.invalidate(key).await?;
                Err(error.into())
            }
        }
    }

    /// Runs the backend analysis and caches it as the latest one.
    #[instrument(skip(self))]
    pub async fn analyze_journal(&self) -> Result<JournalAnalysis, AppError> {
        let (identity, actor) = self.permitted_actor().await?;
        let key = keys::user(JOURNAL_ANALYSIS, &identity);
        let ticket = self.session.cache().issue_ticket(&key).await?;

        info!("Calling backend");
        let analysis = actor.analyze_journal().await.map_err(|error| {
            warn!(error = %error, "Journal analysis failed");
            AppError::from(error)
        })?;

        // A logout during the call forgets the ticket, so nothing is cached.
        let cached = self
            .session
            .cache()
            .set_data_fenced(&key, ticket, Some(analysis.clone()))
            .await?;
        info!(level = ?analysis.risk_level, cached, "Journal analyzed");
        Ok(analysis)
    }

    /// The caller and a ready handle whose role allows journal writes.
    async fn permitted_actor(&self) -> Result<(Principal, BackendHandle), AppError> {
        let identity = self.session.require_identity()?;
        let actor = self.session.mutation_actor().await?;
        ensure_user_role(&actor, &identity).await?;
        Ok((identity, actor))
    }

    async fn roll_back(&self, key: &QueryKey, marker: JournalEntry) -> Result<(), AppError> {
        self.session
            .cache()
            .update_data::<Vec<JournalEntry>, _>(key, move |current| {
                current.map(|mut entries| {
                    if let Some(position) = entries.iter().position(|entry| *entry == marker) {
                        entries.remove(position);
                    }
                    entries
                })
            })
            .await?;
        Ok(())
    }
}

async fn fetch_entries(actor: BackendHandle) -> crate::backend::BackendResult<Vec<JournalEntry>> {
    actor.get_journal_entries().await
}
