use crate::backend::BackendHandle;
use crate::clients::{
    EvidenceClient, IncidentClient, JournalClient, MediaClient, MessageClient, PoliceClient,
    ProfileClient, StalkerClient, SubmissionClient, VictimClient,
};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::session::Session;
use actor_cache::{ActorProvider, CacheActor, Connector, Principal, Readiness};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

/// How long shutdown waits for the cache actor to drain.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The running client: cache actor, handle provider and every entity client.
///
/// # Example
///
/// ```ignore
/// let backend = InMemoryBackend::new();
/// let app = ReportHerApp::new(Arc::new(backend.connector()), &AppConfig::default());
///
/// app.login(Principal::new("2vxsx-fae")).await?;
/// let id = app.incident_client.save_incident(draft).await?;
///
/// app.shutdown().await?;
/// ```
pub struct ReportHerApp {
    pub profile_client: ProfileClient,
    pub incident_client: IncidentClient,
    pub evidence_client: EvidenceClient,
    pub message_client: MessageClient,
    pub stalker_client: StalkerClient,
    pub journal_client: JournalClient,
    pub victim_client: VictimClient,
    pub police_client: PoliceClient,
    pub submission_client: SubmissionClient,
    pub media_client: MediaClient,

    session: Session,
    cache_handle: JoinHandle<()>,
}

impl ReportHerApp {
    /// Starts the cache actor and wires every client to it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(connector: Arc<dyn Connector<BackendHandle>>, config: &AppConfig) -> Self {
        let (cache_actor, cache) = CacheActor::new(config.cache_buffer);
        let cache_handle = tokio::spawn(cache_actor.run());

        let provider = ActorProvider::new(cache, connector, config.wait_options());
        let session = Session::new(provider);
        info!(
            wait_timeout_ms = config.actor_wait_timeout_ms,
            cache_buffer = config.cache_buffer,
            "ReportHer client started"
        );

        Self {
            profile_client: ProfileClient::new(session.clone()),
            incident_client: IncidentClient::new(session.clone()),
            evidence_client: EvidenceClient::new(session.clone()),
            message_client: MessageClient::new(session.clone()),
            stalker_client: StalkerClient::new(session.clone()),
            journal_client: JournalClient::new(session.clone()),
            victim_client: VictimClient::new(session.clone()),
            police_client: PoliceClient::new(session.clone()),
            submission_client: SubmissionClient::new(session.clone()),
            media_client: MediaClient::new(session.clone()),
            session,
            cache_handle,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn identity(&self) -> Option<Principal> {
        self.session.identity()
    }

    #[instrument(skip(self))]
    pub async fn login(&self, principal: Principal) -> Result<(), AppError> {
        self.session.provider().set_identity(Some(principal)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AppError> {
        self.session.provider().set_identity(None).await?;
        Ok(())
    }

    /// Readiness of the current identity's backend handle.
    pub async fn readiness(&self) -> Result<Readiness, AppError> {
        self.session.readiness().await
    }

    /// Starts connecting now instead of on first use.
    pub async fn connect(&self) -> Result<(), AppError> {
        self.session.provider().ensure_started().await?;
        Ok(())
    }

    /// Retries the connection after it failed.
    pub async fn reconnect(&self) -> Result<(), AppError> {
        self.session.provider().restart().await?;
        Ok(())
    }

    /// Cancels waiting writes, drops every client and waits for the cache actor to stop.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down ReportHer client...");
        self.session.close();

        let Self {
            profile_client,
            incident_client,
            evidence_client,
            message_client,
            stalker_client,
            journal_client,
            victim_client,
            police_client,
            submission_client,
            media_client,
            session,
            cache_handle,
        } = self;
        drop((
            profile_client,
            incident_client,
            evidence_client,
            message_client,
            stalker_client,
            journal_client,
            victim_client,
            police_client,
            submission_client,
            media_client,
        ));
        drop(session);

        let abort = cache_handle.abort_handle();
        match tokio::time::timeout(SHUTDOWN_GRACE, cache_handle).await {
            Ok(Ok(())) => {
                info!("ReportHer client shut down");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "Cache actor task failed");
                Err(format!("Cache actor failed: {e}"))
            }
            Err(_) => {
                warn!(grace = ?SHUTDOWN_GRACE, "Cache actor still busy, aborting");
                abort.abort();
                Ok(())
            }
        }
    }
}
