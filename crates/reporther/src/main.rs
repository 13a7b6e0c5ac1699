use actor_cache::Principal;
use reporther::backend::fake::InMemoryBackend;
use reporther::config::AppConfig;
use reporther::lifecycle::tracing::setup_tracing;
use reporther::lifecycle::ReportHerApp;
use reporther::model::{
    Coordinates, IncidentDraft, PoliceDepartmentDraft, SubmissionChannel, SubmissionRequest,
};
use reporther::quick_exit::{FileStore, LocalStore, MemoryStore, QuickExit};
use std::sync::Arc;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = AppConfig::load(None).map_err(|e| e.to_string())?;
    info!(?config, "Starting ReportHer demo");

    let backend = InMemoryBackend::new();
    backend
        .seed_department(PoliceDepartmentDraft {
            name: "Central Precinct".to_string(),
            address: "10 Main St".to_string(),
            phone: Some("555-0100".to_string()),
            email: None,
            location: Coordinates::new(40.7128, -74.0060),
        })
        .await;

    let app = ReportHerApp::new(Arc::new(backend.connector()), &config);
    app.login(Principal::new("2vxsx-fae"))
        .await
        .map_err(|e| e.to_string())?;

    let span = tracing::info_span!("incident_report");
    let incident_id = async {
        let mut draft = IncidentDraft::new(
            "Followed after work",
            "A grey sedan followed me from the office to the train station.",
        );
        draft.location = Some("10 Main St".to_string());
        app.incident_client.save_incident(draft).await
    }
    .instrument(span)
    .await
    .map_err(|e| e.user_message())?;
    info!(%incident_id, "Incident recorded");

    let span = tracing::info_span!("journal");
    let journal = async {
        app.journal_client
            .add_journal_entry("He was waiting outside again and threatened me.")
            .await?;
        app.journal_client.assess_local_risk().await
    }
    .instrument(span)
    .await;
    match journal {
        Ok(assessment) => info!(level = ?assessment.level, "Journal entry saved"),
        Err(e) => error!(error = %e, "Journal entry failed: {}", e.user_message()),
    }

    let nearest = app
        .police_client
        .get_nearest_police_departments_to_address("10 Main St")
        .await
        .map_err(|e| e.user_message())?;
    if let Some(nearest) = nearest.first() {
        let request = SubmissionRequest {
            incident_id,
            department_id: nearest.department.id,
            channel: SubmissionChannel::Online,
        };
        match app.submission_client.log_police_submission(request).await {
            Ok(id) => info!(%id, department = %nearest.department.name, "Report submitted"),
            Err(e) => error!(error = %e, "Report submission failed"),
        }
    }

    let exit_url = match &config.storage_path {
        Some(path) => quick_exit_url(QuickExit::new(FileStore::new(path))),
        None => quick_exit_url(QuickExit::new(MemoryStore::new())),
    };
    info!(%exit_url, "Quick exit ready");

    app.logout().await.map_err(|e| e.to_string())?;
    app.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}

fn quick_exit_url<S: LocalStore>(exit: QuickExit<S>) -> String {
    if let Err(e) = exit.save_url("https://weather.example.com/") {
        error!(error = %e, "Could not save quick-exit URL");
    }
    exit.url()
}
