use actor_cache::Principal;
use reporther::backend::fake::InMemoryBackend;
use reporther::backend::BackendError;
use reporther::config::AppConfig;
use reporther::error::AppError;
use reporther::keys::{self, JOURNAL_ENTRIES};
use reporther::lifecycle::ReportHerApp;
use reporther::model::{JournalEntry, RiskLevel, UserRole};
use std::sync::Arc;
use std::time::Duration;

fn alice() -> Principal {
    Principal::new("alice")
}

async fn signed_in(backend: &InMemoryBackend) -> ReportHerApp {
    let app = ReportHerApp::new(Arc::new(backend.connector()), &AppConfig::default());
    app.login(alice()).await.unwrap();
    app.session().mutation_actor().await.unwrap();
    app
}

async fn cached_entries(app: &ReportHerApp) -> Option<Vec<JournalEntry>> {
    app.session()
        .cache()
        .get_data(&keys::user(JOURNAL_ENTRIES, &alice()))
        .await
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_entry_is_visible_before_the_backend_confirms_it() {
    let backend = InMemoryBackend::new();
    backend.register(alice(), UserRole::User).await;
    let app = signed_in(&backend).await;

    app.journal_client.add_journal_entry("Earlier note").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.journal_client.get_journal_entries().await.unwrap().len(), 1);

    backend
        .set_latency("add_journal_entry", Duration::from_secs(2))
        .await;
    let journal = app.journal_client.clone();
    let pending = tokio::spawn(async move { journal.add_journal_entry("Incident at 5pm").await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let entries = cached_entries(&app).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].content, "Incident at 5pm");
    assert!(entries[0].is_pending());
    assert_eq!(entries[1].content, "Earlier note");
    assert_eq!(backend.journal(&alice()).await.len(), 1);

    let id = pending.await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let entries = cached_entries(&app).await.unwrap();
    assert_eq!(entries, backend.journal(&alice()).await);
    assert_eq!(entries[0].id, Some(id));
    assert!(entries.iter().all(|entry| !entry.is_pending()));
}

#[tokio::test(start_paused = true)]
async fn test_slow_read_started_earlier_does_not_hide_the_pending_entry() {
    let backend = InMemoryBackend::new();
    backend.register(alice(), UserRole::User).await;
    let app = signed_in(&backend).await;
    backend
        .set_latency("get_journal_entries", Duration::from_secs(1))
        .await;
    backend
        .set_latency("add_journal_entry", Duration::from_secs(2))
        .await;

    let reader = app.journal_client.clone();
    let read = tokio::spawn(async move { reader.get_journal_entries().await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let journal = app.journal_client.clone();
    let pending = tokio::spawn(async move { journal.add_journal_entry("Incident at 5pm").await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    let contents = |entries: Option<Vec<JournalEntry>>| -> Option<String> {
        entries.and_then(|entries| entries.first().map(|entry| entry.content.clone()))
    };
    assert_eq!(contents(cached_entries(&app).await), Some("Incident at 5pm".to_string()));

    // The earlier read finishes while the write is still in flight
    assert!(read.await.unwrap().unwrap().is_empty());
    tokio::time::sleep(Duration::from_millis(100)).await;
    let entries = cached_entries(&app).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].content, "Incident at 5pm");
    assert!(entries[0].is_pending());

    let id = pending.await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let entries = cached_entries(&app).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, Some(id));
    assert!(!entries[0].is_pending());
}

#[tokio::test(start_paused = true)]
async fn test_failed_write_rolls_back_the_pending_entry() {
    let backend = InMemoryBackend::new();
    backend.register(alice(), UserRole::User).await;
    let app = signed_in(&backend).await;
    app.journal_client.get_journal_entries().await.unwrap();

    backend
        .fail_next("add_journal_entry", BackendError::Transport("connection reset".into()))
        .await;
    let result = app.journal_client.add_journal_entry("Incident at 5pm").await;

    assert_eq!(
        result,
        Err(AppError::Backend(BackendError::Transport("connection reset".into())))
    );
    assert_eq!(cached_entries(&app).await, Some(Vec::new()));
    assert_eq!(backend.call_count("add_journal_entry").await, 1);
    assert!(backend.journal(&alice()).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_self_assigned_role_looks_like_a_first_try_success() {
    let registered = InMemoryBackend::new();
    registered.register(alice(), UserRole::User).await;
    let fresh = InMemoryBackend::new();

    let mut outcomes = Vec::new();
    for backend in [&registered, &fresh] {
        let app = signed_in(backend).await;
        let result = app.journal_client.add_journal_entry(" Incident at 5pm ").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let contents: Vec<String> = app
            .journal_client
            .get_journal_entries()
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.content)
            .collect();
        outcomes.push((result.is_ok(), contents));
    }

    assert_eq!(outcomes[0], outcomes[1]);
    assert_eq!(outcomes[0], (true, vec!["Incident at 5pm".to_string()]));
    assert_eq!(registered.call_count("assign_caller_user_role").await, 0);
    assert_eq!(fresh.call_count("assign_caller_user_role").await, 1);
    assert_eq!(fresh.call_count("get_caller_user_role").await, 2);
    assert_eq!(fresh.role_of(&alice()).await, Some(UserRole::User));
}

#[tokio::test(start_paused = true)]
async fn test_failed_role_assignment_asks_to_contact_support() {
    let backend = InMemoryBackend::new();
    let app = signed_in(&backend).await;
    backend
        .fail_next(
            "assign_caller_user_role",
            BackendError::Unauthorized("role assignment disabled".into()),
        )
        .await;

    let result = app.journal_client.add_journal_entry("Incident at 5pm").await;

    let error = result.unwrap_err();
    assert!(matches!(error, AppError::PermissionSetupFailed(_)));
    assert!(error.user_message().contains("contact support"));
    assert_eq!(backend.call_count("get_caller_user_role").await, 1);
    assert_eq!(backend.call_count("assign_caller_user_role").await, 1);
    assert_eq!(backend.call_count("add_journal_entry").await, 0);
    assert_eq!(cached_entries(&app).await, None);
}

#[tokio::test(start_paused = true)]
async fn test_abuser_name_and_analysis() {
    let backend = InMemoryBackend::new();
    let app = signed_in(&backend).await;

    // reads do not repair permissions
    let denied = app.journal_client.get_abuser_name().await;
    assert!(matches!(denied, Err(AppError::AuthorizationDenied(ref message)) if message.contains("not registered")));

    app.journal_client.set_abuser_name("  J. Doe ").await.unwrap();
    assert_eq!(
        app.journal_client.get_abuser_name().await.unwrap(),
        Some("J. Doe".to_string())
    );

    app.journal_client
        .add_journal_entry("He said he would kill me if I left")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let local = app.journal_client.assess_local_risk().await.unwrap();
    assert_eq!(local.level, RiskLevel::Severe);

    let analysis = app.journal_client.analyze_journal().await.unwrap();
    assert_eq!(analysis.risk_level, RiskLevel::Severe);
    assert_eq!(analysis.flagged_entries, 1);
    assert_eq!(
        app.journal_client.get_last_journal_analysis().await.unwrap(),
        Some(analysis)
    );
}
