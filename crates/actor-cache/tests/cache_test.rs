use actor_cache::mock::MockConnector;
use actor_cache::wait::wait_for_ready;
use actor_cache::{
    share, ActorProvider, CacheActor, CacheEventKind, KeyFilter, Principal, QueryKey,
    WaitError, WaitOptions,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
struct Backend(String);

#[tokio::test]
async fn test_invalidate_is_idempotent_and_never_creates_entries() {
    let (actor, cache) = CacheActor::new(16);
    tokio::spawn(actor.run());
    let key = QueryKey::new("incidentEvidence").with_param(12);

    // No entry, no subscribers: nothing to do, nothing fails
    assert_eq!(cache.invalidate(key.clone()).await.unwrap(), 0);
    assert_eq!(cache.invalidate(key.clone()).await.unwrap(), 0);
    assert!(cache.peek(&key).await.unwrap().is_none());

    cache.set_data(&key, vec!["photo.jpg".to_string()]).await.unwrap();
    assert_eq!(cache.invalidate(key.clone()).await.unwrap(), 1);
    assert_eq!(cache.invalidate(key.clone()).await.unwrap(), 1);

    let entry = cache.peek(&key).await.unwrap().unwrap();
    assert!(entry.invalidated);
    assert!(!entry.is_fetching());
    assert_eq!(
        entry.data_as::<Vec<String>>().unwrap(),
        Some(vec!["photo.jpg".to_string()])
    );
}

#[tokio::test]
async fn test_superseded_fetch_result_is_discarded() {
    let (actor, cache) = CacheActor::new(16);
    tokio::spawn(actor.run());
    let key = QueryKey::new("userIncidents");

    let slow = cache.begin_fetch(&key).await.unwrap();
    let fast = cache.begin_fetch(&key).await.unwrap();
    assert!(fast > slow);

    assert!(cache
        .complete_fetch(&key, fast, Ok(Arc::new(vec![2u32])))
        .await
        .unwrap());
    assert!(!cache
        .complete_fetch(&key, slow, Ok(Arc::new(vec![1u32])))
        .await
        .unwrap());
    assert_eq!(cache.get_data::<Vec<u32>>(&key).await.unwrap(), Some(vec![2]));
}

#[tokio::test]
async fn test_invalidation_during_fetch_fences_the_old_result() {
    let (actor, cache) = CacheActor::new(16);
    tokio::spawn(actor.run());
    let key = QueryKey::new("journalEntries").with_identity(Principal::new("alice"));

    let ticket = cache.begin_fetch(&key).await.unwrap();
    cache.invalidate(key.clone()).await.unwrap();

    let applied = cache
        .complete_fetch(&key, ticket, Ok(Arc::new(vec![0u32])))
        .await
        .unwrap();
    assert!(!applied);
    assert!(cache.get_data::<Vec<u32>>(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_optimistic_update_outlives_an_earlier_fetch() {
    let (actor, cache) = CacheActor::new(16);
    tokio::spawn(actor.run());
    let key = QueryKey::new("journalEntries").with_identity(Principal::new("alice"));

    let ticket = cache.begin_fetch(&key).await.unwrap();
    cache
        .update_data::<Vec<u32>, _>(&key, |current| {
            let mut list = current.unwrap_or_default();
            list.insert(0, 7);
            Some(list)
        })
        .await
        .unwrap();
    assert!(!cache.peek(&key).await.unwrap().unwrap().is_fetching());

    let applied = cache
        .complete_fetch(&key, ticket, Ok(Arc::new(Vec::<u32>::new())))
        .await
        .unwrap();
    assert!(!applied);
    assert_eq!(cache.get_data::<Vec<u32>>(&key).await.unwrap(), Some(vec![7]));

    // Same for a plain write
    let ticket = cache.begin_fetch(&key).await.unwrap();
    cache.set_data(&key, vec![8u32]).await.unwrap();
    assert!(!cache
        .complete_fetch(&key, ticket, Ok(Arc::new(vec![1u32])))
        .await
        .unwrap());
    assert_eq!(cache.get_data::<Vec<u32>>(&key).await.unwrap(), Some(vec![8]));
}

#[tokio::test]
async fn test_fenced_write_after_removal_is_discarded() {
    let (actor, cache) = CacheActor::new(16);
    tokio::spawn(actor.run());
    let alice = Principal::new("alice");
    let key = QueryKey::new("lastJournalAnalysis").with_identity(alice.clone());

    let ticket = cache.issue_ticket(&key).await.unwrap();
    cache.remove(KeyFilter::Identity(Some(alice))).await.unwrap();

    assert!(!cache.set_data_fenced(&key, ticket, 3u32).await.unwrap());
    assert!(cache.peek(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_fenced_write_and_update() {
    let (actor, cache) = CacheActor::new(16);
    tokio::spawn(actor.run());
    let key = QueryKey::new("journalEntries");

    let first = cache.issue_ticket(&key).await.unwrap();
    let second = cache.issue_ticket(&key).await.unwrap();
    assert!(!cache.set_data_fenced(&key, first, vec![1u32]).await.unwrap());
    assert!(cache.set_data_fenced(&key, second, vec![2u32]).await.unwrap());

    let previous = cache
        .update_data::<Vec<u32>, _>(&key, |current| {
            let mut list = current.unwrap_or_default();
            list.insert(0, 9);
            Some(list)
        })
        .await
        .unwrap();
    assert_eq!(previous, Some(vec![2]));
    assert_eq!(cache.get_data::<Vec<u32>>(&key).await.unwrap(), Some(vec![9, 2]));

    // Updating a missing key to nothing does not create it
    let missing = QueryKey::new("victimProfile");
    cache
        .update_data::<u32, _>(&missing, |_| None)
        .await
        .unwrap();
    assert!(cache.peek(&missing).await.unwrap().is_none());
}

#[tokio::test]
async fn test_type_mismatch_is_an_error() {
    let (actor, cache) = CacheActor::new(16);
    tokio::spawn(actor.run());
    let key = QueryKey::new("policeDepartments");

    cache.set_data(&key, 5u32).await.unwrap();
    let result = cache.get_data::<String>(&key).await;
    assert!(matches!(result, Err(actor_cache::CacheError::TypeMismatch { .. })));
}

#[tokio::test]
async fn test_subscribers_see_events() {
    let (actor, cache) = CacheActor::new(16);
    tokio::spawn(actor.run());
    let mut events = cache.subscribe().await.unwrap();
    let key = QueryKey::new("userProfile");

    cache.set_data(&key, 1u32).await.unwrap();
    cache.invalidate(KeyFilter::scope("userProfile")).await.unwrap();
    cache.remove(key.clone()).await.unwrap();

    let kinds: Vec<CacheEventKind> = vec![
        events.recv().await.unwrap().kind,
        events.recv().await.unwrap().kind,
        events.recv().await.unwrap().kind,
    ];
    assert_eq!(
        kinds,
        vec![
            CacheEventKind::Updated,
            CacheEventKind::Invalidated,
            CacheEventKind::Removed
        ]
    );
}

#[tokio::test]
async fn test_cache_closed_after_actor_stops() {
    let (actor, cache) = CacheActor::new(4);
    let handle = tokio::spawn(actor.run());
    handle.abort();
    let _ = handle.await;

    let result = cache.peek(&QueryKey::new("userProfile")).await;
    assert!(matches!(result, Err(actor_cache::CacheError::CacheClosed)));
}

#[tokio::test(start_paused = true)]
async fn test_wait_resolves_once_handle_connects() {
    let mut mock = MockConnector::<Backend>::new();
    mock.expect_connect()
        .after(Duration::from_millis(750))
        .return_ok(Backend("anon".into()));
    let (actor, cache) = CacheActor::new(16);
    tokio::spawn(actor.run());
    let provider = ActorProvider::new(cache.clone(), Arc::new(mock.clone()), WaitOptions::default());

    let started = tokio::time::Instant::now();
    let waiters = (0..3).map(|_| {
        let provider = provider.clone();
        tokio::spawn(async move { provider.wait_until_ready(std::future::pending::<()>()).await })
    });
    for waiter in waiters.collect::<Vec<_>>() {
        assert_eq!(waiter.await.unwrap().unwrap(), Backend("anon".into()));
    }

    assert!(started.elapsed() < Duration::from_millis(900));
    assert_eq!(mock.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wait_times_out_when_handle_never_connects() {
    let mut mock = MockConnector::<Backend>::new();
    mock.expect_connect().never();
    let (actor, cache) = CacheActor::new(16);
    tokio::spawn(actor.run());
    let provider = ActorProvider::new(cache.clone(), Arc::new(mock), WaitOptions::default());

    let result = provider.wait_until_ready(std::future::pending::<()>()).await;
    assert!(matches!(result, Err(ref error) if error.is_timeout()));
    assert!(provider.readiness().await.unwrap().is_initializing);
}

#[tokio::test(start_paused = true)]
async fn test_wait_on_plain_key_rejects_with_fetch_error() {
    let (actor, cache) = CacheActor::new(16);
    tokio::spawn(actor.run());
    let key = QueryKey::actor(Some(&Principal::new("alice")));

    let ticket = cache.begin_fetch(&key).await.unwrap();
    let producer = cache.clone();
    let producer_key = key.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        producer
            .complete_fetch(
                &producer_key,
                ticket,
                Err(share(std::io::Error::other("certificate verification failed"))),
            )
            .await
    });

    match wait_for_ready(&cache, &key, WaitOptions::default()).await {
        Err(WaitError::ActorFailed(error)) => {
            assert!(error.to_string().contains("certificate verification failed"))
        }
        other => panic!("Expected ActorFailed, got {:?}", other),
    }
}
