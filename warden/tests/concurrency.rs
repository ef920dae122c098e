//! Tests for same-account serialization and security notifications

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{PASSWORD, PlainTextHasher, harness, harness_with};
use tokio::task::JoinSet;
use warden::{
    AccountId, EventBus, EventHandler, LoginOutcome, MemoryRepositoryProvider, SecurityConfig,
    SecurityEvent, Warden,
};
use warden_core::{ServiceContext, error::EventError};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failures_lock_exactly_once() {
    let h = harness();
    let alice = h.register("alice").await;
    let warden = Arc::new(h.warden);

    let mut tasks = JoinSet::new();
    for _ in 0..12 {
        let warden = warden.clone();
        tasks.spawn(async move { warden.authenticate("alice", "wrongPass1").await.unwrap() });
    }

    let mut outcomes = Vec::new();
    while let Some(outcome) = tasks.join_next().await {
        outcomes.push(outcome.unwrap());
    }

    let triggered = outcomes
        .iter()
        .filter(|o| {
            matches!(
                o,
                LoginOutcome::InvalidCredentials {
                    lock_triggered: true,
                    ..
                }
            )
        })
        .count();
    let counted = outcomes
        .iter()
        .filter(|o| matches!(o, LoginOutcome::InvalidCredentials { .. }))
        .count();
    let locked = outcomes
        .iter()
        .filter(|o| **o == LoginOutcome::Locked)
        .count();

    assert_eq!(triggered, 1);
    assert_eq!(counted, 6);
    assert_eq!(locked, 6);
    assert!(warden.is_locked(&alice.id).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_accounts_do_not_interfere() {
    let h = harness();
    let alice = h.register("alice").await;
    let bob = h.register("bob").await;
    let warden = Arc::new(h.warden);

    let mut tasks = JoinSet::new();
    for login_id in ["alice", "bob"] {
        for _ in 0..5 {
            let warden = warden.clone();
            tasks.spawn(async move { warden.record_failure(login_id).await.unwrap() });
        }
    }
    while let Some(outcome) = tasks.join_next().await {
        outcome.unwrap();
    }

    assert_eq!(warden.consecutive_failures(&alice.id).await.unwrap(), 5);
    assert_eq!(warden.consecutive_failures(&bob.id).await.unwrap(), 5);
    assert!(!warden.is_locked(&alice.id).await.unwrap());
    assert!(!warden.is_locked(&bob.id).await.unwrap());
}

#[tokio::test]
async fn test_lock_registry_only_holds_accounts_in_use() {
    let ctx = ServiceContext::new(
        Arc::new(MemoryRepositoryProvider::new()),
        SecurityConfig::default(),
    )
    .with_hasher(Arc::new(PlainTextHasher));
    let warden = Warden::from_context(ctx.clone());
    let alice = warden
        .register_account("alice", PASSWORD, "admin")
        .await
        .unwrap();

    for i in 0..1000 {
        let ghost = AccountId::new(&format!("acct_ghost_{i}"));
        assert_eq!(
            warden.record_success(&ghost).await.unwrap(),
            LoginOutcome::AccountNotFound
        );
        assert!(warden.evaluate_expiry(&ghost).await.is_err());
        assert!(warden.unlock_account(&ghost, "admin").await.is_err());
    }
    assert!(ctx.locks().is_empty());

    for _ in 0..10 {
        warden.authenticate("alice", "wrongPass1").await.unwrap();
    }
    assert!(warden.is_locked(&alice.id).await.unwrap());
    assert!(ctx.locks().is_empty());
}

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<SecurityEvent>>,
}

impl RecordingHandler {
    fn events(&self) -> Vec<SecurityEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle_event(&self, event: &SecurityEvent) -> Result<(), EventError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct FailingHandler;

#[async_trait]
impl EventHandler for FailingHandler {
    async fn handle_event(&self, _event: &SecurityEvent) -> Result<(), EventError> {
        Err(EventError::HandlerError("sink unavailable".into()))
    }
}

#[tokio::test]
async fn test_lockout_is_published() {
    let bus = EventBus::default();
    let handler = Arc::new(RecordingHandler::default());
    bus.register(handler.clone()).await;

    let h = harness_with(SecurityConfig::default().with_fail_threshold(2), Some(bus));
    let alice = h.register("alice").await;
    h.fail_times("alice", 2).await;

    let events = handler.events();
    let failures: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            SecurityEvent::LoginFailed {
                consecutive_failures,
                ..
            } => Some(*consecutive_failures),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec![1, 2]);

    assert!(matches!(
        events.last(),
        Some(SecurityEvent::AccountLocked { account_id, .. }) if *account_id == alice.id
    ));
    assert!(matches!(events.first(), Some(SecurityEvent::PasswordChanged { .. })));
}

#[tokio::test]
async fn test_failing_handler_does_not_fail_the_login() {
    let bus = EventBus::default();
    bus.register(Arc::new(FailingHandler)).await;

    let h = harness_with(SecurityConfig::default(), Some(bus));
    h.register("alice").await;

    h.tick();
    assert!(
        h.warden
            .authenticate("alice", PASSWORD)
            .await
            .unwrap()
            .is_success()
    );
    h.fail_times("alice", 6).await;

    h.tick();
    assert_eq!(
        h.warden.authenticate("alice", PASSWORD).await.unwrap(),
        LoginOutcome::Locked
    );
}
