//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use warden::{
    Account, AccountId, EventBus, FixedClock, MemoryRepositoryProvider, PasswordHasher,
    SecurityConfig, Warden, WardenBuilder,
};
use warden_core::{
    Error,
    history::{EventLog, ExpiryEvent, LockEvent},
    repositories::{
        ExpiryHistoryRepository, ExpiryHistoryRepositoryProvider, LockHistoryRepository,
        LockHistoryRepositoryProvider,
    },
};

pub const PASSWORD: &str = "Passw0rd";

/// Stores passwords with a marker prefix. Fast, and good enough to tell hashes apart.
pub struct PlainTextHasher;

impl PasswordHasher for PlainTextHasher {
    fn hash(&self, raw_password: &str) -> Result<String, Error> {
        Ok(format!("plain:{raw_password}"))
    }

    fn verify(&self, raw_password: &str, encoded: &str) -> Result<bool, Error> {
        Ok(encoded.strip_prefix("plain:") == Some(raw_password))
    }
}

pub struct Harness {
    pub warden: Warden<MemoryRepositoryProvider>,
    pub clock: Arc<FixedClock>,
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn harness() -> Harness {
    harness_with(SecurityConfig::default(), None)
}

pub fn harness_with(config: SecurityConfig, event_bus: Option<EventBus>) -> Harness {
    init_tracing();
    let clock = Arc::new(FixedClock::new(start()));
    let mut builder = WardenBuilder::new()
        .with_memory()
        .with_config(config)
        .with_clock(clock.clone())
        .with_hasher(Arc::new(PlainTextHasher));
    if let Some(event_bus) = event_bus {
        builder = builder.with_event_bus(event_bus);
    }

    Harness {
        warden: builder.build().expect("Failed to build Warden"),
        clock,
    }
}

impl Harness {
    pub fn now(&self) -> DateTime<Utc> {
        use warden::Clock;
        self.clock.now()
    }

    /// Move time forward one second so consecutive events never share a timestamp.
    pub fn tick(&self) {
        self.clock.advance(Duration::seconds(1));
    }

    pub async fn register(&self, login_id: &str) -> Account {
        self.warden
            .register_account(login_id, PASSWORD, "admin")
            .await
            .expect("Failed to register account")
    }

    pub async fn fail_times(&self, login_id: &str, n: usize) {
        for _ in 0..n {
            self.tick();
            self.warden
                .authenticate(login_id, "wrongPass1")
                .await
                .expect("Failed to record attempt");
        }
    }

    pub async fn lock_events(&self, account_id: &AccountId) -> EventLog<LockEvent> {
        self.warden
            .repositories()
            .lock_history()
            .recent(account_id, 100)
            .await
            .unwrap()
    }

    pub async fn expiry_events(&self, account_id: &AccountId) -> EventLog<ExpiryEvent> {
        self.warden
            .repositories()
            .expiry_history()
            .all(account_id)
            .await
            .unwrap()
    }
}
