use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    AccountId,
    error::EventError,
    history::{LockReason, PasswordChangeType},
};

/// Notifications emitted after a security-relevant change has been committed.
///
/// These are for monitoring, alerting and audit sinks. They are not the source of
/// truth: the account histories are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityEvent {
    /// A credential check failed for an existing, usable account.
    LoginFailed {
        account_id: AccountId,
        consecutive_failures: u32,
        timestamp: DateTime<Utc>,
    },

    /// This is a security-critical event that should trigger alerts.
    AccountLocked {
        account_id: AccountId,
        reason: LockReason,
        timestamp: DateTime<Utc>,
    },

    AccountUnlocked {
        account_id: AccountId,
        reason: LockReason,
        timestamp: DateTime<Utc>,
    },

    AccountExpired {
        account_id: AccountId,
        timestamp: DateTime<Utc>,
    },

    AccountUnexpired {
        account_id: AccountId,
        operated_by: String,
        timestamp: DateTime<Utc>,
    },

    PasswordChanged {
        account_id: AccountId,
        change_type: PasswordChangeType,
        timestamp: DateTime<Utc>,
    },
}

/// A trait for handling events emitted by the event bus
///
/// Implementors of this trait can be registered with the [`EventBus`] to receive and
/// process events.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn handle_event(&self, event: &SecurityEvent) -> Result<(), EventError>;
}

/// Event bus that can emit events and register event handlers
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use async_trait::async_trait;
/// # use warden_core::error::EventError;
/// # use warden_core::events::{EventBus, EventHandler, SecurityEvent};
/// struct AlertHandler;
///
/// #[async_trait]
/// impl EventHandler for AlertHandler {
///     async fn handle_event(&self, event: &SecurityEvent) -> Result<(), EventError> {
///         if let SecurityEvent::AccountLocked { account_id, .. } = event {
///             println!("locked: {account_id}");
///         }
///         Ok(())
///     }
/// }
///
/// # tokio_test_block_on(async {
/// let bus = EventBus::default();
/// bus.register(Arc::new(AlertHandler)).await;
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct EventBus {
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.write().await.push(handler);
    }

    /// Emit an event to all registered handlers, stopping at the first error
    pub async fn emit(&self, event: &SecurityEvent) -> Result<(), EventError> {
        for handler in self.handlers.read().await.iter() {
            handler.handle_event(event).await?;
        }

        Ok(())
    }
}

/// Emit to an optional bus after a commit. Handler failures are logged, never returned.
pub(crate) async fn publish(bus: Option<&EventBus>, events: Vec<SecurityEvent>) {
    let Some(bus) = bus else {
        return;
    };
    for event in &events {
        if let Err(e) = bus.emit(event).await {
            tracing::warn!(error = %e, ?event, "Security event handler failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        call_count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle_event(&self, _event: &SecurityEvent) -> Result<(), EventError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ErroringEventHandler;

    #[async_trait]
    impl EventHandler for ErroringEventHandler {
        async fn handle_event(&self, _event: &SecurityEvent) -> Result<(), EventError> {
            Err(EventError::HandlerError("Test error".into()))
        }
    }

    fn locked() -> SecurityEvent {
        SecurityEvent::AccountLocked {
            account_id: AccountId::new("acct_alice"),
            reason: LockReason::LoginFailThreshold,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_bus_empty() {
        let event_bus = EventBus::default();
        event_bus
            .emit(&locked())
            .await
            .expect("Failed to emit event");
    }

    #[tokio::test]
    async fn test_event_bus_multiple_handlers() {
        let event_bus = EventBus::default();
        let count1 = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::new(AtomicUsize::new(0));

        event_bus
            .register(Arc::new(CountingHandler {
                call_count: count1.clone(),
            }))
            .await;
        event_bus
            .register(Arc::new(CountingHandler {
                call_count: count2.clone(),
            }))
            .await;

        event_bus
            .emit(&locked())
            .await
            .expect("Failed to emit event");

        assert_eq!(count1.load(Ordering::SeqCst), 1);
        assert_eq!(count2.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_event_bus_error_propagation() {
        let event_bus = EventBus::default();
        event_bus.register(Arc::new(ErroringEventHandler)).await;

        let result = event_bus.emit(&locked()).await;
        assert!(matches!(result, Err(EventError::HandlerError(_))));
    }

    #[tokio::test]
    async fn test_publish_swallows_handler_errors() {
        let event_bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        event_bus.register(Arc::new(ErroringEventHandler)).await;
        event_bus
            .register(Arc::new(CountingHandler {
                call_count: count.clone(),
            }))
            .await;

        // the erroring handler runs first and short-circuits each emit
        publish(Some(&event_bus), vec![locked(), locked()]).await;
        publish(None, vec![locked()]).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
