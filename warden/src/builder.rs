//! Builder pattern for constructing Warden instances
//!
//! This module provides a type-safe builder for creating [`Warden`] instances with
//! compile-time validation of storage configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::Duration;
//! use warden::{SecurityConfig, WardenBuilder};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let warden = WardenBuilder::new()
//!     .with_memory()
//!     .with_config(
//!         SecurityConfig::default()
//!             .with_fail_threshold(5)
//!             .with_account_expiry(Duration::days(60)),
//!     )
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use warden_core::{
    Clock, EventBus, PasswordHasher, RepositoryProvider, SecurityConfig, ServiceContext,
    policy::PasswordPolicy,
};

use crate::Warden;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building a Warden instance.
#[derive(Debug, thiserror::Error)]
pub enum WardenBuilderError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ============================================================================
// Type-State Markers
// ============================================================================

/// Marker type indicating no storage has been configured yet.
///
/// This is the initial state of [`WardenBuilder`].
pub struct NoStorage;

/// Marker type indicating storage has been configured.
///
/// Contains the repository provider that will be used by Warden.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

// ============================================================================
// Builder Implementation
// ============================================================================

/// A type-safe builder for constructing [`Warden`] instances.
///
/// # Type States
///
/// - [`NoStorage`]: Initial state, storage must be configured
/// - [`WithStorage<R>`]: Storage configured, ready to build
pub struct WardenBuilder<Storage> {
    storage: Storage,
    config: SecurityConfig,
    clock: Option<Arc<dyn Clock>>,
    hasher: Option<Arc<dyn PasswordHasher>>,
    password_policy: Option<Arc<dyn PasswordPolicy>>,
    event_bus: Option<EventBus>,
}

impl Default for WardenBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl WardenBuilder<NoStorage> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - Lockout: after 6 consecutive failures
    /// - Account expiry: after 90 days without a successful login
    /// - Password expiry: 90 days; the last 3 passwords may not be reused
    /// - Clock: system clock
    /// - Hasher: Argon2 via `password-auth`
    /// - Event bus: None
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            config: SecurityConfig::default(),
            clock: None,
            hasher: None,
            password_policy: None,
            event_bus: None,
        }
    }

    /// Use any repository provider.
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> WardenBuilder<WithStorage<R>> {
        WardenBuilder {
            storage: WithStorage { repositories },
            config: self.config,
            clock: self.clock,
            hasher: self.hasher,
            password_policy: self.password_policy,
            event_bus: self.event_bus,
        }
    }
}

#[cfg(feature = "memory")]
impl WardenBuilder<NoStorage> {
    /// Configure a fresh in-memory store.
    ///
    /// State is lost when the Warden instance is dropped.
    pub fn with_memory(
        self,
    ) -> WardenBuilder<WithStorage<warden_storage_memory::MemoryRepositoryProvider>> {
        self.with_repositories(Arc::new(
            warden_storage_memory::MemoryRepositoryProvider::new(),
        ))
    }
}

impl<S> WardenBuilder<S> {
    /// Replace the whole security configuration.
    pub fn with_config(mut self, config: SecurityConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a different source of time, typically a [`warden_core::FixedClock`] in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Replace the standard password rules.
    ///
    /// `SecurityConfig::min_password_length` is ignored when a policy is set here.
    pub fn with_password_policy(mut self, password_policy: Arc<dyn PasswordPolicy>) -> Self {
        self.password_policy = Some(password_policy);
        self
    }

    /// Publish [`warden_core::SecurityEvent`]s to `event_bus` after each commit.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }
}

impl<R: RepositoryProvider> WardenBuilder<WithStorage<R>> {
    /// Build the configured Warden instance.
    ///
    /// # Errors
    ///
    /// Returns [`WardenBuilderError::InvalidConfiguration`] for a zero fail
    /// threshold or a non-positive expiry duration.
    pub fn build(self) -> Result<Warden<R>, WardenBuilderError> {
        validate_config(&self.config)?;

        let mut ctx = ServiceContext::new(self.storage.repositories, self.config);
        if let Some(clock) = self.clock {
            ctx = ctx.with_clock(clock);
        }
        if let Some(hasher) = self.hasher {
            ctx = ctx.with_hasher(hasher);
        }
        if let Some(password_policy) = self.password_policy {
            ctx = ctx.with_password_policy(password_policy);
        }
        if let Some(event_bus) = self.event_bus {
            ctx = ctx.with_event_bus(event_bus);
        }

        tracing::debug!(
            fail_threshold = ctx.config().fail_threshold,
            account_expiry_days = ctx.config().account_expiry.num_days(),
            "Warden configured"
        );
        Ok(Warden::from_context(ctx))
    }
}

fn validate_config(config: &SecurityConfig) -> Result<(), WardenBuilderError> {
    if config.fail_threshold == 0 {
        return Err(WardenBuilderError::InvalidConfiguration(
            "fail_threshold must be at least 1".to_string(),
        ));
    }
    if config.account_expiry <= chrono::Duration::zero() {
        return Err(WardenBuilderError::InvalidConfiguration(
            "account_expiry must be positive".to_string(),
        ));
    }
    if config.password_expiry <= chrono::Duration::zero() {
        return Err(WardenBuilderError::InvalidConfiguration(
            "password_expiry must be positive".to_string(),
        ));
    }
    Ok(())
}
