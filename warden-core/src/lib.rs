//! Core functionality for the warden project
//!
//! This crate contains the account model, the event histories, the pure lockout,
//! expiry and password policies derived from them, and the services that evaluate
//! login attempts and password changes.
//!
//! Storage backends implement the traits in [`repositories`]; applications usually
//! reach this crate through the `warden` facade rather than directly.
//!
//! See [`Account`] for the account model, [`history::EventLog`] for the event
//! histories, and [`services::LoginService`] for the login state machine.
pub mod account;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod history;
pub mod id;
pub mod locks;
pub mod policy;
pub mod repositories;
pub mod services;
pub mod validation;

pub use account::{Account, AccountBuilder, AccountId};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::SecurityConfig;
pub use crypto::{Argon2PasswordHasher, PasswordHasher};
pub use error::{AuthError, Error, PasswordPolicyViolation, StorageError, ValidationError};
pub use events::{EventBus, EventHandler, SecurityEvent};
pub use history::{
    EventLog, ExpiryEvent, LockEvent, LoginAttemptEvent, LoginResult, PasswordChangeEvent,
    Recorded,
};
pub use locks::{AccountGuard, AccountLocks};
pub use policy::{PasswordChangeRequirement, Violation};
pub use repositories::{ChangeSet, RepositoryProvider};
pub use services::{
    AccountService, AccountState, ExpiryService, LockoutService, LoginOutcome, LoginService,
    LoginSuccess, PasswordService, ServiceContext,
};
