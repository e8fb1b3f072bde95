//! SkillSwap Core - shared types and pure rules.
//!
//! This crate holds everything that can be decided without I/O:
//!
//! - [`types`] - Newtype wrappers for IDs, prices and ratings
//! - [`session`] - The identity published by the identity provider
//! - [`validation`] - Form validators (credentials, password strength, booking)
//! - [`navigation`] - Route table, session gate and post-login navigation
//!
//! The `web` crate owns every side effect: HTTP, cookie sessions and calls
//! to the identity provider.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod navigation;
pub mod session;
pub mod types;
pub mod validation;

pub use navigation::{GuardDecision, NavigationIntent, Route, guard, post_login_destination};
pub use session::{DEFAULT_AVATAR_URL, Identity, SessionState};
pub use types::*;
pub use validation::{PasswordStrength, ValidationError, Violation};
