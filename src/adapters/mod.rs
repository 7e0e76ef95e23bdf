//! External integrations for Vaxflow.
//!
//! This module contains the adapters that talk to the outside world:
//!
//! - [`registry`] - The immunisation registry protocol client
//! - [`auth`] - Bearer-credential provider and process-wide cache
//!
//! Adapters translate between domain types and external representations,
//! and never leak third-party error types into the domain.

pub mod auth;
pub mod registry;
