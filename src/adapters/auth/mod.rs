//! Authentication credential handling
//!
//! The pipeline treats credential acquisition as an opaque dependency: a
//! [`CredentialProvider`] produces bearer credentials, and a process-wide
//! [`CredentialCache`] shares them across jobs with single-flight refresh.

pub mod cache;
pub mod provider;

pub use cache::CredentialCache;
pub use provider::{BearerCredential, CredentialProvider, OAuthCredentialProvider};
