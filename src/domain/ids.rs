//! Domain identifier types with validation
//!
//! This module provides newtype wrappers for pipeline identifiers. Each type
//! ensures type safety and provides validation for format compliance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Submission job identifier
///
/// Identifies one upload's worth of batches for the lifetime of the job.
/// Generated fresh when a validated record set is accepted.
///
/// # Examples
///
/// ```
/// use vaxflow::domain::ids::JobId;
///
/// let job_id = JobId::generate();
/// assert!(!job_id.as_str().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generates a new random job identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates a JobId from an existing string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Job ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the job ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Submitting provider identifier newtype wrapper
///
/// Identifies the immunisation provider on whose behalf records are
/// submitted. The registry expects an uppercase alphanumeric provider
/// number; we only enforce shape, not issuance.
///
/// # Examples
///
/// ```
/// use vaxflow::domain::ids::ProviderId;
///
/// let provider = ProviderId::new("2447051W").unwrap();
/// assert_eq!(provider.as_str(), "2447051W");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Creates a new ProviderId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Provider ID cannot be empty".to_string());
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!(
                "Provider ID must be alphanumeric, got: {id}"
            ));
        }
        Ok(Self(id))
    }

    /// Returns the provider ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ProviderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Registry-issued claim identifier newtype wrapper
///
/// Returned by the registry for outcomes that pend a confirm-or-correct
/// decision. A confirmation request must echo this value together with its
/// claim sequence number; the pair is the registry's handle for the pended
/// encounter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(String);

impl ClaimId {
    /// Creates a new ClaimId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Claim ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the claim ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClaimId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_generate_unique() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_job_id_rejects_empty() {
        assert!(JobId::new("").is_err());
        assert!(JobId::new("   ").is_err());
    }

    #[test]
    fn test_provider_id_valid() {
        let provider = ProviderId::new("2447051W").unwrap();
        assert_eq!(provider.as_str(), "2447051W");
        assert_eq!(provider.to_string(), "2447051W");
    }

    #[test]
    fn test_provider_id_rejects_empty() {
        assert!(ProviderId::new("").is_err());
    }

    #[test]
    fn test_provider_id_rejects_non_alphanumeric() {
        assert!(ProviderId::new("24-47051").is_err());
        assert!(ProviderId::new("prov id").is_err());
    }

    #[test]
    fn test_claim_id_roundtrip() {
        let claim = ClaimId::from_str("WCH4521-7").unwrap();
        assert_eq!(claim.as_str(), "WCH4521-7");

        let json = serde_json::to_string(&claim).unwrap();
        assert_eq!(json, "\"WCH4521-7\"");
        let back: ClaimId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, claim);
    }

    #[test]
    fn test_claim_id_rejects_empty() {
        assert!(ClaimId::new("").is_err());
    }
}
