//! Domain models and types for Vaxflow.
//!
//! This module contains the core domain models, types, and business rules
//! for the submission pipeline.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`JobId`], [`ProviderId`], [`ClaimId`])
//! - **Record models** ([`Record`], [`PatientIdentity`], [`VaccinationDetails`])
//! - **Outcome models** ([`RecordResult`], [`OutcomeStatus`], [`ActionRequired`])
//! - **Error types** ([`VaxflowError`], [`RegistryError`], [`ValidationError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Vaxflow uses the newtype pattern for identifiers to prevent mixing
//! different ID types:
//!
//! ```rust
//! use vaxflow::domain::{ClaimId, ProviderId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ProviderId::new("2447051W")?;
//! let claim = ClaimId::new("WCH4521-7")?;
//!
//! // This won't compile - type safety prevents mixing IDs
//! // let wrong: ProviderId = claim;  // Compile error!
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, VaxflowError>`]:
//!
//! ```rust
//! use vaxflow::domain::{Result, VaxflowError};
//!
//! fn example() -> Result<()> {
//!     Err(VaxflowError::Job("no such job".to_string()))
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod outcome;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{RegistryError, ValidationError, VaxflowError};
pub use ids::{ClaimId, JobId, ProviderId};
pub use outcome::{ActionRequired, FieldError, OutcomeStatus, RecordResult};
pub use record::{EditedFields, Gender, PatientIdentity, Record, VaccinationDetails};
pub use result::Result;
