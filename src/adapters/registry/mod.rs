//! Registry protocol client
//!
//! Everything that touches the immunisation registry's wire format lives
//! here: request/response models, the table-driven status-code
//! classification, the transport trait and its HTTP implementation.

pub mod api;
pub mod client;
pub mod codes;
pub mod models;

pub use api::RegistryApi;
pub use client::HttpRegistryClient;
pub use models::{parse_record_outcomes, BatchSubmitRequest, BatchSubmitResponse};
