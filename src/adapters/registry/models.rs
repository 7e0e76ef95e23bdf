//! Registry wire models
//!
//! Request and response bodies for the registry's claim submission API,
//! plus the builders that assemble requests from planned batches and the
//! parser that flattens mixed-granularity responses into per-record
//! outcomes.

use crate::adapters::registry::codes;
use crate::domain::ids::{ClaimId, ProviderId};
use crate::domain::outcome::{ActionRequired, FieldError, RecordResult};
use crate::domain::record::Record;
use crate::domain::{RegistryError, Result};
use crate::core::planner::BatchPlan;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Submitting provider block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderBlock {
    /// Registry-issued provider number
    pub provider_number: String,
}

/// Individual identity block, one per encounter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndividualBlock {
    pub given_name: String,
    pub family_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medicare_card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medicare_irn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
}

impl IndividualBlock {
    fn from_record(record: &Record) -> Self {
        Self {
            given_name: record.identity.given_name.clone(),
            family_name: record.identity.family_name.clone(),
            date_of_birth: record.identity.date_of_birth,
            gender: record.identity.gender.code().to_string(),
            medicare_card_number: record.identity.medicare_card_number.clone(),
            medicare_irn: record.identity.medicare_irn.clone(),
            health_identifier: record.identity.health_identifier.clone(),
            postcode: record.identity.postcode.clone(),
        }
    }
}

/// One vaccination episode on the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeBlock {
    /// 1-based episode ID within the encounter
    pub id: u32,
    pub vaccine_code: String,
    pub dose: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immunisation_type: Option<String>,
}

impl EpisodeBlock {
    fn from_record(id: u32, record: &Record) -> Self {
        Self {
            id,
            vaccine_code: record.vaccination.vaccine_code.clone(),
            dose: record.vaccination.dose.clone(),
            batch_number: record.vaccination.batch_number.clone(),
            route: record.vaccination.route.clone(),
            immunisation_type: record.vaccination.immunisation_type.clone(),
        }
    }
}

/// One encounter on the wire: individual block plus episode list
///
/// The claim fields are set only on the confirmation variant, where the
/// request echoes the registry's claim reference and carries the explicit
/// accept flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EncounterBlock {
    /// 1-based encounter ID within the request
    pub id: u32,
    pub individual: IndividualBlock,
    pub date_of_service: NaiveDate,
    pub episodes: Vec<EpisodeBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_sequence_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
}

/// One outbound submission request
///
/// `message_id` is unique per request; `correlation_id` is constant for the
/// whole job so the registry can associate every request belonging to one
/// upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubmitRequest {
    pub message_id: String,
    pub correlation_id: String,
    pub submitting_provider: ProviderBlock,
    pub encounters: Vec<EncounterBlock>,
}

impl BatchSubmitRequest {
    /// Builds the request for one planned batch
    pub fn for_batch(plan: &BatchPlan, provider: &ProviderId, correlation_id: &str) -> Self {
        let encounters = plan
            .encounters
            .iter()
            .map(|encounter| EncounterBlock {
                id: encounter.encounter_id,
                individual: IndividualBlock::from_record(&encounter.episodes[0].record),
                date_of_service: encounter.date_of_service,
                episodes: encounter
                    .episodes
                    .iter()
                    .map(|episode| EpisodeBlock::from_record(episode.episode_id, &episode.record))
                    .collect(),
                claim_id: None,
                claim_sequence_number: None,
                accepted: None,
            })
            .collect();

        Self {
            message_id: Uuid::new_v4().to_string(),
            correlation_id: correlation_id.to_string(),
            submitting_provider: ProviderBlock {
                provider_number: provider.as_str().to_string(),
            },
            encounters,
        }
    }

    /// Builds the confirmation variant for one pended record
    ///
    /// Reuses the claim reference issued by the original submission and
    /// carries the explicit accept flag.
    pub fn for_confirmation(
        record: &Record,
        claim_id: &ClaimId,
        claim_sequence_number: u32,
        accepted: bool,
        provider: &ProviderId,
        correlation_id: &str,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            correlation_id: correlation_id.to_string(),
            submitting_provider: ProviderBlock {
                provider_number: provider.as_str().to_string(),
            },
            encounters: vec![EncounterBlock {
                id: 1,
                individual: IndividualBlock::from_record(record),
                date_of_service: record.vaccination.date_of_service,
                episodes: vec![EpisodeBlock::from_record(1, record)],
                claim_id: Some(claim_id.as_str().to_string()),
                claim_sequence_number: Some(claim_sequence_number),
                accepted: Some(accepted),
            }],
        }
    }

    /// Builds a single-record submission for a resubmission attempt
    ///
    /// A resubmission is a fresh, independently identified attempt: it gets
    /// its own message ID and carries no claim reference back to the
    /// original.
    pub fn for_single(record: &Record, provider: &ProviderId, correlation_id: &str) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            correlation_id: correlation_id.to_string(),
            submitting_provider: ProviderBlock {
                provider_number: provider.as_str().to_string(),
            },
            encounters: vec![EncounterBlock {
                id: 1,
                individual: IndividualBlock::from_record(record),
                date_of_service: record.vaccination.date_of_service,
                episodes: vec![EpisodeBlock::from_record(1, record)],
                claim_id: None,
                claim_sequence_number: None,
                accepted: None,
            }],
        }
    }
}

/// Field-level error detail in a response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrorResponse {
    pub field: String,
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

/// Episode-level outcome in a response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeResponse {
    pub id: u32,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub field_errors: Vec<FieldErrorResponse>,
}

/// Encounter-level outcome in a response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EncounterResponse {
    pub id: u32,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub claim_id: Option<String>,
    #[serde(default)]
    pub claim_sequence_number: Option<u32>,
    #[serde(default)]
    pub episodes: Vec<EpisodeResponse>,
}

/// One registry response, mixing batch-, encounter- and episode-level
/// outcomes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubmitResponse {
    pub status_code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub encounters: Vec<EncounterResponse>,
}

/// Flattens a registry response into one [`RecordResult`] per source row
///
/// The most specific outcome wins: an episode's own status code, falling
/// back to its encounter's, falling back to the batch-level code. The
/// registry's message text is copied verbatim, never paraphrased or
/// truncated. A claim reference is attached only while the outcome demands
/// a confirm-or-correct decision.
///
/// # Errors
///
/// Returns a protocol error if the response references an encounter or
/// episode that was not part of the request.
pub fn parse_record_outcomes(
    row_map: &HashMap<(u32, u32), usize>,
    response: &BatchSubmitResponse,
) -> Result<Vec<RecordResult>> {
    let mut outcomes = Vec::new();

    // Batch-level rejection with no per-encounter detail applies to every
    // row of the request.
    if response.encounters.is_empty() {
        let message = response.message.clone().unwrap_or_default();
        let mut rows: Vec<_> = row_map.values().copied().collect();
        rows.sort_unstable();
        for row in rows {
            outcomes.push(build_outcome(
                row,
                &response.status_code,
                &message,
                None,
                None,
                Vec::new(),
            ));
        }
        return Ok(outcomes);
    }

    for encounter in &response.encounters {
        let claim_id = encounter.claim_id.as_deref();
        let claim_seq = encounter.claim_sequence_number;

        if encounter.episodes.is_empty() {
            // Encounter-level outcome applies to every episode of the
            // encounter as planned in the request.
            let code = encounter
                .status_code
                .as_deref()
                .unwrap_or(&response.status_code);
            let message = encounter
                .message
                .as_deref()
                .or(response.message.as_deref())
                .unwrap_or_default();

            let mut rows: Vec<_> = row_map
                .iter()
                .filter(|((enc, _), _)| *enc == encounter.id)
                .map(|(_, row)| *row)
                .collect();
            if rows.is_empty() {
                return Err(RegistryError::Protocol(format!(
                    "response references unknown encounter {}",
                    encounter.id
                ))
                .into());
            }
            rows.sort_unstable();
            for row in rows {
                outcomes.push(build_outcome(row, code, message, claim_id, claim_seq, Vec::new()));
            }
            continue;
        }

        for episode in &encounter.episodes {
            let row = *row_map.get(&(encounter.id, episode.id)).ok_or_else(|| {
                RegistryError::Protocol(format!(
                    "response references unknown episode {}/{}",
                    encounter.id, episode.id
                ))
            })?;

            let code = episode
                .status_code
                .as_deref()
                .or(encounter.status_code.as_deref())
                .unwrap_or(&response.status_code);
            let message = episode
                .message
                .as_deref()
                .or(encounter.message.as_deref())
                .or(response.message.as_deref())
                .unwrap_or_default();
            let field_errors = episode
                .field_errors
                .iter()
                .map(|f| {
                    let mut err = FieldError::new(f.field.clone(), f.message.clone());
                    if let Some(ref code) = f.code {
                        err = err.with_code(code.clone());
                    }
                    err
                })
                .collect();

            outcomes.push(build_outcome(row, code, message, claim_id, claim_seq, field_errors));
        }
    }

    outcomes.sort_by_key(|o| o.row_number);
    Ok(outcomes)
}

fn build_outcome(
    row: usize,
    code: &str,
    message: &str,
    claim_id: Option<&str>,
    claim_sequence_number: Option<u32>,
    field_errors: Vec<FieldError>,
) -> RecordResult {
    let classification = codes::classify(code);

    let mut outcome = RecordResult::settled(row, classification.status, code, message);
    outcome.field_errors = field_errors;

    if classification.action_required == ActionRequired::ConfirmOrCorrect {
        outcome.action_required = ActionRequired::ConfirmOrCorrect;
        if let Some(id) = claim_id {
            if let Ok(claim) = ClaimId::new(id) {
                outcome.claim_id = Some(claim);
                outcome.claim_sequence_number = claim_sequence_number;
            }
        }
    }

    outcome
}
