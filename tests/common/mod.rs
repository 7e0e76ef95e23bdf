//! Shared test support: record builders and a scripted in-memory registry

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use vaxflow::adapters::registry::models::{
    BatchSubmitRequest, BatchSubmitResponse, EncounterResponse, EpisodeResponse,
};
use vaxflow::adapters::registry::RegistryApi;
use vaxflow::domain::record::{Gender, PatientIdentity, Record, VaccinationDetails};
use vaxflow::domain::{RegistryError, Result};

/// Builds a minimal valid record for one individual and date of service
pub fn record(row_number: usize, given_name: &str, date_of_service: &str) -> Record {
    Record::new(
        row_number,
        PatientIdentity {
            given_name: given_name.to_string(),
            family_name: "Citizen".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
            gender: Gender::Female,
            medicare_card_number: Some("2951233711".to_string()),
            medicare_irn: Some("1".to_string()),
            health_identifier: None,
            postcode: None,
        },
        VaccinationDetails {
            date_of_service: date_of_service.parse().unwrap(),
            vaccine_code: "FLUVAX".to_string(),
            dose: "1".to_string(),
            batch_number: Some("AB1234".to_string()),
            route: Some("IM".to_string()),
            immunisation_type: None,
        },
    )
}

/// Builds `count` single-episode records for distinct individuals
pub fn records(count: usize) -> Vec<Record> {
    (1..=count)
        .map(|i| record(i, &format!("Given{i}"), "2025-06-01"))
        .collect()
}

/// Episode-level outcome for a scripted response
pub fn episode(id: u32, status_code: &str, message: &str) -> EpisodeResponse {
    EpisodeResponse {
        id,
        status_code: Some(status_code.to_string()),
        message: Some(message.to_string()),
        field_errors: vec![],
    }
}

/// Encounter wrapper with no claim reference
pub fn encounter(id: u32, episodes: Vec<EpisodeResponse>) -> EncounterResponse {
    EncounterResponse {
        id,
        status_code: None,
        message: None,
        claim_id: None,
        claim_sequence_number: None,
        episodes,
    }
}

/// Encounter wrapper carrying a claim reference
pub fn pended_encounter(
    id: u32,
    claim_id: &str,
    claim_seq: u32,
    episodes: Vec<EpisodeResponse>,
) -> EncounterResponse {
    EncounterResponse {
        id,
        status_code: None,
        message: None,
        claim_id: Some(claim_id.to_string()),
        claim_sequence_number: Some(claim_seq),
        episodes,
    }
}

/// Response wrapper with an accepted batch-level code
pub fn response(encounters: Vec<EncounterResponse>) -> BatchSubmitResponse {
    BatchSubmitResponse {
        status_code: "AIR-S-0000".to_string(),
        message: None,
        encounters,
    }
}

/// Mirrors a request into an all-accepted response
pub fn accept_all(request: &BatchSubmitRequest) -> BatchSubmitResponse {
    response(
        request
            .encounters
            .iter()
            .map(|enc| {
                encounter(
                    enc.id,
                    enc.episodes
                        .iter()
                        .map(|ep| episode(ep.id, "AIR-S-0000", "Accepted."))
                        .collect(),
                )
            })
            .collect(),
    )
}

type Scripted = std::result::Result<BatchSubmitResponse, RegistryError>;

/// In-memory registry transport with scripted responses
///
/// Responses are consumed in push order; when the script runs dry every
/// request is accepted. Requests are recorded with their arrival time so
/// tests can assert counts, identities and backoff gaps.
#[derive(Default)]
pub struct ScriptedRegistry {
    batch_script: Mutex<VecDeque<Scripted>>,
    confirm_script: Mutex<VecDeque<Scripted>>,
    pub batch_requests: Mutex<Vec<(Instant, BatchSubmitRequest)>>,
    pub confirm_requests: Mutex<Vec<(Instant, BatchSubmitRequest)>>,
    /// When non-zero, every call is delayed by this many milliseconds
    pub delay_ms: AtomicU64,
}

impl ScriptedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a scripted batch response (or error)
    pub fn push_batch(&self, scripted: Scripted) {
        self.batch_script.lock().unwrap().push_back(scripted);
    }

    /// Queues a scripted confirmation response (or error)
    pub fn push_confirm(&self, scripted: Scripted) {
        self.confirm_script.lock().unwrap().push_back(scripted);
    }

    pub fn batch_request_count(&self) -> usize {
        self.batch_requests.lock().unwrap().len()
    }

    pub fn confirm_request_count(&self) -> usize {
        self.confirm_requests.lock().unwrap().len()
    }

    /// Message IDs of every batch request, in arrival order
    pub fn batch_message_ids(&self) -> Vec<String> {
        self.batch_requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.message_id.clone())
            .collect()
    }

    /// Gaps between consecutive batch requests
    pub fn batch_request_gaps(&self) -> Vec<Duration> {
        let requests = self.batch_requests.lock().unwrap();
        requests
            .windows(2)
            .map(|pair| pair[1].0.duration_since(pair[0].0))
            .collect()
    }

    async fn apply_delay(&self) {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

#[async_trait]
impl RegistryApi for ScriptedRegistry {
    async fn submit_batch(&self, request: &BatchSubmitRequest) -> Result<BatchSubmitResponse> {
        self.apply_delay().await;
        self.batch_requests
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));

        let scripted = self.batch_script.lock().unwrap().pop_front();
        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => Err(e.into()),
            None => Ok(accept_all(request)),
        }
    }

    async fn submit_confirmation(
        &self,
        request: &BatchSubmitRequest,
    ) -> Result<BatchSubmitResponse> {
        self.apply_delay().await;
        self.confirm_requests
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));

        let scripted = self.confirm_script.lock().unwrap().pop_front();
        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => Err(e.into()),
            None => Ok(accept_all(request)),
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn base_url(&self) -> &str {
        "scripted://registry"
    }
}
