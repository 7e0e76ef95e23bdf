//! Batch planning for record submission
//!
//! The planner turns an ordered list of validated records into
//! protocol-legal batches: records sharing the same individual and date of
//! service merge into one encounter's episode list, and encounters pack
//! into batches, preserving original row order across batch boundaries so
//! result reporting can map back to source rows.

use crate::domain::errors::ValidationError;
use crate::domain::ids::ProviderId;
use crate::domain::record::{PatientIdentity, Record};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Protocol limit: encounters per batch
pub const MAX_ENCOUNTERS_PER_BATCH: usize = 10;

/// Protocol limit: episodes per encounter
pub const MAX_EPISODES_PER_ENCOUNTER: usize = 5;

/// One vaccination episode planned into an encounter
#[derive(Debug, Clone)]
pub struct PlannedEpisode {
    /// 1-based episode ID, contiguous within the encounter
    pub episode_id: u32,

    /// Source row this episode came from
    pub row_number: usize,

    /// The underlying record
    pub record: Record,
}

/// One encounter: an individual's episodes for one date of service
#[derive(Debug, Clone)]
pub struct PlannedEncounter {
    /// 1-based encounter ID, contiguous within the batch
    pub encounter_id: u32,

    /// Individual the encounter belongs to
    pub identity: PatientIdentity,

    /// Date of service shared by all episodes
    pub date_of_service: NaiveDate,

    /// Ordered episodes, at most [`MAX_EPISODES_PER_ENCOUNTER`]
    pub episodes: Vec<PlannedEpisode>,
}

/// One wire request's worth of encounters
#[derive(Debug, Clone)]
pub struct BatchPlan {
    /// 1-based position of this batch in dispatch order
    pub sequence: usize,

    /// Ordered encounters, at most [`MAX_ENCOUNTERS_PER_BATCH`]
    pub encounters: Vec<PlannedEncounter>,
}

impl BatchPlan {
    /// Number of records (episodes) in this batch
    pub fn record_count(&self) -> usize {
        self.encounters.iter().map(|e| e.episodes.len()).sum()
    }

    /// Source rows covered by this batch, in episode order
    pub fn rows(&self) -> Vec<usize> {
        self.encounters
            .iter()
            .flat_map(|e| e.episodes.iter().map(|ep| ep.row_number))
            .collect()
    }

    /// Maps (encounter ID, episode ID) pairs back to source rows
    pub fn row_map(&self) -> HashMap<(u32, u32), usize> {
        let mut map = HashMap::new();
        for encounter in &self.encounters {
            for episode in &encounter.episodes {
                map.insert(
                    (encounter.encounter_id, episode.episode_id),
                    episode.row_number,
                );
            }
        }
        map
    }
}

/// Result of planning one upload
#[derive(Debug, Clone)]
pub struct SubmissionPlan {
    /// Submitting provider the plan was built for
    pub provider: ProviderId,

    /// Ordered batches ready for dispatch
    pub batches: Vec<BatchPlan>,

    /// Records rejected individually during planning
    pub rejected: Vec<ValidationError>,
}

impl SubmissionPlan {
    /// Total records accepted into batches
    pub fn planned_records(&self) -> usize {
        self.batches.iter().map(BatchPlan::record_count).sum()
    }
}

/// Plans validated records into protocol-legal batches
///
/// Rejected records (structural failures, or episodes overflowing an
/// encounter's limit) are reported individually and never block the rest
/// of the plan.
pub fn plan_batches(records: &[Record], provider: &ProviderId) -> SubmissionPlan {
    // Grouping pass: merge rows into encounters keyed by individual and
    // date of service, in first-appearance order.
    let mut encounters: Vec<PlannedEncounter> = Vec::new();
    let mut index: HashMap<(PatientIdentity, NaiveDate), usize> = HashMap::new();
    let mut rejected = Vec::new();

    for record in records {
        if let Err(e) = record.validate() {
            tracing::warn!(row = record.row_number, error = %e, "Rejecting record at planning");
            rejected.push(e);
            continue;
        }

        let key = (
            record.identity.clone(),
            record.vaccination.date_of_service,
        );
        match index.get(&key) {
            Some(&i) => {
                let encounter = &mut encounters[i];
                if encounter.episodes.len() >= MAX_EPISODES_PER_ENCOUNTER {
                    tracing::warn!(
                        row = record.row_number,
                        "Encounter already holds the maximum number of episodes"
                    );
                    rejected.push(ValidationError::new(
                        record.row_number,
                        format!(
                            "encounter for this individual and date of service already holds {MAX_EPISODES_PER_ENCOUNTER} episodes"
                        ),
                    ));
                    continue;
                }
                encounter.episodes.push(PlannedEpisode {
                    episode_id: (encounter.episodes.len() + 1) as u32,
                    row_number: record.row_number,
                    record: record.clone(),
                });
            }
            None => {
                index.insert(key, encounters.len());
                encounters.push(PlannedEncounter {
                    encounter_id: 0, // assigned during packing
                    identity: record.identity.clone(),
                    date_of_service: record.vaccination.date_of_service,
                    episodes: vec![PlannedEpisode {
                        episode_id: 1,
                        row_number: record.row_number,
                        record: record.clone(),
                    }],
                });
            }
        }
    }

    // Packing pass: chunk encounters into batches and assign contiguous
    // 1-based encounter IDs per batch.
    let mut batches = Vec::new();
    for (batch_index, chunk) in encounters.chunks(MAX_ENCOUNTERS_PER_BATCH).enumerate() {
        let mut batch = BatchPlan {
            sequence: batch_index + 1,
            encounters: chunk.to_vec(),
        };
        for (i, encounter) in batch.encounters.iter_mut().enumerate() {
            encounter.encounter_id = (i + 1) as u32;
        }
        batches.push(batch);
    }

    tracing::info!(
        batches = batches.len(),
        encounters = encounters.len(),
        rejected = rejected.len(),
        "Planned submission batches"
    );

    SubmissionPlan {
        provider: provider.clone(),
        batches,
        rejected,
    }
}
