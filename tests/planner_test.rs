//! Integration tests for batch planning invariants

mod common;

use common::{record, records};
use vaxflow::core::planner::{
    plan_batches, MAX_ENCOUNTERS_PER_BATCH, MAX_EPISODES_PER_ENCOUNTER,
};
use vaxflow::domain::ids::ProviderId;

fn provider() -> ProviderId {
    ProviderId::new("2447051W").unwrap()
}

#[test]
fn encounter_and_episode_ids_are_contiguous_and_bounded() {
    // A mix of merged encounters and distinct individuals across several
    // batches
    let mut input = records(23);
    for i in 0..4 {
        let mut extra = record(24 + i, "Given1", "2025-06-01");
        extra.vaccination.vaccine_code = format!("VAX{i}");
        input.push(extra);
    }

    let plan = plan_batches(&input, &provider());

    assert!(plan.rejected.is_empty());
    for batch in &plan.batches {
        assert!(batch.encounters.len() <= MAX_ENCOUNTERS_PER_BATCH);
        for (i, encounter) in batch.encounters.iter().enumerate() {
            // Exactly 1..N, strictly increasing by 1
            assert_eq!(encounter.encounter_id, (i + 1) as u32);
            assert!(encounter.episodes.len() <= MAX_EPISODES_PER_ENCOUNTER);
            for (j, episode) in encounter.episodes.iter().enumerate() {
                assert_eq!(episode.episode_id, (j + 1) as u32);
            }
        }
    }
}

#[test]
fn twelve_single_episode_records_split_into_ten_and_two() {
    let plan = plan_batches(&records(12), &provider());

    assert_eq!(plan.batches.len(), 2);
    assert_eq!(plan.batches[0].encounters.len(), 10);
    assert_eq!(plan.batches[1].encounters.len(), 2);

    // Row order preserved across the batch boundary
    assert_eq!(plan.batches[0].rows(), (1..=10).collect::<Vec<_>>());
    assert_eq!(plan.batches[1].rows(), vec![11, 12]);
}

#[test]
fn episode_overflow_rejects_only_the_excess() {
    // Eight episodes for one individual and date: five planned, three
    // rejected individually, none blocking the others
    let input: Vec<_> = (1..=8)
        .map(|i| {
            let mut r = record(i, "Jane", "2025-06-01");
            r.vaccination.vaccine_code = format!("VAX{i}");
            r
        })
        .collect();

    let plan = plan_batches(&input, &provider());

    assert_eq!(plan.planned_records(), 5);
    assert_eq!(plan.rejected.len(), 3);
    assert_eq!(
        plan.rejected.iter().map(|e| e.row_number).collect::<Vec<_>>(),
        vec![6, 7, 8]
    );
}

#[test]
fn structural_failures_do_not_block_the_batch() {
    let mut input = records(3);
    input[1].identity.medicare_card_number = None;
    input[1].identity.medicare_irn = None;

    let plan = plan_batches(&input, &provider());

    assert_eq!(plan.rejected.len(), 1);
    assert_eq!(plan.rejected[0].row_number, 2);
    assert_eq!(plan.batches[0].rows(), vec![1, 3]);
}
