//! Property-based tests for the invariants that must hold for *any* well
//! formed instance, not just the hand-picked scenarios in `scenarios.rs`.

use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use or_tabu_core::cache::{CacheConfig, ResultCache};
use or_tabu_core::domain::{
    Minutes, OptimizationInput, Room, SdstMatrix, Surgery, SurgeryType, Urgency,
};
use or_tabu_core::engine::CancelToken;
use or_tabu_core::fingerprint;
use or_tabu_core::params::OptimizationParameters;
use or_tabu_core::progress::ProgressWriter;
use or_tabu_core::{driver, generate_run_id};

fn arb_urgency() -> impl Strategy<Value = Urgency> {
    prop_oneof![
        Just(Urgency::Low),
        Just(Urgency::Medium),
        Just(Urgency::High),
        Just(Urgency::Emergency),
    ]
}

/// A handful of surgeries across 1-3 rooms, all of type "A", no SDST, no
/// surgeon/equipment constraints — enough to exercise the full driver
/// pipeline without the construction ever failing on an unsatisfiable
/// instance.
fn arb_input() -> impl Strategy<Value = OptimizationInput> {
    (1..=3usize, prop::collection::vec((10u32..=90, arb_urgency()), 1..=6)).prop_map(
        |(room_count, surgeries)| {
            let rooms = (0..room_count)
                .map(|i| Room {
                    id: format!("R{i}"),
                    opening_time: Minutes(480),
                    closing_time: None,
                    capabilities: BTreeSet::new(),
                })
                .collect();
            let surgeries = surgeries
                .into_iter()
                .enumerate()
                .map(|(i, (minutes, urgency))| Surgery {
                    id: format!("S{i}"),
                    type_id: "A".to_string(),
                    duration_minutes: minutes,
                    surgeon_id: None,
                    required_equipment: BTreeSet::new(),
                    urgency,
                    earliest_start: None,
                    latest_finish: None,
                })
                .collect();
            OptimizationInput {
                surgeries,
                rooms,
                surgery_types: vec![SurgeryType {
                    id: "A".to_string(),
                    label: "A".to_string(),
                }],
                sdst: SdstMatrix::new(),
            }
        },
    )
}

fn run(input: &OptimizationInput, params: &OptimizationParameters) -> or_tabu_core::OptimizationResult {
    let cancel = AtomicBool::new(false);
    let (mut writer, _handle) = ProgressWriter::new(generate_run_id(), params.max_iterations, 0);
    driver::run(generate_run_id(), input, params, &cancel, &mut writer)
        .expect("a conflict-free instance must never hard-fail")
}

proptest! {
    /// §8 property 1: every surgery appears in the final solution exactly
    /// once, and no room's sequence double-books a time slot.
    #[test]
    fn every_surgery_is_scheduled_exactly_once(input in arb_input()) {
        let params = OptimizationParameters { max_iterations: 15, ..Default::default() };
        let result = run(&input, &params);
        let solution = result.best_solution.expect("completed run always has a solution");

        let mut seen: Vec<String> = solution.all_assignments().map(|a| a.surgery_id.clone()).collect();
        seen.sort();
        let mut expected: Vec<String> = input.surgeries.iter().map(|s| s.id.clone()).collect();
        expected.sort();
        prop_assert_eq!(seen, expected);

        for (_, assignments) in solution.rooms() {
            for pair in assignments.windows(2) {
                prop_assert!(pair[1].start >= pair[0].end, "assignments within a room must not overlap");
            }
        }
    }

    /// §8 property 2: the convergence curve (best-cost-so-far per
    /// iteration) is monotonically non-increasing.
    #[test]
    fn convergence_never_increases(input in arb_input()) {
        let params = OptimizationParameters { max_iterations: 20, ..Default::default() };
        let result = run(&input, &params);
        for pair in result.convergence.windows(2) {
            prop_assert!(pair[1] <= pair[0], "best-so-far cost must never regress");
        }
    }

    /// §8 property 6: running the same input and parameters (including a
    /// fixed seed) twice produces byte-identical outcomes.
    #[test]
    fn identical_seed_gives_identical_outcome(input in arb_input()) {
        let params = OptimizationParameters {
            max_iterations: 15,
            seed: Some(7),
            ..Default::default()
        };
        let a = run(&input, &params);
        let b = run(&input, &params);
        prop_assert_eq!(a.cost, b.cost);
        prop_assert_eq!(a.convergence, b.convergence);
        prop_assert_eq!(a.iterations, b.iterations);
    }

    /// A fingerprint is a pure function of input and parameters: the same
    /// pair always maps to the same cache key, regardless of how many times
    /// it's computed.
    #[test]
    fn fingerprint_is_pure(input in arb_input()) {
        let params = OptimizationParameters::default();
        let a = fingerprint::fingerprint(&input, &params);
        let b = fingerprint::fingerprint(&input, &params);
        prop_assert_eq!(a, b);
    }
}

/// §8 property 5 (tabu list bound) is already covered directly in
/// `src/tabu.rs`'s unit tests; here we check the coarser, driver-level
/// consequence: the tabu tenure parameter never causes the driver to panic
/// or loop forever across a range of tenures.
#[test]
fn driver_tolerates_a_range_of_tenures() {
    let input = OptimizationInput {
        surgeries: (0..5)
            .map(|i| Surgery {
                id: format!("S{i}"),
                type_id: "A".to_string(),
                duration_minutes: 30,
                surgeon_id: None,
                required_equipment: BTreeSet::new(),
                urgency: Urgency::Low,
                earliest_start: None,
                latest_finish: None,
            })
            .collect(),
        rooms: vec![Room {
            id: "R1".to_string(),
            opening_time: Minutes::ZERO,
            closing_time: None,
            capabilities: BTreeSet::new(),
        }],
        surgery_types: vec![SurgeryType { id: "A".to_string(), label: "A".to_string() }],
        sdst: SdstMatrix::new(),
    };

    for tenure in [1usize, 2, 5, 10, 30] {
        let params = OptimizationParameters {
            tabu_tenure: tenure,
            min_tabu_tenure: 1,
            max_tabu_tenure: tenure.max(1),
            max_iterations: 25,
            ..Default::default()
        };
        let result = run(&input, &params);
        assert_eq!(result.best_solution.unwrap().total_surgeries(), 5);
    }
}

/// §8 property 7/9: cancellation is observed within one iteration's worth of
/// work, and the result cache runs the underlying computation exactly once
/// per distinct fingerprint even when called many times.
#[test]
fn cancel_token_stops_the_loop_promptly() {
    let token = CancelToken::new();
    token.cancel();
    assert!(token.is_cancelled());

    // The driver checks `cancel` at the top of every iteration; a
    // pre-cancelled token must therefore end the run after iteration zero
    // regardless of `max_iterations`.
    let input = OptimizationInput {
        surgeries: vec![Surgery {
            id: "S0".to_string(),
            type_id: "A".to_string(),
            duration_minutes: 30,
            surgeon_id: None,
            required_equipment: BTreeSet::new(),
            urgency: Urgency::Low,
            earliest_start: None,
            latest_finish: None,
        }],
        rooms: vec![Room {
            id: "R1".to_string(),
            opening_time: Minutes::ZERO,
            closing_time: None,
            capabilities: BTreeSet::new(),
        }],
        surgery_types: vec![SurgeryType { id: "A".to_string(), label: "A".to_string() }],
        sdst: SdstMatrix::new(),
    };
    let params = OptimizationParameters {
        max_iterations: 1_000_000,
        ..Default::default()
    };
    let cancel = AtomicBool::new(true);
    let (mut writer, _handle) = ProgressWriter::new(generate_run_id(), params.max_iterations, 0);
    let result = driver::run(generate_run_id(), &input, &params, &cancel, &mut writer).unwrap();
    assert_eq!(result.status, or_tabu_core::progress::RunStatus::Cancelled);
    assert_eq!(result.iterations, 0);
}

#[test]
fn cache_runs_the_computation_exactly_once_per_fingerprint() {
    let cache = Arc::new(ResultCache::new(CacheConfig::default()));
    let input = OptimizationInput {
        surgeries: vec![Surgery {
            id: "S0".to_string(),
            type_id: "A".to_string(),
            duration_minutes: 30,
            surgeon_id: None,
            required_equipment: BTreeSet::new(),
            urgency: Urgency::Low,
            earliest_start: None,
            latest_finish: None,
        }],
        rooms: vec![Room {
            id: "R1".to_string(),
            opening_time: Minutes::ZERO,
            closing_time: None,
            capabilities: BTreeSet::new(),
        }],
        surgery_types: vec![SurgeryType { id: "A".to_string(), label: "A".to_string() }],
        sdst: SdstMatrix::new(),
    };
    let params = OptimizationParameters { max_iterations: 5, ..Default::default() };
    let key = fingerprint::fingerprint(&input, &params);

    let invocations = Arc::new(Mutex::new(0u32));
    let mut results = Vec::new();
    for _ in 0..5 {
        let invocations = invocations.clone();
        let input = input.clone();
        let params = params.clone();
        let result = cache.compute_or_get(key.clone(), move || {
            *invocations.lock().unwrap() += 1;
            run(&input, &params)
        });
        results.push(result.cost);
    }

    assert_eq!(*invocations.lock().unwrap(), 1, "repeated lookups on the same key must not recompute");
    assert!(results.iter().all(|c| *c == results[0]));
}
