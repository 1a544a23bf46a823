//! Canonical content fingerprint for the result cache (C10, §4.10).
//!
//! A run's cache key is the SHA-256 digest of a canonical encoding of
//! everything that can change its outcome: the pending surgeries, the
//! rooms, the SDST matrix, the component weights, the variant, the rest of
//! the parameter table, and the PRNG seed. Every collection is sorted before
//! encoding so the digest never depends on `HashMap` iteration order.

use sha2::{Digest, Sha256};

use crate::domain::{OptimizationInput, Room, Surgery};
use crate::params::OptimizationParameters;

/// Opaque cache key: the hex-encoded SHA-256 digest of a run's canonical
/// input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub String);

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(serde::Serialize)]
struct CanonicalSurgery<'a> {
    id: &'a str,
    type_id: &'a str,
    duration_minutes: u32,
    surgeon_id: Option<&'a str>,
    equipment: Vec<&'a str>,
    urgency: &'static str,
    earliest_start: Option<i64>,
    latest_finish: Option<i64>,
}

fn canonical_surgery(s: &Surgery) -> CanonicalSurgery<'_> {
    CanonicalSurgery {
        id: &s.id,
        type_id: &s.type_id,
        duration_minutes: s.duration_minutes,
        surgeon_id: s.surgeon_id.as_deref(),
        equipment: s.required_equipment.iter().map(String::as_str).collect(),
        urgency: match s.urgency {
            crate::domain::Urgency::Low => "low",
            crate::domain::Urgency::Medium => "medium",
            crate::domain::Urgency::High => "high",
            crate::domain::Urgency::Emergency => "emergency",
        },
        earliest_start: s.earliest_start.map(|m| m.value()),
        latest_finish: s.latest_finish.map(|m| m.value()),
    }
}

#[derive(serde::Serialize)]
struct CanonicalRoom<'a> {
    id: &'a str,
    opening_time: i64,
    closing_time: Option<i64>,
    capabilities: Vec<&'a str>,
}

fn canonical_room(r: &Room) -> CanonicalRoom<'_> {
    CanonicalRoom {
        id: &r.id,
        opening_time: r.opening_time.value(),
        closing_time: r.closing_time.map(|m| m.value()),
        capabilities: r.capabilities.iter().map(String::as_str).collect(),
    }
}

#[derive(serde::Serialize)]
struct CanonicalKey<'a> {
    surgeries: Vec<CanonicalSurgery<'a>>,
    rooms: Vec<CanonicalRoom<'a>>,
    sdst_rows: Vec<(Option<&'a str>, &'a str, u32)>,
    weights: Vec<(&'static str, u32)>,
    preferences: Vec<(&'a str, &'a str, u32)>,
    variant: &'static str,
    max_iterations: u64,
    tabu_tenure: usize,
    min_tabu_tenure: usize,
    max_tabu_tenure: usize,
    tenure_adaptation_factor_bits: u64,
    max_no_improvement: u64,
    time_limit_ms: u64,
    max_neighbors: usize,
    max_shift_minutes: u32,
    diversification_threshold: u64,
    diversification_strength_bits: u64,
    reactive_window: usize,
    deadend_limit: u32,
    seed: Option<u64>,
}

fn variant_name(variant: crate::variant::Variant) -> &'static str {
    match variant {
        crate::variant::Variant::Basic => "basic",
        crate::variant::Variant::Adaptive => "adaptive",
        crate::variant::Variant::Reactive => "reactive",
        crate::variant::Variant::Hybrid => "hybrid",
    }
}

/// Computes the fingerprint of one `(input, parameters)` pair. Two calls
/// with equal inputs (by value, irrespective of collection ordering) always
/// produce the same fingerprint; any difference that could change the run's
/// outcome changes it.
pub fn fingerprint(input: &OptimizationInput, params: &OptimizationParameters) -> Fingerprint {
    let mut surgeries: Vec<CanonicalSurgery<'_>> =
        input.surgeries.iter().map(canonical_surgery).collect();
    surgeries.sort_by(|a, b| a.id.cmp(b.id));

    let mut rooms: Vec<CanonicalRoom<'_>> = input.rooms.iter().map(canonical_room).collect();
    rooms.sort_by(|a, b| a.id.cmp(b.id));

    let sdst_rows: Vec<(Option<&str>, &str, u32)> = input
        .sdst
        .sorted_rows()
        .iter()
        .map(|(from, to, minutes)| (from.as_deref(), to.as_str(), *minutes))
        .collect();

    let key = CanonicalKey {
        surgeries,
        rooms,
        sdst_rows,
        weights: params.weights.sorted_pairs(),
        preferences: params.preferences.sorted_rows(),
        variant: variant_name(params.variant),
        max_iterations: params.max_iterations,
        tabu_tenure: params.tabu_tenure,
        min_tabu_tenure: params.min_tabu_tenure,
        max_tabu_tenure: params.max_tabu_tenure,
        tenure_adaptation_factor_bits: params.tenure_adaptation_factor.to_bits(),
        max_no_improvement: params.max_no_improvement,
        time_limit_ms: params.time_limit_ms,
        max_neighbors: params.max_neighbors,
        max_shift_minutes: params.max_shift_minutes,
        diversification_threshold: params.diversification_threshold,
        diversification_strength_bits: params.diversification_strength.to_bits(),
        reactive_window: params.reactive_window,
        deadend_limit: params.deadend_limit,
        seed: params.seed,
    };

    let bytes = serde_json::to_vec(&key).expect("canonical fingerprint key is always serializable");
    let digest = Sha256::digest(&bytes);
    Fingerprint(format!("{digest:x}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SdstMatrix, Surgery, Urgency};
    use std::collections::BTreeSet;

    fn surgery(id: &str) -> Surgery {
        Surgery {
            id: id.to_string(),
            type_id: "A".to_string(),
            duration_minutes: 30,
            surgeon_id: None,
            required_equipment: BTreeSet::new(),
            urgency: Urgency::Low,
            earliest_start: None,
            latest_finish: None,
        }
    }

    #[test]
    fn stable_across_equivalent_reorderings() {
        let mut input_a = OptimizationInput::default();
        input_a.surgeries = vec![surgery("S2"), surgery("S1")];
        input_a.sdst = SdstMatrix::from_rows([(None, "A".to_string(), 5)]);

        let mut input_b = OptimizationInput::default();
        input_b.surgeries = vec![surgery("S1"), surgery("S2")];
        input_b.sdst = SdstMatrix::from_rows([(None, "A".to_string(), 5)]);

        let params = OptimizationParameters::default();
        assert_eq!(fingerprint(&input_a, &params), fingerprint(&input_b, &params));
    }

    #[test]
    fn differs_when_seed_differs() {
        let mut input = OptimizationInput::default();
        input.surgeries = vec![surgery("S1")];
        let mut params_a = OptimizationParameters::default();
        params_a.seed = Some(1);
        let mut params_b = params_a.clone();
        params_b.seed = Some(2);
        assert_ne!(fingerprint(&input, &params_a), fingerprint(&input, &params_b));
    }

    #[test]
    fn differs_when_preferences_differ() {
        let mut input = OptimizationInput::default();
        input.surgeries = vec![surgery("S1")];

        let params_a = OptimizationParameters::default();
        let mut params_b = params_a.clone();
        params_b
            .preferences
            .set("S1".to_string(), "R1".to_string(), 5);

        assert_ne!(fingerprint(&input, &params_a), fingerprint(&input, &params_b));
    }
}
