//! Solution evaluator (C4, §4.4).
//!
//! Computes a scalar, lower-is-better `cost` as a weighted sum of integer
//! component terms, returning both the scalar and the per-component
//! breakdown so the progress view and the final result can report metrics.
//! All accumulation happens in integer minutes; the weighted sum is only
//! converted to `f64` at the very end, matching §4.1's "floating point
//! avoided in the inner loop."

use std::collections::HashMap;

use crate::domain::{Minutes, Room, RoomId, Solution, Surgery, SurgeryId};

/// A cost component named in §4.4's default set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CostComponent {
    Makespan,
    TotalSdst,
    Idle,
    Overtime,
    UrgencyViolation,
    SurgeonPreference,
}

/// `{component -> non-negative integer weight}`. Components absent from the
/// table default to weight 1 (§4.4).
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weights(HashMap<CostComponent, u32>);

impl Weights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, component: CostComponent, weight: u32) {
        self.0.insert(component, weight);
    }

    pub fn get(&self, component: CostComponent) -> u32 {
        self.0.get(&component).copied().unwrap_or(1)
    }

    /// Sorted `(component name, weight)` pairs, for canonical fingerprinting.
    pub fn sorted_pairs(&self) -> Vec<(&'static str, u32)> {
        let mut pairs: Vec<_> = self
            .0
            .iter()
            .map(|(c, w)| (component_name(*c), *w))
            .collect();
        pairs.sort();
        pairs
    }
}

fn component_name(component: CostComponent) -> &'static str {
    match component {
        CostComponent::Makespan => "makespan",
        CostComponent::TotalSdst => "total_sdst",
        CostComponent::Idle => "idle",
        CostComponent::Overtime => "overtime",
        CostComponent::UrgencyViolation => "urgency_violation",
        CostComponent::SurgeonPreference => "surgeon_preference",
    }
}

/// Host-supplied per-(surgery, room) penalty for a non-preferred room
/// assignment. Absent pairs carry zero penalty (preferred, or no
/// preference registered at all).
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PreferenceTable(HashMap<(SurgeryId, RoomId), u32>);

impl PreferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, surgery_id: SurgeryId, room_id: RoomId, penalty: u32) {
        self.0.insert((surgery_id, room_id), penalty);
    }

    pub fn penalty(&self, surgery_id: &str, room_id: &str) -> u32 {
        self.0
            .get(&(surgery_id.to_string(), room_id.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Sorted `(surgery_id, room_id, penalty)` rows, for canonical
    /// fingerprinting.
    pub fn sorted_rows(&self) -> Vec<(&str, &str, u32)> {
        let mut rows: Vec<_> = self
            .0
            .iter()
            .map(|((s, r), p)| (s.as_str(), r.as_str(), *p))
            .collect();
        rows.sort();
        rows
    }
}

/// Per-component values for one evaluated solution, in the same integer
/// units the evaluator accumulated them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostBreakdown {
    pub makespan: Minutes,
    pub total_sdst: Minutes,
    pub idle: Minutes,
    pub overtime: Minutes,
    pub urgency_violation: u64,
    pub surgeon_preference: u64,
}

impl CostBreakdown {
    /// The weighted scalar cost, converted to `f64` only here, at the
    /// evaluator's boundary.
    pub fn weighted_cost(&self, weights: &Weights) -> f64 {
        let makespan = self.makespan.value() as i128 * weights.get(CostComponent::Makespan) as i128;
        let sdst = self.total_sdst.value() as i128 * weights.get(CostComponent::TotalSdst) as i128;
        let idle = self.idle.value() as i128 * weights.get(CostComponent::Idle) as i128;
        let overtime = self.overtime.value() as i128 * weights.get(CostComponent::Overtime) as i128;
        let urgency =
            self.urgency_violation as i128 * weights.get(CostComponent::UrgencyViolation) as i128;
        let preference =
            self.surgeon_preference as i128 * weights.get(CostComponent::SurgeonPreference) as i128;
        (makespan + sdst + idle + overtime + urgency + preference) as f64
    }

    /// Tie-break key per §4.4: cost, then makespan, then total SDST, then
    /// total idle. `cost` is passed in separately since it depends on the
    /// weight table and this breakdown doesn't own one.
    pub fn tie_break_key(&self, cost: f64) -> (OrderedFloatBits, Minutes, Minutes, Minutes) {
        (ordered_float_bits(cost), self.makespan, self.total_sdst, self.idle)
    }
}

/// Monotone integer encoding of an `f64` so it can be used as a total-order
/// sort key (NaN is never produced by this evaluator, but the encoding is
/// total over every bit pattern regardless).
pub type OrderedFloatBits = i128;

fn ordered_float_bits(x: f64) -> i128 {
    let bits = x.to_bits() as i128;
    if (bits as u128) >> 127 & 1 == 1 {
        !bits
    } else {
        bits ^ (1i128 << 63)
    }
}

/// Evaluates `solution`, returning the weighted scalar cost and its
/// breakdown.
pub fn evaluate(
    solution: &Solution,
    surgeries: &HashMap<SurgeryId, &Surgery>,
    rooms: &HashMap<RoomId, &Room>,
    weights: &Weights,
    preferences: &PreferenceTable,
) -> (f64, CostBreakdown) {
    let makespan = solution
        .span(|room_id| rooms.get(room_id).map(|r| r.opening_time).unwrap_or(Minutes::ZERO))
        .map(|(start, end)| end.saturating_sub_nonneg(start))
        .unwrap_or(Minutes::ZERO);

    let total_sdst: Minutes = solution.all_assignments().map(|a| a.sds_applied).sum();

    let mut idle = Minutes::ZERO;
    let mut overtime = Minutes::ZERO;
    for (room_id, assignments) in solution.rooms() {
        let room = rooms.get(room_id);
        let opening = room.map(|r| r.opening_time).unwrap_or(Minutes::ZERO);
        let mut cursor = opening;
        for assignment in assignments {
            let gap = assignment.start.saturating_sub_nonneg(cursor);
            idle += gap.saturating_sub_nonneg(assignment.sds_applied);
            cursor = assignment.end;
        }
        if let Some(closing) = room.and_then(|r| r.closing_time) {
            if let Some(last) = assignments.last() {
                overtime += last.end.saturating_sub_nonneg(closing);
            }
        }
    }

    let mut urgency_violation: u64 = 0;
    let mut surgeon_preference: u64 = 0;
    for assignment in solution.all_assignments() {
        if let Some(surgery) = surgeries.get(&assignment.surgery_id) {
            if let Some(deadline) = surgery.urgency_deadline() {
                let lateness = assignment.start.saturating_sub_nonneg(deadline);
                urgency_violation += lateness.value() as u64 * surgery.urgency.weight() as u64;
            }
            surgeon_preference +=
                preferences.penalty(&assignment.surgery_id, &assignment.room_id) as u64;
        }
    }

    let breakdown = CostBreakdown {
        makespan,
        total_sdst,
        idle,
        overtime,
        urgency_violation,
        surgeon_preference,
    };
    (breakdown.weighted_cost(weights), breakdown)
}
