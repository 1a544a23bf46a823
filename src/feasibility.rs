//! Feasibility checker (C3, §4.3).
//!
//! Verifies the cross-cutting Solution invariants of §3 that the timing
//! kernel cannot see because it only ever looks within one room: every
//! pending surgery appears exactly once, no surgeon holds two overlapping
//! assignments, and no piece of equipment is held concurrently by two
//! assignments. Per-room non-overlap and SDST spacing are guaranteed by
//! construction in [`crate::timing::price`] and are not re-checked here.
//!
//! Violations are reported in a deterministic order — rooms by id, then
//! surgeons, then equipment (§4.3) — so the *first* violation returned is
//! reproducible across runs with identical input.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;

use crate::domain::{Solution, Surgery, SurgeryId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeasibilityError {
    #[error("surgery {0} is missing from the solution")]
    MissingSurgery(SurgeryId),
    #[error("surgery {0} appears {1} times in the solution, expected exactly once")]
    DuplicateSurgery(SurgeryId, usize),
    #[error("surgeon {surgeon_id} is double-booked: surgeries {a} and {b} overlap")]
    SurgeonOverlap {
        surgeon_id: String,
        a: SurgeryId,
        b: SurgeryId,
    },
    #[error("equipment {equipment_id} is double-booked: surgeries {a} and {b} overlap")]
    EquipmentOverlap {
        equipment_id: String,
        a: SurgeryId,
        b: SurgeryId,
    },
}

/// Checks `solution` against `pending` (every surgery that must appear) and
/// `surgeries` (for surgeon/equipment lookups). Returns the first violation
/// found in the deterministic order documented above.
pub fn check(
    solution: &Solution,
    pending: &BTreeSet<SurgeryId>,
    surgeries: &HashMap<SurgeryId, &Surgery>,
) -> Result<(), FeasibilityError> {
    check_completeness(solution, pending)?;
    check_surgeon_overlaps(solution, surgeries)?;
    check_equipment_overlaps(solution, surgeries)?;
    Ok(())
}

fn check_completeness(
    solution: &Solution,
    pending: &BTreeSet<SurgeryId>,
) -> Result<(), FeasibilityError> {
    let mut counts: HashMap<&SurgeryId, usize> = HashMap::new();
    for assignment in solution.all_assignments() {
        *counts.entry(&assignment.surgery_id).or_default() += 1;
    }
    for surgery_id in pending {
        match counts.get(surgery_id) {
            None | Some(0) => return Err(FeasibilityError::MissingSurgery(surgery_id.clone())),
            Some(1) => {}
            Some(n) => return Err(FeasibilityError::DuplicateSurgery(surgery_id.clone(), *n)),
        }
    }
    Ok(())
}

fn check_surgeon_overlaps(
    solution: &Solution,
    surgeries: &HashMap<SurgeryId, &Surgery>,
) -> Result<(), FeasibilityError> {
    let mut by_surgeon: BTreeMap<String, Vec<&SurgeryId>> = BTreeMap::new();
    for assignment in solution.all_assignments() {
        if let Some(surgery) = surgeries.get(&assignment.surgery_id) {
            if let Some(surgeon_id) = &surgery.surgeon_id {
                by_surgeon
                    .entry(surgeon_id.clone())
                    .or_default()
                    .push(&assignment.surgery_id);
            }
        }
    }
    for (surgeon_id, surgery_ids) in &by_surgeon {
        let mut intervals: Vec<(&SurgeryId, crate::domain::Minutes, crate::domain::Minutes)> =
            surgery_ids
                .iter()
                .map(|id| {
                    let a = find_assignment(solution, id).expect("counted above");
                    (*id, a.start, a.end)
                })
                .collect();
        intervals.sort_by_key(|(id, start, _)| (*start, (*id).clone()));
        for pair in intervals.windows(2) {
            let (a_id, _, a_end) = &pair[0];
            let (b_id, b_start, _) = &pair[1];
            if b_start < a_end {
                return Err(FeasibilityError::SurgeonOverlap {
                    surgeon_id: surgeon_id.clone(),
                    a: (*a_id).clone(),
                    b: (*b_id).clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_equipment_overlaps(
    solution: &Solution,
    surgeries: &HashMap<SurgeryId, &Surgery>,
) -> Result<(), FeasibilityError> {
    let mut by_equipment: BTreeMap<String, Vec<&SurgeryId>> = BTreeMap::new();
    for assignment in solution.all_assignments() {
        if let Some(surgery) = surgeries.get(&assignment.surgery_id) {
            for equipment_id in &surgery.required_equipment {
                by_equipment
                    .entry(equipment_id.clone())
                    .or_default()
                    .push(&assignment.surgery_id);
            }
        }
    }
    for (equipment_id, surgery_ids) in &by_equipment {
        let mut intervals: Vec<(&SurgeryId, crate::domain::Minutes, crate::domain::Minutes)> =
            surgery_ids
                .iter()
                .map(|id| {
                    let a = find_assignment(solution, id).expect("counted above");
                    (*id, a.start, a.end)
                })
                .collect();
        intervals.sort_by_key(|(id, start, _)| (*start, (*id).clone()));
        for pair in intervals.windows(2) {
            let (a_id, _, a_end) = &pair[0];
            let (b_id, b_start, _) = &pair[1];
            if b_start < a_end {
                return Err(FeasibilityError::EquipmentOverlap {
                    equipment_id: equipment_id.clone(),
                    a: (*a_id).clone(),
                    b: (*b_id).clone(),
                });
            }
        }
    }
    Ok(())
}

fn find_assignment<'a>(solution: &'a Solution, surgery_id: &str) -> Option<&'a crate::domain::Assignment> {
    solution
        .all_assignments()
        .find(|a| a.surgery_id == surgery_id)
}
