//! `SurgeryOrder` (the search representation) and `Solution` (the priced
//! result of running the timing kernel over an order).
//!
//! Per the Design Notes' "shared mutable Solution objects" critique, the
//! source mutated neighbor candidates in place and relied on deep copies for
//! safety. Here a candidate is produced by value but per-room sequences are
//! held behind `Arc` so a move that touches one room shares every other
//! room's vector with its parent instead of cloning the whole solution
//! (copy-on-write, §3 Ownership).

use std::collections::BTreeMap;
use std::sync::Arc;

use super::assignment::Assignment;
use super::ids::{RoomId, SurgeryId};
use super::time::Minutes;

/// The order of surgeries assigned to each room, *before* timing is priced.
///
/// This is what the neighborhood generator (C5) mutates: a permutation per
/// room, plus (only when shift moves are enabled) an extra per-surgery
/// delay inserted ahead of the surgery's setup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SurgeryOrder {
    rooms: BTreeMap<RoomId, Arc<Vec<SurgeryId>>>,
    /// Extra idle minutes a shift move has inserted ahead of a surgery's
    /// setup. Empty under the default `max_shift_minutes = 0` (shift moves
    /// disabled) — the timing kernel then behaves exactly as if this map
    /// did not exist.
    extra_delay: BTreeMap<SurgeryId, u32>,
}

impl SurgeryOrder {
    pub fn new(room_ids: impl IntoIterator<Item = RoomId>) -> Self {
        let rooms = room_ids
            .into_iter()
            .map(|id| (id, Arc::new(Vec::new())))
            .collect();
        Self {
            rooms,
            extra_delay: BTreeMap::new(),
        }
    }

    pub fn room_ids(&self) -> impl Iterator<Item = &RoomId> {
        self.rooms.keys()
    }

    pub fn sequence(&self, room_id: &str) -> &[SurgeryId] {
        self.rooms
            .get(room_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Replaces the sequence for one room. Only this room's `Arc` is
    /// reallocated; all other rooms continue sharing their prior backing
    /// vector with whichever solution this one was cloned from.
    pub fn set_sequence(&mut self, room_id: &str, sequence: Vec<SurgeryId>) {
        if let Some(slot) = self.rooms.get_mut(room_id) {
            *slot = Arc::new(sequence);
        } else {
            self.rooms.insert(room_id.to_string(), Arc::new(sequence));
        }
    }

    pub fn extra_delay(&self, surgery_id: &str) -> u32 {
        self.extra_delay.get(surgery_id).copied().unwrap_or(0)
    }

    pub fn set_extra_delay(&mut self, surgery_id: SurgeryId, minutes: u32) {
        if minutes == 0 {
            self.extra_delay.remove(&surgery_id);
        } else {
            self.extra_delay.insert(surgery_id, minutes);
        }
    }

    /// Locates a surgery's current room and position, if scheduled.
    pub fn find(&self, surgery_id: &str) -> Option<(&RoomId, usize)> {
        for (room_id, seq) in &self.rooms {
            if let Some(pos) = seq.iter().position(|s| s == surgery_id) {
                return Some((room_id, pos));
            }
        }
        None
    }

    pub fn total_surgeries(&self) -> usize {
        self.rooms.values().map(|v| v.len()).sum()
    }

    /// Stable fingerprint of the visited-solution kind used by the reactive
    /// variant (§4.8): the per-room surgery sequences, not timing or cost.
    pub fn sequence_fingerprint(&self) -> String {
        let mut out = String::new();
        for (room_id, seq) in &self.rooms {
            out.push_str(room_id);
            out.push(':');
            out.push_str(&seq.join(","));
            out.push(';');
        }
        out
    }
}

/// An ordered-by-start list of assignments per room: the priced output of
/// the timing kernel (§4.2) and the object the evaluator and feasibility
/// checker operate on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    assignments: BTreeMap<RoomId, Vec<Assignment>>,
}

impl Solution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_room(&mut self, room_id: RoomId, assignments: Vec<Assignment>) {
        self.assignments.insert(room_id, assignments);
    }

    pub fn room(&self, room_id: &str) -> &[Assignment] {
        self.assignments
            .get(room_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn rooms(&self) -> impl Iterator<Item = (&RoomId, &[Assignment])> {
        self.assignments.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// All assignments across all rooms, in deterministic room-id order.
    pub fn all_assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values().flatten()
    }

    pub fn total_surgeries(&self) -> usize {
        self.assignments.values().map(|v| v.len()).sum()
    }

    /// Earliest room-opening time and latest assignment end across the
    /// whole solution, used by the makespan cost component.
    pub fn span(&self, room_opening: impl Fn(&str) -> Minutes) -> Option<(Minutes, Minutes)> {
        let mut earliest: Option<Minutes> = None;
        let mut latest: Option<Minutes> = None;
        for (room_id, assignments) in &self.assignments {
            if assignments.is_empty() {
                continue;
            }
            let open = room_opening(room_id);
            earliest = Some(earliest.map_or(open, |e| e.min(open)));
            let end = assignments.last().unwrap().end;
            latest = Some(latest.map_or(end, |l| l.max(end)));
        }
        match (earliest, latest) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }
}
