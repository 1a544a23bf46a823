//! Neighborhood generator (C5, §4.5).
//!
//! Enumerates candidate moves deterministically — move types in the fixed
//! order swap-within-room, swap-across-rooms, relocate, shift; within each
//! type, surgeries are visited in identifier order — and truncates to at
//! most `max_neighbors` candidates. With a seed, an additional PRNG pass
//! selects a subset of that deterministic enumeration (§4.5); without one,
//! no randomness is used anywhere in this module.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::domain::{RoomId, SdstMatrix, Surgery, SurgeryId, SurgeryOrder};

/// A compact identifier for what a move changed — the tabu-list membership
/// key (§4.6).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MoveKey {
    SwapWithinRoom {
        room_id: RoomId,
        a: SurgeryId,
        b: SurgeryId,
    },
    SwapAcrossRooms {
        low: (RoomId, SurgeryId),
        high: (RoomId, SurgeryId),
    },
    Relocate {
        surgery_id: SurgeryId,
        from_room: RoomId,
        to_room: RoomId,
    },
    Shift {
        surgery_id: SurgeryId,
        signed_minutes: i32,
    },
}

/// One candidate neighbor: the order it would produce, and the move
/// attribute that generated it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub order: SurgeryOrder,
    pub move_key: MoveKey,
}

/// Tunables the driver threads through from [`crate::params::OptimizationParameters`].
#[derive(Debug, Clone, Copy)]
pub struct NeighborhoodParams {
    pub max_neighbors: usize,
    pub max_shift_minutes: u32,
    pub seed: Option<u64>,
}

/// Generates the deterministic candidate list for `order`, capped at
/// `params.max_neighbors`.
pub fn generate(
    order: &SurgeryOrder,
    surgeries: &HashMap<SurgeryId, &Surgery>,
    sdst: &SdstMatrix,
    room_ids: &[RoomId],
    params: &NeighborhoodParams,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let sorted_surgery_ids = sorted_ids(order);

    generate_swap_within_room(order, &sorted_surgery_ids, &mut candidates);
    generate_swap_across_rooms(order, surgeries, sdst, &sorted_surgery_ids, &mut candidates);
    generate_relocate(order, room_ids, &sorted_surgery_ids, &mut candidates);
    if params.max_shift_minutes > 0 {
        generate_shift(order, &sorted_surgery_ids, params.max_shift_minutes, &mut candidates);
    }

    if let Some(seed) = params.seed {
        if candidates.len() > params.max_neighbors {
            let mut rng = StdRng::seed_from_u64(seed);
            candidates.shuffle(&mut rng);
        }
    }
    candidates.truncate(params.max_neighbors);
    candidates
}

fn sorted_ids(order: &SurgeryOrder) -> Vec<SurgeryId> {
    let mut ids: Vec<SurgeryId> = order
        .room_ids()
        .flat_map(|room_id| order.sequence(room_id).iter().cloned())
        .collect();
    ids.sort();
    ids
}

fn generate_swap_within_room(
    order: &SurgeryOrder,
    sorted_surgery_ids: &[SurgeryId],
    out: &mut Vec<Candidate>,
) {
    for a in sorted_surgery_ids {
        let Some((room_id, pos_a)) = order.find(a) else { continue };
        let room_id = room_id.clone();
        let sequence = order.sequence(&room_id);
        for (pos_b, b) in sequence.iter().enumerate() {
            if b <= a || pos_b == pos_a {
                continue;
            }
            let mut new_sequence = sequence.to_vec();
            new_sequence.swap(pos_a, pos_b);
            let mut new_order = order.clone();
            new_order.set_sequence(&room_id, new_sequence);
            out.push(Candidate {
                order: new_order,
                move_key: MoveKey::SwapWithinRoom {
                    room_id: room_id.clone(),
                    a: a.clone(),
                    b: b.clone(),
                },
            });
        }
    }
}

fn generate_swap_across_rooms(
    order: &SurgeryOrder,
    surgeries: &HashMap<SurgeryId, &Surgery>,
    sdst: &SdstMatrix,
    sorted_surgery_ids: &[SurgeryId],
    out: &mut Vec<Candidate>,
) {
    for a in sorted_surgery_ids {
        let Some((room_a, _)) = order.find(a) else { continue };
        let room_a = room_a.clone();
        for b in sorted_surgery_ids {
            if b <= a {
                continue;
            }
            let Some((room_b, _)) = order.find(b) else { continue };
            if *room_b == room_a {
                continue;
            }
            let room_b = room_b.clone();

            let mut new_order = order.clone();
            let seq_a_without_a: Vec<SurgeryId> = order
                .sequence(&room_a)
                .iter()
                .filter(|id| *id != a)
                .cloned()
                .collect();
            let seq_b_without_b: Vec<SurgeryId> = order
                .sequence(&room_b)
                .iter()
                .filter(|id| *id != b)
                .cloned()
                .collect();

            let pos_in_a = best_insertion_position(&seq_a_without_a, b, surgeries, sdst);
            let pos_in_b = best_insertion_position(&seq_b_without_b, a, surgeries, sdst);

            let mut seq_a = seq_a_without_a;
            seq_a.insert(pos_in_a, b.clone());
            let mut seq_b = seq_b_without_b;
            seq_b.insert(pos_in_b, a.clone());

            new_order.set_sequence(&room_a, seq_a);
            new_order.set_sequence(&room_b, seq_b);

            let (low, high) = order_pair((room_a.clone(), a.clone()), (room_b.clone(), b.clone()));
            out.push(Candidate {
                order: new_order,
                move_key: MoveKey::SwapAcrossRooms { low, high },
            });
        }
    }
}

fn generate_relocate(
    order: &SurgeryOrder,
    room_ids: &[RoomId],
    sorted_surgery_ids: &[SurgeryId],
    out: &mut Vec<Candidate>,
) {
    for surgery_id in sorted_surgery_ids {
        let Some((from_room, from_pos)) = order.find(surgery_id) else { continue };
        let from_room = from_room.clone();
        for to_room in room_ids {
            let target_sequence: Vec<SurgeryId> = if *to_room == from_room {
                order
                    .sequence(&from_room)
                    .iter()
                    .filter(|id| *id != surgery_id)
                    .cloned()
                    .collect()
            } else {
                order.sequence(to_room).to_vec()
            };
            for position in 0..=target_sequence.len() {
                if *to_room == from_room && position == from_pos {
                    continue; // no-op: same room, same position
                }
                let mut new_order = order.clone();
                if *to_room != from_room {
                    let remaining: Vec<SurgeryId> = order
                        .sequence(&from_room)
                        .iter()
                        .filter(|id| *id != surgery_id)
                        .cloned()
                        .collect();
                    new_order.set_sequence(&from_room, remaining);
                }
                let mut new_target = target_sequence.clone();
                new_target.insert(position, surgery_id.clone());
                new_order.set_sequence(to_room, new_target);

                out.push(Candidate {
                    order: new_order,
                    move_key: MoveKey::Relocate {
                        surgery_id: surgery_id.clone(),
                        from_room: from_room.clone(),
                        to_room: to_room.clone(),
                    },
                });
            }
        }
    }
}

fn generate_shift(
    order: &SurgeryOrder,
    sorted_surgery_ids: &[SurgeryId],
    max_shift_minutes: u32,
    out: &mut Vec<Candidate>,
) {
    for surgery_id in sorted_surgery_ids {
        let current = order.extra_delay(surgery_id);

        let mut delay_order = order.clone();
        delay_order.set_extra_delay(surgery_id.clone(), current + max_shift_minutes);
        out.push(Candidate {
            order: delay_order,
            move_key: MoveKey::Shift {
                surgery_id: surgery_id.clone(),
                signed_minutes: max_shift_minutes as i32,
            },
        });

        if current > 0 {
            let reduction = current.min(max_shift_minutes);
            let mut advance_order = order.clone();
            advance_order.set_extra_delay(surgery_id.clone(), current - reduction);
            out.push(Candidate {
                order: advance_order,
                move_key: MoveKey::Shift {
                    surgery_id: surgery_id.clone(),
                    signed_minutes: -(reduction as i32),
                },
            });
        }
    }
}

/// Position minimizing `sdst(prev, moved) + sdst(moved, next)` within
/// `sequence` (which does not contain `moved_id`). A missing `prev` is
/// `INITIAL`; a missing `next` contributes no second term (there is no
/// following surgery to set up for). Ties favor the earliest position.
fn best_insertion_position(
    sequence: &[SurgeryId],
    moved_id: &str,
    surgeries: &HashMap<SurgeryId, &Surgery>,
    sdst: &SdstMatrix,
) -> usize {
    let moved_type = surgeries.get(moved_id).map(|s| s.type_id.as_str());
    let Some(moved_type) = moved_type else { return 0 };

    let mut best_pos = 0;
    let mut best_cost = u64::MAX;
    for pos in 0..=sequence.len() {
        let prev_type = pos
            .checked_sub(1)
            .and_then(|i| sequence.get(i))
            .and_then(|id| surgeries.get(id.as_str()))
            .map(|s| s.type_id.as_str());
        let next_type = sequence.get(pos).and_then(|id| surgeries.get(id.as_str()));

        let mut cost = sdst.lookup(prev_type, moved_type) as u64;
        if let Some(next) = next_type {
            cost += sdst.lookup(Some(moved_type), &next.type_id) as u64;
        }
        if cost < best_cost {
            best_cost = cost;
            best_pos = pos;
        }
    }
    best_pos
}

fn order_pair(a: (RoomId, SurgeryId), b: (RoomId, SurgeryId)) -> ((RoomId, SurgeryId), (RoomId, SurgeryId)) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Urgency;
    use std::collections::BTreeSet;

    fn surgery(id: &str, type_id: &str) -> Surgery {
        Surgery {
            id: id.to_string(),
            type_id: type_id.to_string(),
            duration_minutes: 60,
            surgeon_id: None,
            required_equipment: BTreeSet::new(),
            urgency: Urgency::Low,
            earliest_start: None,
            latest_finish: None,
        }
    }

    #[test]
    fn deterministic_without_seed() {
        let a = surgery("A1", "A");
        let b = surgery("B1", "B");
        let c = surgery("C1", "A");
        let surgeries: HashMap<SurgeryId, &Surgery> = [
            ("A1".to_string(), &a),
            ("B1".to_string(), &b),
            ("C1".to_string(), &c),
        ]
        .into_iter()
        .collect();
        let sdst = SdstMatrix::new();
        let room_ids = vec!["R1".to_string(), "R2".to_string()];
        let mut order = SurgeryOrder::new(room_ids.clone());
        order.set_sequence("R1", vec!["A1".to_string(), "B1".to_string()]);
        order.set_sequence("R2", vec!["C1".to_string()]);

        let params = NeighborhoodParams {
            max_neighbors: 200,
            max_shift_minutes: 0,
            seed: None,
        };
        let first = generate(&order, &surgeries, &sdst, &room_ids, &params);
        let second = generate(&order, &surgeries, &sdst, &room_ids, &params);
        let keys_a: Vec<_> = first.iter().map(|c| &c.move_key).collect();
        let keys_b: Vec<_> = second.iter().map(|c| &c.move_key).collect();
        assert_eq!(keys_a, keys_b);
    }

    #[test]
    fn respects_max_neighbors_cap() {
        let a = surgery("A1", "A");
        let b = surgery("B1", "B");
        let surgeries: HashMap<SurgeryId, &Surgery> =
            [("A1".to_string(), &a), ("B1".to_string(), &b)].into_iter().collect();
        let sdst = SdstMatrix::new();
        let room_ids = vec!["R1".to_string(), "R2".to_string()];
        let mut order = SurgeryOrder::new(room_ids.clone());
        order.set_sequence("R1", vec!["A1".to_string()]);
        order.set_sequence("R2", vec!["B1".to_string()]);

        let params = NeighborhoodParams {
            max_neighbors: 1,
            max_shift_minutes: 0,
            seed: None,
        };
        let candidates = generate(&order, &surgeries, &sdst, &room_ids, &params);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn shift_disabled_by_default_produces_no_candidates() {
        let a = surgery("A1", "A");
        let surgeries: HashMap<SurgeryId, &Surgery> = [("A1".to_string(), &a)].into_iter().collect();
        let sdst = SdstMatrix::new();
        let room_ids = vec!["R1".to_string()];
        let mut order = SurgeryOrder::new(room_ids.clone());
        order.set_sequence("R1", vec!["A1".to_string()]);

        let params = NeighborhoodParams {
            max_neighbors: 200,
            max_shift_minutes: 0,
            seed: None,
        };
        let candidates = generate(&order, &surgeries, &sdst, &room_ids, &params);
        assert!(candidates.iter().all(|c| !matches!(c.move_key, MoveKey::Shift { .. })));
    }
}
