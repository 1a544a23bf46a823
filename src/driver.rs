//! Search driver (C7, §4.7): initial solution construction plus the Tabu
//! Search main loop that the engine runs on its own worker thread.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, info, warn};

use crate::domain::{
    Minutes, OptimizationInput, Room, RoomId, Solution, Surgery, SurgeryId, SurgeryOrder,
};
use crate::error::OptimizationError;
use crate::evaluator;
use crate::feasibility;
use crate::neighborhood::{self, Candidate, NeighborhoodParams};
use crate::params::OptimizationParameters;
use crate::progress::{ProgressWriter, RunStatus};
use crate::result::OptimizationResult;
use crate::tabu::{self, TabuList};
use crate::timing;
use crate::variant::{self, IterationContext};

/// Runs one optimization from `input`/`params` to completion, publishing
/// progress through `writer` and honoring `cancel` (checked once per
/// iteration). Returns a terminal [`OptimizationError`] only for failures
/// that occur before or during the run that no candidate move can recover
/// from; everything else is reported via the returned result's `status`.
pub fn run(
    run_id: String,
    input: &OptimizationInput,
    params: &OptimizationParameters,
    cancel: &AtomicBool,
    writer: &mut ProgressWriter,
) -> Result<OptimizationResult, OptimizationError> {
    let surgeries = input.surgery_map();
    let rooms = input.room_map();
    let room_ids: Vec<RoomId> = {
        let mut ids: Vec<RoomId> = rooms.keys().cloned().collect();
        ids.sort();
        ids
    };
    let pending: BTreeSet<SurgeryId> = surgeries.keys().cloned().collect();

    writer.mark_running();
    let start = Instant::now();

    let mut order = build_initial_order(input, &surgeries, &rooms, &room_ids)?;
    let mut solution = price_and_check(&order, &surgeries, &rooms, &pending, &input.sdst)?;
    let (mut best_cost, initial_breakdown) = evaluator::evaluate(
        &solution,
        &surgeries,
        &rooms,
        &params.weights,
        &params.preferences,
    );
    let mut best_solution = solution.clone();
    let mut best_breakdown = initial_breakdown;

    let mut tabu = TabuList::new(params.tabu_tenure);
    let mut strategy = variant::build_strategy(params.variant);
    let mut convergence = vec![best_cost];
    let mut iterations_without_improvement: u64 = 0;
    let mut deadend_streak: u32 = 0;
    let mut diversify_draw: u64 = 0;
    let mut current_cost = best_cost;
    let mut status = RunStatus::Running;
    let mut iteration: u64 = 0;

    info!("run {run_id}: starting with initial cost {best_cost}");

    while iteration < params.max_iterations {
        if cancel.load(Ordering::Relaxed) {
            status = RunStatus::Cancelled;
            break;
        }
        if start.elapsed().as_millis() as u64 >= params.time_limit_ms {
            status = RunStatus::TimedOut;
            break;
        }
        if iterations_without_improvement >= params.max_no_improvement {
            break;
        }

        iteration += 1;

        let neighborhood_params = NeighborhoodParams {
            max_neighbors: params.max_neighbors,
            max_shift_minutes: params.max_shift_minutes,
            seed: params.seed.map(|s| s.wrapping_add(iteration)),
        };
        let candidates = neighborhood::generate(&order, &surgeries, &input.sdst, &room_ids, &neighborhood_params);

        let mut chosen: Option<(Candidate, f64, evaluator::CostBreakdown, Solution)> = None;
        for candidate in candidates {
            let Ok(priced) = timing::price(&candidate.order, &surgeries, &rooms, &input.sdst) else {
                continue;
            };
            if feasibility::check(&priced, &pending, &surgeries).is_err() {
                continue;
            }
            let (cost, cand_breakdown) =
                evaluator::evaluate(&priced, &surgeries, &rooms, &params.weights, &params.preferences);

            let is_tabu = tabu.is_tabu(&candidate.move_key);
            if is_tabu && !tabu::aspiration_admits(cost, best_cost) {
                continue;
            }

            let better = match &chosen {
                None => true,
                Some((_, chosen_cost, chosen_breakdown, _)) => {
                    cand_breakdown.tie_break_key(cost) < chosen_breakdown.tie_break_key(*chosen_cost)
                }
            };
            if better {
                chosen = Some((candidate, cost, cand_breakdown, priced));
            }
        }

        let improved_on_this_iteration;
        match chosen {
            Some((candidate, cost, cand_breakdown, priced)) => {
                deadend_streak = 0;
                order = candidate.order;
                solution = priced;
                current_cost = cost;
                tabu.push(candidate.move_key);

                if cost < best_cost {
                    best_cost = cost;
                    best_breakdown = cand_breakdown;
                    best_solution = solution.clone();
                    iterations_without_improvement = 0;
                    improved_on_this_iteration = true;
                } else {
                    iterations_without_improvement += 1;
                    improved_on_this_iteration = false;
                }
            }
            None => {
                deadend_streak += 1;
                iterations_without_improvement += 1;
                improved_on_this_iteration = false;
                warn!("run {run_id}: iteration {iteration} found no admissible move");
            }
        }

        let ctx = IterationContext {
            iteration,
            iterations_without_improvement,
            improved_on_this_iteration,
            params,
        };
        strategy.adjust_tenure(&mut tabu, &ctx);
        strategy.on_iteration_end(&order, &ctx);

        let should_diversify = deadend_streak >= params.deadend_limit
            || iterations_without_improvement >= params.diversification_threshold
            || strategy.should_diversify(&order, &ctx);
        if should_diversify {
            debug!("run {run_id}: diversifying at iteration {iteration}");
            diversify_draw += 1;
            variant::diversify(
                &mut order,
                &room_ids,
                &surgeries,
                params.diversification_strength,
                params.seed,
                diversify_draw,
            );
            if let Ok(priced) = price_and_check(&order, &surgeries, &rooms, &pending, &input.sdst) {
                solution = priced;
                let (cost, _) = evaluator::evaluate(
                    &solution,
                    &surgeries,
                    &rooms,
                    &params.weights,
                    &params.preferences,
                );
                current_cost = cost;
            }
            deadend_streak = 0;
        }

        convergence.push(best_cost);
        writer.publish(iteration, best_cost, current_cost, false);
    }

    if status == RunStatus::Running {
        status = RunStatus::Completed;
    }
    writer.publish(iteration, best_cost, current_cost, true);
    writer.finish(status, None);

    info!("run {run_id}: finished after {iteration} iterations with status {status:?}, cost {best_cost}");

    Ok(OptimizationResult {
        run_id,
        status,
        best_solution: Some(best_solution),
        cost: Some(best_cost),
        breakdown: Some(best_breakdown),
        iterations: iteration,
        elapsed_ms: start.elapsed().as_millis() as u64,
        convergence,
        variant: params.variant,
        seed: params.seed,
    })
}

fn price_and_check(
    order: &SurgeryOrder,
    surgeries: &HashMap<SurgeryId, &Surgery>,
    rooms: &HashMap<RoomId, &Room>,
    pending: &BTreeSet<SurgeryId>,
    sdst: &crate::domain::SdstMatrix,
) -> Result<Solution, OptimizationError> {
    let solution = timing::price(order, surgeries, rooms, sdst)
        .map_err(|e| OptimizationError::InternalInvariantViolation(e.to_string()))?;
    feasibility::check(&solution, pending, surgeries)
        .map_err(|e| OptimizationError::InternalInvariantViolation(e.to_string()))?;
    Ok(solution)
}

/// Greedy initial-solution construction (§4.7 step 1): surgeries are
/// visited most-urgent first (ties by longer duration, then id), and each is
/// placed in whichever room yields the earliest feasible completion time
/// given that room's sequence so far.
fn build_initial_order(
    input: &OptimizationInput,
    surgeries: &HashMap<SurgeryId, &Surgery>,
    rooms: &HashMap<RoomId, &Room>,
    room_ids: &[RoomId],
) -> Result<SurgeryOrder, OptimizationError> {
    let mut visit_order: Vec<&Surgery> = input.surgeries.iter().collect();
    visit_order.sort_by(|a, b| {
        b.urgency
            .cmp(&a.urgency)
            .then(b.duration_minutes.cmp(&a.duration_minutes))
            .then(a.id.cmp(&b.id))
    });

    let mut order = SurgeryOrder::new(room_ids.iter().cloned());
    let mut cursors: HashMap<RoomId, (Minutes, Option<String>)> = room_ids
        .iter()
        .map(|id| {
            let opening = rooms.get(id).map(|r| r.opening_time).unwrap_or(Minutes::ZERO);
            (id.clone(), (opening, None))
        })
        .collect();
    // Busy intervals already committed for each surgeon/equipment tag,
    // independent of room: a candidate placement overlapping one of these
    // is rejected here so the constructed solution never needs the tabu
    // loop to repair a cross-room double-booking (§4.3, §4.7 step 1).
    let mut surgeon_busy: HashMap<String, Vec<(Minutes, Minutes)>> = HashMap::new();
    let mut equipment_busy: HashMap<String, Vec<(Minutes, Minutes)>> = HashMap::new();

    for surgery in visit_order {
        let mut best: Option<(RoomId, Minutes, Minutes, u32)> = None;
        let mut reasons = Vec::new();

        for room_id in room_ids {
            let room = rooms.get(room_id).expect("room_ids drawn from rooms map");
            let (cursor, prev_type) = cursors.get(room_id).expect("initialized above");
            let setup = input.sdst.lookup(prev_type.as_deref(), &surgery.type_id);
            let start = *cursor + Minutes::from(setup);
            let end = start + surgery.duration();

            if let Some(earliest) = surgery.earliest_start {
                if start < earliest {
                    reasons.push((room_id.clone(), format!("would start at {start}, before earliest_start {earliest}")));
                    continue;
                }
            }
            if let Some(latest) = surgery.latest_finish {
                if end > latest {
                    reasons.push((room_id.clone(), format!("would end at {end}, after latest_finish {latest}")));
                    continue;
                }
            }
            if let Some(closing) = room.closing_time {
                if end > closing {
                    reasons.push((room_id.clone(), format!("would end at {end}, after closing_time {closing}")));
                    continue;
                }
            }
            if !room.satisfies_equipment(&surgery.required_equipment) {
                reasons.push((room_id.clone(), "room lacks required equipment".to_string()));
                continue;
            }
            if let Some(surgeon_id) = &surgery.surgeon_id {
                if overlaps_any(surgeon_busy.get(surgeon_id), start, end) {
                    reasons.push((room_id.clone(), format!("surgeon {surgeon_id} is already booked at that time")));
                    continue;
                }
            }
            if let Some(equipment_id) = surgery
                .required_equipment
                .iter()
                .find(|eq| overlaps_any(equipment_busy.get(*eq), start, end))
            {
                reasons.push((room_id.clone(), format!("equipment {equipment_id} is already in use at that time")));
                continue;
            }

            let is_better = match &best {
                None => true,
                Some((_, _, best_end, _)) => end < *best_end,
            };
            if is_better {
                best = Some((room_id.clone(), start, end, setup));
            }
        }

        let Some((room_id, start, end, _setup)) = best else {
            return Err(OptimizationError::UnschedulableSurgery {
                surgery_id: surgery.id.clone(),
                reasons,
            });
        };

        let mut sequence = order.sequence(&room_id).to_vec();
        sequence.push(surgery.id.clone());
        order.set_sequence(&room_id, sequence);
        cursors.insert(room_id, (end, Some(surgery.type_id.clone())));
        if let Some(surgeon_id) = &surgery.surgeon_id {
            surgeon_busy.entry(surgeon_id.clone()).or_default().push((start, end));
        }
        for equipment_id in &surgery.required_equipment {
            equipment_busy
                .entry(equipment_id.clone())
                .or_default()
                .push((start, end));
        }
    }

    Ok(order)
}

fn overlaps_any(existing: Option<&Vec<(Minutes, Minutes)>>, start: Minutes, end: Minutes) -> bool {
    existing
        .map(|intervals| intervals.iter().any(|(s, e)| start < *e && *s < end))
        .unwrap_or(false)
}
