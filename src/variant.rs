//! Algorithm-variant strategies (C8, §4.8).
//!
//! The source's object-oriented strategy hierarchy (one class per variant)
//! becomes a tagged enum selected at the driver boundary plus a small trait
//! of hook points, per the Design Notes. The evaluator and timing kernel
//! never see a variant; only the driver's tenure policy and diversification
//! triggers depend on it.

use std::collections::{HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::domain::{RoomId, Surgery, SurgeryId, SurgeryOrder};
use crate::neighborhood::MoveKey;
use crate::params::OptimizationParameters;
use crate::tabu::TabuList;

/// Which Tabu Search variant drives tenure adaptation and diversification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Variant {
    #[default]
    Basic,
    Adaptive,
    Reactive,
    Hybrid,
}

/// Everything a hook needs to know about the iteration just completed.
pub struct IterationContext<'a> {
    pub iteration: u64,
    pub iterations_without_improvement: u64,
    pub improved_on_this_iteration: bool,
    pub params: &'a OptimizationParameters,
}

/// Hook points a variant plugs into the search driver (C7) through.
pub trait VariantStrategy {
    /// Called once per iteration after the tabu list has recorded the
    /// chosen move; may change its tenure.
    fn adjust_tenure(&mut self, tabu: &mut TabuList, ctx: &IterationContext);

    /// Called once per iteration with the solution just moved to; updates
    /// any per-variant memory (e.g. the reactive fingerprint window).
    fn on_iteration_end(&mut self, order: &SurgeryOrder, ctx: &IterationContext);

    /// Whether the driver should perform a diversification burst before the
    /// next iteration.
    fn should_diversify(&mut self, order: &SurgeryOrder, ctx: &IterationContext) -> bool;
}

/// Fixed tenure, never diversifies on its own (the driver's deadend
/// counter can still trigger diversification independent of the variant).
#[derive(Debug, Default)]
pub struct BasicStrategy;

impl VariantStrategy for BasicStrategy {
    fn adjust_tenure(&mut self, _tabu: &mut TabuList, _ctx: &IterationContext) {}
    fn on_iteration_end(&mut self, _order: &SurgeryOrder, _ctx: &IterationContext) {}
    fn should_diversify(&mut self, _order: &SurgeryOrder, _ctx: &IterationContext) -> bool {
        false
    }
}

/// Fixed number of iterations between tenure adjustments, since
/// `tenure_adjust_interval` is not part of the host-facing parameter table
/// (§6) — it is an internal tuning constant of the adaptive variant only.
const TENURE_ADJUST_INTERVAL: u64 = 10;

/// Tenure grows when the best solution has stagnated and shrinks when it is
/// still improving, clamped to `[min_tabu_tenure, max_tabu_tenure]` (§4.6).
#[derive(Debug, Default)]
pub struct AdaptiveStrategy {
    stagnant_since_last_adjust: bool,
}

impl VariantStrategy for AdaptiveStrategy {
    fn adjust_tenure(&mut self, tabu: &mut TabuList, ctx: &IterationContext) {
        if !ctx.improved_on_this_iteration {
            self.stagnant_since_last_adjust = true;
        }
        if ctx.iteration % TENURE_ADJUST_INTERVAL != 0 {
            return;
        }
        let factor = ctx.params.tenure_adaptation_factor;
        let current = tabu.tenure() as f64;
        let adjusted = if self.stagnant_since_last_adjust {
            current * factor
        } else {
            current / factor
        };
        let clamped = adjusted
            .round()
            .clamp(ctx.params.min_tabu_tenure as f64, ctx.params.max_tabu_tenure as f64);
        tabu.set_tenure(clamped as usize);
        self.stagnant_since_last_adjust = false;
    }

    fn on_iteration_end(&mut self, _order: &SurgeryOrder, _ctx: &IterationContext) {}

    fn should_diversify(&mut self, _order: &SurgeryOrder, _ctx: &IterationContext) -> bool {
        false
    }
}

/// Remembers the last `reactive_window` visited solution fingerprints; a
/// repeat triggers a diversification burst on the next iteration.
#[derive(Debug, Default)]
pub struct ReactiveStrategy {
    recent: VecDeque<String>,
    repeat_detected: bool,
}

impl VariantStrategy for ReactiveStrategy {
    fn adjust_tenure(&mut self, _tabu: &mut TabuList, _ctx: &IterationContext) {}

    fn on_iteration_end(&mut self, order: &SurgeryOrder, ctx: &IterationContext) {
        let fingerprint = order.sequence_fingerprint();
        self.repeat_detected = self.recent.contains(&fingerprint);
        self.recent.push_back(fingerprint);
        while self.recent.len() > ctx.params.reactive_window {
            self.recent.pop_front();
        }
    }

    fn should_diversify(&mut self, _order: &SurgeryOrder, _ctx: &IterationContext) -> bool {
        std::mem::take(&mut self.repeat_detected)
    }
}

/// Adaptive tenure plus reactive diversification.
#[derive(Debug, Default)]
pub struct HybridStrategy {
    adaptive: AdaptiveStrategy,
    reactive: ReactiveStrategy,
}

impl VariantStrategy for HybridStrategy {
    fn adjust_tenure(&mut self, tabu: &mut TabuList, ctx: &IterationContext) {
        self.adaptive.adjust_tenure(tabu, ctx);
    }

    fn on_iteration_end(&mut self, order: &SurgeryOrder, ctx: &IterationContext) {
        self.reactive.on_iteration_end(order, ctx);
    }

    fn should_diversify(&mut self, order: &SurgeryOrder, ctx: &IterationContext) -> bool {
        self.reactive.should_diversify(order, ctx)
    }
}

/// Builds the strategy state for a selected variant.
pub fn build_strategy(variant: Variant) -> Box<dyn VariantStrategy> {
    match variant {
        Variant::Basic => Box::new(BasicStrategy),
        Variant::Adaptive => Box::new(AdaptiveStrategy::default()),
        Variant::Reactive => Box::new(ReactiveStrategy::default()),
        Variant::Hybrid => Box::new(HybridStrategy::default()),
    }
}

/// Default seed used when the host runs without one (§6: "none ⇒ fully
/// deterministic"). Diversification must never read OS entropy — a burst
/// is reachable even from the default Basic variant via the driver's
/// deadend counter, and an entropy-seeded shuffle there would make an
/// otherwise unseeded run non-reproducible, violating §8 property 6.
const UNSEEDED_DIVERSIFY_SEED: u64 = 0x4449_5645_5253_4946;

/// Performs `k` random relocate moves ignoring the tabu list entirely,
/// where `k = ceil(diversification_strength * total_surgeries)` (§4.8).
/// Used both for reactive/hybrid repeat detection and for the driver's
/// deadend response (§4.7 step 4). Always deterministic: seeded from
/// `seed` when set, or from a fixed internal constant otherwise — either
/// way advanced by `draw` so repeated diversification bursts within one
/// run do not replay the same draws.
pub fn diversify(
    order: &mut SurgeryOrder,
    room_ids: &[RoomId],
    surgeries: &HashMap<SurgeryId, &Surgery>,
    strength: f64,
    seed: Option<u64>,
    draw: u64,
) -> Vec<MoveKey> {
    let total = order.total_surgeries();
    if total == 0 || room_ids.is_empty() {
        return Vec::new();
    }
    let k = ((strength * total as f64).ceil() as usize).max(1).min(total);

    let base_seed = seed.unwrap_or(UNSEEDED_DIVERSIFY_SEED);
    let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(draw));

    let mut surgery_ids: Vec<SurgeryId> = surgeries.keys().cloned().collect();
    surgery_ids.sort();
    surgery_ids.shuffle(&mut rng);

    let mut applied = Vec::new();
    for surgery_id in surgery_ids.into_iter().take(k) {
        let Some((from_room, _)) = order.find(&surgery_id) else { continue };
        let from_room = from_room.clone();
        let to_room = &room_ids[rng.gen_range(0..room_ids.len())];

        let remaining: Vec<SurgeryId> = order
            .sequence(&from_room)
            .iter()
            .filter(|id| **id != surgery_id)
            .cloned()
            .collect();
        if *to_room == from_room {
            let position = rng.gen_range(0..=remaining.len());
            let mut sequence = remaining;
            sequence.insert(position, surgery_id.clone());
            order.set_sequence(&from_room, sequence);
        } else {
            order.set_sequence(&from_room, remaining);
            let mut target = order.sequence(to_room).to_vec();
            let position = rng.gen_range(0..=target.len());
            target.insert(position, surgery_id.clone());
            order.set_sequence(to_room, target);
        }
        applied.push(MoveKey::Relocate {
            surgery_id,
            from_room,
            to_room: to_room.clone(),
        });
    }
    applied
}
