//! Domain value types (C1): `Surgery`, `Room`, `SurgeryType`, `SdstMatrix`,
//! `Assignment`, `Solution`, and the `OptimizationInput` snapshot that binds
//! them together for one run.
//!
//! All comparisons and hashing use identifier fields only; floating point
//! is avoided in the inner loop (§4.1) — durations and setup times are
//! integer minutes via [`time::Minutes`], and cost components are
//! accumulated as integers until the evaluator converts a total to a
//! `f64` score at its boundary.

mod assignment;
mod ids;
mod input;
mod room;
mod sdst;
mod solution;
mod surgery;
mod surgery_type;
mod time;
mod urgency;

pub use assignment::Assignment;
pub use ids::{EquipmentId, RoomId, SurgeonId, SurgeryId, SurgeryTypeId};
pub use input::OptimizationInput;
pub use room::Room;
pub use sdst::SdstMatrix;
pub use solution::{Solution, SurgeryOrder};
pub use surgery::Surgery;
pub use surgery_type::SurgeryType;
pub use time::Minutes;
pub use urgency::Urgency;

/// The `INITIAL` sentinel used to look up a room's opening setup in the
/// SDST matrix: `sdst.lookup(None, type_id)`. Kept as a function rather
/// than a constant because the sentinel is represented as `Option::None`,
/// not a sentinel string (§9's unification of the two source
/// representations).
pub const INITIAL: Option<&str> = None;
