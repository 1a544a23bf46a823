//! The `Assignment` value type.

use super::ids::{RoomId, SurgeryId};
use super::time::Minutes;

/// A single surgery priced into a concrete room and time slot.
///
/// `end - start = duration_minutes + sds_applied`. `sds_applied` is the
/// setup time immediately preceding this surgery, charged to this
/// assignment for accounting even though it occupies the room rather than
/// being surgery time (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    pub surgery_id: SurgeryId,
    pub room_id: RoomId,
    pub start: Minutes,
    pub end: Minutes,
    pub sds_applied: Minutes,
}
