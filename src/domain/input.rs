//! The read-only optimization input snapshot (§3 Lifecycles).

use std::collections::HashMap;

use super::ids::{RoomId, SurgeryId, SurgeryTypeId};
use super::room::Room;
use super::sdst::SdstMatrix;
use super::surgery::Surgery;
use super::surgery_type::SurgeryType;

/// Everything the host supplies for a single optimization call: pending
/// surgeries, available rooms, surgery types, and the SDST matrix. Created
/// by the host and treated as read-only for the lifetime of a run (§3).
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationInput {
    pub surgeries: Vec<Surgery>,
    pub rooms: Vec<Room>,
    pub surgery_types: Vec<SurgeryType>,
    pub sdst: SdstMatrix,
}

impl OptimizationInput {
    pub fn surgery_map(&self) -> HashMap<SurgeryId, &Surgery> {
        self.surgeries.iter().map(|s| (s.id.clone(), s)).collect()
    }

    pub fn room_map(&self) -> HashMap<RoomId, &Room> {
        self.rooms.iter().map(|r| (r.id.clone(), r)).collect()
    }

    pub fn surgery_type_ids(&self) -> std::collections::HashSet<SurgeryTypeId> {
        self.surgery_types.iter().map(|t| t.id.clone()).collect()
    }
}
