//! The `Surgery` value type.

use std::collections::BTreeSet;

use super::ids::{EquipmentId, SurgeonId, SurgeryId, SurgeryTypeId};
use super::time::Minutes;
use super::urgency::Urgency;

/// A pending surgery awaiting assignment to a room and start time.
///
/// Immutable once an optimization run begins (§3): the driver never
/// mutates a `Surgery`, only the [`crate::domain::SurgeryOrder`] that
/// positions it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Surgery {
    pub id: SurgeryId,
    pub type_id: SurgeryTypeId,
    pub duration_minutes: u32,
    pub surgeon_id: Option<SurgeonId>,
    pub required_equipment: BTreeSet<EquipmentId>,
    pub urgency: Urgency,
    pub earliest_start: Option<Minutes>,
    pub latest_finish: Option<Minutes>,
}

impl Surgery {
    pub fn duration(&self) -> Minutes {
        Minutes::from(self.duration_minutes)
    }

    /// The deadline used by the urgency-violation cost component: the
    /// surgery's explicit `latest_finish` window if one was supplied,
    /// otherwise `None` (no violation is ever charged).
    pub fn urgency_deadline(&self) -> Option<Minutes> {
        self.latest_finish
    }
}
