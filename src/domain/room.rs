//! The `Room` value type.

use std::collections::BTreeSet;

use super::ids::RoomId;
use super::time::Minutes;

/// An operating room available for the scheduling date.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Room {
    pub id: RoomId,
    pub opening_time: Minutes,
    pub closing_time: Option<Minutes>,
    pub capabilities: BTreeSet<String>,
}

impl Room {
    /// Returns `true` if this room carries every tag in `required`.
    pub fn satisfies_equipment(&self, required: &BTreeSet<String>) -> bool {
        required.is_subset(&self.capabilities)
    }
}
