//! The `SurgeryType` value type.

use super::ids::SurgeryTypeId;

/// A category of surgery that participates as a key in the SDST matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurgeryType {
    pub id: SurgeryTypeId,
    pub label: String,
}
