//! Identifier type aliases.
//!
//! All comparisons and hashing in the core use identifier fields only
//! (§4.1); identifiers are opaque strings supplied by the host.

/// Identifier of a [`crate::domain::Surgery`].
pub type SurgeryId = String;
/// Identifier of a [`crate::domain::Room`].
pub type RoomId = String;
/// Identifier of a [`crate::domain::SurgeryType`].
pub type SurgeryTypeId = String;
/// Identifier of a surgeon, opaque to the core.
pub type SurgeonId = String;
/// Identifier of a piece of equipment, opaque to the core.
pub type EquipmentId = String;
