//! SDST timing kernel (C2, §4.2).
//!
//! Pure function over a [`SurgeryOrder`] and the domain snapshot: prices
//! every surgery's `(start, end, sds_applied)` by walking each room's
//! sequence in order, honoring the setup transition from the previous
//! surgery (or `INITIAL` for the first) and the room's opening time. The
//! kernel never looks across rooms — cross-room constraints are the
//! feasibility checker's job (C3).

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{Assignment, Minutes, Room, SdstMatrix, Solution, Surgery, SurgeryId, SurgeryOrder};

/// A single surgery's placement violated a hard timing window.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimingError {
    #[error("surgery {surgery_id} in room {room_id} would end at {end} after the room closes at {closing}")]
    RoomClosed {
        surgery_id: SurgeryId,
        room_id: String,
        end: Minutes,
        closing: Minutes,
    },
    #[error("surgery {surgery_id} in room {room_id} would start at {start}, before its earliest_start {earliest}")]
    BeforeEarliestStart {
        surgery_id: SurgeryId,
        room_id: String,
        start: Minutes,
        earliest: Minutes,
    },
    #[error("surgery {surgery_id} in room {room_id} would end at {end}, after its latest_finish {latest}")]
    AfterLatestFinish {
        surgery_id: SurgeryId,
        room_id: String,
        end: Minutes,
        latest: Minutes,
    },
    #[error("order references unknown surgery id {0}")]
    UnknownSurgery(SurgeryId),
    #[error("order references unknown room id {0}")]
    UnknownRoom(String),
}

/// Prices every room's sequence in `order`, returning a fully-timed
/// [`Solution`] or the first timing violation encountered (rooms are
/// walked in the order `order.room_ids()` iterates, which is sorted by
/// room id — deterministic per §4.5).
pub fn price(
    order: &SurgeryOrder,
    surgeries: &HashMap<SurgeryId, &Surgery>,
    rooms: &HashMap<String, &Room>,
    sdst: &SdstMatrix,
) -> Result<Solution, TimingError> {
    let mut solution = Solution::new();
    for room_id in order.room_ids() {
        let room = rooms
            .get(room_id)
            .ok_or_else(|| TimingError::UnknownRoom(room_id.clone()))?;
        let assignments = price_room(order, room_id, room, surgeries, sdst)?;
        solution.set_room(room_id.clone(), assignments);
    }
    Ok(solution)
}

fn price_room(
    order: &SurgeryOrder,
    room_id: &str,
    room: &Room,
    surgeries: &HashMap<SurgeryId, &Surgery>,
    sdst: &SdstMatrix,
) -> Result<Vec<Assignment>, TimingError> {
    let mut cursor = room.opening_time;
    let mut prev_type: Option<String> = None;
    let mut out = Vec::with_capacity(order.sequence(room_id).len());

    for surgery_id in order.sequence(room_id) {
        let surgery = surgeries
            .get(surgery_id)
            .ok_or_else(|| TimingError::UnknownSurgery(surgery_id.clone()))?;

        let setup = sdst.lookup(prev_type.as_deref(), &surgery.type_id);
        let delay = order.extra_delay(surgery_id);
        let start = cursor + Minutes::from(setup) + Minutes::from(delay);
        let end = start + surgery.duration();

        if let Some(earliest) = surgery.earliest_start {
            if start < earliest {
                return Err(TimingError::BeforeEarliestStart {
                    surgery_id: surgery_id.clone(),
                    room_id: room_id.to_string(),
                    start,
                    earliest,
                });
            }
        }
        if let Some(latest) = surgery.latest_finish {
            if end > latest {
                return Err(TimingError::AfterLatestFinish {
                    surgery_id: surgery_id.clone(),
                    room_id: room_id.to_string(),
                    end,
                    latest,
                });
            }
        }
        if let Some(closing) = room.closing_time {
            if end > closing {
                return Err(TimingError::RoomClosed {
                    surgery_id: surgery_id.clone(),
                    room_id: room_id.to_string(),
                    end,
                    closing,
                });
            }
        }

        out.push(Assignment {
            surgery_id: surgery_id.clone(),
            room_id: room_id.to_string(),
            start,
            end,
            sds_applied: Minutes::from(setup),
        });

        cursor = end;
        prev_type = Some(surgery.type_id.clone());
    }
    Ok(out)
}
