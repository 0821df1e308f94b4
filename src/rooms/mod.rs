mod manager;
mod room;
mod store;
mod team_name;

pub use manager::{Departure, RoomManager, TeamAward};
pub use room::{BuzzEntry, BuzzOutcome, Host, Participant, Room, RoomSummary, TeamStanding};
pub use store::{MemoryRoomStore, RoomStore};
pub use team_name::parse_display_name;

use std::time::{SystemTime, UNIX_EPOCH};

/// Server clock in epoch milliseconds. All ranking and idle decisions use
/// this clock, never a client-supplied timestamp.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
