use serde::{Deserialize, Serialize};

use crate::rooms::{BuzzEntry, RoomSummary, TeamStanding};

/// Inbound events from browser clients. Payload fields are camelCase on
/// the wire; a missing required field fails deserialization and is
/// acknowledged as a validation error.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        name: String,
        #[serde(default)]
        room_id: Option<String>,
    },

    JoinRoom {
        room_id: String,
        name: String,
    },

    StartRound,

    /// The client timestamp is advisory only; ranking always uses the
    /// server clock at arrival
    Buzz {
        #[serde(default)]
        timestamp: Option<u64>,
    },

    MarkCorrect {
        participant_id: String,
    },

    LeaderboardRequest {
        room_id: String,
    },

    AddTeamPoint {
        room_id: String,
        team_name: String,
    },

    RemoveTeamPoint {
        room_id: String,
        team_name: String,
    },
}

/// Outbound events: acknowledgements to the caller and room multicasts.
/// Room-wide multicasts include the sender, which doubles as the success
/// acknowledgement; errors go to the caller only.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomCreated {
        room: RoomSummary,
    },

    RoomJoined {
        room: RoomSummary,
    },

    ParticipantJoined {
        participant_id: String,
        participant_name: String,
        room: RoomSummary,
    },

    RoundStarted {
        room: RoomSummary,
    },

    BuzzesUpdated {
        buzzes: Vec<BuzzEntry>,
        room: RoomSummary,
    },

    /// Sent to the caller when they already buzzed this round
    BuzzRejected {
        reason: String,
    },

    PointAwarded {
        team_name: String,
        score: u32,
    },

    LeaderboardUpdated {
        teams: Vec<TeamStanding>,
    },

    HostLeft {
        room_id: String,
    },

    ParticipantLeft {
        participant_id: String,
        participant_name: String,
        room: RoomSummary,
    },

    Error {
        code: String,
        message: String,
    },
}
