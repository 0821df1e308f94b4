use std::sync::{Arc, Mutex};

use rand::Rng;

use crate::config::RoomConfig;
use crate::error::{BuzzerError, Result};

use super::room::{BuzzOutcome, Host, Participant, Room, RoomSummary, TeamStanding};
use super::store::{MemoryRoomStore, RoomStore};
use super::team_name::parse_display_name;
use super::now_millis;

/// What happened when a connection left its room. The protocol adapter
/// turns this into the matching multicast.
#[derive(Debug, Clone)]
pub enum Departure {
    /// Host departure ends the session; the room is already deleted
    HostLeft { room_id: String },
    ParticipantLeft {
        room_id: String,
        participant_id: String,
        participant_name: String,
        summary: RoomSummary,
    },
}

#[derive(Debug, Clone)]
pub struct TeamAward {
    pub team_name: String,
    pub score: u32,
}

/// Orchestrates room lifecycle on top of the store: id generation,
/// admission rules, the buzz-recording algorithm, and idle reaping.
///
/// Every operation takes the store mutex once, mutates synchronously and
/// releases it, so room mutations never interleave and buzz order is
/// exactly arrival order at the server.
pub struct RoomManager {
    store: Mutex<Box<dyn RoomStore + Send>>,
    config: RoomConfig,
}

impl RoomManager {
    pub fn new(config: RoomConfig) -> Self {
        Self::with_store(Box::new(MemoryRoomStore::new()), config)
    }

    pub fn with_store(store: Box<dyn RoomStore + Send>, config: RoomConfig) -> Self {
        Self {
            store: Mutex::new(store),
            config,
        }
    }

    fn random_id() -> String {
        format!("{:08x}", rand::thread_rng().gen::<u32>())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Box<dyn RoomStore + Send>> {
        // Holders never panic while mutating, so a poisoned lock only
        // means a panicking reader; carry on with the inner state
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates an empty room (no host yet). A caller-supplied id must not
    /// collide with a live room; a generated id is retried until unique.
    pub fn create_room(&self, custom_id: Option<&str>) -> Result<RoomSummary> {
        let mut store = self.lock();

        let room_id = match custom_id {
            Some(id) => {
                if store.get(id).is_some() {
                    return Err(BuzzerError::RoomAlreadyExists(id.to_string()));
                }
                id.to_string()
            }
            None => {
                let mut id = Self::random_id();
                while store.get(&id).is_some() {
                    id = Self::random_id();
                }
                id
            }
        };

        let room = Room::new(room_id.clone(), now_millis());
        let summary = room.summary();
        store.add(room);

        tracing::info!(
            room_id = %room_id,
            is_custom = custom_id.is_some(),
            total_rooms = store.len(),
            "Room created"
        );
        Ok(summary)
    }

    pub fn get_summary(&self, room_id: &str) -> Result<RoomSummary> {
        let store = self.lock();
        let room = store
            .get(room_id)
            .ok_or_else(|| BuzzerError::RoomNotFound(room_id.to_string()))?;
        Ok(room.summary())
    }

    /// Hosting must precede all participation: a room that already has a
    /// host or any participant rejects a second host.
    pub fn join_as_host(&self, room_id: &str, user_id: &str, raw_name: &str) -> Result<RoomSummary> {
        let mut store = self.lock();
        let room = store
            .get_mut(room_id)
            .ok_or_else(|| BuzzerError::RoomNotFound(room_id.to_string()))?;

        if room.host.is_some() {
            return Err(BuzzerError::HostAlreadyPresent);
        }
        if !room.participants.is_empty() {
            return Err(BuzzerError::ParticipantsAlreadyPresent);
        }

        let now = now_millis();
        let parsed = parse_display_name(raw_name);
        room.host = Some(Host {
            id: user_id.to_string(),
            name: parsed.display,
            joined_at: now,
        });
        room.touch(now);
        let summary = room.summary();
        store.map_user(user_id, room_id);

        tracing::info!(room_id = %room_id, host_id = %user_id, "Host joined room");
        Ok(summary)
    }

    /// Admits a participant, parsing the team token from the display name
    /// once at admission. Returns the normalized name with the summary.
    pub fn join_as_participant(
        &self,
        room_id: &str,
        user_id: &str,
        raw_name: &str,
    ) -> Result<(String, RoomSummary)> {
        let mut store = self.lock();
        let room = store
            .get_mut(room_id)
            .ok_or_else(|| BuzzerError::RoomNotFound(room_id.to_string()))?;

        if room.host.is_none() {
            return Err(BuzzerError::NoHost);
        }
        if room.participants.len() >= self.config.max_participants {
            return Err(BuzzerError::RoomFull);
        }
        if room.participants.contains_key(user_id) {
            return Err(BuzzerError::ParticipantAlreadyJoined);
        }

        let now = now_millis();
        let parsed = parse_display_name(raw_name);
        let display_name = parsed.display.clone();
        room.participants.insert(
            user_id.to_string(),
            Participant {
                id: user_id.to_string(),
                name: parsed.display,
                team: parsed.team,
                joined_at: now,
                buzzed: false,
            },
        );
        room.touch(now);
        let summary = room.summary();
        store.map_user(user_id, room_id);

        tracing::debug!(
            room_id = %room_id,
            participant_id = %user_id,
            total_participants = summary.participant_count,
            "Participant joined room"
        );
        Ok((display_name, summary))
    }

    /// Removes the user from whichever room the reverse index points at.
    /// A departing host deletes the whole room; a departing participant
    /// only removes their own entry. No-op if the user is in no room.
    pub fn leave_room(&self, user_id: &str) -> Option<Departure> {
        let mut store = self.lock();
        let room_id = store.room_id_by_user(user_id)?;

        let is_host = match store.get(&room_id) {
            Some(room) => room.host.as_ref().map(|h| h.id == user_id).unwrap_or(false),
            None => {
                // Room already gone, drop the stale mapping
                store.clear_user(user_id);
                return None;
            }
        };

        if is_host {
            // Remove and clear mappings under the same lock so no other
            // operation can observe a dangling reverse-index entry
            let room = store.remove(&room_id)?;
            store.clear_mappings_for_room(&room);
            tracing::info!(room_id = %room_id, "Room deleted - host left");
            return Some(Departure::HostLeft { room_id });
        }

        let room = store.get_mut(&room_id)?;
        let removed = room.participants.remove(user_id)?;
        room.touch(now_millis());
        let summary = room.summary();
        store.clear_user(user_id);

        tracing::debug!(
            room_id = %room_id,
            participant_id = %user_id,
            remaining_participants = summary.participant_count,
            "Participant left room"
        );
        Some(Departure::ParticipantLeft {
            room_id,
            participant_id: removed.id,
            participant_name: removed.name,
            summary,
        })
    }

    pub fn start_round(&self, room_id: &str) -> Result<RoomSummary> {
        let mut store = self.lock();
        let room = store
            .get_mut(room_id)
            .ok_or_else(|| BuzzerError::RoomNotFound(room_id.to_string()))?;

        room.reset_round(now_millis());
        tracing::debug!(room_id = %room_id, "Round started");
        Ok(room.summary())
    }

    /// Records a buzz with the server's own clock. Arrival order at the
    /// server is the rank; client timestamps are never consulted because
    /// client clocks are unsynchronized. A duplicate buzz in the same
    /// round is an idempotent no-op.
    pub fn record_buzz(&self, room_id: &str, participant_id: &str) -> Result<(BuzzOutcome, RoomSummary)> {
        let mut store = self.lock();
        let room = store
            .get_mut(room_id)
            .ok_or_else(|| BuzzerError::RoomNotFound(room_id.to_string()))?;

        let outcome = room
            .record_buzz(participant_id, now_millis())
            .ok_or_else(|| BuzzerError::ParticipantNotFound(participant_id.to_string()))?;

        match &outcome {
            BuzzOutcome::Recorded { buzzes } => {
                tracing::info!(
                    room_id = %room_id,
                    participant_id = %participant_id,
                    buzz_count = buzzes.len(),
                    "Buzz recorded"
                );
            }
            BuzzOutcome::AlreadyBuzzed { .. } => {
                tracing::debug!(
                    room_id = %room_id,
                    participant_id = %participant_id,
                    "Buzz ignored - participant already buzzed"
                );
            }
        }
        Ok((outcome, room.summary()))
    }

    /// Awards a point to the team of the participant who answered
    /// correctly, resolved from the team token parsed at admission.
    pub fn mark_correct(&self, room_id: &str, participant_id: &str) -> Result<(TeamAward, Vec<TeamStanding>)> {
        let mut store = self.lock();
        let room = store
            .get_mut(room_id)
            .ok_or_else(|| BuzzerError::RoomNotFound(room_id.to_string()))?;

        let participant = room
            .participants
            .get(participant_id)
            .ok_or_else(|| BuzzerError::ParticipantNotFound(participant_id.to_string()))?;
        let team = participant
            .team
            .clone()
            .ok_or_else(|| BuzzerError::NoTeam(participant.name.clone()))?;

        let score = room.award_point(&team, now_millis());
        tracing::info!(
            room_id = %room_id,
            participant_id = %participant_id,
            team = %team,
            score,
            "Point awarded for correct answer"
        );
        Ok((TeamAward { team_name: team, score }, room.team_standings()))
    }

    pub fn add_team_point(&self, room_id: &str, team_name: &str) -> Result<Vec<TeamStanding>> {
        let mut store = self.lock();
        let room = store
            .get_mut(room_id)
            .ok_or_else(|| BuzzerError::RoomNotFound(room_id.to_string()))?;

        let score = room.award_point(team_name, now_millis());
        tracing::debug!(room_id = %room_id, team = %team_name, score, "Team point added");
        Ok(room.team_standings())
    }

    pub fn remove_team_point(&self, room_id: &str, team_name: &str) -> Result<Vec<TeamStanding>> {
        let mut store = self.lock();
        let room = store
            .get_mut(room_id)
            .ok_or_else(|| BuzzerError::RoomNotFound(room_id.to_string()))?;

        let score = room.deduct_point(team_name, now_millis());
        tracing::debug!(room_id = %room_id, team = %team_name, score, "Team point removed");
        Ok(room.team_standings())
    }

    pub fn team_standings(&self, room_id: &str) -> Result<Vec<TeamStanding>> {
        let store = self.lock();
        let room = store
            .get(room_id)
            .ok_or_else(|| BuzzerError::RoomNotFound(room_id.to_string()))?;
        Ok(room.team_standings())
    }

    /// Connection ids subscribed to the room (host plus participants)
    pub fn room_member_ids(&self, room_id: &str) -> Result<Vec<String>> {
        let store = self.lock();
        let room = store
            .get(room_id)
            .ok_or_else(|| BuzzerError::RoomNotFound(room_id.to_string()))?;

        let mut ids: Vec<String> = room.participants.keys().cloned().collect();
        if let Some(host) = &room.host {
            ids.push(host.id.clone());
        }
        Ok(ids)
    }

    /// Removes every idle room together with its reverse-index entries.
    /// Returns how many rooms were reaped.
    pub fn reap_idle_rooms(&self) -> usize {
        let mut store = self.lock();
        let now = now_millis();
        let timeout = self.config.idle_timeout.as_millis() as u64;

        let idle: Vec<String> = store
            .room_ids()
            .into_iter()
            .filter(|id| {
                store
                    .get(id)
                    .map(|room| room.is_idle(now, timeout))
                    .unwrap_or(false)
            })
            .collect();

        for room_id in &idle {
            if let Some(room) = store.remove(room_id) {
                store.clear_mappings_for_room(&room);
                tracing::info!(room_id = %room_id, "Cleaned up idle room");
            }
        }

        if !idle.is_empty() {
            tracing::debug!(
                reaped = idle.len(),
                total_rooms = store.len(),
                "Idle-room cleanup completed"
            );
        }
        idle.len()
    }

    /// Spawns the fixed-interval idle-room sweep
    pub fn start_reaper(self: Arc<Self>) {
        let interval = self.config.reap_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                self.reap_idle_rooms();
            }
        });
    }
}
