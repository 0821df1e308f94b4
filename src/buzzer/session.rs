use std::sync::Arc;

use rand::Rng;
use tokio::sync::mpsc;
use warp::ws::Message;

use crate::error::{BuzzerError, Result};
use crate::rooms::{BuzzOutcome, Departure};

use super::messages::{ClientMessage, ServerMessage};
use super::server::BuzzerServer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Participant,
}

/// Per-connection protocol session: role and room metadata, inbound event
/// dispatch, and the disconnect cascade. The connection id doubles as the
/// user id everywhere in the room layer.
pub struct BuzzerSession {
    server: Arc<BuzzerServer>,
    conn_id: String,
    sender: mpsc::UnboundedSender<Message>,
    role: Option<Role>,
    room_id: Option<String>,
    name: Option<String>,
}

impl BuzzerSession {
    pub fn new(server: Arc<BuzzerServer>, sender: mpsc::UnboundedSender<Message>) -> Self {
        let conn_id = format!("conn-{:016x}", rand::thread_rng().gen::<u64>());
        Self {
            server,
            conn_id,
            sender,
            role: None,
            room_id: None,
            name: None,
        }
    }

    pub fn conn_id(&self) -> &str {
        &self.conn_id
    }

    /// Dispatches one inbound event. Failures are acknowledged to this
    /// connection only and never disturb the rest of the room.
    pub async fn handle_message(&mut self, message: ClientMessage) {
        let result = match message {
            ClientMessage::CreateRoom { name, room_id } => {
                self.handle_create_room(&name, room_id.as_deref()).await
            }
            ClientMessage::JoinRoom { room_id, name } => {
                self.handle_join_room(&room_id, &name).await
            }
            ClientMessage::StartRound => self.handle_start_round().await,
            ClientMessage::Buzz { timestamp } => self.handle_buzz(timestamp).await,
            ClientMessage::MarkCorrect { participant_id } => {
                self.handle_mark_correct(&participant_id).await
            }
            ClientMessage::LeaderboardRequest { room_id } => {
                self.handle_leaderboard_request(&room_id)
            }
            ClientMessage::AddTeamPoint { room_id, team_name } => {
                self.handle_team_point(&room_id, &team_name, true).await
            }
            ClientMessage::RemoveTeamPoint { room_id, team_name } => {
                self.handle_team_point(&room_id, &team_name, false).await
            }
        };

        if let Err(error) = result {
            tracing::debug!(
                conn_id = %self.conn_id,
                code = error.code(),
                error = %error,
                "Request failed"
            );
            self.send_error(&error);
        }
    }

    /// Acknowledges a malformed payload that never made it to dispatch
    pub fn reject_invalid(&self, detail: &str) {
        self.send_error(&BuzzerError::InvalidMessage(detail.to_string()));
    }

    async fn handle_create_room(&mut self, name: &str, custom_id: Option<&str>) -> Result<()> {
        self.server.validate_name(name)?;

        let manager = self.server.manager();
        let room = manager.create_room(custom_id)?;
        let room = manager.join_as_host(&room.id, &self.conn_id, name)?;

        self.server
            .join_channel(&room.id, &self.conn_id, self.sender.clone())
            .await;
        self.role = Some(Role::Host);
        self.room_id = Some(room.id.clone());
        self.name = Some(name.to_string());

        tracing::info!(
            conn_id = %self.conn_id,
            room_id = %room.id,
            host_name = %name,
            "Host created room"
        );
        self.send(&ServerMessage::RoomCreated { room });
        Ok(())
    }

    async fn handle_join_room(&mut self, room_id: &str, name: &str) -> Result<()> {
        self.server.validate_name(name)?;

        let manager = self.server.manager();
        let (display_name, room) = manager.join_as_participant(room_id, &self.conn_id, name)?;

        self.server
            .join_channel(room_id, &self.conn_id, self.sender.clone())
            .await;
        self.role = Some(Role::Participant);
        self.room_id = Some(room_id.to_string());
        self.name = Some(display_name.clone());

        tracing::info!(
            conn_id = %self.conn_id,
            room_id = %room_id,
            participant_name = %display_name,
            "Participant joined room"
        );

        self.send(&ServerMessage::RoomJoined { room: room.clone() });
        self.server
            .broadcast(
                room_id,
                &ServerMessage::ParticipantJoined {
                    participant_id: self.conn_id.clone(),
                    participant_name: display_name,
                    room,
                },
            )
            .await;
        Ok(())
    }

    async fn handle_start_round(&self) -> Result<()> {
        let room_id = self.require_role(Role::Host, "host")?;
        let room = self.server.manager().start_round(&room_id)?;

        tracing::info!(room_id = %room_id, host_id = %self.conn_id, "Round started");
        self.server
            .broadcast(&room_id, &ServerMessage::RoundStarted { room })
            .await;
        Ok(())
    }

    async fn handle_buzz(&self, _client_timestamp: Option<u64>) -> Result<()> {
        let room_id = self.require_role(Role::Participant, "participants")?;
        let (outcome, room) = self.server.manager().record_buzz(&room_id, &self.conn_id)?;

        match outcome {
            BuzzOutcome::Recorded { buzzes } => {
                self.server
                    .broadcast(&room_id, &ServerMessage::BuzzesUpdated { buzzes, room })
                    .await;
            }
            BuzzOutcome::AlreadyBuzzed { .. } => {
                self.send(&ServerMessage::BuzzRejected {
                    reason: "Already buzzed this round".to_string(),
                });
            }
        }
        Ok(())
    }

    async fn handle_mark_correct(&self, participant_id: &str) -> Result<()> {
        let room_id = self.require_role(Role::Host, "host")?;
        let (award, teams) = self.server.manager().mark_correct(&room_id, participant_id)?;

        self.send(&ServerMessage::PointAwarded {
            team_name: award.team_name,
            score: award.score,
        });
        self.server
            .broadcast(&room_id, &ServerMessage::LeaderboardUpdated { teams })
            .await;
        Ok(())
    }

    fn handle_leaderboard_request(&self, room_id: &str) -> Result<()> {
        let teams = self.server.manager().team_standings(room_id)?;
        self.send(&ServerMessage::LeaderboardUpdated { teams });
        Ok(())
    }

    async fn handle_team_point(&self, room_id: &str, team_name: &str, add: bool) -> Result<()> {
        let manager = self.server.manager();
        let teams = if add {
            manager.add_team_point(room_id, team_name)?
        } else {
            manager.remove_team_point(room_id, team_name)?
        };

        self.server
            .broadcast(room_id, &ServerMessage::LeaderboardUpdated { teams })
            .await;
        Ok(())
    }

    /// Disconnect cascade: leave the room and tell everyone who is left.
    /// Errors here are logged and swallowed; one broken connection must
    /// never take down cleanup for the rest of the room.
    pub async fn cleanup(&mut self) {
        let Some(departure) = self.server.manager().leave_room(&self.conn_id) else {
            return;
        };

        match departure {
            Departure::HostLeft { room_id } => {
                tracing::info!(
                    conn_id = %self.conn_id,
                    room_id = %room_id,
                    "Host disconnected, closing room"
                );
                self.server
                    .broadcast(
                        &room_id,
                        &ServerMessage::HostLeft {
                            room_id: room_id.clone(),
                        },
                    )
                    .await;
                self.server.drop_channel(&room_id).await;
            }
            Departure::ParticipantLeft {
                room_id,
                participant_id,
                participant_name,
                summary,
            } => {
                tracing::info!(
                    conn_id = %self.conn_id,
                    room_id = %room_id,
                    "Participant disconnected"
                );
                self.server.leave_channel(&room_id, &self.conn_id).await;
                self.server
                    .broadcast(
                        &room_id,
                        &ServerMessage::ParticipantLeft {
                            participant_id,
                            participant_name,
                            room: summary,
                        },
                    )
                    .await;
            }
        }
    }

    fn require_role(&self, role: Role, label: &'static str) -> Result<String> {
        if self.role != Some(role) {
            return Err(BuzzerError::RoleRequired(label));
        }
        self.room_id.clone().ok_or(BuzzerError::NotInRoom)
    }

    fn send(&self, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(text) => {
                // Receiver side may already be gone; nothing to roll back
                let _ = self.sender.send(Message::text(text));
            }
            Err(e) => {
                tracing::error!(conn_id = %self.conn_id, error = %e, "Failed to serialize reply");
            }
        }
    }

    fn send_error(&self, error: &BuzzerError) {
        self.send(&ServerMessage::Error {
            code: error.code().to_string(),
            message: error.to_string(),
        });
    }
}
