use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use warp::ws::Message;

use crate::config::{Config, NameConfig};
use crate::error::{BuzzerError, Result};
use crate::rooms::RoomManager;

use super::messages::ServerMessage;

type ChannelMembers = HashMap<String, mpsc::UnboundedSender<Message>>;

/// Transport-level hub for the buzzer protocol: validates names, holds the
/// per-room multicast channels, and hands sessions the RoomManager. Room
/// state itself is only ever touched through the manager.
pub struct BuzzerServer {
    manager: Arc<RoomManager>,
    name_rules: NameConfig,
    /// room id -> subscribed connection senders. Mirrors room membership
    /// at the transport layer so multicast never has to consult the store.
    channels: RwLock<HashMap<String, ChannelMembers>>,
}

impl BuzzerServer {
    pub fn new(manager: Arc<RoomManager>, config: &Config) -> Self {
        Self {
            manager,
            name_rules: config.names.clone(),
            channels: RwLock::new(HashMap::new()),
        }
    }

    pub fn manager(&self) -> &RoomManager {
        &self.manager
    }

    pub fn validate_name(&self, name: &str) -> Result<()> {
        let length = name.chars().count();
        if length < self.name_rules.min_length || length > self.name_rules.max_length {
            return Err(BuzzerError::InvalidName(format!(
                "name must be between {} and {} characters",
                self.name_rules.min_length, self.name_rules.max_length
            )));
        }
        Ok(())
    }

    pub async fn join_channel(
        &self,
        room_id: &str,
        conn_id: &str,
        sender: mpsc::UnboundedSender<Message>,
    ) {
        let mut channels = self.channels.write().await;
        channels
            .entry(room_id.to_string())
            .or_default()
            .insert(conn_id.to_string(), sender);
    }

    pub async fn leave_channel(&self, room_id: &str, conn_id: &str) {
        let mut channels = self.channels.write().await;
        if let Some(members) = channels.get_mut(room_id) {
            members.remove(conn_id);
            if members.is_empty() {
                channels.remove(room_id);
            }
        }
    }

    /// Tears down the whole channel, e.g. after the host left and the
    /// room was deleted
    pub async fn drop_channel(&self, room_id: &str) {
        let mut channels = self.channels.write().await;
        channels.remove(room_id);
    }

    /// Fire-and-forget multicast to every connection subscribed to the
    /// room, the sender included. A failed send never affects room state.
    pub async fn broadcast(&self, room_id: &str, message: &ServerMessage) {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(room_id = %room_id, error = %e, "Failed to serialize broadcast");
                return;
            }
        };

        let channels = self.channels.read().await;
        let Some(members) = channels.get(room_id) else {
            return;
        };

        for (conn_id, sender) in members {
            if sender.send(Message::text(text.clone())).is_err() {
                tracing::debug!(
                    room_id = %room_id,
                    conn_id = %conn_id,
                    "Dropping broadcast to closed connection"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RoomConfig, ServerConfig};
    use std::time::Duration;

    fn server() -> BuzzerServer {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origin: "*".to_string(),
            },
            rooms: RoomConfig {
                max_participants: 25,
                idle_timeout: Duration::from_secs(600),
                reap_interval: Duration::from_secs(60),
            },
            names: NameConfig {
                min_length: 1,
                max_length: 50,
            },
        };
        let manager = Arc::new(RoomManager::new(config.rooms.clone()));
        BuzzerServer::new(manager, &config)
    }

    #[test]
    fn test_validate_name_bounds() {
        let server = server();
        assert!(server.validate_name("A").is_ok());
        assert!(server.validate_name("").is_err());
        assert!(server.validate_name(&"x".repeat(51)).is_err());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_members() {
        let server = server();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        server.join_channel("r1", "c1", tx1).await;
        server.join_channel("r1", "c2", tx2).await;

        server
            .broadcast(
                "r1",
                &ServerMessage::HostLeft {
                    room_id: "r1".to_string(),
                },
            )
            .await;

        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_broadcast_skips_departed_member() {
        let server = server();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        server.join_channel("r1", "c1", tx1).await;
        server.join_channel("r1", "c2", tx2).await;
        server.leave_channel("r1", "c2").await;

        server
            .broadcast(
                "r1",
                &ServerMessage::HostLeft {
                    room_id: "r1".to_string(),
                },
            )
            .await;

        assert!(rx1.recv().await.is_some());
        assert!(rx2.try_recv().is_err());
    }
}
