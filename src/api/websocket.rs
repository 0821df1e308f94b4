use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use warp::ws::{Message, WebSocket};

use crate::buzzer::{BuzzerServer, BuzzerSession, ClientMessage};

pub async fn handle_buzzer_websocket(websocket: WebSocket, server: Arc<BuzzerServer>) {
    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let mut session = BuzzerSession::new(server, tx);
    tracing::debug!(conn_id = %session.conn_id(), "New buzzer WebSocket connection");

    // Writer pump: everything the session or a broadcast queues goes out here
    let sender_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_sender.send(message).await {
                tracing::debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(message) => handle_websocket_message(&mut session, message).await,
            Err(e) => {
                tracing::debug!(conn_id = %session.conn_id(), error = %e, "WebSocket error");
                break;
            }
        }
    }

    session.cleanup().await;
    sender_task.abort();
    tracing::debug!(conn_id = %session.conn_id(), "Buzzer WebSocket connection closed");
}

async fn handle_websocket_message(session: &mut BuzzerSession, message: Message) {
    let Ok(text) = message.to_str() else {
        // Ping/pong/close frames are handled by warp
        return;
    };

    match serde_json::from_str::<ClientMessage>(text) {
        Ok(client_message) => session.handle_message(client_message).await,
        Err(e) => {
            tracing::debug!(
                conn_id = %session.conn_id(),
                error = %e,
                raw_message = %text,
                "Failed to parse client message"
            );
            session.reject_invalid(&e.to_string());
        }
    }
}
