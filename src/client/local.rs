//! In-process connector.
//!
//! Drives a [`ConnectionSession`] against a [`RoomManager`] in the same
//! process. Frames still go through their JSON encoding, so the wire
//! protocol is exercised without a socket.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{sink, stream};
use tokio::sync::mpsc;

use crate::adapters::websocket::{
    ClientFrame, ClientMessage, ConnectionSession, RoomManager, ServerMessage,
};
use crate::ports::SessionValidator;

use super::connector::{ClientLink, Connector, LINK_BUFFER};
use super::error::ClientError;

/// Connects to a gateway running in this process.
#[derive(Clone)]
pub struct LocalConnector {
    rooms: Arc<RoomManager>,
    validator: Arc<dyn SessionValidator>,
}

impl LocalConnector {
    pub fn new(rooms: Arc<RoomManager>, validator: Arc<dyn SessionValidator>) -> Self {
        Self { rooms, validator }
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self, token: &str) -> Result<ClientLink, ClientError> {
        let identity = self
            .validator
            .validate(token)
            .await
            .map_err(|e| ClientError::Unauthorized(e.to_string()))?;

        let (outgoing, client_rx) = mpsc::channel::<ClientMessage>(LINK_BUFFER);
        let (server_tx, incoming) = mpsc::channel::<ServerMessage>(LINK_BUFFER);

        let frames_out = sink::unfold(server_tx, |tx, text: String| async move {
            let msg: ServerMessage = serde_json::from_str(&text).map_err(|e| e.to_string())?;
            tx.send(msg).await.map_err(|_| "client link closed".to_string())?;
            Ok::<_, String>(tx)
        });
        let frames_in = stream::unfold(client_rx, |mut rx| async move {
            let msg = rx.recv().await?;
            let frame = match serde_json::to_string(&msg) {
                Ok(text) => ClientFrame::Text(text),
                Err(_) => ClientFrame::Unsupported,
            };
            Some((frame, rx))
        });

        let session = ConnectionSession::open(self.rooms.clone(), identity);
        tokio::spawn(session.run(frames_out, frames_in));

        Ok(ClientLink { outgoing, incoming })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::access::InMemoryProjectAccess;
    use crate::adapters::auth::MockSessionValidator;

    fn connector() -> LocalConnector {
        LocalConnector::new(
            Arc::new(RoomManager::with_default_capacity(Arc::new(
                InMemoryProjectAccess::new(),
            ))),
            Arc::new(MockSessionValidator::new().with_test_user("tok", "u1")),
        )
    }

    #[tokio::test]
    async fn valid_token_receives_connected_frame() {
        let mut link = connector().connect("tok").await.unwrap();
        match link.incoming.recv().await {
            Some(ServerMessage::Connected(msg)) => assert_eq!(msg.user_id, "u1"),
            other => panic!("expected connected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_token_is_unauthorized() {
        let result = connector().connect("nope").await;
        assert!(matches!(result, Err(ClientError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn ping_round_trips_through_json() {
        let mut link = connector().connect("tok").await.unwrap();
        link.incoming.recv().await;

        link.outgoing.send(ClientMessage::Ping).await.unwrap();

        assert!(matches!(
            link.incoming.recv().await,
            Some(ServerMessage::Pong(_))
        ));
    }
}
