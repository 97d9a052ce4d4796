//! WebSocket connector over tokio-tungstenite.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{
    self,
    client::IntoClientRequest,
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    Message,
};

use crate::adapters::websocket::{ClientMessage, ServerMessage};

use super::connector::{ClientLink, Connector, LINK_BUFFER};
use super::error::ClientError;

/// Connects to a gateway at `ws://host:port/realtime`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// `url` is the full endpoint, e.g. `ws://127.0.0.1:8080/realtime`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, token: &str) -> Result<ClientLink, ClientError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ClientError::Unauthorized("token is not a valid header value".into()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (socket, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| match e {
                tungstenite::Error::Http(response)
                    if response.status() == StatusCode::UNAUTHORIZED =>
                {
                    ClientError::Unauthorized("gateway rejected token".into())
                }
                other => ClientError::Transport(other.to_string()),
            })?;
        let (mut ws_tx, mut ws_rx) = socket.split();

        let (outgoing, mut client_rx) = mpsc::channel::<ClientMessage>(LINK_BUFFER);
        let (server_tx, incoming) = mpsc::channel::<ServerMessage>(LINK_BUFFER);

        tokio::spawn(async move {
            while let Some(msg) = client_rx.recv().await {
                let text = match serde_json::to_string(&msg) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("Failed to encode client message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = ws_tx.send(Message::Text(text)).await {
                    tracing::debug!("Send error, closing link: {}", e);
                    return;
                }
            }
            // Link dropped by the manager.
            let _ = ws_tx.send(Message::Close(None)).await;
        });

        tokio::spawn(async move {
            while let Some(result) = ws_rx.next().await {
                match result {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(msg) => {
                            if server_tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!("Unrecognized server frame: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!("Receive error: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(ClientLink { outgoing, incoming })
    }
}
