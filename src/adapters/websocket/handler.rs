//! WebSocket upgrade handler for realtime connections.
//!
//! Handles the HTTP → WebSocket upgrade:
//! 1. Extract the session token (`Authorization: Bearer` or `?token=`)
//! 2. Validate it; reject with 401 before upgrading on failure
//! 3. Upgrade and hand the socket to a [`ConnectionSession`]

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{future, SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

use super::{
    rooms::RoomManager,
    session::{ClientFrame, ConnectionSession},
};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    /// Room manager shared with the emit dispatcher.
    pub room_manager: Arc<RoomManager>,
    /// Validates handshake tokens.
    pub validator: Arc<dyn SessionValidator>,
}

impl WebSocketState {
    pub fn new(room_manager: Arc<RoomManager>, validator: Arc<dyn SessionValidator>) -> Self {
        Self {
            room_manager,
            validator,
        }
    }
}

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub token: Option<String>,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /realtime`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(params): Query<ConnectParams>,
    State(state): State<WebSocketState>,
) -> Response {
    let identity = match authenticate(&state, &headers, params.token.as_deref()).await {
        Ok(identity) => identity,
        Err(e) => return auth_rejection(e),
    };

    tracing::debug!(user_id = %identity.id, "Upgrading realtime connection");
    ws.on_upgrade(move |socket| handle_socket(socket, identity, state))
}

/// Liveness plus the current connection count.
///
/// Route: `GET /health`
pub async fn health_handler(State(state): State<WebSocketState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "connections": state.room_manager.connection_count(),
    }))
}

async fn authenticate(
    state: &WebSocketState,
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<AuthenticatedUser, AuthError> {
    let token = extract_token(headers, query_token).ok_or(AuthError::MissingToken)?;
    state.validator.validate(&token).await
}

/// Bearer header wins over the query parameter. The scheme is case-insensitive.
fn extract_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty());

    from_header
        .or_else(|| query_token.map(str::trim).filter(|t| !t.is_empty()))
        .map(str::to_string)
}

fn auth_rejection(error: AuthError) -> Response {
    let status = match error {
        AuthError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::MissingToken | AuthError::InvalidToken | AuthError::TokenExpired => {
            StatusCode::UNAUTHORIZED
        }
    };
    tracing::info!(error = %error, "Rejected realtime handshake");

    (
        status,
        Json(json!({
            "code": "UNAUTHORIZED",
            "message": error.to_string(),
        })),
    )
        .into_response()
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, identity: AuthenticatedUser, state: WebSocketState) {
    let (sender, receiver) = socket.split();

    let tx = sender.with(|text: String| future::ready(Ok::<_, axum::Error>(Message::Text(text))));
    let rx = receiver.filter_map(|result| {
        future::ready(match result {
            Ok(Message::Text(text)) => Some(ClientFrame::Text(text)),
            Ok(Message::Binary(_)) => Some(ClientFrame::Unsupported),
            // Protocol-level ping/pong is handled by axum.
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
            Ok(Message::Close(_)) => Some(ClientFrame::Close),
            Err(e) => {
                tracing::debug!("Receive error: {}", e);
                Some(ClientFrame::Close)
            }
        })
    });

    ConnectionSession::open(state.room_manager.clone(), identity)
        .run(tx, rx)
        .await;
}

/// Create axum router for the realtime endpoints.
///
/// # Example
///
/// ```ignore
/// let app = websocket_router().with_state(state);
/// ```
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new()
        .route("/realtime", get(ws_handler))
        .route("/health", get(health_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_token(&headers, None), Some("abc".to_string()));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        for value in ["bearer abc", "BEARER abc", "BeArEr abc"] {
            let mut headers = HeaderMap::new();
            headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
            assert_eq!(extract_token(&headers, None), Some("abc".to_string()));
        }
    }

    #[test]
    fn header_takes_precedence_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_token(&headers, Some("xyz")), Some("abc".to_string()));
    }

    #[test]
    fn query_token_is_used_without_header() {
        assert_eq!(
            extract_token(&HeaderMap::new(), Some("xyz")),
            Some("xyz".to_string())
        );
    }

    #[test]
    fn non_bearer_or_empty_tokens_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&headers, Some("  ")), None);
    }

    #[test]
    fn auth_failures_map_to_401() {
        assert_eq!(auth_rejection(AuthError::MissingToken).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(auth_rejection(AuthError::TokenExpired).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            auth_rejection(AuthError::service_unavailable("down")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn websocket_router_creates_route() {
        let _router = websocket_router();
    }
}
