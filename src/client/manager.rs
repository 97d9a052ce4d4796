//! SubscriptionManager - the client's view of the realtime gateway.
//!
//! Owns one connection at a time, routes incoming events to registered
//! handlers, and turns `room.join` into an awaited request/acknowledge
//! round trip.
//!
//! Handlers live in the manager rather than the connection, so they stay
//! registered across `reconnect`. Project rooms do not: after a reconnect
//! only the automatic `user:`/`tenant:` rooms are joined, and callers must
//! join project rooms again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use serde_json::json;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::adapters::websocket::{ClientMessage, ConnectedMessage, EventFrame, ServerMessage};
use crate::config::RealtimeConfig;
use crate::domain::foundation::{ProjectId, Timestamp};

use super::connector::Connector;
use super::error::ClientError;

/// Default bound on a join round trip (and on the handshake).
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Name under which `events.dropped` notices are delivered to handlers.
pub const EVENTS_DROPPED: &str = "events.dropped";

/// Connection lifecycle as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// Callback invoked for each matching event.
pub type EventHandler = Arc<dyn Fn(&EventFrame) + Send + Sync>;

/// Identifies a registered handler for [`SubscriptionManager::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type HandlerTable = RwLock<HashMap<String, Vec<(HandlerId, EventHandler)>>>;
type PendingJoins = Mutex<HashMap<String, oneshot::Sender<bool>>>;

struct ActiveLink {
    outgoing: mpsc::Sender<ClientMessage>,
    reader: JoinHandle<()>,
}

/// State shared with the reader task.
struct Shared {
    handlers: HandlerTable,
    pending: PendingJoins,
    status: watch::Sender<ConnectionStatus>,
    /// Bumped per link so a stale reader can't flip a newer link's status.
    generation: AtomicU64,
}

impl Shared {
    fn pending(&self) -> MutexGuard<'_, HashMap<String, oneshot::Sender<bool>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, frame: &EventFrame) {
        let handlers: Vec<EventHandler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&frame.event)
            .map(|hs| hs.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        for handler in handlers {
            handler(frame);
        }
    }

    fn handle(&self, msg: ServerMessage) {
        match msg {
            ServerMessage::Event(frame) => self.emit(&frame),
            ServerMessage::JoinAck(ack) => {
                if let Some(waiter) = self.pending().remove(&ack.request_id) {
                    let _ = waiter.send(ack.success);
                }
            }
            ServerMessage::EventsDropped(notice) => {
                tracing::warn!(skipped = notice.skipped, "Gateway dropped events for this client");
                self.emit(&EventFrame {
                    event: EVENTS_DROPPED.to_string(),
                    room: String::new(),
                    payload: json!({ "skipped": notice.skipped }),
                    occurred_at: Timestamp::now().to_rfc3339(),
                });
            }
            ServerMessage::Error(e) => {
                tracing::warn!(code = %e.code, "Gateway reported error: {}", e.message);
            }
            ServerMessage::Pong(_) | ServerMessage::Connected(_) => {}
        }
    }
}

/// Client-side subscription manager.
pub struct SubscriptionManager {
    connector: Arc<dyn Connector>,
    join_timeout: Duration,
    shared: Arc<Shared>,
    link: tokio::sync::Mutex<Option<ActiveLink>>,
    token: Mutex<Option<String>>,
    next_handler: AtomicU64,
    next_request: AtomicU64,
}

impl SubscriptionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            connector,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            shared: Arc::new(Shared {
                handlers: RwLock::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
                status,
                generation: AtomicU64::new(0),
            }),
            link: tokio::sync::Mutex::new(None),
            token: Mutex::new(None),
            next_handler: AtomicU64::new(1),
            next_request: AtomicU64::new(1),
        }
    }

    /// Manager whose join timeout comes from the `realtime` config section.
    pub fn from_config(connector: Arc<dyn Connector>, config: &RealtimeConfig) -> Self {
        Self::new(connector).with_join_timeout(config.join_timeout())
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Subscribe to status changes.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    pub fn current_status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    /// Open a connection, replacing any existing one.
    ///
    /// Resolves once the gateway has sent `connected`.
    pub async fn connect(&self, token: &str) -> Result<ConnectedMessage, ClientError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());

        let mut slot = self.link.lock().await;
        self.close_link(slot.take());
        self.shared.status.send_replace(ConnectionStatus::Connecting);

        let mut link = match self.connector.connect(token).await {
            Ok(link) => link,
            Err(e) => {
                self.shared.status.send_replace(ConnectionStatus::Disconnected);
                return Err(e);
            }
        };

        let connected = match tokio::time::timeout(self.join_timeout, link.incoming.recv()).await {
            Ok(Some(ServerMessage::Connected(msg))) => msg,
            Ok(Some(other)) => {
                self.shared.status.send_replace(ConnectionStatus::Disconnected);
                return Err(ClientError::Handshake(format!("unexpected frame {:?}", other)));
            }
            Ok(None) => {
                self.shared.status.send_replace(ConnectionStatus::Disconnected);
                return Err(ClientError::Disconnected);
            }
            Err(_) => {
                self.shared.status.send_replace(ConnectionStatus::Disconnected);
                return Err(ClientError::Handshake("no connected frame".into()));
            }
        };

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        // Set before the reader starts so its `Disconnected` is always the last write.
        self.shared.status.send_replace(ConnectionStatus::Connected);
        let shared = self.shared.clone();
        let mut incoming = link.incoming;
        let reader = tokio::spawn(async move {
            while let Some(msg) = incoming.recv().await {
                shared.handle(msg);
            }
            if shared.generation.load(Ordering::SeqCst) == generation {
                shared.pending().clear();
                shared.status.send_replace(ConnectionStatus::Disconnected);
                tracing::debug!("Realtime link closed");
            }
        });

        *slot = Some(ActiveLink {
            outgoing: link.outgoing,
            reader,
        });
        tracing::debug!(
            connection_id = %connected.connection_id,
            rooms = connected.rooms.len(),
            "Realtime link established"
        );

        Ok(connected)
    }

    /// Join the room of `project_id`.
    ///
    /// Resolves with the gateway's answer. Never optimistic.
    pub async fn join_project_room(&self, project_id: &ProjectId) -> Result<bool, ClientError> {
        let outgoing = self
            .link
            .lock()
            .await
            .as_ref()
            .map(|l| l.outgoing.clone())
            .ok_or(ClientError::NotConnected)?;

        let request_id = format!("join-{}", self.next_request.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = oneshot::channel();
        self.shared.pending().insert(request_id.clone(), tx);

        let request = ClientMessage::JoinRoom {
            request_id: request_id.clone(),
            project_id: project_id.to_string(),
        };
        if outgoing.send(request).await.is_err() {
            self.shared.pending().remove(&request_id);
            return Err(ClientError::Disconnected);
        }

        match tokio::time::timeout(self.join_timeout, rx).await {
            Ok(Ok(success)) => Ok(success),
            Ok(Err(_)) => Err(ClientError::Disconnected),
            Err(_) => {
                self.shared.pending().remove(&request_id);
                Err(ClientError::JoinTimeout {
                    project_id: project_id.to_string(),
                })
            }
        }
    }

    /// Register `handler` for events named `event` (e.g. `task.created`).
    pub fn on<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&EventFrame) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_handler.fetch_add(1, Ordering::SeqCst));
        self.shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.into())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn off(&self, id: HandlerId) -> bool {
        let mut handlers = self
            .shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut removed = false;
        for list in handlers.values_mut() {
            let before = list.len();
            list.retain(|(hid, _)| *hid != id);
            removed |= list.len() != before;
        }
        handlers.retain(|_, list| !list.is_empty());
        removed
    }

    /// Drop the current connection and open a new one with the last token.
    ///
    /// Project rooms joined on the old connection are not rejoined.
    pub async fn reconnect(&self) -> Result<ConnectedMessage, ClientError> {
        let token = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ClientError::NotConnected)?;
        self.connect(&token).await
    }

    /// Close the connection.
    pub async fn disconnect(&self) {
        let link = self.link.lock().await.take();
        self.close_link(link);
        self.shared.status.send_replace(ConnectionStatus::Disconnected);
    }

    fn close_link(&self, link: Option<ActiveLink>) {
        if let Some(link) = link {
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
            self.shared.pending().clear();
            // Dropping the sender closes the transport.
            drop(link.outgoing);
            link.reader.abort();
        }
    }
}
