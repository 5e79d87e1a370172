//! WebSocket connection lifecycle management.
//!
//! [`ConnectionManager`] owns at most one [`Connection`]. Every connection
//! gets a fresh [`ConnectionId`]; the socket task reports back through
//! [`TransportEvent`]s tagged with that id, so events from a connection that
//! has since been replaced can be recognised and dropped.

use std::fmt;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tungstenite::Message;

use super::{connect, encode};
use crate::Result;
use crate::error::TickwireError;

/// Identifies one dialed connection for the lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Notifications from a connection's socket task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The handshake completed; requests may now be sent.
    Opened(ConnectionId),
    /// A text frame arrived.
    Text(ConnectionId, String),
    /// The socket is gone. `reason` is `None` for a local, orderly close.
    Closed {
        id: ConnectionId,
        reason: Option<String>,
    },
}

impl TransportEvent {
    /// The connection this event came from.
    pub fn connection_id(&self) -> ConnectionId {
        match self {
            TransportEvent::Opened(id) | TransportEvent::Text(id, _) => *id,
            TransportEvent::Closed { id, .. } => *id,
        }
    }
}

/// Readiness of a [`Connection`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
}

/// Exclusive handle to one socket.
///
/// Outbound frames are queued to the socket task; dropping the handle closes
/// the queue, which makes the task close the socket.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    state: ConnectionState,
    outbound: mpsc::UnboundedSender<Message>,
    task: Option<JoinHandle<()>>,
}

impl Connection {
    /// Wraps an outbound queue and the task draining it.
    #[must_use]
    pub fn new(
        id: ConnectionId,
        outbound: mpsc::UnboundedSender<Message>,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            id,
            state: ConnectionState::Connecting,
            outbound,
            task,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    fn send(&self, frame: Message) -> Result<()> {
        if !self.is_open() {
            return Err(TickwireError::NotConnected);
        }
        self.outbound
            .send(frame)
            .map_err(|_| TickwireError::NotConnected)
    }

    /// Closes the socket: a close frame once open, an abort while the
    /// handshake is still running.
    fn close(mut self) {
        match self.state {
            ConnectionState::Open => {
                let _ = self.outbound.send(Message::Close(None));
            }
            ConnectionState::Connecting => {
                if let Some(task) = self.task.take() {
                    task.abort();
                }
            }
        }
        debug!(connection = %self.id, "Connection closed");
    }
}

/// Opens the socket behind a [`Connection`].
pub trait Dialer {
    /// Starts connecting to `endpoint`, reporting progress on `events`.
    ///
    /// Must return immediately; readiness is announced later with
    /// [`TransportEvent::Opened`].
    fn dial(
        &self,
        id: ConnectionId,
        endpoint: &str,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Connection;
}

/// Production [`Dialer`] backed by `tokio-tungstenite`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSocketDialer;

impl Dialer for WebSocketDialer {
    fn dial(
        &self,
        id: ConnectionId,
        endpoint: &str,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Connection {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_socket(id, endpoint.to_string(), outbound_rx, events));
        Connection::new(id, outbound_tx, Some(task))
    }
}

/// Drives one socket until either side closes it.
async fn run_socket(
    id: ConnectionId,
    endpoint: String,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    info!(connection = %id, url = %endpoint, "Connecting to WebSocket");
    let (mut write, mut read) = match connect(&endpoint).await {
        Ok(pair) => pair,
        Err(e) => {
            error!(connection = %id, "Connection failed: {e}");
            let _ = events.send(TransportEvent::Closed {
                id,
                reason: Some(e.to_string()),
            });
            return;
        }
    };

    if events.send(TransportEvent::Opened(id)).is_err() {
        return;
    }

    let reason = loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(Message::Close(frame)) => {
                    let _ = write.send(Message::Close(frame)).await;
                    break None;
                }
                Some(frame) => {
                    if let Err(e) = write.send(frame).await {
                        warn!(connection = %id, "WebSocket send failed: {e}");
                        break Some(e.to_string());
                    }
                }
                None => {
                    let _ = write.close().await;
                    break None;
                }
            },

            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if events.send(TransportEvent::Text(id, text.as_str().to_owned())).is_err() {
                        break None;
                    }
                }
                Some(Ok(Message::Close(_))) => break Some("closed by server".to_string()),
                Some(Ok(_)) => {} // Binary/Ping/Pong frames
                Some(Err(e)) => {
                    warn!(connection = %id, "WebSocket error: {e}");
                    break Some(e.to_string());
                }
                None => break Some("stream ended".to_string()),
            },
        }
    };

    let _ = events.send(TransportEvent::Closed { id, reason });
}

/// Owns the single live connection to the quotes service.
pub struct ConnectionManager<D = WebSocketDialer> {
    endpoint: String,
    dialer: D,
    events: mpsc::UnboundedSender<TransportEvent>,
    current: Option<Connection>,
    next_id: u64,
}

impl<D: Dialer> ConnectionManager<D> {
    /// Creates a manager and the receiver its connections report to.
    pub fn new(
        endpoint: impl Into<String>,
        dialer: D,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let manager = Self {
            endpoint: endpoint.into(),
            dialer,
            events: events_tx,
            current: None,
            next_id: 1,
        };
        (manager, events_rx)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Dials a new connection, closing the current one first.
    ///
    /// The new connection is not usable until its
    /// [`TransportEvent::Opened`] has been passed to [`Self::observe`].
    pub fn connect(&mut self) {
        self.disconnect();

        let id = ConnectionId(self.next_id);
        self.next_id += 1;

        info!(connection = %id, "Dialing");
        self.current = Some(self.dialer.dial(id, &self.endpoint, self.events.clone()));
    }

    /// Closes and releases the current connection, if any.
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.current.take() {
            connection.close();
        }
    }

    pub fn current_id(&self) -> Option<ConnectionId> {
        self.current.as_ref().map(Connection::id)
    }

    /// Whether a connection exists and has completed its handshake.
    pub fn is_ready(&self) -> bool {
        self.current.as_ref().is_some_and(Connection::is_open)
    }

    /// Queues a request on the current connection.
    ///
    /// # Errors
    ///
    /// Returns [`TickwireError::NotConnected`] if there is no open connection,
    /// or [`TickwireError::Json`] if the request cannot be serialized.
    pub fn send<T: Serialize>(&self, request: &T) -> Result<()> {
        let connection = self.current.as_ref().ok_or(TickwireError::NotConnected)?;
        connection.send(encode(request)?)
    }

    /// Applies a lifecycle event to the current connection.
    ///
    /// Returns `false` when the event belongs to a connection that is no
    /// longer current and must be ignored.
    pub fn observe(&mut self, event: &TransportEvent) -> bool {
        let id = event.connection_id();
        if self.current_id() != Some(id) {
            debug!(connection = %id, "Ignoring event from stale connection");
            return false;
        }

        match event {
            TransportEvent::Opened(_) => {
                if let Some(connection) = self.current.as_mut() {
                    connection.state = ConnectionState::Open;
                }
                info!(connection = %id, "Connection open");
            }
            TransportEvent::Closed { reason, .. } => {
                self.current = None;
                match reason {
                    Some(reason) => warn!(connection = %id, reason = %reason, "Connection lost"),
                    None => info!(connection = %id, "Connection closed"),
                }
            }
            TransportEvent::Text(..) => {}
        }

        true
    }
}
