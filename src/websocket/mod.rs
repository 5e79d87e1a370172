//! Async WebSocket transport for the quotes service.
//!
//! This module is organized by concern:
//! - [`connection`] - Single-connection lifecycle and the per-socket task
//! - [`registry`] - Which handler owns each response type

pub mod connection;
pub mod registry;

use futures_util::StreamExt;
use futures_util::stream::{SplitSink, SplitStream};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::info;
use tungstenite::Message;

use crate::Result;

pub use connection::{
    Connection, ConnectionId, ConnectionManager, ConnectionState, Dialer, TransportEvent,
    WebSocketDialer,
};
pub use registry::SubscriptionRegistry;

/// Write half of a WebSocket connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a WebSocket connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`TickwireError`](crate::TickwireError) if the connection or TLS handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!("WebSocket handshake completed");

    Ok(ws_stream.split())
}

/// Serializes a request into a text frame.
///
/// # Errors
///
/// Returns [`TickwireError::Json`](crate::TickwireError::Json) if serialization fails.
pub fn encode<T: Serialize>(request: &T) -> Result<Message> {
    let json = serde_json::to_string(request)?;
    Ok(Message::Text(json.into()))
}
