//! Shared models for the quotes service wire protocol.
//!
//! Contains the message-type discriminator, the typed [`Response`] every
//! incoming frame is validated into, and common protocol messages (errors,
//! subscription ids, `forget`).

pub mod active_symbols;
pub mod bar;
pub mod candle;
pub mod proposal;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::TickwireError;

pub use active_symbols::{ActiveSymbolsRequest, ActiveSymbolsResponse, Symbol};
pub use bar::Bar;
pub use candle::{
    CandleData, CandlesResponse, Granularity, HistoryResponse, OhlcData, OhlcResponse, TickData,
    TickResponse, TicksHistoryRequest,
};
pub use proposal::{Basis, ContractSettings, ProposalData, ProposalRequest, ProposalResponse};

/// Response message types a handler can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    ActiveSymbols,
    /// Bulk historical candles.
    Candles,
    /// Live OHLC update for a candle subscription.
    Ohlc,
    /// Bulk historical ticks (`style: "ticks"`).
    History,
    /// Live raw tick.
    Tick,
    Proposal,
    Forget,
}

impl MessageType {
    /// Returns the wire-format `msg_type` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::ActiveSymbols => "active_symbols",
            MessageType::Candles => "candles",
            MessageType::Ohlc => "ohlc",
            MessageType::History => "history",
            MessageType::Tick => "tick",
            MessageType::Proposal => "proposal",
            MessageType::Forget => "forget",
        }
    }

    /// Parses a wire-format `msg_type`.
    ///
    /// Error responses echo the request name rather than the stream type,
    /// so `ticks_history` is routed to the historical candle slot.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "active_symbols" => Some(MessageType::ActiveSymbols),
            "candles" | "ticks_history" => Some(MessageType::Candles),
            "ohlc" => Some(MessageType::Ohlc),
            "history" => Some(MessageType::History),
            "tick" => Some(MessageType::Tick),
            "proposal" => Some(MessageType::Proposal),
            "forget" => Some(MessageType::Forget),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Server-side stream id attached to subscription responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionInfo {
    pub id: String,
}

/// A `forget` request cancelling one server-side stream.
#[derive(Debug, Serialize)]
pub struct ForgetRequest {
    pub forget: String,
}

impl ForgetRequest {
    /// Creates a request forgetting the stream with the given id.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            forget: id.to_string(),
        }
    }
}

/// A `forget_all` request cancelling every stream of the given types.
///
/// Used when a stream was requested but its id has not arrived yet.
#[derive(Debug, Serialize)]
pub struct ForgetAllRequest {
    pub forget_all: Vec<&'static str>,
}

impl ForgetAllRequest {
    #[must_use]
    pub fn new(stream_types: &[&'static str]) -> Self {
        Self {
            forget_all: stream_types.to_vec(),
        }
    }
}

/// Server acknowledgement of a [`ForgetRequest`].
#[derive(Debug, Deserialize)]
pub struct ForgetResponse {
    /// `1` when the stream existed and was cancelled.
    pub forget: u8,
}

/// A validated incoming frame, discriminated by `msg_type`.
#[derive(Debug)]
pub enum Response {
    ActiveSymbols(ActiveSymbolsResponse),
    Candles(CandlesResponse),
    Ohlc(OhlcResponse),
    History(HistoryResponse),
    Tick(TickResponse),
    Proposal(ProposalResponse),
    Forget(ForgetResponse),
    /// An error-carrying response. `msg_type` is absent when the server
    /// could not attribute the failure to a request.
    Error {
        msg_type: Option<String>,
        error: ApiError,
    },
    /// A well-formed frame whose `msg_type` no handler understands.
    Unknown(String),
}

impl Response {
    /// Validates a raw text frame into a typed response.
    ///
    /// # Errors
    ///
    /// Returns [`TickwireError::MalformedMessage`] if the frame is not JSON or
    /// carries neither `error` nor `msg_type`, and [`TickwireError::Json`] if
    /// the payload does not match the shape announced by `msg_type`.
    pub fn parse(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| TickwireError::MalformedMessage(e.to_string()))?;
        Self::from_value(value)
    }

    /// Validates an already-parsed JSON value into a typed response.
    ///
    /// # Errors
    ///
    /// See [`Response::parse`].
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let msg_type = value
            .get("msg_type")
            .and_then(|m| m.as_str())
            .map(String::from);

        if let Some(error) = value.get("error") {
            let error: ApiError = serde_json::from_value(error.clone())?;
            return Ok(Response::Error { msg_type, error });
        }

        let Some(msg_type) = msg_type else {
            return Err(TickwireError::MalformedMessage(
                "frame has neither `error` nor `msg_type`".to_string(),
            ));
        };

        let response = match MessageType::from_wire(&msg_type) {
            Some(MessageType::ActiveSymbols) => {
                Response::ActiveSymbols(serde_json::from_value(value)?)
            }
            Some(MessageType::Candles) => Response::Candles(serde_json::from_value(value)?),
            Some(MessageType::Ohlc) => Response::Ohlc(serde_json::from_value(value)?),
            Some(MessageType::History) => Response::History(serde_json::from_value(value)?),
            Some(MessageType::Tick) => Response::Tick(serde_json::from_value(value)?),
            Some(MessageType::Proposal) => Response::Proposal(serde_json::from_value(value)?),
            Some(MessageType::Forget) => Response::Forget(serde_json::from_value(value)?),
            None => Response::Unknown(msg_type),
        };

        Ok(response)
    }

    /// The handler slot this response is addressed to, if any.
    pub fn message_type(&self) -> Option<MessageType> {
        match self {
            Response::ActiveSymbols(_) => Some(MessageType::ActiveSymbols),
            Response::Candles(_) => Some(MessageType::Candles),
            Response::Ohlc(_) => Some(MessageType::Ohlc),
            Response::History(_) => Some(MessageType::History),
            Response::Tick(_) => Some(MessageType::Tick),
            Response::Proposal(_) => Some(MessageType::Proposal),
            Response::Forget(_) => Some(MessageType::Forget),
            Response::Error { msg_type, .. } => {
                msg_type.as_deref().and_then(MessageType::from_wire)
            }
            Response::Unknown(_) => None,
        }
    }
}
