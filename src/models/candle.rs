//! Tick/candle history and live stream models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SubscriptionInfo;

/// Number of historical points requested per subscription.
pub const HISTORY_COUNT: u32 = 300;

/// Bucket width used for aggregation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// Raw ticks, no bucketing.
    Ticks,
    /// Candles of the given width in seconds.
    Seconds(u32),
}

impl Granularity {
    pub const MINUTE: Granularity = Granularity::Seconds(60);
    pub const HOUR: Granularity = Granularity::Seconds(3600);
    pub const DAY: Granularity = Granularity::Seconds(86_400);

    /// Bucket width in seconds, or `None` for raw ticks.
    pub fn seconds(&self) -> Option<u32> {
        match self {
            Granularity::Ticks => None,
            Granularity::Seconds(s) => Some(*s),
        }
    }

    /// Returns the wire-format `style` value.
    pub fn style(&self) -> &'static str {
        match self {
            Granularity::Ticks => "ticks",
            Granularity::Seconds(_) => "candles",
        }
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Granularity::MINUTE
    }
}

/// A `ticks_history` request, optionally subscribing to live updates.
#[derive(Debug, Clone, Serialize)]
pub struct TicksHistoryRequest {
    pub ticks_history: String,
    pub adjust_start_time: u8,
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<u32>,
    pub end: String,
    pub start: u32,
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<u8>,
}

impl TicksHistoryRequest {
    /// Creates a history request for `symbol` ending at the latest quote.
    #[must_use]
    pub fn new(symbol: &str, granularity: Granularity) -> Self {
        Self {
            ticks_history: symbol.to_string(),
            adjust_start_time: 1,
            count: HISTORY_COUNT,
            granularity: granularity.seconds(),
            end: "latest".to_string(),
            start: HISTORY_COUNT,
            style: granularity.style().to_string(),
            subscribe: None,
        }
    }

    /// Asks the server to keep streaming updates after the history.
    #[must_use]
    pub fn subscribed(mut self) -> Self {
        self.subscribe = Some(1);
        self
    }
}

/// Bulk historical candles (`msg_type: "candles"`).
#[derive(Debug, Clone, Deserialize)]
pub struct CandlesResponse {
    #[serde(default)]
    pub candles: Vec<CandleData>,
    #[serde(default)]
    pub pip_size: Option<u32>,
    #[serde(default)]
    pub subscription: Option<SubscriptionInfo>,
}

/// A single historical candle at the source granularity.
#[derive(Debug, Clone, Deserialize)]
pub struct CandleData {
    pub epoch: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// Live candle update (`msg_type: "ohlc"`).
#[derive(Debug, Clone, Deserialize)]
pub struct OhlcResponse {
    pub ohlc: OhlcData,
    #[serde(default)]
    pub subscription: Option<SubscriptionInfo>,
}

/// The in-progress candle carried by an [`OhlcResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct OhlcData {
    /// Time of the quote that produced this update.
    pub epoch: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub granularity: Option<u32>,
    /// Start of the server-side candle window.
    #[serde(default)]
    pub open_time: Option<i64>,
    #[serde(default)]
    pub pip_size: Option<u32>,
}

/// Bulk historical ticks (`msg_type: "history"`).
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    pub history: TickHistory,
    #[serde(default)]
    pub subscription: Option<SubscriptionInfo>,
}

/// Parallel arrays of quotes and their epochs.
#[derive(Debug, Clone, Deserialize)]
pub struct TickHistory {
    #[serde(default)]
    pub prices: Vec<Decimal>,
    #[serde(default)]
    pub times: Vec<i64>,
}

/// Live raw tick (`msg_type: "tick"`).
#[derive(Debug, Clone, Deserialize)]
pub struct TickResponse {
    pub tick: TickData,
    #[serde(default)]
    pub subscription: Option<SubscriptionInfo>,
}

/// A single quote carried by a [`TickResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct TickData {
    pub epoch: i64,
    pub quote: Decimal,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    #[serde(default)]
    pub bid: Option<Decimal>,
}
