//! The aggregated bar type exposed to chart consumers.

use rust_decimal::Decimal;
use serde::Serialize;

use super::candle::{CandleData, OhlcData, TickData};

/// One point of the aggregated series.
///
/// A candlestick bar has all of `open`/`high`/`low`/`close` populated; a
/// line-mode point only needs `close`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bar {
    /// Quote time in seconds since the Unix epoch.
    pub epoch: i64,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    /// Raw quote for tick-mode points.
    pub quote: Option<Decimal>,
}

impl Bar {
    /// Creates a complete OHLC bar.
    #[must_use]
    pub fn ohlc(epoch: i64, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Self {
        Self {
            epoch,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            quote: None,
        }
    }

    /// Creates a line-mode point from a raw quote.
    #[must_use]
    pub fn point(epoch: i64, quote: Decimal) -> Self {
        Self {
            epoch,
            open: None,
            high: None,
            low: None,
            close: Some(quote),
            quote: Some(quote),
        }
    }

    /// Whether all four OHLC fields are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.open.is_some() && self.high.is_some() && self.low.is_some() && self.close.is_some()
    }

    /// Folds a later quote of the same bucket into this bar.
    ///
    /// `open` and `epoch` are kept; `high`/`low` widen; `close` takes the
    /// incoming value.
    pub fn absorb(&mut self, incoming: &Bar) {
        self.high = widen(self.high, incoming.high, Decimal::max);
        self.low = widen(self.low, incoming.low, Decimal::min);
        self.close = incoming.close.or(self.close);
        if incoming.quote.is_some() {
            self.quote = incoming.quote;
        }
    }
}

fn widen(
    current: Option<Decimal>,
    incoming: Option<Decimal>,
    pick: fn(Decimal, Decimal) -> Decimal,
) -> Option<Decimal> {
    match (current, incoming) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

impl From<&CandleData> for Bar {
    fn from(candle: &CandleData) -> Self {
        Bar::ohlc(
            candle.epoch,
            candle.open,
            candle.high,
            candle.low,
            candle.close,
        )
    }
}

impl From<&OhlcData> for Bar {
    fn from(ohlc: &OhlcData) -> Self {
        Bar::ohlc(ohlc.epoch, ohlc.open, ohlc.high, ohlc.low, ohlc.close)
    }
}

impl From<&TickData> for Bar {
    fn from(tick: &TickData) -> Self {
        Bar::point(tick.epoch, tick.quote)
    }
}
