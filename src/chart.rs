//! Projection of the bar sequence into chart-ready points.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Bar;
use crate::store::ChartType;

/// Number of trailing bars a chart shows.
pub const CHART_WINDOW: usize = 1000;

/// One candlestick, timestamped in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandlePoint {
    pub x: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// One line point, timestamped in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinePoint {
    pub x: i64,
    pub y: Decimal,
}

/// Chart data for the selected chart type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ChartSeries {
    Candlestick(Vec<CandlePoint>),
    Line(Vec<LinePoint>),
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        match self {
            ChartSeries::Candlestick(points) => points.len(),
            ChartSeries::Line(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shapes the last `window` bars for `chart_type`.
///
/// Candlestick charts skip bars that lack any OHLC field; line charts skip
/// bars without a close.
pub fn series(bars: &[Bar], chart_type: ChartType, window: usize) -> ChartSeries {
    let tail = &bars[bars.len().saturating_sub(window)..];

    match chart_type {
        ChartType::Candlestick => ChartSeries::Candlestick(
            tail.iter()
                .filter_map(|bar| {
                    Some(CandlePoint {
                        x: bar.epoch.saturating_mul(1000),
                        open: bar.open?,
                        high: bar.high?,
                        low: bar.low?,
                        close: bar.close?,
                    })
                })
                .collect(),
        ),
        ChartType::Line => ChartSeries::Line(
            tail.iter()
                .filter_map(|bar| {
                    Some(LinePoint {
                        x: bar.epoch.saturating_mul(1000),
                        y: bar.close?,
                    })
                })
                .collect(),
        ),
    }
}
