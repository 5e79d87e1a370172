//! Observable market state.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use crate::chart::{self, CHART_WINDOW, ChartSeries};
use crate::models::{Bar, ContractSettings, Granularity, ProposalData, Symbol};

/// Chart display type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChartType {
    #[default]
    Candlestick,
    Line,
}

impl ChartType {
    /// Toggles between chart types.
    pub fn toggle(&mut self) {
        *self = match self {
            ChartType::Candlestick => ChartType::Line,
            ChartType::Line => ChartType::Candlestick,
        };
    }
}

/// Lifecycle of the (symbol, granularity) tick subscription.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamPhase {
    #[default]
    Idle,
    /// A first subscribe is waiting for its history.
    Subscribing,
    /// Live updates are being merged into the bars.
    Streaming,
    /// A replacement subscribe is waiting for its history.
    Resubscribing,
}

impl StreamPhase {
    /// Whether a subscribe has been issued and not yet torn down.
    pub fn is_active(&self) -> bool {
        !matches!(self, StreamPhase::Idle)
    }
}

/// Transport status as seen by observers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Open,
}

impl ConnectionStatus {
    /// Returns a display string for the status.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Offline",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Open => "Online",
        }
    }
}

/// Outcome flags and running totals of settled contracts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settlement {
    pub is_duration_ended: bool,
    pub sell_successful: bool,
    pub sell_failed: bool,
    pub additional_amount: Decimal,
    pub deducted_amount: Decimal,
    pub total_amount_won: Decimal,
    pub total_amount_lost: Decimal,
}

/// Everything observers can see. Published as a whole after each transaction.
#[derive(Clone, Debug, Default)]
pub struct MarketState {
    // -- Selection --
    pub selected_symbol: String,
    pub granularity: Granularity,
    pub chart_type: ChartType,

    // -- Streams --
    pub phase: StreamPhase,
    /// `true` from a subscribe request until its history arrives.
    pub loading: bool,
    pub connection: ConnectionStatus,
    /// Aggregated bars, ordered by epoch.
    pub bars: Vec<Bar>,
    /// Proposals in arrival order, oldest first.
    pub proposals: VecDeque<ProposalData>,
    pub active_symbols: Vec<Symbol>,

    // -- Pricing --
    pub previous_spot: Decimal,
    pub current_spot: Decimal,
    pub contract: ContractSettings,
    pub settlement: Settlement,
}

impl MarketState {
    /// Catalog entries offered in the chart's symbol picker.
    pub fn chartable_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.active_symbols.iter().filter(|s| s.is_chartable())
    }

    pub fn is_hourly(&self) -> bool {
        self.granularity == Granularity::HOUR
    }

    /// The most recent bars shaped for the current chart type.
    pub fn chart_series(&self) -> ChartSeries {
        chart::series(&self.bars, self.chart_type, CHART_WINDOW)
    }
}
