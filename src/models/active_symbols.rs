//! Instrument catalog (`active_symbols`) models.

use serde::{Deserialize, Serialize};

/// Market whose instruments are offered for charting.
pub const CHARTABLE_MARKET: &str = "synthetic_index";

/// Symbol type offered for charting.
pub const CHARTABLE_SYMBOL_TYPE: &str = "stockindex";

/// An `active_symbols` request for the brief list of basic products.
#[derive(Debug, Serialize)]
pub struct ActiveSymbolsRequest {
    pub active_symbols: String,
    pub product_type: String,
}

impl ActiveSymbolsRequest {
    /// Creates the `{active_symbols: "brief", product_type: "basic"}` request.
    #[must_use]
    pub fn brief() -> Self {
        Self {
            active_symbols: "brief".to_string(),
            product_type: "basic".to_string(),
        }
    }
}

/// Response to an [`ActiveSymbolsRequest`].
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveSymbolsResponse {
    pub active_symbols: Vec<Symbol>,
}

/// Descriptor for a single tradable instrument.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Symbol {
    pub symbol: String,
    pub display_name: String,
    pub market: String,
    pub symbol_type: String,
    /// `1` when forward-starting contracts are offered.
    #[serde(default)]
    pub allow_forward_starting: u8,
    #[serde(default)]
    pub market_display_name: Option<String>,
    #[serde(default)]
    pub submarket: Option<String>,
    #[serde(default)]
    pub submarket_display_name: Option<String>,
    /// Minimum price increment.
    #[serde(default)]
    pub pip: Option<f64>,
    #[serde(default)]
    pub exchange_is_open: Option<u8>,
    #[serde(default)]
    pub is_trading_suspended: Option<u8>,
}

impl Symbol {
    /// Whether the instrument belongs in the chart's symbol picker.
    #[must_use]
    pub fn is_chartable(&self) -> bool {
        self.market == CHARTABLE_MARKET
            && self.symbol_type == CHARTABLE_SYMBOL_TYPE
            && self.allow_forward_starting == 1
    }
}
