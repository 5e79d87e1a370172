//! Streaming market-data client for the Deriv/Binary WebSocket API.
//!
//! Connects to the quotes service, fetches the instrument catalog, subscribes
//! to candle or tick streams and pricing proposals, and folds everything into
//! an observable [`store::MarketState`]. Candles are aggregated incrementally
//! into chart-ready bars by the [`aggregator`].

pub mod aggregator;
pub mod chart;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tls;
pub mod websocket;

pub use error::{Result, TickwireError};
pub use store::{MarketState, MarketStore, StoreOptions};
