//! Shared test utilities: an in-memory dialer and message fixtures.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Value, json};
use tickwire::MarketStore;
use tickwire::store::StoreOptions;
use tickwire::websocket::{Connection, ConnectionId, Dialer, TransportEvent};
use tokio::sync::mpsc;
use tungstenite::Message;

/// Deriv public endpoint used by the live API tests.
pub const DERIV_WS_URL: &str = "wss://ws.binaryws.com/websockets/v3?app_id=1089";

/// Dialer that never touches the network.
///
/// Every dialed connection's outbound queue is kept so tests can inspect the
/// frames the store sent. Clones share the same queues.
#[derive(Clone, Default)]
pub struct LoopbackDialer {
    sockets: Rc<RefCell<Vec<mpsc::UnboundedReceiver<Message>>>>,
    auto_open: bool,
}

impl Dialer for LoopbackDialer {
    fn dial(
        &self,
        id: ConnectionId,
        _endpoint: &str,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Connection {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sockets.borrow_mut().push(rx);
        if self.auto_open {
            let _ = events.send(TransportEvent::Opened(id));
        }
        Connection::new(id, tx, None)
    }
}

impl LoopbackDialer {
    /// A dialer whose connections report open through the event channel
    /// as soon as they are dialed.
    pub fn auto_open() -> Self {
        Self {
            auto_open: true,
            ..Self::default()
        }
    }

    /// How many connections have been dialed.
    pub fn dialed(&self) -> usize {
        self.sockets.borrow().len()
    }

    /// Drains every frame queued on the `index`-th connection.
    pub fn frames(&self, index: usize) -> Vec<Message> {
        let mut sockets = self.sockets.borrow_mut();
        let mut frames = Vec::new();
        while let Ok(frame) = sockets[index].try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Drains the JSON requests queued on the `index`-th connection.
    pub fn sent(&self, index: usize) -> Vec<Value> {
        self.frames(index)
            .into_iter()
            .filter_map(|frame| match frame {
                Message::Text(text) => serde_json::from_str(text.as_str()).ok(),
                _ => None,
            })
            .collect()
    }
}

pub type TestStore = MarketStore<LoopbackDialer>;

/// A store wired to a fresh [`LoopbackDialer`].
pub fn test_store(options: StoreOptions) -> (TestStore, LoopbackDialer) {
    store_with(LoopbackDialer::default(), options)
}

pub fn store_with(dialer: LoopbackDialer, options: StoreOptions) -> (TestStore, LoopbackDialer) {
    let store = MarketStore::new("wss://loopback.test", dialer.clone(), options);
    (store, dialer)
}

/// Reports the current connection as open.
pub fn open(store: &mut TestStore) -> ConnectionId {
    let id = store.connection_id().expect("no connection to open");
    store.handle_event(TransportEvent::Opened(id));
    id
}

/// Connects and opens in one step.
pub fn connected(store: &mut TestStore) -> ConnectionId {
    store.connect();
    open(store)
}

/// Delivers `message` as a text frame on the current connection.
pub fn deliver(store: &mut TestStore, message: Value) {
    let id = store.connection_id().expect("no connection to deliver on");
    store.handle_event(TransportEvent::Text(id, message.to_string()));
}

// -- Fixtures --

pub fn candle(epoch: i64, open: f64, high: f64, low: f64, close: f64) -> Value {
    json!({"epoch": epoch, "open": open, "high": high, "low": low, "close": close})
}

pub fn candles_response(candles: Vec<Value>) -> Value {
    json!({
        "msg_type": "candles",
        "echo_req": {"ticks_history": "R_100", "style": "candles"},
        "candles": candles,
        "pip_size": 2,
        "subscription": {"id": "candle-stream-1"}
    })
}

pub fn ohlc_response(epoch: i64, open: &str, high: &str, low: &str, close: &str) -> Value {
    json!({
        "msg_type": "ohlc",
        "ohlc": {
            "epoch": epoch,
            "open": open,
            "high": high,
            "low": low,
            "close": close,
            "symbol": "R_100",
            "granularity": 60,
            "open_time": epoch - epoch.rem_euclid(60),
            "pip_size": 2
        },
        "subscription": {"id": "candle-stream-1"}
    })
}

pub fn proposal_response(id: &str, spot: f64) -> Value {
    json!({
        "msg_type": "proposal",
        "proposal": {
            "id": id,
            "spot": spot,
            "spot_time": 1_700_000_000,
            "ask_price": 100,
            "payout": 195.1,
            "display_value": "100.00",
            "longcode": "Win payout if Volatility 100 Index is strictly higher than entry spot at 5 ticks after contract start time.",
            "date_start": 1_700_000_000
        },
        "subscription": {"id": "proposal-stream-1"}
    })
}

pub fn active_symbols_response() -> Value {
    json!({
        "msg_type": "active_symbols",
        "active_symbols": [
            {
                "symbol": "R_100",
                "display_name": "Volatility 100 Index",
                "market": "synthetic_index",
                "market_display_name": "Derived",
                "submarket": "random_index",
                "submarket_display_name": "Continuous Indices",
                "symbol_type": "stockindex",
                "allow_forward_starting": 1,
                "exchange_is_open": 1,
                "is_trading_suspended": 0,
                "pip": 0.01
            },
            {
                "symbol": "frxEURUSD",
                "display_name": "EUR/USD",
                "market": "forex",
                "symbol_type": "",
                "allow_forward_starting": 1,
                "pip": 0.00001
            }
        ]
    })
}

pub fn error_response(msg_type: Option<&str>, code: &str, message: &str) -> Value {
    let mut value = json!({"error": {"code": code, "message": message}});
    if let Some(msg_type) = msg_type {
        value["msg_type"] = json!(msg_type);
    }
    value
}
