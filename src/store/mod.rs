//! The market-data service object.
//!
//! [`MarketStore`] owns the connection, the handler registry and the
//! observable [`MarketState`]. It is constructed once and driven from a
//! single task: callers invoke operations on `&mut MarketStore`, and
//! [`MarketStore::process_next`] applies one transport event at a time.
//! There is no shared mutation, so nothing here locks.
//!
//! Operations are split by component:
//! - [`catalog`] - one-shot `active_symbols` fetch
//! - [`ticks`] - candle/tick subscription and aggregation
//! - [`proposal`] - pricing proposal stream

mod catalog;
mod proposal;
mod state;
mod ticks;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};

use crate::Result;
use crate::aggregator::BucketStrategy;
use crate::config::AppConfig;
use crate::error::TickwireError;
use crate::models::{ApiError, ForgetAllRequest, ForgetRequest, MessageType, Response};
use crate::websocket::{
    ConnectionId, ConnectionManager, Dialer, SubscriptionRegistry, TransportEvent, WebSocketDialer,
};

pub use proposal::ProposalRetention;
pub use state::{ChartType, ConnectionStatus, MarketState, Settlement, StreamPhase};

/// Which component an attached handler belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handler {
    /// One-shot catalog fetch.
    SymbolCatalog,
    /// One-shot historical candles or ticks.
    TickHistory,
    /// Live candle or tick updates.
    TickStream,
    ProposalStream,
}

/// Tunables fixed at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub proposal_retention: ProposalRetention,
    pub bucket_strategy: BucketStrategy,
}

/// What the server knows about the current tick stream.
#[derive(Clone, Debug, PartialEq, Eq)]
enum TickSubscription {
    /// Subscribe sent, stream id not yet returned. Carries the wire style.
    Requested(&'static str),
    Live(String),
}

/// Streaming client state plus the connection it is fed from.
pub struct MarketStore<D = WebSocketDialer> {
    connection: ConnectionManager<D>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    registry: SubscriptionRegistry<Handler>,
    state: watch::Sender<MarketState>,
    options: StoreOptions,
    /// A tick subscribe is waiting for the connection to open.
    pending_ticks: bool,
    tick_subscription: Option<TickSubscription>,
    proposal_subscription: Option<String>,
}

impl MarketStore<WebSocketDialer> {
    /// Creates a store for the configured endpoint. Does not connect.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let options = StoreOptions {
            proposal_retention: config.proposal_retention,
            ..StoreOptions::default()
        };
        Self::new(config.deriv.endpoint(), WebSocketDialer, options)
    }
}

impl<D: Dialer> MarketStore<D> {
    /// Creates a store that dials `endpoint` through `dialer`. Does not connect.
    pub fn new(endpoint: impl Into<String>, dialer: D, options: StoreOptions) -> Self {
        let (connection, events) = ConnectionManager::new(endpoint, dialer);
        let (state, _) = watch::channel(MarketState::default());

        Self {
            connection,
            events,
            registry: SubscriptionRegistry::new(),
            state,
            options,
            pending_ticks: false,
            tick_subscription: None,
            proposal_subscription: None,
        }
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Subscribes to state changes. Dropping the receiver unsubscribes.
    ///
    /// Each notification corresponds to one completed transaction, so a
    /// borrowed snapshot is never half-updated.
    pub fn watch(&self) -> watch::Receiver<MarketState> {
        self.state.subscribe()
    }

    /// Borrows the current state.
    pub fn state(&self) -> watch::Ref<'_, MarketState> {
        self.state.borrow()
    }

    /// The id of the current connection, if one exists.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection.current_id()
    }

    pub fn is_ready(&self) -> bool {
        self.connection.is_ready()
    }

    pub fn is_attached(&self, message_type: MessageType) -> bool {
        self.registry.is_attached(message_type)
    }

    /// Applies `f` as one transaction and notifies observers once.
    pub fn update(&self, f: impl FnOnce(&mut MarketState)) {
        self.state.send_modify(f);
    }

    /// Like [`Self::update`], notifying only when `f` returns `true`.
    fn transact(&self, f: impl FnOnce(&mut MarketState) -> bool) -> bool {
        self.state.send_if_modified(f)
    }

    /// Dials a new connection, replacing and closing any current one.
    ///
    /// Handlers bound to the old connection are detached: their streams die
    /// with it, and a catalog fetch or proposal stream still in flight is
    /// dropped with a warning. Wait for readiness before issuing requests.
    pub fn connect(&mut self) {
        for (message_type, handler) in [
            (MessageType::ActiveSymbols, Handler::SymbolCatalog),
            (MessageType::Proposal, Handler::ProposalStream),
        ] {
            if self.registry.get(message_type) == Some(&handler) {
                warn!(?handler, "Reconnecting drops an in-flight request");
            }
        }
        self.release_handlers();
        self.connection.connect();
        self.update(|state| state.connection = ConnectionStatus::Connecting);
    }

    /// Closes the connection and detaches every handler.
    pub fn disconnect(&mut self) {
        self.teardown();
    }

    /// Processes transport events until the current connection is open.
    ///
    /// # Errors
    ///
    /// Returns [`TickwireError::NotConnected`] if there is no connection or it
    /// closes before opening.
    pub async fn wait_until_ready(&mut self) -> Result<()> {
        while !self.connection.is_ready() {
            if self.connection.current_id().is_none() || !self.process_next().await {
                return Err(TickwireError::NotConnected);
            }
        }
        Ok(())
    }

    /// Waits for and applies the next transport event.
    ///
    /// Returns `false` once no further events can arrive.
    pub async fn process_next(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Applies one transport event.
    pub fn handle_event(&mut self, event: TransportEvent) {
        if !self.connection.observe(&event) {
            return;
        }

        match event {
            TransportEvent::Opened(_) => {
                self.update(|state| state.connection = ConnectionStatus::Open);
                if self.pending_ticks {
                    self.pending_ticks = false;
                    self.issue_tick_subscription();
                }
            }
            TransportEvent::Text(_, text) => self.handle_text(&text),
            TransportEvent::Closed { .. } => self.teardown(),
        }
    }

    /// Validates a frame and dispatches it to the attached handler.
    fn handle_text(&mut self, text: &str) {
        match Response::parse(text) {
            Ok(response) => self.dispatch(response),
            Err(e) => warn!("Dropping unreadable frame: {e}"),
        }
    }

    fn dispatch(&mut self, response: Response) {
        let response = match response {
            Response::Error { msg_type, error } => {
                self.handle_error_response(msg_type.as_deref(), &error);
                return;
            }
            Response::Unknown(msg_type) => {
                debug!(msg_type = %msg_type, "Ignoring unrecognised message type");
                return;
            }
            response => response,
        };

        let Some(message_type) = response.message_type() else {
            return;
        };
        let Some(handler) = self.registry.get(message_type).copied() else {
            debug!(msg_type = message_type.as_str(), "No handler attached");
            return;
        };

        match (handler, response) {
            (Handler::SymbolCatalog, Response::ActiveSymbols(r)) => self.on_active_symbols(r),
            (Handler::TickHistory, Response::Candles(r)) => self.on_candles(r),
            (Handler::TickHistory, Response::History(r)) => self.on_history(r),
            (Handler::TickStream, Response::Ohlc(r)) => self.on_ohlc(r),
            (Handler::TickStream, Response::Tick(r)) => self.on_tick(r),
            (Handler::ProposalStream, Response::Proposal(r)) => self.on_proposal(r),
            (handler, _) => {
                debug!(
                    ?handler,
                    msg_type = message_type.as_str(),
                    "Handler does not consume this message"
                );
            }
        }
    }

    /// Logs a failed response and tears the connection down.
    ///
    /// The failure goes to the handler of the slot named by `msg_type`; an
    /// unattributed failure concerns every attached handler.
    fn handle_error_response(&mut self, msg_type: Option<&str>, api_error: &ApiError) {
        let target = msg_type.and_then(MessageType::from_wire);
        let owner = match target {
            // `ticks_history` owns both the history and the live slots.
            Some(MessageType::Candles) => [
                MessageType::Candles,
                MessageType::History,
                MessageType::Ohlc,
                MessageType::Tick,
            ]
            .into_iter()
            .find(|t| self.registry.is_attached(*t)),
            Some(t) => Some(t).filter(|t| self.registry.is_attached(*t)),
            None => None,
        };

        match owner {
            Some(message_type) => {
                error!(
                    msg_type = message_type.as_str(),
                    code = %api_error.code,
                    "Error: {}",
                    api_error.message
                );
                self.registry.detach(message_type);
            }
            None if target.is_none() && !self.registry.is_empty() => {
                error!(
                    code = %api_error.code,
                    "Error: {}", api_error.message
                );
            }
            None => {
                warn!(
                    msg_type = msg_type,
                    code = %api_error.code,
                    "Error for a request nobody is waiting on: {}",
                    api_error.message
                );
                return;
            }
        }

        self.teardown();
    }

    /// Asks the server to stop the stream `id`. Skipped when the connection
    /// is not ready, since the stream then dies with the socket.
    fn forget(&self, id: &str) {
        if !self.connection.is_ready() {
            return;
        }
        match self.connection.send(&ForgetRequest::new(id)) {
            Ok(()) => debug!(subscription = id, "Forgetting stream"),
            Err(e) => warn!(subscription = id, "Failed to forget stream: {e}"),
        }
    }

    /// Asks the server to stop every stream of the given wire styles.
    fn forget_all(&self, stream_types: &[&'static str]) {
        if !self.connection.is_ready() {
            return;
        }
        match self.connection.send(&ForgetAllRequest::new(stream_types)) {
            Ok(()) => debug!(?stream_types, "Forgetting all streams"),
            Err(e) => warn!(?stream_types, "Failed to forget streams: {e}"),
        }
    }

    /// Detaches every handler and forgets stream bookkeeping.
    fn release_handlers(&mut self) {
        self.registry.clear();
        self.pending_ticks = false;
        self.tick_subscription = None;
        self.proposal_subscription = None;
    }

    /// Disconnects and returns the tick stream to idle, keeping the data
    /// already received.
    fn teardown(&mut self) {
        self.release_handlers();
        self.connection.disconnect();
        self.update(|state| {
            state.connection = ConnectionStatus::Disconnected;
            state.phase = StreamPhase::Idle;
            state.loading = false;
        });
    }
}
