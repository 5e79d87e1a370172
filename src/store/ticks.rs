//! Candle and tick subscriptions for the selected symbol.
//!
//! A subscribe always dials a fresh connection. The `ticks_history` request
//! is sent once that connection opens; its bulk history replaces the bars,
//! and the live updates that follow are merged into them.

use tracing::{debug, error, info};

use super::{ChartType, Handler, MarketState, MarketStore, StreamPhase, TickSubscription};
use crate::aggregator::{LiveMerge, TickAggregator};
use crate::models::{
    Bar, CandlesResponse, Granularity, HistoryResponse, MessageType, OhlcResponse, TickResponse,
    TicksHistoryRequest,
};
use crate::websocket::Dialer;

/// Response slots used by a subscription: (bulk history, live updates).
fn stream_slots(granularity: Granularity) -> (MessageType, MessageType) {
    match granularity {
        Granularity::Ticks => (MessageType::History, MessageType::Tick),
        Granularity::Seconds(_) => (MessageType::Candles, MessageType::Ohlc),
    }
}

impl<D: Dialer> MarketStore<D> {
    fn aggregator(&self) -> TickAggregator {
        TickAggregator::new(self.state().granularity, self.options.bucket_strategy)
    }

    /// Subscribes to the selected symbol at the selected granularity.
    ///
    /// Any running subscription is dropped with its bars, and the current
    /// connection is replaced by a new one. The request itself goes out when
    /// the new connection reports open.
    pub fn subscribe_ticks(&mut self) {
        let (symbol, granularity, was_active) = {
            let state = self.state();
            (state.selected_symbol.clone(), state.granularity, state.phase.is_active())
        };

        self.connect();
        self.pending_ticks = true;

        let phase = if was_active {
            StreamPhase::Resubscribing
        } else {
            StreamPhase::Subscribing
        };
        info!(symbol = %symbol, ?granularity, ?phase, "Subscribing to ticks");

        self.update(|state| {
            state.phase = phase;
            state.loading = true;
            state.bars.clear();
            state.proposals.clear();
        });
    }

    /// Stops the tick stream, clears the bars and closes the connection.
    pub fn unsubscribe_ticks(&mut self) {
        self.teardown();
        self.update(|state| state.bars.clear());
    }

    /// Sends the pending `ticks_history` subscribe on a freshly opened
    /// connection.
    pub(super) fn issue_tick_subscription(&mut self) {
        let (symbol, granularity) = {
            let state = self.state();
            (state.selected_symbol.clone(), state.granularity)
        };
        let (history_slot, live_slot) = stream_slots(granularity);

        let attached = self
            .registry
            .attach(history_slot, Handler::TickHistory)
            .and_then(|()| self.registry.attach(live_slot, Handler::TickStream));
        let sent = attached.and_then(|()| {
            self.connection
                .send(&TicksHistoryRequest::new(&symbol, granularity).subscribed())
        });

        match sent {
            Ok(()) => {
                self.tick_subscription = Some(TickSubscription::Requested(granularity.style()));
            }
            Err(e) => {
                error!(symbol = %symbol, "Tick subscription failed: {e}");
                self.stop_tick_stream();
                self.update(|state| {
                    state.phase = StreamPhase::Idle;
                    state.loading = false;
                });
            }
        }
    }

    pub(super) fn on_candles(&mut self, response: CandlesResponse) {
        let bars = self.aggregator().merge_history(&response.candles);
        self.finish_history(MessageType::Candles, bars, response.subscription.map(|s| s.id));
    }

    pub(super) fn on_history(&mut self, response: HistoryResponse) {
        let bars = TickAggregator::points_from_history(&response.history);
        self.finish_history(MessageType::History, bars, response.subscription.map(|s| s.id));
    }

    /// Installs a bulk history as the bar sequence and enters streaming.
    fn finish_history(&mut self, slot: MessageType, bars: Vec<Bar>, subscription: Option<String>) {
        self.registry.detach(slot);
        if let Some(id) = subscription {
            self.tick_subscription = Some(TickSubscription::Live(id));
        }

        debug!(bars = bars.len(), "Tick history received");
        self.update(|state| {
            if let Some(close) = bars.last().and_then(|bar| bar.close) {
                state.current_spot = close;
            }
            state.bars = bars;
            state.loading = false;
            state.phase = StreamPhase::Streaming;
        });
    }

    pub(super) fn on_ohlc(&mut self, response: OhlcResponse) {
        self.apply_live(Bar::from(&response.ohlc));
    }

    pub(super) fn on_tick(&mut self, response: TickResponse) {
        self.apply_live(Bar::from(&response.tick));
    }

    fn apply_live(&mut self, quote: Bar) {
        let aggregator = self.aggregator();
        self.transact(|state| {
            let close = quote.close;
            if aggregator.merge_live(&mut state.bars, quote) == LiveMerge::Stale {
                return false;
            }
            if let Some(close) = close {
                state.current_spot = close;
            }
            true
        });
    }

    /// Detaches the tick handlers and asks the server to end the stream.
    /// Before the stream id is known, every stream of its style is forgotten.
    fn stop_tick_stream(&mut self) {
        for slot in [
            MessageType::Candles,
            MessageType::Ohlc,
            MessageType::History,
            MessageType::Tick,
        ] {
            self.registry.detach(slot);
        }
        self.pending_ticks = false;
        match self.tick_subscription.take() {
            Some(TickSubscription::Live(id)) => self.forget(&id),
            Some(TickSubscription::Requested(style)) => self.forget_all(&[style]),
            None => {}
        }
    }

    /// Applies a selection change as one transaction: the bars of the old
    /// pairing are cleared and any active stream returns to idle. The
    /// connection stays open for the next subscribe.
    fn change_selection(&mut self, apply: impl FnOnce(&mut MarketState)) {
        if self.state().phase.is_active() {
            self.stop_tick_stream();
        }
        self.update(|state| {
            apply(state);
            state.phase = StreamPhase::Idle;
            state.loading = false;
            state.bars.clear();
        });
    }

    // -- Selection --

    pub fn set_selected_symbol(&mut self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        if self.state().selected_symbol == symbol {
            return;
        }
        self.change_selection(|state| state.selected_symbol = symbol);
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        if self.state().granularity == granularity {
            return;
        }
        self.change_selection(|state| state.granularity = granularity);
    }

    /// Switches between one-minute and one-hour bars.
    pub fn toggle_granularity(&mut self) {
        let next = if self.state().is_hourly() {
            Granularity::MINUTE
        } else {
            Granularity::HOUR
        };
        self.set_granularity(next);
    }

    /// Switches to raw ticks drawn as a line, or back to one-minute candles.
    pub fn set_tick_mode(&mut self, enabled: bool) {
        let (granularity, chart_type) = if enabled {
            (Granularity::Ticks, ChartType::Line)
        } else {
            (Granularity::MINUTE, ChartType::Candlestick)
        };
        self.set_granularity(granularity);
        self.set_chart_type(chart_type);
    }

    pub fn set_chart_type(&self, chart_type: ChartType) {
        self.transact(|state| {
            let changed = state.chart_type != chart_type;
            state.chart_type = chart_type;
            changed
        });
    }
}
