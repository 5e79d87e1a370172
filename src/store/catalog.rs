//! One-shot instrument catalog fetch.

use tracing::info;

use super::{Handler, MarketStore};
use crate::Result;
use crate::models::{ActiveSymbolsRequest, ActiveSymbolsResponse, MessageType};
use crate::websocket::Dialer;

impl<D: Dialer> MarketStore<D> {
    /// Requests the brief catalog of active symbols.
    ///
    /// The handler detaches itself on the first `active_symbols` response, so
    /// any extra responses of that type are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TickwireError::AlreadyAttached`](crate::TickwireError::AlreadyAttached)
    /// while an earlier fetch is outstanding, or
    /// [`TickwireError::NotConnected`](crate::TickwireError::NotConnected)
    /// before the connection is ready.
    pub fn fetch_active_symbols(&mut self) -> Result<()> {
        self.registry
            .attach(MessageType::ActiveSymbols, Handler::SymbolCatalog)?;

        if let Err(e) = self.connection.send(&ActiveSymbolsRequest::brief()) {
            self.registry.detach(MessageType::ActiveSymbols);
            return Err(e);
        }
        Ok(())
    }

    pub(super) fn on_active_symbols(&mut self, response: ActiveSymbolsResponse) {
        self.registry.detach(MessageType::ActiveSymbols);

        info!(count = response.active_symbols.len(), "Received active symbols");
        self.update(|state| state.active_symbols = response.active_symbols);
    }
}
