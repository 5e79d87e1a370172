use tickwire::config::fetch_config;
use tickwire::tls::install_crypto_provider;
use tickwire::{MarketStore, TickwireError};
use tracing::{info, warn};

const SYMBOL: &str = "R_100";

#[tokio::main]
async fn main() -> Result<(), TickwireError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();
    install_crypto_provider();

    let app_config = fetch_config()?;
    let mut store = MarketStore::from_config(&app_config);
    let mut changes = store.watch();

    store.set_selected_symbol(SYMBOL);
    store.subscribe_ticks();
    store.wait_until_ready().await?;

    if let Err(e) = store.fetch_active_symbols() {
        warn!("Catalog request rejected: {e}");
    }
    if let Err(e) = store.request_proposal(SYMBOL) {
        warn!("Proposal request rejected: {e}");
    }

    while store.process_next().await {
        if !changes.has_changed().unwrap_or(false) {
            continue;
        }

        let state = changes.borrow_and_update();
        info!(
            connection = state.connection.label(),
            phase = ?state.phase,
            bars = state.bars.len(),
            proposals = state.proposals.len(),
            symbols = state.active_symbols.len(),
            spot = %state.current_spot,
            "State updated"
        );

        if !state.phase.is_active() {
            break;
        }
    }

    Ok(())
}
