//! Application configuration loaded from environment variables.
//!
//! - `DERIV_APP_ID` - application id appended to the endpoint (default `1089`)
//! - `DERIV_WEBSOCKET_URL` - overrides the default public endpoint
//! - `DERIV_PROPOSAL_LIMIT` - how many proposals to retain; an integer or
//!   `unbounded` (default `20`)

use crate::store::ProposalRetention;

/// Default public WebSocket endpoint, without the `app_id` query.
const DEFAULT_WEBSOCKET_URL: &str = "wss://ws.binaryws.com/websockets/v3";

/// Public demo application id.
const DEFAULT_APP_ID: u32 = 1089;

/// Proposals kept when no limit is configured.
pub const DEFAULT_PROPOSAL_LIMIT: usize = 20;

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub deriv: DerivConfig,
    pub proposal_retention: ProposalRetention,
}

/// Connection settings for the quotes service.
#[derive(Debug)]
pub struct DerivConfig {
    pub websocket_url: String,
    pub app_id: u32,
}

impl DerivConfig {
    /// Full endpoint including the `app_id` query parameter.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}?app_id={}", self.websocket_url, self.app_id)
    }
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`TickwireError::Config`](crate::TickwireError::Config) if
/// `DERIV_APP_ID` or `DERIV_PROPOSAL_LIMIT` cannot be parsed.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let websocket_url = non_empty_var("DERIV_WEBSOCKET_URL")
        .unwrap_or_else(|| DEFAULT_WEBSOCKET_URL.to_string());

    let app_id = match non_empty_var("DERIV_APP_ID") {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            crate::TickwireError::Config(format!("DERIV_APP_ID must be a number, got `{raw}`"))
        })?,
        None => DEFAULT_APP_ID,
    };

    let proposal_retention = match non_empty_var("DERIV_PROPOSAL_LIMIT") {
        Some(raw) => parse_retention(&raw)?,
        None => ProposalRetention::Bounded(DEFAULT_PROPOSAL_LIMIT),
    };

    Ok(AppConfig {
        deriv: DerivConfig {
            websocket_url,
            app_id,
        },
        proposal_retention,
    })
}

fn parse_retention(raw: &str) -> crate::Result<ProposalRetention> {
    if raw.eq_ignore_ascii_case("unbounded") {
        return Ok(ProposalRetention::Unbounded);
    }

    match raw.parse::<usize>() {
        Ok(0) | Err(_) => Err(crate::TickwireError::Config(format!(
            "DERIV_PROPOSAL_LIMIT must be a positive number or `unbounded`, got `{raw}`"
        ))),
        Ok(limit) => Ok(ProposalRetention::Bounded(limit)),
    }
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
