//! Pricing proposal models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SubscriptionInfo;

/// How the proposal `amount` is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    #[default]
    Stake,
    Payout,
}

/// Contract parameters shared by every proposal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSettings {
    pub amount: Decimal,
    pub basis: Basis,
    pub contract_type: String,
    pub currency: String,
    pub duration: u32,
    /// `t` ticks, `s` seconds, `m` minutes, `h` hours, `d` days.
    pub duration_unit: String,
}

impl Default for ContractSettings {
    fn default() -> Self {
        Self {
            amount: Decimal::ONE_HUNDRED,
            basis: Basis::Stake,
            contract_type: "CALL".to_string(),
            currency: "USD".to_string(),
            duration: 5,
            duration_unit: "t".to_string(),
        }
    }
}

/// A subscribing `proposal` request.
#[derive(Debug, Serialize)]
pub struct ProposalRequest {
    pub proposal: u8,
    pub subscribe: u8,
    /// The API rejects string amounts.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub basis: Basis,
    pub contract_type: String,
    pub currency: String,
    pub duration: u32,
    pub duration_unit: String,
    pub symbol: String,
}

impl ProposalRequest {
    /// Creates a subscribing proposal request for `symbol`.
    #[must_use]
    pub fn new(symbol: &str, settings: &ContractSettings) -> Self {
        Self {
            proposal: 1,
            subscribe: 1,
            amount: settings.amount,
            basis: settings.basis,
            contract_type: settings.contract_type.clone(),
            currency: settings.currency.clone(),
            duration: settings.duration,
            duration_unit: settings.duration_unit.clone(),
            symbol: symbol.to_string(),
        }
    }
}

/// Streamed proposal update (`msg_type: "proposal"`).
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalResponse {
    pub proposal: ProposalData,
    #[serde(default)]
    pub subscription: Option<SubscriptionInfo>,
}

/// A single pricing quote.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProposalData {
    pub id: String,
    pub spot: Decimal,
    #[serde(default)]
    pub spot_time: Option<i64>,
    pub ask_price: Decimal,
    pub payout: Decimal,
    #[serde(default)]
    pub display_value: Option<String>,
    /// Human-readable contract description.
    #[serde(default)]
    pub longcode: Option<String>,
    #[serde(default)]
    pub date_start: Option<i64>,
}
