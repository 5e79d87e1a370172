//! Pricing proposal stream and contract settings.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{Handler, MarketStore, Settlement};
use crate::Result;
use crate::config::DEFAULT_PROPOSAL_LIMIT;
use crate::models::{Basis, MessageType, ProposalData, ProposalRequest, ProposalResponse};
use crate::websocket::Dialer;

/// How many proposals the state keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalRetention {
    /// Keep the newest `n`, evicting the oldest.
    Bounded(usize),
    /// Keep every proposal for the life of the stream. Memory grows without
    /// limit.
    Unbounded,
}

impl Default for ProposalRetention {
    fn default() -> Self {
        ProposalRetention::Bounded(DEFAULT_PROPOSAL_LIMIT)
    }
}

impl ProposalRetention {
    /// Appends `proposal`, evicting from the front past the bound.
    pub fn push(&self, proposals: &mut VecDeque<ProposalData>, proposal: ProposalData) {
        proposals.push_back(proposal);
        if let ProposalRetention::Bounded(limit) = *self {
            while proposals.len() > limit {
                proposals.pop_front();
            }
        }
    }
}

impl<D: Dialer> MarketStore<D> {
    /// Starts a proposal stream for `symbol` with the current contract
    /// settings, replacing any running one.
    ///
    /// # Errors
    ///
    /// Returns [`TickwireError::NotConnected`](crate::TickwireError::NotConnected)
    /// before the connection is ready. The handler is detached again and
    /// nothing is retried.
    pub fn request_proposal(&mut self, symbol: &str) -> Result<()> {
        self.cancel_proposal();

        let request = ProposalRequest::new(symbol, &self.state().contract);
        self.registry
            .attach(MessageType::Proposal, Handler::ProposalStream)?;

        if let Err(e) = self.connection.send(&request) {
            self.registry.detach(MessageType::Proposal);
            return Err(e);
        }

        if self.options.proposal_retention == ProposalRetention::Unbounded {
            warn!(
                symbol = symbol,
                "Proposal retention is unbounded; the list grows until cancelled"
            );
        }
        info!(
            symbol = symbol,
            contract_type = %request.contract_type,
            amount = %request.amount,
            "Requested proposal stream"
        );
        Ok(())
    }

    /// Stops the proposal stream and clears the list. The connection stays
    /// open.
    pub fn cancel_proposal(&mut self) {
        self.registry.detach(MessageType::Proposal);

        if let Some(id) = self.proposal_subscription.take() {
            self.forget(&id);
        }

        self.transact(|state| {
            let had_proposals = !state.proposals.is_empty();
            state.proposals.clear();
            had_proposals
        });
    }

    pub(super) fn on_proposal(&mut self, response: ProposalResponse) {
        if let Some(subscription) = response.subscription {
            self.proposal_subscription = Some(subscription.id);
        }

        let retention = self.options.proposal_retention;
        let proposal = response.proposal;
        self.update(|state| {
            state.previous_spot = proposal.spot;
            retention.push(&mut state.proposals, proposal);
        });
    }

    // -- Contract settings --

    pub fn set_amount(&self, amount: Decimal) {
        self.transact(|state| replace(&mut state.contract.amount, amount));
    }

    pub fn set_basis(&self, basis: Basis) {
        self.transact(|state| replace(&mut state.contract.basis, basis));
    }

    pub fn set_duration(&self, duration: u32) {
        self.transact(|state| replace(&mut state.contract.duration, duration));
    }

    pub fn set_contract_type(&self, contract_type: impl Into<String>) {
        let contract_type = contract_type.into();
        self.transact(|state| replace(&mut state.contract.contract_type, contract_type));
    }

    pub fn set_current_spot(&self, spot: Decimal) {
        self.transact(|state| replace(&mut state.current_spot, spot));
    }

    // -- Settlement --

    pub fn set_duration_ended(&self, ended: bool) {
        self.update_settlement(|s| replace(&mut s.is_duration_ended, ended));
    }

    pub fn set_sell_successful(&self, successful: bool) {
        self.update_settlement(|s| replace(&mut s.sell_successful, successful));
    }

    pub fn set_sell_failed(&self, failed: bool) {
        self.update_settlement(|s| replace(&mut s.sell_failed, failed));
    }

    pub fn set_additional_amount(&self, amount: Decimal) {
        self.update_settlement(|s| replace(&mut s.additional_amount, amount));
    }

    pub fn set_deducted_amount(&self, amount: Decimal) {
        self.update_settlement(|s| replace(&mut s.deducted_amount, amount));
    }

    pub fn set_total_amount_won(&self, amount: Decimal) {
        self.update_settlement(|s| replace(&mut s.total_amount_won, amount));
    }

    pub fn set_total_amount_lost(&self, amount: Decimal) {
        self.update_settlement(|s| replace(&mut s.total_amount_lost, amount));
    }

    fn update_settlement(&self, f: impl FnOnce(&mut Settlement) -> bool) {
        self.transact(|state| f(&mut state.settlement));
    }
}

/// Stores `value` in `slot`, reporting whether it changed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn proposal(id: &str) -> ProposalData {
        ProposalData {
            id: id.to_string(),
            spot: dec!(100),
            spot_time: None,
            ask_price: dec!(10),
            payout: dec!(19.5),
            display_value: None,
            longcode: None,
            date_start: None,
        }
    }

    #[test]
    fn bounded_evicts_oldest() {
        let retention = ProposalRetention::Bounded(2);
        let mut proposals = VecDeque::new();

        for id in ["a", "b", "c"] {
            retention.push(&mut proposals, proposal(id));
        }

        let ids: Vec<_> = proposals.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
    }

    #[test]
    fn unbounded_keeps_everything() {
        let retention = ProposalRetention::Unbounded;
        let mut proposals = VecDeque::new();

        for i in 0..500 {
            retention.push(&mut proposals, proposal(&i.to_string()));
        }

        assert_eq!(proposals.len(), 500);
    }

    #[test]
    fn default_is_bounded() {
        assert_eq!(
            ProposalRetention::default(),
            ProposalRetention::Bounded(DEFAULT_PROPOSAL_LIMIT)
        );
    }

    #[test]
    fn replace_reports_change() {
        let mut value = 1;
        assert!(!replace(&mut value, 1));
        assert!(replace(&mut value, 2));
        assert_eq!(value, 2);
    }
}
