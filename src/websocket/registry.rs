//! Handler registry keyed by response message type.

use std::collections::HashMap;

use tracing::debug;

use crate::Result;
use crate::error::TickwireError;
use crate::models::MessageType;

/// Tracks which handler owns each response type.
///
/// At most one handler is attached per [`MessageType`]. Attaching over an
/// occupied slot fails; detaching an empty slot is a no-op.
#[derive(Debug)]
pub struct SubscriptionRegistry<H> {
    handlers: HashMap<MessageType, H>,
}

impl<H> SubscriptionRegistry<H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Attaches `handler` to `message_type`.
    ///
    /// # Errors
    ///
    /// Returns [`TickwireError::AlreadyAttached`] if the slot is occupied;
    /// the existing handler stays attached.
    pub fn attach(&mut self, message_type: MessageType, handler: H) -> Result<()> {
        if self.handlers.contains_key(&message_type) {
            return Err(TickwireError::AlreadyAttached(message_type));
        }
        self.handlers.insert(message_type, handler);
        debug!(msg_type = message_type.as_str(), "Handler attached");
        Ok(())
    }

    /// Detaches and returns the handler for `message_type`, if any.
    pub fn detach(&mut self, message_type: MessageType) -> Option<H> {
        let removed = self.handlers.remove(&message_type);
        if removed.is_some() {
            debug!(msg_type = message_type.as_str(), "Handler detached");
        }
        removed
    }

    pub fn get(&self, message_type: MessageType) -> Option<&H> {
        self.handlers.get(&message_type)
    }

    pub fn is_attached(&self, message_type: MessageType) -> bool {
        self.handlers.contains_key(&message_type)
    }

    /// Message types that currently have a handler.
    pub fn attached(&self) -> impl Iterator<Item = MessageType> + '_ {
        self.handlers.keys().copied()
    }

    /// Detaches every handler.
    pub fn clear(&mut self) {
        if !self.handlers.is_empty() {
            debug!(count = self.handlers.len(), "Detaching all handlers");
        }
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<H> Default for SubscriptionRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_then_get() {
        let mut registry = SubscriptionRegistry::new();
        registry.attach(MessageType::Ohlc, "live").unwrap();

        assert_eq!(registry.get(MessageType::Ohlc), Some(&"live"));
        assert!(registry.get(MessageType::Candles).is_none());
    }

    #[test]
    fn second_attach_conflicts_and_keeps_original() {
        let mut registry = SubscriptionRegistry::new();
        registry.attach(MessageType::Ohlc, "first").unwrap();

        let err = registry.attach(MessageType::Ohlc, "second").unwrap_err();

        assert!(matches!(err, TickwireError::AlreadyAttached(MessageType::Ohlc)));
        assert_eq!(registry.get(MessageType::Ohlc), Some(&"first"));
    }

    #[test]
    fn detach_twice_is_a_no_op() {
        let mut registry = SubscriptionRegistry::new();
        registry.attach(MessageType::Proposal, 1).unwrap();
        registry.attach(MessageType::Ohlc, 2).unwrap();

        assert_eq!(registry.detach(MessageType::Proposal), Some(1));
        assert_eq!(registry.detach(MessageType::Proposal), None);

        assert_eq!(registry.get(MessageType::Ohlc), Some(&2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reattach_after_detach() {
        let mut registry = SubscriptionRegistry::new();
        registry.attach(MessageType::Candles, 'a').unwrap();
        registry.detach(MessageType::Candles);

        registry.attach(MessageType::Candles, 'b').unwrap();

        assert_eq!(registry.get(MessageType::Candles), Some(&'b'));
    }

    #[test]
    fn clear_empties_every_slot() {
        let mut registry = SubscriptionRegistry::new();
        registry.attach(MessageType::Candles, ()).unwrap();
        registry.attach(MessageType::Proposal, ()).unwrap();

        registry.clear();

        assert!(registry.is_empty());
        assert_eq!(registry.attached().count(), 0);
    }
}
