use crate::error::FeedError;
use crate::standardized_types::base_data::base_data_enum::BaseData;
use crate::standardized_types::symbol::{SecurityType, Symbol};
use std::collections::HashMap;

/// The upstream vendor/brokerage adapter (external interface, section 6): polled by
/// the fan-out exchange (C6), never implemented by this crate beyond the test double
/// below. A real deployment supplies a brokerage- or vendor-specific implementation.
pub trait DataQueueHandler: Send + Sync {
    /// Non-blocking (or briefly blocking) poll; may return an empty vector.
    fn get_next_ticks(&self) -> Result<Vec<BaseData>, FeedError>;

    /// Additive and idempotent: subscribing to an already-subscribed symbol is a no-op.
    fn subscribe(&self, symbols: HashMap<SecurityType, Vec<Symbol>>) -> Result<(), FeedError>;

    /// Idempotent: unsubscribing from a symbol that was never subscribed is a no-op.
    fn unsubscribe(&self, symbols: HashMap<SecurityType, Vec<Symbol>>) -> Result<(), FeedError>;
}

/// An in-memory [`DataQueueHandler`] driven by `push`, used throughout the test suite
/// in place of a real brokerage/vendor adapter — grounded in the teacher's
/// `TestApiClient` (apis/test_api), which plays the same role for its own server-side
/// vendor/broker traits.
pub struct TestDataQueueHandler {
    sender: crossbeam_channel::Sender<BaseData>,
    receiver: crossbeam_channel::Receiver<BaseData>,
    subscribed: dashmap::DashMap<SecurityType, Vec<Symbol>>,
}

impl TestDataQueueHandler {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender,
            receiver,
            subscribed: dashmap::DashMap::new(),
        }
    }

    /// Pushes an item the next `get_next_ticks` poll will surface.
    pub fn push(&self, item: BaseData) {
        let _ = self.sender.send(item);
    }

    pub fn is_subscribed(&self, security_type: &SecurityType, symbol: &Symbol) -> bool {
        self.subscribed
            .get(security_type)
            .map(|symbols| symbols.contains(symbol))
            .unwrap_or(false)
    }
}

impl Default for TestDataQueueHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl DataQueueHandler for TestDataQueueHandler {
    fn get_next_ticks(&self) -> Result<Vec<BaseData>, FeedError> {
        Ok(self.receiver.try_iter().collect())
    }

    fn subscribe(&self, symbols: HashMap<SecurityType, Vec<Symbol>>) -> Result<(), FeedError> {
        for (security_type, new_symbols) in symbols {
            let mut entry = self.subscribed.entry(security_type).or_default();
            for symbol in new_symbols {
                if !entry.contains(&symbol) {
                    entry.push(symbol);
                }
            }
        }
        Ok(())
    }

    fn unsubscribe(&self, symbols: HashMap<SecurityType, Vec<Symbol>>) -> Result<(), FeedError> {
        for (security_type, removed) in symbols {
            if let Some(mut entry) = self.subscribed.get_mut(&security_type) {
                entry.retain(|symbol| !removed.contains(symbol));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standardized_types::base_data::tick::Tick;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn tick(symbol: Symbol) -> BaseData {
        BaseData::Tick(Tick {
            symbol,
            time: Utc::now(),
            bid_price: dec!(1),
            ask_price: dec!(1),
            last_price: dec!(1),
            quantity: dec!(1),
        })
    }

    #[test]
    fn subscribe_is_additive_and_idempotent() {
        let handler = TestDataQueueHandler::new();
        let spy = Symbol::new("SPY", SecurityType::Equity, "ARCA");
        let map = HashMap::from([(SecurityType::Equity, vec![spy.clone()])]);
        handler.subscribe(map.clone()).unwrap();
        handler.subscribe(map).unwrap();
        assert!(handler.is_subscribed(&SecurityType::Equity, &spy));
    }

    #[test]
    fn push_is_surfaced_on_next_poll() {
        let handler = TestDataQueueHandler::new();
        let spy = Symbol::new("SPY", SecurityType::Equity, "ARCA");
        handler.push(tick(spy));
        let items = handler.get_next_ticks().unwrap();
        assert_eq!(items.len(), 1);
        assert!(handler.get_next_ticks().unwrap().is_empty());
    }
}
