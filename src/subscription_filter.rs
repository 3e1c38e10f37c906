use crate::sequence::LiveSequence;
use crate::standardized_types::base_data::base_data_enum::BaseData;
use crate::standardized_types::base_data::traits::MarketEvent;
use crate::standardized_types::symbol::Symbol;
use chrono::{DateTime, Utc};

/// Final stage of the per-symbol pipeline (C5): drops any item past the
/// subscription's `utc_end`, and defensively drops anything whose symbol doesn't
/// match (the inner sources are all single-symbol, so this should never trigger in
/// practice, but spec.md section 4.5 calls it out explicitly).
pub struct SubscriptionFilter<S> {
    inner: S,
    symbol: Symbol,
    utc_end: DateTime<Utc>,
    current: Option<BaseData>,
}

impl<S: LiveSequence> SubscriptionFilter<S> {
    pub fn new(inner: S, symbol: Symbol, utc_end: DateTime<Utc>) -> Self {
        Self {
            inner,
            symbol,
            utc_end,
            current: None,
        }
    }
}

impl<S: LiveSequence> LiveSequence for SubscriptionFilter<S> {
    fn advance(&mut self) -> bool {
        if !self.inner.advance() {
            self.current = None;
            return false;
        }
        self.current = self.inner.current().filter(|item| {
            item.symbol() == &self.symbol && item.end_time() <= self.utc_end
        });
        true
    }

    fn current(&self) -> Option<BaseData> {
        self.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standardized_types::base_data::tick::Tick;
    use crate::standardized_types::symbol::SecurityType;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    struct Once(Option<BaseData>);

    impl LiveSequence for Once {
        fn advance(&mut self) -> bool {
            true
        }

        fn current(&self) -> Option<BaseData> {
            self.0.clone()
        }
    }

    fn tick(symbol: Symbol, time: DateTime<Utc>) -> BaseData {
        BaseData::Tick(Tick {
            symbol,
            time,
            bid_price: dec!(1),
            ask_price: dec!(1),
            last_price: dec!(1),
            quantity: dec!(1),
        })
    }

    #[test]
    fn drops_data_past_subscription_end() {
        let symbol = Symbol::new("SPY", SecurityType::Equity, "ARCA");
        let now = Utc::now();
        let utc_end = now - Duration::seconds(1);
        let inner = Once(Some(tick(symbol.clone(), now)));
        let mut filter = SubscriptionFilter::new(inner, symbol, utc_end);
        filter.advance();
        assert!(filter.current().is_none());
    }

    #[test]
    fn passes_data_within_subscription_end() {
        let symbol = Symbol::new("SPY", SecurityType::Equity, "ARCA");
        let now = Utc::now();
        let utc_end = now + Duration::seconds(1);
        let inner = Once(Some(tick(symbol.clone(), now)));
        let mut filter = SubscriptionFilter::new(inner, symbol, utc_end);
        filter.advance();
        assert!(filter.current().is_some());
    }

    #[test]
    fn drops_data_for_a_different_symbol() {
        let symbol = Symbol::new("SPY", SecurityType::Equity, "ARCA");
        let other = Symbol::new("AAPL", SecurityType::Equity, "NASDAQ");
        let now = Utc::now();
        let inner = Once(Some(tick(other, now)));
        let mut filter = SubscriptionFilter::new(inner, symbol, now + Duration::seconds(1));
        filter.advance();
        assert!(filter.current().is_none());
    }
}
