use crate::helpers::converters;
use crate::sequence::LiveSequence;
use crate::standardized_types::base_data::base_data_enum::BaseData;
use crate::standardized_types::base_data::tick::Tick;
use crate::standardized_types::base_data::trade_bar::TradeBar;
use crate::standardized_types::symbol::Symbol;
use crate::time::TimeProvider;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use std::sync::Arc;

/// Consumes ticks, producing one `TradeBar` per `bar_size` window (C3).
///
/// `process` is called from the dispatcher thread; it only ever needs a shared
/// reference, since the at-most-one working bar lives behind a [`Mutex`] rather than
/// a concurrent queue — design note 9's "single-slot aggregator queue" resolved as a
/// plain mutex-protected cell so "at most one working bar" is a type-level guarantee.
pub struct TickAggregator {
    bar_size: Duration,
    time_zone: Tz,
    time: Arc<dyn TimeProvider>,
    working: Mutex<Option<TradeBar>>,
}

impl TickAggregator {
    pub fn new(bar_size: Duration, time_zone: Tz, time: Arc<dyn TimeProvider>) -> Self {
        Self {
            bar_size,
            time_zone,
            time,
            working: Mutex::new(None),
        }
    }

    /// Folds one tick into the working bar, creating it first if this is the first
    /// tick of a new window. A zero `last_price` marks a quote-only tick: it
    /// contributes only to volume, never to open/high/low/close.
    pub fn process(&self, tick: &Tick) {
        let mut working = self.working.lock();
        match working.as_mut() {
            None => {
                let start = self.window_start(self.time.now());
                *working = Some(TradeBar::new(
                    tick.symbol.clone(),
                    start,
                    self.bar_size,
                    tick.last_price,
                    tick.last_price,
                    tick.last_price,
                    tick.last_price,
                    tick.quantity,
                ));
            }
            Some(bar) => {
                if !tick.last_price.is_zero() {
                    bar.high = bar.high.max(tick.last_price);
                    bar.low = bar.low.min(tick.last_price);
                    bar.close = tick.last_price;
                }
                bar.volume += tick.quantity;
            }
        }
    }

    fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = converters::time_convert_utc_datetime_to_fixed_offset(&self.time_zone, now);
        let rounded = converters::round_down_to_duration(local, self.bar_size);
        rounded.with_timezone(&Utc)
    }

    /// Takes the working bar if it has closed (`end_time <= now()`), leaving the slot
    /// empty for the next tick to start a fresh window.
    fn take_ready(&self) -> Option<TradeBar> {
        let mut working = self.working.lock();
        let closed = matches!(working.as_ref(), Some(bar) if bar.end_time <= self.time.now());
        if closed {
            working.take()
        } else {
            None
        }
    }
}

/// Exposes a [`TickAggregator`] as a `LiveSequence`, owned solely by the frontier
/// thread while the dispatcher thread holds a separate `Arc` clone to call `process`.
pub struct AggregatorSource {
    aggregator: Arc<TickAggregator>,
    current: Option<BaseData>,
}

impl AggregatorSource {
    pub fn new(aggregator: Arc<TickAggregator>) -> Self {
        Self {
            aggregator,
            current: None,
        }
    }
}

impl LiveSequence for AggregatorSource {
    /// Always returns `true`: a tick aggregator never terminates on its own, per
    /// spec.md section 4.3.
    fn advance(&mut self) -> bool {
        self.current = self.aggregator.take_ready().map(BaseData::TradeBar);
        true
    }

    fn current(&self) -> Option<BaseData> {
        self.current.clone()
    }
}
