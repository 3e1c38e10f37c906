use crate::sequence::LiveSequence;
use crate::standardized_types::base_data::base_data_enum::BaseData;
use crate::standardized_types::subscription_config::SubscriptionConfig;
use crate::standardized_types::symbol::Symbol;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Per-symbol state owned by the frontier loop (C7): the lazy sequence produced by
/// `LiveDataFeed::add_subscription`'s construction (tick aggregator / enqueue
/// enumerator, optionally fill-forward-wrapped, always subscription-filter-wrapped),
/// plus the "needs advance" flag and the latest realtime price observed by the
/// dispatcher.
///
/// `source`/`current`/`needs_advance` are mutated only by the frontier loop; the
/// dispatcher's per-symbol handler never touches this struct directly — it holds its
/// own `Arc` clone of the aggregator/enumerator underneath `source`, and a clone of
/// `realtime_price`, both wired up at construction (see design note 9's two-phase
/// build: the handler closure captures the shared cell before `Subscription` itself
/// is assembled around the same pieces).
pub struct Subscription {
    pub config: SubscriptionConfig,
    pub security: Symbol,
    source: Box<dyn LiveSequence>,
    current: Option<BaseData>,
    needs_advance: bool,
    pub utc_start: DateTime<Utc>,
    pub utc_end: DateTime<Utc>,
    pub is_user_defined: bool,
    pub is_universe_selection: bool,
    pub universe: Option<String>,
    realtime_price: Arc<RwLock<Option<Decimal>>>,
}

impl Subscription {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SubscriptionConfig,
        security: Symbol,
        source: Box<dyn LiveSequence>,
        utc_start: DateTime<Utc>,
        utc_end: DateTime<Utc>,
        is_user_defined: bool,
        is_universe_selection: bool,
        universe: Option<String>,
        realtime_price: Arc<RwLock<Option<Decimal>>>,
    ) -> Self {
        let mut subscription = Self {
            config,
            security,
            source,
            current: None,
            needs_advance: true,
            utc_start,
            utc_end,
            is_user_defined,
            is_universe_selection,
            universe,
            realtime_price,
        };
        // "Prime with one advance(); set needsAdvance = (current == none)" — spec.md 4.8.
        subscription.source.advance();
        subscription.current = subscription.source.current();
        subscription.needs_advance = subscription.current.is_none();
        subscription
    }

    pub fn realtime_price(&self) -> Option<Decimal> {
        *self.realtime_price.read()
    }

    pub fn is_tick_resolution(&self) -> bool {
        self.config.resolution.is_tick()
    }

    pub fn current(&self) -> Option<&BaseData> {
        self.current.as_ref()
    }

    pub(crate) fn needs_advance(&self) -> bool {
        self.needs_advance
    }

    pub(crate) fn set_needs_advance(&mut self, value: bool) {
        self.needs_advance = value;
    }

    pub(crate) fn advance(&mut self) -> bool {
        let advanced = self.source.advance();
        self.current = self.source.current();
        advanced
    }

    pub(crate) fn take_current(&mut self) -> Option<BaseData> {
        self.current.take()
    }
}
