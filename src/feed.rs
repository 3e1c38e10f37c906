use crate::bridge::{Bridge, BridgeReceiver};
use crate::config::FeedConfig;
use crate::data_queue_handler::DataQueueHandler;
use crate::enqueue_enumerator::{EnqueueEnumerator, EnqueueSource};
use crate::error::FeedError;
use crate::exchange::{FanOutExchange, HandlerFn};
use crate::fill_forward::FillForwardEnumerator;
use crate::sequence::LiveSequence;
use crate::standardized_types::base_data::base_data_enum::BaseData;
use crate::standardized_types::base_data::coarse::CoarseFundamentalList;
use crate::standardized_types::base_data::traits::MarketEvent;
use crate::standardized_types::market_hours::TradingHours;
use crate::standardized_types::security_changes::SecurityChanges;
use crate::standardized_types::subscription_config::{SubscriptionConfig, SubscriptionDataType};
use crate::standardized_types::symbol::{SecurityType, Symbol};
use crate::standardized_types::time_slice::TimeSliceBuilder;
use crate::subscription::Subscription;
use crate::subscription_filter::SubscriptionFilter;
use crate::tick_aggregator::{AggregatorSource, TickAggregator};
use crate::time::TimeProvider;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One security's subscription request, as handed to [`LiveDataFeed::add_subscription`].
/// The security/algorithm catalog that would normally produce this is an external
/// collaborator (spec.md section 1); callers build it directly.
#[derive(Clone, Debug)]
pub struct Security {
    pub symbol: Symbol,
    pub config: SubscriptionConfig,
}

/// One configured universe-selection request, handed to
/// [`LiveDataFeed::add_universe_subscription`]. `id` names the universe for the
/// `universe_selection` callback; its own routing symbol is synthesized internally.
#[derive(Clone, Debug)]
pub struct UniverseDescriptor {
    pub id: String,
    pub config: SubscriptionConfig,
}

/// Fired once per frontier iteration in which a universe-selection subscription's
/// batch was non-empty, once per coarse-fundamental payload in that batch.
pub type UniverseSelectionCallback =
    Box<dyn Fn(&str, &SubscriptionConfig, DateTime<Utc>, &CoarseFundamentalList) + Send + Sync>;

type SubscriptionKey = (Symbol, SecurityType);

/// The frontier loop and subscription registry (C8): owns every [`Subscription`],
/// drives them under a UTC frontier, invokes universe selection, and publishes
/// [`TimeSlice`](crate::standardized_types::time_slice::TimeSlice)s to the bridge.
pub struct LiveDataFeed {
    time: Arc<dyn TimeProvider>,
    upstream: Arc<dyn DataQueueHandler>,
    exchange: Arc<FanOutExchange>,
    subscriptions: DashMap<SubscriptionKey, Subscription>,
    trading_hours: TradingHours,
    config: FeedConfig,
    cancel: Arc<AtomicBool>,
    active: AtomicBool,
    universe_handler: RwLock<Option<UniverseSelectionCallback>>,
    pending_changes: Mutex<SecurityChanges>,
    bridge: Bridge,
}

impl LiveDataFeed {
    pub fn new(
        time: Arc<dyn TimeProvider>,
        upstream: Arc<dyn DataQueueHandler>,
        trading_hours: TradingHours,
        config: FeedConfig,
        bridge_capacity: usize,
    ) -> (Self, BridgeReceiver) {
        let (bridge, receiver) = Bridge::new(bridge_capacity);
        let exchange = Arc::new(FanOutExchange::new(upstream.clone(), config.dispatcher_backoff));
        let feed = Self {
            time,
            upstream,
            exchange,
            subscriptions: DashMap::new(),
            trading_hours,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            active: AtomicBool::new(false),
            universe_handler: RwLock::new(None),
            pending_changes: Mutex::new(SecurityChanges::empty()),
            bridge,
        };
        (feed, receiver)
    }

    /// Installs the callback invoked with each coarse-fundamental payload a
    /// universe-selection subscription surfaces (spec.md's `universeSelection` event).
    pub fn set_universe_selection_handler(&self, handler: UniverseSelectionCallback) {
        *self.universe_handler.write() = Some(handler);
    }

    pub fn cancellation_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Begins exchange consumption and seeds the feed: one subscription per security
    /// in `universe`, one universe-selection subscription per entry in `universes`.
    /// `algorithm`/`job`/`resultHandler` from spec.md section 4.8 are external
    /// collaborators this crate never defines; this takes only the two request lists
    /// they would otherwise have supplied.
    pub fn initialize(
        &self,
        universe: impl IntoIterator<Item = (Security, DateTime<Utc>, DateTime<Utc>)>,
        universes: impl IntoIterator<Item = (UniverseDescriptor, DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<(), FeedError> {
        self.exchange.begin_consume();
        for (security, utc_start, utc_end) in universe {
            self.add_subscription(security, utc_start, utc_end, true)?;
        }
        for (descriptor, utc_start, utc_end) in universes {
            self.add_universe_subscription(descriptor, utc_start, utc_end)?;
        }
        Ok(())
    }

    pub fn add_subscription(
        &self,
        security: Security,
        utc_start: DateTime<Utc>,
        utc_end: DateTime<Utc>,
        is_user_defined: bool,
    ) -> Result<(), FeedError> {
        if security.config.is_custom_data {
            return Err(FeedError::SubscriptionConstruction {
                symbol: security.symbol.to_string(),
                reason: "custom-data subscriptions require add_custom_data_subscription with an injected reader".into(),
            });
        }
        self.install_subscription(security, utc_start, utc_end, is_user_defined, None, None)
    }

    /// Installs a subscription whose data comes from a caller-supplied reader rather
    /// than the exchange. Per spec.md 4.8, custom data "yields synthetic 'now' data;
    /// not wired through the exchange" — no enqueue handler or aggregator handler is
    /// installed, and no upstream `subscribe` call is made; `reader` is the entire
    /// source, optionally fill-forward-wrapped the same way a `TradeBar` source is.
    pub fn add_custom_data_subscription(
        &self,
        security: Security,
        reader: Box<dyn LiveSequence>,
        utc_start: DateTime<Utc>,
        utc_end: DateTime<Utc>,
        is_user_defined: bool,
    ) -> Result<(), FeedError> {
        if !security.config.is_custom_data {
            return Err(FeedError::SubscriptionConstruction {
                symbol: security.symbol.to_string(),
                reason: "add_custom_data_subscription requires a config built with is_custom_data = true".into(),
            });
        }
        self.install_subscription(security, utc_start, utc_end, is_user_defined, None, Some(reader))
    }

    pub fn add_universe_subscription(
        &self,
        descriptor: UniverseDescriptor,
        utc_start: DateTime<Utc>,
        utc_end: DateTime<Utc>,
    ) -> Result<(), FeedError> {
        let UniverseDescriptor { id, config } = descriptor;
        let symbol = Symbol::new(id.clone(), SecurityType::Base, "universe");
        let security = Security { symbol, config };
        self.install_subscription(security, utc_start, utc_end, false, Some(id), None)
    }

    fn install_subscription(
        &self,
        security: Security,
        utc_start: DateTime<Utc>,
        utc_end: DateTime<Utc>,
        is_user_defined: bool,
        universe: Option<String>,
        custom_reader: Option<Box<dyn LiveSequence>>,
    ) -> Result<(), FeedError> {
        let Security { symbol, config } = security;
        let key = (symbol.clone(), config.security_type);
        let is_universe_selection = config.data_type == SubscriptionDataType::Universe;
        let realtime_price = Arc::new(RwLock::new(None));

        let source: Box<dyn LiveSequence> = if let Some(reader) = custom_reader {
            let bar_size = config.resolution.as_duration();
            match bar_size {
                Some(bar_size) if config.fill_data_forward => Box::new(FillForwardEnumerator::new(
                    reader,
                    bar_size,
                    self.trading_hours.clone(),
                    config.extended_market_hours,
                    utc_end,
                    self.time.clone(),
                )),
                _ => reader,
            }
        } else {
            match config.data_type {
                SubscriptionDataType::Universe | SubscriptionDataType::Tick => {
                    let enumerator = Arc::new(EnqueueEnumerator::new());
                    self.install_enqueue_handler(symbol.clone(), enumerator.clone(), realtime_price.clone())?;
                    Box::new(EnqueueSource::new(enumerator))
                }
                SubscriptionDataType::TradeBar => {
                    let bar_size = config
                        .resolution
                        .as_duration()
                        .expect("non-tick resolution always has a bar size");
                    let aggregator = Arc::new(TickAggregator::new(bar_size, config.time_zone, self.time.clone()));
                    self.install_aggregator_handler(symbol.clone(), aggregator.clone(), realtime_price.clone())?;
                    let base = AggregatorSource::new(aggregator);
                    if config.fill_data_forward {
                        Box::new(FillForwardEnumerator::new(
                            base,
                            bar_size,
                            self.trading_hours.clone(),
                            config.extended_market_hours,
                            utc_end,
                            self.time.clone(),
                        ))
                    } else {
                        Box::new(base)
                    }
                }
            }
        };

        let filtered = Box::new(SubscriptionFilter::new(source, symbol.clone(), utc_end));

        let subscription = Subscription::new(
            config,
            symbol.clone(),
            filtered,
            utc_start,
            utc_end,
            is_user_defined,
            is_universe_selection,
            universe,
            realtime_price,
        );

        self.subscriptions.insert(key, subscription);
        self.pending_changes.lock().added.insert(symbol);
        Ok(())
    }

    fn subscribe_upstream(&self, symbol: &Symbol) -> Result<(), FeedError> {
        let map = HashMap::from([(symbol.security_type, vec![symbol.clone()])]);
        self.upstream
            .subscribe(map)
            .map_err(|e| FeedError::SubscriptionConstruction {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })
    }

    /// Open Question (b), resolved: a failed upstream `subscribe` propagates to the
    /// caller and nothing is registered — no handler, no subscription entry. Both
    /// installer helpers return before touching the exchange or the subscription map
    /// whenever this call fails.
    fn install_enqueue_handler(
        &self,
        symbol: Symbol,
        enumerator: Arc<EnqueueEnumerator>,
        realtime_price: Arc<RwLock<Option<Decimal>>>,
    ) -> Result<(), FeedError> {
        self.subscribe_upstream(&symbol)?;
        let handler: HandlerFn = Box::new(move |item: &BaseData| {
            if let BaseData::Tick(tick) = item {
                *realtime_price.write() = Some(tick.last_price);
            }
            enumerator.enqueue(item.clone());
            Ok(())
        });
        self.exchange.set_handler(symbol, handler);
        Ok(())
    }

    fn install_aggregator_handler(
        &self,
        symbol: Symbol,
        aggregator: Arc<TickAggregator>,
        realtime_price: Arc<RwLock<Option<Decimal>>>,
    ) -> Result<(), FeedError> {
        self.subscribe_upstream(&symbol)?;
        let handler: HandlerFn = Box::new(move |item: &BaseData| {
            let BaseData::Tick(tick) = item else {
                return Ok(());
            };
            *realtime_price.write() = Some(tick.last_price);
            aggregator.process(tick);
            Ok(())
        });
        self.exchange.set_handler(symbol, handler);
        Ok(())
    }

    pub fn remove_subscription(&self, symbol: &Symbol) -> Result<(), FeedError> {
        let key = (symbol.clone(), symbol.security_type);
        if self.subscriptions.remove(&key).is_none() {
            return Ok(());
        }
        self.exchange.remove_handler(symbol);
        let map = HashMap::from([(symbol.security_type, vec![symbol.clone()])]);
        self.upstream.unsubscribe(map)?;
        self.pending_changes.lock().removed.insert(symbol.clone());
        Ok(())
    }

    /// Enumerable snapshot of the currently registered subscriptions' configs — the
    /// `subscriptions` property from spec.md section 6, narrowed to the immutable,
    /// cloneable part of each `Subscription` rather than its live internal sequence.
    pub fn subscriptions(&self) -> Vec<SubscriptionConfig> {
        self.subscriptions.iter().map(|entry| entry.value().config.clone()).collect()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Requests termination of both the frontier loop and the exchange's consumer;
    /// both exit within one sleep period. Idempotent.
    pub fn exit(&self) {
        self.cancel.store(true, Ordering::Release);
        self.exchange.end_consume();
    }

    /// The frontier loop (spec.md section 4.8). Blocks until [`exit`](Self::exit) is
    /// called or a bridge write fails; `is_active()` is `true` for the duration.
    pub async fn run(&self) -> Result<(), FeedError> {
        self.active.store(true, Ordering::Release);
        let mut next_emit: Option<DateTime<Utc>> = None;

        loop {
            if self.cancel.load(Ordering::Acquire) {
                self.active.store(false, Ordering::Release);
                return Ok(());
            }

            let any_tick_subscription = self.subscriptions.iter().any(|e| e.value().is_tick_resolution());
            let sleep_increment = if any_tick_subscription {
                self.config.frontier_tick_sleep
            } else {
                self.config.frontier_heartbeat_sleep
            };
            let sleep_increment = duration_from_std(sleep_increment);

            let frontier = self.time.now();
            let mut rounding_increment = sleep_increment;

            let mut collected: Vec<(Symbol, BaseData)> = Vec::new();
            let mut universe_fires: Vec<(String, SubscriptionConfig, Vec<BaseData>)> = Vec::new();

            for mut entry in self.subscriptions.iter_mut() {
                let subscription = entry.value_mut();
                let mut batch: Vec<BaseData> = Vec::new();

                loop {
                    if subscription.needs_advance() && !subscription.advance() {
                        break;
                    }
                    match subscription.current().cloned() {
                        None => {
                            subscription.set_needs_advance(true);
                            break;
                        }
                        Some(item) => {
                            if item.end_time() > frontier {
                                subscription.set_needs_advance(false);
                                break;
                            }
                            batch.push(item);
                            subscription.set_needs_advance(true);
                        }
                    }
                }

                if batch.is_empty() {
                    continue;
                }
                if subscription.is_tick_resolution() {
                    rounding_increment = Duration::milliseconds(1);
                }
                if subscription.is_universe_selection {
                    if let Some(universe) = subscription.universe.clone() {
                        universe_fires.push((universe, subscription.config.clone(), batch.clone()));
                    }
                }
                let symbol = subscription.security.clone();
                collected.extend(batch.into_iter().map(|item| (symbol.clone(), item)));
            }

            if self.cancel.load(Ordering::Acquire) {
                self.active.store(false, Ordering::Release);
                return Ok(());
            }

            for (universe, config, batch) in universe_fires {
                if let Err(e) = self.bridge.wait_for_capacity().await {
                    self.cancel.store(true, Ordering::Release);
                    self.active.store(false, Ordering::Release);
                    return Err(e);
                }
                let handler = self.universe_handler.read();
                if let Some(handler) = handler.as_ref() {
                    for item in &batch {
                        if let BaseData::Coarse(list) = item {
                            handler(&universe, &config, frontier, list);
                        }
                    }
                }
            }

            let should_emit = !collected.is_empty() || next_emit.map(|t| frontier >= t).unwrap_or(true);
            if should_emit {
                let emit_time = round_down_utc(frontier, rounding_increment);
                let pending = std::mem::take(&mut *self.pending_changes.lock());
                let slice = TimeSliceBuilder::build(emit_time, collected, pending);
                if let Err(e) = self.bridge.add(slice).await {
                    self.cancel.store(true, Ordering::Release);
                    self.active.store(false, Ordering::Release);
                    return Err(e);
                }
                next_emit = Some(emit_time + Duration::seconds(1));
            }

            let now = self.time.now();
            let next_boundary = round_down_utc(now + sleep_increment, sleep_increment);
            let sleep_for = (next_boundary - now).max(Duration::milliseconds(1));
            tokio::time::sleep(
                sleep_for
                    .to_std()
                    .unwrap_or(std::time::Duration::from_millis(1)),
            )
            .await;
        }
    }
}

fn duration_from_std(d: std::time::Duration) -> Duration {
    Duration::from_std(d).unwrap_or_else(|_| Duration::milliseconds(1))
}

fn round_down_utc(instant: DateTime<Utc>, increment: Duration) -> DateTime<Utc> {
    let increment_ms = increment.num_milliseconds().max(1);
    let ts_ms = instant.timestamp_millis();
    let rounded = ts_ms - ts_ms.rem_euclid(increment_ms);
    DateTime::<Utc>::from_timestamp_millis(rounded).unwrap_or(instant)
}
