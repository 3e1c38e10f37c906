use crate::data_queue_handler::DataQueueHandler;
use crate::error::FeedError;
use crate::standardized_types::base_data::base_data_enum::BaseData;
use crate::standardized_types::base_data::traits::MarketEvent;
use crate::standardized_types::symbol::Symbol;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

/// Per-symbol callback installed on the exchange. Invoked synchronously on the
/// consumer thread for every item whose symbol matches; must not block indefinitely
/// (handlers push into lock-free queues — see [`TickAggregator`](crate::tick_aggregator::TickAggregator)
/// and [`EnqueueEnumerator`](crate::enqueue_enumerator::EnqueueEnumerator)).
pub type HandlerFn = Box<dyn Fn(&BaseData) -> Result<(), FeedError> + Send + Sync>;

/// Decides whether a caught error is fatal (`true`, consumer exits) or recoverable
/// (`false`, consumer continues). Consulted for both upstream-poll errors and
/// per-symbol handler errors.
pub type ErrorPredicate = Box<dyn Fn(&FeedError) -> bool + Send + Sync>;

fn default_error_predicate() -> ErrorPredicate {
    Box::new(|_: &FeedError| false)
}

/// Single dedicated consumer thread over the upstream queue, dispatching to
/// per-symbol handlers (C6).
pub struct FanOutExchange {
    upstream: Arc<dyn DataQueueHandler>,
    handlers: DashMap<Symbol, HandlerFn>,
    error_predicate: RwLock<ErrorPredicate>,
    cancel: Arc<AtomicBool>,
    running: AtomicBool,
    poll_backoff: StdDuration,
}

impl FanOutExchange {
    pub fn new(upstream: Arc<dyn DataQueueHandler>, poll_backoff: StdDuration) -> Self {
        Self {
            upstream,
            handlers: DashMap::new(),
            error_predicate: RwLock::new(default_error_predicate()),
            cancel: Arc::new(AtomicBool::new(false)),
            running: AtomicBool::new(false),
            poll_backoff,
        }
    }

    /// Installs or replaces the handler for `symbol`.
    pub fn set_handler(&self, symbol: Symbol, handler: HandlerFn) {
        self.handlers.insert(symbol, handler);
    }

    /// Returns `true` if a handler was present and removed.
    pub fn remove_handler(&self, symbol: &Symbol) -> bool {
        self.handlers.remove(symbol).is_some()
    }

    pub fn set_error_handler(&self, predicate: ErrorPredicate) {
        *self.error_predicate.write() = predicate;
    }

    pub fn cancellation_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Starts the consumer thread. Idempotent: a second call while already running
    /// (or after a prior run) is a no-op. Must be called from within a Tokio runtime,
    /// matching the teacher's `handle_live_data`, which wraps its own blocking receive
    /// loop in `tokio::task::spawn_blocking` rather than a bare OS thread.
    pub fn begin_consume(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let exchange = Arc::clone(self);
        let _ = tokio::task::spawn_blocking(move || exchange.consume_loop());
    }

    /// Requests termination; the consumer drains its current poll then exits.
    pub fn end_consume(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    fn consume_loop(&self) {
        loop {
            if self.cancel.load(Ordering::Acquire) {
                log::debug!("exchange consumer cancelled");
                return;
            }

            let items = match self.upstream.get_next_ticks() {
                Ok(items) => items,
                Err(e) => {
                    log::warn!("upstream poll failed: {e}");
                    if (self.error_predicate.read())(&e) {
                        log::error!("fatal upstream error, stopping consumer: {e}");
                        self.cancel.store(true, Ordering::Release);
                        return;
                    }
                    continue;
                }
            };

            let mut handled = false;
            for item in &items {
                let Some(handler) = self.handlers.get(item.symbol()) else {
                    continue;
                };
                handled = true;
                if let Err(e) = handler(item) {
                    log::warn!("handler error for {}: {e}", item.symbol());
                    if (self.error_predicate.read())(&e) {
                        log::error!("fatal handler error, stopping consumer: {e}");
                        self.cancel.store(true, Ordering::Release);
                        return;
                    }
                }
            }

            if !handled {
                std::thread::sleep(self.poll_backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_queue_handler::TestDataQueueHandler;
    use crate::standardized_types::base_data::tick::Tick;
    use crate::standardized_types::symbol::SecurityType;
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn tick(symbol: Symbol) -> BaseData {
        BaseData::Tick(Tick {
            symbol,
            time: chrono::Utc::now(),
            bid_price: dec!(1),
            ask_price: dec!(1),
            last_price: dec!(1),
            quantity: dec!(1),
        })
    }

    fn counter_handler(counter: Arc<AtomicUsize>) -> HandlerFn {
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    /// S2 — Dispatch: a handler for SPY fires on SPY items; EURUSD's handler never
    /// fires for SPY items.
    #[tokio::test]
    async fn routes_items_only_to_their_registered_symbol() {
        let upstream = Arc::new(TestDataQueueHandler::new());
        let exchange = Arc::new(FanOutExchange::new(upstream.clone(), Duration::from_millis(1)));
        let spy = Symbol::new("SPY", SecurityType::Equity, "ARCA");
        let eurusd = Symbol::new("EURUSD", SecurityType::Forex, "OANDA");

        let spy_count = Arc::new(AtomicUsize::new(0));
        let eurusd_count = Arc::new(AtomicUsize::new(0));
        exchange.set_handler(spy.clone(), counter_handler(spy_count.clone()));
        exchange.set_handler(eurusd.clone(), counter_handler(eurusd_count.clone()));

        upstream.push(tick(spy));
        exchange.begin_consume();
        tokio::time::sleep(Duration::from_millis(20)).await;
        exchange.end_consume();

        assert_eq!(spy_count.load(Ordering::SeqCst), 1);
        assert_eq!(eurusd_count.load(Ordering::SeqCst), 0);
    }

    /// S3 — Removal: after `remove_handler`, subsequent items for that symbol fire no
    /// callback.
    #[tokio::test]
    async fn removed_handler_stops_receiving_items() {
        let upstream = Arc::new(TestDataQueueHandler::new());
        let exchange = Arc::new(FanOutExchange::new(upstream.clone(), Duration::from_millis(1)));
        let spy = Symbol::new("SPY", SecurityType::Equity, "ARCA");
        let count = Arc::new(AtomicUsize::new(0));
        exchange.set_handler(spy.clone(), counter_handler(count.clone()));
        assert!(exchange.remove_handler(&spy));

        upstream.push(tick(spy));
        exchange.begin_consume();
        tokio::time::sleep(Duration::from_millis(20)).await;
        exchange.end_consume();

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    /// S4 — Fatal predicate: a handler that throws on first call, with an
    /// always-fatal predicate, is observed exactly once.
    #[tokio::test]
    async fn fatal_predicate_stops_consumption_after_first_error() {
        let upstream = Arc::new(TestDataQueueHandler::new());
        let exchange = Arc::new(FanOutExchange::new(upstream.clone(), Duration::from_millis(1)));
        let spy = Symbol::new("SPY", SecurityType::Equity, "ARCA");
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        exchange.set_handler(
            spy.clone(),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FeedError::Handler("boom".into()))
            }),
        );
        exchange.set_error_handler(Box::new(|_| true));

        for _ in 0..5 {
            upstream.push(tick(spy.clone()));
        }
        exchange.begin_consume();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    /// Default error policy: a throwing handler does not stop consumption.
    #[tokio::test]
    async fn default_predicate_is_non_fatal() {
        let upstream = Arc::new(TestDataQueueHandler::new());
        let exchange = Arc::new(FanOutExchange::new(upstream.clone(), Duration::from_millis(1)));
        let spy = Symbol::new("SPY", SecurityType::Equity, "ARCA");
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        exchange.set_handler(
            spy.clone(),
            Box::new(move |_| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(FeedError::Handler("first call fails".into()))
                } else {
                    Ok(())
                }
            }),
        );

        upstream.push(tick(spy.clone()));
        upstream.push(tick(spy));
        exchange.begin_consume();
        tokio::time::sleep(Duration::from_millis(30)).await;
        exchange.end_consume();

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn begin_consume_is_idempotent() {
        let upstream = Arc::new(TestDataQueueHandler::new());
        let exchange = Arc::new(FanOutExchange::new(upstream, Duration::from_millis(1)));
        exchange.begin_consume();
        exchange.begin_consume();
        exchange.end_consume();
    }
}
