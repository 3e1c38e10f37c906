use crate::sequence::LiveSequence;
use crate::standardized_types::base_data::base_data_enum::BaseData;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};

/// A lazy sequence backed by a concurrent FIFO queue (C2).
///
/// `enqueue` is called from the dispatcher thread; `advance`/`current` are called
/// from the frontier thread. `advance()` never blocks: it polls the queue and sets
/// `current` to `None` when nothing is waiting, per the non-blocking contract in
/// spec.md section 4.2.
pub struct EnqueueEnumerator {
    sender: Sender<BaseData>,
    receiver: Receiver<BaseData>,
    stopped: AtomicBool,
    current: Option<BaseData>,
}

impl EnqueueEnumerator {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender,
            receiver,
            stopped: AtomicBool::new(false),
            current: None,
        }
    }

    /// Thread-safe; callable from the dispatcher while the frontier thread polls.
    pub fn enqueue(&self, item: BaseData) {
        // The receiver lives as long as `self`, so this can only fail if the
        // enumerator itself is being torn down concurrently, which callers don't do.
        let _ = self.sender.send(item);
    }

    /// Once called, the sequence becomes terminal after the queue next drains.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Non-blocking poll; never panics, never blocks. `&self` so it can be called
    /// through a shared `Arc` from a thread other than the one owning `advance()` —
    /// used by [`EnqueueSource`], which polls the same enumerator from the frontier
    /// thread while the dispatcher thread enqueues concurrently.
    pub fn poll(&self) -> Poll {
        match self.receiver.try_recv() {
            Ok(item) => Poll::Item(item),
            Err(TryRecvError::Empty) => {
                if self.stopped.load(Ordering::Acquire) {
                    Poll::Terminated
                } else {
                    Poll::Empty
                }
            }
            Err(TryRecvError::Disconnected) => Poll::Terminated,
        }
    }
}

impl Default for EnqueueEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one non-blocking poll of the underlying queue.
pub enum Poll {
    Item(BaseData),
    Empty,
    Terminated,
}

impl LiveSequence for EnqueueEnumerator {
    fn advance(&mut self) -> bool {
        match self.poll() {
            Poll::Item(item) => {
                self.current = Some(item);
                true
            }
            Poll::Empty => {
                self.current = None;
                true
            }
            Poll::Terminated => {
                self.current = None;
                false
            }
        }
    }

    fn current(&self) -> Option<BaseData> {
        self.current.clone()
    }
}

/// Exposes an [`EnqueueEnumerator`] as a `LiveSequence`, owned solely by the frontier
/// thread while the dispatcher thread holds a separate `Arc` clone to call `enqueue`
/// — the tick-resolution counterpart to
/// [`AggregatorSource`](crate::tick_aggregator::AggregatorSource).
pub struct EnqueueSource {
    inner: std::sync::Arc<EnqueueEnumerator>,
    current: Option<BaseData>,
    terminated: bool,
}

impl EnqueueSource {
    pub fn new(inner: std::sync::Arc<EnqueueEnumerator>) -> Self {
        Self {
            inner,
            current: None,
            terminated: false,
        }
    }
}

impl LiveSequence for EnqueueSource {
    fn advance(&mut self) -> bool {
        if self.terminated {
            self.current = None;
            return false;
        }
        match self.inner.poll() {
            Poll::Item(item) => {
                self.current = Some(item);
                true
            }
            Poll::Empty => {
                self.current = None;
                true
            }
            Poll::Terminated => {
                self.current = None;
                self.terminated = true;
                false
            }
        }
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
    use crate::standardized_types::symbol::Symbol;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn tick() -> BaseData {
        BaseData::Tick(Tick {
            symbol: Symbol::new("SPY", SecurityType::Equity, "ARCA"),
            time: Utc::now(),
            bid_price: dec!(1),
            ask_price: dec!(1),
            last_price: dec!(1),
            quantity: dec!(1),
        })
    }

    #[test]
    fn advance_returns_true_with_no_current_when_empty() {
        let mut enumerator = EnqueueEnumerator::new();
        assert!(enumerator.advance());
        assert!(enumerator.current().is_none());
    }

    #[test]
    fn enqueued_item_is_yielded_on_next_advance() {
        let mut enumerator = EnqueueEnumerator::new();
        enumerator.enqueue(tick());
        assert!(enumerator.advance());
        assert_eq!(enumerator.current(), Some(tick()));
    }

    #[test]
    fn stop_terminates_only_after_drain() {
        let mut enumerator = EnqueueEnumerator::new();
        enumerator.enqueue(tick());
        enumerator.stop();
        assert!(enumerator.advance());
        assert_eq!(enumerator.current(), Some(tick()));
        assert!(!enumerator.advance());
        assert!(enumerator.current().is_none());
    }

    #[test]
    fn enqueue_source_observes_items_enqueued_through_a_shared_arc() {
        let enumerator = std::sync::Arc::new(EnqueueEnumerator::new());
        let mut source = EnqueueSource::new(enumerator.clone());
        assert!(source.advance());
        assert!(source.current().is_none());

        enumerator.enqueue(tick());
        assert!(source.advance());
        assert_eq!(source.current(), Some(tick()));

        enumerator.stop();
        assert!(!source.advance());
        assert!(source.current().is_none());
    }
}
