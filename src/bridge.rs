use crate::error::FeedError;
use crate::standardized_types::time_slice::TimeSlice;
use tokio::sync::mpsc;

/// The downstream consumer's bounded, cancellable channel of `TimeSlice`s (section
/// 6). `add` may block the frontier loop on backpressure; `wait_for_capacity` is used
/// before firing universe selection so that event and the slice carrying it stay
/// ordered against anything currently queued for the downstream.
pub struct Bridge {
    sender: mpsc::Sender<TimeSlice>,
}

/// The consumer half. Owned by whatever downstream component drains published
/// slices; not part of the feed's own public surface.
pub struct BridgeReceiver {
    receiver: mpsc::Receiver<TimeSlice>,
}

impl Bridge {
    pub fn new(capacity: usize) -> (Self, BridgeReceiver) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, BridgeReceiver { receiver })
    }

    pub async fn add(&self, slice: TimeSlice) -> Result<(), FeedError> {
        self.sender.send(slice).await.map_err(|_| FeedError::BridgeClosed)
    }

    /// Blocks until the channel has spare capacity (or is closed), without consuming
    /// it — a reservation taken and immediately released. Mirrors the `wait(capacity,
    /// token)` primitive spec.md section 6 calls for ahead of a universe-selection
    /// callback.
    pub async fn wait_for_capacity(&self) -> Result<(), FeedError> {
        self.sender
            .reserve()
            .await
            .map(drop)
            .map_err(|_| FeedError::BridgeClosed)
    }
}

impl BridgeReceiver {
    pub async fn recv(&mut self) -> Option<TimeSlice> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standardized_types::security_changes::SecurityChanges;
    use chrono::Utc;

    #[tokio::test]
    async fn add_then_recv_round_trips_a_slice() {
        let (bridge, mut receiver) = Bridge::new(4);
        let slice = TimeSlice {
            time: Utc::now(),
            data: vec![],
            security_changes: SecurityChanges::empty(),
        };
        bridge.add(slice.clone()).await.unwrap();
        assert_eq!(receiver.recv().await, Some(slice));
    }

    #[tokio::test]
    async fn add_after_receiver_dropped_reports_bridge_closed() {
        let (bridge, receiver) = Bridge::new(1);
        drop(receiver);
        let slice = TimeSlice {
            time: Utc::now(),
            data: vec![],
            security_changes: SecurityChanges::empty(),
        };
        let result = bridge.add(slice).await;
        assert!(matches!(result, Err(FeedError::BridgeClosed)));
    }
}
