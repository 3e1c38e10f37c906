use thiserror::Error;

/// Errors surfaced by the live data feed engine.
///
/// Mirrors the error taxonomy a production feed needs: failures polling the
/// upstream queue, failures inside a per-symbol handler, failures
/// constructing a subscription, and the downstream bridge going away.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("upstream queue poll failed: {0}")]
    UpstreamPoll(String),

    #[error("subscription handler failed: {0}")]
    Handler(String),

    #[error("failed to construct subscription for {symbol}: {reason}")]
    SubscriptionConstruction { symbol: String, reason: String },

    #[error("downstream bridge is closed")]
    BridgeClosed,
}
