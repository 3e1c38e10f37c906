use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// The security classification carried alongside a [`Symbol`].
///
/// `Base` is the catch-all used by universe/coarse-fundamental subscriptions that
/// are not tied to a single tradable security type.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum SecurityType {
    Equity,
    Forex,
    Crypto,
    Future,
    Base,
}

/// Identifies the venue a symbol is routed through, independent of its security type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketIdentifier(pub String);

impl fmt::Display for MarketIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque routing key: equality and hash are the only operations the engine needs.
#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub security_type: SecurityType,
    pub market: MarketIdentifier,
}

impl Symbol {
    pub fn new(name: impl Into<String>, security_type: SecurityType, market: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            security_type,
            market: MarketIdentifier(market.into()),
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.security_type == other.security_type && self.market == other.market
    }
}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.security_type.hash(state);
        self.market.0.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.market, self.security_type, self.name)
    }
}
