use crate::standardized_types::base_data::traits::MarketEvent;
use crate::standardized_types::symbol::Symbol;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_derive::{Deserialize, Serialize};

/// A single market event carrying bid/ask/last price and an optional trade quantity.
///
/// A `last_price` of zero marks a quote-only tick (no trade occurred): the tick
/// aggregator (C3) folds its quantity into volume but never touches open/high/low/close.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: Symbol,
    pub time: DateTime<Utc>,
    pub bid_price: Decimal,
    pub ask_price: Decimal,
    pub last_price: Decimal,
    pub quantity: Decimal,
}

impl Tick {
    pub fn is_quote_only(&self) -> bool {
        self.last_price.is_zero()
    }
}

impl MarketEvent for Tick {
    fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// A tick is an instantaneous event; its window has zero width.
    fn end_time(&self) -> DateTime<Utc> {
        self.time
    }
}
