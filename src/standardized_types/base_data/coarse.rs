use crate::standardized_types::base_data::traits::MarketEvent;
use crate::standardized_types::symbol::Symbol;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_derive::{Deserialize, Serialize};

/// One symbol's line within a coarse-fundamental universe-selection payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoarseFundamental {
    pub symbol: Symbol,
    pub time: DateTime<Utc>,
    pub price: Decimal,
    pub dollar_volume: Decimal,
}

impl MarketEvent for CoarseFundamental {
    fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Coarse-fundamental rows are point-in-time snapshots, not windows.
    fn end_time(&self) -> DateTime<Utc> {
        self.time
    }
}

/// A full batch of coarse-fundamental rows published at a single instant, tagged with
/// the universe's own routing symbol — distinct from each row's `symbol`, which names a
/// selection candidate rather than a dispatch key. `MarketEvent::symbol` returns the
/// routing symbol so the exchange can hand the whole batch to the universe's handler in
/// one piece, matching how a universe-selection subscription is wired in spec.md 4.8.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoarseFundamentalList {
    pub symbol: Symbol,
    pub time: DateTime<Utc>,
    pub rows: Vec<CoarseFundamental>,
}

impl CoarseFundamentalList {
    pub fn symbols(&self) -> Vec<&Symbol> {
        self.rows.iter().map(|row| &row.symbol).collect()
    }
}

impl MarketEvent for CoarseFundamentalList {
    fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn end_time(&self) -> DateTime<Utc> {
        self.time
    }
}
