use crate::standardized_types::base_data::coarse::CoarseFundamentalList;
use crate::standardized_types::base_data::tick::Tick;
use crate::standardized_types::base_data::trade_bar::TradeBar;
use crate::standardized_types::base_data::traits::MarketEvent;
use crate::standardized_types::symbol::Symbol;
use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};

/// Closed, tagged variant over every data item the engine moves between stages.
///
/// Replaces nominal inheritance with an explicit discriminator: every consumer that
/// matches on this enum is forced to be exhaustive, which is the point — a new
/// variant is a compile error everywhere it isn't handled, not a silent no-op.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BaseData {
    Tick(Tick),
    TradeBar(TradeBar),
    Coarse(CoarseFundamentalList),
}

impl BaseData {
    pub fn as_tick(&self) -> Option<&Tick> {
        match self {
            BaseData::Tick(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_trade_bar(&self) -> Option<&TradeBar> {
        match self {
            BaseData::TradeBar(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_coarse(&self) -> Option<&CoarseFundamentalList> {
        match self {
            BaseData::Coarse(c) => Some(c),
            _ => None,
        }
    }
}

impl MarketEvent for BaseData {
    fn symbol(&self) -> &Symbol {
        match self {
            BaseData::Tick(t) => t.symbol(),
            BaseData::TradeBar(b) => b.symbol(),
            BaseData::Coarse(c) => c.symbol(),
        }
    }

    fn time(&self) -> DateTime<Utc> {
        match self {
            BaseData::Tick(t) => t.time(),
            BaseData::TradeBar(b) => b.time(),
            BaseData::Coarse(c) => c.time(),
        }
    }

    fn end_time(&self) -> DateTime<Utc> {
        match self {
            BaseData::Tick(t) => t.end_time(),
            BaseData::TradeBar(b) => b.end_time(),
            BaseData::Coarse(c) => c.end_time(),
        }
    }
}

impl From<Tick> for BaseData {
    fn from(tick: Tick) -> Self {
        BaseData::Tick(tick)
    }
}

impl From<TradeBar> for BaseData {
    fn from(bar: TradeBar) -> Self {
        BaseData::TradeBar(bar)
    }
}

impl From<CoarseFundamentalList> for BaseData {
    fn from(list: CoarseFundamentalList) -> Self {
        BaseData::Coarse(list)
    }
}
