use crate::standardized_types::base_data::traits::MarketEvent;
use crate::standardized_types::symbol::Symbol;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_derive::{Deserialize, Serialize};

/// An OHLCV aggregate over a fixed time window for one symbol.
///
/// Invariant: `end_time - time == period`, asserted in [`TradeBar::new`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeBar {
    pub symbol: Symbol,
    pub time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    #[serde(with = "duration_as_millis")]
    pub period: Duration,
}

mod duration_as_millis {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(duration.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Ok(Duration::milliseconds(millis))
    }
}

impl TradeBar {
    pub fn new(
        symbol: Symbol,
        time: DateTime<Utc>,
        period: Duration,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        let end_time = time + period;
        debug_assert!(end_time >= time, "TradeBar end_time must not precede time");
        Self {
            symbol,
            time,
            end_time,
            open,
            high,
            low,
            close,
            volume,
            period,
        }
    }

    /// Builds a synthetic bar advanced by one fill-forward step from `self`: same
    /// OHLC (flat at the previous close), zero volume, shifted by `step`.
    pub fn fill_forward(&self, step: Duration) -> Self {
        Self {
            symbol: self.symbol.clone(),
            time: self.time + step,
            end_time: self.end_time + step,
            open: self.close,
            high: self.close,
            low: self.close,
            close: self.close,
            volume: Decimal::ZERO,
            period: self.period,
        }
    }
}

impl MarketEvent for TradeBar {
    fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }
}
