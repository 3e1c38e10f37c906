use crate::standardized_types::symbol::{SecurityType, Symbol};
use chrono::Duration;
use chrono_tz::Tz;
use serde_derive::{Deserialize, Serialize};

/// The bar cadence a subscription aggregates at. `Ticks` means no aggregation at all —
/// the subscription's source is a direct enqueue-enumerator (C2), not a tick aggregator (C3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum Resolution {
    Ticks,
    Seconds(u32),
    Minutes(u32),
    Hours(u32),
}

impl Resolution {
    /// The window size this resolution aggregates over; `None` for tick resolution,
    /// which has no bar window.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Resolution::Ticks => None,
            Resolution::Seconds(n) => Some(Duration::seconds(*n as i64)),
            Resolution::Minutes(n) => Some(Duration::minutes(*n as i64)),
            Resolution::Hours(n) => Some(Duration::hours(*n as i64)),
        }
    }

    pub fn is_tick(&self) -> bool {
        matches!(self, Resolution::Ticks)
    }
}

/// Which kind of data a subscription's pipeline ultimately produces.
///
/// `Universe` subscriptions carry coarse-fundamental payloads rather than a single
/// symbol's bars; the "custom data" branch from section 4.8 is represented by an
/// injected reader at construction time and is not a variant here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionDataType {
    Tick,
    TradeBar,
    Universe,
}

/// Immutable description of one subscription, exactly as spec.md section 3 describes it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    pub symbol: Symbol,
    pub security_type: SecurityType,
    pub resolution: Resolution,
    #[serde(with = "duration_as_millis")]
    pub increment: Duration,
    pub time_zone: Tz,
    pub is_custom_data: bool,
    pub fill_data_forward: bool,
    pub extended_market_hours: bool,
    pub data_type: SubscriptionDataType,
}

impl SubscriptionConfig {
    pub fn new(
        symbol: Symbol,
        resolution: Resolution,
        time_zone: Tz,
        data_type: SubscriptionDataType,
        fill_data_forward: bool,
        extended_market_hours: bool,
    ) -> Self {
        let security_type = symbol.security_type;
        let increment = resolution.as_duration().unwrap_or_else(|| Duration::milliseconds(1));
        Self {
            symbol,
            security_type,
            resolution,
            increment,
            time_zone,
            is_custom_data: false,
            fill_data_forward,
            extended_market_hours,
            data_type,
        }
    }

    /// Marks this config as sourced from a caller-injected reader rather than the
    /// exchange (spec.md 4.8's "custom data" branch) — required by
    /// `LiveDataFeed::add_custom_data_subscription`.
    pub fn with_custom_data(mut self) -> Self {
        self.is_custom_data = true;
        self
    }
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
