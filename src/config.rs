use serde_derive::{Deserialize, Serialize};
use std::time::Duration;

/// Engine-tunable knobs the distilled spec left as hardcoded constants (sections 4.6
/// and 4.8): the dispatcher's empty-poll backoff and the frontier's tick/heartbeat
/// sleep increments. Loadable from a TOML file via `toml`/`serde`, matching the
/// teacher's configuration convention elsewhere in the stack (`toml` + `serde_derive`
/// are teacher dependencies used the same way for its own settings files).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Name of the upstream `DataQueueHandler` adapter to instantiate; resolved by
    /// the caller, not by this crate (the concrete adapter is an external
    /// collaborator per spec.md section 1).
    #[serde(rename = "data-queue-handler")]
    pub data_queue_handler: String,

    #[serde(rename = "dispatcher-backoff", with = "duration_millis")]
    pub dispatcher_backoff: Duration,

    #[serde(rename = "frontier-tick-sleep", with = "duration_millis")]
    pub frontier_tick_sleep: Duration,

    #[serde(rename = "frontier-heartbeat-sleep", with = "duration_millis")]
    pub frontier_heartbeat_sleep: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            data_queue_handler: String::new(),
            dispatcher_backoff: Duration::from_millis(5),
            frontier_tick_sleep: Duration::from_millis(1),
            frontier_heartbeat_sleep: Duration::from_secs(1),
        }
    }
}

impl FeedConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
