use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;

/// Abstracts "now" so the rest of the engine never calls `Utc::now()` directly.
///
/// Every component that needs to ask "is it time to …?" takes a `&dyn TimeProvider`
/// (or a concrete `Arc<impl TimeProvider>`) instead of reaching for the system clock,
/// so a whole feed can be driven deterministically in tests via [`ManualTimeProvider`].
pub trait TimeProvider: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock. Used in production wiring.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable instant for deterministic tests.
///
/// `advance` moves the clock forward by a duration; `set_time` accepts a naive wall
/// clock reading in a given timezone and converts it to UTC, matching how the
/// scenarios in spec.md section 8 specify times ("2015-10-08 12:00:00 NYC").
#[derive(Debug)]
pub struct ManualTimeProvider {
    current: RwLock<DateTime<Utc>>,
}

impl ManualTimeProvider {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: RwLock::new(start),
        }
    }

    /// Builds a manual clock from a local wall-clock reading in `tz`.
    pub fn from_local(tz: Tz, naive: chrono::NaiveDateTime) -> Self {
        let local = tz.from_local_datetime(&naive).single().expect(
            "ambiguous or nonexistent local time; pick an unambiguous instant for tests",
        );
        Self::new(local.with_timezone(&Utc))
    }

    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.current.write() = time;
    }

    /// Sets the clock from a naive local reading in `tz`, converting to UTC.
    pub fn set_local(&self, tz: Tz, naive: chrono::NaiveDateTime) {
        let local = tz
            .from_local_datetime(&naive)
            .single()
            .expect("ambiguous or nonexistent local time");
        self.set_time(local.with_timezone(&Utc));
    }

    pub fn advance(&self, delta: Duration) {
        let mut guard = self.current.write();
        *guard += delta;
    }
}

impl TimeProvider for ManualTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        *self.current.read()
    }
}
