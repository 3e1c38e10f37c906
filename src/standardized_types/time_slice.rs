use crate::standardized_types::base_data::base_data_enum::BaseData;
use crate::standardized_types::security_changes::SecurityChanges;
use crate::standardized_types::symbol::Symbol;
use chrono::{DateTime, Utc};

/// Immutable snapshot of per-symbol data emitted at a single frontier instant.
///
/// `data` preserves insertion order (the order subscriptions were iterated while
/// building the slice), not sorted-by-symbol order — a plain `Vec` is the ordered
/// mapping the spec calls for, rather than a hash map.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSlice {
    pub time: DateTime<Utc>,
    pub data: Vec<(Symbol, BaseData)>,
    pub security_changes: SecurityChanges,
}

impl TimeSlice {
    pub fn is_heartbeat(&self) -> bool {
        self.data.is_empty() && self.security_changes.is_empty()
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&BaseData> {
        self.data.iter().find(|(s, _)| s == symbol).map(|(_, d)| d)
    }
}

/// Freezes a set of `(symbol, data)` pairs gathered during one frontier iteration,
/// together with the universe changes observed in that same window, into an
/// immutable [`TimeSlice`].
///
/// `algorithm`/`cash_book` inputs named in spec.md section 4.9 belong to the
/// downstream algorithm runtime (an explicit external collaborator per section 1)
/// and carry no fields of their own into the slice; this builder only takes what
/// the slice itself needs to exist.
pub struct TimeSliceBuilder;

impl TimeSliceBuilder {
    pub fn build(
        emit_time: DateTime<Utc>,
        data: Vec<(Symbol, BaseData)>,
        security_changes: SecurityChanges,
    ) -> TimeSlice {
        TimeSlice {
            time: emit_time,
            data,
            security_changes,
        }
    }
}
