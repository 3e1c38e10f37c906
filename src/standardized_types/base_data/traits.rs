use crate::standardized_types::symbol::Symbol;
use chrono::{DateTime, Utc};

/// Shared surface over every [`BaseData`](super::base_data_enum::BaseData) variant.
///
/// Mirrors the teacher's `BaseData` trait on `BaseDataEnum`: the frontier loop and
/// subscription filter only ever need a symbol and a time window, never the variant's
/// own fields, so they operate against this trait instead of matching on the enum.
pub trait MarketEvent {
    fn symbol(&self) -> &Symbol;
    fn time(&self) -> DateTime<Utc>;
    fn end_time(&self) -> DateTime<Utc>;
}
