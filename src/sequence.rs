use crate::standardized_types::base_data::base_data_enum::BaseData;

/// The "live sequence" idiom spec.md section 9 calls out explicitly: `advance()`
/// returns `true` to mean "not terminated", not "an item is available". Inspect
/// [`current`](LiveSequence::current) separately — it may be absent on an iteration
/// where `advance` still returned `true`. This deliberately does not implement
/// `std::iter::Iterator`, whose contract conflates "no item now" with "done forever".
pub trait LiveSequence: Send {
    /// Advances the sequence by one step. Returns `false` only once the sequence has
    /// permanently terminated; every other outcome — including "nothing ready yet" —
    /// returns `true`.
    fn advance(&mut self) -> bool;

    /// The item produced by the most recent `advance()`, if any.
    fn current(&self) -> Option<BaseData>;
}

impl LiveSequence for Box<dyn LiveSequence> {
    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn current(&self) -> Option<BaseData> {
        (**self).current()
    }
}
