pub mod base_data_enum;
pub mod coarse;
pub mod tick;
pub mod trade_bar;
pub mod traits;
