pub mod bridge;
pub mod config;
pub mod data_queue_handler;
pub mod enqueue_enumerator;
pub mod error;
pub mod exchange;
pub mod feed;
pub mod fill_forward;
pub mod helpers;
pub mod sequence;
pub mod standardized_types;
pub mod subscription;
pub mod subscription_filter;
pub mod tick_aggregator;
pub mod time;
