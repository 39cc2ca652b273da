pub mod cors;
pub mod metrics;
pub mod request_id;
