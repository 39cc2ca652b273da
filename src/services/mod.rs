pub mod paper_client;
pub mod session;
