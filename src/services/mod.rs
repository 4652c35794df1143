pub mod dashboard;
pub mod holders;
pub mod metrics;
pub mod sim_client;
