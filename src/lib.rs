pub mod config;
pub mod export;
pub mod fetch;
pub mod metrics;
pub mod process;
pub mod report;
pub mod state;
