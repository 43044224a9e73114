pub mod config;
pub mod logging;

pub mod control;
pub mod fetch;
pub mod metadata_store;
pub mod orchestrator;
pub mod pool;
pub mod progress;
pub mod retry;
pub mod retry_ledger;
pub mod url_model;
