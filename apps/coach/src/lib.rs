pub mod config;
pub mod errors;
pub mod format;
pub mod ingest;
pub mod interview;
pub mod llm_client;
pub mod sanitize;
pub mod session;
pub mod state;
pub mod store;
