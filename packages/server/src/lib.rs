// Extraction API - server core
//
// HTTP surface and CLI wiring for the quality-gated extraction pipeline.
// Batches run on background tasks; progress is read back from the store.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
