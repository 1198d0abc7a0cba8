//! Kernel module - server infrastructure and dependencies.

pub mod batches;
pub mod deps;

pub use batches::BatchRegistry;
pub use deps::{create_fetcher, create_model, create_server_deps, create_store, ServerDeps};
