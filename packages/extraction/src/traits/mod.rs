//! Core trait abstractions for the extraction library.
//!
//! These traits define the collaborator seams: fetching pages, calling a
//! language model, and persisting results and session snapshots.

pub mod fetcher;
pub mod llm;
pub mod store;
