//! Data types for the extraction library.

pub mod confidence;
pub mod config;
pub mod content;
pub mod quality;
pub mod record;
pub mod session;
pub mod stored;
