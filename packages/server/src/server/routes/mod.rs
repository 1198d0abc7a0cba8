// HTTP routes
pub mod config;
pub mod health;
pub mod results;
pub mod scrape;
pub mod sessions;
pub mod stats;

pub use config::*;
pub use health::*;
pub use results::*;
pub use scrape::*;
pub use sessions::*;
pub use stats::*;
