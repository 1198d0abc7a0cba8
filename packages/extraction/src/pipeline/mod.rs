//! Extraction pipeline.
//!
//! Stages, in order for every URL:
//! - [`classify`]: quality gate, pure and deterministic
//! - [`extract`]: one language model call per qualifying page
//! - [`score`]: blend model confidence with field completeness
//! - [`session`]: per-batch state machine and counters
//! - [`batch`]: bounded worker pool driving the stages above

pub mod batch;
pub mod classify;
pub mod extract;
pub mod prompts;
pub mod score;
pub mod session;

pub use batch::{BatchRunner, CANCELLED_REASON};
pub use classify::QualityClassifier;
pub use extract::{parse_json_object, ExtractionRequester};
pub use prompts::{format_system_prompt, format_user_prompt, truncate_content};
pub use score::ConfidenceScorer;
pub use session::SessionTracker;
