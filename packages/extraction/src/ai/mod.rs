//! Language model implementations.
//!
//! Reference implementation of the [`LanguageModel`](crate::traits::llm::LanguageModel)
//! trait. Users can use it directly or implement their own.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAiModel;
