//! Narrative business analysis through a chat-completion API.
//!
//! The kennel's [`BusinessMetrics`](kennel_core::BusinessMetrics) are sent
//! as JSON inside a user message, after a fixed system prompt that casts the
//! model as a business advisor covering finance, health, breeding, inventory
//! and operations. The answer is the first completion's text.

mod client;
mod error;
pub mod prompt;
pub mod types;

pub use client::{AnalysisClient, FALLBACK_ANALYSIS};
pub use error::AnalysisError;
pub use prompt::RenderedPrompt;
