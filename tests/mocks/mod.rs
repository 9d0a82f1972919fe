//! Mock infrastructure for the model provider APIs
//!
//! Wiremock servers standing in for:
//! - OpenAI chat completions
//! - Anthropic messages
//! - Google Gemini generateContent
//!
//! Each mock supports success, HTTP error, slow and malformed responses, and
//! can match on a substring of the request body so concurrent pipeline
//! stages get their own answers.

pub mod anthropic;
pub mod google;

pub use anthropic::*;
pub use google::*;
pub use openai::*;
