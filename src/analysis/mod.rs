//! Call transcript analysis
//!
//! Runs the multi-stage analysis pipeline over a diarized transcript, with
//! every stage routed through the tier's model chain.

pub mod models;
pub mod service;
pub mod speakers;

pub use models::{
    CallAnalysis, CallFlowAnalysis, CallTranscript, ConversationSummary, ConversationTurn,
    CustomerNeed, ModelUsage, Sentiment, SpeakerSentiment, Utterance,
};
pub use service::CallAnalyzer;
pub use speakers::{detect_customer_speaker, SpeakerRoles};
