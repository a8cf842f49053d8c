//! AI tutor relay
//!
//! Forwards study prompts to an OpenAI-compatible model provider and shapes
//! the free-form reply into the structure each request kind demands:
//! - explanation: trimmed free text
//! - flashcard: up to three `{front, back}` cards
//! - quiz: one multiple-choice question with four options

pub mod client;
pub mod json_parser;
pub mod prompts;
pub mod types;

pub use client::TutorClient;
pub use types::{
    Flashcard, QuizQuestion, TutorEnvelope, TutorError, TutorReply, TutorRequest, TutorTask,
};
