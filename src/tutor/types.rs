//! Tutor relay data types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of tutoring content a prompt asks for.
///
/// Each kind selects its own system instructions, token budget, and reply
/// shape; the shape is enforced, not inferred from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TutorTask {
    Explanation,
    Flashcard,
    Quiz,
}

/// A prompt submitted to the tutor relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorRequest {
    pub prompt: String,
    #[serde(rename = "type")]
    pub task: TutorTask,
    /// AP subject the tutoring persona is framed around, e.g. "AP Biology"
    pub subject: String,
}

/// One generated flashcard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// One generated multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index of the correct entry in `options`
    pub correct_answer: u8,
}

/// Shaped reply, one variant per request kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorReply {
    Explanation(String),
    Flashcards(Vec<Flashcard>),
    Quiz(QuizQuestion),
}

impl TutorReply {
    /// Wire form of the reply: free text for explanations, serialized JSON
    /// for the structured kinds (the shape the study screens consume).
    pub fn to_wire_string(&self) -> String {
        match self {
            Self::Explanation(text) => text.clone(),
            Self::Flashcards(cards) => serde_json::to_string(cards).unwrap_or_default(),
            Self::Quiz(quiz) => serde_json::to_string(quiz).unwrap_or_default(),
        }
    }
}

/// Tutor relay failure taxonomy
#[derive(Debug, Clone, Error)]
pub enum TutorError {
    /// No provider credential in the environment
    #[error("No AI API key configured")]
    MissingApiKey,
    /// Provider signalled 429
    #[error("Rate limit reached. Please try again in a moment.")]
    RateLimited,
    /// Provider signalled 402
    #[error("AI usage limit reached. Please add credits to continue.")]
    CreditsExhausted,
    /// Provider rejected the request for any other reason
    #[error("{0}")]
    Upstream(String),
    /// Network or protocol failure before a reply arrived
    #[error("Request failed: {0}")]
    Transport(String),
    /// A reply arrived but no payload of the expected shape could be recovered
    #[error("Failed to parse AI response as valid JSON. Please try again.")]
    MalformedOutput {
        /// Leading excerpt of the raw reply, for diagnosis
        debug: String,
    },
}

impl TutorError {
    /// HTTP status the relay envelope reports for this error
    pub fn status(&self) -> u16 {
        match self {
            Self::RateLimited => 429,
            Self::CreditsExhausted => 402,
            _ => 500,
        }
    }
}

/// JSON envelope of the relay's HTTP contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl TutorEnvelope {
    /// Envelope plus the HTTP status it travels with
    pub fn from_result(result: &Result<TutorReply, TutorError>) -> (Self, u16) {
        match result {
            Ok(reply) => (
                Self {
                    success: true,
                    response: Some(reply.to_wire_string()),
                    error: None,
                    debug: None,
                },
                200,
            ),
            Err(err) => {
                let debug = match err {
                    TutorError::MalformedOutput { debug } => Some(debug.clone()),
                    _ => None,
                };
                (
                    Self {
                        success: false,
                        response: None,
                        error: Some(err.to_string()),
                        debug,
                    },
                    err.status(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(TutorError::RateLimited.status(), 429);
        assert_eq!(TutorError::CreditsExhausted.status(), 402);
        assert_eq!(TutorError::MissingApiKey.status(), 500);
        assert_eq!(TutorError::Upstream("boom".into()).status(), 500);
    }

    #[test]
    fn test_success_envelope_serializes_reply() {
        let reply = TutorReply::Flashcards(vec![Flashcard {
            front: "What is ATP?".into(),
            back: "The cell's energy currency".into(),
        }]);
        let (envelope, status) = TutorEnvelope::from_result(&Ok(reply));

        assert_eq!(status, 200);
        assert!(envelope.success);
        let response = envelope.response.unwrap();
        assert!(response.starts_with('['));
        assert!(response.contains("\"front\""));
        assert_eq!(envelope.error, None);
    }

    #[test]
    fn test_malformed_envelope_carries_debug_excerpt() {
        let err = TutorError::MalformedOutput {
            debug: "not json at all".into(),
        };
        let (envelope, status) = TutorEnvelope::from_result(&Err(err));

        assert_eq!(status, 500);
        assert!(!envelope.success);
        assert_eq!(envelope.debug.as_deref(), Some("not json at all"));
    }

    #[test]
    fn test_task_wire_names() {
        assert_eq!(
            serde_json::to_string(&TutorTask::Flashcard).unwrap(),
            "\"flashcard\""
        );
        let request: TutorRequest =
            serde_json::from_str(r#"{"prompt":"p","type":"quiz","subject":"AP Chemistry"}"#)
                .unwrap();
        assert_eq!(request.task, TutorTask::Quiz);
    }
}
