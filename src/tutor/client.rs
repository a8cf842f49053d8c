//! OpenAI-compatible chat client for the tutor relay

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::json_parser::extract_json_span;
use super::prompts;
use super::types::{Flashcard, QuizQuestion, TutorError, TutorReply, TutorRequest, TutorTask};
use crate::http_client;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_MODEL: &str = "gpt-4o-mini";

const GATEWAY_API_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
const GATEWAY_MODEL: &str = "google/gemini-2.0-flash-exp";

/// Maximum flashcards returned per request
const MAX_FLASHCARDS: usize = 3;

/// Characters of the raw reply kept in malformed-output diagnostics
const DEBUG_EXCERPT_CHARS: usize = 200;

/// Message in conversation
#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// API request body
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// API error response
#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Tutor relay client bound to one provider endpoint
#[derive(Debug)]
pub struct TutorClient {
    api_url: &'static str,
    model: &'static str,
    api_key: String,
}

impl TutorClient {
    /// Resolve the provider from the environment.
    ///
    /// `OPENAI_API_KEY` selects OpenAI; otherwise `LOVABLE_API_KEY` selects
    /// the gateway fallback. Neither present is a configuration error.
    pub fn from_env() -> Result<Self, TutorError> {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                return Ok(Self {
                    api_url: OPENAI_API_URL,
                    model: OPENAI_MODEL,
                    api_key: key,
                });
            }
        }

        match std::env::var("LOVABLE_API_KEY") {
            Ok(key) if !key.is_empty() => Ok(Self {
                api_url: GATEWAY_API_URL,
                model: GATEWAY_MODEL,
                api_key: key,
            }),
            _ => Err(TutorError::MissingApiKey),
        }
    }

    /// Model identifier this client sends requests to
    pub fn model(&self) -> &str {
        self.model
    }

    /// Forward a prompt to the provider and shape the reply for its task
    pub async fn generate(&self, request: &TutorRequest) -> Result<TutorReply, TutorError> {
        let system = prompts::system_message(request.task, &request.subject);

        debug!(
            task = ?request.task,
            subject = %request.subject,
            model = self.model,
            "Generating tutor content"
        );

        let body = ChatRequest {
            model: self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: prompts::max_tokens(request.task),
            temperature: 0.7,
        };

        let response = http_client::tutor_client()
            .post(self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TutorError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, "AI API error: {}", error_text);

            return Err(match status.as_u16() {
                429 => TutorError::RateLimited,
                402 => TutorError::CreditsExhausted,
                _ => {
                    let message = serde_json::from_str::<ApiError>(&error_text)
                        .map(|e| e.error.message)
                        .unwrap_or_else(|_| "Failed to get AI response".to_string());
                    TutorError::Upstream(message)
                }
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| TutorError::Transport(e.to_string()))?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TutorError::Upstream("Failed to get AI response".to_string()))?;

        shape_reply(request.task, &content)
    }
}

/// Shape raw model text into the reply its task demands
fn shape_reply(task: TutorTask, raw: &str) -> Result<TutorReply, TutorError> {
    match task {
        TutorTask::Explanation => Ok(TutorReply::Explanation(raw.trim().to_string())),
        TutorTask::Flashcard => {
            let span = extract_json_span(raw).map_err(|_| malformed(raw))?;
            let entries: Vec<serde_json::Value> =
                serde_json::from_str(&span).map_err(|_| malformed(raw))?;

            // Entries missing either side are dropped rather than failing the batch
            let cards: Vec<Flashcard> = entries
                .into_iter()
                .filter_map(|entry| serde_json::from_value(entry).ok())
                .take(MAX_FLASHCARDS)
                .collect();

            if cards.is_empty() {
                return Err(malformed(raw));
            }
            Ok(TutorReply::Flashcards(cards))
        }
        TutorTask::Quiz => {
            let span = extract_json_span(raw).map_err(|_| malformed(raw))?;
            let quiz: QuizQuestion = serde_json::from_str(&span).map_err(|_| malformed(raw))?;
            Ok(TutorReply::Quiz(quiz))
        }
    }
}

fn malformed(raw: &str) -> TutorError {
    TutorError::MalformedOutput {
        debug: raw.chars().take(DEBUG_EXCERPT_CHARS).collect(),
    }
}
