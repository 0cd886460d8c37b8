use serde::{Deserialize, Serialize};

use crate::ai::ClassifyError;
use crate::domain::{Classification, Likelihood};

const SYSTEM_PROMPT: &str = r#"You judge whether a social-media post was written by a language model. Consider formulaic reframing ("this isn't just X, it's Y"), uniform sentence rhythm, hollow engagement hooks, and generic hashtag padding. Human markers include typos, slang, specific personal detail, and uneven structure.

Respond with a JSON object of exactly this shape: {"likelihood": "low" | "medium" | "high" | "certain", "reason": "<one short sentence>"}"#;

pub fn build_request(model: String, text: &str) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system".into(),
                content: SYSTEM_PROMPT.into(),
            },
            ChatMessage {
                role: "user".into(),
                content: text.to_string(),
            },
        ],
        temperature: 0.2,
        max_tokens: 256,
        response_format: ResponseFormat {
            r#type: "json_object".into(),
        },
    }
}

/// Parses a chat-completion body down to a verdict. Anything that deviates
/// from the expected shape is a `Malformed`/`EmptyResponse`/`UnknownLabel`
/// error; the caller treats all of them like a provider failure.
pub fn parse_completion(body: &str) -> Result<Classification, ClassifyError> {
    if body.trim().is_empty() {
        return Err(ClassifyError::EmptyResponse);
    }
    let completion: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|err| ClassifyError::Malformed(err.to_string()))?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or(ClassifyError::EmptyResponse)?;

    let verdict: VerdictPayload = serde_json::from_str(&content)
        .map_err(|err| ClassifyError::Malformed(err.to_string()))?;

    let likelihood = Likelihood::parse(&verdict.likelihood)
        .ok_or_else(|| ClassifyError::UnknownLabel(verdict.likelihood.clone()))?;

    Ok(Classification {
        likelihood,
        reason: verdict.reason,
    })
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: i32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub r#type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatCompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerdictPayload {
    likelihood: String,
    reason: String,
}
