use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::image_io::{DATA_URI_MIME, EncodeError, data_uri, encode_image};
use crate::session::{ChatMessage, Role};

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("no image to analyze")]
    EmptyImage,
    #[error("could not reach the completion endpoint: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("the completion endpoint rejected the API key (HTTP {0})")]
    Unauthorized(StatusCode),
    #[error("rate limited by the completion endpoint")]
    RateLimited,
    #[error("completion endpoint returned HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

impl From<EncodeError> for CompletionError {
    fn from(_: EncodeError) -> Self {
        Self::EmptyImage
    }
}

impl CompletionError {
    /// Short message for the inline error notice.
    #[must_use]
    pub fn user_notice(&self) -> String {
        match self {
            Self::EmptyImage => "Pick or take a photo first.".into(),
            Self::Transport(e) if e.is_timeout() => {
                "The recipe service took too long to answer. Please try again.".into()
            }
            Self::Transport(_) => "Could not reach the recipe service. Please try again.".into(),
            Self::Unauthorized(_) => {
                "The recipe service rejected our credentials. Check the API key.".into()
            }
            Self::RateLimited => {
                "The recipe service is busy right now. Wait a moment and try again.".into()
            }
            Self::Http { status, .. } => {
                format!("The recipe service failed (HTTP {status}). Please try again.")
            }
            Self::Malformed(_) => {
                "The recipe service sent an unreadable answer. Please try again.".into()
            }
        }
    }
}

/* ---------- wire format ---------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub role: Role,
    pub content: Content,
}

impl From<ChatMessage> for OutgoingMessage {
    fn from(m: ChatMessage) -> Self {
        Self {
            role: m.role,
            content: Content::Text(m.content),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<OutgoingMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/* ---------- client ---------- */

#[derive(Debug, Clone)]
pub struct LlmClient {
    pub base: String,
    pub token: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
    pub analysis_prompt: String,
    http: reqwest::Client,
}

impl LlmClient {
    #[must_use]
    pub fn new(base: String, token: String, model: String, http: reqwest::Client) -> Self {
        Self {
            base,
            token,
            model,
            max_tokens: None,
            timeout: Duration::from_secs(120),
            analysis_prompt: crate::config::DEFAULT_ANALYSIS_PROMPT.to_string(),
            http,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        Self {
            base: config.llm_api_url.clone(),
            token: config.llm_api_key.clone().unwrap_or_default(),
            model: config.llm_model.clone(),
            max_tokens: Some(config.llm_max_tokens),
            timeout: config.llm_timeout(),
            analysis_prompt: config.analysis_prompt.clone(),
            http,
        }
    }

    /// One user message holding the chef instruction and the photo as a data URI.
    ///
    /// # Errors
    ///
    /// Returns Err if `image` is empty
    pub fn analysis_request(&self, image: &[u8]) -> Result<CompletionRequest, CompletionError> {
        let b64 = encode_image(image)?;
        let content = Content::Parts(vec![
            ContentPart::Text {
                text: self.analysis_prompt.clone(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: data_uri(DATA_URI_MIME, &b64),
                },
            },
        ]);

        Ok(CompletionRequest {
            model: self.model.clone(),
            messages: vec![OutgoingMessage {
                role: Role::User,
                content,
            }],
            max_tokens: self.max_tokens,
        })
    }

    /// The recipe travels as a system message; earlier chat turns are not resent.
    #[must_use]
    pub fn chat_request(&self, recipe: Option<&str>, message: &str) -> CompletionRequest {
        let mut messages: Vec<OutgoingMessage> = Vec::with_capacity(2);
        if let Some(recipe) = recipe {
            messages.push(ChatMessage::system(format!("The current recipe is: {recipe}")).into());
        }
        messages.push(ChatMessage::user(message).into());

        CompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
        }
    }

    /// Ask the model for the ingredients in a photo and a recipe using them.
    ///
    /// # Errors
    ///
    /// Returns Err if the image is empty or the completion call fails
    pub async fn analyze_image(&self, image: &[u8]) -> Result<String, CompletionError> {
        let req = self.analysis_request(image)?;
        self.complete(&req).await
    }

    /// Answer a follow-up question about the current recipe.
    ///
    /// `history` is the transcript so far; it is not part of the request.
    ///
    /// # Errors
    ///
    /// Returns Err if the completion call fails
    pub async fn send_chat_message(
        &self,
        history: &[ChatMessage],
        recipe: Option<&str>,
        message: &str,
    ) -> Result<String, CompletionError> {
        tracing::debug!(
            prior_turns = history.len(),
            with_recipe = recipe.is_some(),
            "chat request"
        );
        let req = self.chat_request(recipe, message);
        self.complete(&req).await
    }

    /// Send one completion request and return the reply text.
    ///
    /// # Errors
    ///
    /// Returns Err on transport failure, a non-2xx status, or a reply without text content
    pub async fn complete(&self, body: &CompletionRequest) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base.trim_end_matches('/'));
        let started = Instant::now();

        let mut req = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .json(body);

        if !self.token.trim().is_empty() {
            req = req.bearer_auth(&self.token);
        }

        let result = send(req).await;

        let latency_ms = started.elapsed().as_millis();
        match &result {
            Ok(reply) => tracing::info!(
                model = %self.model,
                messages = body.messages.len(),
                reply_chars = reply.chars().count(),
                latency_ms,
                "completion ok"
            ),
            Err(e) => tracing::warn!(
                model = %self.model,
                messages = body.messages.len(),
                latency_ms,
                error = %e,
                "completion failed"
            ),
        }
        result
    }
}

async fn send(req: reqwest::RequestBuilder) -> Result<String, CompletionError> {
    let resp = req.send().await?;
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let text = check_status(status, text)?;
    extract_content(&text)
}

fn check_status(status: StatusCode, body: String) -> Result<String, CompletionError> {
    match status {
        s if s.is_success() => Ok(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(CompletionError::Unauthorized(status))
        }
        StatusCode::TOO_MANY_REQUESTS => Err(CompletionError::RateLimited),
        _ => Err(CompletionError::Http {
            status,
            body: body.chars().take(500).collect(),
        }),
    }
}

/// Pull `choices[0].message.content` out of a chat-completions envelope.
///
/// # Errors
///
/// Returns Err if the body is not JSON or carries no text content
pub fn extract_content(body: &str) -> Result<String, CompletionError> {
    let envelope: JsonValue = serde_json::from_str(body)
        .map_err(|e| CompletionError::Malformed(format!("invalid JSON: {e}")))?;

    envelope
        .pointer("/choices/0/message/content")
        .and_then(JsonValue::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| CompletionError::Malformed("response missing content".into()))
}
