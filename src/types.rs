//! Core types for invoice-qa

use serde::{Deserialize, Serialize};

/// Instruction sent ahead of every invoice question.
pub const INVOICE_INSTRUCTION: &str = "You are an expert in understanding invoices.
You will receive input images as invoices &
you will have to answer questions based on the input image.";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini REST endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Options for the model invocation
#[derive(Clone)]
pub struct QaOptions {
    /// Instruction text placed before the image
    pub system_prompt: String,

    /// Model name (e.g., "gemini-1.5-flash")
    pub model: String,

    /// API root, without trailing slash
    pub base_url: String,

    /// API key for the hosted model service
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Sampling temperature (None uses service default)
    pub temperature: Option<f32>,

    /// Maximum tokens to generate (None uses service default)
    pub max_output_tokens: Option<u32>,
}

impl std::fmt::Debug for QaOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaOptions")
            .field("system_prompt", &self.system_prompt)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl QaOptions {
    /// Create a new builder for QaOptions
    pub fn builder() -> QaOptionsBuilder {
        QaOptionsBuilder::default()
    }

    /// Full URL of the `generateContent` call for the configured model
    pub fn generate_content_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Builder for QaOptions
#[derive(Default)]
pub struct QaOptionsBuilder {
    system_prompt: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<u64>,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl std::fmt::Debug for QaOptionsBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaOptionsBuilder")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl QaOptionsBuilder {
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn build(self) -> crate::Result<QaOptions> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| crate::Error::config("api_key is required"))?;

        let timeout = self.timeout.unwrap_or(60);
        if timeout == 0 {
            return Err(crate::Error::config("timeout must be at least 1 second"));
        }

        if let Some(temp) = self.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(crate::Error::config(format!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    temp
                )));
            }
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(QaOptions {
            system_prompt: self
                .system_prompt
                .unwrap_or_else(|| INVOICE_INSTRUCTION.to_string()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url,
            api_key,
            timeout,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        })
    }
}

/// An image exactly as it was uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub file_name: Option<String>,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: None,
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

/// One form submission: the optional upload and the typed question
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceRequest {
    pub image: Option<UploadedImage>,
    pub question: String,
}

impl InvoiceRequest {
    pub fn new(image: Option<UploadedImage>, question: impl Into<String>) -> Self {
        Self {
            image,
            question: question.into(),
        }
    }

    /// Both an image and a non-blank question were supplied
    pub fn is_complete(&self) -> bool {
        self.image.is_some() && !self.question.trim().is_empty()
    }
}

/// Result of a single submission, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    Success { answer: String },
    Warning { message: String },
    Error { message: String },
}

impl Outcome {
    pub fn success(answer: impl Into<String>) -> Self {
        Outcome::Success {
            answer: answer.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Outcome::Warning {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Error {
            message: message.into(),
        }
    }
}

// ============================================================================
// GEMINI WIRE FORMAT
// ============================================================================

/// `generateContent` request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// A turn of content with its parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }
}

/// A single part: text or inline binary data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    /// Parts this crate does not interpret (function calls, executable code, ...)
    Other(serde_json::Value),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } | Part::Other(_) => None,
        }
    }
}

/// Base64 data with its MIME type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Sampling settings
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// `generateContent` response body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().filter_map(Part::as_text).collect();
        if text.is_empty() { None } else { Some(text) }
    }

    /// Why no text came back, when the service said so
    pub fn stop_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
            .or_else(|| {
                self.candidates
                    .first()
                    .and_then(|c| c.finish_reason.as_deref())
            })
    }
}

/// Error envelope returned with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}
