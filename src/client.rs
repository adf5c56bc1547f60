//! Client for the hosted multimodal model
//!
//! This module performs the one external call the application makes: an
//! invoice image plus a question go out to Gemini's `generateContent`
//! endpoint, and the generated text comes back.
//!
//! # Request Flow
//!
//! ```text
//! ImagePayload + question
//!     │
//!     ├─> One user turn: [instruction text, inline image, question text]
//!     │
//!     ├─> HTTP POST {base_url}/models/{model}:generateContent
//!     │       (credential in the x-goog-api-key header)
//!     │
//!     ├─> Non-2xx status → Error::Api with the service's message
//!     │
//!     └─> Text parts of the first candidate, concatenated
//! ```
//!
//! There is no retry and no streaming. A failed call is reported once and the
//! client stays usable for the next submission.
//!
//! # Examples
//!
//! ```rust,no_run
//! use invoice_qa::{GeminiClient, QaOptions, UploadedImage, prepare_image};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new(QaOptions::builder().api_key("AIza...").build()?)?;
//!
//! let upload = UploadedImage::new("image/png", std::fs::read("invoice.png")?);
//! let image = prepare_image(Some(upload)).ok_or("empty upload")?;
//!
//! let answer = client
//!     .generate(&client.options().system_prompt, &image, "What is the total amount?")
//!     .await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

use crate::image::ImagePayload;
use crate::types::{
    ApiErrorBody, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    Part, QaOptions,
};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Anything that can answer a question about an invoice image.
///
/// The submission pipeline and the web layer only see this trait, so tests
/// can swap the hosted model for an in-process fake.
#[async_trait]
pub trait InvoiceModel: Send + Sync {
    async fn answer(&self, image: &ImagePayload, question: &str) -> Result<String>;
}

/// One-shot question about an invoice without keeping a client around.
///
/// Builds a temporary [`GeminiClient`] and sends the configured system
/// instruction, the image and the question. Prefer [`GeminiClient`] when
/// answering more than one question, since it reuses connections.
pub async fn ask(image: &ImagePayload, question: &str, options: &QaOptions) -> Result<String> {
    let client = GeminiClient::new(options.clone())?;
    client.answer(image, question).await
}

/// Reusable client for Gemini's `generateContent`.
pub struct GeminiClient {
    options: QaOptions,

    /// Configured once with the timeout from `QaOptions`; reused for
    /// connection pooling across submissions.
    http_client: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Creates a client from validated options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn new(options: QaOptions) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            options,
            http_client,
        })
    }

    pub fn options(&self) -> &QaOptions {
        &self.options
    }

    /// Request body for one invoice question
    pub fn build_request(
        &self,
        instruction: &str,
        image: &ImagePayload,
        question: &str,
    ) -> GenerateContentRequest {
        let generation_config =
            if self.options.temperature.is_some() || self.options.max_output_tokens.is_some() {
                Some(GenerationConfig {
                    temperature: self.options.temperature,
                    max_output_tokens: self.options.max_output_tokens,
                })
            } else {
                None
            };

        GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::text(instruction),
                image.to_part(),
                Part::text(question),
            ])],
            generation_config,
        }
    }

    /// Sends one `generateContent` call and returns the generated text.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] when the configured timeout elapses
    /// - [`Error::Http`] for network failures
    /// - [`Error::Api`] for non-2xx statuses (bad key, quota, rejected image)
    ///   and for responses that carry no text
    /// - [`Error::Json`] when the body is not a `generateContent` response
    pub async fn generate(
        &self,
        instruction: &str,
        image: &ImagePayload,
        question: &str,
    ) -> Result<String> {
        let request = self.build_request(instruction, image, question);

        log::debug!(
            "Calling model {} with {} image ({} bytes) and {}-char question",
            self.options.model,
            image.mime_type(),
            image.len(),
            question.chars().count()
        );

        let response = self
            .http_client
            .post(self.options.generate_content_url())
            .header(API_KEY_HEADER, &self.options.api_key)
            .json(&request)
            .send()
            .await
            .map_err(Error::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::from_transport)?;

        if !status.is_success() {
            return Err(Error::api(describe_api_error(status, &body)));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        match parsed.text() {
            Some(text) => Ok(text),
            None => Err(Error::api(match parsed.stop_reason() {
                Some(reason) => format!("model returned no text (reason: {})", reason),
                None => "model returned no text".to_string(),
            })),
        }
    }
}

#[async_trait]
impl InvoiceModel for GeminiClient {
    async fn answer(&self, image: &ImagePayload, question: &str) -> Result<String> {
        self.generate(&self.options.system_prompt, image, question)
            .await
    }
}

/// Status plus the service's own message when the body is its error envelope
fn describe_api_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            format!("{}: {}", status, envelope.error.message)
        }
        _ if body.trim().is_empty() => status.to_string(),
        _ => format!("{}: {}", status, body.trim()),
    }
}
