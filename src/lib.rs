//! # invoice-qa
//!
//! Ask questions about an invoice image. A single-page web form takes an
//! uploaded invoice (JPEG or PNG) and a natural-language question, forwards
//! both verbatim to a hosted multimodal model (Google Gemini), and shows the
//! model's text answer.
//!
//! ## Overview
//!
//! Each submission goes through three steps:
//!
//! 1. **Presentation** collects the image file and the question
//! 2. **Image adapter** packages the raw bytes and MIME type for the model
//! 3. **Model invocation** makes one call and returns the generated text
//!
//! and ends in one of three outcomes: success (answer shown), warning
//! (image or question missing, no call made) or error (the image could not be
//! packaged, or the call failed).
//!
//! ## Asking From Code
//!
//! The web form is a thin layer; the same flow is available directly:
//!
//! ```rust,no_run
//! use invoice_qa::{GeminiClient, InvoiceRequest, Outcome, QaOptions, UploadedImage, answer_invoice};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = QaOptions::builder()
//!         .api_key(std::env::var("GOOGLE_API_KEY")?)
//!         .build()?;
//!     let model = GeminiClient::new(options)?;
//!
//!     let upload = UploadedImage::new("image/png", std::fs::read("invoice.png")?);
//!     let request = InvoiceRequest::new(Some(upload), "What is the total amount?");
//!
//!     match answer_invoice(&model, request).await {
//!         Outcome::Success { answer } => println!("{}", answer),
//!         Outcome::Warning { message } | Outcome::Error { message } => eprintln!("{}", message),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **types**: request/outcome values, model options, Gemini wire format
//! - **image**: the image adapter
//! - **client**: the `InvoiceModel` seam and the Gemini client
//! - **qa**: the submission pipeline mapping failures to outcomes
//! - **render**: HTML page rendering
//! - **web**: axum router and form handling
//! - **config**: command-line/environment configuration
//! - **error**: error type and `Result` alias

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

/// Gemini client and the `InvoiceModel` trait the rest of the crate calls through.
mod client;

/// Command-line and environment configuration; the API key is checked at startup.
pub mod config;

/// Error types and conversions shared by every module.
mod error;

/// Image adapter turning uploaded bytes into the model's inline-image part.
mod image;

/// Submission pipeline: missing-input checks, adapter, model call, outcome.
mod qa;

/// Page rendering with minijinja.
mod render;

/// Core value types and the Gemini request/response format.
mod types;

/// HTTP router and multipart form handling.
pub mod web;

// ============================================================================
// PUBLIC EXPORTS
// ============================================================================

pub use client::{GeminiClient, InvoiceModel, ask};

pub use config::{Args, Config};

pub use error::{Error, Result};

pub use image::{ACCEPTED_EXTENSIONS, ImagePayload, data_uri, prepare_image, resolve_mime_type};

pub use qa::{IMAGE_ERROR_MESSAGE, MISSING_INPUT_MESSAGE, MODEL_ERROR_MESSAGE, answer_invoice};

pub use render::{Page, Renderer};

pub use types::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, GenerateContentRequest, GenerateContentResponse,
    INVOICE_INSTRUCTION, InlineData, InvoiceRequest, Outcome, Part, QaOptions, QaOptionsBuilder,
    UploadedImage,
};

pub use web::{AppState, router};
