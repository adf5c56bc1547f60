//! HTTP surface: the form page and its submission handler
//!
//! ```text
//! GET  /         empty form
//! POST /         multipart form: `question` (text) + `invoice` (file)
//! GET  /healthz  liveness probe
//! ```
//!
//! Every submission renders the full page again with the question kept in
//! the text field, the uploaded image shown back, and the outcome below.

use crate::client::InvoiceModel;
use crate::image::{data_uri, resolve_mime_type};
use crate::qa::{IMAGE_ERROR_MESSAGE, answer_invoice};
use crate::render::{Page, Renderer};
use crate::types::{InvoiceRequest, Outcome, UploadedImage};
use crate::{Error, Result};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

/// Form field carrying the question
pub const QUESTION_FIELD: &str = "question";

/// Form field carrying the invoice image
pub const IMAGE_FIELD: &str = "invoice";

/// Shared, read-only state for all requests
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn InvoiceModel>,
    pub renderer: Arc<Renderer>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(model: Arc<dyn InvoiceModel>, max_upload_bytes: usize) -> Result<Self> {
        Ok(Self {
            model,
            renderer: Arc::new(Renderer::new()?),
            max_upload_bytes,
        })
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(show_form).post(submit))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn show_form(State(state): State<AppState>) -> Response {
    render_page(&state, StatusCode::OK, &Page::default())
}

async fn submit(State(state): State<AppState>, multipart: Multipart) -> Response {
    let request = match read_submission(multipart).await {
        Ok(request) => request,
        Err(e) => {
            log::warn!("Rejected form submission: {}", e);
            let page = Page {
                outcome: Some(Outcome::error(IMAGE_ERROR_MESSAGE)),
                ..Page::default()
            };
            return render_page(&state, StatusCode::BAD_REQUEST, &page);
        }
    };

    let question = request.question.clone();
    let image_uri = request
        .image
        .as_ref()
        .filter(|image| !image.bytes.is_empty())
        .map(|image| data_uri(&image.mime_type, &image.bytes));

    let outcome = answer_invoice(state.model.as_ref(), request).await;

    let page = Page {
        question,
        image_uri,
        outcome: Some(outcome),
    };
    render_page(&state, StatusCode::OK, &page)
}

/// Collect the question and the upload from the multipart body.
///
/// A file field with neither a file name nor content is what browsers send
/// for an untouched picker, and counts as no upload.
pub async fn read_submission(mut multipart: Multipart) -> Result<InvoiceRequest> {
    let mut request = InvoiceRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_input(format!("Failed to parse multipart data: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            QUESTION_FIELD => {
                request.question = field.text().await.map_err(|e| {
                    Error::invalid_input(format!("Failed to read question: {}", e))
                })?;
            }
            IMAGE_FIELD => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.is_empty());
                let mime_type = resolve_mime_type(field.content_type(), file_name.as_deref());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::image(format!("Failed to read upload: {}", e)))?;

                if file_name.is_none() && bytes.is_empty() {
                    continue;
                }

                log::debug!(
                    "Received upload {:?} ({}, {} bytes)",
                    file_name,
                    mime_type,
                    bytes.len()
                );
                // Takes over the field's buffer when it is not shared
                request.image = Some(UploadedImage {
                    file_name,
                    mime_type,
                    bytes: bytes.into(),
                });
            }
            other => {
                log::debug!("Ignoring unexpected form field {:?}", other);
            }
        }
    }

    Ok(request)
}

fn render_page(state: &AppState, status: StatusCode, page: &Page) -> Response {
    match state.renderer.render(page) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            log::error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
