//! Submission pipeline: request in, outcome out

use crate::client::InvoiceModel;
use crate::image::prepare_image;
use crate::types::{InvoiceRequest, Outcome};

/// Shown when the image or the question is missing.
pub const MISSING_INPUT_MESSAGE: &str =
    "Please upload an image and enter a question before submitting.";

/// Shown when the upload could not be packaged for the model.
pub const IMAGE_ERROR_MESSAGE: &str = "Error processing the image. Please try again.";

/// Shown for every failed model call, whatever the cause.
pub const MODEL_ERROR_MESSAGE: &str = "Failed to generate a response. Please try again.";

/// Runs one submission through the adapter and the model.
///
/// Never fails: missing input becomes a warning (and the model is not
/// called), adapter and model failures become generic error outcomes. The
/// cause of a model failure is logged, not shown.
pub async fn answer_invoice(model: &dyn InvoiceModel, request: InvoiceRequest) -> Outcome {
    if !request.is_complete() {
        log::warn!(
            "Submission missing input (image: {}, question: {})",
            request.image.is_some(),
            !request.question.trim().is_empty()
        );
        return Outcome::warning(MISSING_INPUT_MESSAGE);
    }

    let InvoiceRequest { image, question } = request;

    let Some(payload) = prepare_image(image) else {
        log::error!("Uploaded image could not be packaged for the model");
        return Outcome::error(IMAGE_ERROR_MESSAGE);
    };

    log::info!(
        "Answering invoice question ({}, {} bytes)",
        payload.mime_type(),
        payload.len()
    );

    match model.answer(&payload, &question).await {
        Ok(answer) => Outcome::success(answer),
        Err(e) => {
            log::error!("Model call failed: {}", e);
            Outcome::error(MODEL_ERROR_MESSAGE)
        }
    }
}
