//! Integration tests for the Gemini client against a mock service
//!
//! These tests verify the exact request the client sends (endpoint, key
//! header, part order, inline image) and how each kind of service reply is
//! turned into an answer or an error.

use base64::{Engine as _, engine::general_purpose};
use invoice_qa::{
    Error, GeminiClient, INVOICE_INSTRUCTION, InvoiceModel, QaOptions, UploadedImage, ask,
    prepare_image,
};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INVOICE_PNG: &[u8] = include_bytes!("fixtures/invoice_10x10.png");
const GENERATE_PATH: &str = "/models/gemini-1.5-flash:generateContent";

fn options(server: &MockServer) -> QaOptions {
    QaOptions::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .timeout(5)
        .build()
        .expect("Valid options")
}

fn answer_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

fn invoice_payload() -> invoice_qa::ImagePayload {
    prepare_image(Some(UploadedImage::new("image/png", INVOICE_PNG.to_vec()))).expect("non-empty")
}

#[tokio::test]
async fn test_generate_sends_instruction_image_and_question() {
    // GIVEN: a service that answers "$42.00"
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("$42.00")))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(options(&server)).expect("Valid client");

    // WHEN: we ask about the 10x10 PNG invoice
    let answer = client
        .answer(&invoice_payload(), "What is the total amount?")
        .await
        .expect("Answer from mock service");

    // THEN: the answer is returned and the request carried all three parts
    assert_eq!(answer, "$42.00");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();

    let parts = body["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0]["text"], INVOICE_INSTRUCTION);
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[2]["text"], "What is the total amount?");

    let sent = general_purpose::STANDARD
        .decode(parts[1]["inlineData"]["data"].as_str().unwrap())
        .unwrap();
    assert_eq!(sent, INVOICE_PNG, "Image bytes must reach the service unchanged");
    assert!(body.get("generationConfig").is_none());
}

#[tokio::test]
async fn test_generate_sends_generation_config_when_set() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("ok")))
        .mount(&server)
        .await;

    let options = QaOptions::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .temperature(0.0)
        .max_output_tokens(400)
        .build()
        .unwrap();
    let client = GeminiClient::new(options).unwrap();
    client.answer(&invoice_payload(), "Vendor?").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 400);
    assert_eq!(body["generationConfig"]["temperature"], 0.0);
}

#[tokio::test]
async fn test_generate_joins_text_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Invoice date: "}, {"text": "2024-03-01"}]}
            }]
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(options(&server)).unwrap();
    let answer = client.answer(&invoice_payload(), "What is the date?").await.unwrap();
    assert_eq!(answer, "Invoice date: 2024-03-01");
}

#[tokio::test]
async fn test_invalid_key_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(options(&server)).unwrap();
    let err = client
        .answer(&invoice_payload(), "Total?")
        .await
        .expect_err("Invalid key must fail");

    match err {
        Error::Api(msg) => {
            assert!(msg.starts_with("400"), "got: {}", msg);
            assert!(msg.contains("API key not valid"), "got: {}", msg);
        }
        other => panic!("Expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_quota_exhausted_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Resource has been exhausted"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(options(&server)).unwrap();
    let err = client.answer(&invoice_payload(), "Total?").await.unwrap_err();
    assert!(matches!(err, Error::Api(ref msg) if msg.contains("429")));
}

#[tokio::test]
async fn test_blocked_prompt_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"promptFeedback": {"blockReason": "SAFETY"}})),
        )
        .mount(&server)
        .await;

    let client = GeminiClient::new(options(&server)).unwrap();
    let err = client.answer(&invoice_payload(), "Total?").await.unwrap_err();
    assert!(matches!(err, Error::Api(ref msg) if msg.contains("SAFETY")));
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(options(&server)).unwrap();
    let err = client.answer(&invoice_payload(), "Total?").await.unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(answer_body("late"))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let options = QaOptions::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .timeout(1)
        .build()
        .unwrap();
    let client = GeminiClient::new(options).unwrap();

    let err = client.answer(&invoice_payload(), "Total?").await.unwrap_err();
    assert!(matches!(err, Error::Timeout), "got {:?}", err);
}

#[tokio::test]
async fn test_client_usable_after_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("ACME Corp")))
        .mount(&server)
        .await;

    let client = GeminiClient::new(options(&server)).unwrap();

    assert!(client.answer(&invoice_payload(), "Vendor?").await.is_err());
    let answer = client.answer(&invoice_payload(), "Vendor?").await.unwrap();
    assert_eq!(answer, "ACME Corp");
}

#[tokio::test]
async fn test_ask_one_shot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("INV-1042")))
        .expect(1)
        .mount(&server)
        .await;

    let answer = ask(&invoice_payload(), "Invoice number?", &options(&server))
        .await
        .unwrap();
    assert_eq!(answer, "INV-1042");
}
