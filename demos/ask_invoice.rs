//! Ask a question about an invoice image from the command line
//!
//! Sends a local JPEG or PNG and a question to Gemini and prints the answer,
//! without starting the web form.
//!
//! ```bash
//! export GOOGLE_API_KEY=your_key_here
//! cargo run --example ask_invoice -- invoice.png "What is the total amount?"
//! ```

use invoice_qa::{
    GeminiClient, InvoiceRequest, Outcome, QaOptions, UploadedImage, answer_invoice, ask,
    prepare_image, resolve_mime_type,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(path), Some(question)) = (args.next(), args.next()) else {
        eprintln!("usage: ask_invoice <image> <question>");
        std::process::exit(2);
    };

    let options = QaOptions::builder()
        .api_key(std::env::var("GOOGLE_API_KEY")?)
        .temperature(0.0)
        .build()?;

    let bytes = std::fs::read(&path)?;
    let upload = UploadedImage::new(resolve_mime_type(None, Some(path.as_str())), bytes)
        .with_file_name(path.clone());

    println!("=== Example 1: One-shot ask ===\n");

    // ask() builds a throwaway client; fine for a single question
    let Some(image) = prepare_image(Some(upload.clone())) else {
        eprintln!("{} is empty", path);
        std::process::exit(1);
    };
    println!("Sending {} ({}, {} bytes)...", path, image.mime_type(), image.len());
    let answer = ask(&image, &question, &options).await?;
    println!("Answer: {}\n", answer);

    println!("=== Example 2: Same pipeline as the web form ===\n");

    let client = GeminiClient::new(options)?;
    match answer_invoice(&client, InvoiceRequest::new(Some(upload), question)).await {
        Outcome::Success { answer } => println!("Answer: {}", answer),
        Outcome::Warning { message } => println!("Warning: {}", message),
        Outcome::Error { message } => println!("Error: {}", message),
    }

    Ok(())
}
