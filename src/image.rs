//! Image adapter: uploaded bytes to the model's inline-image shape
//!
//! The adapter never decodes, resizes or validates the image. Whatever the
//! user uploaded is forwarded byte for byte together with its declared MIME
//! type; rejecting unsupported content is left to the model service.

use crate::types::{InlineData, Part, UploadedImage};
use base64::{Engine as _, engine::general_purpose};

/// File extensions offered by the upload picker.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

const OCTET_STREAM: &str = "application/octet-stream";

/// An image ready to be attached to a model call.
///
/// Holds the exact uploaded bytes and the exact declared MIME type; encoding
/// happens only when the wire part is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime_type: String,
    data: Vec<u8>,
}

impl ImagePayload {
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Standard base64 (padded) of the image bytes
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.data)
    }

    /// The `inlineData` part sent to the model
    pub fn to_part(&self) -> Part {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: self.mime_type.clone(),
                data: self.to_base64(),
            },
        }
    }
}

/// Package an upload for the model.
///
/// Returns `None` when nothing was uploaded or the upload carries no bytes,
/// so malformed data never reaches the model call.
pub fn prepare_image(upload: Option<UploadedImage>) -> Option<ImagePayload> {
    let upload = upload?;
    if upload.bytes.is_empty() {
        log::debug!(
            "Upload {:?} has no bytes, nothing to send",
            upload.file_name
        );
        return None;
    }

    Some(ImagePayload {
        mime_type: upload.mime_type,
        data: upload.bytes,
    })
}

/// `data:` URI used to show an upload back to the user
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(bytes)
    )
}

/// MIME type to record for an uploaded file part.
///
/// A declared type is kept verbatim. Browsers that send nothing, or the
/// generic octet-stream, get a guess from the file extension.
pub fn resolve_mime_type(declared: Option<&str>, file_name: Option<&str>) -> String {
    match declared.map(str::trim) {
        Some(mime) if !mime.is_empty() && !mime.eq_ignore_ascii_case(OCTET_STREAM) => {
            mime.to_string()
        }
        _ => file_name
            .and_then(|name| mime_guess::from_path(name).first_raw())
            .unwrap_or(OCTET_STREAM)
            .to_string(),
    }
}

/// Value for the picker's `accept` attribute, e.g. `.jpg,.jpeg,.png`
pub fn accept_attribute() -> String {
    ACCEPTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    #[test]
    fn test_prepare_image_absent() {
        assert_eq!(prepare_image(None), None);
    }

    #[test]
    fn test_prepare_image_empty_bytes() {
        let upload = UploadedImage::new("image/png", Vec::new()).with_file_name("empty.png");
        assert_eq!(prepare_image(Some(upload)), None);
    }

    #[test]
    fn test_prepare_image_keeps_bytes_and_mime() {
        let upload = UploadedImage::new("image/png", PNG_SIGNATURE.to_vec());
        let payload = prepare_image(Some(upload)).expect("payload for non-empty upload");

        assert_eq!(payload.mime_type(), "image/png");
        assert_eq!(payload.data(), &PNG_SIGNATURE);
        assert_eq!(payload.len(), PNG_SIGNATURE.len());
        assert!(!payload.is_empty());
    }

    #[test]
    fn test_prepare_image_does_not_validate_content() {
        // Not a JPEG at all; the service decides.
        let upload = UploadedImage::new("image/jpeg", b"not really a jpeg".to_vec());
        let payload = prepare_image(Some(upload)).unwrap();
        assert_eq!(payload.data(), b"not really a jpeg");
        assert_eq!(payload.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_to_part_encodes_base64() {
        let upload = UploadedImage::new("image/jpeg", vec![0xff, 0xd8, 0xff]);
        let payload = prepare_image(Some(upload)).unwrap();

        match payload.to_part() {
            Part::InlineData { inline_data } => {
                assert_eq!(inline_data.mime_type, "image/jpeg");
                assert_eq!(inline_data.data, "/9j/");
                let decoded = general_purpose::STANDARD.decode(inline_data.data).unwrap();
                assert_eq!(decoded, vec![0xff, 0xd8, 0xff]);
            }
            other => panic!("Expected inline data part, got {:?}", other),
        }
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri("image/png", &[0, 1, 2]), "data:image/png;base64,AAEC");
    }

    #[test]
    fn test_resolve_mime_type_prefers_declared() {
        assert_eq!(
            resolve_mime_type(Some("image/png"), Some("scan.jpg")),
            "image/png"
        );
    }

    #[test]
    fn test_resolve_mime_type_guesses_from_extension() {
        assert_eq!(resolve_mime_type(None, Some("scan.JPG")), "image/jpeg");
        assert_eq!(
            resolve_mime_type(Some("application/octet-stream"), Some("invoice.png")),
            "image/png"
        );
        assert_eq!(resolve_mime_type(Some(""), Some("invoice.jpeg")), "image/jpeg");
    }

    #[test]
    fn test_resolve_mime_type_fallback() {
        assert_eq!(resolve_mime_type(None, None), "application/octet-stream");
        assert_eq!(
            resolve_mime_type(None, Some("no-extension")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_accept_attribute() {
        assert_eq!(accept_attribute(), ".jpg,.jpeg,.png");
    }
}
