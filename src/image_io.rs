use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use image::ImageFormat;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024; // 10 MB per image

/// MIME type announced in the data URI sent to the completion endpoint.
pub const DATA_URI_MIME: &str = "image/jpeg";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("no image bytes to encode")]
    Empty,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AcquireError {
    #[error("the image is empty")]
    Empty,
    #[error("image exceeds {} MB limit", MAX_IMAGE_BYTES / 1024 / 1024)]
    TooLarge,
    #[error("unsupported image format, use JPEG or PNG")]
    Unsupported,
}

/// Raw bytes of a photo that passed format detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl AcquiredImage {
    /// Validate raw bytes from an upload or a camera capture.
    ///
    /// # Errors
    ///
    /// Returns Err if the bytes are empty, too large, or not a JPEG/PNG image
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, AcquireError> {
        if bytes.is_empty() {
            return Err(AcquireError::Empty);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AcquireError::TooLarge);
        }
        match image::guess_format(&bytes) {
            Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => Ok(Self { bytes, format }),
            _ => Err(AcquireError::Unsupported),
        }
    }

    #[must_use]
    pub const fn mime(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "image/png",
            _ => "image/jpeg",
        }
    }

    /// Inline preview for the page, labelled with the detected MIME type.
    #[must_use]
    pub fn preview_uri(&self) -> String {
        // bytes are never empty once acquired
        data_uri(self.mime(), &B64.encode(&self.bytes))
    }
}

/// Base64-encode raw image bytes (standard alphabet, padded, no line breaks).
///
/// # Errors
///
/// Returns Err if `bytes` is empty
pub fn encode_image(bytes: &[u8]) -> Result<String, EncodeError> {
    if bytes.is_empty() {
        return Err(EncodeError::Empty);
    }
    Ok(B64.encode(bytes))
}

#[must_use]
pub fn data_uri(mime: &str, b64: &str) -> String {
    format!("data:{mime};base64,{b64}")
}
