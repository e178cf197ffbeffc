use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::AdvisorError;

/// Max image size accepted for analysis (20MB).
pub const MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

/// MIME type assumed when the extension says nothing useful.
pub const FALLBACK_MIME: &str = "image/jpeg";

/// An image ready to be attached to a completion request.
#[derive(Clone)]
pub struct ImageAttachment {
    pub mime: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("mime", &self.mime)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl ImageAttachment {
    pub fn new(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            data,
        }
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.data))
    }
}

/// Guess the image MIME type from the file extension.
/// Non-image types are rejected; unknown extensions are treated as JPEG.
pub fn image_mime(path: &Path) -> Result<String, AdvisorError> {
    match mime_guess::from_path(path).first() {
        Some(mime) if mime.type_() == mime_guess::mime::IMAGE => Ok(mime.essence_str().to_string()),
        Some(mime) => Err(AdvisorError::Image(format!(
            "{} is not an image ({})",
            path.display(),
            mime.essence_str()
        ))),
        None => Ok(FALLBACK_MIME.to_string()),
    }
}

/// Read and validate an image file from disk.
pub async fn load_image(path: &str) -> Result<ImageAttachment, AdvisorError> {
    if path.trim().is_empty() {
        return Err(AdvisorError::InvalidInput(
            "image_path must not be empty".to_string(),
        ));
    }
    let path = Path::new(path);

    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| AdvisorError::Image(format!("cannot open {}: {e}", path.display())))?;

    if !meta.is_file() {
        return Err(AdvisorError::Image(format!(
            "{} is not a file",
            path.display()
        )));
    }
    if meta.len() == 0 {
        return Err(AdvisorError::Image(format!("{} is empty", path.display())));
    }
    if meta.len() > MAX_IMAGE_BYTES {
        return Err(AdvisorError::Image(format!(
            "{} is too large: {} bytes (max {MAX_IMAGE_BYTES})",
            path.display(),
            meta.len()
        )));
    }

    let mime = image_mime(path)?;
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| AdvisorError::Image(format!("cannot read {}: {e}", path.display())))?;

    Ok(ImageAttachment { mime, data })
}

/// Validate a chat message is non-empty.
pub fn validate_message(message: &str) -> Result<(), AdvisorError> {
    if message.trim().is_empty() {
        return Err(AdvisorError::InvalidInput(
            "message must not be empty".to_string(),
        ));
    }
    Ok(())
}
