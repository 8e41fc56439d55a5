use crate::api::error::AppError;
use crate::services::staging::StagedImage;

/// Name used when the client supplies no usable filename
pub const FALLBACK_FILENAME: &str = "image";

const MAX_FILENAME_LEN: usize = 255;

/// Reduce a client-supplied filename to a safe single path component
pub fn sanitize_filename(filename: &str) -> String {
    // Clients on either platform may send a full path
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from upload filename: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';') {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > MAX_FILENAME_LEN {
        let mut end = MAX_FILENAME_LEN;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        FALLBACK_FILENAME.to_string()
    } else {
        sanitized
    }
}

/// Reject uploads whose leading bytes identify a non-image format.
///
/// Unrecognized signatures are let through; the remote service decides.
pub fn check_image_payload(image: &StagedImage) -> Result<(), AppError> {
    match image.mime_type() {
        Some(mime) if !mime.starts_with("image/") => Err(AppError::Validation(format!(
            "Uploaded file is not an image (detected {})",
            mime
        ))),
        _ => Ok(()),
    }
}
