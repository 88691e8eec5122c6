//! Recipe images arrive as `data:image/<subtype>;base64,<payload>` strings
//! and are stored as plain files under the media directory.

use base64::Engine as _;
use std::io;
use std::path::Path;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ImageError {
    #[error("image must be a data: URL")]
    NotADataUrl,
    #[error("unsupported image mime type {0:?}")]
    UnsupportedMime(String),
    #[error("invalid base64 payload")]
    BadPayload,
}

#[derive(Debug)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

pub fn decode_data_url(input: &str) -> Result<DecodedImage, ImageError> {
    let rest = input.strip_prefix("data:").ok_or(ImageError::NotADataUrl)?;
    let (mime, payload) = rest.split_once(";base64,").ok_or(ImageError::NotADataUrl)?;
    let subtype = mime
        .strip_prefix("image/")
        .ok_or_else(|| ImageError::UnsupportedMime(mime.into()))?;
    if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ImageError::UnsupportedMime(mime.into()));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| ImageError::BadPayload)?;
    Ok(DecodedImage {
        extension: subtype.to_owned(),
        bytes,
    })
}

/// Writes the image under `<media_dir>/recipes/` and returns the relative
/// path that gets stored on the recipe row.
pub fn store(
    media_dir: &Path,
    recipe_id: crate::database::models::RecipeId,
    image: &DecodedImage,
) -> io::Result<String> {
    let relative = format!("recipes/{recipe_id}.{}", image.extension);
    let full = media_dir.join(&relative);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, &image.bytes)?;
    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_data_url() {
        let image = decode_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(image.bytes, b"hello");
    }

    #[test]
    fn rejects_missing_envelope() {
        assert_eq!(
            decode_data_url("iVBORw0KGgo=").unwrap_err(),
            ImageError::NotADataUrl
        );
        assert_eq!(
            decode_data_url("data:image/png,plain").unwrap_err(),
            ImageError::NotADataUrl
        );
    }

    #[test]
    fn rejects_non_image_mime() {
        assert_eq!(
            decode_data_url("data:text/plain;base64,aGVsbG8=").unwrap_err(),
            ImageError::UnsupportedMime("text/plain".into())
        );
    }

    #[test]
    fn rejects_bad_base64() {
        assert_eq!(
            decode_data_url("data:image/png;base64,!!!").unwrap_err(),
            ImageError::BadPayload
        );
    }
}
