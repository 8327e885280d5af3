//! Base64 image payloads.
//!
//! Recipe images and avatars arrive inside JSON as data URLs, e.g.
//! `data:image/png;base64,iVBORw0...`. This module decodes them and checks that
//! the bytes really are an image in one of the allowed formats.

use std::io::Cursor;

use base64::Engine;
use image::{ImageFormat, ImageReader};

use crate::error::ImageError;

/// Allowed image formats for recipe images and avatars.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum decoded image size (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Decode the payload of a data URL. The declared subtype is ignored; the
/// stored content type comes from sniffing the bytes in [`validate_image`].
pub fn decode_data_url(input: &str) -> Result<Vec<u8>, ImageError> {
    let rest = input
        .trim()
        .strip_prefix("data:image")
        .ok_or(ImageError::NotDataUrl)?;
    let (_, payload) = rest.split_once(";base64,").ok_or(ImageError::NotDataUrl)?;

    // Allow payloads wrapped over several lines.
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let data = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;

    if data.is_empty() {
        return Err(ImageError::Empty);
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(ImageError::TooLarge { max: MAX_FILE_SIZE });
    }

    Ok(data)
}

/// Validate image data: check format is allowed and detect content type.
///
/// Returns the content type on success (e.g., "image/jpeg").
pub fn validate_image(data: &[u8]) -> Result<String, ImageError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::Unreadable(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| ImageError::Unreadable("could not detect image format".to_string()))?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ImageError::UnsupportedFormat(format!("{:?}", format)));
    }

    Ok(format.to_mime_type().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent GIF
    const GIF_B64: &str = "R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

    #[test]
    fn test_decode_gif_data_url() {
        let data = decode_data_url(&format!("data:image/gif;base64,{GIF_B64}")).unwrap();
        assert_eq!(&data[..6], b"GIF89a");
        assert_eq!(validate_image(&data).unwrap(), "image/gif");
    }

    #[test]
    fn test_content_type_comes_from_bytes_not_header() {
        let data = decode_data_url(&format!("data:image/PNG;base64,{GIF_B64}")).unwrap();
        assert_eq!(validate_image(&data).unwrap(), "image/gif");
    }

    #[test]
    fn test_rejects_plain_strings() {
        assert_eq!(
            decode_data_url("https://example.com/cake.png"),
            Err(ImageError::NotDataUrl)
        );
        assert_eq!(
            decode_data_url("data:image/png,notbase64"),
            Err(ImageError::NotDataUrl)
        );
    }

    #[test]
    fn test_rejects_bad_base64() {
        assert!(matches!(
            decode_data_url("data:image/png;base64,@@@"),
            Err(ImageError::InvalidBase64(_))
        ));
        assert_eq!(
            decode_data_url("data:image/png;base64,"),
            Err(ImageError::Empty)
        );
    }

    #[test]
    fn test_validate_rejects_non_images() {
        assert!(validate_image(b"definitely not an image").is_err());
    }
}
