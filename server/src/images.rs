//! Storage for uploaded images. Clients send base64 data URLs; the decoded
//! bytes live in the `images` table and are served from `/media/{id}`.

use diesel::prelude::*;
use foodgram_core::{decode_data_url, validate_image, ImageError};
use uuid::Uuid;

use crate::api::ApiError;
use crate::config::Config;
use crate::models::NewImage;
use crate::schema::images;

/// Decode, sniff and store a data-URL image. `field` names the request field
/// in validation errors.
pub fn store_data_url(
    conn: &mut PgConnection,
    data_url: &str,
    field: &'static str,
) -> Result<Uuid, ApiError> {
    let data = decode_data_url(data_url).map_err(|e| image_error(field, e))?;
    let content_type = validate_image(&data).map_err(|e| image_error(field, e))?;

    let id = diesel::insert_into(images::table)
        .values(&NewImage {
            content_type: &content_type,
            data: &data,
        })
        .returning(images::id)
        .get_result(conn)?;

    tracing::debug!(%id, %content_type, bytes = data.len(), "stored image");
    Ok(id)
}

/// Best-effort removal of an image that nothing references any more.
pub fn delete_image(conn: &mut PgConnection, id: Uuid) {
    if let Err(e) = diesel::delete(images::table.find(id)).execute(conn) {
        tracing::warn!(%id, "failed to delete image: {}", e);
    }
}

pub fn image_url(config: &Config, id: Uuid) -> String {
    config.absolute_url(&format!("/media/{id}"))
}

fn image_error(field: &'static str, e: ImageError) -> ApiError {
    ApiError::field(field, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url() {
        let config = crate::config::test_config();
        let id = Uuid::nil();
        assert_eq!(
            image_url(&config, id),
            "http://foodgram.test/media/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_image_error_names_field() {
        match image_error("avatar", ImageError::NotDataUrl) {
            ApiError::Validation(e) => assert_eq!(e.field, "avatar"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
