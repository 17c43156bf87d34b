use axum::{
    extract::{Multipart, Path, multipart::MultipartError},
    http::StatusCode,
    response::Response,
};

use crate::conversation::{self, ActionOutcome};
use crate::error::AppResult;
use crate::image_io::AcquireError;
use crate::routes::{CurrentSession, back_to};
use crate::session::Tab;

/// Bytes of the first `image` (or `file`) field, if the form has one.
async fn image_field(multipart: &mut Multipart) -> Result<Option<Vec<u8>>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if let Some("image" | "file") = field.name() {
            return Ok(Some(field.bytes().await?.to_vec()));
        }
    }
    Ok(None)
}

/// Acquire a photo for `tab` from a multipart form.
///
/// Accepts a field named `image` (or `file`). Camera captures arrive the same way.
/// A body over the upload limit is refused with a notice like any oversized photo.
///
/// # Errors
///
/// Returns an error if the multipart payload is malformed.
pub async fn upload(
    session: CurrentSession,
    Path(tab): Path<Tab>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let outcome = match image_field(&mut multipart).await {
        Ok(Some(bytes)) => conversation::acquire_image(&session.handle, tab, bytes).await,
        Ok(None) => ActionOutcome::Ignored,
        Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            conversation::reject_image(&session.handle, tab, &AcquireError::TooLarge).await
        }
        Err(e) => return Err(e.into()),
    };
    tracing::debug!(%tab, ?outcome, "image upload handled");

    Ok(session.respond(back_to(tab)))
}
