use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    documents::{AttachmentId, MediaStorage, get_attachment},
};

/// The state needed to download an attachment.
#[derive(Debug, Clone)]
pub struct DownloadAttachmentState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub media: MediaStorage,
}

impl FromRef<AppState> for DownloadAttachmentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            media: state.media.clone(),
        }
    }
}

/// Send an attachment file as a download.
pub async fn get_attachment_file(
    Path(attachment_id): Path<AttachmentId>,
    State(state): State<DownloadAttachmentState>,
) -> Result<Response, Error> {
    let attachment = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_attachment(attachment_id, &connection)?
    };

    let bytes = state.media.read(&attachment.location).await.inspect_err(|error| {
        tracing::warn!(
            "Could not read file for attachment {}: {error}",
            attachment.id
        )
    })?;

    let disposition = format!("attachment; filename=\"{}\"", attachment.file_name());
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
