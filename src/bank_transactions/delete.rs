//! Statement deletion page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    bank_transactions::{
        StatementId,
        db::{delete_statement, get_statement},
    },
    documents::{MediaStorage, delete_orphaned_attachments, with_file_changes},
    endpoints,
    html::confirm_delete_view,
    navigation::NavBar,
};

/// The state needed for deleting a statement.
#[derive(Debug, Clone)]
pub struct DeleteStatementState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub media: MediaStorage,
}

impl FromRef<AppState> for DeleteStatementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            media: state.media.clone(),
        }
    }
}

pub async fn get_delete_statement_page(
    Path(statement_id): Path<StatementId>,
    State(state): State<DeleteStatementState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let statement = get_statement(statement_id, &connection)?;

    Ok(confirm_delete_view(
        "Delete Statement",
        NavBar::new(endpoints::STATEMENTS_VIEW).into_html(),
        &format!("the {statement}, its bank transactions and attachments"),
        &endpoints::format_endpoint(endpoints::STATEMENT, statement_id),
        endpoints::STATEMENTS_VIEW,
    )
    .into_response())
}

/// Delete a statement, its bank transactions and the files only it used.
pub async fn delete_statement_endpoint(
    Path(statement_id): Path<StatementId>,
    State(state): State<DeleteStatementState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = with_file_changes(&state.media, |file_changes| {
        let transaction = connection.unchecked_transaction()?;
        delete_statement(statement_id, &transaction)?;
        let orphans = delete_orphaned_attachments(&transaction)?;
        file_changes.release(orphans.into_iter().map(|attachment| attachment.location));
        transaction.commit()?;
        Ok(())
    });

    match result {
        Ok(()) => (
            HxRedirect(endpoints::STATEMENTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Bytes,
        extract::{Path, State},
        http::StatusCode,
    };
    use tempfile::TempDir;

    use crate::{
        Error,
        bank_transactions::{get_bank_transaction, get_statement},
        documents::{
            AttachmentChanges, AttachmentOwner, FileChanges, MediaStorage, NEW_FILES_FIELD,
            UploadedFile, apply_attachment_changes, get_attachment_matches,
        },
        endpoints,
        test_utils::{
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, fixtures,
            get_test_connection, must_get_form, parse_html_document, shared,
        },
    };

    use super::{DeleteStatementState, delete_statement_endpoint, get_delete_statement_page};

    #[tokio::test]
    async fn confirmation_page_targets_endpoint() {
        let media_root = TempDir::new().unwrap();
        let connection = get_test_connection();
        let statement = fixtures::statement(&connection);
        let state = DeleteStatementState {
            db_connection: shared(connection),
            media: MediaStorage::new(media_root.path()),
        };

        let response = get_delete_statement_page(Path(statement.id), State(state))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_hx_endpoint(
            &must_get_form(&html),
            &endpoints::format_endpoint(endpoints::STATEMENT, statement.id),
            "hx-delete",
        );
    }

    #[tokio::test]
    async fn deletes_lines_and_attachment_files() {
        let media_root = TempDir::new().unwrap();
        let media = MediaStorage::new(media_root.path());
        let connection = get_test_connection();
        let line = fixtures::bank_transaction(&connection, 100, 0);
        let owner = AttachmentOwner::Statement(line.statement_id);
        let mut file_changes = FileChanges::new();
        apply_attachment_changes(
            owner,
            &AttachmentChanges {
                new_files: vec![UploadedFile {
                    field: NEW_FILES_FIELD.to_owned(),
                    file_name: "scan.pdf".to_owned(),
                    bytes: Bytes::from_static(b"%PDF"),
                }],
                removed_matches: Vec::new(),
            },
            &media,
            &mut file_changes,
            &connection,
        )
        .unwrap();
        file_changes.commit(&media);
        let location = get_attachment_matches(owner, &connection).unwrap()[0]
            .attachment
            .location
            .clone();
        let state = DeleteStatementState {
            db_connection: shared(connection),
            media: media.clone(),
        };

        let response = delete_statement_endpoint(Path(line.statement_id), State(state.clone())).await;

        assert_hx_redirect(&response, endpoints::STATEMENTS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_statement(line.statement_id, &connection), Err(Error::NotFound));
        assert_eq!(get_bank_transaction(line.id, &connection), Err(Error::NotFound));
        assert_eq!(media.read(&location).await, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn missing_statement_is_not_found() {
        let media_root = TempDir::new().unwrap();
        let state = DeleteStatementState {
            db_connection: shared(get_test_connection()),
            media: MediaStorage::new(media_root.path()),
        };

        let response = delete_statement_endpoint(Path(5), State(state)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
