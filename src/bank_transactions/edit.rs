//! Statement editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    bank_institutions::get_account_labels,
    bank_transactions::{
        StatementId,
        db::{get_bank_transactions_for_statement, get_statement},
        form::{
            ExistingStatement, initial_form_data, save_statement_form, statement_form_view,
            validate_statement_form,
        },
    },
    documents::{
        AttachmentOwner, MediaStorage, MultipartForm, get_attachment_matches, read_multipart,
    },
    endpoints,
    form::FormErrors,
    html::{FormTarget, form_page},
    navigation::NavBar,
};

/// The state needed for editing a statement.
#[derive(Debug, Clone)]
pub struct EditStatementState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub media: MediaStorage,
}

impl FromRef<AppState> for EditStatementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            media: state.media.clone(),
        }
    }
}

/// Render the statement editing page.
pub async fn get_edit_statement_page(
    Path(statement_id): Path<StatementId>,
    State(state): State<EditStatementState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let statement = get_statement(statement_id, &connection)?;
    let bank_transactions = get_bank_transactions_for_statement(statement_id, &connection)?;
    let attachments =
        get_attachment_matches(AttachmentOwner::Statement(statement_id), &connection)?;
    let accounts = get_account_labels(&connection)?;
    let update_endpoint = endpoints::format_endpoint(endpoints::STATEMENT, statement_id);

    let form = statement_form_view(
        FormTarget::Update(&update_endpoint),
        &accounts,
        &attachments,
        &initial_form_data(&statement, &bank_transactions),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Edit Statement",
        NavBar::new(endpoints::STATEMENTS_VIEW).into_html(),
        "Edit bank statement",
        form,
    )
    .into_response())
}

/// Handle statement update form submission.
pub async fn update_statement_endpoint(
    Path(statement_id): Path<StatementId>,
    State(state): State<EditStatementState>,
    multipart: Multipart,
) -> Response {
    match read_multipart(multipart).await {
        Ok(form) => update_statement_from_form(statement_id, &state, form),
        Err(error) => error.into_alert_response(),
    }
}

fn update_statement_from_form(
    statement_id: StatementId,
    state: &EditStatementState,
    form: MultipartForm,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let existing = get_statement(statement_id, &connection).and_then(|_| {
        Ok((
            get_bank_transactions_for_statement(statement_id, &connection)?,
            get_attachment_matches(AttachmentOwner::Statement(statement_id), &connection)?,
            get_account_labels(&connection)?,
        ))
    });
    let (bank_transactions, attachments, accounts) = match existing {
        Ok(existing) => existing,
        Err(Error::NotFound) => return Error::UpdateMissing("statement").into_alert_response(),
        Err(error) => return error.into_alert_response(),
    };

    let update_endpoint = endpoints::format_endpoint(endpoints::STATEMENT, statement_id);
    let statement_form = match validate_statement_form(
        &form,
        &accounts,
        ExistingStatement {
            bank_transactions: &bank_transactions,
            attachments: &attachments,
        },
    ) {
        Ok(statement_form) => statement_form,
        Err(errors) => {
            return statement_form_view(
                FormTarget::Update(&update_endpoint),
                &accounts,
                &attachments,
                &form.data,
                &errors,
            )
            .into_response();
        }
    };

    match save_statement_form(Some(statement_id), &statement_form, &state.media, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::STATEMENTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not update statement {statement_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod edit_statement_page_tests {
    use axum::extract::{Path, State};
    use tempfile::TempDir;

    use crate::{
        Error,
        documents::MediaStorage,
        endpoints,
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_valid_html, fixtures,
            get_test_connection, must_get_form, parse_html_document, shared,
        },
    };

    use super::{EditStatementState, get_edit_statement_page};

    #[tokio::test]
    async fn form_is_filled_in() {
        let media_root = TempDir::new().unwrap();
        let connection = get_test_connection();
        let line = fixtures::bank_transaction(&connection, 4500, 0);
        let state = EditStatementState {
            db_connection: shared(connection),
            media: MediaStorage::new(media_root.path()),
        };

        let response = get_edit_statement_page(Path(line.statement_id), State(state))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::STATEMENT, line.statement_id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "date_start", "2017-01-01");
        assert_form_input_with_value(&form, "banktransaction_set-0-id", &line.id.to_string());
        assert_form_input_with_value(&form, "banktransaction_set-0-amount_debit", "45.00");
        assert_form_input_with_value(&form, "banktransaction_set-0-amount_credit", "0.00");
    }

    #[tokio::test]
    async fn missing_statement_is_not_found() {
        let media_root = TempDir::new().unwrap();
        let state = EditStatementState {
            db_connection: shared(get_test_connection()),
            media: MediaStorage::new(media_root.path()),
        };

        let result = get_edit_statement_page(Path(8), State(state)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
