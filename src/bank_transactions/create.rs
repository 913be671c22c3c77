//! Statement creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    bank_institutions::get_account_labels,
    bank_transactions::form::{
        ExistingStatement, blank_form_data, save_statement_form, statement_form_view,
        validate_statement_form,
    },
    documents::{MediaStorage, MultipartForm, read_multipart},
    endpoints,
    form::FormErrors,
    html::{FormTarget, form_page},
    navigation::NavBar,
};

/// The state needed for creating a statement.
#[derive(Debug, Clone)]
pub struct CreateStatementState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub media: MediaStorage,
}

impl FromRef<AppState> for CreateStatementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            media: state.media.clone(),
        }
    }
}

pub async fn get_new_statement_page(
    State(state): State<CreateStatementState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_account_labels(&connection)?;
    let form = statement_form_view(
        FormTarget::Create(endpoints::POST_STATEMENT),
        &accounts,
        &[],
        &blank_form_data(),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Add Statement",
        NavBar::new(endpoints::STATEMENTS_VIEW).into_html(),
        "Add bank statement",
        form,
    )
    .into_response())
}

/// Handle statement creation form submission.
pub async fn create_statement_endpoint(
    State(state): State<CreateStatementState>,
    multipart: Multipart,
) -> Response {
    match read_multipart(multipart).await {
        Ok(form) => create_statement_from_form(&state, form),
        Err(error) => error.into_alert_response(),
    }
}

fn create_statement_from_form(state: &CreateStatementState, form: MultipartForm) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let accounts = match get_account_labels(&connection) {
        Ok(accounts) => accounts,
        Err(error) => return error.into_alert_response(),
    };

    let statement_form =
        match validate_statement_form(&form, &accounts, ExistingStatement::default()) {
            Ok(statement_form) => statement_form,
            Err(errors) => {
                return statement_form_view(
                    FormTarget::Create(endpoints::POST_STATEMENT),
                    &accounts,
                    &[],
                    &form.data,
                    &errors,
                )
                .into_response();
            }
        };

    match save_statement_form(None, &statement_form, &state.media, &connection) {
        Ok(statement) => {
            tracing::info!("Created statement {}", statement.id);
            (
                HxRedirect(endpoints::STATEMENTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not create statement: {error}");
            error.into_alert_response()
        }
    }
}
