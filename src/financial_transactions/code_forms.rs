//! The code sub-forms fragment requested when an item date changes.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    choices::{Choice, Kind},
    financial_transactions::form::{CodeCatalog, ITEM_PREFIX, code_forms_view},
    form::{FormData, FormErrors},
};

/// The state needed for rendering code sub-forms.
#[derive(Debug, Clone)]
pub struct CodeFormsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CodeFormsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the code sub-forms of one item.
///
/// The query holds `transaction_type` ("e" or "r"), the item index `item`
/// and the item's fields, so a code already chosen stays selected.
pub async fn get_code_forms(
    State(state): State<CodeFormsState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let data = FormData::from(query);

    let Some(kind) = Kind::from_code(data.text("transaction_type")) else {
        return Error::NotFound.into_alert_response();
    };
    let Ok(index) = data.text("item").parse::<usize>() else {
        return Error::NotFound.into_alert_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match CodeCatalog::load(kind, &connection) {
        Ok(catalog) => code_forms_view(
            &catalog,
            &format!("{ITEM_PREFIX}-{index}"),
            &data,
            &FormErrors::new(),
        )
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
