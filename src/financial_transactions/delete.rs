//! Financial transaction deletion page and endpoint.

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
    documents::{MediaStorage, delete_orphaned_attachments, with_file_changes},
    endpoints,
    financial_transactions::{
        db::{delete_financial_transaction, get_transaction_summary},
        domain::FinancialTransactionId,
    },
    html::confirm_delete_view,
    navigation::NavBar,
};

/// The state needed for deleting a financial transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub media: MediaStorage,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            media: state.media.clone(),
        }
    }
}

pub async fn get_delete_transaction_page(
    Path(transaction_id): Path<FinancialTransactionId>,
    State(state): State<DeleteTransactionState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let summary = get_transaction_summary(transaction_id, &connection)?;

    Ok(confirm_delete_view(
        "Delete Transaction",
        NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html(),
        &format!("the transaction \"{summary}\", its items and attachments"),
        &endpoints::format_endpoint(endpoints::TRANSACTION, transaction_id),
        endpoints::TRANSACTIONS_VIEW,
    )
    .into_response())
}

/// Delete a transaction, its items and the files only it used.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<FinancialTransactionId>,
    State(state): State<DeleteTransactionState>,
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
        delete_financial_transaction(transaction_id, &transaction)?;
        let orphans = delete_orphaned_attachments(&transaction)?;
        file_changes.release(orphans.into_iter().map(|attachment| attachment.location));
        transaction.commit()?;
        Ok(())
    });

    match result {
        Ok(()) => {
            tracing::info!("Deleted financial transaction {transaction_id}");
            (
                HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}
