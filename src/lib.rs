//! Treasurer Tools is a bookkeeping web app for the treasurer of a small
//! organisation.
//!
//! It records bank statements, financial transactions coded against a chart
//! of accounts, payees and payers, investments and their attachments, and
//! reconciles bank lines against financial transactions.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod bank_institutions;
mod bank_reconciliation;
mod bank_transactions;
mod choices;
mod db;
mod documents;
mod endpoints;
mod error_pages;
mod financial_codes;
mod financial_transactions;
mod form;
mod history;
mod html;
mod investments;
mod logging;
mod money;
mod navigation;
mod payee_payers;
mod reports;
mod routing;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, ValidatedPassword, get_user_by_id, upsert_user};
pub use db::initialize as initialize_db;
pub use documents::MediaStorage;
pub use logging::logging_middleware;
pub use money::Money;
pub use routing::build_router;

use crate::{
    alert::Alert,
    error_pages::{InternalServerError, get_404_not_found_response},
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an incorrect password.
    #[error("invalid password")]
    InvalidCredentials,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth cookie could not be decoded or encoded.
    #[error("invalid auth token: {0}")]
    InvalidToken(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The multipart form could not be decoded.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// An attachment could not be written to, read from or removed from the
    /// media storage.
    #[error("file storage failed: {0}")]
    StorageError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A row could not be inserted or updated because a UNIQUE constraint
    /// failed. Holds the SQLite description of the failed constraint.
    #[error("a unique constraint failed: {0}")]
    UniqueConstraint(String),

    /// A row references a row that does not exist, or a row could not be
    /// deleted because other rows still reference it.
    #[error("a foreign key constraint failed")]
    ForeignKeyConstraint,

    /// Tried to delete a row that other rows depend on.
    ///
    /// Holds a message describing the rows that block the deletion.
    #[error("{0}")]
    ProtectedDelete(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a row that does not exist.
    ///
    /// Holds the human readable name of the entity, e.g. "statement".
    #[error("tried to update a {0} that is not in the database")]
    UpdateMissing(&'static str),

    /// Tried to delete a row that does not exist.
    ///
    /// Holds the human readable name of the entity, e.g. "statement".
    #[error("tried to delete a {0} that is not in the database")]
    DeleteMissing(&'static str),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(desc))
                if sql_error.extended_code == 2067 =>
            {
                Error::UniqueConstraint(desc)
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed, 1811 when
            // an ON DELETE RESTRICT key blocked a delete.
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == 787 || sql_error.extended_code == 1811 =>
            {
                Error::ForeignKeyConstraint
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Render the error as an alert fragment for htmx requests.
    fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Not found".to_owned(),
                    details: "The requested item could not be found. \
                        Try refreshing the page to see if it has been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissing(entity) => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: format!("Could not update {entity}"),
                    details: format!("The {entity} could not be found."),
                },
            ),
            Error::DeleteMissing(entity) => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: format!("Could not delete {entity}"),
                    details: format!(
                        "The {entity} could not be found. \
                        Try refreshing the page to see if the {entity} has already been deleted."
                    ),
                },
            ),
            Error::ProtectedDelete(reason) => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Could not delete".to_owned(),
                    details: reason,
                },
            ),
            Error::ForeignKeyConstraint => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Could not save changes".to_owned(),
                    details: "The change refers to, or is referred to by, other records. \
                        Update those records first."
                        .to_owned(),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                        ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::MultipartError(error) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not read the submitted form".to_owned(),
                    details: error,
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details:
                            "An unexpected error occurred, check the server logs for more details."
                                .to_owned(),
                    },
                )
            }
        };

        (status_code, alert).into_response()
    }
}
