//! Institution deletion page and endpoint.

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
    bank_institutions::{
        InstitutionId,
        db::{delete_institution, get_institution},
    },
    endpoints,
    html::confirm_delete_view,
    navigation::NavBar,
};

/// The state needed for deleting an institution.
#[derive(Debug, Clone)]
pub struct DeleteInstitutionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteInstitutionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn get_delete_institution_page(
    Path(institution_id): Path<InstitutionId>,
    State(state): State<DeleteInstitutionState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let institution = get_institution(institution_id, &connection)?;

    Ok(confirm_delete_view(
        "Delete Institution",
        NavBar::new(endpoints::INSTITUTIONS_VIEW).into_html(),
        &format!("{institution} and all of its accounts"),
        &endpoints::format_endpoint(endpoints::INSTITUTION, institution_id),
        endpoints::INSTITUTIONS_VIEW,
    )
    .into_response())
}

/// Delete an institution and its accounts.
pub async fn delete_institution_endpoint(
    Path(institution_id): Path<InstitutionId>,
    State(state): State<DeleteInstitutionState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = connection
        .unchecked_transaction()
        .map_err(Error::from)
        .and_then(|transaction| {
            delete_institution(institution_id, &transaction)?;
            transaction.commit().map_err(Error::from)
        });

    match result {
        Ok(()) => (
            HxRedirect(endpoints::INSTITUTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
