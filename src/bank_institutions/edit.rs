//! Institution editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
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
        db::{get_accounts_for_institution, get_institution},
        form::{
            initial_form_data, institution_form_view, save_institution_form,
            validate_institution_form,
        },
    },
    endpoints,
    form::{FormData, FormErrors},
    html::{FormTarget, form_page},
    navigation::NavBar,
};

/// The state needed for editing an institution.
#[derive(Debug, Clone)]
pub struct EditInstitutionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditInstitutionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the institution editing page.
pub async fn get_edit_institution_page(
    Path(institution_id): Path<InstitutionId>,
    State(state): State<EditInstitutionState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let institution = get_institution(institution_id, &connection)?;
    let accounts = get_accounts_for_institution(institution_id, &connection)?;
    let update_endpoint = endpoints::format_endpoint(endpoints::INSTITUTION, institution_id);

    let form = institution_form_view(
        FormTarget::Update(&update_endpoint),
        &initial_form_data(&institution, &accounts),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Edit Institution",
        NavBar::new(endpoints::INSTITUTIONS_VIEW).into_html(),
        "Edit banking institution & accounts",
        form,
    )
    .into_response())
}

/// Handle institution update form submission.
pub async fn update_institution_endpoint(
    Path(institution_id): Path<InstitutionId>,
    State(state): State<EditInstitutionState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let accounts = match get_accounts_for_institution(institution_id, &connection)
        .and_then(|accounts| get_institution(institution_id, &connection).map(|_| accounts))
    {
        Ok(accounts) => accounts,
        Err(Error::NotFound) => return Error::UpdateMissing("institution").into_alert_response(),
        Err(error) => return error.into_alert_response(),
    };

    let data = FormData::new(pairs);
    let update_endpoint = endpoints::format_endpoint(endpoints::INSTITUTION, institution_id);

    let form = match validate_institution_form(&data, &accounts) {
        Ok(form) => form,
        Err(errors) => {
            return institution_form_view(FormTarget::Update(&update_endpoint), &data, &errors)
                .into_response();
        }
    };

    match save_institution_form(Some(institution_id), &form, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::INSTITUTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not update institution {institution_id}: {error}");
            error.into_alert_response()
        }
    }
}
