//! Institution creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    bank_institutions::form::{
        blank_form_data, institution_form_view, save_institution_form, validate_institution_form,
    },
    endpoints,
    form::{FormData, FormErrors},
    html::{FormTarget, form_page},
    navigation::NavBar,
};

/// The state needed for creating an institution.
#[derive(Debug, Clone)]
pub struct CreateInstitutionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateInstitutionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn get_new_institution_page() -> Response {
    let form = institution_form_view(
        FormTarget::Create(endpoints::POST_INSTITUTION),
        &blank_form_data(),
        &FormErrors::new(),
    );

    form_page(
        "Add Institution",
        NavBar::new(endpoints::NEW_INSTITUTION_VIEW).into_html(),
        "Add banking institution & accounts",
        form,
    )
    .into_response()
}

/// Handle institution creation form submission.
pub async fn create_institution_endpoint(
    State(state): State<CreateInstitutionState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let data = FormData::new(pairs);

    let form = match validate_institution_form(&data, &[]) {
        Ok(form) => form,
        Err(errors) => {
            return institution_form_view(
                FormTarget::Create(endpoints::POST_INSTITUTION),
                &data,
                &errors,
            )
            .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match save_institution_form(None, &form, &connection) {
        Ok(institution) => {
            tracing::info!("Created institution {}", institution.id);
            (
                HxRedirect(endpoints::INSTITUTIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not create institution: {error}");
            error.into_alert_response()
        }
    }
}


#[cfg(test)]
mod create_institution_endpoint_tests {
    use axum::{extract::State, http::StatusCode};

    use crate::{
        bank_institutions::{get_accounts_for_institution, get_all_institutions},
        endpoints,
        test_utils::{
            assert_form_has_error, assert_hx_redirect, assert_valid_html, form_pairs,
            get_test_connection, must_get_form, parse_html_fragment, shared,
        },
    };

    use super::{CreateInstitutionState, create_institution_endpoint};

    #[tokio::test]
    async fn creates_institution_and_accounts() {
        let state = CreateInstitutionState {
            db_connection: shared(get_test_connection()),
        };

        let response = create_institution_endpoint(
            State(state.clone()),
            form_pairs(&[
                ("name", "Credit Union"),
                ("address", "1 Main St"),
                ("phone", "555"),
                ("fax", "556"),
                ("account_set-0-id", ""),
                ("account_set-0-account_number", "001"),
                ("account_set-0-name", "Chequing"),
                ("account_set-0-status", "a"),
                ("account_set-1-id", ""),
                ("account_set-1-account_number", ""),
                ("account_set-1-name", ""),
                ("account_set-1-status", ""),
            ]),
        )
        .await;

        assert_hx_redirect(&response, endpoints::INSTITUTIONS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let institutions = get_all_institutions(&connection).unwrap();
        assert_eq!(institutions.len(), 1);
        let accounts = get_accounts_for_institution(institutions[0].id, &connection).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "Chequing");
    }

    #[tokio::test]
    async fn invalid_form_is_rendered_with_errors() {
        let state = CreateInstitutionState {
            db_connection: shared(get_test_connection()),
        };

        let response =
            create_institution_endpoint(State(state), form_pairs(&[("name", "Credit Union")])).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_has_error(&form, "This field is required.");
    }
}
