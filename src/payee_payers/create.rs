use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error, endpoints,
    form::{FormData, FormErrors},
    html::{FormTarget, form_page},
    navigation::NavBar,
    payee_payers::{
        dashboard::PayeePayersState,
        db::{create_payee_payer, get_countries},
        form::{DUPLICATE_NAME_MESSAGE, payee_payer_form_view, validate_payee_payer_form},
    },
};

pub async fn get_new_payee_payer_page(
    State(state): State<PayeePayersState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let form = payee_payer_form_view(
        FormTarget::Create(endpoints::POST_PAYEE_PAYER),
        &get_countries(&connection)?,
        &FormData::default(),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Add Payee/Payer",
        NavBar::new(endpoints::PAYEE_PAYERS_VIEW).into_html(),
        "Add payee/payer",
        form,
    )
    .into_response())
}

pub async fn create_payee_payer_endpoint(
    State(state): State<PayeePayersState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let countries = match get_countries(&connection) {
        Ok(countries) => countries,
        Err(error) => return error.into_alert_response(),
    };
    let data = FormData::new(pairs);
    let target = FormTarget::Create(endpoints::POST_PAYEE_PAYER);

    let details = match validate_payee_payer_form(&data, &countries) {
        Ok(details) => details,
        Err(errors) => {
            return payee_payer_form_view(target, &countries, &data, &errors).into_response();
        }
    };

    match create_payee_payer(&details, &connection) {
        Ok(payee_payer) => {
            tracing::info!("Created payee/payer {}", payee_payer.id);
            (
                HxRedirect(endpoints::PAYEE_PAYERS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::UniqueConstraint(_)) => {
            let mut errors = FormErrors::new();
            errors.add("name", DUPLICATE_NAME_MESSAGE);
            payee_payer_form_view(target, &countries, &data, &errors).into_response()
        }
        Err(error) => {
            tracing::error!("Could not create payee/payer: {error}");
            error.into_alert_response()
        }
    }
}
