use axum::{
    Form,
    extract::{Path, State},
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
        PayeePayerId,
        dashboard::PayeePayersState,
        db::{get_countries, get_payee_payer, update_payee_payer},
        form::{
            DUPLICATE_NAME_MESSAGE, payee_payer_form_data, payee_payer_form_view,
            validate_payee_payer_form,
        },
    },
};

pub async fn get_edit_payee_payer_page(
    Path(payee_payer_id): Path<PayeePayerId>,
    State(state): State<PayeePayersState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let payee_payer = get_payee_payer(payee_payer_id, &connection)?;
    let update_endpoint = endpoints::format_endpoint(endpoints::PAYEE_PAYER, payee_payer_id);

    let form = payee_payer_form_view(
        FormTarget::Update(&update_endpoint),
        &get_countries(&connection)?,
        &payee_payer_form_data(&payee_payer),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Edit Payee/Payer",
        NavBar::new(endpoints::PAYEE_PAYERS_VIEW).into_html(),
        "Edit payee/payer",
        form,
    )
    .into_response())
}

pub async fn update_payee_payer_endpoint(
    Path(payee_payer_id): Path<PayeePayerId>,
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
    let update_endpoint = endpoints::format_endpoint(endpoints::PAYEE_PAYER, payee_payer_id);
    let target = FormTarget::Update(&update_endpoint);

    let details = match validate_payee_payer_form(&data, &countries) {
        Ok(details) => details,
        Err(errors) => {
            return payee_payer_form_view(target, &countries, &data, &errors).into_response();
        }
    };

    match update_payee_payer(payee_payer_id, &details, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::PAYEE_PAYERS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UniqueConstraint(_)) => {
            let mut errors = FormErrors::new();
            errors.add("name", DUPLICATE_NAME_MESSAGE);
            payee_payer_form_view(target, &countries, &data, &errors).into_response()
        }
        Err(error) => {
            tracing::error!("Could not update payee/payer {payee_payer_id}: {error}");
            error.into_alert_response()
        }
    }
}
