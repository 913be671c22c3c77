//! Pages and endpoints for financial code systems.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error, endpoints,
    financial_codes::{
        SystemId,
        dashboard::{FinancialCodesState, redirect_to_dashboard},
        db::{create_system, delete_system, get_system, update_system},
        form::{system_form_data, system_form_view, validate_system_form},
    },
    form::{FormData, FormErrors},
    html::{FormTarget, confirm_delete_view, form_page},
    navigation::NavBar,
};

pub async fn get_new_system_page() -> Response {
    let form = system_form_view(
        FormTarget::Create(endpoints::POST_SYSTEM),
        &FormData::default(),
        &FormErrors::new(),
    );

    form_page(
        "Add Financial Code System",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        "Add financial code system",
        form,
    )
    .into_response()
}

pub async fn create_system_endpoint(
    State(state): State<FinancialCodesState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let data = FormData::new(pairs);

    let details = match validate_system_form(&data) {
        Ok(details) => details,
        Err(errors) => {
            return system_form_view(FormTarget::Create(endpoints::POST_SYSTEM), &data, &errors)
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

    match create_system(&details, &connection) {
        Ok(system) => {
            tracing::info!("Created financial code system {}", system.id);
            redirect_to_dashboard()
        }
        Err(error) => {
            tracing::error!("Could not create financial code system: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn get_edit_system_page(
    Path(system_id): Path<SystemId>,
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let system = get_system(system_id, &connection)?;
    let update_endpoint = endpoints::format_endpoint(endpoints::SYSTEM, system_id);

    let form = system_form_view(
        FormTarget::Update(&update_endpoint),
        &system_form_data(&system),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Edit Financial Code System",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        "Edit financial code system",
        form,
    )
    .into_response())
}

pub async fn update_system_endpoint(
    Path(system_id): Path<SystemId>,
    State(state): State<FinancialCodesState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let data = FormData::new(pairs);
    let update_endpoint = endpoints::format_endpoint(endpoints::SYSTEM, system_id);

    let details = match validate_system_form(&data) {
        Ok(details) => details,
        Err(errors) => {
            return system_form_view(FormTarget::Update(&update_endpoint), &data, &errors)
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

    match update_system(system_id, &details, &connection) {
        Ok(_) => redirect_to_dashboard(),
        Err(error) => {
            tracing::error!("Could not update financial code system {system_id}: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn get_delete_system_page(
    Path(system_id): Path<SystemId>,
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let system = get_system(system_id, &connection)?;

    Ok(confirm_delete_view(
        "Delete Financial Code System",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        &system.to_string(),
        &endpoints::format_endpoint(endpoints::SYSTEM, system_id),
        endpoints::FINANCIAL_CODES_VIEW,
    )
    .into_response())
}

pub async fn delete_system_endpoint(
    Path(system_id): Path<SystemId>,
    State(state): State<FinancialCodesState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_system(system_id, &connection) {
        Ok(()) => redirect_to_dashboard(),
        Err(error) => error.into_alert_response(),
    }
}
