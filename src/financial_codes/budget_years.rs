//! Pages and endpoints for budget years, including copying a year's groups and
//! codes into a new year.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    Error, endpoints,
    financial_codes::{
        BudgetYearId,
        dashboard::{FinancialCodesState, redirect_to_dashboard},
        db::{
            copy_budget_year, create_budget_year, delete_budget_year, get_all_systems,
            get_budget_year, get_system, update_budget_year,
        },
        domain::{BudgetYearDetails, FinancialCodeSystem},
        form::{
            budget_year_form_data, budget_year_form_view, system_options,
            validate_budget_year_form,
        },
    },
    form::{FormData, FormErrors},
    html::{FormTarget, confirm_delete_view, form_page},
    navigation::NavBar,
};

pub async fn get_new_budget_year_page(
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let systems = get_all_systems(&connection)?;
    let form = budget_year_form_view(
        FormTarget::Create(endpoints::POST_BUDGET_YEAR),
        &system_options(&systems),
        &FormData::default(),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Add Budget Year",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        "Add budget year",
        form,
    )
    .into_response())
}

/// Validate `data` against the current systems, or render the form again.
fn validate(
    data: &FormData,
    target: FormTarget,
    connection: &Connection,
) -> Result<BudgetYearDetails, Response> {
    let systems: Vec<FinancialCodeSystem> =
        get_all_systems(connection).map_err(|error| error.into_alert_response())?;

    validate_budget_year_form(data, &systems).map_err(|errors| {
        budget_year_form_view(target, &system_options(&systems), data, &errors).into_response()
    })
}

pub async fn create_budget_year_endpoint(
    State(state): State<FinancialCodesState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let data = FormData::new(pairs);
    let details = match validate(
        &data,
        FormTarget::Create(endpoints::POST_BUDGET_YEAR),
        &connection,
    ) {
        Ok(details) => details,
        Err(response) => return response,
    };

    match create_budget_year(&details, &connection) {
        Ok(budget_year) => {
            tracing::info!("Created budget year {}", budget_year.id);
            redirect_to_dashboard()
        }
        Err(error) => {
            tracing::error!("Could not create budget year: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn get_edit_budget_year_page(
    Path(budget_year_id): Path<BudgetYearId>,
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget_year = get_budget_year(budget_year_id, &connection)?;
    let systems = get_all_systems(&connection)?;
    let update_endpoint = endpoints::format_endpoint(endpoints::BUDGET_YEAR, budget_year_id);

    let form = budget_year_form_view(
        FormTarget::Update(&update_endpoint),
        &system_options(&systems),
        &budget_year_form_data(&budget_year),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Edit Budget Year",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        "Edit budget year",
        form,
    )
    .into_response())
}

pub async fn update_budget_year_endpoint(
    Path(budget_year_id): Path<BudgetYearId>,
    State(state): State<FinancialCodesState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let data = FormData::new(pairs);
    let update_endpoint = endpoints::format_endpoint(endpoints::BUDGET_YEAR, budget_year_id);
    let details = match validate(&data, FormTarget::Update(&update_endpoint), &connection) {
        Ok(details) => details,
        Err(response) => return response,
    };

    match update_budget_year(budget_year_id, &details, &connection) {
        Ok(_) => redirect_to_dashboard(),
        Err(error) => {
            tracing::error!("Could not update budget year {budget_year_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Render a blank budget year form for the same system as the copied year.
pub async fn get_copy_budget_year_page(
    Path(budget_year_id): Path<BudgetYearId>,
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let source = get_budget_year(budget_year_id, &connection)?;
    let system = get_system(source.system_id, &connection)?;
    let copy_endpoint = endpoints::format_endpoint(endpoints::COPY_BUDGET_YEAR, budget_year_id);

    let mut data = FormData::default();
    data.push("financial_code_system", system.id.to_string());

    let form = budget_year_form_view(
        FormTarget::Create(&copy_endpoint),
        &system_options(std::slice::from_ref(&system)),
        &data,
        &FormErrors::new(),
    );

    Ok(form_page(
        "Copy Budget Year",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        &format!("Copy {} {}", system.title, source.short_name),
        form,
    )
    .into_response())
}

/// Create a budget year holding a copy of every group and code of the year
/// in the path.
pub async fn copy_budget_year_endpoint(
    Path(budget_year_id): Path<BudgetYearId>,
    State(state): State<FinancialCodesState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let data = FormData::new(pairs);
    let copy_endpoint = endpoints::format_endpoint(endpoints::COPY_BUDGET_YEAR, budget_year_id);
    let details = match validate(&data, FormTarget::Create(&copy_endpoint), &connection) {
        Ok(details) => details,
        Err(response) => return response,
    };

    let result = connection
        .unchecked_transaction()
        .map_err(Error::from)
        .and_then(|transaction| {
            let budget_year = copy_budget_year(budget_year_id, &details, &transaction)?;
            transaction.commit()?;
            Ok(budget_year)
        });

    match result {
        Ok(budget_year) => {
            tracing::info!(
                "Copied budget year {budget_year_id} into budget year {}",
                budget_year.id
            );
            redirect_to_dashboard()
        }
        Err(error) => {
            tracing::error!("Could not copy budget year {budget_year_id}: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn get_delete_budget_year_page(
    Path(budget_year_id): Path<BudgetYearId>,
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget_year = get_budget_year(budget_year_id, &connection)?;

    Ok(confirm_delete_view(
        "Delete Budget Year",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        &format!("budget year {} ({budget_year})", budget_year.short_name),
        &endpoints::format_endpoint(endpoints::BUDGET_YEAR, budget_year_id),
        endpoints::FINANCIAL_CODES_VIEW,
    )
    .into_response())
}

pub async fn delete_budget_year_endpoint(
    Path(budget_year_id): Path<BudgetYearId>,
    State(state): State<FinancialCodesState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget_year(budget_year_id, &connection) {
        Ok(()) => redirect_to_dashboard(),
        Err(error) => error.into_alert_response(),
    }
}
