//! Pages and endpoints for financial codes.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    Error, endpoints,
    financial_codes::{
        FinancialCodeId,
        dashboard::{FinancialCodesState, redirect_to_dashboard},
        db::{create_code, delete_code, get_code, update_code},
        domain::FinancialCodeDetails,
        form::{code_form_data, code_form_view, group_options, validate_code_form},
    },
    form::{FormData, FormErrors},
    html::{FormTarget, confirm_delete_view, form_page},
    navigation::NavBar,
};

pub async fn get_new_code_page(
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let form = code_form_view(
        FormTarget::Create(endpoints::POST_CODE),
        &group_options(&connection)?,
        &FormData::default(),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Add Financial Code",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        "Add financial code",
        form,
    )
    .into_response())
}

fn validate(
    data: &FormData,
    target: FormTarget,
    connection: &Connection,
) -> Result<FinancialCodeDetails, Response> {
    let groups = group_options(connection).map_err(|error| error.into_alert_response())?;

    validate_code_form(data, &groups)
        .map_err(|errors| code_form_view(target, &groups, data, &errors).into_response())
}

pub async fn create_code_endpoint(
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
    let details = match validate(&data, FormTarget::Create(endpoints::POST_CODE), &connection) {
        Ok(details) => details,
        Err(response) => return response,
    };

    match create_code(&details, &connection) {
        Ok(code) => {
            tracing::info!("Created financial code {}", code.id);
            redirect_to_dashboard()
        }
        Err(error) => {
            tracing::error!("Could not create financial code: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn get_edit_code_page(
    Path(code_id): Path<FinancialCodeId>,
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let code = get_code(code_id, &connection)?;
    let update_endpoint = endpoints::format_endpoint(endpoints::CODE, code_id);

    let form = code_form_view(
        FormTarget::Update(&update_endpoint),
        &group_options(&connection)?,
        &code_form_data(&code),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Edit Financial Code",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        "Edit financial code",
        form,
    )
    .into_response())
}

pub async fn update_code_endpoint(
    Path(code_id): Path<FinancialCodeId>,
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
    let update_endpoint = endpoints::format_endpoint(endpoints::CODE, code_id);
    let details = match validate(&data, FormTarget::Update(&update_endpoint), &connection) {
        Ok(details) => details,
        Err(response) => return response,
    };

    match update_code(code_id, &details, &connection) {
        Ok(_) => redirect_to_dashboard(),
        Err(error) => {
            tracing::error!("Could not update financial code {code_id}: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn get_delete_code_page(
    Path(code_id): Path<FinancialCodeId>,
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let code = get_code(code_id, &connection)?;

    Ok(confirm_delete_view(
        "Delete Financial Code",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        &code.to_string(),
        &endpoints::format_endpoint(endpoints::CODE, code_id),
        endpoints::FINANCIAL_CODES_VIEW,
    )
    .into_response())
}

pub async fn delete_code_endpoint(
    Path(code_id): Path<FinancialCodeId>,
    State(state): State<FinancialCodesState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_code(code_id, &connection) {
        Ok(()) => redirect_to_dashboard(),
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        choices::Kind,
        endpoints,
        financial_codes::{FinancialCode, FinancialCodesState, get_code, get_codes},
        test_utils::{
            assert_form_has_error, assert_form_input, assert_form_input_with_value,
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, fixtures, form_pairs,
            get_test_connection, must_get_form, parse_html_document, parse_html_fragment, shared,
        },
    };

    use super::{
        create_code_endpoint, delete_code_endpoint, get_edit_code_page, get_new_code_page,
        update_code_endpoint,
    };

    fn state_with_code() -> (FinancialCodesState, FinancialCode) {
        let connection = get_test_connection();
        let code = fixtures::financial_code(&connection, Kind::Expense);

        (
            FinancialCodesState {
                db_connection: shared(connection),
            },
            code,
        )
    }

    #[tokio::test]
    async fn new_page_lists_groups() {
        let (state, _) = state_with_code();

        let response = get_new_code_page(State(state)).await.unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_CODE, "hx-post");
        assert_form_input(&form, "financial_code_group", "select");
        assert_form_input(&form, "code", "text");
        assert_form_input(&form, "description", "text");
        assert!(html.html().contains("CASBA 2017 Expense - Travel"));
    }

    #[tokio::test]
    async fn creates_code() {
        let (state, code) = state_with_code();
        let group = code.group_id.to_string();

        let response = create_code_endpoint(
            State(state.clone()),
            form_pairs(&[
                ("financial_code_group", &group),
                ("code", "5100"),
                ("description", "Airfare"),
            ]),
        )
        .await;

        assert_hx_redirect(&response, endpoints::FINANCIAL_CODES_VIEW);
        let codes = get_codes(code.group_id, &state.db_connection.lock().unwrap()).unwrap();
        let labels: Vec<String> = codes.iter().map(|code| code.to_string()).collect();
        assert_eq!(labels, ["5000 - Mileage", "5100 - Airfare"]);
    }

    #[tokio::test]
    async fn long_code_is_rejected() {
        let (state, code) = state_with_code();
        let group = code.group_id.to_string();

        let response = create_code_endpoint(
            State(state),
            form_pairs(&[
                ("financial_code_group", &group),
                ("code", "5100000"),
                ("description", "Airfare"),
            ]),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_form_has_error(
            &must_get_form(&html),
            "Ensure this value has at most 6 characters (it has 7).",
        );
    }

    #[tokio::test]
    async fn edit_page_is_filled_in() {
        let (state, code) = state_with_code();

        let response = get_edit_code_page(Path(code.id), State(state))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::CODE, code.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "financial_code_group", &code.group_id.to_string());
        assert_form_input_with_value(&form, "code", "5000");
    }

    #[tokio::test]
    async fn updates_code() {
        let (state, code) = state_with_code();
        let group = code.group_id.to_string();

        let response = update_code_endpoint(
            Path(code.id),
            State(state.clone()),
            form_pairs(&[
                ("financial_code_group", &group),
                ("code", "5000"),
                ("description", "Kilometres"),
            ]),
        )
        .await;

        assert_hx_redirect(&response, endpoints::FINANCIAL_CODES_VIEW);
        let code = get_code(code.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(code.description, "Kilometres");
    }

    #[tokio::test]
    async fn deletes_unused_code() {
        let (state, code) = state_with_code();

        let response = delete_code_endpoint(Path(code.id), State(state.clone())).await;

        assert_hx_redirect(&response, endpoints::FINANCIAL_CODES_VIEW);
        assert!(get_code(code.id, &state.db_connection.lock().unwrap()).is_err());
    }

    #[tokio::test]
    async fn delete_missing_code_is_not_found() {
        let (state, _) = state_with_code();

        let response = delete_code_endpoint(Path(999), State(state)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
