//! Pages and endpoints for financial code groups.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    Error, endpoints,
    financial_codes::{
        GroupId,
        dashboard::{FinancialCodesState, redirect_to_dashboard},
        db::{create_group, delete_group, get_group, update_group},
        domain::GroupDetails,
        form::{budget_year_options, group_form_data, group_form_view, validate_group_form},
    },
    form::{FormData, FormErrors},
    html::{FormTarget, confirm_delete_view, form_page},
    navigation::NavBar,
};

pub async fn get_new_group_page(
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let form = group_form_view(
        FormTarget::Create(endpoints::POST_GROUP),
        &budget_year_options(&connection)?,
        &FormData::default(),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Add Financial Code Group",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        "Add financial code group",
        form,
    )
    .into_response())
}

fn validate(
    data: &FormData,
    target: FormTarget,
    connection: &Connection,
) -> Result<GroupDetails, Response> {
    let budget_years =
        budget_year_options(connection).map_err(|error| error.into_alert_response())?;

    validate_group_form(data, &budget_years)
        .map_err(|errors| group_form_view(target, &budget_years, data, &errors).into_response())
}

pub async fn create_group_endpoint(
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
    let details = match validate(&data, FormTarget::Create(endpoints::POST_GROUP), &connection) {
        Ok(details) => details,
        Err(response) => return response,
    };

    match create_group(&details, &connection) {
        Ok(group) => {
            tracing::info!("Created financial code group {}", group.id);
            redirect_to_dashboard()
        }
        Err(error) => {
            tracing::error!("Could not create financial code group: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn get_edit_group_page(
    Path(group_id): Path<GroupId>,
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let group = get_group(group_id, &connection)?;
    let update_endpoint = endpoints::format_endpoint(endpoints::GROUP, group_id);

    let form = group_form_view(
        FormTarget::Update(&update_endpoint),
        &budget_year_options(&connection)?,
        &group_form_data(&group),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Edit Financial Code Group",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        "Edit financial code group",
        form,
    )
    .into_response())
}

pub async fn update_group_endpoint(
    Path(group_id): Path<GroupId>,
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
    let update_endpoint = endpoints::format_endpoint(endpoints::GROUP, group_id);
    let details = match validate(&data, FormTarget::Update(&update_endpoint), &connection) {
        Ok(details) => details,
        Err(response) => return response,
    };

    match update_group(group_id, &details, &connection) {
        Ok(_) => redirect_to_dashboard(),
        Err(error) => {
            tracing::error!("Could not update financial code group {group_id}: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn get_delete_group_page(
    Path(group_id): Path<GroupId>,
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let group = get_group(group_id, &connection)?;

    Ok(confirm_delete_view(
        "Delete Financial Code Group",
        NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html(),
        &group.to_string(),
        &endpoints::format_endpoint(endpoints::GROUP, group_id),
        endpoints::FINANCIAL_CODES_VIEW,
    )
    .into_response())
}

pub async fn delete_group_endpoint(
    Path(group_id): Path<GroupId>,
    State(state): State<FinancialCodesState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_group(group_id, &connection) {
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
        choices::{Kind, Status},
        endpoints,
        financial_codes::{FinancialCode, FinancialCodesState, get_group, get_groups},
        form::INVALID_CHOICE_MESSAGE,
        test_utils::{
            assert_form_has_error, assert_form_input, assert_form_input_with_value,
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, fixtures, form_pairs,
            get_test_connection, must_get_form, parse_html_document, parse_html_fragment, shared,
        },
    };

    use super::{
        create_group_endpoint, delete_group_endpoint, get_delete_group_page, get_edit_group_page,
        get_new_group_page, update_group_endpoint,
    };

    fn state_with_code() -> (FinancialCodesState, FinancialCode, i64) {
        let connection = get_test_connection();
        let code = fixtures::financial_code(&connection, Kind::Expense);
        let budget_year_id = get_group(code.group_id, &connection)
            .unwrap()
            .budget_year_id;

        (
            FinancialCodesState {
                db_connection: shared(connection),
            },
            code,
            budget_year_id,
        )
    }

    #[tokio::test]
    async fn new_page_has_form() {
        let (state, _, budget_year_id) = state_with_code();

        let response = get_new_group_page(State(state)).await.unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_GROUP, "hx-post");
        assert_form_input(&form, "budget_year", "select");
        assert_form_input(&form, "title", "text");
        assert_form_input(&form, "type", "select");
        assert_form_input(&form, "status", "select");
        assert!(html.html().contains(&format!("value=\"{budget_year_id}\"")));
        assert!(html.html().contains("CASBA 2017"));
    }

    #[tokio::test]
    async fn creates_group() {
        let (state, _, budget_year_id) = state_with_code();
        let budget_year = budget_year_id.to_string();

        let response = create_group_endpoint(
            State(state.clone()),
            form_pairs(&[
                ("budget_year", &budget_year),
                ("title", "Grants"),
                ("description", "Government grants"),
                ("type", "r"),
                ("status", "a"),
            ]),
        )
        .await;

        assert_hx_redirect(&response, endpoints::FINANCIAL_CODES_VIEW);
        let groups = get_groups(budget_year_id, &state.db_connection.lock().unwrap()).unwrap();
        let grants = groups
            .iter()
            .find(|group| group.title == "Grants")
            .expect("Group was not created");
        assert_eq!(grants.kind, Kind::Revenue);
        assert_eq!(grants.description.as_deref(), Some("Government grants"));
    }

    #[tokio::test]
    async fn unknown_budget_year_is_rejected() {
        let (state, _, _) = state_with_code();

        let response = create_group_endpoint(
            State(state),
            form_pairs(&[
                ("budget_year", "999"),
                ("title", "Grants"),
                ("type", "r"),
                ("status", "a"),
            ]),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_form_has_error(&must_get_form(&html), INVALID_CHOICE_MESSAGE);
    }

    #[tokio::test]
    async fn edit_page_is_filled_in() {
        let (state, code, _) = state_with_code();

        let response = get_edit_group_page(Path(code.group_id), State(state))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::GROUP, code.group_id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "title", "Travel");
        assert_form_input_with_value(&form, "type", "e");
    }

    #[tokio::test]
    async fn updates_group() {
        let (state, code, budget_year_id) = state_with_code();
        let budget_year = budget_year_id.to_string();

        let response = update_group_endpoint(
            Path(code.group_id),
            State(state.clone()),
            form_pairs(&[
                ("budget_year", &budget_year),
                ("title", "Travel"),
                ("type", "e"),
                ("status", "i"),
            ]),
        )
        .await;

        assert_hx_redirect(&response, endpoints::FINANCIAL_CODES_VIEW);
        let group = get_group(code.group_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(group.status, Status::Inactive);
    }

    #[tokio::test]
    async fn delete_page_names_group() {
        let (state, code, _) = state_with_code();

        let response = get_delete_group_page(Path(code.group_id), State(state))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert!(html.html().contains("Expense - Travel"));
    }

    #[tokio::test]
    async fn group_with_codes_is_kept() {
        let (state, code, _) = state_with_code();

        let response = delete_group_endpoint(Path(code.group_id), State(state.clone())).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(get_group(code.group_id, &state.db_connection.lock().unwrap()).is_ok());
    }
}
