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
    investments::{
        dashboard::InvestmentsState,
        db::{get_investment, get_investment_details},
        domain::InvestmentId,
        form::{
            initial_form_data, investment_form_view, save_investment_form,
            validate_investment_form,
        },
    },
    navigation::NavBar,
};

pub async fn get_edit_investment_page(
    Path(investment_id): Path<InvestmentId>,
    State(state): State<InvestmentsState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let investment = get_investment(investment_id, &connection)?;
    let details = get_investment_details(investment_id, &connection)?;
    let update_endpoint = endpoints::format_endpoint(endpoints::INVESTMENT, investment_id);

    let form = investment_form_view(
        FormTarget::Update(&update_endpoint),
        &initial_form_data(&investment, &details),
        &FormErrors::new(),
    );

    Ok(form_page(
        "Edit Investment",
        NavBar::new(endpoints::INVESTMENTS_VIEW).into_html(),
        "Edit investment",
        form,
    )
    .into_response())
}

pub async fn update_investment_endpoint(
    Path(investment_id): Path<InvestmentId>,
    State(state): State<InvestmentsState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let details = match get_investment_details(investment_id, &connection) {
        Ok(details) => details,
        Err(error) => return error.into_alert_response(),
    };
    let data = FormData::new(pairs);
    let update_endpoint = endpoints::format_endpoint(endpoints::INVESTMENT, investment_id);

    let form = match validate_investment_form(&data, &details) {
        Ok(form) => form,
        Err(errors) => {
            return investment_form_view(FormTarget::Update(&update_endpoint), &data, &errors)
                .into_response();
        }
    };

    match save_investment_form(Some(investment_id), &form, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::INVESTMENTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not update investment {investment_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        choices::DetailStatus,
        endpoints,
        investments::{dashboard::InvestmentsState, get_investment, get_investment_details},
        money::Money,
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_hx_redirect, fixtures,
            form_pairs, get_test_connection, must_get_form, parse_html_document, shared,
        },
    };

    use super::{get_edit_investment_page, update_investment_endpoint};

    #[tokio::test]
    async fn form_is_filled_in() {
        let connection = get_test_connection();
        let investment = fixtures::investment(&connection);
        let state = InvestmentsState {
            db_connection: shared(connection),
        };

        let response = get_edit_investment_page(Path(investment.id), State(state))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::INVESTMENT, investment.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "name", "GIC");
        assert_form_input_with_value(&form, "investmentdetail_set-0-detail_status", "v");
        assert_form_input_with_value(&form, "investmentdetail_set-1-amount", "12.50");
        assert_form_input_with_value(&form, "investmentdetail_set-2-date_investment", "");
    }

    #[tokio::test]
    async fn updates_investment_and_details() {
        let connection = get_test_connection();
        let investment = fixtures::investment(&connection);
        let details = get_investment_details(investment.id, &connection).unwrap();
        let (first_id, second_id) = (details[0].id.to_string(), details[1].id.to_string());
        let state = InvestmentsState {
            db_connection: shared(connection),
        };

        let response = update_investment_endpoint(
            Path(investment.id),
            State(state.clone()),
            form_pairs(&[
                ("name", "GIC 2017"),
                ("rate", "1.25% for 1 year"),
                ("investmentdetail_set-0-id", &first_id),
                ("investmentdetail_set-0-date_investment", "2017-01-10"),
                ("investmentdetail_set-0-detail_status", "v"),
                ("investmentdetail_set-0-amount", "1000.00"),
                ("investmentdetail_set-1-id", &second_id),
                ("investmentdetail_set-1-DELETE", "on"),
                ("investmentdetail_set-2-id", ""),
                ("investmentdetail_set-2-date_investment", "2018-01-10"),
                ("investmentdetail_set-2-detail_status", "m"),
                ("investmentdetail_set-2-amount", "1000.00"),
            ]),
        )
        .await;

        assert_hx_redirect(&response, endpoints::INVESTMENTS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_investment(investment.id, &connection).unwrap().name, "GIC 2017");
        let details = get_investment_details(investment.id, &connection).unwrap();
        let statuses: Vec<DetailStatus> = details.iter().map(|detail| detail.detail_status).collect();
        assert_eq!(statuses, [DetailStatus::Invested, DetailStatus::Matured]);
        assert_eq!(details[1].amount, Money::from_cents(100_000));
    }

    #[tokio::test]
    async fn missing_investment_is_not_found() {
        let state = InvestmentsState {
            db_connection: shared(get_test_connection()),
        };

        let response = update_investment_endpoint(
            Path(5),
            State(state),
            form_pairs(&[("name", "GIC"), ("rate", "1%")]),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
