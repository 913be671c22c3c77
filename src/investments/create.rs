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
    investments::{
        dashboard::InvestmentsState,
        form::{blank_form_data, investment_form_view, save_investment_form, validate_investment_form},
    },
    navigation::NavBar,
};

pub async fn get_new_investment_page() -> Response {
    let form = investment_form_view(
        FormTarget::Create(endpoints::POST_INVESTMENT),
        &blank_form_data(),
        &FormErrors::new(),
    );

    form_page(
        "Add Investment",
        NavBar::new(endpoints::INVESTMENTS_VIEW).into_html(),
        "Add investment",
        form,
    )
    .into_response()
}

pub async fn create_investment_endpoint(
    State(state): State<InvestmentsState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let data = FormData::new(pairs);

    let form = match validate_investment_form(&data, &[]) {
        Ok(form) => form,
        Err(errors) => {
            return investment_form_view(FormTarget::Create(endpoints::POST_INVESTMENT), &data, &errors)
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

    match save_investment_form(None, &form, &connection) {
        Ok(investment) => {
            tracing::info!("Created investment {}", investment.id);
            (
                HxRedirect(endpoints::INVESTMENTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not create investment: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode};

    use crate::{
        choices::DetailStatus,
        endpoints,
        form::REQUIRED_MESSAGE,
        investments::{dashboard::InvestmentsState, get_investment_summaries},
        money::Money,
        test_utils::{
            assert_form_has_error, assert_form_input, assert_form_input_with_value,
            assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, form_pairs, get_test_connection, must_get_form,
            parse_html_document, parse_html_fragment, shared,
        },
    };

    use super::{create_investment_endpoint, get_new_investment_page};

    #[tokio::test]
    async fn new_page_has_form_with_blank_details() {
        let response = get_new_investment_page().await;

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_INVESTMENT, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_input(&form, "rate", "text");
        assert_form_input_with_value(&form, "investmentdetail_set-0-date_investment", "");
        assert_form_input_with_value(&form, "investmentdetail_set-1-detail_status", "");
    }

    #[tokio::test]
    async fn creates_investment_with_details() {
        let state = InvestmentsState {
            db_connection: shared(get_test_connection()),
        };

        let response = create_investment_endpoint(
            State(state.clone()),
            form_pairs(&[
                ("name", "Term deposit"),
                ("rate", "3% for 2 years"),
                ("investmentdetail_set-0-id", ""),
                ("investmentdetail_set-0-date_investment", "2017-04-01"),
                ("investmentdetail_set-0-detail_status", "v"),
                ("investmentdetail_set-0-amount", "2500"),
                ("investmentdetail_set-1-id", ""),
            ]),
        )
        .await;

        assert_hx_redirect(&response, endpoints::INVESTMENTS_VIEW);
        let summaries = get_investment_summaries(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].details[0].detail_status, DetailStatus::Invested);
        assert_eq!(summaries[0].balance(), Money::from_cents(250_000));
    }

    #[tokio::test]
    async fn invalid_form_is_returned_with_errors() {
        let state = InvestmentsState {
            db_connection: shared(get_test_connection()),
        };

        let response = create_investment_endpoint(
            State(state),
            form_pairs(&[("name", "Term deposit"), ("rate", "")]),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_form_has_error(&must_get_form(&html), REQUIRED_MESSAGE);
    }
}
