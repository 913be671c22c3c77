use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error, endpoints,
    html::confirm_delete_view,
    investments::{
        dashboard::InvestmentsState,
        db::{delete_investment, get_investment},
        domain::InvestmentId,
    },
    navigation::NavBar,
};

pub async fn get_delete_investment_page(
    Path(investment_id): Path<InvestmentId>,
    State(state): State<InvestmentsState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let investment = get_investment(investment_id, &connection)?;

    Ok(confirm_delete_view(
        "Delete Investment",
        NavBar::new(endpoints::INVESTMENTS_VIEW).into_html(),
        &investment.to_string(),
        &endpoints::format_endpoint(endpoints::INVESTMENT, investment_id),
        endpoints::INVESTMENTS_VIEW,
    )
    .into_response())
}

/// Delete an investment and its details.
pub async fn delete_investment_endpoint(
    Path(investment_id): Path<InvestmentId>,
    State(state): State<InvestmentsState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_investment(investment_id, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::INVESTMENTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
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
        Error, endpoints,
        investments::{dashboard::InvestmentsState, get_investment},
        test_utils::{
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, fixtures,
            get_test_connection, must_get_form, parse_html_document, shared,
        },
    };

    use super::{delete_investment_endpoint, get_delete_investment_page};

    #[tokio::test]
    async fn confirmation_page_names_investment() {
        let connection = get_test_connection();
        let investment = fixtures::investment(&connection);
        let state = InvestmentsState {
            db_connection: shared(connection),
        };

        let response = get_delete_investment_page(Path(investment.id), State(state))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::INVESTMENT, investment.id),
            "hx-delete",
        );
        assert!(form.text().collect::<String>().contains("GIC"));
    }

    #[tokio::test]
    async fn deletes_investment() {
        let connection = get_test_connection();
        let investment = fixtures::investment(&connection);
        let state = InvestmentsState {
            db_connection: shared(connection),
        };

        let response = delete_investment_endpoint(Path(investment.id), State(state.clone())).await;

        assert_hx_redirect(&response, endpoints::INVESTMENTS_VIEW);
        assert_eq!(
            get_investment(investment.id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn missing_investment_is_not_found() {
        let state = InvestmentsState {
            db_connection: shared(get_test_connection()),
        };

        let response = delete_investment_endpoint(Path(3), State(state)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
