use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error, endpoints,
    html::confirm_delete_view,
    navigation::NavBar,
    payee_payers::{
        PayeePayerId,
        dashboard::PayeePayersState,
        db::{delete_payee_payer, get_payee_payer},
    },
};

pub async fn get_delete_payee_payer_page(
    Path(payee_payer_id): Path<PayeePayerId>,
    State(state): State<PayeePayersState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let payee_payer = get_payee_payer(payee_payer_id, &connection)?;

    Ok(confirm_delete_view(
        "Delete Payee/Payer",
        NavBar::new(endpoints::PAYEE_PAYERS_VIEW).into_html(),
        &payee_payer.name,
        &endpoints::format_endpoint(endpoints::PAYEE_PAYER, payee_payer_id),
        endpoints::PAYEE_PAYERS_VIEW,
    )
    .into_response())
}

/// Delete a payee/payer, refused while financial transactions refer to it.
pub async fn delete_payee_payer_endpoint(
    Path(payee_payer_id): Path<PayeePayerId>,
    State(state): State<PayeePayersState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_payee_payer(payee_payer_id, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::PAYEE_PAYERS_VIEW.to_owned()),
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
        choices::Kind,
        endpoints,
        payee_payers::{dashboard::PayeePayersState, get_payee_payer},
        test_utils::{
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, fixtures,
            get_test_connection, must_get_form, parse_html_document, shared,
        },
    };

    use super::{delete_payee_payer_endpoint, get_delete_payee_payer_page};

    #[tokio::test]
    async fn confirmation_page_targets_endpoint() {
        let connection = get_test_connection();
        let payee_payer = fixtures::payee_payer(&connection, "Jane Doe");
        let state = PayeePayersState {
            db_connection: shared(connection),
        };

        let response = get_delete_payee_payer_page(Path(payee_payer.id), State(state))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_hx_endpoint(
            &must_get_form(&html),
            &endpoints::format_endpoint(endpoints::PAYEE_PAYER, payee_payer.id),
            "hx-delete",
        );
    }

    #[tokio::test]
    async fn deletes_payee_payer() {
        let connection = get_test_connection();
        let payee_payer = fixtures::payee_payer(&connection, "Jane Doe");
        let state = PayeePayersState {
            db_connection: shared(connection),
        };

        let response = delete_payee_payer_endpoint(Path(payee_payer.id), State(state.clone())).await;

        assert_hx_redirect(&response, endpoints::PAYEE_PAYERS_VIEW);
        assert!(get_payee_payer(payee_payer.id, &state.db_connection.lock().unwrap()).is_err());
    }

    #[tokio::test]
    async fn payee_payer_with_transactions_is_kept() {
        let connection = get_test_connection();
        let transaction = fixtures::financial_transaction(&connection, Kind::Revenue);
        let state = PayeePayersState {
            db_connection: shared(connection),
        };

        let response =
            delete_payee_payer_endpoint(Path(transaction.payee_payer_id), State(state)).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
