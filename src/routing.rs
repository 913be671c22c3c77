//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx, get_log_in_page, get_log_out, post_log_in},
    bank_institutions::{
        create_institution_endpoint, delete_institution_endpoint, get_delete_institution_page,
        get_edit_institution_page, get_institutions_page, get_new_institution_page,
        update_institution_endpoint,
    },
    bank_reconciliation::{
        get_reconciliation_page, match_transactions_endpoint, retrieve_matches,
        retrieve_transactions, unmatch_groups_endpoint, unmatch_transactions_endpoint,
    },
    bank_transactions::{
        create_statement_endpoint, delete_statement_endpoint, get_delete_statement_page,
        get_edit_statement_page, get_new_statement_page, get_statements_page,
        update_statement_endpoint,
    },
    documents::{MAX_UPLOAD_SIZE, get_attachment_file},
    endpoints,
    error_pages::{get_404_not_found, get_internal_server_error_page},
    financial_codes::{
        copy_budget_year_endpoint, create_budget_year_endpoint, create_code_endpoint,
        create_group_endpoint, create_system_endpoint, delete_budget_year_endpoint,
        delete_code_endpoint, delete_group_endpoint, delete_system_endpoint,
        get_copy_budget_year_page, get_delete_budget_year_page, get_delete_code_page,
        get_delete_group_page, get_delete_system_page, get_edit_budget_year_page,
        get_edit_code_page, get_edit_group_page, get_edit_system_page, get_financial_codes_page,
        get_new_budget_year_page, get_new_code_page, get_new_group_page, get_new_system_page,
        update_budget_year_endpoint, update_code_endpoint, update_group_endpoint,
        update_system_endpoint,
    },
    financial_transactions::{
        MAX_TRANSACTION_FILES, create_expense_endpoint, create_revenue_endpoint,
        delete_transaction_endpoint, get_code_forms, get_delete_transaction_page,
        get_edit_transaction_page, get_new_expense_page, get_new_revenue_page,
        get_transaction_list, get_transactions_page, update_transaction_endpoint,
    },
    investments::{
        create_investment_endpoint, delete_investment_endpoint, get_delete_investment_page,
        get_edit_investment_page, get_investments_page, get_new_investment_page,
        update_investment_endpoint,
    },
    payee_payers::{
        create_payee_payer_endpoint, delete_payee_payer_endpoint, get_delete_payee_payer_page,
        get_edit_payee_payer_page, get_new_payee_payer_page, get_payee_payer_list,
        get_payee_payers_page, update_payee_payer_endpoint,
    },
    reports::{get_balance_sheet_endpoint, get_reports_page},
};

/// The largest multipart body accepted, every attachment at the size limit
/// plus room for the text fields.
const UPLOAD_BODY_LIMIT: usize = (MAX_TRANSACTION_FILES + 1) * MAX_UPLOAD_SIZE;

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::INSTITUTIONS_VIEW, get(get_institutions_page))
        .route(endpoints::NEW_INSTITUTION_VIEW, get(get_new_institution_page))
        .route(
            endpoints::EDIT_INSTITUTION_VIEW,
            get(get_edit_institution_page),
        )
        .route(
            endpoints::DELETE_INSTITUTION_VIEW,
            get(get_delete_institution_page),
        )
        .route(endpoints::STATEMENTS_VIEW, get(get_statements_page))
        .route(endpoints::NEW_STATEMENT_VIEW, get(get_new_statement_page))
        .route(endpoints::EDIT_STATEMENT_VIEW, get(get_edit_statement_page))
        .route(
            endpoints::DELETE_STATEMENT_VIEW,
            get(get_delete_statement_page),
        )
        .route(endpoints::FINANCIAL_CODES_VIEW, get(get_financial_codes_page))
        .route(endpoints::NEW_SYSTEM_VIEW, get(get_new_system_page))
        .route(endpoints::EDIT_SYSTEM_VIEW, get(get_edit_system_page))
        .route(endpoints::DELETE_SYSTEM_VIEW, get(get_delete_system_page))
        .route(endpoints::NEW_BUDGET_YEAR_VIEW, get(get_new_budget_year_page))
        .route(
            endpoints::EDIT_BUDGET_YEAR_VIEW,
            get(get_edit_budget_year_page),
        )
        .route(
            endpoints::DELETE_BUDGET_YEAR_VIEW,
            get(get_delete_budget_year_page),
        )
        .route(
            endpoints::COPY_BUDGET_YEAR_VIEW,
            get(get_copy_budget_year_page),
        )
        .route(endpoints::NEW_GROUP_VIEW, get(get_new_group_page))
        .route(endpoints::EDIT_GROUP_VIEW, get(get_edit_group_page))
        .route(endpoints::DELETE_GROUP_VIEW, get(get_delete_group_page))
        .route(endpoints::NEW_CODE_VIEW, get(get_new_code_page))
        .route(endpoints::EDIT_CODE_VIEW, get(get_edit_code_page))
        .route(endpoints::DELETE_CODE_VIEW, get(get_delete_code_page))
        .route(endpoints::PAYEE_PAYERS_VIEW, get(get_payee_payers_page))
        .route(endpoints::NEW_PAYEE_PAYER_VIEW, get(get_new_payee_payer_page))
        .route(
            endpoints::EDIT_PAYEE_PAYER_VIEW,
            get(get_edit_payee_payer_page),
        )
        .route(
            endpoints::DELETE_PAYEE_PAYER_VIEW,
            get(get_delete_payee_payer_page),
        )
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::NEW_EXPENSE_VIEW, get(get_new_expense_page))
        .route(endpoints::NEW_REVENUE_VIEW, get(get_new_revenue_page))
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(
            endpoints::DELETE_TRANSACTION_VIEW,
            get(get_delete_transaction_page),
        )
        .route(endpoints::RECONCILIATION_VIEW, get(get_reconciliation_page))
        .route(endpoints::INVESTMENTS_VIEW, get(get_investments_page))
        .route(endpoints::NEW_INVESTMENT_VIEW, get(get_new_investment_page))
        .route(
            endpoints::EDIT_INVESTMENT_VIEW,
            get(get_edit_investment_page),
        )
        .route(
            endpoints::DELETE_INVESTMENT_VIEW,
            get(get_delete_investment_page),
        )
        .route(endpoints::ATTACHMENT, get(get_attachment_file))
        .route(endpoints::INCOME_STATEMENT_VIEW, get(get_reports_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // Routes called by htmx or fetch need the HX-Redirect header for auth redirects to work.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::POST_INSTITUTION, post(create_institution_endpoint))
            .route(
                endpoints::INSTITUTION,
                put(update_institution_endpoint).delete(delete_institution_endpoint),
            )
            .route(
                endpoints::POST_STATEMENT,
                post(create_statement_endpoint).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
            )
            .route(
                endpoints::STATEMENT,
                put(update_statement_endpoint)
                    .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
                    .delete(delete_statement_endpoint),
            )
            .route(endpoints::POST_SYSTEM, post(create_system_endpoint))
            .route(
                endpoints::SYSTEM,
                put(update_system_endpoint).delete(delete_system_endpoint),
            )
            .route(endpoints::POST_BUDGET_YEAR, post(create_budget_year_endpoint))
            .route(
                endpoints::BUDGET_YEAR,
                put(update_budget_year_endpoint).delete(delete_budget_year_endpoint),
            )
            .route(endpoints::COPY_BUDGET_YEAR, post(copy_budget_year_endpoint))
            .route(endpoints::POST_GROUP, post(create_group_endpoint))
            .route(
                endpoints::GROUP,
                put(update_group_endpoint).delete(delete_group_endpoint),
            )
            .route(endpoints::POST_CODE, post(create_code_endpoint))
            .route(
                endpoints::CODE,
                put(update_code_endpoint).delete(delete_code_endpoint),
            )
            .route(endpoints::PAYEE_PAYER_LIST, get(get_payee_payer_list))
            .route(endpoints::POST_PAYEE_PAYER, post(create_payee_payer_endpoint))
            .route(
                endpoints::PAYEE_PAYER,
                put(update_payee_payer_endpoint).delete(delete_payee_payer_endpoint),
            )
            .route(endpoints::TRANSACTION_LIST, get(get_transaction_list))
            .route(endpoints::TRANSACTION_CODE_FORMS, get(get_code_forms))
            .route(
                endpoints::POST_EXPENSE,
                post(create_expense_endpoint).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
            )
            .route(
                endpoints::POST_REVENUE,
                post(create_revenue_endpoint).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
            )
            .route(
                endpoints::TRANSACTION,
                put(update_transaction_endpoint)
                    .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
                    .delete(delete_transaction_endpoint),
            )
            .route(
                endpoints::RECONCILIATION_TRANSACTIONS,
                get(retrieve_transactions),
            )
            .route(endpoints::RECONCILIATION_MATCHES, get(retrieve_matches))
            .route(
                endpoints::MATCH_TRANSACTIONS,
                post(match_transactions_endpoint),
            )
            .route(
                endpoints::UNMATCH_TRANSACTIONS,
                post(unmatch_transactions_endpoint),
            )
            .route(endpoints::UNMATCH_GROUPS, post(unmatch_groups_endpoint))
            .route(endpoints::POST_INVESTMENT, post(create_investment_endpoint))
            .route(
                endpoints::INVESTMENT,
                put(update_investment_endpoint).delete(delete_investment_endpoint),
            )
            .route(endpoints::BALANCE_SHEET, get(get_balance_sheet_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the financial transactions dashboard.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::TRANSACTIONS_VIEW)
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{AppState, MediaStorage, endpoints};

    use super::{build_router, get_index_page};

    fn get_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let media_root = tempfile::tempdir().expect("Could not create media directory");
        let state = AppState::new(
            connection,
            "test cookie secret",
            "Etc/UTC",
            MediaStorage::new(media_root.path()),
        )
        .expect("Could not create app state");

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn root_redirects_to_transactions() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::TRANSACTIONS_VIEW);
    }

    #[tokio::test]
    async fn pages_need_log_in() {
        let server = get_test_server();

        let response = server.get(endpoints::INVESTMENTS_VIEW).await;

        response.assert_status_see_other();
        assert!(
            response.header("location").to_str().unwrap().starts_with(endpoints::LOG_IN_VIEW),
            "want redirect to log in page"
        );
    }

    #[tokio::test]
    async fn log_in_page_is_public() {
        let server = get_test_server();

        server.get(endpoints::LOG_IN_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        server
            .get("/no/such/page")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
