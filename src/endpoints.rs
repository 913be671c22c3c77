//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/statements/{statement_id}/edit', use [format_endpoint].

/// The root route which redirects to the transactions dashboard or log in page.
pub const ROOT: &str = "/";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in the user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";

/// The page listing institutions and their accounts.
pub const INSTITUTIONS_VIEW: &str = "/banking/institutions";
/// The page for creating an institution.
pub const NEW_INSTITUTION_VIEW: &str = "/banking/institutions/new";
/// The page for editing an institution and its accounts.
pub const EDIT_INSTITUTION_VIEW: &str = "/banking/institutions/{institution_id}/edit";
/// The page asking to confirm the deletion of an institution.
pub const DELETE_INSTITUTION_VIEW: &str = "/banking/institutions/{institution_id}/delete";
/// The route to create an institution.
pub const POST_INSTITUTION: &str = "/api/institutions";
/// The route to update or delete an institution.
pub const INSTITUTION: &str = "/api/institutions/{institution_id}";

/// The page listing bank statements.
pub const STATEMENTS_VIEW: &str = "/banking/statements";
/// The page for creating a statement.
pub const NEW_STATEMENT_VIEW: &str = "/banking/statements/new";
/// The page for editing a statement and its bank transactions.
pub const EDIT_STATEMENT_VIEW: &str = "/banking/statements/{statement_id}/edit";
/// The page asking to confirm the deletion of a statement.
pub const DELETE_STATEMENT_VIEW: &str = "/banking/statements/{statement_id}/delete";
/// The route to create a statement.
pub const POST_STATEMENT: &str = "/api/statements";
/// The route to update or delete a statement.
pub const STATEMENT: &str = "/api/statements/{statement_id}";

/// The page showing the chart of financial codes.
pub const FINANCIAL_CODES_VIEW: &str = "/financial-codes";
/// The page for creating a financial code system.
pub const NEW_SYSTEM_VIEW: &str = "/financial-codes/systems/new";
/// The page for editing a financial code system.
pub const EDIT_SYSTEM_VIEW: &str = "/financial-codes/systems/{system_id}/edit";
/// The page asking to confirm the deletion of a financial code system.
pub const DELETE_SYSTEM_VIEW: &str = "/financial-codes/systems/{system_id}/delete";
/// The route to create a financial code system.
pub const POST_SYSTEM: &str = "/api/financial-codes/systems";
/// The route to update or delete a financial code system.
pub const SYSTEM: &str = "/api/financial-codes/systems/{system_id}";
/// The page for creating a budget year.
pub const NEW_BUDGET_YEAR_VIEW: &str = "/financial-codes/budget-years/new";
/// The page for editing a budget year.
pub const EDIT_BUDGET_YEAR_VIEW: &str = "/financial-codes/budget-years/{budget_year_id}/edit";
/// The page asking to confirm the deletion of a budget year.
pub const DELETE_BUDGET_YEAR_VIEW: &str = "/financial-codes/budget-years/{budget_year_id}/delete";
/// The page for copying a budget year's groups and codes into a new budget year.
pub const COPY_BUDGET_YEAR_VIEW: &str = "/financial-codes/budget-years/{budget_year_id}/copy";
/// The route to create a budget year.
pub const POST_BUDGET_YEAR: &str = "/api/financial-codes/budget-years";
/// The route to update or delete a budget year.
pub const BUDGET_YEAR: &str = "/api/financial-codes/budget-years/{budget_year_id}";
/// The route to copy a budget year.
pub const COPY_BUDGET_YEAR: &str = "/api/financial-codes/budget-years/{budget_year_id}/copy";
/// The page for creating a financial code group.
pub const NEW_GROUP_VIEW: &str = "/financial-codes/groups/new";
/// The page for editing a financial code group.
pub const EDIT_GROUP_VIEW: &str = "/financial-codes/groups/{group_id}/edit";
/// The page asking to confirm the deletion of a financial code group.
pub const DELETE_GROUP_VIEW: &str = "/financial-codes/groups/{group_id}/delete";
/// The route to create a financial code group.
pub const POST_GROUP: &str = "/api/financial-codes/groups";
/// The route to update or delete a financial code group.
pub const GROUP: &str = "/api/financial-codes/groups/{group_id}";
/// The page for creating a financial code.
pub const NEW_CODE_VIEW: &str = "/financial-codes/codes/new";
/// The page for editing a financial code.
pub const EDIT_CODE_VIEW: &str = "/financial-codes/codes/{code_id}/edit";
/// The page asking to confirm the deletion of a financial code.
pub const DELETE_CODE_VIEW: &str = "/financial-codes/codes/{code_id}/delete";
/// The route to create a financial code.
pub const POST_CODE: &str = "/api/financial-codes/codes";
/// The route to update or delete a financial code.
pub const CODE: &str = "/api/financial-codes/codes/{code_id}";

/// The page listing payees and payers.
pub const PAYEE_PAYERS_VIEW: &str = "/payee-payers";
/// The fragment listing payees and payers matching a filter.
pub const PAYEE_PAYER_LIST: &str = "/payee-payers/retrieve-payee-payer-list";
/// The page for creating a payee/payer.
pub const NEW_PAYEE_PAYER_VIEW: &str = "/payee-payers/new";
/// The page for editing a payee/payer.
pub const EDIT_PAYEE_PAYER_VIEW: &str = "/payee-payers/{payee_payer_id}/edit";
/// The page asking to confirm the deletion of a payee/payer.
pub const DELETE_PAYEE_PAYER_VIEW: &str = "/payee-payers/{payee_payer_id}/delete";
/// The route to create a payee/payer.
pub const POST_PAYEE_PAYER: &str = "/api/payee-payers";
/// The route to update or delete a payee/payer.
pub const PAYEE_PAYER: &str = "/api/payee-payers/{payee_payer_id}";

/// The page listing financial transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The fragment listing financial transactions matching a filter.
pub const TRANSACTION_LIST: &str = "/transactions/retrieve-transactions";
/// The fragment with the code sub-forms for an item date.
pub const TRANSACTION_CODE_FORMS: &str = "/transactions/code-forms";
/// The page for creating an expense.
pub const NEW_EXPENSE_VIEW: &str = "/transactions/expense/new";
/// The page for creating a revenue transaction.
pub const NEW_REVENUE_VIEW: &str = "/transactions/revenue/new";
/// The page for editing a financial transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The page asking to confirm the deletion of a financial transaction.
pub const DELETE_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/delete";
/// The route to create an expense.
pub const POST_EXPENSE: &str = "/api/transactions/expense";
/// The route to create a revenue transaction.
pub const POST_REVENUE: &str = "/api/transactions/revenue";
/// The route to update or delete a financial transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";

/// The page for matching bank and financial transactions.
pub const RECONCILIATION_VIEW: &str = "/reconciliation";
/// JSON list of unreconciled transactions.
pub const RECONCILIATION_TRANSACTIONS: &str = "/reconciliation/retrieve-transactions";
/// JSON list of reconciliation groups.
pub const RECONCILIATION_MATCHES: &str = "/reconciliation/retrieve-matches";
/// The route to match bank and financial transactions.
pub const MATCH_TRANSACTIONS: &str = "/reconciliation/match-transactions";
/// The route to detach transactions from their reconciliation groups.
pub const UNMATCH_TRANSACTIONS: &str = "/reconciliation/unmatch-transactions";
/// The route to delete reconciliation groups.
pub const UNMATCH_GROUPS: &str = "/reconciliation/unmatch-groups";

/// The page listing investments.
pub const INVESTMENTS_VIEW: &str = "/investments";
/// The page for creating an investment.
pub const NEW_INVESTMENT_VIEW: &str = "/investments/new";
/// The page for editing an investment and its details.
pub const EDIT_INVESTMENT_VIEW: &str = "/investments/{investment_id}/edit";
/// The page asking to confirm the deletion of an investment.
pub const DELETE_INVESTMENT_VIEW: &str = "/investments/{investment_id}/delete";
/// The route to create an investment.
pub const POST_INVESTMENT: &str = "/api/investments";
/// The route to update or delete an investment.
pub const INVESTMENT: &str = "/api/investments/{investment_id}";

/// The route to download an attachment.
pub const ATTACHMENT: &str = "/documents/{attachment_id}";

/// The income statement report page.
pub const INCOME_STATEMENT_VIEW: &str = "/reports";
/// JSON balance sheet as of a date.
pub const BALANCE_SHEET: &str = "/reports/balance-sheet";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/statements/{statement_id}', '{statement_id}' is the parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        let all = [
            endpoints::ROOT,
            endpoints::LOG_IN_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::INSTITUTIONS_VIEW,
            endpoints::NEW_INSTITUTION_VIEW,
            endpoints::POST_INSTITUTION,
            endpoints::STATEMENTS_VIEW,
            endpoints::NEW_STATEMENT_VIEW,
            endpoints::POST_STATEMENT,
            endpoints::FINANCIAL_CODES_VIEW,
            endpoints::NEW_SYSTEM_VIEW,
            endpoints::POST_SYSTEM,
            endpoints::NEW_BUDGET_YEAR_VIEW,
            endpoints::POST_BUDGET_YEAR,
            endpoints::NEW_GROUP_VIEW,
            endpoints::POST_GROUP,
            endpoints::NEW_CODE_VIEW,
            endpoints::POST_CODE,
            endpoints::PAYEE_PAYERS_VIEW,
            endpoints::PAYEE_PAYER_LIST,
            endpoints::NEW_PAYEE_PAYER_VIEW,
            endpoints::POST_PAYEE_PAYER,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::TRANSACTION_LIST,
            endpoints::TRANSACTION_CODE_FORMS,
            endpoints::NEW_EXPENSE_VIEW,
            endpoints::NEW_REVENUE_VIEW,
            endpoints::POST_EXPENSE,
            endpoints::POST_REVENUE,
            endpoints::RECONCILIATION_VIEW,
            endpoints::RECONCILIATION_TRANSACTIONS,
            endpoints::RECONCILIATION_MATCHES,
            endpoints::MATCH_TRANSACTIONS,
            endpoints::UNMATCH_TRANSACTIONS,
            endpoints::UNMATCH_GROUPS,
            endpoints::INVESTMENTS_VIEW,
            endpoints::NEW_INVESTMENT_VIEW,
            endpoints::POST_INVESTMENT,
            endpoints::INCOME_STATEMENT_VIEW,
            endpoints::BALANCE_SHEET,
        ];

        for endpoint in all {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn parameterised_endpoints_are_valid_once_formatted() {
        let all = [
            endpoints::EDIT_INSTITUTION_VIEW,
            endpoints::DELETE_INSTITUTION_VIEW,
            endpoints::INSTITUTION,
            endpoints::EDIT_STATEMENT_VIEW,
            endpoints::DELETE_STATEMENT_VIEW,
            endpoints::STATEMENT,
            endpoints::EDIT_SYSTEM_VIEW,
            endpoints::DELETE_SYSTEM_VIEW,
            endpoints::SYSTEM,
            endpoints::EDIT_BUDGET_YEAR_VIEW,
            endpoints::DELETE_BUDGET_YEAR_VIEW,
            endpoints::COPY_BUDGET_YEAR_VIEW,
            endpoints::BUDGET_YEAR,
            endpoints::COPY_BUDGET_YEAR,
            endpoints::EDIT_GROUP_VIEW,
            endpoints::DELETE_GROUP_VIEW,
            endpoints::GROUP,
            endpoints::EDIT_CODE_VIEW,
            endpoints::DELETE_CODE_VIEW,
            endpoints::CODE,
            endpoints::EDIT_PAYEE_PAYER_VIEW,
            endpoints::DELETE_PAYEE_PAYER_VIEW,
            endpoints::PAYEE_PAYER,
            endpoints::EDIT_TRANSACTION_VIEW,
            endpoints::DELETE_TRANSACTION_VIEW,
            endpoints::TRANSACTION,
            endpoints::EDIT_INVESTMENT_VIEW,
            endpoints::DELETE_INVESTMENT_VIEW,
            endpoints::INVESTMENT,
            endpoints::ATTACHMENT,
        ];

        for endpoint in all {
            let formatted = format_endpoint(endpoint, 42);
            assert!(!formatted.contains('{'), "{endpoint} was not formatted");
            assert_endpoint_is_valid_uri(&formatted);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
    }
}
