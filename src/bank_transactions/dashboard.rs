use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    bank_institutions::{AccountLabel, get_account_labels},
    bank_transactions::{
        db::{get_all_statements, get_bank_transactions_for_statement},
        domain::{Statement, StatementTotals},
    },
    endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links,
    },
    navigation::NavBar,
};

/// The state needed for the statements page.
#[derive(Debug, Clone)]
pub struct StatementsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StatementsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The statements of one account with their totals.
struct AccountStatements {
    account: AccountLabel,
    statements: Vec<(Statement, StatementTotals)>,
}

/// Render the statements of every account.
pub async fn get_statements_page(
    State(state): State<StatementsPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let mut accounts: Vec<AccountStatements> = get_account_labels(&connection)?
        .into_iter()
        .map(|account| AccountStatements {
            account,
            statements: Vec::new(),
        })
        .collect();

    for statement in get_all_statements(&connection)? {
        let lines = get_bank_transactions_for_statement(statement.id, &connection)?;
        let totals = StatementTotals::from_transactions(&lines);

        if let Some(group) = accounts
            .iter_mut()
            .find(|group| group.account.account.id == statement.account_id)
        {
            group.statements.push((statement, totals));
        }
    }

    Ok(statements_view(&accounts).into_response())
}

fn statements_view(accounts: &[AccountStatements]) -> Markup {
    let nav_bar = NavBar::new(endpoints::STATEMENTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex justify-between w-full max-w-screen-lg mb-4"
            {
                h1 class="text-xl font-bold" { "Bank Statements" }
                a href=(endpoints::NEW_STATEMENT_VIEW) class=(LINK_STYLE) { "Add statement" }
            }

            @if accounts.is_empty() {
                p
                {
                    "Statements belong to a bank account. "
                    a href=(endpoints::NEW_INSTITUTION_VIEW) class=(LINK_STYLE) { "Add an institution" }
                    " with its accounts first."
                }
            }

            @for group in accounts {
                section class="w-full max-w-screen-lg mb-8"
                {
                    h2 class="text-lg font-semibold mb-2" { (group.account) }

                    @if group.statements.is_empty() {
                        p class="text-sm" { "No statements." }
                    } @else {
                        table class="w-full text-sm text-left"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th class=(TABLE_CELL_STYLE) { "Statement" }
                                    th class=(TABLE_CELL_STYLE) { "Debits" }
                                    th class=(TABLE_CELL_STYLE) { "Credits" }
                                    th class=(TABLE_CELL_STYLE) { "Total" }
                                    th class=(TABLE_CELL_STYLE) { "Actions" }
                                }
                            }

                            tbody
                            {
                                @for (statement, totals) in &group.statements {
                                    tr class=(TABLE_ROW_STYLE)
                                    {
                                        td class=(TABLE_CELL_STYLE) { (statement) }
                                        td class=(TABLE_CELL_STYLE) { (totals.total_debit) }
                                        td class=(TABLE_CELL_STYLE) { (totals.total_credit) }
                                        td class=(TABLE_CELL_STYLE) { (totals.total()) }
                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            (edit_delete_action_links(
                                                &endpoints::format_endpoint(endpoints::EDIT_STATEMENT_VIEW, statement.id),
                                                &endpoints::format_endpoint(endpoints::DELETE_STATEMENT_VIEW, statement.id),
                                            ))
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Bank Statements", &[], &content)
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode};
    use scraper::Selector;

    use crate::{
        money::Money,
        test_utils::{assert_valid_html, fixtures, get_test_connection, parse_html_document, shared},
    };

    use super::{StatementsPageState, get_statements_page};

    #[tokio::test]
    async fn shows_statement_totals() {
        let connection = get_test_connection();
        let line = fixtures::bank_transaction(&connection, 1250, 0);
        fixtures::bank_transaction_for(&connection, line.statement_id, 0, 5000);
        let state = StatementsPageState {
            db_connection: shared(connection),
        };

        let response = get_statements_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let cells: Vec<String> = html
            .select(&Selector::parse("tbody td").unwrap())
            .map(|cell| cell.text().collect::<String>())
            .take(4)
            .collect();
        assert_eq!(
            cells,
            [
                "2017-01-01 to 2017-01-31 statement".to_owned(),
                Money::from_cents(1250).to_string(),
                Money::from_cents(5000).to_string(),
                Money::from_cents(3750).to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn empty_page_links_to_institutions() {
        let state = StatementsPageState {
            db_connection: shared(get_test_connection()),
        };

        let response = get_statements_page(State(state)).await.unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert!(
            html.select(&Selector::parse("a").unwrap())
                .any(|link| link.value().attr("href") == Some("/banking/institutions/new"))
        );
    }
}
