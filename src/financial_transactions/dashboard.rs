use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    choices::{Choice, Kind},
    endpoints,
    financial_transactions::{
        db::get_transaction_summaries,
        domain::{TransactionFilter, TransactionSummary},
    },
    form::parse_date,
    html::{
        BADGE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    navigation::NavBar,
};

/// The state needed for the transaction list.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string of the transaction list.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// "e" for expenses, "r" for revenue, anything else for both.
    #[serde(default)]
    pub transaction_type: String,
    /// Dates that do not parse are ignored.
    #[serde(default)]
    pub date_start: String,
    #[serde(default)]
    pub date_end: String,
}

impl ListQuery {
    fn to_filter(&self) -> TransactionFilter {
        TransactionFilter {
            kind: Kind::from_code(&self.transaction_type),
            date_start: parse_date(&self.date_start),
            date_end: parse_date(&self.date_end),
            unreconciled_only: false,
        }
    }
}

fn filtered_summaries(
    filter: &TransactionFilter,
    state: &TransactionsPageState,
) -> Result<Vec<TransactionSummary>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction_summaries(filter, &connection)
}

pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
) -> Result<Response, Error> {
    let summaries = filtered_summaries(&TransactionFilter::default(), &state)?;

    Ok(transactions_view(&summaries).into_response())
}

/// Render the transactions matching the filter as a fragment.
pub async fn get_transaction_list(
    State(state): State<TransactionsPageState>,
    Query(query): Query<ListQuery>,
) -> Response {
    match filtered_summaries(&query.to_filter(), &state) {
        Ok(summaries) => transaction_list_view(&summaries).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

fn transaction_list_view(summaries: &[TransactionSummary]) -> Markup {
    html! {
        @if summaries.is_empty() {
            p { "No transactions found." }
        } @else {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Payee/Payer" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Memo" }
                        th scope="col" class="px-6 py-4 text-right" { "Total" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for summary in summaries {
                        @let transaction = &summary.transaction;

                        tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
                        {
                            td class=(TABLE_CELL_STYLE) { (transaction.date_submitted) }
                            td class=(TABLE_CELL_STYLE) { (transaction.kind) }
                            td class=(TABLE_CELL_STYLE) { (summary.payee_payer) }
                            td class=(TABLE_CELL_STYLE) { (transaction.memo) }
                            td class="px-6 py-4 text-right" { (summary.totals.total()) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                @if transaction.reconciled.is_some() {
                                    span class=(BADGE_STYLE) { "Reconciled" }
                                }
                            }
                            td class=(TABLE_CELL_STYLE)
                            {
                                (edit_delete_action_links(
                                    &endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id),
                                    &endpoints::format_endpoint(endpoints::DELETE_TRANSACTION_VIEW, transaction.id),
                                ))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn transactions_view(summaries: &[TransactionSummary]) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex justify-between w-full max-w-screen-lg mb-4"
            {
                h1 class="text-xl font-bold" { "Transactions" }

                div class="flex gap-4"
                {
                    a href=(endpoints::NEW_EXPENSE_VIEW) class=(LINK_STYLE) { "Add expense" }
                    a href=(endpoints::NEW_REVENUE_VIEW) class=(LINK_STYLE) { "Add revenue" }
                }
            }

            form
                hx-get=(endpoints::TRANSACTION_LIST)
                hx-target="#transaction-list"
                hx-target-error="#alert-container"
                hx-trigger="change"
                class="w-full max-w-screen-lg grid grid-cols-1 md:grid-cols-3 gap-4 mb-4"
            {
                div
                {
                    label for="filter-type" class=(FORM_LABEL_STYLE) { "Type" }
                    select id="filter-type" name="transaction_type" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="a" { "All" }
                        @for (code, label) in Kind::options() {
                            option value=(code) { (label) }
                        }
                    }
                }

                div
                {
                    label for="filter-date-start" class=(FORM_LABEL_STYLE) { "From" }
                    input id="filter-date-start" type="date" name="date_start" class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="filter-date-end" class=(FORM_LABEL_STYLE) { "To" }
                    input id="filter-date-end" type="date" name="date_end" class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div id="transaction-list" class="w-full max-w-screen-lg overflow-x-auto"
            {
                (transaction_list_view(summaries))
            }
        }
    };

    base("Transactions", &[], &content)
}
