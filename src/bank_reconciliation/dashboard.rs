//! The reconciliation page. The tables are filled in by
//! `static/reconciliation.js` from the JSON endpoints.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        HeadElement, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, base,
    },
    navigation::NavBar,
    timezone::local_today,
};

const SCRIPT_PATH: &str = "/static/reconciliation.js";

#[derive(Debug, Clone)]
pub struct ReconciliationPageState {
    pub local_timezone: String,
}

impl FromRef<AppState> for ReconciliationPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the reconciliation page with the date ranges covering the last
/// year.
pub async fn get_reconciliation_page(
    State(state): State<ReconciliationPageState>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    Ok(reconciliation_view(one_year_before(today), today).into_response())
}

/// The same day a year earlier, 28 February for 29 February.
fn one_year_before(date: Date) -> Date {
    let year = date.year() - 1;

    date.replace_year(year)
        .or_else(|_| date.replace_day(28).and_then(|date| date.replace_year(year)))
        .unwrap_or(date)
}

fn date_range_inputs(prefix: &str, label: &str, start: Date, end: Date) -> Markup {
    html! {
        fieldset class="grid grid-cols-2 gap-4"
        {
            legend class=(FORM_LABEL_STYLE) { (label) }

            input
                id=(format!("{prefix}-start-date"))
                type="date"
                aria-label=(format!("{label} start date"))
                value=(start)
                class=(FORM_TEXT_INPUT_STYLE);

            input
                id=(format!("{prefix}-end-date"))
                type="date"
                aria-label=(format!("{label} end date"))
                value=(end)
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

fn transaction_table(id: &str, headers: &[&str]) -> Markup {
    html! {
        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "" }
                    @for header in headers {
                        th scope="col" class=(TABLE_CELL_STYLE) { (header) }
                    }
                }
            }

            tbody id=(id) {}
        }
    }
}

fn reconciliation_view(year_ago: Date, today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::RECONCILIATION_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div
            id="reconciliation"
            class=(PAGE_CONTAINER_STYLE)
            data-transactions-url=(endpoints::RECONCILIATION_TRANSACTIONS)
            data-matches-url=(endpoints::RECONCILIATION_MATCHES)
            data-match-url=(endpoints::MATCH_TRANSACTIONS)
            data-unmatch-transactions-url=(endpoints::UNMATCH_TRANSACTIONS)
            data-unmatch-groups-url=(endpoints::UNMATCH_GROUPS)
        {
            h1 class="text-xl font-bold mb-4" { "Bank reconciliation" }

            div class="w-full max-w-screen-lg grid grid-cols-1 md:grid-cols-2 gap-4 mb-4"
            {
                (date_range_inputs("financial", "Financial transactions", year_ago, today))
                (date_range_inputs("bank", "Bank transactions", year_ago, today))
            }

            div class="flex gap-4 mb-4"
            {
                button id="button-reconcile-transactions" type="button" class=(BUTTON_SECONDARY_STYLE)
                {
                    "Reconcile transactions"
                }

                button id="button-show-reconciled-transactions" type="button" class=(BUTTON_SECONDARY_STYLE)
                {
                    "Show reconciled transactions"
                }
            }

            ul id="messages" class="w-full max-w-screen-lg mb-4" {}

            section id="reconcile-section" class="w-full max-w-screen-lg"
            {
                div class="grid grid-cols-1 lg:grid-cols-2 gap-4"
                {
                    div
                    {
                        h2 class="text-lg font-semibold" { "Financial transactions" }
                        (transaction_table("financial-transactions", &["Date", "Type", "Description", "Total"]))
                    }

                    div
                    {
                        h2 class="text-lg font-semibold" { "Bank transactions" }
                        (transaction_table("bank-transactions", &["Date", "Description", "Debit", "Credit"]))
                    }
                }

                dl class="grid grid-cols-3 gap-4 my-4"
                {
                    div { dt { "Financial total" } dd id="financial-total" { "$0.00" } }
                    div { dt { "Banking total" } dd id="banking-total" { "$0.00" } }
                    div { dt { "Discrepancy" } dd id="discrepancy-total" { "$0.00" } }
                }

                button id="button-match" type="button" class=(BUTTON_PRIMARY_STYLE)
                {
                    "Match selected transactions"
                }
            }

            section id="unreconcile-section" class="w-full max-w-screen-lg hidden"
            {
                h2 class="text-lg font-semibold" { "Reconciled transactions" }

                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Financial transactions" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Bank transactions" }
                        }
                    }

                    tbody id="reconciled-groups" {}
                }

                button id="button-unmatch" type="button" class=(BUTTON_PRIMARY_STYLE)
                {
                    "Unmatch selected groups"
                }
            }
        }
    };

    base(
        "Reconciliation",
        &[HeadElement::ScriptLink(SCRIPT_PATH.to_owned())],
        &content,
    )
}
