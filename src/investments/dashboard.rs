use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    investments::{db::get_investment_summaries, domain::InvestmentSummary},
    navigation::NavBar,
};

/// The state needed for the investment pages.
#[derive(Debug, Clone)]
pub struct InvestmentsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for InvestmentsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn get_investments_page(State(state): State<InvestmentsState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let summaries = get_investment_summaries(&connection)?;

    Ok(investments_view(&summaries).into_response())
}

fn investment_view(summary: &InvestmentSummary) -> Markup {
    let investment = &summary.investment;

    html! {
        div class="p-4 mb-4 border rounded border-gray-300 dark:border-gray-600" data-investment="true"
        {
            div class="flex justify-between items-center mb-2"
            {
                div
                {
                    h2 class="font-semibold" { (investment.name) }
                    p class="text-sm" { (investment.rate) }
                }

                (edit_delete_action_links(
                    &endpoints::format_endpoint(endpoints::EDIT_INVESTMENT_VIEW, investment.id),
                    &endpoints::format_endpoint(endpoints::DELETE_INVESTMENT_VIEW, investment.id),
                ))
            }

            @if summary.details.is_empty() {
                p class="text-sm" { "No details recorded." }
            } @else {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                            th scope="col" class="px-6 py-4 text-right" { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "" }
                        }
                    }

                    tbody
                    {
                        @for detail in &summary.details {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (detail.date_investment) }
                                td class=(TABLE_CELL_STYLE) { (detail.detail_status) }
                                td class="px-6 py-4 text-right" { (detail.amount) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    @if detail.reconciled.is_some() {
                                        span class=(BADGE_STYLE) { "Reconciled" }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            p class="mt-2 font-semibold text-right" { "Balance: " (summary.balance()) }
        }
    }
}

fn investments_view(summaries: &[InvestmentSummary]) -> Markup {
    let nav_bar = NavBar::new(endpoints::INVESTMENTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex justify-between w-full max-w-screen-lg mb-4"
            {
                h1 class="text-xl font-bold" { "Investments" }
                a href=(endpoints::NEW_INVESTMENT_VIEW) class=(LINK_STYLE) { "Add investment" }
            }

            div class="w-full max-w-screen-lg"
            {
                @if summaries.is_empty() {
                    p { "No investments recorded." }
                }

                @for summary in summaries {
                    (investment_view(summary))
                }
            }
        }
    };

    base("Investments", &[], &content)
}
