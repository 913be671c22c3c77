//! The reports page: an income statement for a financial code system and the
//! balance sheet as of the end of the chosen range.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    financial_codes::{FinancialCodeSystem, SystemId, get_all_systems},
    form::parse_date,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    money::Money,
    navigation::NavBar,
    reports::{
        db::{get_balance_sheet, get_coded_amounts},
        domain::{BalanceSheet, GroupTotal, IncomeStatement},
    },
};

#[derive(Debug, Clone)]
pub struct ReportsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string of the reports page.
///
/// The report is only generated once all three values are valid.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub financial_code_system: String,
    #[serde(default)]
    pub date_start: String,
    #[serde(default)]
    pub date_end: String,
}

impl ReportQuery {
    fn parse(&self) -> Option<(SystemId, Date, Date)> {
        let system_id = self.financial_code_system.trim().parse().ok()?;

        Some((
            system_id,
            parse_date(&self.date_start)?,
            parse_date(&self.date_end)?,
        ))
    }
}

struct Report<'a> {
    system: &'a FinancialCodeSystem,
    income_statement: IncomeStatement,
    balance_sheet: BalanceSheet,
}

pub async fn get_reports_page(
    State(state): State<ReportsState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let systems = get_all_systems(&connection)?;

    let report = match query.parse() {
        Some((system_id, date_start, date_end)) => {
            match systems.iter().find(|system| system.id == system_id) {
                Some(system) => Some(Report {
                    system,
                    income_statement: IncomeStatement::from_amounts(get_coded_amounts(
                        system_id,
                        date_start,
                        date_end,
                        &connection,
                    )?),
                    balance_sheet: get_balance_sheet(date_end, &connection)?,
                }),
                None => None,
            }
        }
        None => None,
    };

    Ok(reports_view(&systems, &query, report.as_ref()).into_response())
}

fn group_rows(groups: &[GroupTotal]) -> Markup {
    html! {
        @for group in groups {
            tr class=(TABLE_ROW_STYLE)
            {
                th scope="row" colspan="2" class="px-6 py-3 font-semibold" { (group.title) }
            }

            @for code in &group.codes {
                tr class=(TABLE_ROW_STYLE) data-code-row="true"
                {
                    td class=(TABLE_CELL_STYLE) { (code.code) " - " (code.description) }
                    td class="px-6 py-4 text-right" { (code.total) }
                }
            }

            tr class=(TABLE_ROW_STYLE)
            {
                td class="px-6 py-2 italic" { "Subtotal" }
                td class="px-6 py-2 text-right italic" { (group.subtotal()) }
            }
        }
    }
}

fn total_row(label: &str, amount: Money) -> Markup {
    html! {
        tr class="font-semibold"
        {
            td class=(TABLE_CELL_STYLE) { (label) }
            td class="px-6 py-4 text-right" { (amount) }
        }
    }
}

fn income_statement_view(statement: &IncomeStatement) -> Markup {
    html! {
        table id="income-statement" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Revenue" }
                    th scope="col" class="px-6 py-4 text-right" { "Total" }
                }
            }
            tbody
            {
                (group_rows(&statement.revenue))
                (total_row("Total revenue", statement.total_revenue()))
            }
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Expenses" }
                    th scope="col" class="px-6 py-4 text-right" { "Total" }
                }
            }
            tbody
            {
                (group_rows(&statement.expenses))
                (total_row("Total expenses", statement.total_expenses()))
            }
            tfoot
            {
                (total_row("Net income", statement.net_income()))
            }
        }
    }
}

fn balance_sheet_view(sheet: &BalanceSheet) -> Markup {
    let rows = [
        ("Cash", sheet.cash),
        ("Investments", sheet.investments),
        ("Accounts receivable", sheet.accounts_receivable),
    ];
    let liabilities = [
        ("Debt", sheet.debt),
        ("Accounts payable", sheet.accounts_payable),
    ];

    html! {
        table id="balance-sheet" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
        {
            tbody
            {
                @for (label, amount) in rows {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (label) }
                        td class="px-6 py-4 text-right" { (amount) }
                    }
                }
                (total_row("Total assets", sheet.assets_total))

                @for (label, amount) in liabilities {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (label) }
                        td class="px-6 py-4 text-right" { (amount) }
                    }
                }
                (total_row("Total liabilities", sheet.liabilities_total))
            }
        }
    }
}

fn reports_view(
    systems: &[FinancialCodeSystem],
    query: &ReportQuery,
    report: Option<&Report>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::INCOME_STATEMENT_VIEW).into_html();
    let selected = query.financial_code_system.trim();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Reports" }

            form
                method="get"
                action=(endpoints::INCOME_STATEMENT_VIEW)
                class="w-full max-w-screen-lg grid grid-cols-1 md:grid-cols-4 gap-4 items-end mb-8"
            {
                div
                {
                    label for="financial_code_system" class=(FORM_LABEL_STYLE) { "Financial code system" }
                    select id="financial_code_system" name="financial_code_system" required class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" { "---------" }
                        @for system in systems {
                            @let value = system.id.to_string();
                            option value=(value) selected[value == selected] { (system.title) }
                        }
                    }
                }

                div
                {
                    label for="date_start" class=(FORM_LABEL_STYLE) { "Start date" }
                    input id="date_start" name="date_start" type="date" required
                        value=(query.date_start) class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="date_end" class=(FORM_LABEL_STYLE) { "End date" }
                    input id="date_end" name="date_end" type="date" required
                        value=(query.date_end) class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Generate report" }
            }

            @if let Some(report) = report {
                section class="w-full max-w-screen-lg mb-8"
                {
                    h2 class="text-lg font-semibold mb-2"
                    {
                        "Income statement (" (report.system.title) ")"
                    }
                    (income_statement_view(&report.income_statement))
                }

                section class="w-full max-w-screen-lg"
                {
                    h2 class="text-lg font-semibold mb-2"
                    {
                        "Balance sheet as of " (query.date_end.trim())
                    }
                    (balance_sheet_view(&report.balance_sheet))
                }
            } @else {
                p { "Choose a financial code system and a date range to generate the reports." }
            }
        }
    };

    base("Reports", &[], &content)
}
