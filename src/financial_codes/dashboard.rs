use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    choices::Kind,
    endpoints,
    financial_codes::{
        db::{get_all_systems, get_budget_years, get_codes, get_groups},
        domain::{BudgetYear, FinancialCode, FinancialCodeGroup, FinancialCodeSystem},
    },
    html::{
        BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    navigation::NavBar,
};

/// The state shared by the financial code pages and endpoints.
#[derive(Debug, Clone)]
pub struct FinancialCodesState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for FinancialCodesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub(super) fn redirect_to_dashboard() -> Response {
    (
        HxRedirect(endpoints::FINANCIAL_CODES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

struct YearTree {
    budget_year: BudgetYear,
    revenue: Vec<(FinancialCodeGroup, Vec<FinancialCode>)>,
    expense: Vec<(FinancialCodeGroup, Vec<FinancialCode>)>,
}

struct SystemTree {
    system: FinancialCodeSystem,
    years: Vec<YearTree>,
}

/// Render every system with its budget years, groups and codes.
pub async fn get_financial_codes_page(
    State(state): State<FinancialCodesState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let mut systems = Vec::new();

    for system in get_all_systems(&connection)? {
        let mut years = Vec::new();

        for budget_year in get_budget_years(system.id, &connection)? {
            let mut tree = YearTree {
                budget_year,
                revenue: Vec::new(),
                expense: Vec::new(),
            };

            for group in get_groups(tree.budget_year.id, &connection)? {
                let codes = get_codes(group.id, &connection)?;
                match group.kind {
                    Kind::Revenue => tree.revenue.push((group, codes)),
                    Kind::Expense => tree.expense.push((group, codes)),
                }
            }

            years.push(tree);
        }

        systems.push(SystemTree { system, years });
    }

    Ok(financial_codes_view(&systems).into_response())
}

fn group_view(group: &FinancialCodeGroup, codes: &[FinancialCode]) -> Markup {
    html! {
        div class="mb-4"
        {
            div class="flex justify-between items-center"
            {
                h5 class="font-semibold"
                {
                    (group.title) " "
                    span class=(BADGE_STYLE) { (group.status) }
                }

                (edit_delete_action_links(
                    &endpoints::format_endpoint(endpoints::EDIT_GROUP_VIEW, group.id),
                    &endpoints::format_endpoint(endpoints::DELETE_GROUP_VIEW, group.id),
                ))
            }

            @if let Some(description) = &group.description {
                p class="text-sm" { (description) }
            }

            table class="w-full text-sm text-left mt-2"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th class=(TABLE_CELL_STYLE) { "Code" }
                        th class=(TABLE_CELL_STYLE) { "Description" }
                        th class=(TABLE_CELL_STYLE) { }
                    }
                }

                tbody
                {
                    @for code in codes {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (code.code) }
                            td class=(TABLE_CELL_STYLE) { (code.description) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                (edit_delete_action_links(
                                    &endpoints::format_endpoint(endpoints::EDIT_CODE_VIEW, code.id),
                                    &endpoints::format_endpoint(endpoints::DELETE_CODE_VIEW, code.id),
                                ))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn year_view(year: &YearTree) -> Markup {
    let budget_year = &year.budget_year;

    html! {
        section class="mb-6 pl-4 border-l border-gray-300 dark:border-gray-600"
        {
            div class="flex justify-between items-center mb-2"
            {
                h3 class="text-lg font-semibold" { (budget_year.short_name) " (" (budget_year) ")" }

                div class="flex gap-4"
                {
                    a
                        href=(endpoints::format_endpoint(endpoints::COPY_BUDGET_YEAR_VIEW, budget_year.id))
                        class=(LINK_STYLE)
                    { "Copy" }

                    (edit_delete_action_links(
                        &endpoints::format_endpoint(endpoints::EDIT_BUDGET_YEAR_VIEW, budget_year.id),
                        &endpoints::format_endpoint(endpoints::DELETE_BUDGET_YEAR_VIEW, budget_year.id),
                    ))
                }
            }

            h4 class="font-semibold mt-2" { "Revenue" }
            @for (group, codes) in &year.revenue {
                (group_view(group, codes))
            }

            h4 class="font-semibold mt-2" { "Expenses" }
            @for (group, codes) in &year.expense {
                (group_view(group, codes))
            }
        }
    }
}

fn financial_codes_view(systems: &[SystemTree]) -> Markup {
    let nav_bar = NavBar::new(endpoints::FINANCIAL_CODES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex justify-between w-full max-w-screen-lg mb-4"
            {
                h1 class="text-xl font-bold" { "Financial Codes" }

                div class="flex gap-4"
                {
                    a href=(endpoints::NEW_SYSTEM_VIEW) class=(LINK_STYLE) { "Add system" }
                    a href=(endpoints::NEW_BUDGET_YEAR_VIEW) class=(LINK_STYLE) { "Add budget year" }
                    a href=(endpoints::NEW_GROUP_VIEW) class=(LINK_STYLE) { "Add group" }
                    a href=(endpoints::NEW_CODE_VIEW) class=(LINK_STYLE) { "Add code" }
                }
            }

            @if systems.is_empty() {
                p { "No financial code systems have been added yet." }
            }

            @for tree in systems {
                section class="w-full max-w-screen-lg mb-8"
                {
                    div class="flex justify-between items-center mb-2"
                    {
                        h2 class="text-xl font-semibold"
                        {
                            (tree.system)
                            @if tree.system.submission_code {
                                " " span class=(BADGE_STYLE) { "Submission codes" }
                            }
                        }

                        (edit_delete_action_links(
                            &endpoints::format_endpoint(endpoints::EDIT_SYSTEM_VIEW, tree.system.id),
                            &endpoints::format_endpoint(endpoints::DELETE_SYSTEM_VIEW, tree.system.id),
                        ))
                    }

                    @for year in &tree.years {
                        (year_view(year))
                    }
                }
            }
        }
    };

    base("Financial Codes", &[], &content)
}
