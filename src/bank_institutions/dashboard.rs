use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    bank_institutions::{
        Account, Institution,
        db::{get_accounts_for_institution, get_all_institutions},
    },
    endpoints,
    html::{
        BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    navigation::NavBar,
};

/// The state needed for the institutions page.
#[derive(Debug, Clone)]
pub struct InstitutionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for InstitutionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the institutions with their accounts.
pub async fn get_institutions_page(
    State(state): State<InstitutionsPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let institutions = get_all_institutions(&connection)?
        .into_iter()
        .map(|institution| {
            get_accounts_for_institution(institution.id, &connection)
                .map(|accounts| (institution, accounts))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(institutions_view(&institutions).into_response())
}

fn institutions_view(institutions: &[(Institution, Vec<Account>)]) -> Markup {
    let nav_bar = NavBar::new(endpoints::INSTITUTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex justify-between w-full max-w-screen-lg mb-4"
            {
                h1 class="text-xl font-bold" { "Banking Institutions" }
                a href=(endpoints::NEW_INSTITUTION_VIEW) class=(LINK_STYLE) { "Add institution" }
            }

            @if institutions.is_empty() {
                p { "No institutions have been added yet." }
            }

            @for (institution, accounts) in institutions {
                section class="w-full max-w-screen-lg mb-8"
                {
                    div class="flex justify-between items-center mb-2"
                    {
                        h2 class="text-lg font-semibold" { (institution) }

                        (edit_delete_action_links(
                            &endpoints::format_endpoint(endpoints::EDIT_INSTITUTION_VIEW, institution.id),
                            &endpoints::format_endpoint(endpoints::DELETE_INSTITUTION_VIEW, institution.id),
                        ))
                    }

                    p class="text-sm" { (institution.address) }
                    p class="text-sm" { "Phone: " (institution.phone) " | Fax: " (institution.fax) }

                    table class="w-full text-sm text-left mt-2"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th class=(TABLE_CELL_STYLE) { "Account" }
                                th class=(TABLE_CELL_STYLE) { "Number" }
                                th class=(TABLE_CELL_STYLE) { "Status" }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (account.name) }
                                    td class=(TABLE_CELL_STYLE) { (account.account_number) }
                                    td class=(TABLE_CELL_STYLE) { span class=(BADGE_STYLE) { (account.status) } }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Banking Institutions", &[], &content)
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode};
    use scraper::Selector;

    use crate::{
        test_utils::{assert_valid_html, fixtures, get_test_connection, parse_html_document, shared},
    };

    use super::{InstitutionsPageState, get_institutions_page};

    #[tokio::test]
    async fn lists_institutions_with_accounts() {
        let connection = get_test_connection();
        fixtures::account(&connection);
        let state = InstitutionsPageState {
            db_connection: shared(connection),
        };

        let response = get_institutions_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let heading = html
            .select(&Selector::parse("h2").unwrap())
            .next()
            .expect("No institution heading");
        assert_eq!(heading.text().collect::<String>(), "Test Bank");
        let cells: Vec<String> = html
            .select(&Selector::parse("tbody td").unwrap())
            .map(|cell| cell.text().collect::<String>())
            .collect();
        assert_eq!(cells, ["Chequing", "12345", "Active"]);
    }
}
