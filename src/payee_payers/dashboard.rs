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
    choices::{Choice, Status},
    endpoints,
    html::{
        BADGE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        base, edit_delete_action_links,
    },
    navigation::NavBar,
    payee_payers::{
        db::get_payee_payer_listings,
        domain::{PayeePayerFilter, PayeePayerListing},
    },
};

/// The state needed for the payee/payer pages.
#[derive(Debug, Clone)]
pub struct PayeePayersState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PayeePayersState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string of the payee/payer list.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub text: String,
    /// A status code, blank for any status.
    #[serde(default)]
    pub status: String,
}

impl ListQuery {
    fn into_filter(self) -> PayeePayerFilter {
        PayeePayerFilter {
            text: self.text,
            status: Status::from_code(&self.status),
        }
    }
}

fn filtered_listings(
    filter: &PayeePayerFilter,
    state: &PayeePayersState,
) -> Result<Vec<PayeePayerListing>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    Ok(get_payee_payer_listings(&connection)?
        .into_iter()
        .filter(|listing| filter.matches(listing))
        .collect())
}

pub async fn get_payee_payers_page(
    State(state): State<PayeePayersState>,
) -> Result<Response, Error> {
    let listings = filtered_listings(&PayeePayerFilter::default(), &state)?;

    Ok(payee_payers_view(&listings).into_response())
}

/// Render the payee/payers matching the filter as a fragment.
pub async fn get_payee_payer_list(
    State(state): State<PayeePayersState>,
    Query(query): Query<ListQuery>,
) -> Response {
    match filtered_listings(&query.into_filter(), &state) {
        Ok(listings) => payee_payer_list_view(&listings).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

fn payee_payer_list_view(listings: &[PayeePayerListing]) -> Markup {
    html! {
        @if listings.is_empty() {
            p { "No payees or payers found." }
        }

        @for listing in listings {
            @let payee_payer = &listing.payee_payer;

            div class="p-4 mb-2 border rounded border-gray-300 dark:border-gray-600"
            {
                div class="flex justify-between items-center"
                {
                    h2 class="font-semibold"
                    {
                        (payee_payer.name) " "
                        span class=(BADGE_STYLE) { (payee_payer.status) }
                    }

                    (edit_delete_action_links(
                        &endpoints::format_endpoint(endpoints::EDIT_PAYEE_PAYER_VIEW, payee_payer.id),
                        &endpoints::format_endpoint(endpoints::DELETE_PAYEE_PAYER_VIEW, payee_payer.id),
                    ))
                }

                p class="text-sm" { (payee_payer.address) }
                p class="text-sm"
                {
                    (payee_payer.city) ", " (payee_payer.province)
                    @if let Some(country) = &listing.country_name { ", " (country) }
                    @if let Some(postal_code) = &payee_payer.postal_code { " " (postal_code) }
                }

                @if let Some(phone) = &payee_payer.phone {
                    p class="text-sm" { "Phone: " (phone) }
                }
                @if let Some(fax) = &payee_payer.fax {
                    p class="text-sm" { "Fax: " (fax) }
                }
                @if let Some(email) = &payee_payer.email {
                    p class="text-sm" { a href={ "mailto:" (email) } class=(LINK_STYLE) { (email) } }
                }
            }
        }
    }
}

fn payee_payers_view(listings: &[PayeePayerListing]) -> Markup {
    let nav_bar = NavBar::new(endpoints::PAYEE_PAYERS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex justify-between w-full max-w-screen-lg mb-4"
            {
                h1 class="text-xl font-bold" { "Payees & Payers" }
                a href=(endpoints::NEW_PAYEE_PAYER_VIEW) class=(LINK_STYLE) { "Add payee/payer" }
            }

            form
                hx-get=(endpoints::PAYEE_PAYER_LIST)
                hx-target="#payee-payer-list"
                hx-target-error="#alert-container"
                hx-trigger="input changed delay:300ms, change"
                class="w-full max-w-screen-lg grid grid-cols-1 md:grid-cols-2 gap-4 mb-4"
            {
                div
                {
                    label for="filter-text" class=(FORM_LABEL_STYLE) { "Search" }
                    input id="filter-text" type="search" name="text" class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="filter-status" class=(FORM_LABEL_STYLE) { "Status" }
                    select id="filter-status" name="status" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" { "All" }
                        @for (code, label) in Status::options() {
                            option value=(code) { (label) }
                        }
                    }
                }
            }

            div id="payee-payer-list" class="w-full max-w-screen-lg"
            {
                (payee_payer_list_view(listings))
            }
        }
    };

    base("Payees & Payers", &[], &content)
}
