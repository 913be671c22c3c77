//! The log in page and the endpoint that checks the treasurer's password.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        UserID, get_user_by_id, invalidate_auth_cookie, redirect::normalize_redirect_url,
        set_auth_cookie,
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, loading_spinner, log_in_form_container, password_input},
    timezone::get_local_offset,
};

/// How long the auth cookie lasts when "remember me" is ticked.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect password.";
const PASSWORD_NOT_SET_MSG: &str =
    "No password has been set. Run the set_password tool on the server to set one.";
const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

fn log_in_form(error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (password_input(error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Log in"
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>) -> Option<String> {
    let raw_url = raw_url?;
    let redirect_url = normalize_redirect_url(raw_url);

    if redirect_url.is_none() {
        tracing::warn!("Ignoring invalid redirect URL: {raw_url}");
    }

    redirect_url
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Display the log in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref());
    let form = log_in_form(None, redirect_url.as_deref());
    let content = log_in_form_container("Log in", &form);

    base("Log In", &[], &content).into_response()
}

/// The state needed to check a password and set the auth cookie.
#[derive(Debug, Clone)]
pub struct LoginState {
    pub cookie_key: Key,
    pub cookie_duration: Duration,
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The log in form.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    pub password: String,
    /// Set to any value when the "remember me" checkbox is ticked.
    pub remember_me: Option<String>,
    pub redirect_url: Option<String>,
}

/// Check the password and set the auth cookie.
///
/// On success the client is redirected to `redirect_url`, or the
/// transactions dashboard. Otherwise the form is returned with an error.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref());
    let redirect_url = redirect_url.as_deref();

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return log_in_form(Some(INTERNAL_ERROR_MSG), redirect_url).into_response();
            }
        };

        match get_user_by_id(UserID::TREASURER, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                return log_in_form(Some(PASSWORD_NOT_SET_MSG), redirect_url).into_response();
            }
            Err(error) => {
                tracing::error!("Unhandled error while fetching the user: {error}");
                return log_in_form(Some(INTERNAL_ERROR_MSG), redirect_url).into_response();
            }
        }
    };

    match user.password_hash.verify(&user_data.password) {
        Ok(true) => {}
        Ok(false) => {
            return log_in_form(Some(INVALID_CREDENTIALS_ERROR_MSG), redirect_url)
                .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(Some(INTERNAL_ERROR_MSG), redirect_url).into_response();
        }
    }

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let redirect_url = redirect_url.unwrap_or(endpoints::TRANSACTIONS_VIEW);

    match set_auth_cookie(jar.clone(), user.id, cookie_duration, local_offset) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(redirect_url.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
                .into_response()
        }
    }
}
