//! Middleware that only lets logged in requests through and keeps the log in
//! alive while the treasurer is active.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{
    AppState,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::build_log_in_redirect_url,
    },
    timezone::get_local_offset,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long a log in lasts after the latest request.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

async fn guard(
    state: AuthState,
    request: Request,
    next: Next,
    redirect: impl Fn(String) -> Response,
) -> Response {
    let log_in_url = build_log_in_redirect_url(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!(
            "Could not get the offset for timezone {}. Redirecting to log in page.",
            state.local_timezone
        );
        return redirect(log_in_url);
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}. Redirecting to log in page.");
            return redirect(log_in_url);
        }
    };

    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(error) => {
            tracing::debug!("Rejected request without a valid token: {error}");
            return redirect(log_in_url);
        }
    };

    parts.extensions.insert(user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let jar = match extend_auth_cookie_duration_if_needed(
        jar.clone(),
        state.cookie_duration,
        local_offset,
    ) {
        Ok(updated_jar) => updated_jar,
        Err(error) => {
            tracing::error!("Error extending cookie duration: {error}. Keeping the old cookie.");
            jar
        }
    };

    let (mut parts, body) = response.into_parts();
    for value in jar.into_response().headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, value.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Redirect page requests without a valid log in token to the log in page.
///
/// Handlers can read the logged in user with `Extension<UserID>`.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, |url| Redirect::to(&url).into_response()).await
}

/// Like [auth_guard], but redirects htmx requests with the `HX-Redirect` header.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, |url| {
        (HxRedirect(url), StatusCode::OK).into_response()
    })
    .await
}
