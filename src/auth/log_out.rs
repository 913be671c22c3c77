//! Logging out.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;

use crate::{auth::invalidate_auth_cookie, endpoints};

/// Expire the auth cookie and send the client to the log in page.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    (invalidate_auth_cookie(jar), Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}

#[cfg(test)]
mod log_out_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use time::{OffsetDateTime, UtcOffset};

    use crate::{
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, UserID, set_auth_cookie},
        endpoints,
        test_utils::get_header,
    };

    use super::get_log_out;

    #[tokio::test]
    async fn log_out_expires_cookie_and_redirects() {
        let jar = set_auth_cookie(
            PrivateCookieJar::new(Key::generate()),
            UserID::TREASURER,
            DEFAULT_COOKIE_DURATION,
            UtcOffset::UTC,
        )
        .unwrap();

        let response = get_log_out(jar).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, "location"), endpoints::LOG_IN_VIEW);
        let cookie = Cookie::parse(get_header(&response, "set-cookie")).unwrap();
        assert_eq!(cookie.name(), COOKIE_TOKEN);
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
    }
}
