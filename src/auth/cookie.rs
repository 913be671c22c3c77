//! The private cookie that holds the log in token.
//!
//! The cookie value is a JSON [Token] encrypted by [PrivateCookieJar], so the
//! expiry cannot be changed by the client.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::{Error, auth::UserID};

pub const COOKIE_TOKEN: &str = "token";
/// How long a log in lasts without activity.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

/// Who is logged in and until when.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Token {
    pub user_id: UserID,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// Add a token for `user_id` to `jar` that expires `duration` from now.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc().to_offset(local_offset) + duration;

    add_token(
        jar,
        Token {
            user_id,
            expires_at,
        },
    )
}

fn add_token(jar: PrivateCookieJar, token: Token) -> Result<PrivateCookieJar, Error> {
    let value =
        serde_json::to_string(&token).map_err(|error| Error::InvalidToken(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, value))
            .expires(token.expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Read the token from `jar`.
///
/// # Errors
///
/// Returns [Error::CookieMissing] when there is no token and
/// [Error::InvalidToken] when the token cannot be decoded or has expired.
pub fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;
    let token: Token = serde_json::from_str(cookie.value())
        .map_err(|error| Error::InvalidToken(error.to_string()))?;

    if token.expires_at <= OffsetDateTime::now_utc() {
        return Err(Error::InvalidToken("token has expired".to_owned()));
    }

    Ok(token)
}

/// Push the token expiry out to at least `duration` from now.
///
/// A longer expiry, such as from "remember me", is kept.
pub fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;
    let new_expiry = OffsetDateTime::now_utc().to_offset(local_offset) + duration;

    add_token(
        jar,
        Token {
            user_id: token.user_id,
            expires_at: max(token.expires_at, new_expiry),
        },
    )
}

/// Replace the token with one that has already expired.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use time::{Duration, OffsetDateTime, UtcOffset, macros::datetime};

    use crate::{Error, auth::UserID};

    use super::{
        COOKIE_TOKEN, Token, extend_auth_cookie_duration_if_needed, get_token_from_cookies,
        invalidate_auth_cookie, set_auth_cookie,
    };

    fn get_jar() -> PrivateCookieJar {
        PrivateCookieJar::new(Key::generate())
    }

    #[track_caller]
    fn assert_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got {left:?}, want {right:?}"
        );
    }

    #[test]
    fn token_round_trips_through_jar() {
        let jar = set_auth_cookie(
            get_jar(),
            UserID::TREASURER,
            Duration::minutes(5),
            UtcOffset::UTC,
        )
        .unwrap();

        let token = get_token_from_cookies(&jar).unwrap();

        assert_eq!(token.user_id, UserID::TREASURER);
        assert_close(
            token.expires_at,
            OffsetDateTime::now_utc() + Duration::minutes(5),
        );
    }

    #[test]
    fn missing_cookie_is_an_error() {
        assert_eq!(get_token_from_cookies(&get_jar()), Err(Error::CookieMissing));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jar = set_auth_cookie(
            get_jar(),
            UserID::TREASURER,
            Duration::seconds(-1),
            UtcOffset::UTC,
        )
        .unwrap();

        assert!(matches!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidToken(_))
        ));
    }

    #[test]
    fn extending_keeps_the_later_expiry() {
        let jar = set_auth_cookie(
            get_jar(),
            UserID::TREASURER,
            Duration::days(7),
            UtcOffset::UTC,
        )
        .unwrap();

        let jar =
            extend_auth_cookie_duration_if_needed(jar, Duration::minutes(5), UtcOffset::UTC)
                .unwrap();

        assert_close(
            get_token_from_cookies(&jar).unwrap().expires_at,
            OffsetDateTime::now_utc() + Duration::days(7),
        );
    }

    #[test]
    fn extending_short_token() {
        let jar = set_auth_cookie(
            get_jar(),
            UserID::TREASURER,
            Duration::seconds(5),
            UtcOffset::UTC,
        )
        .unwrap();

        let jar =
            extend_auth_cookie_duration_if_needed(jar, Duration::minutes(5), UtcOffset::UTC)
                .unwrap();

        let cookie = jar.get(COOKIE_TOKEN).unwrap();
        assert_close(
            cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + Duration::minutes(5),
        );
    }

    #[test]
    fn invalidated_cookie_cannot_be_decoded() {
        let jar = set_auth_cookie(
            get_jar(),
            UserID::TREASURER,
            Duration::minutes(5),
            UtcOffset::UTC,
        )
        .unwrap();

        let jar = invalidate_auth_cookie(jar);

        assert!(matches!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidToken(_))
        ));
    }

    #[test]
    fn token_serialises_as_rfc3339() {
        let token = Token {
            user_id: UserID::TREASURER,
            expires_at: datetime!(2025-12-21 00:00:00 UTC),
        };

        let json = serde_json::to_string(&token).unwrap();

        assert_eq!(json, r#"{"user_id":1,"expires_at":"2025-12-21T00:00:00Z"}"#);
        assert_eq!(serde_json::from_str::<Token>(&json).unwrap(), token);
    }
}
