//! Reads and writes the encrypted auth cookie.
//!
//! The cookie is issued by the authentication service. This crate only
//! decrypts it to find out which user made a request.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID, auth::token::Token};

pub(crate) const COOKIE_TOKEN: &str = "token";

/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(15);

/// Add an auth cookie for `user_id` that expires `duration` from now.
///
/// Returns the cookie jar with the cookie added.
///
/// # Errors
///
/// Returns [Error::Validation] if the token cannot be serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc() + duration;
    let token = Token {
        user_id,
        expires_at,
    };
    let token = serde_json::to_string(&token)
        .map_err(|error| Error::Validation(format!("could not serialize token: {error}")))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, token))
            .expires(expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Get the token from the auth cookie in `jar`.
///
/// # Errors
///
/// Returns [Error::Unauthorized] if the cookie is missing, could not be
/// decrypted, or holds an expired token.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::Unauthorized)?;
    let token: Token =
        serde_json::from_str(cookie.value_trimmed()).map_err(|_| Error::Unauthorized)?;

    if token.is_expired(OffsetDateTime::now_utc()) {
        return Err(Error::Unauthorized);
    }

    Ok(token)
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use sha2::{Digest, Sha512};
    use time::Duration;

    use crate::{Error, UserID};

    use super::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, get_token_from_cookies, set_auth_cookie};

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        let key = Key::from(&hash);

        PrivateCookieJar::new(key)
    }

    #[test]
    fn get_token_from_cookie_succeeds() {
        let user_id = UserID::new(1);
        let jar = set_auth_cookie(get_jar(), user_id, DEFAULT_COOKIE_DURATION).unwrap();

        let token = get_token_from_cookies(&jar).unwrap();

        assert_eq!(token.user_id, user_id);
    }

    #[test]
    fn cookie_is_locked_down() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), DEFAULT_COOKIE_DURATION).unwrap();

        let cookie = jar.get(COOKIE_TOKEN).unwrap();

        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), Duration::seconds(-1)).unwrap();

        assert_eq!(get_token_from_cookies(&jar), Err(Error::Unauthorized));
    }

    #[test]
    fn missing_cookie_is_unauthorized() {
        assert_eq!(get_token_from_cookies(&get_jar()), Err(Error::Unauthorized));
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let jar = get_jar().add(Cookie::new(COOKIE_TOKEN, "not json"));

        assert_eq!(get_token_from_cookies(&jar), Err(Error::Unauthorized));
    }
}
