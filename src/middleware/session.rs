use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::Duration;

pub const SESSION_COOKIE: &str = "nav_session";
const FLASH_COOKIE: &str = "nav_flash";

/// Cookie encryption key for the given secret. Changing the secret invalidates
/// every outstanding session.
pub fn session_key(secret: &str) -> Key {
    Key::from(Sha512::digest(secret.as_bytes()).as_slice())
}

/// The logged-in user id, if the session cookie decrypts and parses.
pub fn session_user_id(jar: &PrivateCookieJar) -> Option<i64> {
    jar.get(SESSION_COOKIE)?.value().parse().ok()
}

pub fn start_session(jar: PrivateCookieJar, user_id: i64, secure: bool) -> PrivateCookieJar {
    jar.add(build_cookie(SESSION_COOKIE, user_id.to_string(), secure, Duration::days(7)))
}

pub fn end_session(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(clear_cookie(SESSION_COOKIE))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: String,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: "error".to_string(),
            message: message.into(),
        }
    }
}

pub fn set_flash(jar: PrivateCookieJar, flash: &Flash, secure: bool) -> PrivateCookieJar {
    match serde_json::to_string(flash) {
        Ok(value) => jar.add(build_cookie(FLASH_COOKIE, value, secure, Duration::minutes(5))),
        Err(_) => jar,
    }
}

/// Read and clear the pending flash message.
pub fn take_flash(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };
    let flash = serde_json::from_str(cookie.value()).ok();
    (jar.remove(clear_cookie(FLASH_COOKIE)), flash)
}

fn build_cookie(name: &str, value: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

fn clear_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
