//! Cookie-backed browser session: API token, user summary and one-shot flash messages

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub const TOKEN_COOKIE: &str = "user-token";
pub const USER_COOKIE: &str = "user-data";
pub const FLASH_COOKIE: &str = "flash";

/// What the pages need to know about the logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub name: String,
    pub email: String,
}

/// Notice shown once on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// `success` or `error`
    pub icon: String,
    pub title: String,
    pub text: String,
}

impl Flash {
    pub fn success(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            icon: "success".to_string(),
            title: title.into(),
            text: text.into(),
        }
    }

    pub fn error(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            icon: "error".to_string(),
            title: title.into(),
            text: text.into(),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Option<String> {
    serde_json::to_vec(value)
        .ok()
        .map(|bytes| URL_SAFE_NO_PAD.encode(bytes))
}

fn decode<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Token and user summary, present only when both cookies are readable
pub fn current_user(jar: &CookieJar) -> Option<(String, UserData)> {
    let token = jar
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())?;
    let user = jar.get(USER_COOKIE).and_then(|c| decode(c.value()))?;
    Some((token, user))
}

/// The API token alone
pub fn token(jar: &CookieJar) -> Option<String> {
    jar.get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

pub fn sign_in(jar: CookieJar, token: String, user: &UserData, secure: bool) -> CookieJar {
    let jar = jar.add(cookie(TOKEN_COOKIE, token, secure));
    match encode(user) {
        Some(data) => jar.add(cookie(USER_COOKIE, data, secure)),
        None => jar,
    }
}

pub fn sign_out(jar: CookieJar) -> CookieJar {
    jar.remove(removal(TOKEN_COOKIE))
        .remove(removal(USER_COOKIE))
}

pub fn set_flash(jar: CookieJar, flash: &Flash, secure: bool) -> CookieJar {
    match encode(flash) {
        Some(data) => jar.add(cookie(FLASH_COOKIE, data, secure)),
        None => jar,
    }
}

/// Read and clear the pending flash
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let flash = jar.get(FLASH_COOKIE).and_then(|c| decode(c.value()));
    if jar.get(FLASH_COOKIE).is_some() {
        (jar.remove(removal(FLASH_COOKIE)), flash)
    } else {
        (jar, flash)
    }
}
