//! One-shot notices carried in a cookie across a redirect.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;

use warbler_types::models::Flash;

pub const FLASH_COOKIE: &str = "flash";

/// Queue `flash` for the next page the browser renders.
pub fn set(jar: CookieJar, flash: Flash) -> CookieJar {
    let value = B64.encode(flash.to_json());
    jar.add(
        Cookie::build((FLASH_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Pops the pending flash, if any. The returned jar clears the cookie.
pub fn take(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };

    let flash = B64
        .decode(cookie.value())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|json| Flash::from_json(&json));

    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flash)
}

/// 302 Found to `to`.
pub fn redirect(to: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, to.to_string())]).into_response()
}
