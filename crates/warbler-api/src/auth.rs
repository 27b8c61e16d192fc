use std::sync::Arc;

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{info, warn};

use warbler_db::{Database, DbError};
use warbler_types::api::{LoginForm, SignupForm};
use warbler_types::models::{Claims, Flash};

use crate::error::{AppError, TAKEN_MESSAGE};
use crate::flash;
use crate::middleware::Session;
use crate::render::{self, Page};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// HMAC key for session tokens.
    pub secret: String,
}

/// Cookie holding the signed current-user token.
pub const SESSION_COOKIE: &str = "curr_user";

const SESSION_DAYS: i64 = 14;

pub async fn signup_form(session: Session, jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = flash::take(jar);
    let page = Page::new(session.user(), flash);
    (jar, render::signup_form(&page))
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    if let Err(problem) = form.validate() {
        let page = Page::new(None, Some(Flash::danger(problem)));
        return Ok(render::signup_form(&page).into_response());
    }

    let user = match state.db.signup(
        &form.username,
        &form.email,
        &form.password,
        form.image_url.as_deref(),
    ) {
        Ok(user) => user,
        Err(DbError::Integrity(detail)) => {
            warn!("Signup rejected for {}: {}", form.username, detail);
            let page = Page::new(None, Some(Flash::danger(TAKEN_MESSAGE)));
            return Ok(render::signup_form(&page).into_response());
        }
        Err(DbError::Invalid(problem)) => {
            let page = Page::new(None, Some(Flash::danger(problem)));
            return Ok(render::signup_form(&page).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let jar = start_session(jar, &state.secret, user.id)?;
    Ok((jar, flash::redirect("/")).into_response())
}

pub async fn login_form(session: Session, jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = flash::take(jar);
    let page = Page::new(session.user(), flash);
    (jar, render::login_form(&page))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Some(user) = state.db.authenticate(&form.username, &form.password)? else {
        warn!("Failed login for {}", form.username);
        let page = Page::new(None, Some(Flash::danger("Invalid credentials.")));
        return Ok(render::login_form(&page).into_response());
    };

    info!("User {} logged in", user.username);
    let jar = start_session(jar, &state.secret, user.id)?;
    let jar = flash::set(jar, Flash::success(format!("Hello, {}!", user.username)));
    Ok((jar, flash::redirect("/")).into_response())
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = end_session(jar);
    let jar = flash::set(jar, Flash::success("You have successfully logged out."));
    (jar, flash::redirect("/login"))
}

/// Signs a session token whose only key is the current user's id.
pub fn create_token(secret: &str, user_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        curr_user: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Current-user id from a token, or `None` if it is forged, expired or malformed.
pub fn read_token(secret: &str, token: &str) -> Option<i64> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims.curr_user)
}

pub fn start_session(jar: CookieJar, secret: &str, user_id: i64) -> Result<CookieJar, AppError> {
    let token = create_token(secret, user_id)?;
    Ok(jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    ))
}

pub fn end_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
