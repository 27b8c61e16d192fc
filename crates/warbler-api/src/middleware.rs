use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use warbler_db::models::UserRow;

use crate::auth::{AppState, SESSION_COOKIE, read_token};
use crate::error::{AppError, ErrorPage};

/// The request's current user, resolved from the session cookie.
///
/// Handlers take this as an argument instead of reading any shared state;
/// a missing, forged or expired cookie simply yields an anonymous session.
#[derive(Debug, Default)]
pub struct Session {
    user: Option<UserRow>,
}

impl Session {
    pub fn user(&self) -> Option<&UserRow> {
        self.user.as_ref()
    }

    /// The logged-in user, or [`AppError::Unauthorized`].
    pub fn require_user(&self) -> Result<&UserRow, AppError> {
        self.user.as_ref().ok_or(AppError::Unauthorized)
    }

    fn resolve(state: &AppState, jar: &CookieJar) -> Result<Self, AppError> {
        let Some(user_id) = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| read_token(&state.secret, cookie.value()))
        else {
            return Ok(Self::default());
        };

        let user = state.db.get_user(user_id)?;
        if user.is_none() {
            debug!("Session names unknown user {}", user_id);
        }
        Ok(Self { user })
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Self::resolve(state, &CookieJar::from_headers(&parts.headers))
    }
}

/// A numeric id taken from the URL path. One that doesn't parse is a 404.
#[derive(Debug, Clone, Copy)]
pub struct Id(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for Id {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => {
                debug!("No such id: {}", rejection);
                Err(AppError::NotFound)
            }
        }
    }
}

/// Re-renders 404 and 403 pages with the current user's nav.
///
/// The session is only looked up when a response carries an [`ErrorPage`].
pub async fn error_pages(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let res = next.run(req).await;

    let Some(kind) = res.extensions().get::<ErrorPage>().copied() else {
        return res;
    };
    let session = Session::resolve(&state, &jar).unwrap_or_else(|e| {
        warn!("Session lookup failed on error page: {}", e);
        Session::default()
    });

    let (mut parts, _) = res.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    let body = kind.render(session.user()).into_response().into_body();
    Response::from_parts(parts, body)
}
