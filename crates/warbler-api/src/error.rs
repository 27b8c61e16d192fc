use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use thiserror::Error;
use tracing::{error, warn};

use warbler_db::DbError;
use warbler_db::models::UserRow;
use warbler_types::models::Flash;

use crate::{flash, render};

/// Notice shown after a request that needs a login (or ownership) it lacks.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized access.";

/// Shown when a unique username or email collides on signup or profile edit.
pub const TAKEN_MESSAGE: &str = "Username or email already taken.";

/// Marks a 404 or 403 body so the error-page layer can re-render it for the
/// current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPage {
    NotFound,
    Forbidden,
}

impl ErrorPage {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorPage::NotFound => StatusCode::NOT_FOUND,
            ErrorPage::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    pub fn render(self, viewer: Option<&UserRow>) -> Html<String> {
        match self {
            ErrorPage::NotFound => render::not_found(viewer),
            ErrorPage::Forbidden => render::forbidden(viewer),
        }
    }
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        let mut res = (self.status(), self.render(None)).into_response();
        res.extensions_mut().insert(self);
        res
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    /// Soft failure: redirect home and flash [`UNAUTHORIZED_MESSAGE`].
    #[error("unauthorized access")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => ErrorPage::NotFound.into_response(),
            AppError::Unauthorized => {
                let jar = flash::set(CookieJar::new(), Flash::danger(UNAUTHORIZED_MESSAGE));
                (jar, flash::redirect("/")).into_response()
            }
            AppError::Forbidden => ErrorPage::Forbidden.into_response(),
            AppError::Db(DbError::Invalid(msg)) => {
                warn!("Rejected input: {}", msg);
                (StatusCode::BAD_REQUEST, msg).into_response()
            }
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
