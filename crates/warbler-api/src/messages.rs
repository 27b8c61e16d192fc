use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use warbler_db::models::{MAX_MESSAGE_LEN, NewMessage};
use warbler_types::api::MessageForm;
use warbler_types::models::Flash;

use crate::auth::AppState;
use crate::error::AppError;
use crate::flash;
use crate::middleware::{Id, Session};
use crate::render::{self, Page};
use crate::users::viewer_likes;

/// GET /messages/new
pub async fn new_message_form(session: Session, jar: CookieJar) -> Result<impl IntoResponse, AppError> {
    let me = session.require_user()?;
    let (jar, flash) = flash::take(jar);
    let page = Page::new(Some(me), flash);
    Ok((jar, render::message_form(&page, "")))
}

/// POST /messages/new: one message per request, then back to the profile.
pub async fn create_message(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<MessageForm>,
) -> Result<Response, AppError> {
    let me = session.require_user()?;

    let text = form.text.trim();
    let problem = if text.is_empty() {
        Some("Message text is required.")
    } else if text.chars().count() > MAX_MESSAGE_LEN {
        Some("Messages are limited to 140 characters.")
    } else {
        None
    };
    if let Some(problem) = problem {
        let page = Page::new(Some(me), Some(Flash::danger(problem)));
        return Ok(render::message_form(&page, &form.text).into_response());
    }

    let msg = state.db.insert_message(&NewMessage {
        id: None,
        text,
        user_id: me.id,
    })?;
    info!("User {} posted message {}", me.username, msg.id);

    Ok(flash::redirect(&format!("/users/{}", me.id)))
}

/// GET /messages/{id}
pub async fn show_message(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Id(message_id): Id,
) -> Result<impl IntoResponse, AppError> {
    let item = state
        .db
        .get_message_with_author(message_id)?
        .ok_or(AppError::NotFound)?;
    let liked = viewer_likes(&state, session.user())?;

    let (jar, flash) = flash::take(jar);
    let page = Page::new(session.user(), flash);
    Ok((jar, render::message_detail(&page, &item, &liked)))
}

/// POST /messages/{id}/delete: only the author may delete.
pub async fn delete_message(
    State(state): State<AppState>,
    session: Session,
    Id(message_id): Id,
) -> Result<Response, AppError> {
    let me = session.require_user()?;
    let msg = state.db.get_message(message_id)?.ok_or(AppError::NotFound)?;

    if msg.user_id != me.id {
        warn!("User {} tried to delete message {} owned by {}", me.id, msg.id, msg.user_id);
        return Err(AppError::Unauthorized);
    }

    state.db.delete_message(msg.id)?;
    info!("User {} deleted message {}", me.username, msg.id);
    Ok(flash::redirect(&format!("/users/{}", me.id)))
}
