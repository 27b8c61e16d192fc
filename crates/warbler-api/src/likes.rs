use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use crate::auth::AppState;
use crate::error::AppError;
use crate::flash;
use crate::middleware::{Id, Session};
use crate::render::{self, Page};
use crate::users::{load_user, viewer_following, viewer_likes};

/// POST /users/add_like/{message_id}
///
/// Toggles: the first post likes the message, the next one removes the like.
/// Authors cannot like their own messages.
pub async fn add_like(
    State(state): State<AppState>,
    session: Session,
    Id(message_id): Id,
) -> Result<Response, AppError> {
    let me = session.require_user()?;
    let msg = state.db.get_message(message_id)?.ok_or(AppError::NotFound)?;

    if msg.user_id == me.id {
        warn!("User {} tried to like their own message {}", me.id, msg.id);
        return Err(AppError::Forbidden);
    }

    let added = state.db.toggle_like(me.id, msg.id)?;
    info!(
        "User {} {} message {}",
        me.username,
        if added { "liked" } else { "unliked" },
        msg.id
    );

    Ok(flash::redirect("/"))
}

/// GET /users/{id}/likes
pub async fn show_likes(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Id(user_id): Id,
) -> Result<impl IntoResponse, AppError> {
    session.require_user()?;
    let user = load_user(&state, user_id)?;
    let stats = state.db.user_stats(user_id)?;
    let messages = state.db.liked_messages(user_id)?;
    let following = viewer_following(&state, session.user())?;
    let liked = viewer_likes(&state, session.user())?;

    let (jar, flash) = flash::take(jar);
    let page = Page::new(session.user(), flash);
    Ok((
        jar,
        render::user_likes(&page, &user, &stats, &messages, &following, &liked),
    ))
}
