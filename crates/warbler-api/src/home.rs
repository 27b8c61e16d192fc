use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::AppState;
use crate::error::AppError;
use crate::flash;
use crate::middleware::Session;
use crate::render::{self, Page};

/// Most messages shown on the home timeline.
pub const TIMELINE_LIMIT: u32 = 100;

pub async fn homepage(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, flash) = flash::take(jar);

    let Some(user) = session.user() else {
        let page = Page::new(None, flash);
        return Ok((jar, render::home_anon(&page)).into_response());
    };

    // Timeline joins across follows; keep it off the async workers.
    let db = state.clone();
    let user_id = user.id;
    let (feed, liked, stats) = tokio::task::spawn_blocking(move || {
        let feed = db.db.timeline(user_id, TIMELINE_LIMIT)?;
        let liked = db.db.liked_message_ids(user_id)?;
        let stats = db.db.user_stats(user_id)?;
        Ok::<_, AppError>((feed, liked, stats))
    })
    .await??;

    let page = Page::new(Some(user), flash);
    Ok((jar, render::home(&page, user, &stats, &feed, &liked)).into_response())
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}
