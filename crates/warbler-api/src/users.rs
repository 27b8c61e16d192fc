use std::collections::HashSet;

use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use warbler_db::DbError;
use warbler_db::models::{ProfileUpdate, UserRow};
use warbler_types::api::{ProfileForm, SearchQuery};
use warbler_types::models::Flash;

use crate::auth::{self, AppState};
use crate::error::{AppError, TAKEN_MESSAGE};
use crate::flash;
use crate::middleware::{Id, Session};
use crate::render::{self, Page, Roster};

/// Messages shown on a profile page.
pub const PROFILE_MESSAGE_LIMIT: u32 = 100;

/// Ids the viewer follows, for rendering follow/unfollow buttons.
pub(crate) fn viewer_following(state: &AppState, viewer: Option<&UserRow>) -> Result<HashSet<i64>, AppError> {
    match viewer {
        Some(v) => Ok(state.db.following_ids(v.id)?),
        None => Ok(HashSet::new()),
    }
}

/// Ids the viewer has liked, for marking like buttons.
pub(crate) fn viewer_likes(state: &AppState, viewer: Option<&UserRow>) -> Result<HashSet<i64>, AppError> {
    match viewer {
        Some(v) => Ok(state.db.liked_message_ids(v.id)?),
        None => Ok(HashSet::new()),
    }
}

pub(crate) fn load_user(state: &AppState, user_id: i64) -> Result<UserRow, AppError> {
    state.db.get_user(user_id)?.ok_or(AppError::NotFound)
}

/// GET /users: all users, or those whose username contains `q`.
pub async fn list_users(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let users = state.db.list_users(search)?;
    let following = viewer_following(&state, session.user())?;

    let (jar, flash) = flash::take(jar);
    let page = Page::new(session.user(), flash);
    Ok((jar, render::users_index(&page, &users, search, &following)))
}

/// GET /users/{id}: profile with the user's messages.
pub async fn show_user(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Id(user_id): Id,
) -> Result<impl IntoResponse, AppError> {
    let user = load_user(&state, user_id)?;
    let stats = state.db.user_stats(user_id)?;
    let messages = state.db.user_messages(user_id, PROFILE_MESSAGE_LIMIT)?;
    let following = viewer_following(&state, session.user())?;
    let liked = viewer_likes(&state, session.user())?;

    let (jar, flash) = flash::take(jar);
    let page = Page::new(session.user(), flash);
    Ok((
        jar,
        render::user_detail(&page, &user, &stats, &messages, &following, &liked),
    ))
}

/// GET /users/{id}/following
pub async fn show_following(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Id(user_id): Id,
) -> Result<impl IntoResponse, AppError> {
    session.require_user()?;
    let user = load_user(&state, user_id)?;
    let members = state.db.following(user_id)?;
    roster_page(&state, &session, jar, Roster::Following, &user, &members)
}

/// GET /users/{id}/followers
pub async fn show_followers(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Id(user_id): Id,
) -> Result<impl IntoResponse, AppError> {
    session.require_user()?;
    let user = load_user(&state, user_id)?;
    let members = state.db.followers(user_id)?;
    roster_page(&state, &session, jar, Roster::Followers, &user, &members)
}

fn roster_page(
    state: &AppState,
    session: &Session,
    jar: CookieJar,
    roster: Roster,
    user: &UserRow,
    members: &[UserRow],
) -> Result<Response, AppError> {
    let stats = state.db.user_stats(user.id)?;
    let following = viewer_following(state, session.user())?;

    let (jar, flash) = flash::take(jar);
    let page = Page::new(session.user(), flash);
    Ok((
        jar,
        render::user_roster(&page, roster, user, &stats, members, &following),
    )
        .into_response())
}

/// POST /users/follow/{id}
pub async fn follow(
    State(state): State<AppState>,
    session: Session,
    Id(follow_id): Id,
) -> Result<Response, AppError> {
    let me = session.require_user()?;
    let followed = load_user(&state, follow_id)?;

    state.db.follow(me.id, followed.id)?;
    info!("User {} now follows {}", me.username, followed.username);
    Ok(flash::redirect(&format!("/users/{}/following", me.id)))
}

/// POST /users/stop-following/{id}
pub async fn stop_following(
    State(state): State<AppState>,
    session: Session,
    Id(follow_id): Id,
) -> Result<Response, AppError> {
    let me = session.require_user()?;
    let followed = load_user(&state, follow_id)?;

    state.db.unfollow(me.id, followed.id)?;
    info!("User {} stopped following {}", me.username, followed.username);
    Ok(flash::redirect(&format!("/users/{}/following", me.id)))
}

/// GET /users/profile
pub async fn edit_profile_form(session: Session, jar: CookieJar) -> Result<impl IntoResponse, AppError> {
    let me = session.require_user()?;
    let (jar, flash) = flash::take(jar);
    let page = Page::new(Some(me), flash);
    Ok((jar, render::edit_profile_form(&page, me)))
}

/// POST /users/profile: requires the current password.
pub async fn edit_profile(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let me = session.require_user()?;

    if let Err(problem) = form.validate() {
        let page = Page::new(Some(me), Some(Flash::danger(problem)));
        return Ok(render::edit_profile_form(&page, me).into_response());
    }

    if state.db.authenticate(&me.username, &form.password)?.is_none() {
        warn!("Profile edit for {} refused: wrong password", me.username);
        let jar = flash::set(jar, Flash::danger("Wrong password, please try again."));
        return Ok((jar, flash::redirect("/")).into_response());
    }

    let update = ProfileUpdate {
        username: form.username.trim(),
        email: form.email.trim(),
        image_url: form.image_url.as_deref(),
        header_image_url: form.header_image_url.as_deref(),
        bio: form.bio.as_deref(),
        location: form.location.as_deref(),
    };

    match state.db.update_profile(me.id, &update) {
        Ok(Some(user)) => {
            info!("User {} updated their profile", user.username);
            Ok(flash::redirect(&format!("/users/{}", user.id)))
        }
        Ok(None) => Err(AppError::NotFound),
        Err(DbError::Integrity(detail)) => {
            warn!("Profile edit for {} rejected: {}", me.username, detail);
            let jar = flash::set(jar, Flash::danger(TAKEN_MESSAGE));
            Ok((jar, flash::redirect("/users/profile")).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /users/delete: removes the current user and logs them out.
pub async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let me = session.require_user()?;

    state.db.delete_user(me.id)?;
    info!("User {} deleted their account", me.username);

    let jar = auth::end_session(jar);
    Ok((jar, flash::redirect("/signup")).into_response())
}
