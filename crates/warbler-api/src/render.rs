//! Server-side HTML. Pages are plain string builders; every user-supplied
//! value goes through [`escape`].

use std::collections::HashSet;

use axum::response::Html;

use warbler_db::models::{AuthoredMessage, MAX_MESSAGE_LEN, UserRow, UserStats};
use warbler_types::models::Flash;

/// What every page needs besides its own body: who is looking, and any
/// pending flash.
pub struct Page<'a> {
    viewer: Option<&'a UserRow>,
    flash: Option<Flash>,
}

impl<'a> Page<'a> {
    pub fn new(viewer: Option<&'a UserRow>, flash: Option<Flash>) -> Self {
        Self { viewer, flash }
    }

    fn viewer_id(&self) -> Option<i64> {
        self.viewer.map(|v| v.id)
    }
}

/// Which relationship list a profile sub-page shows.
#[derive(Debug, Clone, Copy)]
pub enum Roster {
    Following,
    Followers,
}

impl Roster {
    fn title(self) -> &'static str {
        match self {
            Roster::Following => "Following",
            Roster::Followers => "Followers",
        }
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(page: &Page<'_>, title: &str, body: &str) -> Html<String> {
    let nav = match page.viewer {
        Some(user) => format!(
            r#"<li><a href="/users/{id}"><img src="{img}" alt="{name}" class="nav-avatar"></a></li>
      <li><a href="/messages/new">New Message</a></li>
      <li><a href="/logout">Log out</a></li>"#,
            id = user.id,
            img = escape(&user.image_url),
            name = escape(&user.username),
        ),
        None => r#"<li><a href="/signup">Sign up</a></li>
      <li><a href="/login">Log in</a></li>"#
            .to_string(),
    };

    let flash = page
        .flash
        .as_ref()
        .map(|f| {
            format!(
                r#"<div class="alert alert-{}">{}</div>"#,
                f.kind.as_str(),
                escape(&f.message)
            )
        })
        .unwrap_or_default();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link rel="stylesheet" href="/static/stylesheets/style.css">
</head>
<body>
  <nav class="navbar">
    <a href="/" class="navbar-brand">Warbler</a>
    <form action="/users" class="navbar-search"><input name="q" placeholder="Search Warbler"></form>
    <ul class="nav">
      {nav}
    </ul>
  </nav>
  <div class="container">
    {flash}
    {body}
  </div>
</body>
</html>"#,
        title = escape(title),
    ))
}

fn message_item(page: &Page<'_>, item: &AuthoredMessage, liked: &HashSet<i64>) -> String {
    let msg = &item.message;
    let like_button = match page.viewer_id() {
        Some(viewer) if viewer != msg.user_id => {
            let class = if liked.contains(&msg.id) { "btn-primary" } else { "btn-secondary" };
            format!(
                r#"<form method="POST" action="/users/add_like/{id}" class="messages-like">
          <button class="btn {class}">&#9733;</button>
        </form>"#,
                id = msg.id,
            )
        }
        _ => String::new(),
    };

    format!(
        r#"<li class="message">
      <a href="/messages/{id}" class="message-link"></a>
      <a href="/users/{uid}"><img src="{img}" alt="" class="timeline-image"></a>
      <div class="message-area">
        <a href="/users/{uid}">@{name}</a>
        <span class="text-muted">{when}</span>
        <p>{text}</p>
      </div>
      {like_button}
    </li>"#,
        id = msg.id,
        uid = msg.user_id,
        img = escape(&item.image_url),
        name = escape(&item.username),
        when = msg.timestamp.format("%d %B %Y"),
        text = escape(&msg.text),
    )
}

fn message_list(page: &Page<'_>, messages: &[AuthoredMessage], liked: &HashSet<i64>) -> String {
    if messages.is_empty() {
        return r#"<p class="empty">No messages yet.</p>"#.to_string();
    }
    let items: String = messages
        .iter()
        .map(|m| message_item(page, m, liked))
        .collect();
    format!(r#"<ul class="messages">{items}</ul>"#)
}

fn follow_button(page: &Page<'_>, target: &UserRow, following: &HashSet<i64>) -> String {
    match page.viewer_id() {
        Some(viewer) if viewer != target.id => {
            if following.contains(&target.id) {
                format!(
                    r#"<form method="POST" action="/users/stop-following/{}"><button class="btn btn-primary">Unfollow</button></form>"#,
                    target.id
                )
            } else {
                format!(
                    r#"<form method="POST" action="/users/follow/{}"><button class="btn btn-outline-primary">Follow</button></form>"#,
                    target.id
                )
            }
        }
        _ => String::new(),
    }
}

fn user_card(page: &Page<'_>, user: &UserRow, following: &HashSet<i64>) -> String {
    format!(
        r#"<div class="card user-card">
      <img src="{header}" alt="" class="card-hero">
      <a href="/users/{id}"><img src="{img}" alt="Image for {name}" class="card-image"><p>@{name}</p></a>
      {button}
      <p class="card-bio">{bio}</p>
    </div>"#,
        id = user.id,
        header = escape(&user.header_image_url),
        img = escape(&user.image_url),
        name = escape(&user.username),
        button = follow_button(page, user, following),
        bio = escape(user.bio.as_deref().unwrap_or("")),
    )
}

/// Profile header shared by the detail, roster and likes pages.
fn profile_header(
    page: &Page<'_>,
    user: &UserRow,
    stats: &UserStats,
    following: &HashSet<i64>,
) -> String {
    let actions = match page.viewer_id() {
        Some(viewer) if viewer == user.id => r#"<a href="/users/profile" class="btn btn-outline-secondary">Edit Profile</a>
      <form method="POST" action="/users/delete"><button class="btn btn-outline-danger">Delete Profile</button></form>"#
            .to_string(),
        _ => follow_button(page, user, following),
    };

    format!(
        r#"<div class="profile">
  <div class="hero" style="background-image: url('{header}')"></div>
  <img src="{img}" alt="Image for {name}" class="profile-avatar">
  <h4 class="profile-username">@{name}</h4>
  <p class="profile-bio">{bio}</p>
  <p class="profile-location">{location}</p>
  <ul class="user-stats">
    <li><a href="/users/{id}">Messages <span>{messages}</span></a></li>
    <li><a href="/users/{id}/following">Following <span>{following_count}</span></a></li>
    <li><a href="/users/{id}/followers">Followers <span>{followers}</span></a></li>
    <li><a href="/users/{id}/likes">Likes <span>{likes}</span></a></li>
  </ul>
  {actions}
</div>"#,
        id = user.id,
        header = escape(&user.header_image_url),
        img = escape(&user.image_url),
        name = escape(&user.username),
        bio = escape(user.bio.as_deref().unwrap_or("")),
        location = escape(user.location.as_deref().unwrap_or("")),
        messages = stats.messages,
        following_count = stats.following,
        followers = stats.followers,
        likes = stats.likes,
    )
}

// -- Pages --

pub fn home_anon(page: &Page<'_>) -> Html<String> {
    layout(
        page,
        "Warbler",
        r#"<div class="home-hero">
      <h1>What's Happening?</h1>
      <h4>New to Warbler?</h4>
      <a href="/signup" class="btn btn-primary">Sign up now</a>
    </div>"#,
    )
}

pub fn home(
    page: &Page<'_>,
    user: &UserRow,
    stats: &UserStats,
    feed: &[AuthoredMessage],
    liked: &HashSet<i64>,
) -> Html<String> {
    let body = format!(
        r#"<aside class="user-aside">
      <a href="/users/{id}"><img src="{img}" alt="" class="card-image"><p>@{name}</p></a>
      <ul class="user-stats">
        <li><a href="/users/{id}">Messages <span>{messages}</span></a></li>
        <li><a href="/users/{id}/following">Following <span>{following}</span></a></li>
        <li><a href="/users/{id}/followers">Followers <span>{followers}</span></a></li>
      </ul>
    </aside>
    <main class="timeline">{list}</main>"#,
        id = user.id,
        img = escape(&user.image_url),
        name = escape(&user.username),
        messages = stats.messages,
        following = stats.following,
        followers = stats.followers,
        list = message_list(page, feed, liked),
    );
    layout(page, "Warbler", &body)
}

pub fn signup_form(page: &Page<'_>) -> Html<String> {
    layout(
        page,
        "Sign up",
        r#"<h2>Join Warbler today.</h2>
    <form method="POST" action="/signup" class="auth-form">
      <input name="username" placeholder="Username" required>
      <input name="email" type="email" placeholder="E-mail" required>
      <input name="password" type="password" placeholder="Password" minlength="6" required>
      <input name="image_url" placeholder="(Optional) Image URL">
      <button class="btn btn-primary">Sign me up!</button>
    </form>"#,
    )
}

pub fn login_form(page: &Page<'_>) -> Html<String> {
    layout(
        page,
        "Log in",
        r#"<h2>Welcome back.</h2>
    <form method="POST" action="/login" class="auth-form">
      <input name="username" placeholder="Username" required>
      <input name="password" type="password" placeholder="Password" required>
      <button class="btn btn-primary">Log in</button>
    </form>"#,
    )
}

pub fn edit_profile_form(page: &Page<'_>, user: &UserRow) -> Html<String> {
    let body = format!(
        r#"<h2>Edit Your Profile.</h2>
    <form method="POST" action="/users/profile" class="auth-form">
      <input name="username" value="{name}" required>
      <input name="email" type="email" value="{email}" required>
      <input name="image_url" value="{img}">
      <input name="header_image_url" value="{header}">
      <textarea name="bio">{bio}</textarea>
      <input name="location" value="{location}">
      <p>To confirm changes, enter your password:</p>
      <input name="password" type="password" required>
      <button class="btn btn-success">Edit this user!</button>
      <a href="/users/{id}" class="btn btn-outline-secondary">Cancel</a>
    </form>"#,
        id = user.id,
        name = escape(&user.username),
        email = escape(&user.email),
        img = escape(&user.image_url),
        header = escape(&user.header_image_url),
        bio = escape(user.bio.as_deref().unwrap_or("")),
        location = escape(user.location.as_deref().unwrap_or("")),
    );
    layout(page, "Edit profile", &body)
}

pub fn users_index(
    page: &Page<'_>,
    users: &[UserRow],
    search: Option<&str>,
    following: &HashSet<i64>,
) -> Html<String> {
    let body = if users.is_empty() {
        format!(
            r#"<h3>Sorry, no users found{}</h3>"#,
            search
                .map(|q| format!(" matching &quot;{}&quot;", escape(q)))
                .unwrap_or_default()
        )
    } else {
        let cards: String = users
            .iter()
            .map(|u| user_card(page, u, following))
            .collect();
        format!(r#"<div class="user-cards">{cards}</div>"#)
    };
    layout(page, "Users", &body)
}

pub fn user_detail(
    page: &Page<'_>,
    user: &UserRow,
    stats: &UserStats,
    messages: &[AuthoredMessage],
    following: &HashSet<i64>,
    liked: &HashSet<i64>,
) -> Html<String> {
    let body = format!(
        "{}\n<main class=\"timeline\">{}</main>",
        profile_header(page, user, stats, following),
        message_list(page, messages, liked),
    );
    layout(page, &format!("@{}", user.username), &body)
}

pub fn user_roster(
    page: &Page<'_>,
    roster: Roster,
    user: &UserRow,
    stats: &UserStats,
    members: &[UserRow],
    following: &HashSet<i64>,
) -> Html<String> {
    let cards: String = members
        .iter()
        .map(|u| user_card(page, u, following))
        .collect();
    let body = format!(
        "{}\n<h3>{}</h3>\n<div class=\"user-cards\">{}</div>",
        profile_header(page, user, stats, following),
        roster.title(),
        cards,
    );
    layout(page, roster.title(), &body)
}

pub fn user_likes(
    page: &Page<'_>,
    user: &UserRow,
    stats: &UserStats,
    messages: &[AuthoredMessage],
    following: &HashSet<i64>,
    liked: &HashSet<i64>,
) -> Html<String> {
    let body = format!(
        "{}\n<h3>Likes</h3>\n<main class=\"timeline\">{}</main>",
        profile_header(page, user, stats, following),
        message_list(page, messages, liked),
    );
    layout(page, "Likes", &body)
}

pub fn message_form(page: &Page<'_>, draft: &str) -> Html<String> {
    let body = format!(
        r#"<form method="POST" action="/messages/new" class="message-form">
      <textarea name="text" maxlength="{max}" placeholder="What's happening?" required>{draft}</textarea>
      <button class="btn btn-success">Add my message!</button>
    </form>"#,
        max = MAX_MESSAGE_LEN,
        draft = escape(draft),
    );
    layout(page, "New message", &body)
}

pub fn message_detail(page: &Page<'_>, item: &AuthoredMessage, liked: &HashSet<i64>) -> Html<String> {
    let msg = &item.message;
    let delete = if page.viewer_id() == Some(msg.user_id) {
        format!(
            r#"<form method="POST" action="/messages/{}/delete"><button class="btn btn-outline-danger">Delete</button></form>"#,
            msg.id
        )
    } else {
        String::new()
    };

    let body = format!(
        r#"<div class="message-detail">
      <ul class="messages">{item}</ul>
      {delete}
    </div>"#,
        item = message_item(page, item, liked),
    );
    layout(page, "Message", &body)
}

pub fn not_found(viewer: Option<&UserRow>) -> Html<String> {
    layout(
        &Page::new(viewer, None),
        "Not found",
        r#"<h1>404</h1><p>Sorry, we couldn't find that page.</p><a href="/">Go home</a>"#,
    )
}

pub fn forbidden(viewer: Option<&UserRow>) -> Html<String> {
    layout(
        &Page::new(viewer, None),
        "Forbidden",
        r#"<h1>403</h1><p>You can't do that.</p><a href="/">Go home</a>"#,
    )
}
