//! In-process test client: drives the router with `oneshot`, keeps cookies
//! between requests and can follow redirects.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use axum_extra::extract::cookie::Cookie;
use http_body_util::BodyExt;
use tower::ServiceExt;

use warbler_api::auth::{AppState, AppStateInner, SESSION_COOKIE, create_token};
use warbler_db::Database;
use warbler_db::models::{MessageRow, NewMessage, NewUser, UserRow};

pub const SECRET: &str = "test-secret";

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

pub struct TestClient {
    pub state: AppState,
    router: Router,
    cookies: HashMap<String, String>,
}

impl TestClient {
    pub fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            secret: SECRET.to_string(),
        });
        Self {
            router: warbler_api::router(state.clone()),
            state,
            cookies: HashMap::new(),
        }
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Puts `user_id` in the session, as a login would.
    pub fn login_as(&mut self, user_id: i64) {
        let token = create_token(SECRET, user_id).unwrap();
        self.cookies.insert(SESSION_COOKIE.to_string(), token);
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let req = Request::get(uri).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    /// Follows `Location` headers with GETs until a non-redirect response.
    pub async fn follow(&mut self, mut res: TestResponse) -> TestResponse {
        for _ in 0..10 {
            if !res.status.is_redirection() {
                return res;
            }
            let location = res.location.clone().expect("redirect without Location");
            res = self.get(&location).await;
        }
        panic!("redirect loop");
    }

    async fn send(&mut self, mut req: Request<Body>) -> TestResponse {
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            req.headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let res = self.router.clone().oneshot(req).await.unwrap();

        for set in res.headers().get_all(header::SET_COOKIE) {
            let cookie = Cookie::parse(set.to_str().unwrap()).unwrap();
            if cookie.value().is_empty() {
                self.cookies.remove(cookie.name());
            } else {
                self.cookies
                    .insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }

        let status = res.status();
        let location = res
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = res.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

// -- Fixtures --

pub fn add_user(db: &Database, id: i64, username: &str) -> UserRow {
    let email = format!("{username}@test.com");
    db.insert_user(&NewUser {
        id: Some(id),
        email: &email,
        username,
        password: "HASHED_PASSWORD",
        image_url: None,
    })
    .unwrap()
}

pub fn add_message(db: &Database, id: i64, user_id: i64, text: &str) -> MessageRow {
    db.insert_message(&NewMessage {
        id: Some(id),
        text,
        user_id,
    })
    .unwrap()
}
