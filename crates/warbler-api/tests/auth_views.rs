mod common;

use axum::http::StatusCode;

use common::{TestClient, add_user};
use warbler_api::auth::SESSION_COOKIE;

#[tokio::test]
async fn anonymous_home() {
    let mut client = TestClient::new();

    let res = client.get("/").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("Sign up now"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let mut client = TestClient::new();
    let res = client.get("/no/such/page").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.body.contains("404"));
}

#[tokio::test]
async fn signup_logs_in() {
    let mut client = TestClient::new();

    let res = client
        .post_form(
            "/signup",
            &[
                ("username", "testuser"),
                ("email", "test@test.com"),
                ("password", "password1"),
                ("image_url", ""),
            ],
        )
        .await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location.as_deref(), Some("/"));
    assert!(client.has_cookie(SESSION_COOKIE));

    let res = client.follow(res).await;
    assert!(res.body.contains("@testuser"));

    let user = client.db().get_user_by_username("testuser").unwrap().unwrap();
    assert_ne!(user.password, "password1");
}

#[tokio::test]
async fn signup_short_password() {
    let mut client = TestClient::new();

    let res = client
        .post_form(
            "/signup",
            &[
                ("username", "testuser"),
                ("email", "test@test.com"),
                ("password", ""),
            ],
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("Password must be at least 6 characters."));
    assert!(client.db().get_user_by_username("testuser").unwrap().is_none());
    assert!(!client.has_cookie(SESSION_COOKIE));
}

#[tokio::test]
async fn signup_taken_username() {
    let mut client = TestClient::new();
    add_user(client.db(), 1, "testuser");

    let res = client
        .post_form(
            "/signup",
            &[
                ("username", "testuser"),
                ("email", "fresh@test.com"),
                ("password", "password1"),
            ],
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("Username or email already taken."));
    assert_eq!(client.db().list_users(None).unwrap().len(), 1);
}

#[tokio::test]
async fn signup_taken_email() {
    let mut client = TestClient::new();
    add_user(client.db(), 1, "testuser");

    let res = client
        .post_form(
            "/signup",
            &[
                ("username", "newcomer"),
                ("email", "testuser@test.com"),
                ("password", "password1"),
            ],
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("Username or email already taken."));
    assert!(client.db().get_user_by_username("newcomer").unwrap().is_none());
    assert!(!client.has_cookie(SESSION_COOKIE));
}

#[tokio::test]
async fn login_and_logout() {
    let mut client = TestClient::new();
    let user = client
        .db()
        .signup("testuser", "test@test.com", "password1", None)
        .unwrap();

    let res = client
        .post_form("/login", &[("username", "testuser"), ("password", "password1")])
        .await;
    assert_eq!(res.status, StatusCode::FOUND);
    let res = client.follow(res).await;
    assert!(res.body.contains("Hello, testuser!"));

    let res = client.get(&format!("/users/{}/following", user.id)).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = client.get("/logout").await;
    assert_eq!(res.location.as_deref(), Some("/login"));
    assert!(!client.has_cookie(SESSION_COOKIE));
    let res = client.follow(res).await;
    assert!(res.body.contains("You have successfully logged out."));

    let res = client.get(&format!("/users/{}/following", user.id)).await;
    assert_eq!(res.status, StatusCode::FOUND);
}

#[tokio::test]
async fn login_invalid_credentials() {
    let mut client = TestClient::new();
    client
        .db()
        .signup("testuser", "test@test.com", "password1", None)
        .unwrap();

    for (username, password) in [("test", "password1"), ("testuser", "password")] {
        let res = client
            .post_form("/login", &[("username", username), ("password", password)])
            .await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains("Invalid credentials."));
        assert!(!client.has_cookie(SESSION_COOKIE));
    }
}

#[tokio::test]
async fn forged_session_is_anonymous() {
    let mut client = TestClient::new();
    add_user(client.db(), 5555, "testuser");
    client.login_as(424242);

    let res = client.get("/users/5555/following").await;
    let res = client.follow(res).await;
    assert!(res.body.contains("Unauthorized access."));
}
