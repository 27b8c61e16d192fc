mod common;

use axum::http::StatusCode;

use common::{TestClient, add_message, add_user};

/// testuser (5555) reads a message written by abc (778).
fn setup() -> TestClient {
    let client = TestClient::new();
    let db = client.db();
    add_user(db, 5555, "testuser");
    add_user(db, 778, "abc");
    add_message(db, 1234, 778, "trouble with tribbles");
    add_message(db, 1235, 5555, "my own words");
    client
}

#[tokio::test]
async fn add_like() {
    let mut client = setup();
    client.login_as(5555);

    let res = client.post_form("/users/add_like/1234", &[]).await;
    assert_eq!(res.status, StatusCode::FOUND);

    let liked = client.db().liked_messages(5555).unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].message.id, 1234);
}

#[tokio::test]
async fn remove_like() {
    let mut client = setup();
    client.db().toggle_like(5555, 1234).unwrap();
    client.login_as(5555);

    let res = client.post_form("/users/add_like/1234", &[]).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert!(!client.db().has_liked(5555, 1234).unwrap());
    assert!(client.db().liked_messages(5555).unwrap().is_empty());
}

#[tokio::test]
async fn like_own_message_is_forbidden() {
    let mut client = setup();
    client.login_as(5555);

    let res = client.post_form("/users/add_like/1235", &[]).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(res.body.contains(r#"href="/logout""#));
    assert!(!client.db().has_liked(5555, 1235).unwrap());
}

#[tokio::test]
async fn like_unknown_message_is_404() {
    let mut client = setup();
    client.login_as(5555);

    let res = client.post_form("/users/add_like/999", &[]).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unauthenticated_like() {
    let mut client = setup();

    let res = client.post_form("/users/add_like/1234", &[]).await;
    let res = client.follow(res).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("Unauthorized access."));
    assert_eq!(client.db().user_stats(5555).unwrap().likes, 0);
}

#[tokio::test]
async fn show_likes() {
    let mut client = setup();
    client.db().toggle_like(5555, 1234).unwrap();
    client.login_as(5555);

    let res = client.get("/users/5555/likes").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("trouble with tribbles"));
    assert!(!res.body.contains("my own words"));
}

#[tokio::test]
async fn unauthorized_likes_page_access() {
    let mut client = setup();
    client.db().toggle_like(5555, 1234).unwrap();

    let res = client.get("/users/5555/likes").await;
    let res = client.follow(res).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("Unauthorized access."));
    assert!(!res.body.contains("trouble with tribbles"));
}

#[tokio::test]
async fn timeline_marks_liked_messages() {
    let mut client = setup();
    client.db().follow(5555, 778).unwrap();
    client.db().toggle_like(5555, 1234).unwrap();
    client.login_as(5555);

    let res = client.get("/").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("trouble with tribbles"));
    assert!(res.body.contains("my own words"));
    assert!(res.body.contains(r#"action="/users/add_like/1234""#));
    assert!(!res.body.contains(r#"action="/users/add_like/1235""#));
    assert!(res.body.contains(r#"class="btn btn-primary">&#9733;"#));
}
