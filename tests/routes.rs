mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_login_burst_is_rate_limited() {
    let repo = common::InMemoryLinkRepository::new();
    let (server, _state, _rx) = common::make_server(repo);

    let mut statuses = Vec::new();
    for _ in 0..20 {
        let response = server
            .post("/login")
            .json(&json!({ "user": common::MASTER_USER, "hash": "00" }))
            .await;
        statuses.push(response.status_code());
    }

    assert!(
        statuses[..10]
            .iter()
            .all(|s| *s == StatusCode::UNAUTHORIZED)
    );
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_login_limit_does_not_block_redirects() {
    let repo = common::InMemoryLinkRepository::new();
    repo.seed("aB3xZ", "https://example.com", "Example", None);
    let (server, _state, _rx) = common::make_server(repo);

    for _ in 0..20 {
        server
            .post("/login")
            .json(&json!({ "user": common::MASTER_USER, "hash": "00" }))
            .await;
    }

    server
        .get("/aB3xZ")
        .await
        .assert_status(StatusCode::FOUND);
}

#[tokio::test]
async fn test_code_path_serves_redirect_and_rename() {
    let repo = common::InMemoryLinkRepository::new();
    let link = repo.seed("aB3xZ", "https://example.com", "Example", None);
    let (server, state, _rx) = common::make_server(repo.clone());

    server
        .get("/aB3xZ")
        .await
        .assert_status(StatusCode::FOUND);

    server
        .patch(&format!("/{}", link.id))
        .authorization_bearer(common::issue_token(&state))
        .json(&json!({ "nome": "Renamed" }))
        .await
        .assert_status_ok();

    assert_eq!(repo.find(link.id).unwrap().name, "Renamed");
}

#[tokio::test]
async fn test_trailing_slash_is_trimmed() {
    let repo = common::InMemoryLinkRepository::new();
    repo.seed("aB3xZ", "https://example.com", "Example", None);
    let (server, state, _rx) = common::make_server(repo);

    server
        .get("/aB3xZ/")
        .await
        .assert_status(StatusCode::FOUND);

    server
        .get("/all/")
        .authorization_bearer(common::issue_token(&state))
        .await
        .assert_status_ok();
}
