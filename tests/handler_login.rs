mod common;

use serde_json::{Value, json};

use encurta::utils::hashing::login_hash;

#[tokio::test]
async fn test_login_success_token_opens_protected_routes() {
    let repo = common::InMemoryLinkRepository::new();
    let (server, _state, _rx) = common::make_server(repo);

    let response = server
        .post("/login")
        .json(&json!({ "user": common::MASTER_USER, "hash": common::master_hash() }))
        .await;

    response.assert_status_ok();
    let token = response.json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(token.split('.').count(), 3);

    server
        .get("/all")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_login_wrong_password() {
    let repo = common::InMemoryLinkRepository::new();
    let (server, _state, _rx) = common::make_server(repo);

    let response = server
        .post("/login")
        .json(&json!({
            "user": common::MASTER_USER,
            "hash": login_hash(common::MASTER_USER, "wrong", common::SALT)
        }))
        .await;

    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn test_login_other_user() {
    let repo = common::InMemoryLinkRepository::new();
    let (server, _state, _rx) = common::make_server(repo);

    server
        .post("/login")
        .json(&json!({
            "user": "mallory",
            "hash": login_hash("mallory", common::MASTER_PASS, common::SALT)
        }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_login_missing_fields() {
    let repo = common::InMemoryLinkRepository::new();
    let (server, _state, _rx) = common::make_server(repo);

    server
        .post("/login")
        .json(&json!({ "user": common::MASTER_USER }))
        .await
        .assert_status_unauthorized();

    server
        .post("/login")
        .json(&json!({ "hash": common::master_hash() }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_login_without_body() {
    let repo = common::InMemoryLinkRepository::new();
    let (server, _state, _rx) = common::make_server(repo);

    server.post("/login").await.assert_status_unauthorized();
}

#[tokio::test]
async fn test_failures_look_the_same() {
    let repo = common::InMemoryLinkRepository::new();
    let (server, _state, _rx) = common::make_server(repo);

    let missing = server
        .post("/login")
        .json(&json!({ "user": common::MASTER_USER }))
        .await
        .json::<Value>();
    let wrong = server
        .post("/login")
        .json(&json!({ "user": common::MASTER_USER, "hash": "00" }))
        .await
        .json::<Value>();

    assert_eq!(missing, wrong);
}
