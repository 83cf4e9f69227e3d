//! Registration, login, token checks and the profile endpoints

use serde_json::{json, Value};

use crate::common::{unique_email, TestApp, TEST_PASSWORD};

#[tokio::test]
async fn test_register_returns_token_and_user() {
    let app = TestApp::new().await;
    let email = unique_email();

    let response = app
        .post_json(
            "/api/register",
            json!({
                "name": "Noor",
                "email": email,
                "password": TEST_PASSWORD,
                "role": "maintenance",
                "phone_number": "+20 100 555 0101",
            }),
        )
        .await;

    response.assert_created();
    let body: Value = response.json();
    assert_eq!(body["status"], true);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["data"]["email"], email);
    assert_eq!(body["data"]["role"], "maintenance");
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_is_field_error() {
    let app = TestApp::new().await;
    let account = app.register("user").await;

    let response = app
        .post_json(
            "/api/register",
            json!({
                "name": "Second",
                "email": account.email,
                "password": TEST_PASSWORD,
                "role": "user",
            }),
        )
        .await;

    response.assert_field_error("email");
    let body: Value = response.json();
    assert_eq!(body["errors"]["email"][0], "The email has already been taken.");
}

#[tokio::test]
async fn test_register_rejects_unknown_role_and_short_password() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/register",
            json!({
                "name": "Sam",
                "email": unique_email(),
                "password": "abc",
                "role": "Department Admin",
            }),
        )
        .await;

    response.assert_field_error("role");
    response.assert_field_error("password");
}

#[tokio::test]
async fn test_login_success_and_failure() {
    let app = TestApp::new().await;
    let account = app.register("user").await;

    let ok = app
        .post_json(
            "/api/login",
            json!({ "email": account.email, "password": TEST_PASSWORD }),
        )
        .await;
    ok.assert_ok();
    let body: Value = ok.json();
    assert_eq!(body["status"], true);
    assert_eq!(body["data"]["id"], account.id);

    let bad = app
        .post_json(
            "/api/login",
            json!({ "email": account.email, "password": "not-the-password" }),
        )
        .await;
    bad.assert_unauthorized();
    let body: Value = bad.json();
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Wrong Email or Password");
}

#[tokio::test]
async fn test_protected_route_requires_valid_token() {
    let app = TestApp::new().await;

    app.get("/api/profile").await.assert_unauthorized();
    app.get_as("not-a-jwt", "/api/profile")
        .await
        .assert_unauthorized();
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new().await;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/login")
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = app.request(request).await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_profile_update_requires_password_confirmation() {
    let app = TestApp::new().await;
    let account = app.register("user").await;

    app.json_as(
        &account.token,
        "PUT",
        "/api/profile",
        json!({ "password": "new-password-1" }),
    )
    .await
    .assert_field_error("password");

    let response = app
        .json_as(
            &account.token,
            "PUT",
            "/api/profile",
            json!({
                "name": "Renamed",
                "password": "new-password-1",
                "password_confirmation": "new-password-1",
            }),
        )
        .await;
    response.assert_ok();
    assert_eq!(response.json::<Value>()["data"]["name"], "Renamed");

    app.post_json(
        "/api/login",
        json!({ "email": account.email, "password": "new-password-1" }),
    )
    .await
    .assert_ok();
}

#[tokio::test]
async fn test_profile_email_must_stay_unique() {
    let app = TestApp::new().await;
    let first = app.register("user").await;
    let second = app.register("user").await;

    app.json_as(
        &second.token,
        "PUT",
        "/api/profile",
        json!({ "email": first.email }),
    )
    .await
    .assert_field_error("email");

    // Keeping one's own address is fine
    app.json_as(
        &second.token,
        "PUT",
        "/api/profile",
        json!({ "email": second.email }),
    )
    .await
    .assert_ok();
}

#[tokio::test]
async fn test_deleted_account_token_stops_working() {
    let app = TestApp::new().await;
    let account = app.register("user").await;

    app.get_as(&account.token, "/api/profile").await.assert_ok();
    app.delete_as(&account.token, "/api/profile")
        .await
        .assert_ok();
    app.get_as(&account.token, "/api/profile")
        .await
        .assert_unauthorized();
}
