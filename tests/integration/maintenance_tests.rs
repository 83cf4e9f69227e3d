//! Maintenance request filing, role-scoped listing, assignment and status

use std::sync::Arc;

use serde_json::{json, Value};

use crate::common::{images, test_config, FlakyBlobStore, MultipartForm, TestAccount, TestApp};

/// An organization with one department, its admin, a member and a maintenance worker
struct Site {
    owner: TestAccount,
    admin: TestAccount,
    member: TestAccount,
    worker: TestAccount,
    department_id: i64,
}

async fn site(app: &TestApp) -> Site {
    let owner = app.register("user").await;
    let admin = app.register("user").await;
    let member = app.register("user").await;
    let worker = app.register("maintenance").await;

    let org_id = app.create_organization(&owner, "Acme").await;
    let department_id = app.create_department(&owner, org_id, "Facilities").await;
    app.assign_admin(&owner, department_id, admin.id).await;
    app.add_member(&owner, member.id, department_id).await;

    Site {
        owner,
        admin,
        member,
        worker,
        department_id,
    }
}

fn listed_ids(body: &Value) -> Vec<i64> {
    let mut ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn test_member_files_request_with_photos() {
    let app = TestApp::new().await;
    let site = site(&app).await;

    let response = app
        .multipart_as(
            &site.member.token,
            "POST",
            "/api/maintenance-requests",
            MultipartForm::new()
                .text("department_id", &site.department_id.to_string())
                .text("title", "Broken heater")
                .text("description", "Room 204 is freezing")
                .file("photos[]", "a.jpg", "image/jpeg", &images::JPEG)
                .file("photos[]", "b.gif", "image/gif", images::GIF),
        )
        .await;

    response.assert_created();
    let body: Value = response.json();
    let data = &body["data"];
    assert_eq!(data["status"], "new");
    assert_eq!(data["user_id"], site.member.id);
    assert!(data["assigned_to"].is_null());

    let photos = data["photos"].as_array().unwrap();
    assert_eq!(photos.len(), 2);
    assert!(photos[0]["url"]
        .as_str()
        .unwrap()
        .starts_with("/storage/maintenance_photos/"));
}

#[tokio::test]
async fn test_non_member_is_forbidden() {
    let app = TestApp::new().await;
    let site = site(&app).await;
    let outsider = app.register("user").await;

    let response = app
        .multipart_as(
            &outsider.token,
            "POST",
            "/api/maintenance-requests",
            MultipartForm::new()
                .text("department_id", &site.department_id.to_string())
                .text("title", "Let me in"),
        )
        .await;
    response.assert_forbidden();
    assert_eq!(response.message(), "You are not a member of this department.");
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = TestApp::new().await;
    let site = site(&app).await;

    app.multipart_as(
        &site.member.token,
        "POST",
        "/api/maintenance-requests",
        MultipartForm::new()
            .text("department_id", &site.department_id.to_string())
            .text("title", "Odd status")
            .text("status", "archived"),
    )
    .await
    .assert_field_error("status");

    app.multipart_as(
        &site.member.token,
        "POST",
        "/api/maintenance-requests",
        MultipartForm::new().text("department_id", "999999"),
    )
    .await
    .assert_field_error("department_id")
    .assert_field_error("title");

    app.multipart_as(
        &site.member.token,
        "POST",
        "/api/maintenance-requests",
        MultipartForm::new()
            .text("department_id", &site.department_id.to_string())
            .text("title", "Not a photo")
            .file("photos[]", "ok.png", "image/png", &images::PNG)
            .file("photos[]", "notes.txt", "text/plain", images::TEXT),
    )
    .await
    .assert_field_error("photos.1");
}

#[tokio::test]
async fn test_blank_title_is_required() {
    let app = TestApp::new().await;
    let site = site(&app).await;

    let response = app
        .multipart_as(
            &site.member.token,
            "POST",
            "/api/maintenance-requests",
            MultipartForm::new()
                .text("department_id", &site.department_id.to_string())
                .text("title", "   "),
        )
        .await;
    response.assert_field_error("title");
    assert_eq!(
        response.json::<Value>()["errors"]["title"][0],
        "The title field is required."
    );

    let body: Value = app
        .get_as(&site.member.token, "/api/maintenance-requests")
        .await
        .json();
    assert!(listed_ids(&body).is_empty());
}

#[tokio::test]
async fn test_oversize_photo_is_rejected() {
    let app = TestApp::new().await;
    let site = site(&app).await;

    let mut big = images::PNG.to_vec();
    big.resize(2048 * 1024 + 1, 0);

    app.multipart_as(
        &site.member.token,
        "POST",
        "/api/maintenance-requests",
        MultipartForm::new()
            .text("department_id", &site.department_id.to_string())
            .text("title", "Huge photo")
            .file("photos[]", "big.png", "image/png", &big),
    )
    .await
    .assert_field_error("photos.0");
}

#[tokio::test]
async fn test_listing_is_scoped_by_role() {
    let app = TestApp::new().await;
    let site = site(&app).await;
    let other_member = app.register("user").await;
    app.add_member(&site.owner, other_member.id, site.department_id)
        .await;

    // A second organization whose requests the admin must not see
    let other_owner = app.register("user").await;
    let other_org = app.create_organization(&other_owner, "Elsewhere").await;
    let other_dept = app
        .create_department(&other_owner, other_org, "Grounds")
        .await;
    let outsider = app.register("user").await;
    app.add_member(&other_owner, outsider.id, other_dept).await;

    let mine = app
        .file_request(&site.member, site.department_id, "Flickering light")
        .await;
    let theirs = app
        .file_request(&other_member, site.department_id, "Jammed door")
        .await;
    let elsewhere = app.file_request(&outsider, other_dept, "Weeds").await;

    let body: Value = app
        .get_as(&site.member.token, "/api/maintenance-requests")
        .await
        .json();
    assert_eq!(listed_ids(&body), vec![mine]);

    let body: Value = app
        .get_as(&site.admin.token, "/api/maintenance-requests")
        .await
        .json();
    assert_eq!(listed_ids(&body), vec![mine, theirs]);

    let body: Value = app
        .get_as(&site.worker.token, "/api/maintenance-requests")
        .await
        .json();
    assert!(listed_ids(&body).is_empty());

    // Owners are unrestricted
    let body: Value = app
        .get_as(&site.owner.token, "/api/maintenance-requests")
        .await
        .json();
    assert_eq!(listed_ids(&body), vec![mine, theirs, elsewhere]);
}

#[tokio::test]
async fn test_listing_eager_loads_relations() {
    let app = TestApp::new().await;
    let site = site(&app).await;
    app.file_request(&site.member, site.department_id, "Dripping ceiling")
        .await;

    let body: Value = app
        .get_as(&site.member.token, "/api/maintenance-requests")
        .await
        .json();
    let row = &body["data"][0];
    assert_eq!(row["user"]["id"], site.member.id);
    assert_eq!(row["department"]["id"], site.department_id);
    assert!(row["assignee"].is_null());
    assert!(row["photos"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_creator_cannot_assign_or_change_status() {
    let app = TestApp::new().await;
    let site = site(&app).await;
    let request_id = app
        .file_request(&site.member, site.department_id, "Cracked tile")
        .await;

    let response = app
        .json_as(
            &site.member.token,
            "POST",
            &format!("/api/maintenance-requests/{}/assign", request_id),
            json!({ "user_id": site.worker.id }),
        )
        .await;
    response.assert_forbidden();
    assert_eq!(
        response.message(),
        "You are not allowed to update this maintenance request."
    );

    app.json_as(
        &site.member.token,
        "PATCH",
        &format!("/api/maintenance-requests/{}/status", request_id),
        json!({ "status": "done" }),
    )
    .await
    .assert_forbidden();
}

#[tokio::test]
async fn test_admin_assigns_and_worker_progresses_request() {
    let app = TestApp::new().await;
    let site = site(&app).await;
    let request_id = app
        .file_request(&site.member, site.department_id, "No hot water")
        .await;

    let response = app
        .json_as(
            &site.admin.token,
            "POST",
            &format!("/api/maintenance-requests/{}/assign", request_id),
            json!({ "user_id": site.worker.id }),
        )
        .await;
    response.assert_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["assigned_to"], site.worker.id);
    assert_eq!(body["data"]["assignee"]["id"], site.worker.id);

    let body: Value = app
        .get_as(&site.worker.token, "/api/maintenance-requests")
        .await
        .json();
    assert_eq!(listed_ids(&body), vec![request_id]);

    let response = app
        .json_as(
            &site.worker.token,
            "PATCH",
            &format!("/api/maintenance-requests/{}/status", request_id),
            json!({ "status": "in-progress" }),
        )
        .await;
    response.assert_ok();
    assert_eq!(response.json::<Value>()["data"]["status"], "in-progress");

    // No transition table: any value may follow any other
    app.json_as(
        &site.admin.token,
        "PATCH",
        &format!("/api/maintenance-requests/{}/status", request_id),
        json!({ "status": "new" }),
    )
    .await
    .assert_ok();
}

#[tokio::test]
async fn test_assign_and_status_check_order() {
    let app = TestApp::new().await;
    let site = site(&app).await;
    let request_id = app
        .file_request(&site.member, site.department_id, "Squeaky hinge")
        .await;

    app.json_as(
        &site.admin.token,
        "POST",
        "/api/maintenance-requests/999999/assign",
        json!({ "user_id": site.worker.id }),
    )
    .await
    .assert_not_found();

    app.json_as(
        &site.admin.token,
        "POST",
        &format!("/api/maintenance-requests/{}/assign", request_id),
        json!({ "user_id": 999999 }),
    )
    .await
    .assert_field_error("user_id");

    app.json_as(
        &site.admin.token,
        "PATCH",
        &format!("/api/maintenance-requests/{}/status", request_id),
        json!({ "status": "finished" }),
    )
    .await
    .assert_field_error("status");

    // Status is validated before the request is looked up
    app.json_as(
        &site.admin.token,
        "PATCH",
        "/api/maintenance-requests/999999/status",
        json!({ "status": "finished" }),
    )
    .await
    .assert_field_error("status");
}

#[tokio::test]
async fn test_maintenance_team_lists_maintenance_accounts() {
    let app = TestApp::new().await;
    let site = site(&app).await;

    let body: Value = app
        .get_as(&site.member.token, "/api/maintenance-team")
        .await
        .json();
    let team = body["data"].as_array().unwrap();
    assert_eq!(team.len(), 1);
    assert_eq!(team[0]["id"], site.worker.id);
}

#[tokio::test]
async fn test_storage_failure_keeps_earlier_photos() {
    let store = Arc::new(FlakyBlobStore::new(1));
    let app = TestApp::with_storage(test_config(), store.clone()).await;
    let site = site(&app).await;

    let response = app
        .multipart_as(
            &site.member.token,
            "POST",
            "/api/maintenance-requests",
            MultipartForm::new()
                .text("department_id", &site.department_id.to_string())
                .text("title", "Two photos")
                .file("photos[]", "a.png", "image/png", &images::PNG)
                .file("photos[]", "b.png", "image/png", &images::PNG),
        )
        .await;
    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.stored(), 1);

    let body: Value = app
        .get_as(&site.member.token, "/api/maintenance-requests")
        .await
        .json();
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["photos"].as_array().unwrap().len(), 1);
}
