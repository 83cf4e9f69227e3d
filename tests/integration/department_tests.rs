//! Departments: CRUD, the admin slot and membership

use serde_json::{json, Value};

use crate::common::TestApp;

#[tokio::test]
async fn test_department_create_checks_organization_then_owner() {
    let app = TestApp::new().await;
    let owner = app.register("user").await;
    let stranger = app.register("user").await;
    let org_id = app.create_organization(&owner, "Acme").await;

    app.json_as(
        &owner.token,
        "POST",
        "/api/departments",
        json!({ "name": "Ghost", "organization_id": 999999 }),
    )
    .await
    .assert_field_error("organization_id");

    let response = app
        .json_as(
            &stranger.token,
            "POST",
            "/api/departments",
            json!({ "name": "Intruders", "organization_id": org_id }),
        )
        .await;
    response.assert_forbidden();
    assert_eq!(response.message(), "Unauthorized you should be the owner");

    app.json_as(
        &owner.token,
        "POST",
        "/api/departments",
        json!({ "organization_id": org_id }),
    )
    .await
    .assert_field_error("name");

    let dept_id = app.create_department(&owner, org_id, "Facilities").await;
    let body: Value = app
        .get_as(&stranger.token, &format!("/api/departments/{}", org_id))
        .await
        .json();
    let departments = body["data"].as_array().unwrap();
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0]["id"], dept_id);
    assert!(departments[0]["admin_id"].is_null());
}

#[tokio::test]
async fn test_department_update_and_delete() {
    let app = TestApp::new().await;
    let owner = app.register("user").await;
    let stranger = app.register("user").await;
    let org_id = app.create_organization(&owner, "Acme").await;
    let dept_id = app.create_department(&owner, org_id, "Facilities").await;

    app.json_as(
        &stranger.token,
        "PUT",
        &format!("/api/departments/{}", dept_id),
        json!({ "name": "Mine now" }),
    )
    .await
    .assert_forbidden();

    let response = app
        .json_as(
            &owner.token,
            "PUT",
            &format!("/api/departments/{}", dept_id),
            json!({ "name": "  " }),
        )
        .await;
    response.assert_field_error("name");
    assert_eq!(
        response.json::<Value>()["errors"]["name"][0],
        "The name field is required."
    );

    let response = app
        .json_as(
            &owner.token,
            "PUT",
            &format!("/api/departments/{}", dept_id),
            json!({ "description": "Buildings and grounds" }),
        )
        .await;
    response.assert_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "Facilities");
    assert_eq!(body["data"]["description"], "Buildings and grounds");

    app.delete_as(&owner.token, "/api/departments/999999")
        .await
        .assert_not_found();
    app.delete_as(&owner.token, &format!("/api/departments/{}", dept_id))
        .await
        .assert_ok();

    let body: Value = app
        .get_as(&owner.token, &format!("/api/departments/{}", org_id))
        .await
        .json();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_assign_admin_grants_role_and_fills_slot() {
    let app = TestApp::new().await;
    let owner = app.register("user").await;
    let x = app.register("user").await;
    let org_id = app.create_organization(&owner, "Acme").await;
    let dept_id = app.create_department(&owner, org_id, "Facilities").await;

    let response = app
        .json_as(
            &owner.token,
            "PUT",
            "/api/AssignAdmins",
            json!({ "department_id": dept_id, "user_id": x.id }),
        )
        .await;
    response.assert_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["department"]["admin_id"], x.id);
    assert_eq!(body["data"]["admin_user"]["role"], "dept_admin");

    let profile: Value = app.get_as(&x.token, "/api/profile").await.json();
    assert_eq!(profile["role"], "dept_admin");
}

#[tokio::test]
async fn test_occupied_admin_slot_conflicts_even_for_another_user() {
    let app = TestApp::new().await;
    let owner = app.register("user").await;
    let x = app.register("user").await;
    let y = app.register("user").await;
    let org_id = app.create_organization(&owner, "Acme").await;
    let dept_id = app.create_department(&owner, org_id, "Facilities").await;

    app.assign_admin(&owner, dept_id, x.id).await;

    let response = app
        .json_as(
            &owner.token,
            "PUT",
            "/api/AssignAdmins",
            json!({ "department_id": dept_id, "user_id": y.id }),
        )
        .await;
    response.assert_conflict();
    assert_eq!(
        response.message(),
        "This department already has an admin assigned."
    );

    let profile: Value = app.get_as(&y.token, "/api/profile").await.json();
    assert_eq!(profile["role"], "user");
}

#[tokio::test]
async fn test_assign_admin_check_order() {
    let app = TestApp::new().await;
    let owner = app.register("user").await;
    let stranger = app.register("user").await;
    let org_id = app.create_organization(&owner, "Acme").await;
    let dept_id = app.create_department(&owner, org_id, "Facilities").await;

    let response = app
        .json_as(&owner.token, "PUT", "/api/AssignAdmins", json!({ "department_id": dept_id }))
        .await;
    response.assert_field_error("user_id");
    assert_eq!(response.message(), "Both department_id and user_id are required");

    app.json_as(
        &owner.token,
        "PUT",
        "/api/AssignAdmins",
        json!({ "department_id": 999999, "user_id": stranger.id }),
    )
    .await
    .assert_not_found();

    app.json_as(
        &stranger.token,
        "PUT",
        "/api/AssignAdmins",
        json!({ "department_id": dept_id, "user_id": stranger.id }),
    )
    .await
    .assert_forbidden();

    let response = app
        .json_as(
            &owner.token,
            "PUT",
            "/api/AssignAdmins",
            json!({ "department_id": dept_id, "user_id": 999999 }),
        )
        .await;
    response.assert_not_found();
    assert_eq!(response.message(), "User not found");
}

#[tokio::test]
async fn test_remove_admin_clears_slot_and_resets_role() {
    let app = TestApp::new().await;
    let owner = app.register("user").await;
    let x = app.register("user").await;
    let y = app.register("user").await;
    let org_id = app.create_organization(&owner, "Acme").await;
    let dept_id = app.create_department(&owner, org_id, "Facilities").await;
    app.assign_admin(&owner, dept_id, x.id).await;

    let response = app
        .json_as(
            &owner.token,
            "PUT",
            "/api/RemoveAdmins",
            json!({ "department_id": dept_id, "user_id": x.id }),
        )
        .await;
    response.assert_ok();
    let body: Value = response.json();
    assert!(body["data"]["department"]["admin_id"].is_null());
    assert_eq!(body["data"]["admin_user"]["role"], "user");

    // The slot is free again
    app.assign_admin(&owner, dept_id, y.id).await;
}

#[tokio::test]
async fn test_add_member_is_idempotent_and_validated() {
    let app = TestApp::new().await;
    let owner = app.register("user").await;
    let member = app.register("user").await;
    let org_id = app.create_organization(&owner, "Acme").await;
    let dept_id = app.create_department(&owner, org_id, "Facilities").await;

    app.add_member(&owner, member.id, dept_id).await;
    app.add_member(&owner, member.id, dept_id).await;

    let response = app
        .json_as(
            &owner.token,
            "POST",
            "/api/assign-user-department",
            json!({ "user_id": 999999 }),
        )
        .await;
    response.assert_field_error("user_id");
    response.assert_field_error("department_id");

    // Membership lets the member file requests
    app.file_request(&member, dept_id, "Broken window").await;
}
