//! Test application setup utilities
//!
//! Provides utilities for setting up test instances of the application
//! with a throwaway SQLite file and upload directory.

use std::{path::PathBuf, sync::Arc};

use axum::{body::Body, http::Request, Router};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use facility_desk::{
    api,
    config::{AppConfig, DatabaseConfig},
    db,
    services::{BlobStore, LocalBlobStore},
    AppState,
};

use super::fixtures::{unique_email, MultipartForm, TEST_PASSWORD};

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// A registered account and its bearer token
#[derive(Debug, Clone)]
pub struct TestAccount {
    pub id: i64,
    pub email: String,
    pub token: String,
}

impl TestApp {
    /// Create a new test application backed by local photo storage
    pub async fn new() -> Self {
        let config = test_config();
        let storage = Arc::new(LocalBlobStore::new(
            &config.storage.upload_dir,
            &config.storage.public_prefix,
        ));
        Self::with_storage(config, storage).await
    }

    /// Create a new test application with a custom photo store
    pub async fn with_storage(config: AppConfig, storage: Arc<dyn BlobStore>) -> Self {
        let db = db::init_pool(&config.database)
            .await
            .expect("Failed to initialize test database");

        let state = AppState {
            config,
            db,
            storage,
        };

        let router = api::app_router(state.clone());

        Self { router, state }
    }

    /// Make a GET request to the test application
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.request(json_request("POST", uri, &body)).await
    }

    /// Make an authenticated GET request
    pub async fn get_as(&self, token: &str, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.request_with_auth(request, token).await
    }

    /// Make an authenticated request with a JSON body
    pub async fn json_as(&self, token: &str, method: &str, uri: &str, body: Value) -> TestResponse {
        self.request_with_auth(json_request(method, uri, &body), token)
            .await
    }

    /// Make an authenticated DELETE request
    pub async fn delete_as(&self, token: &str, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.request_with_auth(request, token).await
    }

    /// Make an authenticated multipart request
    pub async fn multipart_as(
        &self,
        token: &str,
        method: &str,
        uri: &str,
        form: MultipartForm,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", form.content_type())
            .body(Body::from(form.into_body()))
            .unwrap();
        self.request_with_auth(request, token).await
    }

    /// Make a request with authentication
    pub async fn request_with_auth(&self, request: Request<Body>, token: &str) -> TestResponse {
        let (mut parts, body) = request.into_parts();
        parts.headers.insert(
            "Authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        self.request(Request::from_parts(parts, body)).await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Register an account with the given role through the API
    pub async fn register(&self, role: &str) -> TestAccount {
        let email = unique_email();
        let response = self
            .post_json(
                "/api/register",
                json!({
                    "name": super::fixtures::fake_name(),
                    "email": email,
                    "password": TEST_PASSWORD,
                    "role": role,
                }),
            )
            .await;
        response.assert_created();

        let body: Value = response.json();
        TestAccount {
            id: body["data"]["id"].as_i64().expect("registered user id"),
            email,
            token: body["token"].as_str().expect("registration token").to_string(),
        }
    }

    /// Create an organization owned by `owner`, returning its id
    pub async fn create_organization(&self, owner: &TestAccount, name: &str) -> i64 {
        let response = self
            .multipart_as(
                &owner.token,
                "POST",
                "/api/organizations",
                MultipartForm::new().text("name", name),
            )
            .await;
        response.assert_created();
        response.json::<Value>()["data"]["id"]
            .as_i64()
            .expect("organization id")
    }

    /// Create a department in an owned organization, returning its id
    pub async fn create_department(
        &self,
        owner: &TestAccount,
        organization_id: i64,
        name: &str,
    ) -> i64 {
        let response = self
            .json_as(
                &owner.token,
                "POST",
                "/api/departments",
                json!({ "name": name, "organization_id": organization_id }),
            )
            .await;
        response.assert_created();
        response.json::<Value>()["data"]["id"]
            .as_i64()
            .expect("department id")
    }

    /// Place a user in a department
    pub async fn add_member(&self, actor: &TestAccount, user_id: i64, department_id: i64) {
        self.json_as(
            &actor.token,
            "POST",
            "/api/assign-user-department",
            json!({ "user_id": user_id, "department_id": department_id }),
        )
        .await
        .assert_ok();
    }

    /// Give a department its admin
    pub async fn assign_admin(&self, owner: &TestAccount, department_id: i64, user_id: i64) {
        self.json_as(
            &owner.token,
            "PUT",
            "/api/AssignAdmins",
            json!({ "department_id": department_id, "user_id": user_id }),
        )
        .await
        .assert_ok();
    }

    /// File a maintenance request without photos, returning its id
    pub async fn file_request(&self, member: &TestAccount, department_id: i64, title: &str) -> i64 {
        let response = self
            .multipart_as(
                &member.token,
                "POST",
                "/api/maintenance-requests",
                MultipartForm::new()
                    .text("department_id", &department_id.to_string())
                    .text("title", title),
            )
            .await;
        response.assert_created();
        response.json::<Value>()["data"]["id"]
            .as_i64()
            .expect("maintenance request id")
    }
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    /// Assert the response status
    pub fn assert_status(&self, expected: axum::http::StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::OK)
    }

    /// Assert the response status is Created (201)
    pub fn assert_created(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::CREATED)
    }

    /// Assert the response status is Unauthorized (401)
    pub fn assert_unauthorized(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::UNAUTHORIZED)
    }

    /// Assert the response status is Forbidden (403)
    pub fn assert_forbidden(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::FORBIDDEN)
    }

    /// Assert the response status is Not Found (404)
    pub fn assert_not_found(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::NOT_FOUND)
    }

    /// Assert the response status is Conflict (409)
    pub fn assert_conflict(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::CONFLICT)
    }

    /// Assert a 422 carrying a message for `field`
    pub fn assert_field_error(&self, field: &str) -> &Self {
        self.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = self.json();
        assert!(
            body["errors"].get(field).is_some(),
            "Expected a field error for {}, got: {}",
            field,
            self.text()
        );
        self
    }

    /// The `message` of a JSON body
    pub fn message(&self) -> String {
        self.json::<Value>()["message"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

/// Create a test configuration with a temporary SQLite database and upload dir
pub fn test_config() -> AppConfig {
    // Use a unique temp file for each test to avoid conflicts
    let id = Uuid::new_v4().simple().to_string();
    let db_path = format!("/tmp/facility_desk_test_{}.db", id);

    let mut config = AppConfig::default();
    config.database = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", db_path),
        max_connections: 1,
        min_connections: 1,
        connect_timeout_secs: 30,
        idle_timeout_secs: 600,
    };
    config.auth.jwt_secret = "test_secret_key_that_is_at_least_32_bytes_long".to_string();
    config.storage.upload_dir = PathBuf::from(format!("/tmp/facility_desk_uploads_{}", id));
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_creation() {
        let app = TestApp::new().await;
        assert_eq!(app.state.config.storage.public_prefix, "/storage");
    }
}
