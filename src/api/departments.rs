//! Department endpoints: CRUD, admin slot and membership

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use crate::{
    api::extract::{ApiJson, ApiPath},
    middleware::AuthUser,
    models::{
        AdminAssignment, CreateDepartmentRequest, DataResponse, Department,
        DepartmentAdminRequest, DepartmentMemberRequest, DepartmentUser, MessageResponse,
        UpdateDepartmentRequest,
    },
    services::DepartmentService,
    utils::AppResult,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/departments", post(create_department))
        // GET takes an organization id; PUT and DELETE take a department id
        .route(
            "/departments/{id}",
            get(list_departments)
                .put(update_department)
                .delete(delete_department),
        )
        .route("/AssignAdmins", put(assign_admin))
        .route("/RemoveAdmins", put(remove_admin))
        .route("/assign-user-department", post(add_member))
}

async fn create_department(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(payload): ApiJson<CreateDepartmentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Department>>)> {
    let department = DepartmentService::new(state.db.clone())
        .create(&auth_user, &payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(
            "Department created successfully",
            department,
        )),
    ))
}

async fn list_departments(
    State(state): State<AppState>,
    ApiPath(organization_id): ApiPath<i64>,
) -> AppResult<Json<DataResponse<Vec<Department>>>> {
    let departments = DepartmentService::new(state.db.clone())
        .list_for_organization(organization_id)
        .await?;
    Ok(Json(DataResponse::new(departments)))
}

async fn update_department(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateDepartmentRequest>,
) -> AppResult<Json<DataResponse<Department>>> {
    let department = DepartmentService::new(state.db.clone())
        .update(&auth_user, id, &payload)
        .await?;
    Ok(Json(DataResponse::with_message(
        "Department updated successfully",
        department,
    )))
}

async fn delete_department(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<MessageResponse>> {
    DepartmentService::new(state.db.clone())
        .delete(&auth_user, id)
        .await?;
    Ok(Json(MessageResponse::new("Department deleted successfully")))
}

async fn assign_admin(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(payload): ApiJson<DepartmentAdminRequest>,
) -> AppResult<Json<DataResponse<AdminAssignment>>> {
    let assignment = DepartmentService::new(state.db.clone())
        .assign_admin(&auth_user, &payload)
        .await?;
    Ok(Json(DataResponse::with_message(
        "Admin assigned successfully",
        assignment,
    )))
}

async fn remove_admin(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(payload): ApiJson<DepartmentAdminRequest>,
) -> AppResult<Json<DataResponse<AdminAssignment>>> {
    let assignment = DepartmentService::new(state.db.clone())
        .remove_admin(&auth_user, &payload)
        .await?;
    Ok(Json(DataResponse::with_message(
        "Admin removed successfully",
        assignment,
    )))
}

async fn add_member(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<DepartmentMemberRequest>,
) -> AppResult<Json<DataResponse<DepartmentUser>>> {
    let membership = DepartmentService::new(state.db.clone())
        .add_member(&payload)
        .await?;
    Ok(Json(DataResponse::with_message(
        "User assigned to department successfully.",
        membership,
    )))
}
