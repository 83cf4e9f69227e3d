//! Maintenance request workflow
//!
//! Members file requests against their department. Department admins and
//! assigned maintenance staff move them along; each role lists only its own
//! slice.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    db::{DepartmentRepository, MaintenanceRepository, UserRepository},
    middleware::AuthUser,
    models::{
        AssignMaintenanceRequest, MaintenanceRequest, MaintenanceRequestDetail, MaintenanceStatus,
        NewMaintenanceRequest, Role, UpdateMaintenanceStatusRequest, UserPublic,
    },
    services::{
        policy::{self, Visibility},
        storage::{validate_image, BlobStore, ImageKind, UploadedFile},
    },
    utils::{
        validation::{invalid_selection_message, push_error, required_message},
        AppError, AppResult, FieldErrors,
    },
    AppState,
};

const PHOTO_FOLDER: &str = "maintenance_photos";
const PHOTO_KINDS: [ImageKind; 3] = [ImageKind::Jpeg, ImageKind::Png, ImageKind::Gif];
const TITLE_MAX: usize = 255;
const NOT_FOUND: &str = "Maintenance request not found.";

/// Fields received from the maintenance request form
#[derive(Debug, Clone, Default)]
pub struct MaintenanceForm {
    pub department_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub photos: Vec<UploadedFile>,
}

pub struct MaintenanceService {
    pool: SqlitePool,
    storage: Arc<dyn BlobStore>,
    max_upload_bytes: usize,
}

impl MaintenanceService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.db.clone(),
            storage: state.storage.clone(),
            max_upload_bytes: state.config.max_upload_bytes(),
        }
    }

    /// File a new request with its photos
    ///
    /// Photos are stored and recorded one at a time after the request row
    /// exists; a storage failure part-way keeps the photos already saved.
    pub async fn create(
        &self,
        user: &AuthUser,
        form: MaintenanceForm,
    ) -> AppResult<MaintenanceRequestDetail> {
        let departments = DepartmentRepository::new(&self.pool);
        let mut errors = FieldErrors::new();

        let department = match form.department_id.as_deref().map(str::trim) {
            None | Some("") => {
                push_error(&mut errors, "department_id", required_message("department_id"));
                None
            }
            Some(raw) => {
                let found = match raw.parse::<i64>() {
                    Ok(id) => departments.get_by_id(id).await?,
                    Err(_) => None,
                };
                if found.is_none() {
                    push_error(
                        &mut errors,
                        "department_id",
                        invalid_selection_message("department_id"),
                    );
                }
                found
            }
        };

        match form.title.as_deref() {
            None | Some("") => push_error(&mut errors, "title", required_message("title")),
            Some(title) if title.chars().count() > TITLE_MAX => push_error(
                &mut errors,
                "title",
                format!("The title field must not be greater than {} characters.", TITLE_MAX),
            ),
            Some(_) => {}
        }

        let status = match form.status.as_deref() {
            None | Some("") => Some(MaintenanceStatus::default()),
            Some(raw) => parse_status(&mut errors, raw),
        };

        let mut photo_kinds = Vec::with_capacity(form.photos.len());
        for (index, photo) in form.photos.iter().enumerate() {
            let field = format!("photos.{}", index);
            match validate_image(&field, photo, &PHOTO_KINDS, self.max_upload_bytes) {
                Ok(kind) => photo_kinds.push(kind),
                Err(message) => push_error(&mut errors, field, message),
            }
        }

        let (Some(department), Some(title), Some(status)) = (department, form.title, status)
        else {
            return Err(AppError::validation(errors));
        };
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        if !departments.is_member(department.id, user.id).await? {
            return Err(AppError::forbidden("You are not a member of this department."));
        }

        let repo = MaintenanceRepository::new(&self.pool);
        let request = repo
            .create(&NewMaintenanceRequest {
                user_id: user.id,
                department_id: department.id,
                title,
                description: form.description.filter(|d| !d.is_empty()),
                status,
            })
            .await?;

        let mut photos = Vec::with_capacity(form.photos.len());
        for (photo, kind) in form.photos.iter().zip(photo_kinds) {
            let url = self
                .storage
                .put(PHOTO_FOLDER, kind.extension(), &photo.bytes)
                .await
                .map_err(|e| {
                    warn!(
                        request_id = request.id,
                        stored = photos.len(),
                        "Photo upload failed part-way"
                    );
                    AppError::Storage(format!("{:#}", e))
                })?;
            photos.push(repo.add_photo(request.id, &url).await?);
        }

        info!(
            request_id = request.id,
            department_id = department.id,
            user_id = user.id,
            photos = photos.len(),
            "Maintenance request created"
        );

        let user_row = UserRepository::new(&self.pool).get_by_id(user.id).await?;
        Ok(MaintenanceRequestDetail {
            request,
            user: user_row.map(UserPublic::from),
            department: Some(department),
            assignee: None,
            photos,
        })
    }

    /// Requests visible to the caller's role, newest first
    pub async fn list(&self, user: &AuthUser) -> AppResult<Vec<MaintenanceRequestDetail>> {
        let filter = Visibility::for_user(user).filter();
        let requests = MaintenanceRepository::new(&self.pool).list(filter).await?;
        self.details(requests).await
    }

    /// All accounts holding the `maintenance` role
    pub async fn team(&self) -> AppResult<Vec<UserPublic>> {
        Ok(UserRepository::new(&self.pool)
            .list_by_role(Role::Maintenance)
            .await?
            .into_iter()
            .map(UserPublic::from)
            .collect())
    }

    pub async fn assign(
        &self,
        user: &AuthUser,
        request_id: i64,
        req: &AssignMaintenanceRequest,
    ) -> AppResult<MaintenanceRequestDetail> {
        let request = self.request(request_id).await?;

        let assignee_id = match req.user_id {
            None => {
                return Err(AppError::invalid_field("user_id", required_message("user_id")));
            }
            Some(id) => id,
        };
        if !UserRepository::new(&self.pool).exists(assignee_id).await? {
            return Err(AppError::invalid_field(
                "user_id",
                invalid_selection_message("user_id"),
            ));
        }

        self.authorize_update(user, &request).await?;

        let updated = MaintenanceRepository::new(&self.pool)
            .assign(request_id, assignee_id)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

        info!(
            request_id,
            assigned_to = assignee_id,
            assigned_by = user.id,
            "Maintenance request assigned"
        );
        self.detail(updated).await
    }

    /// Overwrite the status; any of the six values may follow any other
    pub async fn update_status(
        &self,
        user: &AuthUser,
        request_id: i64,
        req: &UpdateMaintenanceStatusRequest,
    ) -> AppResult<MaintenanceRequestDetail> {
        let mut errors = FieldErrors::new();
        let status = match req.status.as_deref() {
            None | Some("") => {
                push_error(&mut errors, "status", required_message("status"));
                None
            }
            Some(raw) => parse_status(&mut errors, raw),
        };
        let Some(status) = status else {
            return Err(AppError::validation(errors));
        };

        let request = self.request(request_id).await?;
        self.authorize_update(user, &request).await?;

        let updated = MaintenanceRepository::new(&self.pool)
            .set_status(request_id, status)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

        info!(
            request_id,
            from = %request.status,
            to = %status,
            changed_by = user.id,
            "Maintenance request status changed"
        );
        self.detail(updated).await
    }

    async fn request(&self, request_id: i64) -> AppResult<MaintenanceRequest> {
        MaintenanceRepository::new(&self.pool)
            .get_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }

    async fn authorize_update(&self, user: &AuthUser, request: &MaintenanceRequest) -> AppResult<()> {
        let department = DepartmentRepository::new(&self.pool)
            .get_by_id(request.department_id)
            .await?;

        match department {
            Some(department) if policy::can_update(user, request, &department) => Ok(()),
            _ => Err(AppError::forbidden(
                "You are not allowed to update this maintenance request.",
            )),
        }
    }

    async fn detail(&self, request: MaintenanceRequest) -> AppResult<MaintenanceRequestDetail> {
        let mut details = self.details(vec![request]).await?;
        details
            .pop()
            .ok_or_else(|| AppError::internal("Failed to load maintenance request"))
    }

    /// Attach creator, department, assignee and photos in batched lookups
    async fn details(
        &self,
        requests: Vec<MaintenanceRequest>,
    ) -> AppResult<Vec<MaintenanceRequestDetail>> {
        let mut user_ids: Vec<i64> = requests
            .iter()
            .flat_map(|r| std::iter::once(r.user_id).chain(r.assigned_to))
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let mut department_ids: Vec<i64> = requests.iter().map(|r| r.department_id).collect();
        department_ids.sort_unstable();
        department_ids.dedup();

        let request_ids: Vec<i64> = requests.iter().map(|r| r.id).collect();

        let users = UserRepository::new(&self.pool).get_many(&user_ids).await?;
        let departments = DepartmentRepository::new(&self.pool)
            .get_many(&department_ids)
            .await?;
        let mut photos = MaintenanceRepository::new(&self.pool)
            .photos_for(&request_ids)
            .await?;

        Ok(requests
            .into_iter()
            .map(|request| MaintenanceRequestDetail {
                user: users.get(&request.user_id).cloned().map(UserPublic::from),
                department: departments.get(&request.department_id).cloned(),
                assignee: request
                    .assigned_to
                    .and_then(|id| users.get(&id).cloned())
                    .map(UserPublic::from),
                photos: photos.remove(&request.id).unwrap_or_default(),
                request,
            })
            .collect())
    }
}

fn parse_status(errors: &mut FieldErrors, raw: &str) -> Option<MaintenanceStatus> {
    match raw.parse::<MaintenanceStatus>() {
        Ok(status) => Some(status),
        Err(_) => {
            push_error(errors, "status", invalid_selection_message("status"));
            None
        }
    }
}
