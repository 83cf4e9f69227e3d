//! Organization lifecycle
//!
//! Creating an organization makes the caller an `owner`; deleting one makes
//! them a plain `user` again.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::info;

use crate::{
    db::OrganizationRepository,
    middleware::AuthUser,
    models::{CreateOrganizationRequest, Organization, Role, UpdateOrganizationRequest},
    services::{
        policy,
        storage::{validate_image, BlobStore, ImageKind, UploadedFile},
    },
    utils::{
        validation::{push_error, required_message},
        AppError, AppResult, FieldErrors,
    },
    AppState,
};

const PHOTO_FOLDER: &str = "organizations";
const PHOTO_KINDS: [ImageKind; 2] = [ImageKind::Jpeg, ImageKind::Png];
const NAME_MAX: usize = 255;

/// Fields received from the organization form
#[derive(Debug, Clone, Default)]
pub struct OrganizationForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub photo: Option<UploadedFile>,
}

pub struct OrganizationService {
    pool: SqlitePool,
    storage: Arc<dyn BlobStore>,
    max_upload_bytes: usize,
}

impl OrganizationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.db.clone(),
            storage: state.storage.clone(),
            max_upload_bytes: state.config.max_upload_bytes(),
        }
    }

    pub async fn create(&self, user: &AuthUser, form: OrganizationForm) -> AppResult<Organization> {
        let mut errors = FieldErrors::new();
        match form.name.as_deref() {
            None | Some("") => push_error(&mut errors, "name", required_message("name")),
            Some(name) => check_name(&mut errors, name),
        }
        let photo_kind = self.check_photo(&mut errors, form.photo.as_ref());
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        let url = self.store_photo(form.photo.as_ref(), photo_kind).await?;
        let req = CreateOrganizationRequest {
            name: form.name.unwrap_or_default(),
            description: form.description,
            url,
        };

        let organization = OrganizationRepository::new(&self.pool)
            .create_for_owner(user.id, &req)
            .await?;

        info!(
            organization_id = organization.id,
            owner_id = user.id,
            "Organization created; creator promoted to owner"
        );
        Ok(organization)
    }

    pub async fn list_all(&self) -> AppResult<Vec<Organization>> {
        Ok(OrganizationRepository::new(&self.pool).list().await?)
    }

    /// Organizations owned by the caller; only `owner` accounts may ask
    pub async fn mine(&self, user: &AuthUser) -> AppResult<Vec<Organization>> {
        if !user.has_role(Role::Owner) {
            return Err(AppError::forbidden("Unauthorized or not an owner"));
        }
        Ok(OrganizationRepository::new(&self.pool)
            .list_by_owner(user.id)
            .await?)
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        organization_id: i64,
        form: OrganizationForm,
    ) -> AppResult<Organization> {
        let organization = self.owned(user, organization_id).await?;

        let mut errors = FieldErrors::new();
        if let Some(name) = form.name.as_deref() {
            if name.is_empty() {
                push_error(&mut errors, "name", required_message("name"));
            } else {
                check_name(&mut errors, name);
            }
        }
        let photo_kind = self.check_photo(&mut errors, form.photo.as_ref());
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        let url = self.store_photo(form.photo.as_ref(), photo_kind).await?;
        let req = UpdateOrganizationRequest {
            name: form.name,
            description: form.description,
            url,
        };

        OrganizationRepository::new(&self.pool)
            .update(organization.id, &req)
            .await?
            .ok_or_else(|| AppError::not_found("Organization not found"))
    }

    /// Delete an owned organization and demote the caller to `user`
    pub async fn delete(&self, user: &AuthUser, organization_id: i64) -> AppResult<()> {
        let organization = self.owned(user, organization_id).await?;

        OrganizationRepository::new(&self.pool)
            .delete_and_demote(organization.id, user.id)
            .await?;

        info!(
            organization_id,
            owner_id = user.id,
            "Organization deleted; owner demoted to user"
        );
        Ok(())
    }

    async fn owned(&self, user: &AuthUser, organization_id: i64) -> AppResult<Organization> {
        let organization = OrganizationRepository::new(&self.pool)
            .get_by_id(organization_id)
            .await?
            .ok_or_else(|| AppError::not_found("Organization not found"))?;

        if !policy::owns_organization(user, &organization) {
            return Err(AppError::forbidden("Unauthorized"));
        }
        Ok(organization)
    }

    fn check_photo(
        &self,
        errors: &mut FieldErrors,
        photo: Option<&UploadedFile>,
    ) -> Option<ImageKind> {
        let photo = photo?;
        match validate_image("photo", photo, &PHOTO_KINDS, self.max_upload_bytes) {
            Ok(kind) => Some(kind),
            Err(message) => {
                push_error(errors, "photo", message);
                None
            }
        }
    }

    async fn store_photo(
        &self,
        photo: Option<&UploadedFile>,
        kind: Option<ImageKind>,
    ) -> AppResult<Option<String>> {
        let (Some(photo), Some(kind)) = (photo, kind) else {
            return Ok(None);
        };

        let url = self
            .storage
            .put(PHOTO_FOLDER, kind.extension(), &photo.bytes)
            .await
            .map_err(|e| AppError::Storage(format!("{:#}", e)))?;
        Ok(Some(url))
    }
}

fn check_name(errors: &mut FieldErrors, name: &str) {
    if name.chars().count() > NAME_MAX {
        push_error(
            errors,
            "name",
            format!("The name field must not be greater than {} characters.", NAME_MAX),
        );
    }
}
