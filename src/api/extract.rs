//! Request extractors whose rejections render as [`AppError`]

use std::collections::HashMap;

use axum::extract::{FromRequest, FromRequestParts, Multipart};

use crate::{services::UploadedFile, utils::AppError};

/// `axum::Json` with the API error envelope on malformed bodies
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with the API error envelope on bad segments
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// A buffered multipart form: trimmed text fields by name and file parts in
/// arrival order
#[derive(Debug, Default)]
pub struct FormParts {
    fields: HashMap<String, String>,
    files: Vec<(String, UploadedFile)>,
}

impl FormParts {
    /// Drain a multipart stream
    ///
    /// A file input left empty by the client (no name, no bytes) is dropped.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut parts = FormParts::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    parts.files.push((
                        name,
                        UploadedFile {
                            file_name: Some(file_name),
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    ));
                }
                None => {
                    let value = field.text().await?;
                    parts.fields.insert(name, value.trim().to_string());
                }
            }
        }

        Ok(parts)
    }

    pub fn text(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// First file sent under exactly `name`
    pub fn file(&mut self, name: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|(n, _)| n == name)?;
        Some(self.files.remove(index).1)
    }

    /// Every file sent as `name`, `name[]` or `name[N]`, in arrival order
    pub fn files(&mut self, name: &str) -> Vec<UploadedFile> {
        let (matched, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(n, _)| is_array_field(name, n));
        self.files = rest;
        matched.into_iter().map(|(_, file)| file).collect()
    }
}

fn is_array_field(base: &str, name: &str) -> bool {
    match name.strip_prefix(base) {
        Some("") => true,
        Some(rest) => {
            rest.starts_with('[')
                && rest.ends_with(']')
                && rest[1..rest.len() - 1].chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}
