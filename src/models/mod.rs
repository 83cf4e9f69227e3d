//! Data models

mod department;
mod join_request;
mod maintenance;
mod organization;
mod user;

pub use department::*;
pub use join_request::*;
pub use maintenance::*;
pub use organization::*;
pub use user::*;

use serde::Serialize;

/// Plain acknowledgement body
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Payload with an optional acknowledgement, `{"message": ..., "data": ...}`
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            message: None,
            data,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            data,
        }
    }
}
