pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod extractor;
pub mod food;
pub mod forms;
pub mod profile;

use serde::Serialize;

#[derive(Debug, Serialize)]
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
