use anyhow::Context;
use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;

use super::{extractor::AdminUser, MessageResponse};
use crate::error::ApiError;
use crate::models::PendingUser;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApprovalAction {
    Approve,
    Reject,
}

impl ApprovalAction {
    fn parse(action: &str) -> Option<Self> {
        match action {
            "approve" => Some(ApprovalAction::Approve),
            "reject" => Some(ApprovalAction::Reject),
            _ => None,
        }
    }
}

/// Admin routes, nested under `/api/admin`.
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/pending-users", get(pending_users))
        .route("/users/:id/approval", patch(update_approval))
}

async fn pending_users(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PendingUser>>, ApiError> {
    let users = state
        .db
        .get_pending_users()
        .await
        .context("Failed to fetch pending users")?;

    Ok(Json(users))
}

async fn update_approval(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ApprovalRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let action = ApprovalAction::parse(&request.action)
        .ok_or_else(|| ApiError::bad_request("Invalid action"))?;

    let (changed, message) = match action {
        ApprovalAction::Approve => (
            state.db.approve_user(id).await,
            "User approved successfully",
        ),
        ApprovalAction::Reject => (
            state.db.delete_user(id).await,
            "User rejected and removed",
        ),
    };

    if !changed.context("Failed to update user approval")? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    log::info!("🛡️ Admin {} applied {:?} to user {}", admin.id, action, id);
    Ok(Json(MessageResponse::new(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_action_parse() {
        assert_eq!(ApprovalAction::parse("approve"), Some(ApprovalAction::Approve));
        assert_eq!(ApprovalAction::parse("reject"), Some(ApprovalAction::Reject));
        assert_eq!(ApprovalAction::parse("Approve"), None);
        assert_eq!(ApprovalAction::parse("ban"), None);
    }
}
