use anyhow::Context;
use axum::{
    extract::{Query, State},
    Json,
};

use super::{extractor::AuthUser, food::HistoryQuery};
use crate::error::ApiError;
use crate::server::AppState;
use crate::services::stats::{dashboard_summary, progress_summary, DashboardSummary, ProgressSummary};

/// GET /api/dashboard/today
pub async fn today(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let date = state.config.today();
    let entries = state
        .db
        .get_entries_for_date(user.id, date)
        .await
        .context("Failed to load dashboard")?;

    Ok(Json(dashboard_summary(
        date,
        &entries,
        user.daily_calorie_goal,
        user.daily_protein_goal,
    )))
}

/// GET /api/progress?days=N
pub async fn progress(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ProgressSummary>, ApiError> {
    let since = query.window_start(state.config.today());
    let totals = state
        .db
        .get_daily_totals(user.id, since)
        .await
        .context("Failed to load progress")?;

    Ok(Json(progress_summary(totals)))
}
