use anyhow::Context;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Days, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

use super::{extractor::AuthUser, forms::MultipartForm, MessageResponse};
use crate::error::ApiError;
use crate::models::{FoodEntry, NewFoodEntry, NutritionEstimate};
use crate::server::AppState;

const DEFAULT_HISTORY_DAYS: u32 = 7;
const MAX_HISTORY_DAYS: u32 = 365;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<u32>,
}

impl HistoryQuery {
    /// First date included in a window of `days` days ending today.
    pub fn window_start(&self, today: NaiveDate) -> NaiveDate {
        let days = self.days.unwrap_or(DEFAULT_HISTORY_DAYS).min(MAX_HISTORY_DAYS);
        today
            .checked_sub_days(Days::new(days as u64))
            .unwrap_or(NaiveDate::MIN)
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedEntryResponse {
    pub message: String,
    pub id: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub analysis: NutritionEstimate,
    pub image_path: String,
}

/// POST /api/food-entries (multipart, optional `foodImage`)
pub async fn create_food_entry(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedEntryResponse>), ApiError> {
    let mut form = MultipartForm::read(multipart).await?;

    let food_name = form.required("foodName")?.to_string();
    let weight_grams = form.number("weight")?;
    let calories = form.number("calories")?;
    let protein = form.number("protein")?;

    let image_path = match form.take_file("foodImage") {
        Some(image) => {
            state.uploads.validate(&image)?;
            Some(state.uploads.save(&image).await.context("Failed to add food entry")?)
        }
        None => None,
    };

    let now = state.config.now_local();
    let entry = NewFoodEntry {
        user_id: user.id,
        food_name,
        weight_grams,
        calories,
        protein,
        entry_date: now.date_naive(),
        entry_time: now.time().with_nanosecond(0).unwrap_or(now.time()),
        image_path,
    };

    let id = state
        .db
        .add_food_entry(&entry)
        .await
        .context("Failed to add food entry")?;

    log::info!(
        "🍽️ User {} logged {} ({} kcal, {} g protein)",
        user.id,
        entry.food_name,
        entry.calories,
        entry.protein
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedEntryResponse {
            message: "Food entry added successfully".to_string(),
            id,
        }),
    ))
}

/// GET /api/food-entries/today
pub async fn today_entries(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<FoodEntry>>, ApiError> {
    let entries = state
        .db
        .get_entries_for_date(user.id, state.config.today())
        .await
        .context("Failed to fetch food entries")?;

    Ok(Json(entries))
}

/// GET /api/food-entries/history?days=N
pub async fn history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<FoodEntry>>, ApiError> {
    let since = query.window_start(state.config.today());
    let entries = state
        .db
        .get_entries_since(user.id, since)
        .await
        .context("Failed to fetch food history")?;

    Ok(Json(entries))
}

/// DELETE /api/food-entries/:id
pub async fn delete_food_entry(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = state
        .db
        .delete_food_entry(user.id, id)
        .await
        .context("Failed to delete food entry")?;

    if !deleted {
        return Err(ApiError::NotFound("Food entry not found".to_string()));
    }

    Ok(Json(MessageResponse::new("Food entry deleted")))
}

/// POST /api/analyze-food-image (multipart `foodImage`)
pub async fn analyze_food_image(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let image = form
        .take_file("foodImage")
        .ok_or_else(|| ApiError::bad_request("No image uploaded"))?;

    state.uploads.validate(&image)?;
    let image_path = state
        .uploads
        .save(&image)
        .await
        .context("Failed to read uploaded image")?;

    log::info!("📷 User {} uploaded {}", user.id, image_path);

    let analysis = state
        .analyzer
        .analyze_food_image(&image.bytes, &image.content_type)
        .await?;

    log::info!(
        "✅ Analysis for {}: {} ({} g, {} kcal, {} g protein)",
        image_path,
        analysis.food_name,
        analysis.weight_grams,
        analysis.calories,
        analysis.protein_grams
    );

    Ok(Json(AnalysisResponse {
        analysis,
        image_path,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_window() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

        assert_eq!(
            HistoryQuery::default().window_start(today),
            NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
        );
        assert_eq!(HistoryQuery { days: Some(0) }.window_start(today), today);
        assert_eq!(
            HistoryQuery { days: Some(30) }.window_start(today),
            NaiveDate::from_ymd_opt(2026, 2, 12).unwrap()
        );
        assert_eq!(
            HistoryQuery { days: Some(10_000) }.window_start(today),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
        );
    }

    #[test]
    fn test_analysis_response_shape() {
        let response = AnalysisResponse {
            analysis: NutritionEstimate {
                food_name: "Idli".to_string(),
                weight_grams: 80.0,
                calories: 120.0,
                protein_grams: 4.0,
            },
            image_path: "foodImage-1-2.jpg".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["imagePath"], "foodImage-1-2.jpg");
        assert_eq!(json["analysis"]["foodName"], "Idli");
        assert_eq!(json["analysis"]["weight"], 80.0);
    }
}
