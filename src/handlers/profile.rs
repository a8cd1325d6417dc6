use anyhow::Context;
use axum::{extract::State, Json};
use serde::Serialize;

use super::extractor::AuthUser;
use crate::error::ApiError;
use crate::models::User;
use crate::server::AppState;

const QUOTE_PROMPT: &str = "Write one short, original motivational quote for someone tracking \
their calories and protein to reach a fitness goal. Reply with the quote only, no attribution.";

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote: String,
}

/// GET /api/profile
pub async fn get_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    let profile = state
        .db
        .get_user(user.id)
        .await
        .context("Failed to fetch profile")?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}

/// GET /api/motivational-quote
pub async fn motivational_quote(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let failed = || ApiError::Upstream("Failed to generate motivational quote".to_string());

    let raw = state.model.complete(QUOTE_PROMPT).await.map_err(|e| {
        log::error!("❌ Quote generation failed ({}): {}", state.model.provider_name(), e);
        failed()
    })?;

    let quote = clean_quote(&raw);
    if quote.is_empty() {
        log::warn!("⚠️ {} returned an empty quote", state.model.provider_name());
        return Err(failed());
    }

    Ok(Json(QuoteResponse { quote }))
}

/// Models like to wrap the quote in quotation marks.
fn clean_quote(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\u{201c}' || c == '\u{201d}')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_quote() {
        assert_eq!(clean_quote("  \"Eat well, lift heavy.\"\n"), "Eat well, lift heavy.");
        assert_eq!(clean_quote("\u{201c}Consistency wins.\u{201d}"), "Consistency wins.");
        assert_eq!(clean_quote("Keep going"), "Keep going");
        assert_eq!(clean_quote(" \"\" "), "");
    }
}
