//! Food photo analysis: one model call, then a strict JSON parse with a
//! regex fallback so the caller always gets a complete estimate.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::ai_service::{GenerativeModel, UpstreamError};
use crate::models::NutritionEstimate;

pub const DEFAULT_FOOD_NAME: &str = "Unknown Food";
pub const DEFAULT_WEIGHT_GRAMS: f64 = 100.0;
pub const DEFAULT_CALORIES: f64 = 200.0;
pub const DEFAULT_PROTEIN_GRAMS: f64 = 10.0;

pub const FOOD_ANALYSIS_PROMPT: &str = "You are a nutritionist. Look at the food in this image and estimate:\n\
    1. The name of the food or dish\n\
    2. Its weight in grams\n\
    3. Its calories\n\
    4. Its protein in grams\n\
    \n\
    Reply with ONLY a JSON object in exactly this shape:\n\
    {\"foodName\": \"dish name\", \"weight\": number, \"calories\": number, \"protein\": number}\n\
    No explanations, no extra text. If unsure, give your best reasonable estimate.";

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)```(?:json)?").unwrap());
// A quoted key must be followed by its separator; a bare key by a separator or whitespace.
static FOOD_NAME_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:["']foodName["']\s*[:=]|\bfoodName(?:\s*[:=]|\s))\s*["']([^"'\n]*)["']"#)
        .unwrap()
});
static WEIGHT_FIELD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)weight.*?(\d+)").unwrap());
static CALORIES_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)calories.*?(\d+)").unwrap());
static PROTEIN_FIELD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)protein.*?(\d+)").unwrap());

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("generative model unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),
}

/// Outcome of decoding the model text as the expected JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum StrictParse {
    Ok(NutritionEstimate),
    Failed(String),
}

pub struct NutritionAnalyzer {
    model: Arc<dyn GenerativeModel>,
}

impl NutritionAnalyzer {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub async fn analyze_food_image(
        &self,
        image: &[u8],
        media_type: &str,
    ) -> Result<NutritionEstimate, PipelineError> {
        log::info!(
            "📸 Analyzing food image ({} bytes, {}) with {}/{}",
            image.len(),
            media_type,
            self.model.provider_name(),
            self.model.model_name()
        );

        let response = self
            .model
            .describe_image(FOOD_ANALYSIS_PROMPT, image, media_type)
            .await
            .map_err(|e| {
                log::error!("❌ {} call failed: {}", self.model.provider_name(), e);
                PipelineError::UpstreamUnavailable(e)
            })?;

        Ok(extract_estimate(&response))
    }
}

/// Turn raw model text into an estimate. Never fails.
pub fn extract_estimate(response: &str) -> NutritionEstimate {
    let text = strip_code_fences(response);
    log::debug!("📥 Model response (cleaned): {}", text);

    match strict_parse(&text) {
        StrictParse::Ok(estimate) => estimate,
        StrictParse::Failed(reason) => {
            log::warn!("⚠️ Strict parse failed ({}), using regex fallback", reason);
            fallback_parse(&text)
        }
    }
}

/// Remove every ``` marker (with an optional `json` tag), paired or not.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

pub fn strict_parse(text: &str) -> StrictParse {
    let decoded = decode_estimate(text).or_else(|first_err| match object_span(text) {
        Some(span) if span.len() < text.len() => decode_estimate(span),
        _ => Err(first_err),
    });

    match decoded {
        Ok(estimate) => StrictParse::Ok(estimate),
        Err(reason) => StrictParse::Failed(reason),
    }
}

/// Independent per-field searches; any field that is not found takes its default.
pub fn fallback_parse(text: &str) -> NutritionEstimate {
    let food_name = FOOD_NAME_FIELD
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_FOOD_NAME.to_string());

    NutritionEstimate {
        food_name,
        weight_grams: first_number(&WEIGHT_FIELD, text).unwrap_or(DEFAULT_WEIGHT_GRAMS),
        calories: first_number(&CALORIES_FIELD, text).unwrap_or(DEFAULT_CALORIES),
        protein_grams: first_number(&PROTEIN_FIELD, text).unwrap_or(DEFAULT_PROTEIN_GRAMS),
    }
}

fn first_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// The text from the first `{` to the last `}`, for objects wrapped in prose.
fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn decode_estimate(text: &str) -> Result<NutritionEstimate, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let object = value.as_object().ok_or("response is not a JSON object")?;

    let food_name = object
        .get("foodName")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or("foodName is missing or not a string")?;

    Ok(NutritionEstimate {
        food_name: food_name.to_string(),
        weight_grams: number_field(object, "weight")?,
        calories: number_field(object, "calories")?,
        protein_grams: number_field(object, "protein")?,
    })
}

/// Accept JSON numbers and numeric strings; reject negatives.
fn number_field(object: &Map<String, Value>, key: &str) -> Result<f64, String> {
    let value = object
        .get(key)
        .ok_or_else(|| format!("{} is missing", key))?;

    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
    .ok_or_else(|| format!("{} is not a number: {}", key, value))?;

    if number < 0.0 {
        return Err(format!("{} is negative: {}", key, number));
    }

    Ok(number)
}
