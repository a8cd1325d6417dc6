use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub height: f64, // cm
    pub weight: f64, // kg
    pub body_type: BodyType,
    pub goal: Goal,
    pub profile_photo: Option<String>,
    pub is_approved: bool,
    pub is_admin: bool,
    pub daily_calorie_goal: i32,
    pub daily_protein_goal: i32,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Admins may always log in; everybody else needs approval first.
    pub fn can_log_in(&self) -> bool {
        self.is_approved || self.is_admin
    }
}

/// Fields collected at registration, before the row exists.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub height: f64,
    pub weight: f64,
    pub body_type: BodyType,
    pub goal: Goal,
    pub profile_photo: Option<String>,
    pub is_approved: bool,
    pub is_admin: bool,
    pub daily_calorie_goal: i32,
    pub daily_protein_goal: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    Lean,
    Bulk,
    Normal,
}

impl std::fmt::Display for BodyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BodyType::Lean => "Lean",
            BodyType::Bulk => "Bulk",
            BodyType::Normal => "Normal",
        };
        write!(f, "{}", s)
    }
}

impl BodyType {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "lean" => Some(BodyType::Lean),
            "bulk" => Some(BodyType::Bulk),
            "normal" => Some(BodyType::Normal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    #[serde(rename = "Weight Gain")]
    WeightGain,
    #[serde(rename = "Weight Loss")]
    WeightLoss,
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Goal::WeightGain => "Weight Gain",
            Goal::WeightLoss => "Weight Loss",
        };
        write!(f, "{}", s)
    }
}

impl Goal {
    pub fn from_string(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");

        match normalized.as_str() {
            "weight gain" | "gain" => Some(Goal::WeightGain),
            "weight loss" | "loss" => Some(Goal::WeightLoss),
            _ => None,
        }
    }
}

/// Row shape returned to admins reviewing sign-ups.
#[derive(Debug, Clone, Serialize)]
pub struct PendingUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub profile_photo: Option<String>,
    pub goal: Goal,
    pub body_type: BodyType,
    pub created_at: DateTime<Utc>,
}

/// Login payload sent to the client alongside the session token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub profile_photo: Option<String>,
    pub daily_calorie_goal: i32,
    pub daily_protein_goal: i32,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            profile_photo: user.profile_photo.clone(),
            daily_calorie_goal: user.daily_calorie_goal,
            daily_protein_goal: user.daily_protein_goal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: i32,
    pub user_id: i32,
    pub food_name: String,
    pub weight_grams: f64,
    pub calories: f64,
    pub protein: f64,
    pub entry_date: NaiveDate,
    pub entry_time: NaiveTime,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFoodEntry {
    pub user_id: i32,
    pub food_name: String,
    pub weight_grams: f64,
    pub calories: f64,
    pub protein: f64,
    pub entry_date: NaiveDate,
    pub entry_time: NaiveTime,
    pub image_path: Option<String>,
}

/// Nutrition values estimated from a single food photo.
///
/// Serialized with the wire names the client form expects:
/// `foodName`, `weight`, `calories`, `protein`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionEstimate {
    #[serde(rename = "foodName")]
    pub food_name: String,
    #[serde(rename = "weight")]
    pub weight_grams: f64,
    pub calories: f64,
    #[serde(rename = "protein")]
    pub protein_grams: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub calories: f64,
    pub protein: f64,
    pub entries: i64,
}
