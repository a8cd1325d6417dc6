pub mod ai_service; // GenerativeModel trait + provider selection
pub mod auth;
pub mod database;
pub mod gemini; // Google Gemini
pub mod goals;
pub mod nutrition; // Food photo -> NutritionEstimate
pub mod openrouter; // OpenRouter AI service
pub mod stats;
pub mod uploads;

pub use ai_service::{create_provider, GenerativeModel};
pub use database::Database;
pub use gemini::GeminiService;
pub use nutrition::NutritionAnalyzer;
pub use openrouter::OpenRouterService;
pub use uploads::UploadStore;
