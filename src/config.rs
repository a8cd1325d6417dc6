use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_OPENROUTER_MODEL: &str = "meta-llama/llama-4-scout:free";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    Gemini,
    OpenRouter,
}

impl FromStr for AiProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(AiProvider::Gemini),
            "openrouter" => Ok(AiProvider::OpenRouter),
            other => Err(anyhow!("Unknown AI_PROVIDER '{}', expected gemini or openrouter", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: AiProvider,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub session_secret: String,
    pub session_ttl: chrono::Duration,
    pub ai: AiConfig,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub timezone: Tz,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };

        let provider: AiProvider = lookup("AI_PROVIDER")
            .unwrap_or_else(|| "gemini".to_string())
            .parse()?;

        let (api_key, model) = match provider {
            AiProvider::Gemini => (
                required("GEMINI_API_KEY")?,
                lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            ),
            AiProvider::OpenRouter => (
                required("OPENROUTER_API_KEY")?,
                lookup("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
            ),
        };

        let timeout_secs = parse_or(&lookup, "AI_TIMEOUT_SECS", DEFAULT_AI_TIMEOUT_SECS)?;
        let ttl_hours = parse_or(&lookup, "SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;

        let timezone = match lookup("APP_TIMEZONE") {
            Some(tz) => tz
                .parse::<Tz>()
                .map_err(|e| anyhow!("Invalid APP_TIMEZONE '{}': {}", tz, e))?,
            None => Tz::UTC,
        };

        let admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            (Some(_), None) | (None, Some(_)) => {
                log::warn!("⚠️ ADMIN_EMAIL and ADMIN_PASSWORD must both be set to seed an admin");
                None
            }
            (None, None) => None,
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            session_secret: required("SESSION_SECRET")?,
            session_ttl: chrono::Duration::hours(ttl_hours),
            ai: AiConfig {
                provider,
                api_key,
                model,
                timeout: Duration::from_secs(timeout_secs),
            },
            uploads_dir: lookup("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            timezone,
            admin,
        })
    }

    pub fn now_local(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }

    pub fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}
