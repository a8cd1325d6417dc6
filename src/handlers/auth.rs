use anyhow::Context;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{forms::MultipartForm, MessageResponse};
use crate::error::ApiError;
use crate::models::{BodyType, Goal, NewUser, SessionUser};
use crate::server::AppState;
use crate::services::{auth, goals::daily_goals};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

/// Registration fields after validation, before anything is written.
#[derive(Debug)]
struct Registration {
    name: String,
    email: String,
    password: String,
    height: f64,
    weight: f64,
    body_type: BodyType,
    goal: Goal,
}

impl Registration {
    fn from_form(form: &MultipartForm) -> Result<Self, ApiError> {
        let email = form.required("email")?.to_lowercase();
        if !email.contains('@') {
            return Err(ApiError::bad_request("Invalid email"));
        }

        let body_type = BodyType::from_string(form.required("bodyType")?)
            .ok_or_else(|| ApiError::bad_request("bodyType must be Lean, Bulk or Normal"))?;
        let goal = Goal::from_string(form.required("goal")?)
            .ok_or_else(|| ApiError::bad_request("goal must be Weight Gain or Weight Loss"))?;

        Ok(Registration {
            name: form.required("name")?.to_string(),
            email,
            password: form.required("password")?.to_string(),
            height: form.number("height")?,
            weight: form.number("weight")?,
            body_type,
            goal,
        })
    }
}

/// POST /api/register (multipart, optional `profilePhoto`)
pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let registration = Registration::from_form(&form)?;

    if state
        .db
        .email_exists(&registration.email)
        .await
        .context("Registration failed")?
    {
        return Err(ApiError::bad_request("User already exists"));
    }

    let photo = form.take_file("profilePhoto");
    if let Some(photo) = &photo {
        state.uploads.validate(photo)?;
    }

    let goals = daily_goals(registration.goal, registration.body_type, registration.weight);
    let password_hash = auth::hash_password_async(registration.password)
        .await
        .context("Registration failed")?;

    let profile_photo = match &photo {
        Some(photo) => Some(state.uploads.save(photo).await.context("Registration failed")?),
        None => None,
    };

    let new_user = NewUser {
        name: registration.name,
        email: registration.email,
        password_hash,
        height: registration.height,
        weight: registration.weight,
        body_type: registration.body_type,
        goal: registration.goal,
        profile_photo,
        is_approved: false,
        is_admin: false,
        daily_calorie_goal: goals.calories,
        daily_protein_goal: goals.protein_grams,
    };

    let created = state.db.create_user(&new_user).await;
    let id = match created {
        Ok(Some(id)) => id,
        result => {
            // Lost a race with another registration for the same email, or the insert failed.
            if let Some(name) = &new_user.profile_photo {
                state.uploads.remove(name).await;
            }
            match result {
                Ok(_) => return Err(ApiError::bad_request("User already exists")),
                Err(e) => return Err(e.context("Registration failed").into()),
            }
        }
    };

    log::info!(
        "👤 Registered user {} ({}), goals: {} kcal / {} g protein",
        id,
        new_user.email,
        goals.calories,
        goals.protein_grams
    );

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "User registered successfully. Awaiting admin approval.",
        )),
    ))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let invalid = || ApiError::bad_request("Invalid credentials");

    let user = state
        .db
        .get_user_by_email(request.email.trim())
        .await
        .context("Login failed")?
        .ok_or_else(invalid)?;

    if !auth::verify_password_async(request.password, user.password_hash.clone()).await {
        log::warn!("🔑 Failed login for user {}", user.id);
        return Err(invalid());
    }

    if !user.can_log_in() {
        return Err(ApiError::Forbidden("Awaiting admin approval".to_string()));
    }

    let token = auth::generate_token();
    let digest = auth::token_digest(&state.config.session_secret, &token).context("Login failed")?;
    let expires_at = Utc::now() + state.config.session_ttl;

    state
        .db
        .create_session(user.id, &digest, expires_at)
        .await
        .context("Login failed")?;

    match state.db.purge_expired_sessions().await {
        Ok(0) => {}
        Ok(purged) => log::debug!("🧹 Purged {} expired sessions", purged),
        Err(e) => log::warn!("⚠️ Failed to purge expired sessions: {}", e),
    }

    log::info!("🔓 User {} logged in", user.id);

    Ok(Json(LoginResponse {
        token,
        user: SessionUser::from(&user),
    }))
}
