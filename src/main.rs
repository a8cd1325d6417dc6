mod config;
mod error;
mod handlers;
mod models;
mod server;
mod services;

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;

use config::{AdminSeed, Config};
use models::{BodyType, Goal, NewUser};
use server::{create_router, AppState};
use services::{auth, create_provider, goals::daily_goals, Database, NutritionAnalyzer, UploadStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("🚀 Starting Protein Tracker API...");

    let config = Config::from_env().context("Invalid configuration")?;

    // Initialize PostgreSQL database
    let db = Arc::new(Database::new(&config.database_url).await?);
    log::info!("✅ PostgreSQL database initialized");

    if let Some(admin) = &config.admin {
        seed_admin(&db, admin).await?;
    }

    let model = create_provider(&config)?;
    log::info!(
        "✅ AI provider initialized: {} ({})",
        model.provider_name(),
        model.model_name()
    );

    let uploads = Arc::new(UploadStore::new(&config.uploads_dir, config.max_upload_bytes)?);
    log::info!("✅ Uploads stored in {}", uploads.dir().display());

    let addr = format!("0.0.0.0:{}", config.port);
    let state = AppState {
        db,
        analyzer: Arc::new(NutritionAnalyzer::new(model.clone())),
        model,
        uploads,
        config: Arc::new(config),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("🌐 Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("🛑 Shut down");
    Ok(())
}

/// Create the configured admin account if the email is not taken yet.
async fn seed_admin(db: &Database, admin: &AdminSeed) -> Result<()> {
    let email = admin.email.trim().to_lowercase();
    if db.email_exists(&email).await? {
        log::info!("🛡️ Admin account {} already exists", email);
        return Ok(());
    }

    let weight = 70.0;
    let goals = daily_goals(Goal::WeightLoss, BodyType::Normal, weight);
    let admin_user = NewUser {
        name: "Admin".to_string(),
        email,
        password_hash: auth::hash_password_async(admin.password.clone()).await?,
        height: 170.0,
        weight,
        body_type: BodyType::Normal,
        goal: Goal::WeightLoss,
        profile_photo: None,
        is_approved: true,
        is_admin: true,
        daily_calorie_goal: goals.calories,
        daily_protein_goal: goals.protein_grams,
    };

    if let Some(id) = db.create_user(&admin_user).await? {
        log::info!("🛡️ Seeded admin account {} (id {})", admin_user.email, id);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("❌ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("🛑 Shutting down...");
}
