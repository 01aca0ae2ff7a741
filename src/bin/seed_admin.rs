//! Creates the bootstrap administrator from ADMIN_USERNAME / ADMIN_PASSWORD.
use anyhow::Context;
use portfolio_api::{
    auth::{
        repo::PgUserRepo,
        services::{seed_admin, SeedOutcome},
    },
    config::AdminSeed,
    db,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "portfolio_api=info,seed_admin=info".to_string());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let seed = AdminSeed::from_env()?;
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = db::connect(&database_url).await?;
    db::migrate(&pool).await?;

    let users = PgUserRepo::new(pool.clone());
    let outcome = seed_admin(&users, &seed).await;
    pool.close().await;

    match outcome? {
        SeedOutcome::Created(user) => {
            tracing::info!(user_id = %user.id, username = %user.username, "admin account created; log in via /api/auth/login");
        }
        SeedOutcome::AlreadyExists => {
            tracing::info!(username = %seed.username, "admin account already exists");
        }
    }
    Ok(())
}
