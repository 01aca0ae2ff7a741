use portfolio_api::{app, config::AppConfig, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "portfolio_api=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr()?;
    tracing::info!(environment = ?config.environment, "starting");

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    let state = AppState::postgres(config, pool.clone());
    app::serve(app::build_app(state), addr).await?;

    pool.close().await;
    tracing::info!("database pool closed");
    Ok(())
}
