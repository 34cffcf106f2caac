mod app;
mod auth;
mod config;
mod error;
mod notify;
mod profiles;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "jobboard=debug,axum=info,tower_http=info".to_string());
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

    let app_state = state::AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    // Denylist rows only matter until the token itself expires.
    match auth::repo::RevokedToken::purge_expired(&app_state.db).await {
        Ok(n) if n > 0 => tracing::info!(purged = n, "dropped expired revoked tokens"),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "revoked-token purge failed"),
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}
