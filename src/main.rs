use std::net::SocketAddr;

use anyhow::Context;
use axum::middleware;
use tower_http::trace::TraceLayer;

use longtermhire::{
    config::AppConfig,
    db::connection,
    logging::init_tracing,
    middleware::{catch_panic_layer, json_error_middleware},
    routes::router_with_report,
    schema::registry,
    services::ServiceContext,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_tracing(&cfg.logging)?;
    registry::validate()?;

    let db_cfg = cfg
        .database
        .clone()
        .context("database config is required (set APP_DATABASE__URL)")?;
    let auth_cfg = cfg
        .auth
        .clone()
        .context("auth config is required (set APP_AUTH__JWT_SECRET)")?;

    let db = connection::connect(&db_cfg).await?;
    let state = AppState::new(cfg, db)?;
    ServiceContext::from_state(&state)
        .auth(&state)
        .seed_admin(&auth_cfg)
        .await?;

    let (app, report) = router_with_report(state.clone());
    if !report.is_clean() {
        tracing::warn!(
            failed = ?report.failed.iter().map(|failure| failure.path).collect::<Vec<_>>(),
            "serving without some modules"
        );
    }
    let app = app
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", state.config.general.host, state.config.general.port)
        .parse()
        .context("invalid host/port")?;
    tracing::info!("listening on http://{}{}", addr, state.config.api_prefix());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
