use forestnav::config::{Config, EnvOverrides};
use forestnav::db::manager::redact_url;
use forestnav::{AppContext, setup};
use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let ctx = Arc::new(AppContext::bootstrap(&cfg, &EnvOverrides::from_env()).await?);
    info!(
        listen_addr = %cfg.listen_addr,
        data_dir = %cfg.data_dir.display(),
        database_url = %redact_url(&ctx.runtime().database_url),
        loglevel = %cfg.loglevel,
        setup_completed = ctx.is_setup_completed()
    );

    match std::env::args().nth(1).as_deref() {
        Some("init-db") => {
            let storage = ctx.storage()?;
            let report = setup::init_db(&storage).await?;
            info!(
                backend = ?storage.backend(),
                admin_created = report.admin_created,
                categories_created = report.categories_created,
                "init-db finished"
            );
            storage.close().await;
            return Ok(());
        }
        Some(other) => {
            warn!(command = other, "unknown command, expected `init-db`");
            return Err(format!("unknown command: {other}").into());
        }
        None => {}
    }

    // Build axum router and serve
    let state = forestnav::router::NavState::new(ctx.clone(), cfg.insecure_cookie)?;
    let app = forestnav::router::nav_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ctx.storage_manager().dispose().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
