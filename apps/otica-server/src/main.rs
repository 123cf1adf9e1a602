use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};

use otica_api::{build_router, AppState};
use otica_infrastructure::{create_pool, mysql_repositories, run_migrations};
use otica_shared::config::AppConfig;
use otica_shared::telemetry::init_telemetry;
use otica_shared::utils::mask_email;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("loading configuration")?;

    // Initialize telemetry; the guard flushes the file writer on exit
    let _log_guard = init_telemetry(&config.log).context("initializing telemetry")?;

    info!("{} starting ({})", config.app.name, config.app.env);

    // Connect to Database
    let pool = create_pool(&config.database)
        .await
        .context("connecting to database")?;
    info!("Database connection established.");

    if config.database.run_migrations {
        run_migrations(&pool).await.context("running migrations")?;
        info!("Migrations applied.");
    }

    // Wire repositories into services
    let state = AppState::new(mysql_repositories(pool), &config.jwt, &config.auth);
    bootstrap_admin(&state, &config).await?;

    let app = build_router(state, &config.http);

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse().context("parsing app.host")?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

/// Creates the first administrator when `bootstrap.*` is configured and no user exists yet.
async fn bootstrap_admin(state: &AppState, config: &AppConfig) -> anyhow::Result<()> {
    let bootstrap = &config.bootstrap;
    let (Some(name), Some(email), Some(password)) = (
        bootstrap.admin_name.as_deref(),
        bootstrap.admin_email.as_deref(),
        bootstrap.admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    match state
        .users
        .ensure_bootstrap_admin(name, email, password, &config.auth.admin_role)
        .await
        .context("bootstrapping admin user")?
    {
        Some(admin) => info!("Bootstrap admin {} created", mask_email(&admin.email)),
        None => info!("Users already exist, skipping admin bootstrap"),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
