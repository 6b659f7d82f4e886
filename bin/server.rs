// Finance Tracker - Web Server
// REST API with Axum over a SQLite store

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use finance_tracker::{open_database, router, setup_database, AppState};

/// Store file location, overridable via FINANCE_DATABASE_PATH.
fn database_path() -> PathBuf {
    std::env::var("FINANCE_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("finance.db"))
}

fn bind_addr() -> String {
    std::env::var("FINANCE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("finance_tracker=info".parse()?),
        )
        .init();

    let db_path = database_path();

    // The schema must exist before the first request; request handlers
    // never create it.
    {
        let conn = open_database(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;
        setup_database(&conn).context("failed to set up database schema")?;
    }
    tracing::info!("database ready at {}", db_path.display());

    let state = AppState::new(db_path);
    let app = router(state);

    let addr: SocketAddr = bind_addr().parse().context("invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    tracing::info!("server listening on http://{}", addr);

    axum::serve(listener, app).await.context("server failed")?;

    Ok(())
}
