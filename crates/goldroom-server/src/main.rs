use tracing::info;

use goldroom_api::state::AppStateInner;
use goldroom_db::Database;
use goldroom_gateway::dispatcher::Dispatcher;
use goldroom_server::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "goldroom=debug,goldroom_server=debug,goldroom_api=debug,goldroom_gateway=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)?;
    let state = AppStateInner::new(db, Dispatcher::new());
    let app = goldroom_server::router(state);

    let addr = config.addr()?;
    info!("Goldroom server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
