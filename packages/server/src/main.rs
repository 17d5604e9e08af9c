use std::net::SocketAddr;

use tracing::info;

use server::config::AppConfig;
use server::state::AppState;
use server::ws::registry::ConnectionRegistry;
use server::{database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database).await?;
    seed::ensure_indexes(&db).await?;

    let state = AppState {
        db,
        config: config.clone(),
        chat: ConnectionRegistry::new(),
        signaling: ConnectionRegistry::new(),
    };

    let app = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
