use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fertipath_backend::{
    ai::{CohereClient, TextGenerator},
    app,
    notify::LogOtpSender,
    store::{MemoryStore, PgStore, Store},
    AppState, Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fertipath_backend=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Environment: {}", config.environment);

    let store: Arc<dyn Store> = match &config.database.url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("🗄️ Connected to Postgres, migrations applied");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("No database.url configured, records are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let generator = CohereClient::from_config(&config.ai).map(|c| Arc::new(c) as Arc<dyn TextGenerator>);
    if generator.is_none() {
        tracing::info!("Generative text disabled (no ai.api_key)");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState {
        store,
        config: Arc::new(config),
        otp_sender: Arc::new(LogOtpSender),
        generator,
    };

    tracing::info!("🧠 Server running at {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app(state).into_make_service(),
    )
    .await?;

    Ok(())
}
