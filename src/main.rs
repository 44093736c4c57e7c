use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wordset_api::app::{build_router, AppState};
use wordset_api::config::AppConfig;
use wordset_api::database::{MemoryStore, PgStore, Store};
use wordset_api::external::{GoogleIdentityVerifier, HttpMailer, ImgurHost, LogMailer, Mailer};
use wordset_api::services::Collaborators;

#[derive(Parser)]
#[command(name = "wordset-api")]
#[command(about = "Word set flashcard backend")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Port to listen on, overriding PORT")]
    port: Option<u16>,

    #[arg(long, help = "Skip creating missing tables on start")]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wordset_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate().context("invalid configuration")?;
    info!("Starting wordset-api in {:?} mode", config.environment);

    let store: Arc<dyn Store> = match &config.database.url {
        Some(url) => {
            let pg = PgStore::connect(url, config.database.max_connections)
                .await
                .context("failed to connect to postgres")?;
            if !cli.no_migrate {
                pg.migrate().await.context("failed to create tables")?;
            }
            Arc::new(pg)
        }
        None => {
            warn!("DATABASE_URL not set, documents are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.mail.api_url {
        Some(url) => Arc::new(HttpMailer::new(url, &config.mail.username, &config.mail.password)),
        None => {
            warn!("MAIL_API_URL not set, outgoing mail is only logged");
            Arc::new(LogMailer)
        }
    };
    let collaborators = Collaborators {
        mailer,
        identity: Arc::new(GoogleIdentityVerifier::new(
            &config.identity.token_info_url,
            &config.identity.google_client_id,
        )),
        images: Arc::new(ImgurHost::new(&config.image_host.upload_url, &config.image_host.access_token)),
    };

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let app = build_router(AppState::new(config, store, collaborators));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("wordset-api listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;
    Ok(())
}
