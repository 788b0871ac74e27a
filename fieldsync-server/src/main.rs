use auth_identity::IdentityConfig;
use clap::Parser;
use email_service::{MailTransport, SmtpConfig, SmtpMailTransport};
use fieldsync_server::{create_app, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// FieldSync Engine HTTP server
#[derive(Parser, Debug)]
#[command(name = "fieldsync-server")]
#[command(about = "Offline-first field-ops sync and auth HTTP API server")]
struct Args {
    /// Server bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Configuration file path (reserved for future use; configuration is
    /// currently sourced from the environment)
    #[arg(short, long, default_value = "fieldsync-server.yaml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose);

    info!("starting fieldsync-server");
    info!(version = env!("CARGO_PKG_VERSION"), config = %args.config, "build info");

    let identity_config = IdentityConfig::from_env();
    let mail: Arc<dyn MailTransport> = Arc::new(SmtpMailTransport::new(SmtpConfig::from_env()));
    let state = AppState::new(identity_config, mail);
    let app = create_app(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(args.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("fieldsync-server listening on http://{}:{}", args.host, port);
    info!("health check: http://{}:{}/health", args.host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("fieldsync_server={},tower_http=info", level).into()),
        )
        .with(if verbose {
            tracing_subscriber::fmt::layer().with_target(true).boxed()
        } else {
            tracing_subscriber::fmt::layer().with_target(false).json().boxed()
        })
        .init();
}
