//! StyleSync - Virtual Try-On Compositor Service
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stylesync::{
    assets::FileAssetLoader,
    config::Config,
    error::WebError,
    render::HeadlessBackend,
    scene::{Catalog, SceneCompositor},
    service,
    web::{self, ApiState},
};

/// StyleSync - Headless virtual try-on compositor
#[derive(Parser, Debug)]
#[command(name = "stylesync", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Assets directory (overrides config)
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// List indexed assets and exit
    #[arg(long)]
    list_assets: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable HTTP server
    #[arg(long)]
    no_http: bool,

    /// HTTP server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", stylesync::NAME, stylesync::VERSION);

    // Load configuration
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    if let Some(ref dir) = args.assets {
        config.assets.dir = dir.clone();
    }
    if args.no_http {
        config.http.enabled = false;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }

    config.validate()?;

    // Index assets and check the catalog against them
    let loader = FileAssetLoader::new(&config.assets);
    let catalog = Catalog::from_config(&config.catalog);

    let missing = catalog.missing_assets(loader.known_identifiers());
    for identifier in &missing {
        tracing::warn!("Catalog entry '{}' has no backing asset", identifier);
    }

    if args.list_assets {
        list_assets(&loader);
        return Ok(());
    }

    info!("Assets directory: {}", config.assets.dir.display());
    info!("HTTP server: {}", config.http.enabled);

    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

        // Start the compositor service: the single owner of scene state
        let backend = HeadlessBackend::new();
        let compositor = SceneCompositor::new(
            Box::new(backend),
            catalog.clone(),
            config.gestures.clone(),
            config.sliders.clone(),
        );
        let handle = service::spawn(
            compositor,
            Arc::new(loader),
            shutdown_tx.subscribe(),
        );

        // Start the HTTP control surface
        if config.http.enabled {
            let state = ApiState::new(handle.clone(), catalog.clone());
            let http_config = config.http.clone();
            let shutdown_rx = shutdown_tx.subscribe();
            tokio::spawn(async move {
                if let Err(e) = run_http_server(state, http_config, shutdown_rx).await {
                    error!("HTTP server error: {}", e);
                }
            });
        }

        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(());

        // Give tasks a moment to clean up
        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
    });

    info!("StyleSync stopped");
    Ok(())
}

fn list_assets(loader: &FileAssetLoader) {
    println!("Indexed assets:\n");
    let mut identifiers: Vec<&str> = loader.known_identifiers().collect();
    identifiers.sort();
    for identifier in identifiers {
        println!("    {}", identifier);
    }
}

async fn run_http_server(
    state: ApiState,
    config: stylesync::config::HttpConfig,
    mut shutdown_rx: tokio::sync::broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = web::create_router(state, &config);

    let addr = format!("{}:{}", config.host, config.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WebError::Bind(format!("{}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
