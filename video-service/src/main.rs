use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use video_service::{
    build_router,
    config::{MediaBackend, VideoConfig},
    services::{metrics::init_metrics, CloudinaryStore, LocalMediaStore, MediaStore, MongoDb},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = VideoConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );
    init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting video service"
    );

    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
    db.initialize_indexes().await?;
    let db = Arc::new(db);
    tracing::info!("Database initialized successfully");

    let media: Arc<dyn MediaStore> = match config.media.backend {
        MediaBackend::Local => Arc::new(
            LocalMediaStore::new(&config.media.local_path, &config.media.public_base_url).await?,
        ),
        MediaBackend::Cloudinary => {
            let cloudinary = config.media.cloudinary.clone().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "MEDIA_BACKEND=cloudinary requires CLOUDINARY_* settings"
                ))
            })?;
            Arc::new(CloudinaryStore::new(cloudinary)?)
        }
    };
    tracing::info!(backend = ?config.media.backend, "Media store initialized");

    let state = AppState::new(config.clone(), db.clone(), db, media);
    let app = build_router(state);

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    let listener =
        tokio::net::TcpListener::bind((config.common.host.as_str(), config.common.port)).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
