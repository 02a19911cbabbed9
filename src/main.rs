use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use video_ingest::config::AppConfig;
use video_ingest::infrastructure::storage;
use video_ingest::services::assets::AssetService;
use video_ingest::services::pipeline::VideoPipeline;
use video_ingest::services::process::SystemProcessRunner;
use video_ingest::services::video_repository::InMemoryVideoRepository;
use video_ingest::{AppState, create_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "video_ingest=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting video ingest backend...");

    let config = Arc::new(if std::env::var("APP_ENV").as_deref() == Ok("production") {
        AppConfig::production()?
    } else {
        AppConfig::from_env()
    });
    info!(
        "🎬 Pipeline Config: Max Upload={}MB, ffprobe={}, ffmpeg={}, scratch={}",
        config.max_upload_size / 1024 / 1024,
        config.ffprobe_path,
        config.ffmpeg_path,
        config.temp_dir.display()
    );

    // Setup Infrastructure
    let storage_service = storage::setup_storage(&config).await;

    let assets = Arc::new(AssetService::new(&config));
    assets.ensure_assets_dir().await?;
    info!("🖼️  Assets directory: {}", config.assets_root.display());

    let pipeline = Arc::new(VideoPipeline::new(
        &config,
        Arc::new(SystemProcessRunner),
        storage_service.clone(),
    ));

    let state = AppState {
        config: config.clone(),
        storage: storage_service,
        videos: Arc::new(InMemoryVideoRepository::new()),
        pipeline,
        assets,
    };

    let app = create_app(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
