pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::assets::AssetService;
use crate::services::pipeline::VideoPipeline;
use crate::services::storage::StorageService;
use crate::services::video_repository::VideoRepository;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Headroom for multipart boundaries and part headers
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Request body cap for a route whose file part may be `max_file_size` bytes
pub fn body_limit(max_file_size: usize) -> usize {
    max_file_size.saturating_add(MULTIPART_OVERHEAD)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::videos::upload_video,
        api::handlers::videos::upload_thumbnail,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::VideoRecord,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "videos", description = "Video and thumbnail uploads"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageService>,
    pub videos: Arc<dyn VideoRepository>,
    pub pipeline: Arc<VideoPipeline>,
    pub assets: Arc<AssetService>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api/video_upload/:video_id",
            post(api::handlers::videos::upload_video)
                .layer(DefaultBodyLimit::max(body_limit(
                    state.config.max_upload_size,
                )))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/api/thumbnail_upload/:video_id",
            post(api::handlers::videos::upload_thumbnail)
                .layer(DefaultBodyLimit::max(body_limit(
                    state.config.max_thumbnail_size,
                )))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
