pub mod api;
pub mod config;
pub mod services;
pub mod utils;

use crate::config::ServerConfig;
use crate::services::staging::StagingArea;
use crate::services::upscaler::Upscaler;
use axum::{
    Router,
    http::{Request, Response},
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::upscale::upscale_image,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::upscale::UpscaleForm,
            api::envelope::UpscaleEnvelope,
            api::envelope::ErrorEnvelope,
            services::iloveimg::UpscaleResult,
        )
    ),
    tags(
        (name = "upscale", description = "Image upscaling endpoints"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub upscaler: Arc<dyn Upscaler>,
    pub staging: StagingArea,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(upscaler: Arc<dyn Upscaler>, config: ServerConfig) -> Self {
        Self {
            upscaler,
            staging: StagingArea::new(config.temp_dir.clone(), config.max_file_size),
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/upscale",
            post(api::handlers::upscale::upscale_image).layer(
                axum::extract::DefaultBodyLimit::max(
                    state.config.max_file_size + 1024 * 1024, // 1MB buffer for multipart overhead
                ),
            ),
        )
        // The request id layer wraps tracing so every span sees the final id
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let request_id = request
                        .headers()
                        .get(&api::middleware::request_id::REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &Request<_>, _span: &tracing::Span| {
                    info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &Response<_>, latency: Duration, _span: &tracing::Span| {
                        info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
