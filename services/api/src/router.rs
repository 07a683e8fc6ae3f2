//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application: the
//! tutoring endpoint, the OpenAPI documentation and the static frontend.

use crate::{
    handlers,
    models::{AiRequestPayload, AiResponse},
    state::AppState,
};

use axum::{Router, routing::post};
use std::sync::Arc;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::ask_tutor),
    components(schemas(AiRequestPayload, AiResponse)),
    tags(
        (name = "Parabola Tutor API", description = "Quadratic-function tutor paired with a GeoGebra construction")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let static_dir = app_state.config.static_dir.clone();

    let api_router = Router::new()
        .route("/api/ai", post(handlers::ask_tutor))
        .with_state(app_state);

    // Anything not matched above is looked up in the frontend directory.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
        .fallback_service(ServeDir::new(static_dir))
}
