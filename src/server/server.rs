use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tower_http::services::ServeDir;
use tracing::{info, warn};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::client_identity::ClientIdentity;
use super::{log_requests, state::*, ServerConfig};
use crate::persona::PersonaStore;
use crate::recommendation::{
    FailureKind, RecommendationFailure, RecommendationRequest, RecommendationResult,
    RecommendationService,
};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub llm_provider: String,
    pub llm_model: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let llm = state.recommendation_service.llm();
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        llm_provider: llm.name().to_string(),
        llm_model: llm.model().to_string(),
    };
    Json(stats)
}

async fn get_personas(State(personas): State<GuardedPersonaStore>) -> Response {
    Json(personas.all()).into_response()
}

async fn get_persona(
    State(personas): State<GuardedPersonaStore>,
    Path(id): Path<String>,
) -> Response {
    match personas.get(&id) {
        Some(persona) => Json(persona).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// HTTP status used for each kind of failed recommendation.
pub fn status_for_failure(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        FailureKind::InvalidRequest => StatusCode::BAD_REQUEST,
        FailureKind::ModelCallFailed
        | FailureKind::ExtractionFailed
        | FailureKind::MalformedJson
        | FailureKind::SchemaMismatch => StatusCode::BAD_GATEWAY,
        FailureKind::AllContentFiltered => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn post_recommendations(
    client: ClientIdentity,
    State(service): State<GuardedRecommendationService>,
    body: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected recommendation body: {}", rejection.body_text());
            let failure = RecommendationResult::Failure(RecommendationFailure {
                error: format!("Invalid request body: {}", rejection.body_text()),
                persona: None,
                kind: FailureKind::InvalidRequest,
            });
            return (StatusCode::BAD_REQUEST, Json(failure)).into_response();
        }
    };

    let result = service
        .request_recommendations(client.as_str(), request)
        .await;

    let status = match result.failure_kind() {
        None => StatusCode::OK,
        Some(kind) => status_for_failure(kind),
    };
    (status, Json(result)).into_response()
}

pub fn make_app(
    config: ServerConfig,
    recommendation_service: Arc<RecommendationService>,
    personas: Arc<PersonaStore>,
) -> Result<Router> {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        recommendation_service,
        personas,
        hash: env!("GIT_HASH").to_owned(),
    };

    let persona_routes = Router::new()
        .route("/", get(get_personas))
        .route("/{id}", get(get_persona));

    let api_routes: Router = Router::new()
        .route("/status", get(home))
        .route("/recommendations", post(post_recommendations))
        .nest("/personas", persona_routes)
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(home)).with_state(state.clone()),
    };

    let mut app: Router = home_router.nest("/v1", api_routes);
    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections...");
}

pub async fn run_server(
    config: ServerConfig,
    recommendation_service: Arc<RecommendationService>,
    personas: Arc<PersonaStore>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, recommendation_service, personas)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
