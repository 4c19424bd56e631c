use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod validation;
pub mod visibility;

// Routing split by access level (public, authenticated, admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use auth::TokenService;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{MemoryRepository, PostgresRepository, Repository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every endpoint, served at `/api-docs/openapi.json` and
/// browsable through Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup, handlers::auth::login, handlers::auth::logout,
        handlers::users::list_users, handlers::users::get_me,
        handlers::workshops::get_workshops, handlers::workshops::get_my_workshops,
        handlers::workshops::get_workshop_details, handlers::workshops::create_workshop,
        handlers::workshops::update_workshop, handlers::workshops::delete_workshop,
        handlers::registrations::register, handlers::registrations::get_registrations,
        handlers::registrations::unregister,
        handlers::attendance::mark_attendance, handlers::attendance::get_workshop_attendance,
        handlers::feedback::submit_feedback, handlers::feedback::get_feedback,
        handlers::materials::add_material, handlers::materials::get_materials,
        handlers::certificates::issue_certificate, handlers::certificates::get_certificates,
        handlers::certificates::download_certificate
    ),
    components(
        schemas(
            models::Role, models::RegistrationStatus, models::User, models::Workshop,
            models::WorkshopDetails, models::Registration, models::Attendance,
            models::Feedback, models::FeedbackEntry, models::Material, models::Certificate,
            models::SignupRequest, models::LoginRequest, models::LoginResponse,
            models::CreateWorkshopRequest, models::UpdateWorkshopRequest,
            models::RegisterRequest, models::MarkAttendanceRequest,
            models::SubmitFeedbackRequest, models::AddMaterialRequest,
            models::IssueCertificateRequest, error::ErrorResponse,
        )
    ),
    tags(
        (name = "workshop-hub", description = "Workshop management API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single shared state of the application, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (Postgres in production, in-memory for tests and local runs).
    pub repo: RepositoryState,
    /// Issues and verifies session tokens.
    pub tokens: TokenService,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            repo,
            tokens: TokenService::from_config(&config),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// Lets extractors such as `AuthUser` pull single components out of `AppState`.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the routers it is layered on. Resolving `AuthUser`
/// verifies the token and loads the user; a failure rejects the request with 401
/// before any handler runs. The resolved user is cached in the request extensions
/// and reused by the handler's own `AuthUser` argument.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing table, applies the authentication layer to protected
/// routers and wraps everything in the request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Admin paths overlap with public ones (GET vs POST /workshops), so they are
        // merged per method instead of nested under a prefix.
        .merge(
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span carrying method, URI and the `x-request-id`, so every
/// log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
