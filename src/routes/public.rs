use crate::{
    AppState,
    handlers::{auth, workshops},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session: health, the identity flow and the
/// read-only workshop catalog. Nothing here touches the `AuthUser` extractor.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers; answers "ok" without touching the store.
        .route("/health", get(|| async { "ok" }))
        // --- Identity ---
        // POST /auth/signup
        // Creates an account (role defaults to participant). Does not log in.
        .route("/auth/signup", post(auth::signup))
        // POST /auth/login
        // Issues a session token, returned in the body and as the `token` cookie.
        .route("/auth/login", post(auth::login))
        // POST /auth/logout
        // Clears the session cookie.
        .route("/auth/logout", post(auth::logout))
        // --- Workshop Catalog (read) ---
        // GET /workshops
        .route("/workshops", get(workshops::get_workshops))
        // GET /workshops/{id}
        // Includes the active registration count used for remaining seats.
        .route("/workshops/{id}", get(workshops::get_workshop_details))
}
