use crate::{
    AppState,
    handlers::{certificates, users, workshops},
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Mutations of the workshop catalog, certificate issuing and the user directory.
/// These paths share their prefixes with public and authenticated routes, so the
/// router is merged rather than nested. It sits behind the same authentication
/// layer, and every handler requires the `admin` role.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /workshops
        .route("/workshops", post(workshops::create_workshop))
        // PUT/DELETE /workshops/{id}
        // Deleting cascades to registrations, attendance, feedback, materials and certificates.
        .route(
            "/workshops/{id}",
            put(workshops::update_workshop).delete(workshops::delete_workshop),
        )
        // POST /certificates
        .route("/certificates", post(certificates::issue_certificate))
        // GET /users?role=
        .route("/users", get(users::list_users))
}
