use crate::{
    AppState,
    handlers::{attendance, certificates, feedback, materials, registrations, users, workshops},
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes that need a valid session. The authentication layer above this router
/// rejects anonymous requests with 401; each handler then checks the caller's role
/// against the guard table and applies record-level visibility.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /users/me
        .route("/users/me", get(users::get_me))
        // GET /workshops/my
        // Instructors get the workshops they teach, admins get all of them.
        .route("/workshops/my", get(workshops::get_my_workshops))
        // --- Registration Ledger ---
        // POST /registrations (participants)
        // GET /registrations?workshop= (own for participants, all for staff)
        .route(
            "/registrations",
            post(registrations::register).get(registrations::get_registrations),
        )
        // PUT /registrations/{id}/unregister
        // Owner-only; the record is kept with status `cancelled`.
        .route(
            "/registrations/{id}/unregister",
            put(registrations::unregister),
        )
        // --- Attendance Tracker (workshop instructor or admin) ---
        .route("/attendance/mark", post(attendance::mark_attendance))
        .route(
            "/attendance/workshop/{id}",
            get(attendance::get_workshop_attendance),
        )
        // --- Feedback Log ---
        // POST by participants, GET scoped to the workshops the caller manages.
        .route(
            "/feedback",
            post(feedback::submit_feedback).get(feedback::get_feedback),
        )
        // --- Material Shelf ---
        .route(
            "/materials",
            post(materials::add_material).get(materials::get_materials),
        )
        // --- Certificate Registry ---
        .route("/certificates", get(certificates::get_certificates))
        // GET /certificates/download/{id}
        // 307 to the stored URL for the owner or an admin.
        .route(
            "/certificates/download/{id}",
            get(certificates::download_certificate),
        )
}
