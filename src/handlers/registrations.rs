use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use uuid::Uuid;

use super::WorkshopFilter;
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiJson, ApiPath, ApiQuery, AppError, AppResult, ErrorResponse},
    guard::Action,
    models::{RegisterRequest, Registration},
    visibility::RegistrationScope,
};

/// register
///
/// [Participant Route] Signs the caller up for a workshop. Capacity and the
/// one-active-registration rule are checked atomically by the repository.
#[utoipa::path(
    post,
    path = "/registrations",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = Registration),
        (status = 400, description = "Missing workshop id", body = ErrorResponse),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Workshop not found", body = ErrorResponse),
        (status = 409, description = "Already registered or workshop full", body = ErrorResponse)
    )
)]
pub async fn register(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Registration>)> {
    user.authorize(Action::Register)?;
    let workshop_id = payload
        .workshop_id
        .ok_or_else(|| AppError::Validation("Workshop is required".to_string()))?;

    let registration = state
        .repo
        .register(workshop_id, user.id)
        .await
        .inspect_err(|e| {
            tracing::info!(%workshop_id, user_id = %user.id, reason = %e, "registration refused")
        })?;

    tracing::info!(
        registration_id = %registration.id,
        %workshop_id,
        user_id = %user.id,
        "participant registered"
    );
    Ok((StatusCode::CREATED, Json(registration)))
}

/// get_registrations
///
/// [Authenticated Route] Participants see their own registrations, instructors and
/// admins see all of them. `?workshop=` narrows the list to one workshop.
#[utoipa::path(
    get,
    path = "/registrations",
    params(WorkshopFilter),
    responses((status = 200, description = "Registrations", body = [Registration]))
)]
pub async fn get_registrations(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<WorkshopFilter>,
) -> AppResult<Json<Vec<Registration>>> {
    user.authorize(Action::ListRegistrations)?;
    let scope = RegistrationScope::for_user(&user);
    Ok(Json(
        state
            .repo
            .list_registrations(scope, filter.workshop)
            .await?,
    ))
}

/// unregister
///
/// [Participant Route] Cancels one of the caller's own registrations. The record is
/// kept with status `cancelled` and the seat is released. Cancelling twice returns
/// the already-cancelled record.
#[utoipa::path(
    put,
    path = "/registrations/{id}/unregister",
    params(("id" = Uuid, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Cancelled", body = Registration),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse)
    )
)]
pub async fn unregister(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Registration>> {
    user.authorize(Action::CancelRegistration)?;

    let registration = state
        .repo
        .get_registration(id)
        .await?
        .ok_or(AppError::NotFound("Registration"))?;
    if !RegistrationScope::owner(&user).admits(&registration) {
        tracing::warn!(registration_id = %id, user_id = %user.id, "cancel of foreign registration");
        return Err(AppError::Forbidden);
    }
    if !registration.is_active() {
        return Ok(Json(registration));
    }

    let cancelled = state
        .repo
        .cancel_registration(id)
        .await?
        .ok_or(AppError::NotFound("Registration"))?;

    tracing::info!(registration_id = %id, user_id = %user.id, "registration cancelled");
    Ok(Json(cancelled))
}
