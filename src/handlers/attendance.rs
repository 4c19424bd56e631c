use axum::{Json, extract::State};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiJson, ApiPath, AppError, AppResult, ErrorResponse},
    guard::Action,
    models::{Attendance, MarkAttendanceRequest, Workshop},
    visibility::WorkshopScope,
};

/// Loads the workshop and checks that the caller manages it.
async fn managed_workshop(
    state: &AppState,
    user: &AuthUser,
    workshop_id: Uuid,
) -> AppResult<Workshop> {
    let workshop = state
        .repo
        .get_workshop(workshop_id)
        .await?
        .ok_or(AppError::NotFound("Workshop"))?;

    if !WorkshopScope::for_user(user).admits(&workshop) {
        tracing::warn!(%workshop_id, user_id = %user.id, "attendance access to unmanaged workshop");
        return Err(AppError::Forbidden);
    }
    Ok(workshop)
}

/// mark_attendance
///
/// [Staff Route] Sets the attended flag of a registration. Allowed for admins and for
/// the instructor of the registration's workshop. A second mark overwrites the first.
#[utoipa::path(
    post,
    path = "/attendance/mark",
    request_body = MarkAttendanceRequest,
    responses(
        (status = 200, description = "Attendance recorded", body = Attendance),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 403, description = "Not the workshop's instructor", body = ErrorResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse)
    )
)]
pub async fn mark_attendance(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<MarkAttendanceRequest>,
) -> AppResult<Json<Attendance>> {
    user.authorize(Action::MarkAttendance)?;
    let (Some(registration_id), Some(attended)) = (payload.registration_id, payload.attended)
    else {
        return Err(AppError::Validation(
            "Registration and attended are both required".to_string(),
        ));
    };

    let registration = state
        .repo
        .get_registration(registration_id)
        .await?
        .ok_or(AppError::NotFound("Registration"))?;
    managed_workshop(&state, &user, registration.workshop_id).await?;

    let attendance = state
        .repo
        .upsert_attendance(registration_id, attended)
        .await?;

    tracing::info!(%registration_id, attended, marked_by = %user.id, "attendance marked");
    Ok(Json(attendance))
}

/// get_workshop_attendance
///
/// [Staff Route] All attendance records of one workshop, under the same ownership
/// rule as marking.
#[utoipa::path(
    get,
    path = "/attendance/workshop/{id}",
    params(("id" = Uuid, Path, description = "Workshop ID")),
    responses(
        (status = 200, description = "Attendance records", body = [Attendance]),
        (status = 403, description = "Not the workshop's instructor", body = ErrorResponse),
        (status = 404, description = "Workshop not found", body = ErrorResponse)
    )
)]
pub async fn get_workshop_attendance(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(workshop_id): ApiPath<Uuid>,
) -> AppResult<Json<Vec<Attendance>>> {
    user.authorize(Action::ListAttendance)?;
    managed_workshop(&state, &user, workshop_id).await?;
    Ok(Json(state.repo.list_attendance(workshop_id).await?))
}
