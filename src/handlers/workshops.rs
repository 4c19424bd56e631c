use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiJson, ApiPath, AppError, AppResult, ErrorResponse},
    guard::Action,
    models::{
        CreateWorkshopRequest, NewWorkshop, Role, UpdateWorkshopRequest, Workshop,
        WorkshopDetails,
    },
    validation::{optional_text, required_text, validate_seats},
    visibility::WorkshopScope,
};

/// Rejects an instructor reference that does not point at an instructor account.
async fn ensure_instructor(state: &AppState, instructor_id: Uuid) -> AppResult<()> {
    match state.repo.get_user(instructor_id).await? {
        Some(user) if user.role == Role::Instructor => Ok(()),
        Some(_) => Err(AppError::Validation(
            "Assigned user is not an instructor".to_string(),
        )),
        None => Err(AppError::NotFound("Instructor")),
    }
}

/// get_workshops
///
/// [Public Route] Lists every workshop, earliest date first.
#[utoipa::path(
    get,
    path = "/workshops",
    responses((status = 200, description = "All workshops", body = [Workshop]))
)]
pub async fn get_workshops(State(state): State<AppState>) -> AppResult<Json<Vec<Workshop>>> {
    Ok(Json(state.repo.list_workshops(WorkshopScope::All).await?))
}

/// get_my_workshops
///
/// [Authenticated Route] The workshops the caller manages: an instructor's own
/// workshops, or every workshop for an admin.
#[utoipa::path(
    get,
    path = "/workshops/my",
    responses(
        (status = 200, description = "Managed workshops", body = [Workshop]),
        (status = 403, description = "Participants have no managed workshops", body = ErrorResponse)
    )
)]
pub async fn get_my_workshops(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Workshop>>> {
    user.authorize(Action::ListOwnWorkshops)?;
    let scope = WorkshopScope::for_user(&user);
    Ok(Json(state.repo.list_workshops(scope).await?))
}

/// get_workshop_details
///
/// [Public Route] One workshop plus its number of active registrations, from which
/// clients derive the remaining seats.
#[utoipa::path(
    get,
    path = "/workshops/{id}",
    params(("id" = Uuid, Path, description = "Workshop ID")),
    responses(
        (status = 200, description = "Workshop found", body = WorkshopDetails),
        (status = 404, description = "Workshop not found", body = ErrorResponse)
    )
)]
pub async fn get_workshop_details(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<WorkshopDetails>> {
    let workshop = state
        .repo
        .get_workshop(id)
        .await?
        .ok_or(AppError::NotFound("Workshop"))?;
    let registration_count = state.repo.count_active_registrations(id).await?;

    Ok(Json(WorkshopDetails {
        workshop,
        registration_count,
    }))
}

/// create_workshop
///
/// [Admin Route] Creates a workshop. Requires a title; seats default to 0.
#[utoipa::path(
    post,
    path = "/workshops",
    request_body = CreateWorkshopRequest,
    responses(
        (status = 201, description = "Workshop created", body = Workshop),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    )
)]
pub async fn create_workshop(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateWorkshopRequest>,
) -> AppResult<(StatusCode, Json<Workshop>)> {
    user.authorize(Action::CreateWorkshop)?;

    let title = required_text(payload.title, "Title")?;
    let seats = payload.seats.unwrap_or(0);
    validate_seats(seats)?;
    if let Some(instructor_id) = payload.instructor {
        ensure_instructor(&state, instructor_id).await?;
    }

    let workshop = state
        .repo
        .create_workshop(NewWorkshop {
            title,
            description: optional_text(payload.description),
            date: payload.date,
            time: optional_text(payload.time),
            venue: optional_text(payload.venue),
            seats,
            instructor_id: payload.instructor,
        })
        .await?;

    tracing::info!(workshop_id = %workshop.id, admin_id = %user.id, "workshop created");
    Ok((StatusCode::CREATED, Json(workshop)))
}

/// update_workshop
///
/// [Admin Route] Partial update. Only the fields present in the body change; `null`
/// clears an optional field such as the instructor or venue.
#[utoipa::path(
    put,
    path = "/workshops/{id}",
    params(("id" = Uuid, Path, description = "Workshop ID")),
    request_body = UpdateWorkshopRequest,
    responses(
        (status = 200, description = "Workshop updated", body = Workshop),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Workshop not found", body = ErrorResponse)
    )
)]
pub async fn update_workshop(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(mut payload): ApiJson<UpdateWorkshopRequest>,
) -> AppResult<Json<Workshop>> {
    user.authorize(Action::UpdateWorkshop)?;

    if let Some(title) = payload.title.take() {
        payload.title = Some(required_text(Some(title), "Title")?);
    }
    if let Some(seats) = payload.seats {
        validate_seats(seats)?;
    }
    if let Some(Some(instructor_id)) = payload.instructor {
        ensure_instructor(&state, instructor_id).await?;
    }

    let workshop = state
        .repo
        .update_workshop(id, payload)
        .await?
        .ok_or(AppError::NotFound("Workshop"))?;

    tracing::info!(workshop_id = %id, admin_id = %user.id, "workshop updated");
    Ok(Json(workshop))
}

/// delete_workshop
///
/// [Admin Route] Deletes a workshop together with its registrations, attendance,
/// feedback, materials and certificates.
#[utoipa::path(
    delete,
    path = "/workshops/{id}",
    params(("id" = Uuid, Path, description = "Workshop ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Workshop not found", body = ErrorResponse)
    )
)]
pub async fn delete_workshop(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    user.authorize(Action::DeleteWorkshop)?;

    if !state.repo.delete_workshop(id).await? {
        return Err(AppError::NotFound("Workshop"));
    }

    tracing::info!(workshop_id = %id, admin_id = %user.id, "workshop deleted");
    Ok(StatusCode::NO_CONTENT)
}
