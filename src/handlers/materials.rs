use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use super::WorkshopFilter;
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiJson, ApiQuery, AppError, AppResult, ErrorResponse},
    guard::Action,
    models::{AddMaterialRequest, Material, NewMaterial},
    validation::required_text,
};

/// add_material
///
/// [Staff Route] Attaches a resource link to a workshop.
#[utoipa::path(
    post,
    path = "/materials",
    request_body = AddMaterialRequest,
    responses(
        (status = 201, description = "Material added", body = Material),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 403, description = "Participants cannot add materials", body = ErrorResponse),
        (status = 404, description = "Workshop not found", body = ErrorResponse)
    )
)]
pub async fn add_material(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AddMaterialRequest>,
) -> AppResult<(StatusCode, Json<Material>)> {
    user.authorize(Action::AddMaterial)?;
    let workshop_id = payload
        .workshop
        .ok_or_else(|| AppError::Validation("Workshop is required".to_string()))?;
    let title = required_text(payload.title, "Title")?;
    let file_url = required_text(payload.file_url, "File URL")?;

    if state.repo.get_workshop(workshop_id).await?.is_none() {
        return Err(AppError::NotFound("Workshop"));
    }

    let material = state
        .repo
        .create_material(NewMaterial {
            workshop_id,
            title,
            file_url,
            uploaded_by: user.id,
        })
        .await?;

    tracing::info!(material_id = %material.id, %workshop_id, uploaded_by = %user.id, "material added");
    Ok((StatusCode::CREATED, Json(material)))
}

/// get_materials
///
/// [Authenticated Route] Lists materials, optionally for one workshop only.
#[utoipa::path(
    get,
    path = "/materials",
    params(WorkshopFilter),
    responses((status = 200, description = "Materials", body = [Material]))
)]
pub async fn get_materials(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<WorkshopFilter>,
) -> AppResult<Json<Vec<Material>>> {
    user.authorize(Action::ListMaterials)?;
    Ok(Json(state.repo.list_materials(filter.workshop).await?))
}
