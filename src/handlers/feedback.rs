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
    models::{Feedback, FeedbackEntry, NewFeedback, SubmitFeedbackRequest},
    validation::{optional_text, validate_rating},
    visibility::WorkshopScope,
};

/// submit_feedback
///
/// [Participant Route] Rates a workshop from 1 to 5 with an optional comment. A
/// participant may submit more than once for the same workshop.
#[utoipa::path(
    post,
    path = "/feedback",
    request_body = SubmitFeedbackRequest,
    responses(
        (status = 201, description = "Feedback stored", body = Feedback),
        (status = 400, description = "Missing workshop or rating", body = ErrorResponse),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Workshop not found", body = ErrorResponse)
    )
)]
pub async fn submit_feedback(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SubmitFeedbackRequest>,
) -> AppResult<(StatusCode, Json<Feedback>)> {
    user.authorize(Action::SubmitFeedback)?;
    let (Some(workshop_id), Some(rating)) = (payload.workshop, payload.rating) else {
        return Err(AppError::Validation(
            "Workshop and rating are both required".to_string(),
        ));
    };
    validate_rating(rating)?;

    if state.repo.get_workshop(workshop_id).await?.is_none() {
        return Err(AppError::NotFound("Workshop"));
    }

    let feedback = state
        .repo
        .create_feedback(NewFeedback {
            workshop_id,
            user_id: user.id,
            rating,
            comment: optional_text(payload.comment),
        })
        .await?;

    tracing::info!(%workshop_id, user_id = %user.id, rating, "feedback submitted");
    Ok((StatusCode::CREATED, Json(feedback)))
}

/// get_feedback
///
/// [Staff Route] Admins see all feedback, optionally narrowed by `?workshop=`.
/// Instructors always get the feedback of every workshop they instruct; their owned
/// set replaces any `?workshop=` filter.
#[utoipa::path(
    get,
    path = "/feedback",
    params(WorkshopFilter),
    responses(
        (status = 200, description = "Feedback entries", body = [FeedbackEntry]),
        (status = 403, description = "Participants cannot read feedback", body = ErrorResponse)
    )
)]
pub async fn get_feedback(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<WorkshopFilter>,
) -> AppResult<Json<Vec<FeedbackEntry>>> {
    user.authorize(Action::ListFeedback)?;
    let scope = WorkshopScope::for_user(&user);
    let workshop = match scope {
        WorkshopScope::All => filter.workshop,
        WorkshopScope::InstructedBy(_) => None,
    };
    Ok(Json(state.repo.list_feedback(scope, workshop).await?))
}
