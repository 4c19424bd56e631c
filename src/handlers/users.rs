use axum::{Json, extract::State};

use super::RoleFilter;
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiQuery, AppResult, ErrorResponse},
    guard::Action,
    models::User,
};

/// list_users
///
/// [Admin Route] Lists users, optionally filtered by role (the workshop form uses
/// `?role=instructor` to fill its instructor picker).
#[utoipa::path(
    get,
    path = "/users",
    params(RoleFilter),
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    )
)]
pub async fn list_users(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<RoleFilter>,
) -> AppResult<Json<Vec<User>>> {
    user.authorize(Action::ListUsers)?;
    Ok(Json(state.repo.list_users(filter.role).await?))
}

/// get_me
///
/// [Authenticated Route] Returns the current user's record as resolved from the
/// session token.
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    )
)]
pub async fn get_me(user: AuthUser) -> AppResult<Json<User>> {
    user.authorize(Action::ViewProfile)?;
    Ok(Json(user.into()))
}
