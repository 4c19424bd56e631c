use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::CookieJar;

use crate::{
    AppState,
    auth::{removal_cookie, session_cookie},
    error::{ApiJson, AppError, AppResult, ErrorResponse},
    models::{LoginRequest, LoginResponse, NewUser, SignupRequest, User},
    password::{hash_password, verify_password},
    validation::{required_text, validate_email, validate_password},
};

/// signup
///
/// [Public Route] Creates a user account. The role defaults to `participant` when
/// omitted. Signing up does not log the user in.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let name = required_text(payload.name, "Name")?;
    let email = required_text(payload.email, "Email")?.to_lowercase();
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Password is required".to_string()))?;

    validate_email(&email)?;
    validate_password(&password)?;

    let user = state
        .repo
        .create_user(NewUser {
            name,
            email,
            password_hash: hash_password(&password)?,
            role: payload.role.unwrap_or_default(),
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "user signed up");
    Ok((StatusCode::CREATED, Json(user)))
}

/// login
///
/// [Public Route] Exchanges credentials for a session token. The token is returned
/// in the body and also set as an HttpOnly `token` cookie.
///
/// Unknown email and wrong password produce the same 401.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing credentials", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let email = required_text(payload.email, "Email")?.to_lowercase();
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Password is required".to_string()))?;

    let Some(credentials) = state.repo.find_credentials(&email).await? else {
        tracing::warn!("login attempt for unknown email");
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(&password, &credentials.password_hash)? {
        tracing::warn!(user_id = %credentials.user.id, "login attempt with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let user = credentials.user;
    let token = state.tokens.issue(&user)?;
    let jar = jar.add(session_cookie(token.clone(), state.config.secure_cookies()));

    tracing::info!(user_id = %user.id, "user logged in");
    Ok((jar, Json(LoginResponse { token, user })))
}

/// logout
///
/// [Public Route] Clears the session cookie. Tokens are stateless, so a copied token
/// stays valid until it expires.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Session cookie cleared"))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.remove(removal_cookie()), StatusCode::NO_CONTENT)
}
