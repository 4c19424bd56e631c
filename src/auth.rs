use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    guard::{self, Action},
    models::{Role, User},
    repository::RepositoryState,
};

/// Name of the cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Claims
///
/// Payload of a session token. Only the user id is bound into the token; the role is
/// re-read from the identity store on every request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    /// Expiration time (seconds since epoch).
    pub exp: usize,
    /// Issued at (seconds since epoch).
    pub iat: usize,
}

/// TokenService
///
/// Issues and verifies HS256-signed session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, Duration::hours(config.token_ttl_hours))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for the user, valid for the configured lifetime.
    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    /// Verifies signature and expiry and returns the user id the token was issued for.
    pub fn verify(&self, token: &str) -> AppResult<Uuid> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                tracing::debug!(error = ?e.kind(), "token rejected");
                AppError::InvalidToken
            })
    }
}

/// extract_token
///
/// Finds the session token in the request. The `token` cookie wins over an
/// `Authorization: Bearer` header when both are present.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(TOKEN_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_owned());
    }

    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}

/// Builds the `Set-Cookie` value carrying a freshly issued token.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Builds the removal cookie used on logout.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE).path("/").build()
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the user's current record,
/// credential excluded.
#[derive(Debug, Clone, Default)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl AuthUser {
    /// Role check against the static guard table.
    pub fn authorize(&self, action: Action) -> AppResult<()> {
        guard::authorize(self, action)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

impl From<AuthUser> for User {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// authenticate
///
/// Token lookup, verification and identity-store lookup for one request.
///
/// * no token at all            -> `Unauthenticated`
/// * bad/expired/forged token   -> `InvalidToken`
/// * token for a vanished user  -> `InvalidToken`
pub async fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenService,
    repo: &RepositoryState,
) -> AppResult<AuthUser> {
    let token = extract_token(headers).ok_or(AppError::Unauthenticated)?;
    let user_id = tokens.verify(&token)?;

    let user = repo.get_user(user_id).await?.ok_or_else(|| {
        tracing::warn!(%user_id, "token refers to a user that no longer exists");
        AppError::InvalidToken
    })?;

    Ok(AuthUser::from(user))
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument. Any failure rejects the request
/// with a 401 `{"message": ...}` body before the handler runs.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by the authentication layer for this request.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let tokens = TokenService::from_ref(state);

        let user = authenticate(&parts.headers, &tokens, &repo).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn service() -> TokenService {
        TokenService::new("unit-test-secret", Duration::hours(1))
    }

    fn user() -> User {
        User {
            id: Uuid::from_u128(42),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Participant,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_tokens_verify_to_the_same_user() {
        let tokens = service();
        let token = tokens.issue(&user()).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), Uuid::from_u128(42));
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = TokenService::new("other-secret", Duration::hours(1))
            .issue(&user())
            .unwrap();
        assert!(matches!(service().verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(service().verify("not.a.jwt"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn cookie_takes_precedence_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token=from-cookie"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_is_used_without_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn non_bearer_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&headers), None);
    }
}
