use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::Redirect,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiJson, ApiPath, AppError, AppResult, ErrorResponse},
    guard::Action,
    models::{Certificate, IssueCertificateRequest, NewCertificate},
    validation::required_text,
    visibility::CertificateScope,
};

/// issue_certificate
///
/// [Admin Route] Records a certificate for a user and workshop. The document itself
/// is hosted elsewhere; only its URL is stored.
#[utoipa::path(
    post,
    path = "/certificates",
    request_body = IssueCertificateRequest,
    responses(
        (status = 201, description = "Certificate issued", body = Certificate),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Workshop or user not found", body = ErrorResponse)
    )
)]
pub async fn issue_certificate(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<IssueCertificateRequest>,
) -> AppResult<(StatusCode, Json<Certificate>)> {
    user.authorize(Action::IssueCertificate)?;
    let (Some(workshop_id), Some(user_id)) = (payload.workshop, payload.user_id) else {
        return Err(AppError::Validation(
            "Workshop and user are both required".to_string(),
        ));
    };
    let certificate_url = required_text(payload.certificate_url, "Certificate URL")?;

    if state.repo.get_workshop(workshop_id).await?.is_none() {
        return Err(AppError::NotFound("Workshop"));
    }
    if state.repo.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }

    let certificate = state
        .repo
        .create_certificate(NewCertificate {
            workshop_id,
            user_id,
            certificate_url,
        })
        .await?;

    tracing::info!(
        certificate_id = %certificate.id,
        %workshop_id,
        %user_id,
        issued_by = %user.id,
        "certificate issued"
    );
    Ok((StatusCode::CREATED, Json(certificate)))
}

/// get_certificates
///
/// [Authenticated Route] Admins see every certificate, everyone else their own.
#[utoipa::path(
    get,
    path = "/certificates",
    responses((status = 200, description = "Certificates", body = [Certificate]))
)]
pub async fn get_certificates(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Certificate>>> {
    user.authorize(Action::ListCertificates)?;
    let scope = CertificateScope::for_user(&user);
    Ok(Json(state.repo.list_certificates(scope).await?))
}

/// download_certificate
///
/// [Authenticated Route] Redirects (307) to the certificate document. Only the user
/// the certificate was issued to, or an admin, may follow it.
#[utoipa::path(
    get,
    path = "/certificates/download/{id}",
    params(("id" = Uuid, Path, description = "Certificate ID")),
    responses(
        (status = 307, description = "Redirect to the certificate URL"),
        (status = 403, description = "Not the certificate's owner", body = ErrorResponse),
        (status = 404, description = "Certificate not found", body = ErrorResponse)
    )
)]
pub async fn download_certificate(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Redirect> {
    user.authorize(Action::DownloadCertificate)?;

    let certificate = state
        .repo
        .get_certificate(id)
        .await?
        .ok_or(AppError::NotFound("Certificate"))?;
    if !CertificateScope::for_user(&user).admits(&certificate) {
        tracing::warn!(certificate_id = %id, user_id = %user.id, "download of foreign certificate");
        return Err(AppError::Forbidden);
    }

    Ok(Redirect::temporary(&certificate.certificate_url))
}
