use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enumerations ---

/// Role
///
/// The closed set of roles a user can hold. Stored as the Postgres enum `user_role`
/// and serialized in lowercase (`"admin"`, `"instructor"`, `"participant"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema,
    sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    #[default]
    Participant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Participant => "participant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RegistrationStatus
///
/// A registration only ever moves from `registered` to `cancelled`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
pub enum RegistrationStatus {
    #[default]
    Registered,
    Cancelled,
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A user record from the `users` table without its credential. This is the shape
/// returned by every endpoint that exposes a user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserCredentials
///
/// Internal row used only by the login flow. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Workshop
///
/// A workshop record from the `workshops` table. `instructor_name` is filled by
/// read queries that join the instructor's user row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Workshop {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[ts(type = "string | null")]
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub seats: i32,
    pub instructor_id: Option<Uuid>,
    #[sqlx(default)]
    pub instructor_name: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Registration
///
/// A participant's sign-up for a workshop. Cancelled registrations are kept.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Registration {
    pub id: Uuid,
    pub workshop_id: Uuid,
    pub user_id: Uuid,
    pub status: RegistrationStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    // Loaded via JOINs in list queries.
    #[sqlx(default)]
    pub workshop_title: Option<String>,
    #[sqlx(default)]
    pub participant_name: Option<String>,
    #[sqlx(default)]
    pub participant_email: Option<String>,
}

impl Registration {
    pub fn is_active(&self) -> bool {
        self.status == RegistrationStatus::Registered
    }
}

/// Attendance
///
/// One attendance flag per registration, upserted by the workshop's instructor or an admin.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Attendance {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub attended: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Feedback
///
/// Raw row of the `feedback` table, returned on submission.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Feedback {
    pub id: Uuid,
    pub workshop_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// FeedbackEntry
///
/// Feedback enriched with the submitter's name/email and the workshop title, as
/// shown to admins and instructors.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct FeedbackEntry {
    pub id: Uuid,
    pub workshop_id: Uuid,
    pub workshop_title: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub rating: i32,
    pub comment: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Material
///
/// A resource link attached to a workshop. The URL is opaque to the service.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Material {
    pub id: Uuid,
    pub workshop_id: Uuid,
    pub title: String,
    pub file_url: String,
    pub uploaded_by: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Certificate
///
/// An admin-issued certificate pointing at an externally hosted document.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Certificate {
    pub id: Uuid,
    pub workshop_id: Uuid,
    pub user_id: Uuid,
    pub certificate_url: String,
    #[ts(type = "string")]
    pub issued_date: DateTime<Utc>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    pub workshop_title: Option<String>,
}

// --- Repository Inputs ---

/// Validated data for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Validated data for inserting a workshop.
#[derive(Debug, Clone, Default)]
pub struct NewWorkshop {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub seats: i32,
    pub instructor_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub workshop_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub workshop_id: Uuid,
    pub title: String,
    pub file_url: String,
    pub uploaded_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub workshop_id: Uuid,
    pub user_id: Uuid,
    pub certificate_url: String,
}

// --- Request Payloads (Input Schemas) ---
//
// Required fields are `Option`s so that a missing field is reported as a 400 with a
// readable message instead of a generic deserialization failure.

/// SignupRequest
///
/// Input payload for `POST /auth/signup`. The password is hashed before it reaches
/// the repository and is never logged.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// LoginRequest
///
/// Input payload for `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// LoginResponse
///
/// The issued session token and the logged-in user. The same token is also set as
/// the `token` cookie.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// CreateWorkshopRequest
///
/// Input payload for `POST /workshops`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateWorkshopRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[ts(type = "string | null")]
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub seats: Option<i32>,
    #[serde(alias = "instructor_id")]
    pub instructor: Option<Uuid>,
}

/// UpdateWorkshopRequest
///
/// Partial update payload for `PUT /workshops/{id}`. Absent fields are left unchanged.
/// For the nullable fields an explicit `null` clears the stored value, so they are
/// `Option<Option<_>>`: `None` when absent, `Some(None)` when null.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateWorkshopRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = Date)]
    #[ts(type = "string | null")]
    pub date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub time: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub venue: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<i32>,

    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none",
        alias = "instructor_id"
    )]
    #[schema(value_type = Option<Uuid>)]
    pub instructor: Option<Option<Uuid>>,
}

/// Deserializes a present field (value or `null`) into `Some(_)`. Combined with
/// `#[serde(default)]`, an absent field stays `None`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// WorkshopDetails
///
/// Output of `GET /workshops/{id}`: the workshop plus its number of active
/// registrations, from which clients derive the remaining seats.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct WorkshopDetails {
    pub workshop: Workshop,
    #[serde(rename = "registrations")]
    pub registration_count: i64,
}

/// RegisterRequest
///
/// Input payload for `POST /registrations`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    #[serde(rename = "workshopId", alias = "workshop_id", alias = "workshop")]
    pub workshop_id: Option<Uuid>,
}

/// MarkAttendanceRequest
///
/// Input payload for `POST /attendance/mark`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MarkAttendanceRequest {
    #[serde(rename = "registrationId", alias = "registration_id")]
    pub registration_id: Option<Uuid>,
    pub attended: Option<bool>,
}

/// SubmitFeedbackRequest
///
/// Input payload for `POST /feedback`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SubmitFeedbackRequest {
    #[serde(alias = "workshop_id", alias = "workshopId")]
    pub workshop: Option<Uuid>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

/// AddMaterialRequest
///
/// Input payload for `POST /materials`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AddMaterialRequest {
    #[serde(alias = "workshop_id", alias = "workshopId")]
    pub workshop: Option<Uuid>,
    pub title: Option<String>,
    #[serde(alias = "fileUrl")]
    pub file_url: Option<String>,
}

/// IssueCertificateRequest
///
/// Input payload for `POST /certificates`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct IssueCertificateRequest {
    #[serde(alias = "workshop_id", alias = "workshopId")]
    pub workshop: Option<Uuid>,
    #[serde(rename = "userId", alias = "user_id", alias = "user")]
    pub user_id: Option<Uuid>,
    #[serde(alias = "certificateUrl")]
    pub certificate_url: Option<String>,
}
