use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Attendance, Certificate, Feedback, FeedbackEntry, Material, NewCertificate, NewFeedback,
        NewMaterial, NewUser, NewWorkshop, Registration, Role, UpdateWorkshopRequest, User,
        UserCredentials, Workshop,
    },
    visibility::{CertificateScope, RegistrationScope, WorkshopScope},
};

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// Repository Trait
///
/// The persistence contract used by every handler. List methods take the visibility
/// scope of the caller, so filtering happens in the store and not after the fact.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across Axum's
/// task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Identity Store ---
    /// Fails with `Conflict` when the email is already taken.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_credentials(&self, email: &str) -> AppResult<Option<UserCredentials>>;
    async fn list_users(&self, role: Option<Role>) -> AppResult<Vec<User>>;

    // --- Workshop Catalog ---
    async fn create_workshop(&self, workshop: NewWorkshop) -> AppResult<Workshop>;
    /// Partial update; `None` fields are left unchanged.
    async fn update_workshop(
        &self,
        id: Uuid,
        changes: UpdateWorkshopRequest,
    ) -> AppResult<Option<Workshop>>;
    /// Removes the workshop together with everything that references it.
    async fn delete_workshop(&self, id: Uuid) -> AppResult<bool>;
    async fn get_workshop(&self, id: Uuid) -> AppResult<Option<Workshop>>;
    async fn list_workshops(&self, scope: WorkshopScope) -> AppResult<Vec<Workshop>>;
    async fn count_active_registrations(&self, workshop_id: Uuid) -> AppResult<i64>;

    // --- Registration Ledger ---
    /// Atomic check-and-insert. Fails with `NotFound`, `AlreadyRegistered` or
    /// `WorkshopFull`; concurrent calls for the last seat admit exactly one.
    async fn register(&self, workshop_id: Uuid, user_id: Uuid) -> AppResult<Registration>;
    async fn get_registration(&self, id: Uuid) -> AppResult<Option<Registration>>;
    async fn cancel_registration(&self, id: Uuid) -> AppResult<Option<Registration>>;
    async fn list_registrations(
        &self,
        scope: RegistrationScope,
        workshop_id: Option<Uuid>,
    ) -> AppResult<Vec<Registration>>;

    // --- Attendance Tracker ---
    async fn upsert_attendance(&self, registration_id: Uuid, attended: bool)
    -> AppResult<Attendance>;
    async fn list_attendance(&self, workshop_id: Uuid) -> AppResult<Vec<Attendance>>;

    // --- Feedback Log ---
    async fn create_feedback(&self, feedback: NewFeedback) -> AppResult<Feedback>;
    /// Feedback whose workshop is inside `scope`, optionally narrowed to one workshop.
    async fn list_feedback(
        &self,
        scope: WorkshopScope,
        workshop_id: Option<Uuid>,
    ) -> AppResult<Vec<FeedbackEntry>>;

    // --- Material Shelf ---
    async fn create_material(&self, material: NewMaterial) -> AppResult<Material>;
    async fn list_materials(&self, workshop_id: Option<Uuid>) -> AppResult<Vec<Material>>;

    // --- Certificate Registry ---
    async fn create_certificate(&self, certificate: NewCertificate) -> AppResult<Certificate>;
    async fn get_certificate(&self, id: Uuid) -> AppResult<Option<Certificate>>;
    async fn list_certificates(&self, scope: CertificateScope) -> AppResult<Vec<Certificate>>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;
