use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{
        Attendance, Certificate, Feedback, FeedbackEntry, Material, NewCertificate, NewFeedback,
        NewMaterial, NewUser, NewWorkshop, Registration, RegistrationStatus, Role,
        UpdateWorkshopRequest, User, UserCredentials, Workshop,
    },
    visibility::{CertificateScope, RegistrationScope, WorkshopScope},
};

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    workshops: Vec<Workshop>,
    registrations: Vec<Registration>,
    attendance: Vec<Attendance>,
    feedback: Vec<Feedback>,
    materials: Vec<Material>,
    certificates: Vec<Certificate>,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().map(|c| &c.user).find(|u| u.id == id)
    }

    fn workshop(&self, id: Uuid) -> Option<&Workshop> {
        self.workshops.iter().find(|w| w.id == id)
    }

    fn active_count(&self, workshop_id: Uuid) -> i64 {
        self.registrations
            .iter()
            .filter(|r| r.workshop_id == workshop_id && r.is_active())
            .count() as i64
    }

    /// Fills the joined read-only columns, mirroring the SQL joins.
    fn with_instructor(&self, mut workshop: Workshop) -> Workshop {
        workshop.instructor_name = workshop
            .instructor_id
            .and_then(|id| self.user(id))
            .map(|u| u.name.clone());
        workshop
    }

    fn with_participant(&self, mut registration: Registration) -> Registration {
        registration.workshop_title = self
            .workshop(registration.workshop_id)
            .map(|w| w.title.clone());
        if let Some(user) = self.user(registration.user_id) {
            registration.participant_name = Some(user.name.clone());
            registration.participant_email = Some(user.email.clone());
        }
        registration
    }

    fn with_workshop_title(&self, mut certificate: Certificate) -> Certificate {
        certificate.workshop_title = self
            .workshop(certificate.workshop_id)
            .map(|w| w.title.clone());
        certificate
    }
}

/// MemoryRepository
///
/// An in-process implementation of `Repository` used by the test suites and by local
/// runs without `DATABASE_URL`. All tables sit behind one mutex, so every method
/// (including `register`) is a single critical section.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    // --- IDENTITY STORE ---

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.lock()?;
        if tables.users.iter().any(|c| c.user.email == user.email) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.push(UserCredentials {
            user: record.clone(),
            password_hash: user.password_hash,
        });
        Ok(record)
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.lock()?.user(id).cloned())
    }

    async fn find_credentials(&self, email: &str) -> AppResult<Option<UserCredentials>> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|c| c.user.email == email)
            .cloned())
    }

    async fn list_users(&self, role: Option<Role>) -> AppResult<Vec<User>> {
        let tables = self.lock()?;
        let mut users: Vec<User> = tables
            .users
            .iter()
            .map(|c| &c.user)
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    // --- WORKSHOP CATALOG ---

    async fn create_workshop(&self, workshop: NewWorkshop) -> AppResult<Workshop> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let record = Workshop {
            id: Uuid::new_v4(),
            title: workshop.title,
            description: workshop.description,
            date: workshop.date,
            time: workshop.time,
            venue: workshop.venue,
            seats: workshop.seats,
            instructor_id: workshop.instructor_id,
            instructor_name: None,
            created_at: now,
            updated_at: now,
        };
        tables.workshops.push(record.clone());
        Ok(tables.with_instructor(record))
    }

    async fn update_workshop(
        &self,
        id: Uuid,
        changes: UpdateWorkshopRequest,
    ) -> AppResult<Option<Workshop>> {
        let mut tables = self.lock()?;
        let Some(workshop) = tables.workshops.iter_mut().find(|w| w.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            workshop.title = title;
        }
        if let Some(description) = changes.description {
            workshop.description = description;
        }
        if let Some(date) = changes.date {
            workshop.date = date;
        }
        if let Some(time) = changes.time {
            workshop.time = time;
        }
        if let Some(venue) = changes.venue {
            workshop.venue = venue;
        }
        if let Some(seats) = changes.seats {
            workshop.seats = seats;
        }
        if let Some(instructor) = changes.instructor {
            workshop.instructor_id = instructor;
        }
        workshop.updated_at = Utc::now();

        let updated = workshop.clone();
        Ok(Some(tables.with_instructor(updated)))
    }

    async fn delete_workshop(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.lock()?;
        let before = tables.workshops.len();
        tables.workshops.retain(|w| w.id != id);
        if tables.workshops.len() == before {
            return Ok(false);
        }

        let removed: Vec<Uuid> = tables
            .registrations
            .iter()
            .filter(|r| r.workshop_id == id)
            .map(|r| r.id)
            .collect();
        tables.registrations.retain(|r| r.workshop_id != id);
        tables
            .attendance
            .retain(|a| !removed.contains(&a.registration_id));
        tables.feedback.retain(|f| f.workshop_id != id);
        tables.materials.retain(|m| m.workshop_id != id);
        tables.certificates.retain(|c| c.workshop_id != id);
        Ok(true)
    }

    async fn get_workshop(&self, id: Uuid) -> AppResult<Option<Workshop>> {
        let tables = self.lock()?;
        Ok(tables
            .workshop(id)
            .cloned()
            .map(|w| tables.with_instructor(w)))
    }

    async fn list_workshops(&self, scope: WorkshopScope) -> AppResult<Vec<Workshop>> {
        let tables = self.lock()?;
        let mut workshops: Vec<Workshop> = tables
            .workshops
            .iter()
            .filter(|w| scope.admits(w))
            .cloned()
            .map(|w| tables.with_instructor(w))
            .collect();
        // Dated workshops first, earliest first; undated ones newest first.
        workshops.sort_by(|a, b| match (a.date, b.date) {
            (Some(x), Some(y)) => x.cmp(&y).then(b.created_at.cmp(&a.created_at)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => b.created_at.cmp(&a.created_at),
        });
        Ok(workshops)
    }

    async fn count_active_registrations(&self, workshop_id: Uuid) -> AppResult<i64> {
        Ok(self.lock()?.active_count(workshop_id))
    }

    // --- REGISTRATION LEDGER ---

    async fn register(&self, workshop_id: Uuid, user_id: Uuid) -> AppResult<Registration> {
        let mut tables = self.lock()?;
        let seats = tables
            .workshop(workshop_id)
            .map(|w| w.seats)
            .ok_or(AppError::NotFound("Workshop"))?;

        if tables
            .registrations
            .iter()
            .any(|r| r.workshop_id == workshop_id && r.user_id == user_id && r.is_active())
        {
            return Err(AppError::AlreadyRegistered);
        }
        if tables.active_count(workshop_id) >= i64::from(seats) {
            return Err(AppError::WorkshopFull);
        }

        let now = Utc::now();
        let record = Registration {
            id: Uuid::new_v4(),
            workshop_id,
            user_id,
            status: RegistrationStatus::Registered,
            created_at: now,
            updated_at: now,
            ..Default::default()
        };
        tables.registrations.push(record.clone());
        Ok(record)
    }

    async fn get_registration(&self, id: Uuid) -> AppResult<Option<Registration>> {
        let tables = self.lock()?;
        Ok(tables
            .registrations
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .map(|r| tables.with_participant(r)))
    }

    async fn cancel_registration(&self, id: Uuid) -> AppResult<Option<Registration>> {
        let mut tables = self.lock()?;
        Ok(tables
            .registrations
            .iter_mut()
            .find(|r| r.id == id)
            .map(|r| {
                r.status = RegistrationStatus::Cancelled;
                r.updated_at = Utc::now();
                r.clone()
            }))
    }

    async fn list_registrations(
        &self,
        scope: RegistrationScope,
        workshop_id: Option<Uuid>,
    ) -> AppResult<Vec<Registration>> {
        let tables = self.lock()?;
        let mut registrations: Vec<Registration> = tables
            .registrations
            .iter()
            .filter(|r| scope.admits(r))
            .filter(|r| workshop_id.is_none_or(|id| r.workshop_id == id))
            .cloned()
            .map(|r| tables.with_participant(r))
            .collect();
        registrations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(registrations)
    }

    // --- ATTENDANCE TRACKER ---

    async fn upsert_attendance(
        &self,
        registration_id: Uuid,
        attended: bool,
    ) -> AppResult<Attendance> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        if let Some(existing) = tables
            .attendance
            .iter_mut()
            .find(|a| a.registration_id == registration_id)
        {
            existing.attended = attended;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let record = Attendance {
            id: Uuid::new_v4(),
            registration_id,
            attended,
            created_at: now,
            updated_at: now,
        };
        tables.attendance.push(record.clone());
        Ok(record)
    }

    async fn list_attendance(&self, workshop_id: Uuid) -> AppResult<Vec<Attendance>> {
        let tables = self.lock()?;
        let registrations: Vec<Uuid> = tables
            .registrations
            .iter()
            .filter(|r| r.workshop_id == workshop_id)
            .map(|r| r.id)
            .collect();
        Ok(tables
            .attendance
            .iter()
            .filter(|a| registrations.contains(&a.registration_id))
            .cloned()
            .collect())
    }

    // --- FEEDBACK LOG ---

    async fn create_feedback(&self, feedback: NewFeedback) -> AppResult<Feedback> {
        let mut tables = self.lock()?;
        let record = Feedback {
            id: Uuid::new_v4(),
            workshop_id: feedback.workshop_id,
            user_id: feedback.user_id,
            rating: feedback.rating,
            comment: feedback.comment,
            created_at: Utc::now(),
        };
        tables.feedback.push(record.clone());
        Ok(record)
    }

    async fn list_feedback(
        &self,
        scope: WorkshopScope,
        workshop_id: Option<Uuid>,
    ) -> AppResult<Vec<FeedbackEntry>> {
        let tables = self.lock()?;
        let mut entries: Vec<FeedbackEntry> = tables
            .feedback
            .iter()
            .filter(|f| workshop_id.is_none_or(|id| f.workshop_id == id))
            .filter_map(|f| {
                let workshop = tables.workshop(f.workshop_id).filter(|w| scope.admits(w))?;
                let user = tables.user(f.user_id)?;
                Some(FeedbackEntry {
                    id: f.id,
                    workshop_id: f.workshop_id,
                    workshop_title: workshop.title.clone(),
                    user_id: f.user_id,
                    user_name: user.name.clone(),
                    user_email: user.email.clone(),
                    rating: f.rating,
                    comment: f.comment.clone(),
                    created_at: f.created_at,
                })
            })
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    // --- MATERIAL SHELF ---

    async fn create_material(&self, material: NewMaterial) -> AppResult<Material> {
        let mut tables = self.lock()?;
        let record = Material {
            id: Uuid::new_v4(),
            workshop_id: material.workshop_id,
            title: material.title,
            file_url: material.file_url,
            uploaded_by: material.uploaded_by,
            created_at: Utc::now(),
        };
        tables.materials.push(record.clone());
        Ok(record)
    }

    async fn list_materials(&self, workshop_id: Option<Uuid>) -> AppResult<Vec<Material>> {
        let tables = self.lock()?;
        let mut materials: Vec<Material> = tables
            .materials
            .iter()
            .filter(|m| workshop_id.is_none_or(|id| m.workshop_id == id))
            .cloned()
            .collect();
        materials.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(materials)
    }

    // --- CERTIFICATE REGISTRY ---

    async fn create_certificate(&self, certificate: NewCertificate) -> AppResult<Certificate> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let record = Certificate {
            id: Uuid::new_v4(),
            workshop_id: certificate.workshop_id,
            user_id: certificate.user_id,
            certificate_url: certificate.certificate_url,
            issued_date: now,
            created_at: now,
            workshop_title: None,
        };
        tables.certificates.push(record.clone());
        Ok(tables.with_workshop_title(record))
    }

    async fn get_certificate(&self, id: Uuid) -> AppResult<Option<Certificate>> {
        let tables = self.lock()?;
        Ok(tables
            .certificates
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .map(|c| tables.with_workshop_title(c)))
    }

    async fn list_certificates(&self, scope: CertificateScope) -> AppResult<Vec<Certificate>> {
        let tables = self.lock()?;
        let mut certificates: Vec<Certificate> = tables
            .certificates
            .iter()
            .filter(|c| scope.admits(c))
            .cloned()
            .map(|c| tables.with_workshop_title(c))
            .collect();
        certificates.sort_by(|a, b| b.issued_date.cmp(&a.issued_date));
        Ok(certificates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn seeded(seats: i32) -> (MemoryRepository, Uuid) {
        let repo = MemoryRepository::new();
        let workshop = repo
            .create_workshop(NewWorkshop {
                title: "Rust 101".to_string(),
                seats,
                ..Default::default()
            })
            .await
            .unwrap();
        (repo, workshop.id)
    }

    #[tokio::test]
    async fn register_enforces_capacity_and_uniqueness() {
        let (repo, workshop) = seeded(1).await;
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        repo.register(workshop, a).await.unwrap();
        assert!(matches!(
            repo.register(workshop, a).await,
            Err(AppError::AlreadyRegistered)
        ));
        assert!(matches!(
            repo.register(workshop, b).await,
            Err(AppError::WorkshopFull)
        ));
    }

    #[tokio::test]
    async fn cancelled_seats_are_released() {
        let (repo, workshop) = seeded(1).await;
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let first = repo.register(workshop, a).await.unwrap();
        repo.cancel_registration(first.id).await.unwrap();
        repo.register(workshop, b).await.unwrap();
        assert_eq!(repo.count_active_registrations(workshop).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_registrations_fill_exactly_the_capacity() {
        let (repo, workshop) = seeded(3).await;
        let repo = Arc::new(repo);

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.register(workshop, Uuid::new_v4()).await })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 3);
        assert_eq!(repo.count_active_registrations(workshop).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn deleting_a_workshop_cascades() {
        let (repo, workshop) = seeded(5).await;
        let user = Uuid::new_v4();
        let registration = repo.register(workshop, user).await.unwrap();
        repo.upsert_attendance(registration.id, true).await.unwrap();
        repo.create_material(NewMaterial {
            workshop_id: workshop,
            title: "Slides".to_string(),
            file_url: "https://example.com/slides.pdf".to_string(),
            uploaded_by: user,
        })
        .await
        .unwrap();

        assert!(repo.delete_workshop(workshop).await.unwrap());
        assert!(repo.get_registration(registration.id).await.unwrap().is_none());
        assert!(repo.list_attendance(workshop).await.unwrap().is_empty());
        assert!(repo.list_materials(Some(workshop)).await.unwrap().is_empty());
        assert!(!repo.delete_workshop(workshop).await.unwrap());
    }

    #[tokio::test]
    async fn attendance_is_upserted_per_registration() {
        let (repo, workshop) = seeded(5).await;
        let registration = repo.register(workshop, Uuid::new_v4()).await.unwrap();

        let first = repo.upsert_attendance(registration.id, true).await.unwrap();
        let second = repo.upsert_attendance(registration.id, false).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(!second.attended);
        assert_eq!(repo.list_attendance(workshop).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_emails_conflict() {
        let repo = MemoryRepository::new();
        let user = NewUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Participant,
        };
        repo.create_user(user.clone()).await.unwrap();
        assert!(matches!(
            repo.create_user(user).await,
            Err(AppError::Conflict(_))
        ));
    }
}
