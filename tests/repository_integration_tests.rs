//! Postgres repository tests. They need a reachable database:
//!
//! ```sh
//! DATABASE_URL=postgres://... cargo test --test repository_integration_tests -- --ignored
//! ```

use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use workshop_hub::{
    AppError,
    models::{
        NewCertificate, NewFeedback, NewMaterial, NewUser, NewWorkshop, Role,
        UpdateWorkshopRequest, User,
    },
    repository::{PostgresRepository, Repository},
    visibility::{CertificateScope, RegistrationScope, WorkshopScope},
};

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// Emails are unique per run so the tests can share one database.
async fn create_test_user(repo: &PostgresRepository, role: Role) -> User {
    repo.create_user(NewUser {
        name: format!("{role} {}", &Uuid::new_v4().to_string()[..8]),
        email: format!("{}@test.com", Uuid::new_v4()),
        password_hash: "not-a-real-hash".to_string(),
        role,
    })
    .await
    .expect("Failed to create test user")
}

async fn create_test_workshop(
    repo: &PostgresRepository,
    seats: i32,
    instructor: Option<Uuid>,
) -> Uuid {
    repo.create_workshop(NewWorkshop {
        title: "Integration Workshop".to_string(),
        seats,
        instructor_id: instructor,
        ..Default::default()
    })
    .await
    .expect("Failed to create test workshop")
    .id
}

// --- Tests ---

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_email_is_a_conflict() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = create_test_user(&repo, Role::Participant).await;

    let result = repo
        .create_user(NewUser {
            name: "Copy".to_string(),
            email: user.email.clone(),
            password_hash: "x".to_string(),
            role: Role::Participant,
        })
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let credentials = repo.find_credentials(&user.email).await.unwrap().unwrap();
    assert_eq!(credentials.user.id, user.id);
    assert_eq!(credentials.password_hash, "not-a-real-hash");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_workshop_joins_instructor_name() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let instructor = create_test_user(&repo, Role::Instructor).await;
    let id = create_test_workshop(&repo, 3, Some(instructor.id)).await;

    let workshop = repo.get_workshop(id).await.unwrap().unwrap();
    assert_eq!(workshop.instructor_name.as_deref(), Some(instructor.name.as_str()));

    let mine = repo
        .list_workshops(WorkshopScope::InstructedBy(instructor.id))
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_sets_and_clears_fields() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let instructor = create_test_user(&repo, Role::Instructor).await;
    let id = create_test_workshop(&repo, 3, Some(instructor.id)).await;

    let updated = repo
        .update_workshop(
            id,
            UpdateWorkshopRequest {
                venue: Some(Some("Lab 2".to_string())),
                seats: Some(6),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.venue.as_deref(), Some("Lab 2"));
    assert_eq!(updated.seats, 6);
    assert_eq!(updated.instructor_name.as_deref(), Some(instructor.name.as_str()));

    let cleared = repo
        .update_workshop(
            id,
            UpdateWorkshopRequest {
                venue: Some(None),
                instructor: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.venue, None);
    assert_eq!(cleared.instructor_id, None);
    assert_eq!(cleared.instructor_name, None);
    assert_eq!(cleared.seats, 6);

    assert!(
        repo.update_workshop(Uuid::new_v4(), UpdateWorkshopRequest::default())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_register_rules() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let p1 = create_test_user(&repo, Role::Participant).await;
    let p2 = create_test_user(&repo, Role::Participant).await;
    let workshop = create_test_workshop(&repo, 1, None).await;

    let registration = repo.register(workshop, p1.id).await.unwrap();
    assert!(matches!(
        repo.register(workshop, p1.id).await,
        Err(AppError::AlreadyRegistered)
    ));
    assert!(matches!(
        repo.register(workshop, p2.id).await,
        Err(AppError::WorkshopFull)
    ));
    assert!(matches!(
        repo.register(Uuid::new_v4(), p2.id).await,
        Err(AppError::NotFound("Workshop"))
    ));

    repo.cancel_registration(registration.id).await.unwrap();
    assert_eq!(repo.count_active_registrations(workshop).await.unwrap(), 0);

    // The partial unique index admits a new active row after cancellation.
    repo.register(workshop, p1.id).await.unwrap();

    let own = repo
        .list_registrations(RegistrationScope::OwnedBy(p1.id), Some(workshop))
        .await
        .unwrap();
    assert_eq!(own.len(), 2);
    assert!(own.iter().any(|r| !r.is_active()));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_registrations_respect_capacity() {
    let ctx = DbTestContext::setup().await;
    let repo = Arc::new(ctx.repository());
    let workshop = create_test_workshop(&repo, 2, None).await;

    let mut participants = Vec::new();
    for _ in 0..8 {
        participants.push(create_test_user(&repo, Role::Participant).await.id);
    }

    let handles: Vec<_> = participants
        .into_iter()
        .map(|user_id| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.register(workshop, user_id).await })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(e) => assert!(matches!(e, AppError::WorkshopFull)),
        }
    }

    assert_eq!(admitted, 2);
    assert_eq!(repo.count_active_registrations(workshop).await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_attendance_upsert_and_cascade() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let participant = create_test_user(&repo, Role::Participant).await;
    let workshop = create_test_workshop(&repo, 5, None).await;
    let registration = repo.register(workshop, participant.id).await.unwrap();

    let first = repo.upsert_attendance(registration.id, true).await.unwrap();
    let second = repo.upsert_attendance(registration.id, false).await.unwrap();
    assert_eq!(first.id, second.id);
    assert!(!second.attended);

    repo.create_material(NewMaterial {
        workshop_id: workshop,
        title: "Notes".to_string(),
        file_url: "https://files.example.com/notes.pdf".to_string(),
        uploaded_by: participant.id,
    })
    .await
    .unwrap();

    assert!(repo.delete_workshop(workshop).await.unwrap());
    assert!(repo.get_registration(registration.id).await.unwrap().is_none());
    assert!(repo.list_attendance(workshop).await.unwrap().is_empty());
    assert!(repo.list_materials(Some(workshop)).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_feedback_and_certificate_scopes() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let ines = create_test_user(&repo, Role::Instructor).await;
    let jon = create_test_user(&repo, Role::Instructor).await;
    let participant = create_test_user(&repo, Role::Participant).await;
    let mine = create_test_workshop(&repo, 5, Some(ines.id)).await;
    let theirs = create_test_workshop(&repo, 5, Some(jon.id)).await;

    for workshop_id in [mine, theirs] {
        repo.create_feedback(NewFeedback {
            workshop_id,
            user_id: participant.id,
            rating: 5,
            comment: None,
        })
        .await
        .unwrap();
    }

    let scoped = repo
        .list_feedback(WorkshopScope::InstructedBy(ines.id), Some(theirs))
        .await
        .unwrap();
    assert!(scoped.is_empty());

    let scoped = repo
        .list_feedback(WorkshopScope::InstructedBy(ines.id), None)
        .await
        .unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].user_email, participant.email);

    let certificate = repo
        .create_certificate(NewCertificate {
            workshop_id: mine,
            user_id: participant.id,
            certificate_url: "https://certs.example.com/c.pdf".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(certificate.workshop_title.as_deref(), Some("Integration Workshop"));

    let own = repo
        .list_certificates(CertificateScope::IssuedTo(participant.id))
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    let foreign = repo
        .list_certificates(CertificateScope::IssuedTo(ines.id))
        .await
        .unwrap();
    assert!(foreign.is_empty());
}
