use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{
        Attendance, Certificate, Feedback, FeedbackEntry, Material, NewCertificate, NewFeedback,
        NewMaterial, NewUser, NewWorkshop, Registration, Role, UpdateWorkshopRequest, User,
        UserCredentials, Workshop,
    },
    visibility::{CertificateScope, RegistrationScope, WorkshopScope},
};

// --- Shared column lists ---

const USER_COLUMNS: &str = "id, name, email, role, created_at";

const WORKSHOP_SELECT: &str = r#"
    SELECT w.id, w.title, w.description, w.date, w.time, w.venue, w.seats,
           w.instructor_id, u.name AS instructor_name, w.created_at, w.updated_at
    FROM workshops w
    LEFT JOIN users u ON u.id = w.instructor_id
"#;

const REGISTRATION_COLUMNS: &str = "id, workshop_id, user_id, status, created_at, updated_at";

const REGISTRATION_SELECT: &str = r#"
    SELECT r.id, r.workshop_id, r.user_id, r.status, r.created_at, r.updated_at,
           w.title AS workshop_title, u.name AS participant_name, u.email AS participant_email
    FROM registrations r
    JOIN workshops w ON w.id = r.workshop_id
    JOIN users u ON u.id = r.user_id
    WHERE TRUE
"#;

const FEEDBACK_SELECT: &str = r#"
    SELECT f.id, f.workshop_id, w.title AS workshop_title, f.user_id,
           u.name AS user_name, u.email AS user_email, f.rating, f.comment, f.created_at
    FROM feedback f
    JOIN workshops w ON w.id = f.workshop_id
    JOIN users u ON u.id = f.user_id
    WHERE TRUE
"#;

const CERTIFICATE_SELECT: &str = r#"
    SELECT c.id, c.workshop_id, c.user_id, c.certificate_url, c.issued_date, c.created_at,
           w.title AS workshop_title
    FROM certificates c
    JOIN workshops w ON w.id = c.workshop_id
"#;

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by PostgreSQL. Dynamic
/// filters are assembled with `QueryBuilder` and bound parameters only.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Appends the SQL form of a workshop scope. `column` is the instructor column of the
/// workshop row in the surrounding query.
fn push_workshop_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: WorkshopScope, column: &str) {
    if let WorkshopScope::InstructedBy(instructor_id) = scope {
        builder.push(format!(" AND {column} = "));
        builder.push_bind(instructor_id);
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- IDENTITY STORE ---

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("User already exists".to_string())
                } else {
                    e.into()
                }
            })
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_credentials(&self, email: &str) -> AppResult<Option<UserCredentials>> {
        let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, UserCredentials>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_users(&self, role: Option<Role>) -> AppResult<Vec<User>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
        if let Some(role) = role {
            builder.push(" AND role = ");
            builder.push_bind(role);
        }
        builder.push(" ORDER BY name ASC");

        Ok(builder
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?)
    }

    // --- WORKSHOP CATALOG ---

    /// Inserts the workshop and returns it joined with the instructor's name in one
    /// round trip (CTE).
    async fn create_workshop(&self, workshop: NewWorkshop) -> AppResult<Workshop> {
        let sql = r#"
            WITH w AS (
                INSERT INTO workshops (id, title, description, date, time, venue, seats, instructor_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            SELECT w.id, w.title, w.description, w.date, w.time, w.venue, w.seats,
                   w.instructor_id, u.name AS instructor_name, w.created_at, w.updated_at
            FROM w LEFT JOIN users u ON u.id = w.instructor_id
        "#;
        Ok(sqlx::query_as::<_, Workshop>(sql)
            .bind(Uuid::new_v4())
            .bind(&workshop.title)
            .bind(&workshop.description)
            .bind(workshop.date)
            .bind(&workshop.time)
            .bind(&workshop.venue)
            .bind(workshop.seats)
            .bind(workshop.instructor_id)
            .fetch_one(&self.pool)
            .await?)
    }

    /// Only the provided fields appear in the `SET` list; a provided `None` writes NULL.
    async fn update_workshop(
        &self,
        id: Uuid,
        changes: UpdateWorkshopRequest,
    ) -> AppResult<Option<Workshop>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("WITH w AS (UPDATE workshops SET updated_at = NOW()");
        if let Some(title) = changes.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(description) = changes.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(date) = changes.date {
            builder.push(", date = ").push_bind(date);
        }
        if let Some(time) = changes.time {
            builder.push(", time = ").push_bind(time);
        }
        if let Some(venue) = changes.venue {
            builder.push(", venue = ").push_bind(venue);
        }
        if let Some(seats) = changes.seats {
            builder.push(", seats = ").push_bind(seats);
        }
        if let Some(instructor_id) = changes.instructor {
            builder.push(", instructor_id = ").push_bind(instructor_id);
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.push(
            r#" RETURNING *)
            SELECT w.id, w.title, w.description, w.date, w.time, w.venue, w.seats,
                   w.instructor_id, u.name AS instructor_name, w.created_at, w.updated_at
            FROM w LEFT JOIN users u ON u.id = w.instructor_id"#,
        );

        Ok(builder
            .build_query_as::<Workshop>()
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Dependent rows are removed by `ON DELETE CASCADE`.
    async fn delete_workshop(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM workshops WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_workshop(&self, id: Uuid) -> AppResult<Option<Workshop>> {
        let sql = format!("{WORKSHOP_SELECT} WHERE w.id = $1");
        Ok(sqlx::query_as::<_, Workshop>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_workshops(&self, scope: WorkshopScope) -> AppResult<Vec<Workshop>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("{WORKSHOP_SELECT} WHERE TRUE"));
        push_workshop_scope(&mut builder, scope, "w.instructor_id");
        builder.push(" ORDER BY w.date ASC NULLS LAST, w.created_at DESC");

        Ok(builder
            .build_query_as::<Workshop>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_active_registrations(&self, workshop_id: Uuid) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM registrations WHERE workshop_id = $1 AND status = 'registered'",
        )
        .bind(workshop_id)
        .fetch_one(&self.pool)
        .await?)
    }

    // --- REGISTRATION LEDGER ---

    /// register
    ///
    /// Runs in one transaction that first locks the workshop row. Concurrent
    /// registrations for the same workshop queue on that lock, so each one counts the
    /// active registrations only after the previous insert committed. The partial
    /// unique index on `(workshop_id, user_id) WHERE status = 'registered'` backs the
    /// duplicate check.
    async fn register(&self, workshop_id: Uuid, user_id: Uuid) -> AppResult<Registration> {
        let mut tx = self.pool.begin().await?;

        let seats = sqlx::query_scalar::<_, i32>(
            "SELECT seats FROM workshops WHERE id = $1 FOR UPDATE",
        )
        .bind(workshop_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Workshop"))?;

        let already_registered = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (
                   SELECT 1 FROM registrations
                   WHERE workshop_id = $1 AND user_id = $2 AND status = 'registered'
               )"#,
        )
        .bind(workshop_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if already_registered {
            return Err(AppError::AlreadyRegistered);
        }

        let active = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM registrations WHERE workshop_id = $1 AND status = 'registered'",
        )
        .bind(workshop_id)
        .fetch_one(&mut *tx)
        .await?;
        if active >= i64::from(seats) {
            return Err(AppError::WorkshopFull);
        }

        let sql = format!(
            "INSERT INTO registrations (id, workshop_id, user_id, status) \
             VALUES ($1, $2, $3, 'registered') RETURNING {REGISTRATION_COLUMNS}"
        );
        let registration = sqlx::query_as::<_, Registration>(&sql)
            .bind(Uuid::new_v4())
            .bind(workshop_id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::AlreadyRegistered
                } else {
                    e.into()
                }
            })?;

        tx.commit().await?;
        Ok(registration)
    }

    async fn get_registration(&self, id: Uuid) -> AppResult<Option<Registration>> {
        let sql = format!("{REGISTRATION_SELECT} AND r.id = $1");
        Ok(sqlx::query_as::<_, Registration>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn cancel_registration(&self, id: Uuid) -> AppResult<Option<Registration>> {
        let sql = format!(
            "UPDATE registrations SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 RETURNING {REGISTRATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Registration>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_registrations(
        &self,
        scope: RegistrationScope,
        workshop_id: Option<Uuid>,
    ) -> AppResult<Vec<Registration>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(REGISTRATION_SELECT);
        if let RegistrationScope::OwnedBy(user_id) = scope {
            builder.push(" AND r.user_id = ");
            builder.push_bind(user_id);
        }
        if let Some(workshop_id) = workshop_id {
            builder.push(" AND r.workshop_id = ");
            builder.push_bind(workshop_id);
        }
        builder.push(" ORDER BY r.created_at DESC");

        Ok(builder
            .build_query_as::<Registration>()
            .fetch_all(&self.pool)
            .await?)
    }

    // --- ATTENDANCE TRACKER ---

    /// One row per registration; a second mark overwrites the flag.
    async fn upsert_attendance(
        &self,
        registration_id: Uuid,
        attended: bool,
    ) -> AppResult<Attendance> {
        Ok(sqlx::query_as::<_, Attendance>(
            r#"
            INSERT INTO attendance (id, registration_id, attended)
            VALUES ($1, $2, $3)
            ON CONFLICT (registration_id)
            DO UPDATE SET attended = EXCLUDED.attended, updated_at = NOW()
            RETURNING id, registration_id, attended, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(registration_id)
        .bind(attended)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_attendance(&self, workshop_id: Uuid) -> AppResult<Vec<Attendance>> {
        Ok(sqlx::query_as::<_, Attendance>(
            r#"
            SELECT a.id, a.registration_id, a.attended, a.created_at, a.updated_at
            FROM attendance a
            JOIN registrations r ON r.id = a.registration_id
            WHERE r.workshop_id = $1
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(workshop_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // --- FEEDBACK LOG ---

    async fn create_feedback(&self, feedback: NewFeedback) -> AppResult<Feedback> {
        Ok(sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (id, workshop_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, workshop_id, user_id, rating, comment, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(feedback.workshop_id)
        .bind(feedback.user_id)
        .bind(feedback.rating)
        .bind(feedback.comment)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_feedback(
        &self,
        scope: WorkshopScope,
        workshop_id: Option<Uuid>,
    ) -> AppResult<Vec<FeedbackEntry>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(FEEDBACK_SELECT);
        push_workshop_scope(&mut builder, scope, "w.instructor_id");
        if let Some(workshop_id) = workshop_id {
            builder.push(" AND f.workshop_id = ");
            builder.push_bind(workshop_id);
        }
        builder.push(" ORDER BY f.created_at DESC");

        Ok(builder
            .build_query_as::<FeedbackEntry>()
            .fetch_all(&self.pool)
            .await?)
    }

    // --- MATERIAL SHELF ---

    async fn create_material(&self, material: NewMaterial) -> AppResult<Material> {
        Ok(sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (id, workshop_id, title, file_url, uploaded_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, workshop_id, title, file_url, uploaded_by, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(material.workshop_id)
        .bind(&material.title)
        .bind(&material.file_url)
        .bind(material.uploaded_by)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_materials(&self, workshop_id: Option<Uuid>) -> AppResult<Vec<Material>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, workshop_id, title, file_url, uploaded_by, created_at FROM materials WHERE TRUE",
        );
        if let Some(workshop_id) = workshop_id {
            builder.push(" AND workshop_id = ");
            builder.push_bind(workshop_id);
        }
        builder.push(" ORDER BY created_at DESC");

        Ok(builder
            .build_query_as::<Material>()
            .fetch_all(&self.pool)
            .await?)
    }

    // --- CERTIFICATE REGISTRY ---

    async fn create_certificate(&self, certificate: NewCertificate) -> AppResult<Certificate> {
        let sql = r#"
            WITH c AS (
                INSERT INTO certificates (id, workshop_id, user_id, certificate_url)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT c.id, c.workshop_id, c.user_id, c.certificate_url, c.issued_date, c.created_at,
                   w.title AS workshop_title
            FROM c JOIN workshops w ON w.id = c.workshop_id
        "#;
        Ok(sqlx::query_as::<_, Certificate>(sql)
            .bind(Uuid::new_v4())
            .bind(certificate.workshop_id)
            .bind(certificate.user_id)
            .bind(&certificate.certificate_url)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_certificate(&self, id: Uuid) -> AppResult<Option<Certificate>> {
        let sql = format!("{CERTIFICATE_SELECT} WHERE c.id = $1");
        Ok(sqlx::query_as::<_, Certificate>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_certificates(&self, scope: CertificateScope) -> AppResult<Vec<Certificate>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("{CERTIFICATE_SELECT} WHERE TRUE"));
        if let CertificateScope::IssuedTo(user_id) = scope {
            builder.push(" AND c.user_id = ");
            builder.push_bind(user_id);
        }
        builder.push(" ORDER BY c.issued_date DESC");

        Ok(builder
            .build_query_as::<Certificate>()
            .fetch_all(&self.pool)
            .await?)
    }
}
