//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres
//! database with the schema embedded in `migrations/`.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use diesel::dsl::max;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task;

use crate::api::{CohortId, CourseId, EnrollmentId, RegistrationId, SessionId};
use crate::db::repository::{
    CohortRepository, CourseRepository, ErrorContext, LedgerRepository, RepositoryError,
    RepositoryResult,
};
use crate::models::{
    AttendanceMark, AttendanceRecord, Cohort, Course, Enrollment, EnrollmentStatus, NewCohort,
    NewCourse, NewEnrollment, NewRegistration, NewSession, Registration, RegistrationStatus,
    Session,
};

mod models;
mod schema;

use models::*;
use schema::{attendance_records, cohorts, courses, enrollments, registrations, sessions};

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Statuses that count toward cohort occupancy.
const SEAT_HOLDING_ENROLLMENTS: [&str; 2] = ["pending", "active"];
/// Registration statuses that consume a session seat.
const SEAT_HOLDING_REGISTRATIONS: [&str; 2] = ["registered", "attended"];

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let parse_u32 = |key: &str, default: u32| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(default)
        };
        let parse_u64 = |key: &str, default: u64| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            database_url,
            max_pool_size: parse_u32("PG_POOL_MAX", 10),
            min_pool_size: parse_u32("PG_POOL_MIN", 1),
            connection_timeout_sec: parse_u64("PG_CONN_TIMEOUT_SEC", 30),
            idle_timeout_sec: parse_u64("PG_IDLE_TIMEOUT_SEC", 600),
            max_retries: parse_u32("PG_MAX_RETRIES", 3),
            retry_delay_ms: parse_u64("PG_RETRY_DELAY_MS", 100),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// Uniqueness of (enrollment, session) pairs and per-cohort session
/// numbers is enforced by database constraints; session numbers are
/// assigned inside the transaction that inserts the row.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient
    /// failures (connection errors, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }

    /// Get detailed health information: (is_healthy, latency_ms, error).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        match self.health_check().await {
            Ok(true) => (true, Some(start.elapsed().as_millis() as u64), None),
            Ok(false) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some("Health check returned false".to_string()),
            ),
            Err(e) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some(e.to_string()),
            ),
        }
    }
}

fn map_unique_violation(
    err: diesel::result::Error,
    operation: &'static str,
) -> RepositoryError {
    match err {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            info,
        ) => RepositoryError::validation_with_context(
            info.message().to_string(),
            ErrorContext::new(operation),
        ),
        other => RepositoryError::from(other),
    }
}

#[async_trait]
impl CourseRepository for PostgresRepository {
    async fn create_course(&self, new: NewCourse) -> RepositoryResult<Course> {
        self.with_conn(move |conn| {
            let row = NewCourseRow {
                title: new.title.clone(),
                modality: new.modality.to_string(),
                default_cohort_capacity: new.default_cohort_capacity as i32,
                instructor: new.instructor.clone(),
                is_active: true,
            };
            let inserted: CourseRow = diesel::insert_into(courses::table)
                .values(&row)
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("create_course"))?;
            Course::try_from(inserted)
        })
        .await
    }

    async fn get_course(&self, id: CourseId) -> RepositoryResult<Course> {
        self.with_conn(move |conn| {
            let row: CourseRow = courses::table
                .find(id.value())
                .first(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("get_course"))?;
            Course::try_from(row)
        })
        .await
    }

    async fn list_courses(&self) -> RepositoryResult<Vec<Course>> {
        self.with_conn(move |conn| {
            let rows: Vec<CourseRow> = courses::table
                .order(courses::id.asc())
                .load(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("list_courses"))?;
            rows.into_iter().map(Course::try_from).collect()
        })
        .await
    }

    async fn create_enrollment(&self, new: NewEnrollment) -> RepositoryResult<Enrollment> {
        self.with_conn(move |conn| {
            let row = NewEnrollmentRow {
                course_id: new.course_id.value(),
                cohort_id: None,
                learner: new.learner.clone(),
                status: new.status.to_string(),
            };
            let inserted: EnrollmentRow = diesel::insert_into(enrollments::table)
                .values(&row)
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("create_enrollment"))?;
            Enrollment::try_from(inserted)
        })
        .await
    }

    async fn get_enrollment(&self, id: EnrollmentId) -> RepositoryResult<Enrollment> {
        self.with_conn(move |conn| {
            let row: EnrollmentRow = enrollments::table
                .find(id.value())
                .first(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("get_enrollment"))?;
            Enrollment::try_from(row)
        })
        .await
    }

    async fn list_course_enrollments(
        &self,
        course_id: CourseId,
    ) -> RepositoryResult<Vec<Enrollment>> {
        self.with_conn(move |conn| {
            let rows: Vec<EnrollmentRow> = enrollments::table
                .filter(enrollments::course_id.eq(course_id.value()))
                .order((enrollments::created_at.asc(), enrollments::id.asc()))
                .load(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("list_course_enrollments"))?;
            rows.into_iter().map(Enrollment::try_from).collect()
        })
        .await
    }

    async fn count_course_occupancy(&self, course_id: CourseId) -> RepositoryResult<u32> {
        self.with_conn(move |conn| {
            let count: i64 = enrollments::table
                .filter(enrollments::course_id.eq(course_id.value()))
                .filter(enrollments::status.eq_any(SEAT_HOLDING_ENROLLMENTS))
                .count()
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("count_course_occupancy"))?;
            Ok(count as u32)
        })
        .await
    }

    async fn bind_enrollment_cohort(
        &self,
        enrollment_id: EnrollmentId,
        cohort_id: CohortId,
    ) -> RepositoryResult<Enrollment> {
        self.with_conn(move |conn| {
            let row: EnrollmentRow = diesel::update(enrollments::table.find(enrollment_id.value()))
                .set(enrollments::cohort_id.eq(Some(cohort_id.value())))
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("bind_enrollment_cohort"))?;
            Enrollment::try_from(row)
        })
        .await
    }

    async fn update_enrollment_status(
        &self,
        enrollment_id: EnrollmentId,
        status: EnrollmentStatus,
    ) -> RepositoryResult<Enrollment> {
        self.with_conn(move |conn| {
            let row: EnrollmentRow = diesel::update(enrollments::table.find(enrollment_id.value()))
                .set(enrollments::status.eq(status.to_string()))
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("update_enrollment_status"))?;
            Enrollment::try_from(row)
        })
        .await
    }
}

#[async_trait]
impl CohortRepository for PostgresRepository {
    async fn create_cohort(&self, new: NewCohort) -> RepositoryResult<Cohort> {
        if new.capacity == 0 {
            return Err(RepositoryError::validation_with_context(
                "Cohort capacity must be strictly positive",
                ErrorContext::new("create_cohort").with_entity("cohort"),
            ));
        }
        self.with_conn(move |conn| {
            let row = NewCohortRow {
                course_id: new.course_id.value(),
                name: new.name.clone(),
                capacity: new.capacity as i32,
                start_date: new.start_date,
                end_date: new.end_date,
                instructor: new.instructor.clone(),
                is_active: true,
            };
            let inserted: CohortRow = diesel::insert_into(cohorts::table)
                .values(&row)
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("create_cohort"))?;
            Ok(Cohort::from(inserted))
        })
        .await
    }

    async fn get_cohort(&self, id: CohortId) -> RepositoryResult<Cohort> {
        self.with_conn(move |conn| {
            let row: CohortRow = cohorts::table
                .find(id.value())
                .first(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("get_cohort"))?;
            Ok(Cohort::from(row))
        })
        .await
    }

    async fn list_course_cohorts(&self, course_id: CourseId) -> RepositoryResult<Vec<Cohort>> {
        self.with_conn(move |conn| {
            let rows: Vec<CohortRow> = cohorts::table
                .filter(cohorts::course_id.eq(course_id.value()))
                .order(cohorts::id.asc())
                .load(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("list_course_cohorts"))?;
            Ok(rows.into_iter().map(Cohort::from).collect())
        })
        .await
    }

    async fn count_cohort_occupancy(&self, cohort_id: CohortId) -> RepositoryResult<u32> {
        self.with_conn(move |conn| {
            let count: i64 = enrollments::table
                .filter(enrollments::cohort_id.eq(Some(cohort_id.value())))
                .filter(enrollments::status.eq_any(SEAT_HOLDING_ENROLLMENTS))
                .count()
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("count_cohort_occupancy"))?;
            Ok(count as u32)
        })
        .await
    }

    async fn list_cohort_enrollments(
        &self,
        cohort_id: CohortId,
    ) -> RepositoryResult<Vec<Enrollment>> {
        self.with_conn(move |conn| {
            let rows: Vec<EnrollmentRow> = enrollments::table
                .filter(enrollments::cohort_id.eq(Some(cohort_id.value())))
                .filter(enrollments::status.eq_any(SEAT_HOLDING_ENROLLMENTS))
                .order((enrollments::created_at.asc(), enrollments::id.asc()))
                .load(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("list_cohort_enrollments"))?;
            rows.into_iter().map(Enrollment::try_from).collect()
        })
        .await
    }

    async fn create_session(&self, new: NewSession) -> RepositoryResult<Session> {
        self.with_conn(move |conn| {
            // Number assignment and insert share one transaction so
            // concurrent schedulers cannot produce duplicate numbers.
            let inserted: SessionRow = conn.transaction(|conn| {
                let current: Option<i32> = sessions::table
                    .filter(sessions::cohort_id.eq(new.cohort_id.value()))
                    .select(max(sessions::session_number))
                    .first(conn)?;
                let row = NewSessionRow {
                    cohort_id: new.cohort_id.value(),
                    title: new.title.clone(),
                    session_number: current.unwrap_or(0) + 1,
                    start_time: new.start_time,
                    end_time: new.end_time,
                    location: new.location.clone(),
                    is_active: true,
                };
                diesel::insert_into(sessions::table)
                    .values(&row)
                    .get_result(conn)
            })
            .map_err(|e| RepositoryError::from(e).with_operation("create_session"))?;
            Ok(Session::from(inserted))
        })
        .await
    }

    async fn get_session(&self, id: SessionId) -> RepositoryResult<Session> {
        self.with_conn(move |conn| {
            let row: SessionRow = sessions::table
                .find(id.value())
                .first(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("get_session"))?;
            Ok(Session::from(row))
        })
        .await
    }

    async fn list_cohort_sessions(&self, cohort_id: CohortId) -> RepositoryResult<Vec<Session>> {
        self.with_conn(move |conn| {
            let rows: Vec<SessionRow> = sessions::table
                .filter(sessions::cohort_id.eq(cohort_id.value()))
                .order(sessions::session_number.asc())
                .load(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("list_cohort_sessions"))?;
            Ok(rows.into_iter().map(Session::from).collect())
        })
        .await
    }

    async fn list_sessions_on(
        &self,
        cohort_id: CohortId,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<Session>> {
        let day_start = date.and_time(NaiveTime::MIN).and_utc();
        let day_end = date
            .checked_add_days(chrono::Days::new(1))
            .ok_or_else(|| RepositoryError::validation("Date out of range"))?
            .and_time(NaiveTime::MIN)
            .and_utc();
        self.with_conn(move |conn| {
            let rows: Vec<SessionRow> = sessions::table
                .filter(sessions::cohort_id.eq(cohort_id.value()))
                .filter(sessions::start_time.ge(day_start))
                .filter(sessions::start_time.lt(day_end))
                .order(sessions::session_number.asc())
                .load(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("list_sessions_on"))?;
            Ok(rows.into_iter().map(Session::from).collect())
        })
        .await
    }

    async fn deactivate_session(&self, id: SessionId) -> RepositoryResult<Session> {
        self.with_conn(move |conn| {
            let row: SessionRow = diesel::update(sessions::table.find(id.value()))
                .set(sessions::is_active.eq(false))
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("deactivate_session"))?;
            Ok(Session::from(row))
        })
        .await
    }
}

#[async_trait]
impl LedgerRepository for PostgresRepository {
    async fn create_registration(&self, new: NewRegistration) -> RepositoryResult<Registration> {
        self.with_conn(move |conn| {
            let row = NewRegistrationRow {
                enrollment_id: new.enrollment_id.value(),
                session_id: new.session_id.value(),
                status: new.status.to_string(),
            };
            let inserted: RegistrationRow = diesel::insert_into(registrations::table)
                .values(&row)
                .get_result(conn)
                .map_err(|e| map_unique_violation(e, "create_registration"))?;
            Registration::try_from(inserted)
        })
        .await
    }

    async fn get_registration(&self, id: RegistrationId) -> RepositoryResult<Registration> {
        self.with_conn(move |conn| {
            let row: RegistrationRow = registrations::table
                .find(id.value())
                .first(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("get_registration"))?;
            Registration::try_from(row)
        })
        .await
    }

    async fn find_registration(
        &self,
        enrollment_id: EnrollmentId,
        session_id: SessionId,
    ) -> RepositoryResult<Option<Registration>> {
        self.with_conn(move |conn| {
            let row: Option<RegistrationRow> = registrations::table
                .filter(registrations::enrollment_id.eq(enrollment_id.value()))
                .filter(registrations::session_id.eq(session_id.value()))
                .first(conn)
                .optional()
                .map_err(|e| RepositoryError::from(e).with_operation("find_registration"))?;
            row.map(Registration::try_from).transpose()
        })
        .await
    }

    async fn list_session_registrations(
        &self,
        session_id: SessionId,
    ) -> RepositoryResult<Vec<Registration>> {
        self.with_conn(move |conn| {
            let rows: Vec<RegistrationRow> = registrations::table
                .filter(registrations::session_id.eq(session_id.value()))
                .order(registrations::id.asc())
                .load(conn)
                .map_err(|e| {
                    RepositoryError::from(e).with_operation("list_session_registrations")
                })?;
            rows.into_iter().map(Registration::try_from).collect()
        })
        .await
    }

    async fn list_enrollment_registrations(
        &self,
        enrollment_id: EnrollmentId,
    ) -> RepositoryResult<Vec<Registration>> {
        self.with_conn(move |conn| {
            let rows: Vec<RegistrationRow> = registrations::table
                .filter(registrations::enrollment_id.eq(enrollment_id.value()))
                .order(registrations::id.asc())
                .load(conn)
                .map_err(|e| {
                    RepositoryError::from(e).with_operation("list_enrollment_registrations")
                })?;
            rows.into_iter().map(Registration::try_from).collect()
        })
        .await
    }

    async fn count_session_seats(&self, session_id: SessionId) -> RepositoryResult<u32> {
        self.with_conn(move |conn| {
            let count: i64 = registrations::table
                .filter(registrations::session_id.eq(session_id.value()))
                .filter(registrations::status.eq_any(SEAT_HOLDING_REGISTRATIONS))
                .count()
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("count_session_seats"))?;
            Ok(count as u32)
        })
        .await
    }

    async fn update_registration_status(
        &self,
        id: RegistrationId,
        status: RegistrationStatus,
    ) -> RepositoryResult<Registration> {
        self.with_conn(move |conn| {
            let row: RegistrationRow = diesel::update(registrations::table.find(id.value()))
                .set(registrations::status.eq(status.to_string()))
                .get_result(conn)
                .map_err(|e| {
                    RepositoryError::from(e).with_operation("update_registration_status")
                })?;
            Registration::try_from(row)
        })
        .await
    }

    async fn find_attendance(
        &self,
        enrollment_id: EnrollmentId,
        session_id: SessionId,
    ) -> RepositoryResult<Option<AttendanceRecord>> {
        self.with_conn(move |conn| {
            let row: Option<AttendanceRow> = attendance_records::table
                .filter(attendance_records::enrollment_id.eq(enrollment_id.value()))
                .filter(attendance_records::session_id.eq(session_id.value()))
                .first(conn)
                .optional()
                .map_err(|e| RepositoryError::from(e).with_operation("find_attendance"))?;
            Ok(row.map(AttendanceRecord::from))
        })
        .await
    }

    async fn upsert_attendance(&self, mark: AttendanceMark) -> RepositoryResult<AttendanceRecord> {
        self.with_conn(move |conn| {
            let row = NewAttendanceRow {
                enrollment_id: mark.enrollment_id.value(),
                session_id: mark.session_id.value(),
                present: mark.present,
                note: mark.note.clone(),
                checked_in_at: mark.checked_in_at,
            };
            let upserted: AttendanceRow = diesel::insert_into(attendance_records::table)
                .values(&row)
                .on_conflict((
                    attendance_records::enrollment_id,
                    attendance_records::session_id,
                ))
                .do_update()
                .set((
                    attendance_records::present.eq(excluded(attendance_records::present)),
                    attendance_records::note.eq(excluded(attendance_records::note)),
                    attendance_records::checked_in_at
                        .eq(excluded(attendance_records::checked_in_at)),
                    attendance_records::recorded_at.eq(Utc::now()),
                ))
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("upsert_attendance"))?;
            Ok(AttendanceRecord::from(upserted))
        })
        .await
    }

    async fn list_cohort_attendance(
        &self,
        cohort_id: CohortId,
    ) -> RepositoryResult<Vec<AttendanceRecord>> {
        self.with_conn(move |conn| {
            let session_ids: Vec<i64> = sessions::table
                .filter(sessions::cohort_id.eq(cohort_id.value()))
                .select(sessions::id)
                .load(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("list_cohort_attendance"))?;
            let rows: Vec<AttendanceRow> = attendance_records::table
                .filter(attendance_records::session_id.eq_any(session_ids))
                .order(attendance_records::id.asc())
                .load(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("list_cohort_attendance"))?;
            Ok(rows.into_iter().map(AttendanceRecord::from).collect())
        })
        .await
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("health_check"))?;
            Ok(true)
        })
        .await
    }
}
