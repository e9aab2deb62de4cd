//! Repository trait definitions.
//!
//! The engine talks to storage exclusively through these traits so that
//! backends can be swapped: an in-memory implementation for unit testing
//! and local development, and a Postgres implementation for production.
//!
//! Traits are split per concern: [`CourseRepository`] for the externally
//! driven course/enrollment rows, [`CohortRepository`] for cohorts and
//! sessions, and [`LedgerRepository`] for registrations and attendance.
//! [`FullRepository`] is the umbrella bound the engine and HTTP layer use.

pub mod error;

use async_trait::async_trait;
use chrono::NaiveDate;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::api::{CohortId, CourseId, EnrollmentId, RegistrationId, SessionId};
use crate::models::{
    AttendanceMark, AttendanceRecord, Cohort, Course, Enrollment, EnrollmentStatus, NewCohort,
    NewCourse, NewEnrollment, NewRegistration, NewSession, Registration, RegistrationStatus,
    Session,
};

/// Repository operations for courses and enrollments.
///
/// Courses and enrollments are owned by external flows (catalog management
/// and checkout); the engine reads them and mutates only the
/// enrollment→cohort binding and, on behalf of progress tracking, the
/// enrollment status.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Insert a course row.
    async fn create_course(&self, new: NewCourse) -> RepositoryResult<Course>;

    /// Fetch a course by id.
    async fn get_course(&self, id: CourseId) -> RepositoryResult<Course>;

    /// List all courses.
    async fn list_courses(&self) -> RepositoryResult<Vec<Course>>;

    /// Insert an enrollment row (no cohort bound yet).
    async fn create_enrollment(&self, new: NewEnrollment) -> RepositoryResult<Enrollment>;

    /// Fetch an enrollment by id.
    async fn get_enrollment(&self, id: EnrollmentId) -> RepositoryResult<Enrollment>;

    /// List a course's enrollments, ordered by creation time ascending.
    async fn list_course_enrollments(&self, course_id: CourseId)
        -> RepositoryResult<Vec<Enrollment>>;

    /// Count a course's pending/active enrollments (its occupancy).
    async fn count_course_occupancy(&self, course_id: CourseId) -> RepositoryResult<u32>;

    /// Bind an enrollment to a cohort. Fails if the enrollment does not
    /// exist; overwrites any previous binding.
    async fn bind_enrollment_cohort(
        &self,
        enrollment_id: EnrollmentId,
        cohort_id: CohortId,
    ) -> RepositoryResult<Enrollment>;

    /// Update an enrollment's lifecycle status (progress-tracking callback).
    async fn update_enrollment_status(
        &self,
        enrollment_id: EnrollmentId,
        status: EnrollmentStatus,
    ) -> RepositoryResult<Enrollment>;
}

/// Repository operations for cohorts and their sessions.
#[async_trait]
pub trait CohortRepository: Send + Sync {
    /// Insert a cohort row. Rejects capacity of zero with a validation
    /// error; capacity is immutable afterwards.
    async fn create_cohort(&self, new: NewCohort) -> RepositoryResult<Cohort>;

    /// Fetch a cohort by id.
    async fn get_cohort(&self, id: CohortId) -> RepositoryResult<Cohort>;

    /// List a course's cohorts in creation order.
    async fn list_course_cohorts(&self, course_id: CourseId) -> RepositoryResult<Vec<Cohort>>;

    /// Count a cohort's pending/active enrollments (its occupancy).
    async fn count_cohort_occupancy(&self, cohort_id: CohortId) -> RepositoryResult<u32>;

    /// List a cohort's pending/active enrollments, ordered by creation
    /// time ascending (the round-robin assignment order).
    async fn list_cohort_enrollments(&self, cohort_id: CohortId)
        -> RepositoryResult<Vec<Enrollment>>;

    /// Insert a session row, assigning the next session number in the
    /// cohort's sequence within the same critical section as the insert.
    async fn create_session(&self, new: NewSession) -> RepositoryResult<Session>;

    /// Fetch a session by id.
    async fn get_session(&self, id: SessionId) -> RepositoryResult<Session>;

    /// List a cohort's sessions ordered by session number.
    async fn list_cohort_sessions(&self, cohort_id: CohortId) -> RepositoryResult<Vec<Session>>;

    /// List a cohort's sessions starting on the given calendar date,
    /// ordered by session number.
    async fn list_sessions_on(
        &self,
        cohort_id: CohortId,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<Session>>;

    /// Deactivate a session. Sessions are never deleted.
    async fn deactivate_session(&self, id: SessionId) -> RepositoryResult<Session>;
}

/// Repository operations for the registration/attendance ledger.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Insert a registration row. Fails with a validation error if a row
    /// already exists for the (enrollment, session) pair.
    async fn create_registration(&self, new: NewRegistration) -> RepositoryResult<Registration>;

    /// Fetch a registration by id.
    async fn get_registration(&self, id: RegistrationId) -> RepositoryResult<Registration>;

    /// Find the registration for an (enrollment, session) pair, if any.
    async fn find_registration(
        &self,
        enrollment_id: EnrollmentId,
        session_id: SessionId,
    ) -> RepositoryResult<Option<Registration>>;

    /// List a session's registrations, all statuses.
    async fn list_session_registrations(
        &self,
        session_id: SessionId,
    ) -> RepositoryResult<Vec<Registration>>;

    /// List an enrollment's registrations, all statuses.
    async fn list_enrollment_registrations(
        &self,
        enrollment_id: EnrollmentId,
    ) -> RepositoryResult<Vec<Registration>>;

    /// Count a session's seat-holding registrations (registered or
    /// attended).
    async fn count_session_seats(&self, session_id: SessionId) -> RepositoryResult<u32>;

    /// Update a registration's status.
    async fn update_registration_status(
        &self,
        id: RegistrationId,
        status: RegistrationStatus,
    ) -> RepositoryResult<Registration>;

    /// Find the attendance record for an (enrollment, session) pair, if
    /// any.
    async fn find_attendance(
        &self,
        enrollment_id: EnrollmentId,
        session_id: SessionId,
    ) -> RepositoryResult<Option<AttendanceRecord>>;

    /// Insert or overwrite the single attendance record for the pair.
    async fn upsert_attendance(&self, mark: AttendanceMark) -> RepositoryResult<AttendanceRecord>;

    /// List attendance records for all sessions of a cohort.
    async fn list_cohort_attendance(
        &self,
        cohort_id: CohortId,
    ) -> RepositoryResult<Vec<AttendanceRecord>>;

    /// Check that the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}

/// Umbrella trait for backends implementing every repository concern.
pub trait FullRepository: CourseRepository + CohortRepository + LedgerRepository {}

impl<T> FullRepository for T where T: CourseRepository + CohortRepository + LedgerRepository {}
