//! Diesel row models and conversions to domain entities.
//!
//! Status enums are stored as lowercase text columns; conversions fail
//! with an internal repository error if a row carries an unknown value.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use super::schema::{attendance_records, cohorts, courses, enrollments, registrations, sessions};
use crate::api::{
    AttendanceId, CohortId, CourseId, EnrollmentId, RegistrationId, SessionId,
};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{
    AttendanceRecord, Cohort, Course, Enrollment, Registration, Session,
};

#[derive(Debug, Clone, Queryable)]
pub struct CourseRow {
    pub id: i64,
    pub title: String,
    pub modality: String,
    pub default_cohort_capacity: i32,
    pub instructor: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = courses)]
pub struct NewCourseRow {
    pub title: String,
    pub modality: String,
    pub default_cohort_capacity: i32,
    pub instructor: Option<String>,
    pub is_active: bool,
}

impl TryFrom<CourseRow> for Course {
    type Error = RepositoryError;

    fn try_from(row: CourseRow) -> RepositoryResult<Self> {
        Ok(Course {
            id: CourseId::new(row.id),
            title: row.title,
            modality: row
                .modality
                .parse()
                .map_err(RepositoryError::internal)?,
            default_cohort_capacity: row.default_cohort_capacity as u32,
            instructor: row.instructor,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable)]
pub struct CohortRow {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub capacity: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub instructor: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cohorts)]
pub struct NewCohortRow {
    pub course_id: i64,
    pub name: String,
    pub capacity: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub instructor: Option<String>,
    pub is_active: bool,
}

impl From<CohortRow> for Cohort {
    fn from(row: CohortRow) -> Self {
        Cohort {
            id: CohortId::new(row.id),
            course_id: CourseId::new(row.course_id),
            name: row.name,
            capacity: row.capacity as u32,
            start_date: row.start_date,
            end_date: row.end_date,
            instructor: row.instructor,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable)]
pub struct SessionRow {
    pub id: i64,
    pub cohort_id: i64,
    pub title: String,
    pub session_number: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSessionRow {
    pub cohort_id: i64,
    pub title: String,
    pub session_number: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
    pub is_active: bool,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: SessionId::new(row.id),
            cohort_id: CohortId::new(row.cohort_id),
            title: row.title,
            session_number: row.session_number as u32,
            start_time: row.start_time,
            end_time: row.end_time,
            location: row.location,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable)]
pub struct EnrollmentRow {
    pub id: i64,
    pub course_id: i64,
    pub cohort_id: Option<i64>,
    pub learner: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = enrollments)]
pub struct NewEnrollmentRow {
    pub course_id: i64,
    pub cohort_id: Option<i64>,
    pub learner: String,
    pub status: String,
}

impl TryFrom<EnrollmentRow> for Enrollment {
    type Error = RepositoryError;

    fn try_from(row: EnrollmentRow) -> RepositoryResult<Self> {
        Ok(Enrollment {
            id: EnrollmentId::new(row.id),
            course_id: CourseId::new(row.course_id),
            learner: row.learner,
            cohort_id: row.cohort_id.map(CohortId::new),
            status: row.status.parse().map_err(RepositoryError::internal)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable)]
pub struct RegistrationRow {
    pub id: i64,
    pub enrollment_id: i64,
    pub session_id: i64,
    pub status: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = registrations)]
pub struct NewRegistrationRow {
    pub enrollment_id: i64,
    pub session_id: i64,
    pub status: String,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = RepositoryError;

    fn try_from(row: RegistrationRow) -> RepositoryResult<Self> {
        Ok(Registration {
            id: RegistrationId::new(row.id),
            enrollment_id: EnrollmentId::new(row.enrollment_id),
            session_id: SessionId::new(row.session_id),
            status: row.status.parse().map_err(RepositoryError::internal)?,
            registered_at: row.registered_at,
        })
    }
}

#[derive(Debug, Clone, Queryable)]
pub struct AttendanceRow {
    pub id: i64,
    pub enrollment_id: i64,
    pub session_id: i64,
    pub present: bool,
    pub note: String,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = attendance_records)]
pub struct NewAttendanceRow {
    pub enrollment_id: i64,
    pub session_id: i64,
    pub present: bool,
    pub note: String,
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        AttendanceRecord {
            id: AttendanceId::new(row.id),
            enrollment_id: EnrollmentId::new(row.enrollment_id),
            session_id: SessionId::new(row.session_id),
            present: row.present,
            note: row.note,
            checked_in_at: row.checked_in_at,
            recorded_at: row.recorded_at,
        }
    }
}
