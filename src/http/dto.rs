//! Data Transfer Objects for the HTTP API.
//!
//! Insert payloads (`NewCourse`, `NewCohort`, `NewEnrollment`) already
//! derive Serialize/Deserialize and double as request bodies; this module
//! adds the request/response shapes that have no entity counterpart.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::{EnrollmentId, SessionId};
use crate::models::{
    AttendanceRecord, Cohort, Course, Enrollment, EnrollmentStatus, Registration, Session,
};
use crate::scheduling::AssignmentOutcome;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Course list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseListResponse {
    pub courses: Vec<Course>,
    pub total: usize,
}

/// Cohort list response with per-cohort occupancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortListResponse {
    pub cohorts: Vec<CohortWithOccupancy>,
    pub total: usize,
}

/// A cohort together with its current occupancy and remaining seats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortWithOccupancy {
    #[serde(flatten)]
    pub cohort: Cohort,
    pub occupancy: u32,
    pub available_slots: u32,
}

/// Occupancy summary for a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancyResponse {
    pub occupancy: u32,
}

/// Response for enrollment creation: the row plus the allocator outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollResponse {
    pub enrollment: Enrollment,
    pub assignment: AssignmentOutcome,
}

/// Request body for an enrollment status update (progress tracking).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentStatusRequest {
    pub status: EnrollmentStatus,
}

/// Request body for the on-demand scheduling trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSessionsRequest {
    /// Date to schedule, `YYYY-MM-DD`
    pub session_date: NaiveDate,
    /// Duration of each session in hours (default: 2)
    #[serde(default = "default_session_duration")]
    pub session_duration_hours: u32,
    /// Explicit `HH:MM` start slots (default: generated from 14:00)
    #[serde(default)]
    pub time_slots: Option<Vec<String>>,
}

fn default_session_duration() -> u32 {
    2
}

/// Response for the scheduling trigger, reporting the created count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSessionsResponse {
    pub message: String,
    /// Whether this call created the sessions
    pub created: bool,
    pub sessions: Vec<Session>,
    /// Registrations created by the assignment pass
    pub registrations_created: usize,
}

/// Session list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
    pub total: usize,
}

/// Request body for a direct session registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub enrollment_id: EnrollmentId,
}

/// Registration list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationListResponse {
    pub registrations: Vec<Registration>,
    pub total: usize,
}

/// Request body for attendance marking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAttendanceRequest {
    pub enrollment_id: EnrollmentId,
    pub session_id: SessionId,
    #[serde(default)]
    pub present: bool,
    #[serde(default)]
    pub note: String,
}

/// Attendance list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceListResponse {
    pub records: Vec<AttendanceRecord>,
    pub total: usize,
}

/// Response for cohort creation via `ensure-capacity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsureCapacityResponse {
    pub message: String,
    pub created: Vec<Cohort>,
}
