//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! engine or the repository for business logic.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    AttendanceListResponse, CohortListResponse, CohortWithOccupancy, CourseListResponse,
    EnrollResponse, EnrollmentStatusRequest, EnsureCapacityResponse, HealthResponse,
    MarkAttendanceRequest, OccupancyResponse, RegisterRequest, RegistrationListResponse,
    ScheduleSessionsRequest, ScheduleSessionsResponse, SessionListResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{
    CohortId, CourseId, EnrollmentId, RegistrationId, SessionId,
};
use crate::db::repository::{CohortRepository, CourseRepository, LedgerRepository};
use crate::models::{
    AttendanceRecord, Cohort, Course, Enrollment, NewCohort, NewCourse, NewEnrollment,
    Registration, Session,
};
use crate::scheduling::SessionPlan;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and storage is
/// accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Courses
// =============================================================================

/// POST /v1/courses
pub async fn create_course(
    State(state): State<AppState>,
    Json(request): Json<NewCourse>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = state.repository.create_course(request).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// GET /v1/courses
pub async fn list_courses(State(state): State<AppState>) -> HandlerResult<CourseListResponse> {
    let courses = state.repository.list_courses().await?;
    let total = courses.len();
    Ok(Json(CourseListResponse { courses, total }))
}

/// GET /v1/courses/{course_id}
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> HandlerResult<Course> {
    let course = state.repository.get_course(CourseId::new(course_id)).await?;
    Ok(Json(course))
}

/// GET /v1/courses/{course_id}/cohorts
pub async fn list_course_cohorts(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> HandlerResult<CohortListResponse> {
    let course_id = CourseId::new(course_id);
    // Surface 404 for unknown courses rather than an empty list.
    state.repository.get_course(course_id).await?;

    let cohorts = state.repository.list_course_cohorts(course_id).await?;
    let mut with_occupancy = Vec::with_capacity(cohorts.len());
    for cohort in cohorts {
        let occupancy = state.repository.count_cohort_occupancy(cohort.id).await?;
        let available_slots = cohort.available_slots(occupancy);
        with_occupancy.push(CohortWithOccupancy {
            cohort,
            occupancy,
            available_slots,
        });
    }
    let total = with_occupancy.len();
    Ok(Json(CohortListResponse {
        cohorts: with_occupancy,
        total,
    }))
}

/// GET /v1/courses/{course_id}/occupancy
///
/// Read-only occupancy view for external progress tracking.
pub async fn get_course_occupancy(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> HandlerResult<OccupancyResponse> {
    let occupancy = state
        .engine
        .course_occupancy(CourseId::new(course_id))
        .await?;
    Ok(Json(OccupancyResponse { occupancy }))
}

/// POST /v1/courses/{course_id}/ensure-capacity
///
/// Staff trigger: create the overflow cohorts needed to absorb current
/// occupancy, if any.
pub async fn ensure_capacity(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> HandlerResult<EnsureCapacityResponse> {
    let created = state.engine.ensure_capacity(CourseId::new(course_id)).await?;
    Ok(Json(EnsureCapacityResponse {
        message: format!("Created {} cohort(s)", created.len()),
        created,
    }))
}

// =============================================================================
// Cohorts
// =============================================================================

/// POST /v1/cohorts
///
/// Manual staff cohort creation. Capacity must be strictly positive.
pub async fn create_cohort(
    State(state): State<AppState>,
    Json(request): Json<NewCohort>,
) -> Result<(StatusCode, Json<Cohort>), AppError> {
    let cohort = state.repository.create_cohort(request).await?;
    Ok((StatusCode::CREATED, Json(cohort)))
}

/// GET /v1/cohorts/{cohort_id}
pub async fn get_cohort(
    State(state): State<AppState>,
    Path(cohort_id): Path<i64>,
) -> HandlerResult<Cohort> {
    let cohort = state.repository.get_cohort(CohortId::new(cohort_id)).await?;
    Ok(Json(cohort))
}

/// GET /v1/cohorts/{cohort_id}/sessions
pub async fn list_cohort_sessions(
    State(state): State<AppState>,
    Path(cohort_id): Path<i64>,
) -> HandlerResult<SessionListResponse> {
    let cohort_id = CohortId::new(cohort_id);
    state.repository.get_cohort(cohort_id).await?;

    let sessions = state.repository.list_cohort_sessions(cohort_id).await?;
    let total = sessions.len();
    Ok(Json(SessionListResponse { sessions, total }))
}

/// POST /v1/cohorts/{cohort_id}/schedule-sessions
///
/// On-demand scheduling trigger for "today"/"tomorrow". Reports the count
/// of sessions created; idempotent per (cohort, date).
pub async fn schedule_sessions(
    State(state): State<AppState>,
    Path(cohort_id): Path<i64>,
    Json(request): Json<ScheduleSessionsRequest>,
) -> Result<(StatusCode, Json<ScheduleSessionsResponse>), AppError> {
    let plan = SessionPlan {
        session_duration_hours: request.session_duration_hours,
        time_slots: request.time_slots,
    };
    let day = state
        .engine
        .schedule_sessions(CohortId::new(cohort_id), request.session_date, plan)
        .await?;

    let created_count = if day.newly_created { day.sessions.len() } else { 0 };
    let status = if day.newly_created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(ScheduleSessionsResponse {
            message: format!("Created {} sessions", created_count),
            created: day.newly_created,
            registrations_created: day.registrations.len(),
            sessions: day.sessions,
        }),
    ))
}

/// GET /v1/cohorts/{cohort_id}/attendance
pub async fn list_cohort_attendance(
    State(state): State<AppState>,
    Path(cohort_id): Path<i64>,
) -> HandlerResult<AttendanceListResponse> {
    let cohort_id = CohortId::new(cohort_id);
    state.repository.get_cohort(cohort_id).await?;

    let records = state.repository.list_cohort_attendance(cohort_id).await?;
    let total = records.len();
    Ok(Json(AttendanceListResponse { records, total }))
}

// =============================================================================
// Enrollments
// =============================================================================

/// POST /v1/enrollments
///
/// Create an enrollment and synchronously run cohort allocation, the way
/// the external checkout flow does once payment settles.
pub async fn create_enrollment(
    State(state): State<AppState>,
    Json(request): Json<NewEnrollment>,
) -> Result<(StatusCode, Json<EnrollResponse>), AppError> {
    let enrollment = state.repository.create_enrollment(request).await?;
    let assignment = state
        .engine
        .assign_enrollment_to_cohort(enrollment.id)
        .await?;
    // Re-read to reflect the cohort binding.
    let enrollment = state.repository.get_enrollment(enrollment.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(EnrollResponse {
            enrollment,
            assignment,
        }),
    ))
}

/// GET /v1/enrollments/{enrollment_id}
pub async fn get_enrollment(
    State(state): State<AppState>,
    Path(enrollment_id): Path<i64>,
) -> HandlerResult<Enrollment> {
    let enrollment = state
        .repository
        .get_enrollment(EnrollmentId::new(enrollment_id))
        .await?;
    Ok(Json(enrollment))
}

/// POST /v1/enrollments/{enrollment_id}/assign-cohort
///
/// Retry entry point for a failed or deferred allocation.
pub async fn assign_enrollment(
    State(state): State<AppState>,
    Path(enrollment_id): Path<i64>,
) -> HandlerResult<EnrollResponse> {
    let enrollment_id = EnrollmentId::new(enrollment_id);
    let assignment = state
        .engine
        .assign_enrollment_to_cohort(enrollment_id)
        .await?;
    let enrollment = state.repository.get_enrollment(enrollment_id).await?;
    Ok(Json(EnrollResponse {
        enrollment,
        assignment,
    }))
}

/// PUT /v1/enrollments/{enrollment_id}/status
///
/// Progress-tracking callback: completed/cancelled enrollments stop
/// counting toward cohort occupancy.
pub async fn update_enrollment_status(
    State(state): State<AppState>,
    Path(enrollment_id): Path<i64>,
    Json(request): Json<EnrollmentStatusRequest>,
) -> HandlerResult<Enrollment> {
    let enrollment = state
        .repository
        .update_enrollment_status(EnrollmentId::new(enrollment_id), request.status)
        .await?;
    Ok(Json(enrollment))
}

// =============================================================================
// Sessions and Registrations
// =============================================================================

/// GET /v1/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> HandlerResult<Session> {
    let session = state.repository.get_session(SessionId::new(session_id)).await?;
    Ok(Json(session))
}

/// POST /v1/sessions/{session_id}/register
///
/// Direct learner registration. Idempotent; 409 when the session is full.
pub async fn register_for_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Registration>), AppError> {
    let registration = state
        .engine
        .register(request.enrollment_id, SessionId::new(session_id))
        .await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

/// GET /v1/sessions/{session_id}/registrations
pub async fn list_session_registrations(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> HandlerResult<RegistrationListResponse> {
    let session_id = SessionId::new(session_id);
    state.repository.get_session(session_id).await?;

    let registrations = state
        .repository
        .list_session_registrations(session_id)
        .await?;
    let total = registrations.len();
    Ok(Json(RegistrationListResponse {
        registrations,
        total,
    }))
}

/// DELETE /v1/registrations/{registration_id}
///
/// Cancel a registration. The row is kept with status `cancelled`.
pub async fn cancel_registration(
    State(state): State<AppState>,
    Path(registration_id): Path<i64>,
) -> HandlerResult<Registration> {
    let registration = state
        .engine
        .cancel_registration(RegistrationId::new(registration_id))
        .await?;
    Ok(Json(registration))
}

// =============================================================================
// Attendance
// =============================================================================

/// POST /v1/attendance/mark
///
/// Staff check-in endpoint. Upserts the single attendance record for the
/// (enrollment, session) pair.
pub async fn mark_attendance(
    State(state): State<AppState>,
    Json(request): Json<MarkAttendanceRequest>,
) -> HandlerResult<AttendanceRecord> {
    let record = state
        .engine
        .mark_attendance(
            request.enrollment_id,
            request.session_id,
            request.present,
            request.note,
        )
        .await?;
    Ok(Json(record))
}
