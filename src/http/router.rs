//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Courses
        .route("/courses", post(handlers::create_course))
        .route("/courses", get(handlers::list_courses))
        .route("/courses/{course_id}", get(handlers::get_course))
        .route("/courses/{course_id}/cohorts", get(handlers::list_course_cohorts))
        .route("/courses/{course_id}/occupancy", get(handlers::get_course_occupancy))
        .route("/courses/{course_id}/ensure-capacity", post(handlers::ensure_capacity))
        // Cohorts
        .route("/cohorts", post(handlers::create_cohort))
        .route("/cohorts/{cohort_id}", get(handlers::get_cohort))
        .route("/cohorts/{cohort_id}/sessions", get(handlers::list_cohort_sessions))
        .route("/cohorts/{cohort_id}/schedule-sessions", post(handlers::schedule_sessions))
        .route("/cohorts/{cohort_id}/attendance", get(handlers::list_cohort_attendance))
        // Enrollments
        .route("/enrollments", post(handlers::create_enrollment))
        .route("/enrollments/{enrollment_id}", get(handlers::get_enrollment))
        .route("/enrollments/{enrollment_id}/assign-cohort", post(handlers::assign_enrollment))
        .route("/enrollments/{enrollment_id}/status", put(handlers::update_enrollment_status))
        // Sessions and registrations
        .route("/sessions/{session_id}", get(handlers::get_session))
        .route("/sessions/{session_id}/register", post(handlers::register_for_session))
        .route("/sessions/{session_id}/registrations", get(handlers::list_session_registrations))
        .route("/registrations/{registration_id}", delete(handlers::cancel_registration))
        // Attendance
        .route("/attendance/mark", post(handlers::mark_attendance));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RepositoryFactory;

    #[test]
    fn test_router_creation() {
        let repo = RepositoryFactory::create_local();
        let state = AppState::new(repo);
        let _router = create_router(state);
        // If we got here, router was created successfully
    }
}
