//! Integration tests for session scheduling and round-robin assignment.

mod support;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Timelike};
use cohort_engine::api::{EnrollmentId, SessionId};
use cohort_engine::db::repository::{
    CohortRepository, CourseRepository, FullRepository, LedgerRepository,
};
use cohort_engine::scheduling::{
    SchedulingEngine, SchedulingError, SessionPlan, StaticLocations,
};

use support::{repository, seed_course, seed_enrollments};

fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

/// Seed one cohort of the given capacity with `n` enrollments bound to it
/// directly, the way staff over-assign a batch that then needs splitting
/// into parallel sessions.
async fn seeded_cohort(
    repo: &Arc<dyn FullRepository>,
    _engine: &SchedulingEngine,
    capacity: u32,
    n: usize,
) -> (cohort_engine::api::CohortId, Vec<EnrollmentId>) {
    let course = seed_course(repo.as_ref(), capacity).await;
    let cohort = repo
        .create_cohort(cohort_engine::models::NewCohort {
            course_id: course.id,
            name: "Machining Fundamentals - Cohort 1".to_string(),
            capacity,
            start_date: None,
            end_date: None,
            instructor: course.instructor.clone(),
        })
        .await
        .unwrap();
    let enrollments = seed_enrollments(repo.as_ref(), course.id, n).await;
    for id in &enrollments {
        repo.bind_enrollment_cohort(*id, cohort.id).await.unwrap();
    }
    (cohort.id, enrollments)
}

/// Map session id -> registered enrollment ids, insertion-ordered.
async fn roster(
    repo: &Arc<dyn FullRepository>,
    sessions: &[cohort_engine::models::Session],
) -> HashMap<SessionId, Vec<EnrollmentId>> {
    let mut by_session = HashMap::new();
    for session in sessions {
        let regs = repo.list_session_registrations(session.id).await.unwrap();
        by_session.insert(
            session.id,
            regs.into_iter().map(|r| r.enrollment_id).collect(),
        );
    }
    by_session
}

#[tokio::test]
async fn five_enrollments_capacity_two_yields_three_monotonic_sessions() {
    // Cohort capacity 2, enrollments E1..E5 created in order:
    // ceil(5/2) = 3 sessions; S1={E1,E2}, S2={E3,E4}, S3={E5}.
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let (cohort_id, enrollments) = seeded_cohort(&repo, &engine, 2, 5).await;

    let day = engine
        .schedule_sessions(cohort_id, june_first(), SessionPlan::default())
        .await
        .unwrap();

    assert!(day.newly_created);
    assert_eq!(day.sessions.len(), 3);
    assert_eq!(day.registrations.len(), 5);

    let rosters = roster(&repo, &day.sessions).await;
    assert_eq!(rosters[&day.sessions[0].id], enrollments[0..2].to_vec());
    assert_eq!(rosters[&day.sessions[1].id], enrollments[2..4].to_vec());
    assert_eq!(rosters[&day.sessions[2].id], enrollments[4..5].to_vec());
}

#[tokio::test]
async fn scheduling_twice_is_idempotent() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let (cohort_id, _) = seeded_cohort(&repo, &engine, 2, 5).await;

    let first = engine
        .schedule_sessions(cohort_id, june_first(), SessionPlan::default())
        .await
        .unwrap();
    let second = engine
        .schedule_sessions(cohort_id, june_first(), SessionPlan::default())
        .await
        .unwrap();

    assert!(first.newly_created);
    assert!(!second.newly_created);
    assert!(second.registrations.is_empty());
    let first_ids: Vec<SessionId> = first.sessions.iter().map(|s| s.id).collect();
    let second_ids: Vec<SessionId> = second.sessions.iter().map(|s| s.id).collect();
    assert_eq!(first_ids, second_ids);
}

#[tokio::test]
async fn zero_occupancy_schedules_nothing() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let course = seed_course(repo.as_ref(), 4).await;
    let cohort = repo
        .create_cohort(cohort_engine::models::NewCohort {
            course_id: course.id,
            name: "Empty cohort".to_string(),
            capacity: 4,
            start_date: None,
            end_date: None,
            instructor: None,
        })
        .await
        .unwrap();

    let day = engine
        .schedule_sessions(cohort.id, june_first(), SessionPlan::default())
        .await
        .unwrap();
    assert!(day.sessions.is_empty());
    assert!(day.registrations.is_empty());
}

#[tokio::test]
async fn default_slots_start_at_fourteen_and_step_by_duration() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let (cohort_id, _) = seeded_cohort(&repo, &engine, 2, 5).await;

    let day = engine
        .schedule_sessions(cohort_id, june_first(), SessionPlan::default())
        .await
        .unwrap();

    let hours: Vec<u32> = day.sessions.iter().map(|s| s.start_time.hour()).collect();
    assert_eq!(hours, vec![14, 16, 18]);
    for session in &day.sessions {
        assert_eq!(session.date(), june_first());
        assert_eq!(
            (session.end_time - session.start_time).num_hours(),
            2,
            "default duration is two hours"
        );
    }
}

#[tokio::test]
async fn explicit_time_slots_override_generation() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let (cohort_id, _) = seeded_cohort(&repo, &engine, 2, 4).await;

    let plan = SessionPlan {
        session_duration_hours: 3,
        time_slots: Some(vec!["09:30".to_string(), "13:00".to_string()]),
    };
    let day = engine
        .schedule_sessions(cohort_id, june_first(), plan)
        .await
        .unwrap();

    assert_eq!(day.sessions.len(), 2);
    assert_eq!(day.sessions[0].start_time.hour(), 9);
    assert_eq!(day.sessions[0].start_time.minute(), 30);
    assert_eq!(day.sessions[1].start_time.hour(), 13);
    assert_eq!(
        (day.sessions[0].end_time - day.sessions[0].start_time).num_hours(),
        3
    );
}

#[tokio::test]
async fn malformed_time_slot_is_rejected() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let (cohort_id, _) = seeded_cohort(&repo, &engine, 2, 3).await;

    let plan = SessionPlan {
        session_duration_hours: 2,
        time_slots: Some(vec!["25:99".to_string()]),
    };
    let err = engine
        .schedule_sessions(cohort_id, june_first(), plan)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidTimeSlot(_)));

    // Nothing was created by the failed pass.
    assert!(repo
        .list_cohort_sessions(cohort_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn fewer_slots_than_needed_leaves_remainder_unassigned() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let (cohort_id, enrollments) = seeded_cohort(&repo, &engine, 2, 5).await;

    // ceil(5/2) = 3 sessions needed but only one slot supplied.
    let plan = SessionPlan {
        session_duration_hours: 2,
        time_slots: Some(vec!["14:00".to_string()]),
    };
    let day = engine
        .schedule_sessions(cohort_id, june_first(), plan)
        .await
        .unwrap();

    assert_eq!(day.sessions.len(), 1);
    // The single session fills to capacity; the rest wait for a later pass.
    assert_eq!(day.registrations.len(), 2);
    let rosters = roster(&repo, &day.sessions).await;
    assert_eq!(rosters[&day.sessions[0].id], enrollments[0..2].to_vec());
}

#[tokio::test]
async fn session_titles_embed_sequence_and_date() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let (cohort_id, _) = seeded_cohort(&repo, &engine, 2, 3).await;

    let day = engine
        .schedule_sessions(cohort_id, june_first(), SessionPlan::default())
        .await
        .unwrap();
    assert_eq!(day.sessions[0].title, "Session 1 - June 01, 2024");
    assert_eq!(day.sessions[1].title, "Session 2 - June 01, 2024");
}

#[tokio::test]
async fn session_numbers_continue_across_dates() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let (cohort_id, _) = seeded_cohort(&repo, &engine, 2, 4).await;

    let day_one = engine
        .schedule_sessions(cohort_id, june_first(), SessionPlan::default())
        .await
        .unwrap();
    let day_two = engine
        .schedule_sessions(
            cohort_id,
            NaiveDate::from_ymd_opt(2024, 6, 2).expect("valid date"),
            SessionPlan::default(),
        )
        .await
        .unwrap();

    let numbers: Vec<u32> = day_one
        .sessions
        .iter()
        .chain(day_two.sessions.iter())
        .map(|s| s.session_number)
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn location_comes_from_instructor_directory() {
    let repo = repository();
    let locations = StaticLocations::new().with("mara", "Workshop B");
    let engine = SchedulingEngine::with_locations(repo.clone(), Arc::new(locations));
    // seed_course sets instructor "mara"; overflow cohorts inherit it.
    let (cohort_id, _) = seeded_cohort(&repo, &engine, 2, 2).await;

    let day = engine
        .schedule_sessions(cohort_id, june_first(), SessionPlan::default())
        .await
        .unwrap();
    assert_eq!(day.sessions[0].location, "Workshop B");
}

#[tokio::test]
async fn unknown_instructor_defaults_to_empty_location() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let (cohort_id, _) = seeded_cohort(&repo, &engine, 2, 2).await;

    let day = engine
        .schedule_sessions(cohort_id, june_first(), SessionPlan::default())
        .await
        .unwrap();
    assert_eq!(day.sessions[0].location, "");
}

#[tokio::test]
async fn assignment_pass_skips_existing_registrations() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    // ceil(3/2) = 2 sessions: S1={E1,E2} full, S2={E3} with one free seat.
    let (cohort_id, enrollments) = seeded_cohort(&repo, &engine, 2, 3).await;

    let day = engine
        .schedule_sessions(cohort_id, june_first(), SessionPlan::default())
        .await
        .unwrap();
    assert_eq!(day.registrations.len(), 3);

    // Re-running the assigner over the same sessions creates nothing new.
    let cohort = repo.get_cohort(cohort_id).await.unwrap();
    let again = engine
        .assign_to_sessions(&cohort, &day.sessions)
        .await
        .unwrap();
    assert!(again.is_empty());

    // A newcomer lands in the first session with a free seat; earlier
    // enrollments keep their original placement.
    let newcomer = seed_enrollments(repo.as_ref(), cohort.course_id, 1).await;
    repo.bind_enrollment_cohort(newcomer[0], cohort_id)
        .await
        .unwrap();
    let third_pass = engine
        .assign_to_sessions(&cohort, &day.sessions)
        .await
        .unwrap();
    assert_eq!(third_pass.len(), 1);
    assert_eq!(third_pass[0].enrollment_id, newcomer[0]);
    assert_eq!(third_pass[0].session_id, day.sessions[1].id);
    let rosters = roster(&repo, &day.sessions).await;
    assert_eq!(rosters[&day.sessions[0].id], enrollments[0..2].to_vec());
    assert_eq!(
        rosters[&day.sessions[1].id],
        vec![enrollments[2], newcomer[0]]
    );
}

#[tokio::test]
async fn capacity_invariant_holds_after_scheduling() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let (cohort_id, _) = seeded_cohort(&repo, &engine, 3, 8).await;

    let day = engine
        .schedule_sessions(cohort_id, june_first(), SessionPlan::default())
        .await
        .unwrap();
    let cohort = repo.get_cohort(cohort_id).await.unwrap();
    for session in &day.sessions {
        let seats = repo.count_session_seats(session.id).await.unwrap();
        assert!(seats <= cohort.capacity);
    }
}
