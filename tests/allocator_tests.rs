//! Integration tests for the cohort allocator: first-fit scanning,
//! overflow cohort creation, and failure semantics.

mod support;

use cohort_engine::db::repository::{CohortRepository, CourseRepository};
use cohort_engine::models::{EnrollmentStatus, Modality, NewCohort, NewCourse, NewEnrollment};
use cohort_engine::scheduling::{AssignmentOutcome, SchedulingEngine, SchedulingError};

use support::{repository, seed_course, seed_enrollments};

#[tokio::test]
async fn overflow_creation_sizing() {
    // capacity=25 per cohort, 0 existing cohorts, 60 pending enrollments
    // -> exactly ceil(60/25) = 3 cohorts
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let course = seed_course(repo.as_ref(), 25).await;
    seed_enrollments(repo.as_ref(), course.id, 60).await;

    let created = engine.ensure_capacity(course.id).await.unwrap();
    assert_eq!(created.len(), 3);

    let cohorts = repo.list_course_cohorts(course.id).await.unwrap();
    assert_eq!(cohorts.len(), 3);
    for (i, cohort) in cohorts.iter().enumerate() {
        assert_eq!(cohort.capacity, 25);
        assert_eq!(
            cohort.name,
            format!("Machining Fundamentals - Cohort {}", i + 1)
        );
        // Overflow cohorts inherit the course's default instructor.
        assert_eq!(cohort.instructor.as_deref(), Some("mara"));
    }
}

#[tokio::test]
async fn ensure_capacity_is_noop_when_room_exists() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let course = seed_course(repo.as_ref(), 25).await;
    seed_enrollments(repo.as_ref(), course.id, 10).await;

    let created = engine.ensure_capacity(course.id).await.unwrap();
    assert_eq!(created.len(), 1);

    // Second call: 10 enrollments against 25 seats, nothing to do.
    let created = engine.ensure_capacity(course.id).await.unwrap();
    assert!(created.is_empty());
}

#[tokio::test]
async fn first_fit_scans_cohorts_in_creation_order() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let course = seed_course(repo.as_ref(), 2).await;

    let first = repo
        .create_cohort(NewCohort {
            course_id: course.id,
            name: "Evening group".to_string(),
            capacity: 2,
            start_date: None,
            end_date: None,
            instructor: None,
        })
        .await
        .unwrap();
    let second = repo
        .create_cohort(NewCohort {
            course_id: course.id,
            name: "Weekend group".to_string(),
            capacity: 2,
            start_date: None,
            end_date: None,
            instructor: None,
        })
        .await
        .unwrap();

    let enrollments = seed_enrollments(repo.as_ref(), course.id, 3).await;
    let mut bound = Vec::new();
    for id in &enrollments {
        let outcome = engine.assign_enrollment_to_cohort(*id).await.unwrap();
        bound.push(outcome.cohort_id().unwrap());
    }

    // The first cohort fills completely before the second receives anyone.
    assert_eq!(bound, vec![first.id, first.id, second.id]);
}

#[tokio::test]
async fn assignment_creates_overflow_cohort_when_all_full() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let course = seed_course(repo.as_ref(), 1).await;
    let enrollments = seed_enrollments(repo.as_ref(), course.id, 2).await;

    let first = engine
        .assign_enrollment_to_cohort(enrollments[0])
        .await
        .unwrap();
    let second = engine
        .assign_enrollment_to_cohort(enrollments[1])
        .await
        .unwrap();

    let (Some(a), Some(b)) = (first.cohort_id(), second.cohort_id()) else {
        panic!("both enrollments must be bound");
    };
    assert_ne!(a, b);

    let cohorts = repo.list_course_cohorts(course.id).await.unwrap();
    assert_eq!(cohorts.len(), 2);
    assert_eq!(cohorts[1].name, "Machining Fundamentals - Cohort 2");
}

#[tokio::test]
async fn cohort_numbering_continues_from_existing_count() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let course = seed_course(repo.as_ref(), 1).await;

    // One staff-created cohort already exists.
    repo.create_cohort(NewCohort {
        course_id: course.id,
        name: "Pilot group".to_string(),
        capacity: 1,
        start_date: None,
        end_date: None,
        instructor: None,
    })
    .await
    .unwrap();

    seed_enrollments(repo.as_ref(), course.id, 2).await;
    let created = engine.ensure_capacity(course.id).await.unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "Machining Fundamentals - Cohort 2");
}

#[tokio::test]
async fn online_courses_are_not_applicable() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let course = repo
        .create_course(NewCourse {
            title: "Intro to Rust".to_string(),
            modality: Modality::Online,
            default_cohort_capacity: 25,
            instructor: None,
        })
        .await
        .unwrap();
    let enrollments = seed_enrollments(repo.as_ref(), course.id, 1).await;

    let outcome = engine
        .assign_enrollment_to_cohort(enrollments[0])
        .await
        .unwrap();
    assert_eq!(outcome, AssignmentOutcome::NotApplicable);

    // No cohorts get created for online courses.
    assert!(repo.list_course_cohorts(course.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn reassignment_returns_already_assigned() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let course = seed_course(repo.as_ref(), 5).await;
    let enrollments = seed_enrollments(repo.as_ref(), course.id, 1).await;

    let first = engine
        .assign_enrollment_to_cohort(enrollments[0])
        .await
        .unwrap();
    let cohort_id = first.cohort_id().unwrap();

    let second = engine
        .assign_enrollment_to_cohort(enrollments[0])
        .await
        .unwrap();
    assert_eq!(second, AssignmentOutcome::AlreadyAssigned { cohort_id });
}

#[tokio::test]
async fn completed_enrollments_free_their_seats() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let course = seed_course(repo.as_ref(), 1).await;
    let enrollments = seed_enrollments(repo.as_ref(), course.id, 1).await;

    let first = engine
        .assign_enrollment_to_cohort(enrollments[0])
        .await
        .unwrap();
    let cohort_id = first.cohort_id().unwrap();
    assert_eq!(engine.cohort_occupancy(cohort_id).await.unwrap(), 1);

    // Progress tracking completes the enrollment; the seat frees up.
    repo.update_enrollment_status(enrollments[0], EnrollmentStatus::Completed)
        .await
        .unwrap();
    assert_eq!(engine.cohort_occupancy(cohort_id).await.unwrap(), 0);

    // The next learner lands in the same cohort, no overflow needed.
    let next = seed_enrollments(repo.as_ref(), course.id, 1).await;
    let outcome = engine.assign_enrollment_to_cohort(next[0]).await.unwrap();
    assert_eq!(outcome, AssignmentOutcome::Assigned { cohort_id });
    assert_eq!(repo.list_course_cohorts(course.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn zero_default_capacity_is_rejected() {
    let repo = repository();
    let engine = SchedulingEngine::new(repo.clone());
    let course = repo
        .create_course(NewCourse {
            title: "Broken".to_string(),
            modality: Modality::Physical,
            default_cohort_capacity: 0,
            instructor: None,
        })
        .await
        .unwrap();
    let enrollment = repo
        .create_enrollment(NewEnrollment {
            course_id: course.id,
            learner: "ada".to_string(),
            status: EnrollmentStatus::Pending,
        })
        .await
        .unwrap();

    let err = engine
        .assign_enrollment_to_cohort(enrollment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidCapacity { .. }));
}

#[tokio::test]
async fn concurrent_assignments_never_overfill() {
    let repo = repository();
    let engine = std::sync::Arc::new(SchedulingEngine::new(repo.clone()));
    let course = seed_course(repo.as_ref(), 3).await;
    let enrollments = seed_enrollments(repo.as_ref(), course.id, 10).await;

    let mut handles = Vec::new();
    for id in enrollments {
        let engine = std::sync::Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.assign_enrollment_to_cohort(id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Every cohort holds at most its capacity.
    for cohort in repo.list_course_cohorts(course.id).await.unwrap() {
        let occupancy = repo.count_cohort_occupancy(cohort.id).await.unwrap();
        assert!(
            occupancy <= cohort.capacity,
            "cohort {} over capacity: {} > {}",
            cohort.id,
            occupancy,
            cohort.capacity
        );
    }
}
