//! Shared fixtures for integration tests.
#![allow(dead_code)] // not every test binary uses every helper

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use cohort_engine::api::{CourseId, EnrollmentId};
use cohort_engine::db::repository::{CourseRepository, FullRepository};
use cohort_engine::db::LocalRepository;
use cohort_engine::models::{Course, Modality, NewCourse, NewEnrollment};
use cohort_engine::scheduling::SchedulingEngine;

/// Engine over a fresh in-memory repository.
pub fn engine() -> SchedulingEngine {
    SchedulingEngine::new(repository())
}

pub fn repository() -> Arc<dyn FullRepository> {
    Arc::new(LocalRepository::new())
}

/// Seed a physical course with the given per-cohort capacity.
pub async fn seed_course(repo: &dyn FullRepository, capacity: u32) -> Course {
    repo.create_course(NewCourse {
        title: "Machining Fundamentals".to_string(),
        modality: Modality::Physical,
        default_cohort_capacity: capacity,
        instructor: Some("mara".to_string()),
    })
    .await
    .expect("seed course")
}

/// Seed `count` pending enrollments for a course, in order.
pub async fn seed_enrollments(
    repo: &dyn FullRepository,
    course_id: CourseId,
    count: usize,
) -> Vec<EnrollmentId> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let enrollment = repo
            .create_enrollment(NewEnrollment {
                course_id,
                learner: format!("learner-{:02}", i + 1),
                status: cohort_engine::models::EnrollmentStatus::Pending,
            })
            .await
            .expect("seed enrollment");
        ids.push(enrollment.id);
    }
    ids
}

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Panic-safe (restores variables on unwind) and serializes access to
/// process-global env vars so parallel tests do not interfere.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in &self.snapshot {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }
    }
}
