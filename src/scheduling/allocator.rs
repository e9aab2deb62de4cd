//! Cohort allocator.
//!
//! Guarantees every pending/active enrollment in a physical/hybrid course
//! is bound to exactly one cohort with unexhausted capacity, creating new
//! cohorts only when the course's existing capacity cannot absorb its
//! occupancy.
//!
//! The policy is first-fit against cohorts in creation order, with
//! overflow creation at the margin: existing cohorts are never repacked
//! or resized, because they represent physical commitments (room,
//! instructor time) that must not change once learners may already be
//! scheduled into sessions under them.

use serde::{Deserialize, Serialize};

use crate::api::{CohortId, CourseId, EnrollmentId};
use crate::db::repository::{CohortRepository, CourseRepository};
use crate::models::{Cohort, Course, NewCohort};

use super::error::{SchedulingError, SchedulingResult};
use super::SchedulingEngine;

/// Result of a cohort assignment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignmentOutcome {
    /// The enrollment was bound to this cohort by this call.
    Assigned { cohort_id: CohortId },
    /// The enrollment already had a cohort; nothing changed.
    AlreadyAssigned { cohort_id: CohortId },
    /// The course is online-only; cohort allocation does not apply.
    NotApplicable,
}

impl AssignmentOutcome {
    /// The cohort the enrollment is bound to after this call, if any.
    pub fn cohort_id(&self) -> Option<CohortId> {
        match self {
            AssignmentOutcome::Assigned { cohort_id }
            | AssignmentOutcome::AlreadyAssigned { cohort_id } => Some(*cohort_id),
            AssignmentOutcome::NotApplicable => None,
        }
    }
}

impl SchedulingEngine {
    /// Bind an enrollment to the first active cohort of its course with a
    /// free seat, creating overflow cohorts if none has room.
    ///
    /// The occupancy read and the binding write run under the course's
    /// advisory lock so that two concurrent enrollments cannot both take
    /// the last seat of a cohort. If no cohort has room even after
    /// `ensure_capacity` ran (possible only under concurrent mutation
    /// outside this process), the call fails with
    /// [`SchedulingError::CapacityExhausted`] and must be retried by the
    /// caller; it never leaves the enrollment silently unassigned.
    pub async fn assign_enrollment_to_cohort(
        &self,
        enrollment_id: EnrollmentId,
    ) -> SchedulingResult<AssignmentOutcome> {
        let enrollment = self.repo.get_enrollment(enrollment_id).await?;
        let course = self.repo.get_course(enrollment.course_id).await?;

        if !course.modality.is_cohort_based() {
            return Ok(AssignmentOutcome::NotApplicable);
        }
        if let Some(cohort_id) = enrollment.cohort_id {
            return Ok(AssignmentOutcome::AlreadyAssigned { cohort_id });
        }

        let _guard = self.locks.acquire(format!("course:{}", course.id)).await;

        if let Some(cohort) = self.find_open_cohort(&course).await? {
            self.repo
                .bind_enrollment_cohort(enrollment.id, cohort.id)
                .await?;
            log::debug!(
                "bound enrollment {} to cohort {} ({})",
                enrollment.id,
                cohort.id,
                cohort.name
            );
            return Ok(AssignmentOutcome::Assigned { cohort_id: cohort.id });
        }

        // No room anywhere: grow capacity at the margin and rescan once.
        self.ensure_capacity_locked(&course).await?;

        if let Some(cohort) = self.find_open_cohort(&course).await? {
            self.repo
                .bind_enrollment_cohort(enrollment.id, cohort.id)
                .await?;
            log::debug!(
                "bound enrollment {} to overflow cohort {} ({})",
                enrollment.id,
                cohort.id,
                cohort.name
            );
            return Ok(AssignmentOutcome::Assigned { cohort_id: cohort.id });
        }

        Err(SchedulingError::CapacityExhausted {
            course_id: course.id,
        })
    }

    /// Create the minimum number of cohorts needed to absorb the course's
    /// current occupancy. No-op when existing capacity suffices.
    ///
    /// Returns the cohorts created by this call.
    pub async fn ensure_capacity(&self, course_id: CourseId) -> SchedulingResult<Vec<Cohort>> {
        let course = self.repo.get_course(course_id).await?;
        if !course.modality.is_cohort_based() {
            return Ok(Vec::new());
        }
        let _guard = self.locks.acquire(format!("course:{}", course.id)).await;
        self.ensure_capacity_locked(&course).await
    }

    /// First active cohort, in creation order, whose pending/active
    /// occupancy is strictly below its capacity.
    async fn find_open_cohort(&self, course: &Course) -> SchedulingResult<Option<Cohort>> {
        for cohort in self.repo.list_course_cohorts(course.id).await? {
            if !cohort.is_active {
                continue;
            }
            let occupancy = self.repo.count_cohort_occupancy(cohort.id).await?;
            if !cohort.is_full(occupancy) {
                return Ok(Some(cohort));
            }
        }
        Ok(None)
    }

    /// Capacity growth under an already-held course lock.
    async fn ensure_capacity_locked(&self, course: &Course) -> SchedulingResult<Vec<Cohort>> {
        let occupancy = self.repo.count_course_occupancy(course.id).await?;
        let cohorts = self.repo.list_course_cohorts(course.id).await?;
        let total_capacity: u32 = cohorts.iter().map(|c| c.capacity).sum();

        if occupancy <= total_capacity {
            return Ok(Vec::new());
        }
        if course.default_cohort_capacity == 0 {
            return Err(SchedulingError::InvalidCapacity {
                course_id: course.id,
            });
        }

        let deficit = occupancy - total_capacity;
        let needed = deficit.div_ceil(course.default_cohort_capacity);

        let mut created = Vec::with_capacity(needed as usize);
        for i in 0..needed {
            let number = cohorts.len() as u32 + i + 1;
            let cohort = self
                .repo
                .create_cohort(NewCohort {
                    course_id: course.id,
                    name: format!("{} - Cohort {}", course.title, number),
                    capacity: course.default_cohort_capacity,
                    start_date: None,
                    end_date: None,
                    instructor: course.instructor.clone(),
                })
                .await?;
            created.push(cohort);
        }
        log::info!(
            "created {} overflow cohort(s) for course {} (occupancy {}, capacity was {})",
            created.len(),
            course.id,
            occupancy,
            total_capacity
        );
        Ok(created)
    }
}
