//! Scheduling engine: cohort allocation, session scheduling, round-robin
//! assignment, and the registration/attendance ledger.
//!
//! All operations are request-scoped async calls over shared storage.
//! Serialization requirements (per-course for allocation, per
//! (cohort, date) for scheduling) are met with the advisory lock registry
//! in [`locks`]; everything else relies on the repository's uniqueness
//! guarantees.

pub mod allocator;
pub mod assigner;
pub mod error;
pub mod ledger;
pub mod location;
pub mod locks;
pub mod scheduler;

pub use allocator::AssignmentOutcome;
pub use error::{SchedulingError, SchedulingResult};
pub use location::{LocationDirectory, NoLocations, StaticLocations};
pub use locks::ScopeLocks;
pub use scheduler::{ScheduledDay, SessionPlan};

use std::sync::Arc;

use crate::api::{CohortId, CourseId, SessionId};
use crate::db::repository::{
    CohortRepository, CourseRepository, FullRepository, LedgerRepository,
};

/// Facade over the four scheduling components, sharing one repository,
/// one location directory, and one advisory lock registry.
pub struct SchedulingEngine {
    repo: Arc<dyn FullRepository>,
    locations: Arc<dyn LocationDirectory>,
    locks: ScopeLocks,
}

impl SchedulingEngine {
    /// Create an engine with no instructor location lookup.
    pub fn new(repo: Arc<dyn FullRepository>) -> Self {
        Self::with_locations(repo, Arc::new(NoLocations))
    }

    /// Create an engine with the given instructor location directory.
    pub fn with_locations(
        repo: Arc<dyn FullRepository>,
        locations: Arc<dyn LocationDirectory>,
    ) -> Self {
        Self {
            repo,
            locations,
            locks: ScopeLocks::new(),
        }
    }

    /// The repository this engine operates on.
    pub fn repository(&self) -> &Arc<dyn FullRepository> {
        &self.repo
    }

    // ==================== Read-only occupancy queries ====================
    // Consumed by external progress tracking; never mutate state.

    /// Pending/active enrollment count for a course.
    pub async fn course_occupancy(&self, course_id: CourseId) -> SchedulingResult<u32> {
        Ok(self.repo.count_course_occupancy(course_id).await?)
    }

    /// Pending/active enrollment count for a cohort.
    pub async fn cohort_occupancy(&self, cohort_id: CohortId) -> SchedulingResult<u32> {
        Ok(self.repo.count_cohort_occupancy(cohort_id).await?)
    }

    /// Remaining seats in a cohort.
    pub async fn cohort_available_slots(&self, cohort_id: CohortId) -> SchedulingResult<u32> {
        let cohort = self.repo.get_cohort(cohort_id).await?;
        let occupancy = self.repo.count_cohort_occupancy(cohort_id).await?;
        Ok(cohort.available_slots(occupancy))
    }

    /// Seat-holding registration count for a session.
    pub async fn session_seats(&self, session_id: SessionId) -> SchedulingResult<u32> {
        Ok(self.repo.count_session_seats(session_id).await?)
    }
}
