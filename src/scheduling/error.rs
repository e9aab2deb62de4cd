//! Error taxonomy for scheduling operations.

use crate::api::{CourseId, SessionId};
use crate::db::repository::RepositoryError;

/// Result type for scheduling operations
pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Errors surfaced by the allocator, scheduler, assigner, and ledger.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    /// Allocation could not complete even after creating overflow cohorts.
    /// Only reachable under concurrent mutation of the same course; the
    /// caller is expected to retry.
    #[error("Capacity exhausted for course {course_id}: no active cohort has room")]
    CapacityExhausted { course_id: CourseId },

    /// A direct registration was requested for a session that is already
    /// at its cohort's capacity.
    #[error("Session {session_id} is full (capacity {capacity})")]
    SessionFull {
        session_id: SessionId,
        capacity: u32,
    },

    /// A cohort would be created with capacity zero.
    #[error("Invalid cohort capacity for course {course_id}: capacity must be positive")]
    InvalidCapacity { course_id: CourseId },

    /// A caller-supplied time slot could not be parsed as `HH:MM`.
    #[error("Invalid time slot '{0}': expected HH:MM")]
    InvalidTimeSlot(String),

    /// Storage-layer failure; recovered by full abort-and-retry at the
    /// call boundary.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl SchedulingError {
    /// Whether retrying the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SchedulingError::CapacityExhausted { .. } => true,
            SchedulingError::Repository(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_exhausted_is_retryable() {
        let err = SchedulingError::CapacityExhausted {
            course_id: CourseId::new(1),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn session_full_is_not_retryable() {
        let err = SchedulingError::SessionFull {
            session_id: SessionId::new(1),
            capacity: 25,
        };
        assert!(!err.is_retryable());
    }
}
