//! Enrollment entity.
//!
//! Enrollments are created by the external checkout/registration flow and
//! mutated here only to bind them to a cohort. Status transitions to
//! completed/cancelled come from external progress tracking and free the
//! cohort seat for later allocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::{CohortId, CourseId, EnrollmentId};

/// Lifecycle status of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    /// An enrollment holds a cohort seat only while pending or active.
    pub fn counts_toward_capacity(&self) -> bool {
        matches!(self, EnrollmentStatus::Pending | EnrollmentStatus::Active)
    }
}

impl FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(EnrollmentStatus::Pending),
            "active" => Ok(EnrollmentStatus::Active),
            "completed" => Ok(EnrollmentStatus::Completed),
            "cancelled" => Ok(EnrollmentStatus::Cancelled),
            _ => Err(format!("Unknown enrollment status: {}", s)),
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// A learner's relationship to a course, optionally bound to one cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub course_id: CourseId,
    /// Learner identity as the external account system knows it.
    pub learner: String,
    pub cohort_id: Option<CohortId>,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn holds_seat(&self) -> bool {
        self.status.counts_toward_capacity()
    }
}

/// Insert payload for an enrollment (checkout-side creation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnrollment {
    pub course_id: CourseId,
    pub learner: String,
    #[serde(default = "default_status")]
    pub status: EnrollmentStatus,
}

fn default_status() -> EnrollmentStatus {
    EnrollmentStatus::Pending
}
