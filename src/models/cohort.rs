//! Cohort and session entities.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{CohortId, CourseId, SessionId};

/// One physical/hybrid delivery instance of a course.
///
/// Capacity is fixed at creation and never resized; a cohort represents a
/// physical commitment (room, instructor time) that is not altered once
/// learners may already be scheduled into sessions under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cohort {
    pub id: CohortId,
    pub course_id: CourseId,
    pub name: String,
    pub capacity: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub instructor: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Cohort {
    /// Remaining seats given the current pending/active occupancy.
    pub fn available_slots(&self, occupancy: u32) -> u32 {
        self.capacity.saturating_sub(occupancy)
    }

    pub fn is_full(&self, occupancy: u32) -> bool {
        occupancy >= self.capacity
    }
}

/// Insert payload for a cohort. Capacity must be strictly positive;
/// repositories reject zero at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCohort {
    pub course_id: CourseId,
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub instructor: Option<String>,
}

/// One scheduled meeting instance of a cohort.
///
/// `session_number` is unique within the cohort and monotonically assigned
/// by the repository in the same critical section that creates the row.
/// Sessions are never deleted by the engine, only deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub cohort_id: CohortId,
    pub title: String,
    pub session_number: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Calendar date this session falls on (by start time).
    pub fn date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }
}

/// Insert payload for a session. The session number is assigned by the
/// repository, not the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub cohort_id: CohortId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cohort(capacity: u32) -> Cohort {
        Cohort {
            id: CohortId::new(1),
            course_id: CourseId::new(1),
            name: "Rust 101 - Cohort 1".to_string(),
            capacity,
            start_date: None,
            end_date: None,
            instructor: None,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn available_slots_saturates_at_zero() {
        let c = cohort(2);
        assert_eq!(c.available_slots(0), 2);
        assert_eq!(c.available_slots(2), 0);
        assert_eq!(c.available_slots(5), 0);
    }

    #[test]
    fn full_at_capacity() {
        let c = cohort(3);
        assert!(!c.is_full(2));
        assert!(c.is_full(3));
        assert!(c.is_full(4));
    }

    #[test]
    fn session_date_is_start_date() {
        let s = Session {
            id: SessionId::new(1),
            cohort_id: CohortId::new(1),
            title: "Session 1".to_string(),
            session_number: 1,
            start_time: Utc.with_ymd_and_hms(2024, 6, 1, 22, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap(),
            location: String::new(),
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        assert_eq!(s.date(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }
}
