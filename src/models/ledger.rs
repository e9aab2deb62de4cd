//! Registration and attendance ledger entities.
//!
//! Both tables are keyed by the (enrollment, session) pair: at most one
//! registration and one attendance record may exist per pair. These are the
//! only entities the engine mutates repeatedly over a session's lifetime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::{AttendanceId, EnrollmentId, RegistrationId, SessionId};

/// Status of a learner's claim on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    Attended,
    Absent,
    Cancelled,
}

impl RegistrationStatus {
    /// Whether this registration consumes a seat against the cohort
    /// capacity. Absent and cancelled rows keep their history but free
    /// the seat.
    pub fn holds_seat(&self) -> bool {
        matches!(self, RegistrationStatus::Registered | RegistrationStatus::Attended)
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "registered" => Ok(RegistrationStatus::Registered),
            "attended" => Ok(RegistrationStatus::Attended),
            "absent" => Ok(RegistrationStatus::Absent),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            _ => Err(format!("Unknown registration status: {}", s)),
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Attended => "attended",
            RegistrationStatus::Absent => "absent",
            RegistrationStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// One learner's claim on one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub enrollment_id: EnrollmentId,
    pub session_id: SessionId,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}

/// Insert payload for a registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRegistration {
    pub enrollment_id: EnrollmentId,
    pub session_id: SessionId,
    pub status: RegistrationStatus,
}

/// Check-in fact for one (enrollment, session) pair.
///
/// Re-marking overwrites the row in place. `checked_in_at` records the
/// first successful check-in and survives later absent marks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub enrollment_id: EnrollmentId,
    pub session_id: SessionId,
    pub present: bool,
    pub note: String,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub recorded_at: DateTime<Utc>,
}

/// Upsert payload for an attendance record. The ledger computes the
/// `checked_in_at` policy before handing this to the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceMark {
    pub enrollment_id: EnrollmentId,
    pub session_id: SessionId,
    pub present: bool,
    #[serde(default)]
    pub note: String,
    pub checked_in_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_accounting_by_status() {
        assert!(RegistrationStatus::Registered.holds_seat());
        assert!(RegistrationStatus::Attended.holds_seat());
        assert!(!RegistrationStatus::Absent.holds_seat());
        assert!(!RegistrationStatus::Cancelled.holds_seat());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for s in ["registered", "attended", "absent", "cancelled"] {
            let parsed: RegistrationStatus = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
    }
}
