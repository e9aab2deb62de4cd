//! Public API surface for the scheduling engine.
//!
//! This file consolidates the identifier newtypes shared across the crate
//! and re-exports the domain entities. All types derive
//! Serialize/Deserialize for JSON serialization.

pub use crate::models::{
    AttendanceRecord, Cohort, Course, Enrollment, EnrollmentStatus, Modality, Registration,
    RegistrationStatus, Session,
};

use serde::{Deserialize, Serialize};

/// Course identifier (database primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CourseId(pub i64);

/// Cohort identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CohortId(pub i64);

/// Session identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub i64);

/// Enrollment identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnrollmentId(pub i64);

/// Registration identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegistrationId(pub i64);

/// Attendance record identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttendanceId(pub i64);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: i64) -> Self {
                $name(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

impl_id!(CourseId);
impl_id!(CohortId);
impl_id!(SessionId);
impl_id!(EnrollmentId);
impl_id!(RegistrationId);
impl_id!(AttendanceId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_newtypes_round_trip() {
        let id = CohortId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let id = SessionId::new(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let back: SessionId = serde_json::from_str("7").unwrap();
        assert_eq!(back, id);
    }
}
