//! Attendance/registration ledger.
//!
//! Maintains the per-(enrollment, session) registration and attendance
//! rows as mutable, idempotent, single-row-per-pair state. Rows are never
//! deleted: cancellation and re-marking keep history in place.

use chrono::Utc;

use crate::api::{EnrollmentId, RegistrationId, SessionId};
use crate::db::repository::{CohortRepository, CourseRepository, LedgerRepository};
use crate::models::{
    AttendanceMark, AttendanceRecord, NewRegistration, Registration, RegistrationStatus,
};

use super::error::{SchedulingError, SchedulingResult};
use super::SchedulingEngine;

impl SchedulingEngine {
    /// Register an enrollment for a session.
    ///
    /// Idempotent: an existing registration for the pair is returned
    /// unchanged instead of erroring. Fails with
    /// [`SchedulingError::SessionFull`] when the session's seat count has
    /// reached the cohort's capacity and no registration exists for the
    /// pair.
    pub async fn register(
        &self,
        enrollment_id: EnrollmentId,
        session_id: SessionId,
    ) -> SchedulingResult<Registration> {
        if let Some(existing) = self.repo.find_registration(enrollment_id, session_id).await? {
            return Ok(existing);
        }

        let session = self.repo.get_session(session_id).await?;
        let cohort = self.repo.get_cohort(session.cohort_id).await?;
        let seats = self.repo.count_session_seats(session_id).await?;
        if seats >= cohort.capacity {
            return Err(SchedulingError::SessionFull {
                session_id,
                capacity: cohort.capacity,
            });
        }

        // Surfaces NotFound for dangling enrollment ids before writing.
        let enrollment = self.repo.get_enrollment(enrollment_id).await?;

        let registration = self
            .repo
            .create_registration(NewRegistration {
                enrollment_id: enrollment.id,
                session_id,
                status: RegistrationStatus::Registered,
            })
            .await?;
        log::debug!(
            "registered enrollment {} for session {}",
            enrollment_id,
            session_id
        );
        Ok(registration)
    }

    /// Cancel a registration.
    ///
    /// The row is kept with status `cancelled` to preserve history; its
    /// seat is freed for future assignment passes, since seat counts
    /// exclude cancelled registrations.
    pub async fn cancel_registration(
        &self,
        registration_id: RegistrationId,
    ) -> SchedulingResult<Registration> {
        let registration = self
            .repo
            .update_registration_status(registration_id, RegistrationStatus::Cancelled)
            .await?;
        log::debug!("cancelled registration {}", registration_id);
        Ok(registration)
    }

    /// Record a check-in fact for an (enrollment, session) pair.
    ///
    /// Upsert with overwrite semantics: re-marking replaces `present` and
    /// `note` in place, never duplicates. `checked_in_at` is set to the
    /// current time only on the first `present = true` mark; a later
    /// absent mark keeps the recorded check-in time.
    ///
    /// If a non-cancelled registration exists for the pair, its status is
    /// moved to `attended`/`absent` to match.
    pub async fn mark_attendance(
        &self,
        enrollment_id: EnrollmentId,
        session_id: SessionId,
        present: bool,
        note: impl Into<String>,
    ) -> SchedulingResult<AttendanceRecord> {
        let previous = self.repo.find_attendance(enrollment_id, session_id).await?;

        let checked_in_at = match previous.as_ref().and_then(|p| p.checked_in_at) {
            Some(first_check_in) => Some(first_check_in),
            None if present => Some(Utc::now()),
            None => None,
        };

        let record = self
            .repo
            .upsert_attendance(AttendanceMark {
                enrollment_id,
                session_id,
                present,
                note: note.into(),
                checked_in_at,
            })
            .await?;

        if let Some(registration) = self.repo.find_registration(enrollment_id, session_id).await? {
            if registration.status != RegistrationStatus::Cancelled {
                let status = if present {
                    RegistrationStatus::Attended
                } else {
                    RegistrationStatus::Absent
                };
                if registration.status != status {
                    self.repo
                        .update_registration_status(registration.id, status)
                        .await?;
                }
            }
        }

        log::debug!(
            "marked enrollment {} {} for session {}",
            enrollment_id,
            if present { "present" } else { "absent" },
            session_id
        );
        Ok(record)
    }
}
