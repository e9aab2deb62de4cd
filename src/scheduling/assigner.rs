//! Round-robin session assigner.
//!
//! Places every pending/active enrollment of a cohort into one of an
//! ordered list of sessions, filling each session to the cohort's
//! capacity before moving to the next. The policy is deterministic and
//! order-stable: earliest enrollees get first pick of the earliest
//! session. No optimization, no randomization.

use std::collections::HashSet;

use crate::api::EnrollmentId;
use crate::db::repository::{CohortRepository, LedgerRepository};
use crate::models::{Cohort, NewRegistration, Registration, RegistrationStatus, Session};

use super::error::SchedulingResult;
use super::SchedulingEngine;

impl SchedulingEngine {
    /// Distribute the cohort's enrollments across `sessions`, in order.
    ///
    /// The fill is monotonic: a session reaches full capacity before the
    /// next receives any registration. Enrollments that already hold a
    /// registration for any of the given sessions are skipped, which
    /// makes re-invocation safe: a prior pass's placements are never
    /// duplicated or shuffled, and only unplaced enrollments consume the
    /// remaining seats. Once the pointer passes the last session,
    /// remaining enrollments are left for a future scheduling pass;
    /// there is no wraparound.
    ///
    /// Returns only the registrations created by this call.
    pub async fn assign_to_sessions(
        &self,
        cohort: &Cohort,
        sessions: &[Session],
    ) -> SchedulingResult<Vec<Registration>> {
        if sessions.is_empty() {
            return Ok(Vec::new());
        }

        // Ordered by created_at ascending: first come, first placed.
        let enrollments = self.repo.list_cohort_enrollments(cohort.id).await?;

        // Seat counts plus the set of enrollments a prior pass already
        // placed somewhere in this batch.
        let mut seats = Vec::with_capacity(sessions.len());
        let mut placed: HashSet<EnrollmentId> = HashSet::new();
        for session in sessions {
            seats.push(self.repo.count_session_seats(session.id).await?);
            for registration in self.repo.list_session_registrations(session.id).await? {
                placed.insert(registration.enrollment_id);
            }
        }

        let mut created = Vec::new();
        let mut index = 0usize;

        for enrollment in enrollments {
            if placed.contains(&enrollment.id) {
                continue;
            }

            while index < sessions.len() && seats[index] >= cohort.capacity {
                index += 1;
            }
            let Some(session) = sessions.get(index) else {
                // All sessions full: the rest waits for a future pass.
                break;
            };

            let registration = self
                .repo
                .create_registration(NewRegistration {
                    enrollment_id: enrollment.id,
                    session_id: session.id,
                    status: RegistrationStatus::Registered,
                })
                .await?;
            seats[index] += 1;
            created.push(registration);
        }

        log::debug!(
            "assigned {} enrollment(s) across {} session(s) of cohort {}",
            created.len(),
            sessions.len(),
            cohort.id
        );
        Ok(created)
    }
}
