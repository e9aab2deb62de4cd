//! Session scheduler.
//!
//! Materializes concrete dated session records for a cohort on a given
//! calendar date, sufficient to host its current occupancy without
//! exceeding the cohort's capacity per session, then hands the new
//! sessions to the round-robin assigner.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::CohortId;
use crate::db::repository::CohortRepository;
use crate::models::{NewSession, Registration, Session};

use super::error::{SchedulingError, SchedulingResult};
use super::SchedulingEngine;

/// Hour at which default time slots start.
const DEFAULT_START_HOUR: u32 = 14;

/// Parameters for one scheduling pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPlan {
    /// Duration of each session in hours.
    pub session_duration_hours: u32,
    /// Explicit `HH:MM` start slots. When absent, slots are generated
    /// starting at 14:00 and stepped by the duration.
    pub time_slots: Option<Vec<String>>,
}

impl Default for SessionPlan {
    fn default() -> Self {
        Self {
            session_duration_hours: 2,
            time_slots: None,
        }
    }
}

/// Outcome of one scheduling pass for a (cohort, date) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledDay {
    /// The sessions hosting the cohort on that date, in session-number
    /// order. Pre-existing on an idempotent re-invocation.
    pub sessions: Vec<Session>,
    /// Whether this call created the sessions (false when the date was
    /// already scheduled or occupancy was zero).
    pub newly_created: bool,
    /// Registrations created by the assigner for the new sessions.
    pub registrations: Vec<Registration>,
}

impl ScheduledDay {
    fn existing(sessions: Vec<Session>) -> Self {
        Self {
            sessions,
            newly_created: false,
            registrations: Vec::new(),
        }
    }
}

impl SchedulingEngine {
    /// Create the sessions needed to host a cohort's occupancy on `date`
    /// and distribute the cohort's enrollments across them.
    ///
    /// Idempotent per (cohort, date): if sessions already exist on that
    /// date they are returned unchanged and nothing is created, so the
    /// operation is safe to call repeatedly for "today". The whole pass
    /// runs under a (cohort, date) advisory lock so concurrent calls
    /// cannot duplicate a session set.
    pub async fn schedule_sessions(
        &self,
        cohort_id: CohortId,
        date: NaiveDate,
        plan: SessionPlan,
    ) -> SchedulingResult<ScheduledDay> {
        let cohort = self.repo.get_cohort(cohort_id).await?;

        let _guard = self.locks.acquire(format!("cohort:{}:{}", cohort_id, date)).await;

        let existing = self.repo.list_sessions_on(cohort_id, date).await?;
        if !existing.is_empty() {
            log::debug!(
                "cohort {} already has {} session(s) on {}, returning unchanged",
                cohort_id,
                existing.len(),
                date
            );
            return Ok(ScheduledDay::existing(existing));
        }

        let occupancy = self.repo.count_cohort_occupancy(cohort_id).await?;
        if occupancy == 0 {
            return Ok(ScheduledDay::existing(Vec::new()));
        }

        let sessions_needed = occupancy.div_ceil(cohort.capacity) as usize;
        let slots = match plan.time_slots {
            Some(ref raw) => raw
                .iter()
                .map(|s| parse_time_slot(s))
                .collect::<SchedulingResult<Vec<_>>>()?,
            None => default_slots(sessions_needed, plan.session_duration_hours),
        };

        let location = cohort
            .instructor
            .as_deref()
            .and_then(|instructor| self.locations.location_for(instructor))
            .unwrap_or_default();

        let mut sessions = Vec::with_capacity(sessions_needed);
        for (seq, &(hour, minute)) in slots.iter().take(sessions_needed).enumerate() {
            let start = date
                .and_hms_opt(hour, minute, 0)
                .ok_or_else(|| {
                    SchedulingError::InvalidTimeSlot(format!("{:02}:{:02}", hour, minute))
                })?
                .and_utc();
            let end = start + Duration::hours(i64::from(plan.session_duration_hours));
            let session = self
                .repo
                .create_session(NewSession {
                    cohort_id,
                    title: format!("Session {} - {}", seq + 1, date.format("%B %d, %Y")),
                    start_time: start,
                    end_time: end,
                    location: location.clone(),
                })
                .await?;
            sessions.push(session);
        }

        log::info!(
            "scheduled {} session(s) for cohort {} on {} (occupancy {})",
            sessions.len(),
            cohort_id,
            date,
            occupancy
        );

        let registrations = self.assign_to_sessions(&cohort, &sessions).await?;
        Ok(ScheduledDay {
            sessions,
            newly_created: true,
            registrations,
        })
    }
}

/// Generate `count` start slots beginning at 14:00, stepped by the
/// session duration. The hour wraps modulo 24 and stays on the requested
/// calendar date; no cross-midnight rollover is modeled.
fn default_slots(count: usize, duration_hours: u32) -> Vec<(u32, u32)> {
    (0..count as u32)
        .map(|i| ((DEFAULT_START_HOUR + i * duration_hours) % 24, 0))
        .collect()
}

/// Parse a `HH:MM` time slot.
fn parse_time_slot(slot: &str) -> SchedulingResult<(u32, u32)> {
    let invalid = || SchedulingError::InvalidTimeSlot(slot.to_string());
    let (hour, minute) = slot.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if hour >= 24 || minute >= 60 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_slots_step_by_duration() {
        assert_eq!(default_slots(3, 2), vec![(14, 0), (16, 0), (18, 0)]);
    }

    #[test]
    fn default_slots_wrap_past_midnight() {
        // 14 + 4*3 = 26 -> 02:00 on the same date
        assert_eq!(
            default_slots(5, 3),
            vec![(14, 0), (17, 0), (20, 0), (23, 0), (2, 0)]
        );
    }

    #[test]
    fn parse_time_slot_accepts_hh_mm() {
        assert_eq!(parse_time_slot("14:00").unwrap(), (14, 0));
        assert_eq!(parse_time_slot("09:30").unwrap(), (9, 30));
    }

    #[test]
    fn parse_time_slot_rejects_garbage() {
        for bad in ["1400", "25:00", "14:61", "x:y", ""] {
            assert!(parse_time_slot(bad).is_err(), "{} should be rejected", bad);
        }
    }
}
