//! In-memory repository implementation.
//!
//! Used for unit testing and local development. All tables live behind a
//! single `parking_lot::RwLock`, which makes id assignment, session
//! sequence numbering, and (enrollment, session) uniqueness checks atomic
//! without any external coordination.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::api::{
    AttendanceId, CohortId, CourseId, EnrollmentId, RegistrationId, SessionId,
};
use crate::db::repository::{
    CohortRepository, CourseRepository, ErrorContext, LedgerRepository, RepositoryError,
    RepositoryResult,
};
use crate::models::{
    AttendanceMark, AttendanceRecord, Cohort, Course, Enrollment, EnrollmentStatus, NewCohort,
    NewCourse, NewEnrollment, NewRegistration, NewSession, Registration, RegistrationStatus,
    Session,
};

#[derive(Default)]
struct Tables {
    courses: BTreeMap<i64, Course>,
    cohorts: BTreeMap<i64, Cohort>,
    sessions: BTreeMap<i64, Session>,
    enrollments: BTreeMap<i64, Enrollment>,
    registrations: BTreeMap<i64, Registration>,
    attendance: BTreeMap<i64, AttendanceRecord>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn cohort_occupancy(&self, cohort_id: CohortId) -> u32 {
        self.enrollments
            .values()
            .filter(|e| e.cohort_id == Some(cohort_id) && e.holds_seat())
            .count() as u32
    }

    fn session_seats(&self, session_id: SessionId) -> u32 {
        self.registrations
            .values()
            .filter(|r| r.session_id == session_id && r.status.holds_seat())
            .count() as u32
    }
}

/// In-memory repository for unit testing and local development.
#[derive(Default)]
pub struct LocalRepository {
    tables: RwLock<Tables>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseRepository for LocalRepository {
    async fn create_course(&self, new: NewCourse) -> RepositoryResult<Course> {
        let mut tables = self.tables.write();
        let id = tables.next_id();
        let course = Course {
            id: CourseId::new(id),
            title: new.title,
            modality: new.modality,
            default_cohort_capacity: new.default_cohort_capacity,
            instructor: new.instructor,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.courses.insert(id, course.clone());
        Ok(course)
    }

    async fn get_course(&self, id: CourseId) -> RepositoryResult<Course> {
        self.tables.read().courses.get(&id.value()).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Course {} not found", id),
                ErrorContext::new("get_course").with_entity("course").with_entity_id(id),
            )
        })
    }

    async fn list_courses(&self) -> RepositoryResult<Vec<Course>> {
        Ok(self.tables.read().courses.values().cloned().collect())
    }

    async fn create_enrollment(&self, new: NewEnrollment) -> RepositoryResult<Enrollment> {
        let mut tables = self.tables.write();
        if !tables.courses.contains_key(&new.course_id.value()) {
            return Err(RepositoryError::not_found_with_context(
                format!("Course {} not found", new.course_id),
                ErrorContext::new("create_enrollment")
                    .with_entity("course")
                    .with_entity_id(new.course_id),
            ));
        }
        let id = tables.next_id();
        let enrollment = Enrollment {
            id: EnrollmentId::new(id),
            course_id: new.course_id,
            learner: new.learner,
            cohort_id: None,
            status: new.status,
            created_at: Utc::now(),
        };
        tables.enrollments.insert(id, enrollment.clone());
        Ok(enrollment)
    }

    async fn get_enrollment(&self, id: EnrollmentId) -> RepositoryResult<Enrollment> {
        self.tables.read().enrollments.get(&id.value()).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Enrollment {} not found", id),
                ErrorContext::new("get_enrollment")
                    .with_entity("enrollment")
                    .with_entity_id(id),
            )
        })
    }

    async fn list_course_enrollments(
        &self,
        course_id: CourseId,
    ) -> RepositoryResult<Vec<Enrollment>> {
        let mut enrollments: Vec<Enrollment> = self
            .tables
            .read()
            .enrollments
            .values()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect();
        enrollments.sort_by_key(|e| (e.created_at, e.id));
        Ok(enrollments)
    }

    async fn count_course_occupancy(&self, course_id: CourseId) -> RepositoryResult<u32> {
        Ok(self
            .tables
            .read()
            .enrollments
            .values()
            .filter(|e| e.course_id == course_id && e.holds_seat())
            .count() as u32)
    }

    async fn bind_enrollment_cohort(
        &self,
        enrollment_id: EnrollmentId,
        cohort_id: CohortId,
    ) -> RepositoryResult<Enrollment> {
        let mut tables = self.tables.write();
        if !tables.cohorts.contains_key(&cohort_id.value()) {
            return Err(RepositoryError::not_found_with_context(
                format!("Cohort {} not found", cohort_id),
                ErrorContext::new("bind_enrollment_cohort")
                    .with_entity("cohort")
                    .with_entity_id(cohort_id),
            ));
        }
        let enrollment = tables.enrollments.get_mut(&enrollment_id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Enrollment {} not found", enrollment_id),
                ErrorContext::new("bind_enrollment_cohort")
                    .with_entity("enrollment")
                    .with_entity_id(enrollment_id),
            )
        })?;
        enrollment.cohort_id = Some(cohort_id);
        Ok(enrollment.clone())
    }

    async fn update_enrollment_status(
        &self,
        enrollment_id: EnrollmentId,
        status: EnrollmentStatus,
    ) -> RepositoryResult<Enrollment> {
        let mut tables = self.tables.write();
        let enrollment = tables.enrollments.get_mut(&enrollment_id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Enrollment {} not found", enrollment_id),
                ErrorContext::new("update_enrollment_status")
                    .with_entity("enrollment")
                    .with_entity_id(enrollment_id),
            )
        })?;
        enrollment.status = status;
        Ok(enrollment.clone())
    }
}

#[async_trait]
impl CohortRepository for LocalRepository {
    async fn create_cohort(&self, new: NewCohort) -> RepositoryResult<Cohort> {
        let mut tables = self.tables.write();
        if new.capacity == 0 {
            return Err(RepositoryError::validation_with_context(
                "Cohort capacity must be strictly positive",
                ErrorContext::new("create_cohort").with_entity("cohort"),
            ));
        }
        if !tables.courses.contains_key(&new.course_id.value()) {
            return Err(RepositoryError::not_found_with_context(
                format!("Course {} not found", new.course_id),
                ErrorContext::new("create_cohort")
                    .with_entity("course")
                    .with_entity_id(new.course_id),
            ));
        }
        let id = tables.next_id();
        let cohort = Cohort {
            id: CohortId::new(id),
            course_id: new.course_id,
            name: new.name,
            capacity: new.capacity,
            start_date: new.start_date,
            end_date: new.end_date,
            instructor: new.instructor,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.cohorts.insert(id, cohort.clone());
        Ok(cohort)
    }

    async fn get_cohort(&self, id: CohortId) -> RepositoryResult<Cohort> {
        self.tables.read().cohorts.get(&id.value()).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Cohort {} not found", id),
                ErrorContext::new("get_cohort").with_entity("cohort").with_entity_id(id),
            )
        })
    }

    async fn list_course_cohorts(&self, course_id: CourseId) -> RepositoryResult<Vec<Cohort>> {
        // BTreeMap iteration is id order, which is creation order here.
        Ok(self
            .tables
            .read()
            .cohorts
            .values()
            .filter(|c| c.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn count_cohort_occupancy(&self, cohort_id: CohortId) -> RepositoryResult<u32> {
        Ok(self.tables.read().cohort_occupancy(cohort_id))
    }

    async fn list_cohort_enrollments(
        &self,
        cohort_id: CohortId,
    ) -> RepositoryResult<Vec<Enrollment>> {
        let mut enrollments: Vec<Enrollment> = self
            .tables
            .read()
            .enrollments
            .values()
            .filter(|e| e.cohort_id == Some(cohort_id) && e.holds_seat())
            .cloned()
            .collect();
        enrollments.sort_by_key(|e| (e.created_at, e.id));
        Ok(enrollments)
    }

    async fn create_session(&self, new: NewSession) -> RepositoryResult<Session> {
        let mut tables = self.tables.write();
        if !tables.cohorts.contains_key(&new.cohort_id.value()) {
            return Err(RepositoryError::not_found_with_context(
                format!("Cohort {} not found", new.cohort_id),
                ErrorContext::new("create_session")
                    .with_entity("cohort")
                    .with_entity_id(new.cohort_id),
            ));
        }
        // Next number in the cohort's sequence, assigned under the same
        // write lock that inserts the row.
        let session_number = tables
            .sessions
            .values()
            .filter(|s| s.cohort_id == new.cohort_id)
            .map(|s| s.session_number)
            .max()
            .unwrap_or(0)
            + 1;
        let id = tables.next_id();
        let session = Session {
            id: SessionId::new(id),
            cohort_id: new.cohort_id,
            title: new.title,
            session_number,
            start_time: new.start_time,
            end_time: new.end_time,
            location: new.location,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: SessionId) -> RepositoryResult<Session> {
        self.tables.read().sessions.get(&id.value()).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Session {} not found", id),
                ErrorContext::new("get_session").with_entity("session").with_entity_id(id),
            )
        })
    }

    async fn list_cohort_sessions(&self, cohort_id: CohortId) -> RepositoryResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .tables
            .read()
            .sessions
            .values()
            .filter(|s| s.cohort_id == cohort_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.session_number);
        Ok(sessions)
    }

    async fn list_sessions_on(
        &self,
        cohort_id: CohortId,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .tables
            .read()
            .sessions
            .values()
            .filter(|s| s.cohort_id == cohort_id && s.date() == date)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.session_number);
        Ok(sessions)
    }

    async fn deactivate_session(&self, id: SessionId) -> RepositoryResult<Session> {
        let mut tables = self.tables.write();
        let session = tables.sessions.get_mut(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Session {} not found", id),
                ErrorContext::new("deactivate_session")
                    .with_entity("session")
                    .with_entity_id(id),
            )
        })?;
        session.is_active = false;
        Ok(session.clone())
    }
}

#[async_trait]
impl LedgerRepository for LocalRepository {
    async fn create_registration(&self, new: NewRegistration) -> RepositoryResult<Registration> {
        let mut tables = self.tables.write();
        if !tables.enrollments.contains_key(&new.enrollment_id.value()) {
            return Err(RepositoryError::not_found_with_context(
                format!("Enrollment {} not found", new.enrollment_id),
                ErrorContext::new("create_registration")
                    .with_entity("enrollment")
                    .with_entity_id(new.enrollment_id),
            ));
        }
        if !tables.sessions.contains_key(&new.session_id.value()) {
            return Err(RepositoryError::not_found_with_context(
                format!("Session {} not found", new.session_id),
                ErrorContext::new("create_registration")
                    .with_entity("session")
                    .with_entity_id(new.session_id),
            ));
        }
        let duplicate = tables.registrations.values().any(|r| {
            r.enrollment_id == new.enrollment_id && r.session_id == new.session_id
        });
        if duplicate {
            return Err(RepositoryError::validation_with_context(
                format!(
                    "Registration already exists for enrollment {} and session {}",
                    new.enrollment_id, new.session_id
                ),
                ErrorContext::new("create_registration").with_entity("registration"),
            ));
        }
        let id = tables.next_id();
        let registration = Registration {
            id: RegistrationId::new(id),
            enrollment_id: new.enrollment_id,
            session_id: new.session_id,
            status: new.status,
            registered_at: Utc::now(),
        };
        tables.registrations.insert(id, registration.clone());
        Ok(registration)
    }

    async fn get_registration(&self, id: RegistrationId) -> RepositoryResult<Registration> {
        self.tables.read().registrations.get(&id.value()).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Registration {} not found", id),
                ErrorContext::new("get_registration")
                    .with_entity("registration")
                    .with_entity_id(id),
            )
        })
    }

    async fn find_registration(
        &self,
        enrollment_id: EnrollmentId,
        session_id: SessionId,
    ) -> RepositoryResult<Option<Registration>> {
        Ok(self
            .tables
            .read()
            .registrations
            .values()
            .find(|r| r.enrollment_id == enrollment_id && r.session_id == session_id)
            .cloned())
    }

    async fn list_session_registrations(
        &self,
        session_id: SessionId,
    ) -> RepositoryResult<Vec<Registration>> {
        Ok(self
            .tables
            .read()
            .registrations
            .values()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn list_enrollment_registrations(
        &self,
        enrollment_id: EnrollmentId,
    ) -> RepositoryResult<Vec<Registration>> {
        Ok(self
            .tables
            .read()
            .registrations
            .values()
            .filter(|r| r.enrollment_id == enrollment_id)
            .cloned()
            .collect())
    }

    async fn count_session_seats(&self, session_id: SessionId) -> RepositoryResult<u32> {
        Ok(self.tables.read().session_seats(session_id))
    }

    async fn update_registration_status(
        &self,
        id: RegistrationId,
        status: RegistrationStatus,
    ) -> RepositoryResult<Registration> {
        let mut tables = self.tables.write();
        let registration = tables.registrations.get_mut(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Registration {} not found", id),
                ErrorContext::new("update_registration_status")
                    .with_entity("registration")
                    .with_entity_id(id),
            )
        })?;
        registration.status = status;
        Ok(registration.clone())
    }

    async fn find_attendance(
        &self,
        enrollment_id: EnrollmentId,
        session_id: SessionId,
    ) -> RepositoryResult<Option<AttendanceRecord>> {
        Ok(self
            .tables
            .read()
            .attendance
            .values()
            .find(|a| a.enrollment_id == enrollment_id && a.session_id == session_id)
            .cloned())
    }

    async fn upsert_attendance(&self, mark: AttendanceMark) -> RepositoryResult<AttendanceRecord> {
        let mut tables = self.tables.write();
        if !tables.enrollments.contains_key(&mark.enrollment_id.value()) {
            return Err(RepositoryError::not_found_with_context(
                format!("Enrollment {} not found", mark.enrollment_id),
                ErrorContext::new("upsert_attendance")
                    .with_entity("enrollment")
                    .with_entity_id(mark.enrollment_id),
            ));
        }
        if !tables.sessions.contains_key(&mark.session_id.value()) {
            return Err(RepositoryError::not_found_with_context(
                format!("Session {} not found", mark.session_id),
                ErrorContext::new("upsert_attendance")
                    .with_entity("session")
                    .with_entity_id(mark.session_id),
            ));
        }
        let existing_id = tables
            .attendance
            .values()
            .find(|a| a.enrollment_id == mark.enrollment_id && a.session_id == mark.session_id)
            .map(|a| a.id.value());
        let record = match existing_id {
            Some(id) => {
                let record = tables
                    .attendance
                    .get_mut(&id)
                    .ok_or_else(|| RepositoryError::internal("Attendance row vanished mid-upsert"))?;
                record.present = mark.present;
                record.note = mark.note;
                record.checked_in_at = mark.checked_in_at;
                record.recorded_at = Utc::now();
                record.clone()
            }
            None => {
                let id = tables.next_id();
                let record = AttendanceRecord {
                    id: AttendanceId::new(id),
                    enrollment_id: mark.enrollment_id,
                    session_id: mark.session_id,
                    present: mark.present,
                    note: mark.note,
                    checked_in_at: mark.checked_in_at,
                    recorded_at: Utc::now(),
                };
                tables.attendance.insert(id, record.clone());
                record
            }
        };
        Ok(record)
    }

    async fn list_cohort_attendance(
        &self,
        cohort_id: CohortId,
    ) -> RepositoryResult<Vec<AttendanceRecord>> {
        let tables = self.tables.read();
        let session_ids: Vec<SessionId> = tables
            .sessions
            .values()
            .filter(|s| s.cohort_id == cohort_id)
            .map(|s| s.id)
            .collect();
        Ok(tables
            .attendance
            .values()
            .filter(|a| session_ids.contains(&a.session_id))
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
