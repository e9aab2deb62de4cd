//! # Cohort Engine
//!
//! Capacity-bounded cohort and session scheduling engine for physical and
//! hybrid course delivery.
//!
//! The engine decides how many cohorts a course needs, assigns learners to a
//! cohort under a hard capacity limit, materializes dated session instances
//! for a cohort on demand, distributes enrolled learners across those
//! sessions without over-filling any one of them, and owns the per-session
//! registration and attendance ledger that depends on this allocation.
//! Catalog browsing, checkout, grading, certificates and notifications are
//! external collaborators that reach this crate only through the repository
//! CRUD surface and the engine entry points.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Shared identifier newtypes and re-exported entity types
//! - [`models`]: Domain entities (Course, Cohort, Session, Enrollment,
//!   Registration, AttendanceRecord) and their status enums
//! - [`db`]: Repository traits, error types, and persistence backends
//! - [`scheduling`]: Cohort allocator, session scheduler, round-robin
//!   assigner, and the attendance/registration ledger
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! ## Invariants
//!
//! - No session ever holds more seat-consuming registrations than its
//!   cohort's capacity.
//! - At most one registration and one attendance record exist per
//!   (enrollment, session) pair.
//! - Scheduling a (cohort, date) pair twice yields the same session set as
//!   scheduling it once.

pub mod api;
pub mod db;
pub mod models;
pub mod scheduling;

#[cfg(feature = "http-server")]
pub mod http;

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

use db::repository::FullRepository;
use db::RepositoryFactory;
#[cfg(feature = "postgres-repo")]
use tokio::runtime::Runtime;

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

// Priority: postgres > local (when --all-features is used)
#[cfg(feature = "postgres-repo")]
async fn create_selected_repository() -> db::RepositoryResult<Arc<dyn FullRepository>> {
    let config = db::PostgresConfig::from_env().map_err(db::RepositoryError::configuration)?;
    let repo = RepositoryFactory::create_postgres(&config).await?;
    Ok(repo as Arc<dyn FullRepository>)
}

#[cfg(all(feature = "local-repo", not(feature = "postgres-repo")))]
fn create_selected_repository() -> db::RepositoryResult<Arc<dyn FullRepository>> {
    Ok(RepositoryFactory::create_local())
}

/// Initialize the global repository singleton for the selected backend.
#[cfg(feature = "postgres-repo")]
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let runtime = Runtime::new().context("Failed to create async runtime for repository init")?;
    let repo = runtime
        .block_on(create_selected_repository())
        .map_err(|e| anyhow::Error::msg(e.to_string()))?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Initialize the global repository singleton for the selected backend.
#[cfg(all(feature = "local-repo", not(feature = "postgres-repo")))]
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = create_selected_repository()?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if REPOSITORY.get().is_none() {
        let _ = init_repository();
    }

    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
