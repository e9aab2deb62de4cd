//! Persistence layer for the scheduling engine.
//!
//! This module provides abstractions for storage via the Repository
//! pattern, allowing different backends to be swapped.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Engine Layer (scheduling::*) - Allocation Logic         │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────────┐
//!     │ Local (in-memory)  │  Postgres   │
//!     └──────────────────────────────────┘
//! ```
//!
//! # Recommended Usage
//!
//! ```ignore
//! use cohort_engine::db::RepositoryFactory;
//!
//! let repo = RepositoryFactory::create_local();
//! let engine = cohort_engine::scheduling::SchedulingEngine::new(repo);
//! ```

// Feature flag priority: postgres > local
// When multiple features are enabled (e.g., --all-features), postgres takes precedence.
#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    CohortRepository, CourseRepository, ErrorContext, FullRepository, LedgerRepository,
    RepositoryError, RepositoryResult,
};
