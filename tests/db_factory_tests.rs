//! Tests for repository factory, builder, and environment selection.

mod support;

use std::str::FromStr;

use cohort_engine::db::repository::LedgerRepository;
use cohort_engine::db::{RepositoryBuilder, RepositoryFactory, RepositoryType};

use support::with_scoped_env;

#[test]
fn repository_type_parses_known_names() {
    assert_eq!(
        RepositoryType::from_str("local").unwrap(),
        RepositoryType::Local
    );
    assert_eq!(
        RepositoryType::from_str("POSTGRES").unwrap(),
        RepositoryType::Postgres
    );
    assert!(RepositoryType::from_str("sqlite").is_err());
}

#[test]
fn repository_type_defaults_to_local_without_database_url() {
    let repo_type = with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        RepositoryType::from_env,
    );
    assert_eq!(repo_type, RepositoryType::Local);
}

#[test]
fn repository_type_prefers_explicit_setting() {
    let repo_type = with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://ignored")),
        ],
        RepositoryType::from_env,
    );
    assert_eq!(repo_type, RepositoryType::Local);
}

#[test]
fn database_url_implies_postgres() {
    let repo_type = with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://host/db")),
        ],
        RepositoryType::from_env,
    );
    assert_eq!(repo_type, RepositoryType::Postgres);
}

#[tokio::test]
async fn factory_creates_working_local_repository() {
    let repo = RepositoryFactory::create_local();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn builder_creates_local_repository() {
    let repo = RepositoryBuilder::new()
        .repository_type(RepositoryType::Local)
        .build()
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn factory_create_honors_requested_type() {
    let repo = RepositoryFactory::create(RepositoryType::Local).await.unwrap();
    assert!(repo.health_check().await.unwrap());
}
