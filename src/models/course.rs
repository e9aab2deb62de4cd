//! Course catalog entity.
//!
//! Courses are created and owned by catalog management; the engine reads
//! them to decide whether cohort allocation applies and what capacity new
//! cohorts get.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::CourseId;

/// Delivery modality of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Online,
    Physical,
    Hybrid,
}

impl Modality {
    /// Whether this modality requires cohort allocation and session
    /// scheduling. Online courses never enter the engine.
    pub fn is_cohort_based(&self) -> bool {
        matches!(self, Modality::Physical | Modality::Hybrid)
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(Modality::Online),
            "physical" => Ok(Modality::Physical),
            "hybrid" => Ok(Modality::Hybrid),
            _ => Err(format!("Unknown modality: {}", s)),
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Modality::Online => "online",
            Modality::Physical => "physical",
            Modality::Hybrid => "hybrid",
        };
        write!(f, "{}", s)
    }
}

/// A catalog offering. Read-only to the engine apart from the cohorts
/// created under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub modality: Modality,
    /// Maximum learners per cohort for physical/hybrid delivery.
    pub default_cohort_capacity: u32,
    /// Default instructor inherited by auto-created cohorts.
    pub instructor: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a course (catalog-side creation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
    pub title: String,
    pub modality: Modality,
    pub default_cohort_capacity: u32,
    #[serde(default)]
    pub instructor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modality_parsing() {
        assert_eq!("physical".parse::<Modality>().unwrap(), Modality::Physical);
        assert_eq!("Hybrid".parse::<Modality>().unwrap(), Modality::Hybrid);
        assert!("in-person".parse::<Modality>().is_err());
    }

    #[test]
    fn only_physical_and_hybrid_are_cohort_based() {
        assert!(!Modality::Online.is_cohort_based());
        assert!(Modality::Physical.is_cohort_based());
        assert!(Modality::Hybrid.is_cohort_based());
    }

    #[test]
    fn modality_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Modality::Hybrid).unwrap(), "\"hybrid\"");
    }
}
