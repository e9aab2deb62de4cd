//! Instructor location lookup capability.
//!
//! The default session location comes from the instructor's profile, which
//! lives in an external account system. The engine depends on this small
//! injected interface instead of that system directly.

use std::collections::HashMap;

/// Resolves an instructor's default teaching location, if known.
pub trait LocationDirectory: Send + Sync {
    fn location_for(&self, instructor: &str) -> Option<String>;
}

/// Directory that knows no locations; sessions default to an empty
/// location string.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocations;

impl LocationDirectory for NoLocations {
    fn location_for(&self, _instructor: &str) -> Option<String> {
        None
    }
}

/// Fixed instructor→location mapping, useful for tests and single-site
/// deployments.
#[derive(Debug, Default, Clone)]
pub struct StaticLocations {
    locations: HashMap<String, String>,
}

impl StaticLocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, instructor: impl Into<String>, location: impl Into<String>) -> Self {
        self.locations.insert(instructor.into(), location.into());
        self
    }
}

impl LocationDirectory for StaticLocations {
    fn location_for(&self, instructor: &str) -> Option<String> {
        self.locations.get(instructor).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_directory_lookup() {
        let dir = StaticLocations::new().with("mara", "Lab 2, North Campus");
        assert_eq!(
            dir.location_for("mara").as_deref(),
            Some("Lab 2, North Campus")
        );
        assert_eq!(dir.location_for("unknown"), None);
    }
}
