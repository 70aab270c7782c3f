//! Launch plan identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of the launch plan a schedule belongs to.
///
/// A schedule has the same identity as the launch plan it drives, so this
/// doubles as the registry's primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    pub project: String,
    pub domain: String,
    pub name: String,
    pub version: String,
}

impl Identifier {
    pub fn new(
        project: impl Into<String>,
        domain: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            domain: domain.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.project, self.domain, self.name, self.version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display() {
        let id = Identifier::new("flytesnacks", "development", "daily_report", "v1");
        assert_eq!(id.to_string(), "flytesnacks:development:daily_report:v1");
    }

    #[test]
    fn test_identifier_ordering_is_field_wise() {
        let a = Identifier::new("p", "d", "a", "v1");
        let b = Identifier::new("p", "d", "b", "v1");
        assert!(a < b);
    }
}
