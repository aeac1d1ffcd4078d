//! Named collections of the application database.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// A logical partition of the database, mapped 1:1 to a physical collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Registered users and their applications.
    Users,
    /// Scratch collection for manual and automated testing.
    Testing,
}

impl Collection {
    /// Every collection, in declaration order.
    pub const ALL: [Self; 2] = [Self::Users, Self::Testing];

    /// Physical collection name in the store.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Testing => "testing",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| DocumentError::UnknownCollection(s.to_string()))
    }
}
