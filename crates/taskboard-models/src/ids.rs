//! Typed keys for board rows.
//!
//! The backend issues the keys as plain strings (usually bare uuids). The
//! wrappers exist so a task key cannot be passed where a project key is
//! expected. Rows created on this side get a prefixed v4 uuid, which keeps
//! them recognizable in logs until the backend echoes them back.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix of locally generated keys.
            pub const PREFIX: &'static str = $prefix;

            /// Generates a key for a row created on this side.
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::new_v4()))
            }

            /// Wraps a key issued by the backend.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Returns true if the key was generated locally.
            pub fn is_local(&self) -> bool {
                self.0
                    .strip_prefix($prefix)
                    .is_some_and(|rest| rest.starts_with('-'))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        // Lets maps keyed by id be queried with a plain `&str`.
        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

row_id!(
    /// Key of a task row.
    TaskId => "task"
);
row_id!(
    /// Key of a project, which is one board.
    ProjectId => "proj"
);
row_id!(
    /// Key of a team member.
    UserId => "user"
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_generated_key_is_local() {
        let id = TaskId::generate();
        assert!(id.as_str().starts_with("task-"));
        assert!(id.is_local());
    }

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(ProjectId::generate(), ProjectId::generate());
    }

    #[test]
    fn test_backend_key_is_not_local() {
        let id = TaskId::from_string("6f1c1d1e-0000-4000-8000-000000000001");
        assert_eq!(id.as_str(), "6f1c1d1e-0000-4000-8000-000000000001");
        assert!(!id.is_local());
        assert!(!TaskId::from("taskforce").is_local());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = UserId::from("user-7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"user-7\"");

        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_map_lookup_by_str() {
        let mut statuses = HashMap::new();
        statuses.insert(TaskId::from("t1"), 3);
        assert_eq!(statuses.get("t1"), Some(&3));
        assert_eq!(format!("{}", TaskId::from("t1")), "t1");
    }
}
