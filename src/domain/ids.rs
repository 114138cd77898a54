use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a fresh random identifier
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }

            /// Returns the string representation
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a board
    BoardId
);
entity_id!(
    /// Unique identifier for a column within a board
    ColumnId
);
entity_id!(
    /// Unique identifier for a task
    TaskId
);
entity_id!(
    /// Unique identifier for a subtask
    SubtaskId
);
entity_id!(
    /// Unique identifier for the account that owns boards
    OwnerId
);
