//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging — for example —
//! a [`PipelineId`] with a [`PipelineName`] even though both are `String` under
//! the hood.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — assigned by the upstream pipeline registry
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies the application that owns a pipeline.
    ///
    /// Every pipeline belongs to exactly one application; a manual execution
    /// request names the application alongside the pipeline.
    ApplicationName
}

string_id! {
    /// Identifies a pipeline definition within the registry.
    ///
    /// Assigned by the registry when the pipeline is saved; stable across
    /// renames. A manual execution request may target a pipeline by this id.
    PipelineId
}

string_id! {
    /// The human-chosen name of a pipeline, unique within its application.
    ///
    /// A manual execution request may target a pipeline by this name instead
    /// of its [`PipelineId`].
    PipelineName
}
