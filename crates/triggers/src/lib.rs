//! Core trigger resolution domain for TriggerWorks.
//!
//! This crate resolves an incoming manual execution request to the exact
//! pipeline definition it targets and produces an enriched, executable
//! trigger for it. It contains every domain concept, newtype identifier,
//! shared value type, and cross-cutting error type involved in that
//! resolution. Infrastructure crates implement the port traits defined here;
//! they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed (the build-info provider contract); an
//! infrastructure crate defines *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype domain identifiers (`ApplicationName`, `PipelineId`, `PipelineName`) |
//! | [`types`] | Shared value types (`Event`, `Pipeline`, `Trigger`, `BuildEvent`, etc.) |
//! | [`errors`] | Error and retry-policy types |
//! | [`buildinfo`] | Port trait for the external build-info provider |
//! | [`handler`] | Manual event handler, pipeline matcher, and handler dispatch table |

pub mod buildinfo;
pub mod errors;
pub mod handler;
pub mod identifiers;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use buildinfo::{BuildInfo, BuildInfoService};
pub use errors::{BuildInfoError, ConversionError, RetryPolicy, TriggerError};
pub use handler::{
    pipeline_matches, HandlerRegistry, ManualEventHandler, ProviderFailurePolicy,
    TriggerEventHandler,
};
pub use identifiers::{ApplicationName, PipelineId, PipelineName};
pub use types::{
    merge_notifications, BuildEvent, BuildProject, Event, ManualEvent, ManualEventContent,
    Notification, Pipeline, Trigger, MANUAL_TRIGGER_TYPE,
};
