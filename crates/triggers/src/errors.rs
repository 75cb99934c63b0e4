//! Error types for the trigger resolution domain.
//!
//! Absence of a match is never an error; it is the common case when one
//! event is probed against many pipelines and is represented as `Ok(None)`
//! throughout. The error types here cover the two genuine failure modes:
//! a payload that cannot be read as a manual execution request, and a failed
//! build-info lookup.
//!
//! [`RetryPolicy`] is a cross-cutting concern: any error type that
//! participates in retry decisions must be able to produce a [`RetryPolicy`].
//! This crate never retries anything itself; the policy is advice to the
//! caller driving the match loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// Returned by infrastructure error types to let the caller decide whether to
/// re-invoke an operation without escalating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    ///
    /// `after` optionally specifies the minimum delay before retrying (e.g.
    /// derived from `Retry-After` or `x-ratelimit-reset` response headers).
    Retryable {
        /// Minimum back-off before the next attempt. `None` means retry
        /// immediately or apply the caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried; escalation is required.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Conversion errors
// ---------------------------------------------------------------------------

/// A raw event's payload could not be interpreted as a manual execution
/// request.
///
/// Surfaced to the caller as-is; conversion is never retried.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The payload does not have the manual-request shape at all.
    #[error("event content is not a manual execution request: {source}")]
    MalformedPayload {
        #[source]
        source: serde_json::Error,
    },

    /// The payload parsed but a required field is missing or empty.
    #[error("manual execution request is missing required field `{field}`")]
    MissingField {
        /// Wire name of the offending field (e.g. `pipelineNameOrId`).
        field: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Build-info lookup errors
// ---------------------------------------------------------------------------

/// A build-info provider call failed.
///
/// Produced by infrastructure implementations of
/// [`crate::buildinfo::BuildInfoService`]; the domain propagates these
/// unmodified. Provider-specific error detail is flattened into messages so
/// transport types never leak across the port boundary.
#[derive(Debug, Error)]
pub enum BuildInfoError {
    /// The provider answered with a non-success status.
    #[error("build info service returned status {status}: {message}")]
    Service {
        /// HTTP status code (or provider-equivalent).
        status: u16,
        /// Response body or provider-supplied description.
        message: String,
        /// Back-off requested by the provider, when it sent one.
        retry_after: Option<Duration>,
    },

    /// The provider could not be reached at all.
    #[error("build info service unreachable: {message}")]
    Transport { message: String },

    /// The provider answered but the body could not be decoded.
    #[error("build info response could not be decoded: {message}")]
    Decode { message: String },
}

impl BuildInfoError {
    /// Whether the failed lookup is worth re-attempting.
    ///
    /// Rate limiting and server-side failures are retryable (honouring any
    /// provider-requested back-off), as are transport failures. Client-side
    /// rejections and undecodable bodies are not.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Service {
                status, retry_after, ..
            } if *status == 429 || *status >= 500 => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::Service { .. } => RetryPolicy::NonRetryable,
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            Self::Decode { .. } => RetryPolicy::NonRetryable,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level errors
// ---------------------------------------------------------------------------

/// Everything that can go wrong while resolving one event against one
/// pipeline.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    BuildInfo(#[from] BuildInfoError),

    /// Invalid wiring, detected at construction time (e.g. a build-info
    /// endpoint URL that cannot be parsed). Never produced per-event.
    #[error("configuration error: {message}")]
    Configuration { message: String },
}
