//! Resolution of manual execution requests to the pipelines they target.
//!
//! Other trigger types scan every pipeline's trigger configurations for one
//! that matches an incoming event. A manual request is different: it names
//! its target pipeline directly (application plus name-or-id), so the handler
//! here only has to decide whether a candidate pipeline *is* that target and,
//! if so, construct the trigger to execute.
//!
//! The driving loop that iterates events and candidate pipelines, then
//! persists and executes the matches, lives outside this crate. It selects a handler
//! through [`HandlerRegistry`] and probes pipelines one at a time; a
//! non-match is `Ok(None)`, never an error.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::buildinfo::BuildInfoService;
use crate::errors::{BuildInfoError, ConversionError, TriggerError};
use crate::identifiers::ApplicationName;
use crate::types::{
    merge_notifications, Event, ManualEvent, ManualEventContent, Pipeline, Trigger,
    MANUAL_TRIGGER_TYPE,
};

// ---------------------------------------------------------------------------
// Handler capability set and dispatch table
// ---------------------------------------------------------------------------

/// Common capability set of per-event-type trigger handlers.
///
/// One implementation exists per event-type tag; [`HandlerRegistry`] selects
/// the handler whose [`handles_event_type`](Self::handles_event_type) accepts
/// an incoming event's tag.
#[async_trait]
pub trait TriggerEventHandler: Send + Sync {
    /// Whether this handler understands events with the given type tag.
    fn handles_event_type(&self, event_type: &str) -> bool;

    /// Resolves one event against one candidate pipeline.
    ///
    /// `Ok(None)` means the pipeline is not this event's target. `Ok(Some)`
    /// carries the pipeline with its executable trigger attached, ready for
    /// the execution layer.
    async fn match_pipeline(
        &self,
        event: &Event,
        pipeline: &Pipeline,
    ) -> Result<Option<Pipeline>, TriggerError>;
}

/// Dispatch table over [`TriggerEventHandler`]s, keyed by event-type tag.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn TriggerEventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn TriggerEventHandler>) {
        self.handlers.push(handler);
    }

    /// The first registered handler that accepts `event_type`, if any.
    pub fn handler_for(&self, event_type: &str) -> Option<&dyn TriggerEventHandler> {
        self.handlers
            .iter()
            .find(|handler| handler.handles_event_type(event_type))
            .map(|handler| handler.as_ref())
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Whether `pipeline` is the target a manual request names.
///
/// True iff the pipeline is not disabled, its application equals the
/// request's application, and its name *or* id equals `name_or_id`. All
/// comparisons are exact and case-sensitive; a disabled pipeline never
/// matches regardless of the other fields.
pub fn pipeline_matches(
    application: &ApplicationName,
    name_or_id: &str,
    pipeline: &Pipeline,
) -> bool {
    !pipeline.is_disabled()
        && pipeline.application() == application
        && (pipeline.name().as_str() == name_or_id || pipeline.id().as_str() == name_or_id)
}

// ---------------------------------------------------------------------------
// Manual event handler
// ---------------------------------------------------------------------------

/// What to do when the build-info provider fails during a match attempt.
///
/// The provider call is the only fallible external step in resolution, and
/// whether its failure should sink one match attempt or the caller's whole
/// evaluation batch is a deployment decision, so it is configuration here
/// rather than hard-coded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFailurePolicy {
    /// Return the lookup error from this match attempt. The caller sees the
    /// failure and decides what it sinks.
    #[default]
    Propagate,

    /// Log the lookup failure and treat this attempt as a non-match.
    DropMatch,
}

/// Handler for events of type `"manual"`: a user requesting a particular
/// pipeline to execute, possibly supplying parameters to include in the
/// trigger.
pub struct ManualEventHandler {
    build_info: Option<Arc<dyn BuildInfoService>>,
    failure_policy: ProviderFailurePolicy,
}

impl ManualEventHandler {
    /// Creates the handler. Passing no build-info service disables build
    /// metadata enrichment; everything else behaves identically.
    pub fn new(build_info: Option<Arc<dyn BuildInfoService>>) -> Self {
        Self {
            build_info,
            failure_policy: ProviderFailurePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_failure_policy(mut self, failure_policy: ProviderFailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Reads the typed manual request out of a generic event's payload.
    ///
    /// Fails when the payload does not have the manual-request shape or when
    /// `application`/`pipelineNameOrId` are missing or empty. The event's
    /// type tag is not consulted here; that is [`handles_event_type`]'s job
    /// in the dispatch table.
    ///
    /// [`handles_event_type`]: TriggerEventHandler::handles_event_type
    pub fn convert_event(&self, event: &Event) -> Result<ManualEvent, ConversionError> {
        let content: ManualEventContent = serde_json::from_value(event.content.clone())
            .map_err(|source| ConversionError::MalformedPayload { source })?;
        if content.application().as_str().is_empty() {
            return Err(ConversionError::MissingField {
                field: "application",
            });
        }
        if content.pipeline_name_or_id().is_empty() {
            return Err(ConversionError::MissingField {
                field: "pipelineNameOrId",
            });
        }
        Ok(ManualEvent::new(content))
    }

    /// Returns the enriched pipeline when `pipeline` is the request's target,
    /// `Ok(None)` otherwise.
    pub async fn with_matching_trigger(
        &self,
        manual_event: &ManualEvent,
        pipeline: &Pipeline,
    ) -> Result<Option<Pipeline>, TriggerError> {
        let content = manual_event.content();
        if !pipeline_matches(content.application(), content.pipeline_name_or_id(), pipeline) {
            return Ok(None);
        }
        debug!(
            application = %content.application(),
            pipeline = %pipeline.name(),
            "manual execution request matched pipeline"
        );
        match self.build_trigger(pipeline, content.trigger()).await {
            Ok(matched) => Ok(Some(matched)),
            Err(error) => match self.failure_policy {
                ProviderFailurePolicy::Propagate => Err(error.into()),
                ProviderFailurePolicy::DropMatch => {
                    warn!(
                        pipeline = %pipeline.name(),
                        %error,
                        "build info lookup failed; dropping this match attempt"
                    );
                    Ok(None)
                }
            },
        }
    }

    /// Constructs the pipeline state to execute: the manual trigger with
    /// authorization propagation forced on, merged notifications, and (when a
    /// provider is wired in and the trigger carries build provenance) build
    /// metadata and properties attached.
    async fn build_trigger(
        &self,
        pipeline: &Pipeline,
        manual_trigger: &Trigger,
    ) -> Result<Pipeline, BuildInfoError> {
        let notifications = merge_notifications(
            pipeline.notifications(),
            Some(manual_trigger.notifications()),
        );
        let mut trigger = manual_trigger.clone().with_propagate_auth(true);
        if let Some(service) = &self.build_info {
            if let Some(build_event) = manual_trigger.build_event() {
                let build_info = service.get_build_info(&build_event).await?;
                let properties = service
                    .get_properties(&build_event, manual_trigger.property_file())
                    .await?;
                trigger = trigger.with_build_info(build_info).with_properties(properties);
            }
        }
        Ok(pipeline
            .clone()
            .with_trigger(trigger)
            .with_notifications(notifications))
    }
}

#[async_trait]
impl TriggerEventHandler for ManualEventHandler {
    fn handles_event_type(&self, event_type: &str) -> bool {
        event_type.eq_ignore_ascii_case(MANUAL_TRIGGER_TYPE)
    }

    async fn match_pipeline(
        &self,
        event: &Event,
        pipeline: &Pipeline,
    ) -> Result<Option<Pipeline>, TriggerError> {
        let manual_event = self.convert_event(event)?;
        self.with_matching_trigger(&manual_event, pipeline).await
    }
}
