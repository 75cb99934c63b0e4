//! Shared value types for the trigger resolution domain.
//!
//! Everything here is an immutable value object: transformations go through
//! `with_*` methods that return a new value and never mutate the input. This
//! keeps concurrent matching of one event against many pipelines safe without
//! any locking.
//!
//! Wire casing follows the upstream JSON (`pipelineNameOrId`, `propagateAuth`,
//! `buildNumber`), so these types deserialize the registry and ingestion
//! payloads directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::identifiers::{ApplicationName, PipelineId, PipelineName};

/// Event-type tag carried by manual execution requests, and the trigger type
/// recorded on the triggers they produce.
pub const MANUAL_TRIGGER_TYPE: &str = "manual";

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A notification configuration as supplied upstream.
///
/// Opaque to this crate: notification lists are concatenated, never
/// deduplicated or validated here.
pub type Notification = Map<String, Value>;

/// Combines pipeline-level and trigger-level notification lists.
///
/// Order-preserving concatenation with the pipeline-level entries first.
/// Absent lists are treated as empty; the result may be empty but is never
/// absent.
pub fn merge_notifications(
    pipeline_notifications: Option<&[Notification]>,
    trigger_notifications: Option<&[Notification]>,
) -> Vec<Notification> {
    let mut merged = Vec::new();
    if let Some(pipeline_level) = pipeline_notifications {
        merged.extend_from_slice(pipeline_level);
    }
    if let Some(trigger_level) = trigger_notifications {
        merged.extend_from_slice(trigger_level);
    }
    merged
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A generic event as delivered by the upstream ingestion layer.
///
/// The envelope is opaque apart from its type discriminator; typed views such
/// as [`ManualEvent`] are produced by the matching handler's `convert_event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Type discriminator used to select a handler (e.g. `"manual"`).
    #[serde(rename = "type")]
    pub event_type: String,

    /// Arbitrary payload; its shape depends on the event type.
    #[serde(default)]
    pub content: Value,

    /// Ingestion-assigned identifier, when the transport provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,

    /// When the event entered the system, when the transport records it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl Event {
    /// Creates an envelope with the given type tag and payload.
    pub fn new(event_type: impl Into<String>, content: Value) -> Self {
        Self {
            event_type: event_type.into(),
            content,
            event_id: None,
            created: None,
        }
    }
}

// ---------------------------------------------------------------------------

/// Typed view of an [`Event`] carrying a manual execution request.
///
/// Unlike other trigger events, a manual request names its target pipeline
/// directly; there is no trigger-configuration scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualEvent {
    content: ManualEventContent,
}

impl ManualEvent {
    pub fn new(content: ManualEventContent) -> Self {
        Self { content }
    }

    pub fn content(&self) -> &ManualEventContent {
        &self.content
    }
}

/// Payload of a manual execution request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEventContent {
    /// Application owning the target pipeline.
    application: ApplicationName,

    /// The target pipeline's name or registry id, compared exactly against
    /// both.
    pipeline_name_or_id: String,

    /// Execution parameters supplied with the request. Absent in the payload
    /// means an empty manual trigger.
    #[serde(default)]
    trigger: Trigger,

    /// The user who requested the execution, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

impl ManualEventContent {
    pub fn new(
        application: ApplicationName,
        pipeline_name_or_id: impl Into<String>,
        trigger: Trigger,
    ) -> Self {
        Self {
            application,
            pipeline_name_or_id: pipeline_name_or_id.into(),
            trigger,
            user: None,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn application(&self) -> &ApplicationName {
        &self.application
    }

    pub fn pipeline_name_or_id(&self) -> &str {
        &self.pipeline_name_or_id
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// Execution parameters and provenance attached to one pipeline execution
/// request.
///
/// Manual triggers replicate build events inline rather than referencing a
/// separate event: the optional `master`/`job`/`buildNumber` fields identify
/// the build a request originates from, and [`Trigger::build_event`] recovers
/// the build-identification record from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    #[serde(rename = "type", default = "default_trigger_type")]
    trigger_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    master: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    job: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    build_number: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    property_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Map<String, Value>>,

    #[serde(default)]
    propagate_auth: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    notifications: Vec<Notification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    build_info: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<Map<String, Value>>,
}

fn default_trigger_type() -> String {
    MANUAL_TRIGGER_TYPE.to_string()
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            trigger_type: default_trigger_type(),
            user: None,
            master: None,
            job: None,
            build_number: None,
            property_file: None,
            parameters: None,
            propagate_auth: false,
            notifications: Vec::new(),
            build_info: None,
            properties: None,
        }
    }
}

impl Trigger {
    /// An empty manual trigger.
    pub fn manual() -> Self {
        Self::default()
    }

    pub fn trigger_type(&self) -> &str {
        &self.trigger_type
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn master(&self) -> Option<&str> {
        self.master.as_deref()
    }

    pub fn job(&self) -> Option<&str> {
        self.job.as_deref()
    }

    pub fn build_number(&self) -> Option<u64> {
        self.build_number
    }

    pub fn property_file(&self) -> Option<&str> {
        self.property_file.as_deref()
    }

    pub fn parameters(&self) -> Option<&Map<String, Value>> {
        self.parameters.as_ref()
    }

    pub fn propagate_auth(&self) -> bool {
        self.propagate_auth
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn build_info(&self) -> Option<&Value> {
        self.build_info.as_ref()
    }

    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.properties.as_ref()
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn with_master(mut self, master: impl Into<String>) -> Self {
        self.master = Some(master.into());
        self
    }

    #[must_use]
    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.job = Some(job.into());
        self
    }

    #[must_use]
    pub fn with_build_number(mut self, build_number: u64) -> Self {
        self.build_number = Some(build_number);
        self
    }

    #[must_use]
    pub fn with_property_file(mut self, property_file: impl Into<String>) -> Self {
        self.property_file = Some(property_file.into());
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    #[must_use]
    pub fn with_propagate_auth(mut self, propagate_auth: bool) -> Self {
        self.propagate_auth = propagate_auth;
        self
    }

    #[must_use]
    pub fn with_notifications(mut self, notifications: Vec<Notification>) -> Self {
        self.notifications = notifications;
        self
    }

    #[must_use]
    pub fn with_build_info(mut self, build_info: Value) -> Self {
        self.build_info = Some(build_info);
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Recovers the build-identification record encoded inline on this
    /// trigger.
    ///
    /// Present iff both `master` and `job` are non-empty; the build number is
    /// copied verbatim and may be absent. Empty strings count as unset.
    pub fn build_event(&self) -> Option<BuildEvent> {
        match (self.master.as_deref(), self.job.as_deref()) {
            (Some(master), Some(job)) if !master.is_empty() && !job.is_empty() => {
                Some(BuildEvent::new(master, job, self.build_number))
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Build events
// ---------------------------------------------------------------------------

/// Identification record for a build: the source system (`master`), the job,
/// and optionally which run of it.
///
/// This is the input shape the external build-info provider expects; it is
/// synthesised from a [`Trigger`] and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildEvent {
    project: BuildProject,
    master: String,
}

/// The job-and-run half of a [`BuildEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildProject {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    build_number: Option<u64>,
}

impl BuildEvent {
    pub fn new(master: impl Into<String>, job: impl Into<String>, build_number: Option<u64>) -> Self {
        Self {
            project: BuildProject {
                name: job.into(),
                build_number,
            },
            master: master.into(),
        }
    }

    /// The build-source identifier (e.g. the CI master the job runs on).
    pub fn master(&self) -> &str {
        &self.master
    }

    pub fn job_name(&self) -> &str {
        &self.project.name
    }

    pub fn build_number(&self) -> Option<u64> {
        self.project.build_number
    }
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

/// A pipeline definition as supplied by the external registry.
///
/// This crate only reads pipelines and returns transformed copies; fields it
/// does not model pass through untouched in `rest`, so nothing the registry
/// stored is dropped on the way out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    id: PipelineId,
    name: PipelineName,
    application: ApplicationName,

    #[serde(default)]
    disabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    notifications: Option<Vec<Notification>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    trigger: Option<Trigger>,

    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl Pipeline {
    pub fn new(id: PipelineId, name: PipelineName, application: ApplicationName) -> Self {
        Self {
            id,
            name,
            application,
            disabled: false,
            notifications: None,
            trigger: None,
            rest: Map::new(),
        }
    }

    pub fn id(&self) -> &PipelineId {
        &self.id
    }

    pub fn name(&self) -> &PipelineName {
        &self.name
    }

    pub fn application(&self) -> &ApplicationName {
        &self.application
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn notifications(&self) -> Option<&[Notification]> {
        self.notifications.as_deref()
    }

    pub fn trigger(&self) -> Option<&Trigger> {
        self.trigger.as_ref()
    }

    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    #[must_use]
    pub fn with_notifications(mut self, notifications: Vec<Notification>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    #[must_use]
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }
}
