//! End-to-end resolution of manual execution requests against candidate
//! pipelines, including build-metadata enrichment through a fake provider.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use triggers::{
    ApplicationName, BuildEvent, BuildInfo, BuildInfoError, BuildInfoService, Event,
    ManualEventHandler, Notification, Pipeline, PipelineId, PipelineName, ProviderFailurePolicy,
    TriggerEventHandler, TriggerError,
};

// ---------------------------------------------------------------------------
// Fake provider
// ---------------------------------------------------------------------------

/// Build-info provider that records every lookup and answers with canned
/// values (or a canned failure).
#[derive(Default)]
struct RecordingBuildInfoService {
    build_info: Value,
    properties: Map<String, Value>,
    fail_lookups: bool,
    build_info_calls: Mutex<Vec<BuildEvent>>,
    property_calls: Mutex<Vec<(BuildEvent, Option<String>)>>,
}

impl RecordingBuildInfoService {
    fn returning(build_info: Value, properties: Map<String, Value>) -> Self {
        Self {
            build_info,
            properties,
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail_lookups: true,
            ..Self::default()
        }
    }

    fn build_info_calls(&self) -> Vec<BuildEvent> {
        self.build_info_calls.lock().unwrap().clone()
    }

    fn property_calls(&self) -> Vec<(BuildEvent, Option<String>)> {
        self.property_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildInfoService for RecordingBuildInfoService {
    async fn get_build_info(&self, event: &BuildEvent) -> Result<BuildInfo, BuildInfoError> {
        self.build_info_calls.lock().unwrap().push(event.clone());
        if self.fail_lookups {
            return Err(BuildInfoError::Service {
                status: 503,
                message: "ci master unavailable".to_string(),
                retry_after: None,
            });
        }
        Ok(self.build_info.clone())
    }

    async fn get_properties(
        &self,
        event: &BuildEvent,
        property_file: Option<&str>,
    ) -> Result<Map<String, Value>, BuildInfoError> {
        self.property_calls
            .lock()
            .unwrap()
            .push((event.clone(), property_file.map(str::to_string)));
        if self.fail_lookups {
            return Err(BuildInfoError::Service {
                status: 503,
                message: "ci master unavailable".to_string(),
                retry_after: None,
            });
        }
        Ok(self.properties.clone())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn deploy_pipeline() -> Pipeline {
    Pipeline::new(
        PipelineId::new("p1").unwrap(),
        PipelineName::new("Deploy").unwrap(),
        ApplicationName::new("myapp").unwrap(),
    )
}

fn manual_event(name_or_id: &str, trigger: Value) -> Event {
    Event::new(
        "manual",
        json!({
            "application": "myapp",
            "pipelineNameOrId": name_or_id,
            "trigger": trigger,
        }),
    )
}

fn notification(address: &str) -> Notification {
    let mut n = Notification::new();
    n.insert("address".to_string(), json!(address));
    n
}

// ---------------------------------------------------------------------------
// Matching scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolves_request_by_pipeline_name() {
    let handler = ManualEventHandler::new(None);
    let event = manual_event("Deploy", json!({ "type": "manual" }));

    let matched = handler
        .match_pipeline(&event, &deploy_pipeline())
        .await
        .unwrap()
        .expect("pipeline should match by name");

    assert_eq!(matched.id().as_str(), "p1");
    assert_eq!(matched.name().as_str(), "Deploy");
}

#[tokio::test]
async fn resolves_request_by_pipeline_id() {
    let handler = ManualEventHandler::new(None);
    let event = manual_event("p1", json!({ "type": "manual" }));

    let matched = handler
        .match_pipeline(&event, &deploy_pipeline())
        .await
        .unwrap();

    assert!(matched.is_some(), "pipeline should match by id");
}

#[tokio::test]
async fn disabled_pipeline_is_skipped() {
    let handler = ManualEventHandler::new(None);
    let event = manual_event("Deploy", json!({ "type": "manual" }));
    let disabled = deploy_pipeline().with_disabled(true);

    assert!(handler
        .match_pipeline(&event, &disabled)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn merges_notifications_pipeline_level_first() {
    let handler = ManualEventHandler::new(None);
    let event = manual_event(
        "Deploy",
        json!({
            "type": "manual",
            "notifications": [{ "address": "slack-requester" }],
        }),
    );
    let candidate = deploy_pipeline().with_notifications(vec![notification("slack-deploys")]);

    let matched = handler
        .match_pipeline(&event, &candidate)
        .await
        .unwrap()
        .expect("pipeline should match");

    assert_eq!(
        matched.notifications().unwrap(),
        vec![notification("slack-deploys"), notification("slack-requester")]
    );
}

// ---------------------------------------------------------------------------
// Enrichment scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn attaches_build_info_and_properties_from_provider() {
    let mut properties = Map::new();
    properties.insert("version".to_string(), json!("1.4.2"));
    let service = Arc::new(RecordingBuildInfoService::returning(
        json!({ "status": "SUCCESS" }),
        properties.clone(),
    ));
    let handler = ManualEventHandler::new(Some(service.clone()));

    let event = manual_event(
        "Deploy",
        json!({
            "type": "manual",
            "master": "jenkins",
            "job": "build-1",
            "buildNumber": 42,
            "propertyFile": "build.properties",
        }),
    );

    let matched = handler
        .match_pipeline(&event, &deploy_pipeline())
        .await
        .unwrap()
        .expect("pipeline should match");

    let trigger = matched.trigger().unwrap();
    assert!(trigger.propagate_auth());
    assert_eq!(trigger.build_info(), Some(&json!({ "status": "SUCCESS" })));
    assert_eq!(trigger.properties(), Some(&properties));

    let lookups = service.build_info_calls();
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].master(), "jenkins");
    assert_eq!(lookups[0].job_name(), "build-1");
    assert_eq!(lookups[0].build_number(), Some(42));

    let property_lookups = service.property_calls();
    assert_eq!(property_lookups.len(), 1);
    assert_eq!(
        property_lookups[0].1.as_deref(),
        Some("build.properties")
    );
}

#[tokio::test]
async fn skips_provider_when_job_is_empty() {
    let service = Arc::new(RecordingBuildInfoService::returning(
        json!({ "status": "SUCCESS" }),
        Map::new(),
    ));
    let handler = ManualEventHandler::new(Some(service.clone()));

    let event = manual_event(
        "Deploy",
        json!({ "type": "manual", "master": "jenkins", "job": "" }),
    );

    let matched = handler
        .match_pipeline(&event, &deploy_pipeline())
        .await
        .unwrap()
        .expect("pipeline should match");

    assert!(matched.trigger().unwrap().build_info().is_none());
    assert!(service.build_info_calls().is_empty());
    assert!(service.property_calls().is_empty());
}

#[tokio::test]
async fn provider_failure_propagates_by_default() {
    let service = Arc::new(RecordingBuildInfoService::failing());
    let handler = ManualEventHandler::new(Some(service));

    let event = manual_event(
        "Deploy",
        json!({ "type": "manual", "master": "jenkins", "job": "build-1" }),
    );

    let result = handler.match_pipeline(&event, &deploy_pipeline()).await;
    assert!(matches!(result, Err(TriggerError::BuildInfo(_))));
}

#[tokio::test]
async fn provider_failure_can_be_demoted_to_a_non_match() {
    let service = Arc::new(RecordingBuildInfoService::failing());
    let handler = ManualEventHandler::new(Some(service))
        .with_failure_policy(ProviderFailurePolicy::DropMatch);

    let event = manual_event(
        "Deploy",
        json!({ "type": "manual", "master": "jenkins", "job": "build-1" }),
    );

    let result = handler
        .match_pipeline(&event, &deploy_pipeline())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn other_pipelines_still_match_when_one_lookup_fails() {
    // One event probed against many pipelines: the non-target pipeline is a
    // clean non-match even though the provider would fail for the target.
    let service = Arc::new(RecordingBuildInfoService::failing());
    let handler = ManualEventHandler::new(Some(service));

    let event = manual_event(
        "Deploy",
        json!({ "type": "manual", "master": "jenkins", "job": "build-1" }),
    );
    let other = Pipeline::new(
        PipelineId::new("p2").unwrap(),
        PipelineName::new("Bake").unwrap(),
        ApplicationName::new("myapp").unwrap(),
    );

    assert!(handler
        .match_pipeline(&event, &other)
        .await
        .unwrap()
        .is_none());
}
