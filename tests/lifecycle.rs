mod common;

use agentlet::agentlet::{
    ActivationContext, Agentlet, AgentletMetadata, AgentletResult, Pattern, PatternSet,
};
use agentlet::events::RegistryEvent;
use agentlet::registry::{ActivationOutcome, AgentletRegistry};
use async_trait::async_trait;
use common::{count, eventually, harness, hook_log, topics, HookLog, RecordingAgentlet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Agentlet whose `activate` unregisters another agentlet.
struct UnregisteringAgentlet {
    name: String,
    patterns: PatternSet,
    registry: AgentletRegistry,
    target: String,
    log: HookLog,
}

impl UnregisteringAgentlet {
    fn shared(name: &str, pattern: &str, registry: &AgentletRegistry, target: &str, log: &HookLog) -> Arc<dyn Agentlet> {
        Arc::new(Self {
            name: name.to_string(),
            patterns: PatternSet::new(vec![Pattern::contains(pattern)]),
            registry: registry.clone(),
            target: target.to_string(),
            log: log.clone(),
        })
    }
}

#[async_trait]
impl Agentlet for UnregisteringAgentlet {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_pattern(&self, url: &str) -> bool {
        self.patterns.matches(url)
    }

    async fn init(&self) -> AgentletResult<()> {
        Ok(())
    }

    async fn activate(&self, _ctx: &ActivationContext) -> AgentletResult<()> {
        self.registry.unregister(&self.target).await;
        Ok(())
    }

    async fn cleanup(&self, _ctx: &ActivationContext) -> AgentletResult<()> {
        self.log.lock().unwrap().push(format!("{}:cleanup", self.name));
        Ok(())
    }

    fn metadata(&self) -> AgentletMetadata {
        AgentletMetadata::new(&self.name, "test").with_patterns(self.patterns.patterns())
    }
}

#[tokio::test]
async fn test_register_emits_detected_then_activated() {
    let h = harness("https://example.com/x");
    let mut rx = h.registry.subscribe();
    let log = hook_log();

    h.registry
        .register(RecordingAgentlet::new("A", "example.com", &log).shared())
        .await
        .unwrap();

    let events = rx.drain();
    assert_eq!(
        &topics(&events)[..3],
        &["module:registered", "application:detected", "module:activated"]
    );
    match &events[2] {
        RegistryEvent::ModuleActivated { module, context } => {
            assert_eq!(module, "A");
            assert_eq!(context.trigger.as_deref(), Some("url-change"));
            assert_eq!(context.url, "https://example.com/x");
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(*log.lock().unwrap(), vec!["A:init", "A:activate:start", "A:activate"]);
}

#[tokio::test]
async fn test_overlapping_patterns_first_registered_wins() {
    let h = harness("https://nowhere.test/");
    let log = hook_log();

    h.registry
        .register(RecordingAgentlet::new("broad", "shop", &log).shared())
        .await
        .unwrap();
    h.registry
        .register(RecordingAgentlet::new("narrow", "shop.test/cart", &log).shared())
        .await
        .unwrap();

    let found = h.registry.find_matching_agentlet("https://shop.test/cart").unwrap();
    assert_eq!(found.name(), "broad");

    h.location.push_state("https://shop.test/cart");
    h.registry.check_url_change().await;
    assert_eq!(h.registry.active_agentlet_name().as_deref(), Some("broad"));
}

#[tokio::test]
async fn test_same_instance_twice_does_not_reinit() {
    let h = harness("https://example.com/");
    let log = hook_log();
    let agentlet = RecordingAgentlet::new("A", "example.com", &log).shared();

    tokio_test::assert_ok!(h.registry.register(agentlet.clone()).await);
    assert!(!h.registry.register(agentlet).await.unwrap());

    assert_eq!(h.registry.metrics().total_agentlets, 1);
    assert_eq!(count(&log, "A:init"), 1);
}

#[tokio::test]
async fn test_concurrent_activation_runs_hook_once() {
    let h = harness("https://nowhere.test/");
    let log = hook_log();
    h.registry
        .register(
            RecordingAgentlet::new("A", "example.com", &log)
                .slow_activate(Duration::from_millis(50))
                .shared(),
        )
        .await
        .unwrap();

    let ctx = ActivationContext::new("https://example.com/").with_trigger("api");
    let (first, second) = tokio::join!(
        h.registry.activate_agentlet("A", ctx.clone()),
        h.registry.activate_agentlet("A", ctx)
    );

    let mut outcomes = vec![first.unwrap(), second.unwrap()];
    outcomes.sort_by_key(|o| format!("{:?}", o));
    assert_eq!(outcomes, vec![ActivationOutcome::Activated, ActivationOutcome::Coalesced]);
    assert_eq!(count(&log, "A:activate"), 1);
    assert_eq!(h.registry.metrics().activation_attempts, 1);
}

#[tokio::test]
async fn test_switching_cleans_up_before_activating() {
    let h = harness("https://a.com/");
    let mut rx = h.registry.subscribe();
    let log = hook_log();

    h.registry
        .register(RecordingAgentlet::new("A", "a.com", &log).shared())
        .await
        .unwrap();
    h.registry
        .register(RecordingAgentlet::new("B", "b.com", &log).shared())
        .await
        .unwrap();
    rx.drain();

    h.location.push_state("https://b.com/");
    h.registry.check_url_change().await;

    let entries = log.lock().unwrap().clone();
    let cleanup = entries.iter().position(|e| e == "A:cleanup").unwrap();
    let activate = entries.iter().position(|e| e == "B:activate:start").unwrap();
    assert!(cleanup < activate);

    let transitions: Vec<_> = rx
        .drain()
        .into_iter()
        .filter(|e| matches!(e.topic(), "module:deactivated" | "module:activated"))
        .map(|e| (e.topic(), e.module().unwrap_or_default().to_string()))
        .collect();
    assert_eq!(
        transitions,
        vec![
            ("module:deactivated", "A".to_string()),
            ("module:activated", "B".to_string())
        ]
    );
}

#[tokio::test]
async fn test_unregister_active_cleans_up_once() {
    let h = harness("https://example.com/");
    let mut rx = h.registry.subscribe();
    let log = hook_log();
    h.registry
        .register(RecordingAgentlet::new("A", "example.com", &log).shared())
        .await
        .unwrap();

    assert!(h.registry.unregister("A").await);

    assert!(h.registry.active_agentlet().is_none());
    assert!(h.registry.is_empty());
    assert_eq!(count(&log, "A:cleanup"), 1);
    let seen = topics(&rx.drain());
    assert!(seen.contains(&"module:deactivated"));
    assert_eq!(seen.last(), Some(&"module:unregistered"));
}

#[tokio::test]
async fn test_unregister_inactive_still_cleans_up() {
    let h = harness("https://other.org/");
    let log = hook_log();
    h.registry
        .register(RecordingAgentlet::new("A", "example.com", &log).shared())
        .await
        .unwrap();

    assert!(h.registry.unregister("A").await);
    assert_eq!(count(&log, "A:cleanup"), 1);
}

#[tokio::test]
async fn test_failed_activation_does_not_restore_previous() {
    let h = harness("https://a.com/");
    let mut rx = h.registry.subscribe();
    let log = hook_log();

    h.registry
        .register(RecordingAgentlet::new("A", "a.com", &log).shared())
        .await
        .unwrap();
    h.registry
        .register(RecordingAgentlet::new("B", "b.com", &log).failing_activate().shared())
        .await
        .unwrap();
    assert_eq!(h.registry.active_agentlet_name().as_deref(), Some("A"));

    let outcome = h
        .registry
        .activate_agentlet("B", ActivationContext::new("https://b.com/"))
        .await
        .unwrap();

    assert_eq!(outcome, ActivationOutcome::Failed("activate exploded".to_string()));
    assert!(h.registry.active_agentlet().is_none());
    assert_eq!(count(&log, "A:cleanup"), 1);
    assert_eq!(h.registry.metrics().activation_failures, 1);

    let failure = rx
        .drain()
        .into_iter()
        .find(|e| e.topic() == "module:activationFailed")
        .unwrap();
    match failure {
        RegistryEvent::ModuleActivationFailed { module, error } => {
            assert_eq!(module, "B");
            assert_eq!(error, "activate exploded");
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_init_runs_once_across_reactivation() {
    let h = harness("https://example.com/");
    let log = hook_log();
    h.registry
        .register(RecordingAgentlet::new("A", "example.com", &log).shared())
        .await
        .unwrap();

    assert!(h.registry.deactivate_agentlet().await);
    let outcome = h
        .registry
        .activate_agentlet("A", ActivationContext::new("https://example.com/"))
        .await
        .unwrap();

    assert_eq!(outcome, ActivationOutcome::Activated);
    assert_eq!(count(&log, "A:init"), 1);
    assert_eq!(count(&log, "A:activate"), 2);
}

#[tokio::test]
async fn test_failed_init_is_reported() {
    let h = harness("https://example.com/");
    let mut rx = h.registry.subscribe();
    let log = hook_log();
    h.registry
        .register(RecordingAgentlet::new("A", "example.com", &log).failing_init().shared())
        .await
        .unwrap();

    assert!(h.registry.active_agentlet().is_none());
    assert!(!h.registry.is_initialized("A"));
    assert_eq!(count(&log, "A:activate:start"), 0);
    assert!(topics(&rx.drain()).contains(&"module:activationFailed"));
}

#[tokio::test]
async fn test_cleanup_error_still_deactivates() {
    let h = harness("https://example.com/");
    let mut rx = h.registry.subscribe();
    let log = hook_log();
    h.registry
        .register(RecordingAgentlet::new("A", "example.com", &log).failing_cleanup().shared())
        .await
        .unwrap();
    rx.drain();

    assert!(h.registry.deactivate_agentlet().await);
    assert!(h.registry.active_agentlet().is_none());
    assert_eq!(topics(&rx.drain()), vec!["module:deactivated"]);
    assert!(!h.registry.deactivate_agentlet().await);
}

#[tokio::test]
async fn test_not_detected_and_url_changed_events() {
    let h = harness("https://example.com/");
    let log = hook_log();
    h.registry
        .register(RecordingAgentlet::new("A", "example.com", &log).shared())
        .await
        .unwrap();
    let mut rx = h.registry.subscribe();

    h.location.push_state("https://elsewhere.org/");
    h.registry.check_url_change().await;

    let events = rx.drain();
    assert_eq!(
        topics(&events),
        vec!["application:notDetected", "module:deactivated", "url:changed"]
    );
    match events.last().unwrap() {
        RegistryEvent::UrlChanged { old_url, new_url } => {
            assert_eq!(old_url.as_deref(), Some("https://example.com/"));
            assert_eq!(new_url, "https://elsewhere.org/");
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_replacing_active_agentlet_cleans_up_old_instance() {
    let h = harness("https://example.com/");
    let old_log = hook_log();
    let new_log = hook_log();

    h.registry
        .register(RecordingAgentlet::new("A", "example.com", &old_log).shared())
        .await
        .unwrap();
    h.registry
        .register(RecordingAgentlet::new("A", "example.com", &new_log).shared())
        .await
        .unwrap();

    assert_eq!(count(&old_log, "A:cleanup"), 1);
    assert_eq!(count(&new_log, "A:activate"), 1);
    assert_eq!(h.registry.len(), 1);
    assert_eq!(h.registry.metrics().total_agentlets, 2);
}

#[tokio::test]
async fn test_monitor_follows_history_navigation() {
    let h = harness("https://a.com/");
    let log = hook_log();
    h.registry
        .register(RecordingAgentlet::new("A", "a.com", &log).shared())
        .await
        .unwrap();
    h.registry
        .register(RecordingAgentlet::new("B", "b.com", &log).shared())
        .await
        .unwrap();

    assert!(h.registry.start().await);
    assert!(h.registry.is_monitoring());

    h.location.push_state("https://b.com/page");
    assert!(eventually(|| h.registry.active_agentlet_name().as_deref() == Some("B")).await);

    h.location.back();
    assert!(eventually(|| h.registry.active_agentlet_name().as_deref() == Some("A")).await);

    h.registry.stop();
    assert!(!h.registry.is_monitoring());
}

#[tokio::test]
async fn test_polling_catches_silent_address_change() {
    let h = harness("https://a.com/");
    let log = hook_log();
    h.registry
        .register(RecordingAgentlet::new("B", "b.com", &log).shared())
        .await
        .unwrap();
    h.registry.start().await;

    h.location.set_href("https://b.com/");
    assert!(eventually(|| h.registry.active_agentlet_name().as_deref() == Some("B")).await);
    h.registry.stop();
}

#[tokio::test]
async fn test_destroy_cleans_everything_up() {
    let h = harness("https://a.com/");
    let log = hook_log();
    h.registry
        .register(RecordingAgentlet::new("A", "a.com", &log).shared())
        .await
        .unwrap();
    h.registry
        .register(RecordingAgentlet::new("B", "b.com", &log).shared())
        .await
        .unwrap();
    h.registry.start().await;

    h.registry.destroy().await;

    assert!(!h.registry.is_monitoring());
    assert!(h.registry.is_empty());
    assert_eq!(count(&log, "A:cleanup"), 1);
    assert_eq!(count(&log, "B:cleanup"), 1);
    assert_eq!(h.registry.metrics().total_agentlets, 0);
}

#[tokio::test]
async fn test_hook_can_call_back_into_registry() {
    let h = harness("https://nowhere.test/");
    let log = hook_log();
    h.registry
        .register(RecordingAgentlet::new("C", "c.com", &log).shared())
        .await
        .unwrap();
    h.registry
        .register(UnregisteringAgentlet::shared("R", "r.com", &h.registry, "C", &log))
        .await
        .unwrap();

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        h.registry.activate_agentlet("R", ActivationContext::new("https://r.com/")),
    )
    .await
    .expect("activation returned")
    .unwrap();

    assert_eq!(outcome, ActivationOutcome::Activated);
    assert_eq!(h.registry.active_agentlet_name().as_deref(), Some("R"));
    assert!(h.registry.get_agentlet("C").is_none());
    assert_eq!(count(&log, "C:cleanup"), 1);

    h.location.push_state("https://elsewhere.test/");
    tokio::time::timeout(Duration::from_secs(2), h.registry.check_url_change())
        .await
        .expect("address check returned");
    assert!(h.registry.active_agentlet().is_none());
}

#[tokio::test]
async fn test_agentlet_unregistered_by_its_own_activate_is_not_committed() {
    let h = harness("https://nowhere.test/");
    let log = hook_log();
    h.registry
        .register(UnregisteringAgentlet::shared("R", "r.com", &h.registry, "R", &log))
        .await
        .unwrap();

    let outcome = h
        .registry
        .activate_agentlet("R", ActivationContext::new("https://r.com/"))
        .await
        .unwrap();

    assert_eq!(outcome, ActivationOutcome::Superseded);
    assert!(h.registry.active_agentlet().is_none());
    assert!(h.registry.is_empty());
    assert_eq!(count(&log, "R:cleanup"), 1);
}

#[tokio::test]
async fn test_slow_activate_does_not_block_other_agentlets() {
    let h = harness("https://nowhere.test/");
    let log = hook_log();
    h.registry
        .register(
            RecordingAgentlet::new("A", "a.com", &log)
                .slow_activate(Duration::from_millis(300))
                .shared(),
        )
        .await
        .unwrap();
    h.registry
        .register(RecordingAgentlet::new("C", "c.com", &log).shared())
        .await
        .unwrap();

    let registry = h.registry.clone();
    let activation =
        tokio::spawn(async move { registry.activate_agentlet("A", ActivationContext::new("https://a.com/")).await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(count(&log, "A:activate:start"), 1);

    let started = Instant::now();
    assert!(h.registry.unregister("C").await);
    assert!(started.elapsed() < Duration::from_millis(150));
    assert!(!activation.is_finished());

    assert_eq!(activation.await.unwrap().unwrap(), ActivationOutcome::Activated);
    assert_eq!(h.registry.active_agentlet_name().as_deref(), Some("A"));
}

#[tokio::test]
async fn test_overlapping_checks_announce_detection_once() {
    let h = harness("https://nowhere.test/");
    let log = hook_log();
    h.registry
        .register(
            RecordingAgentlet::new("A", "a.com", &log)
                .slow_activate(Duration::from_millis(50))
                .shared(),
        )
        .await
        .unwrap();
    let mut rx = h.registry.subscribe();

    h.location.push_state("https://a.com/");
    tokio::join!(h.registry.check_url_change(), h.registry.check_url_change());

    let seen = topics(&rx.drain());
    assert_eq!(seen.iter().filter(|t| **t == "application:detected").count(), 1);
    assert_eq!(seen.iter().filter(|t| **t == "module:activated").count(), 1);
    assert_eq!(count(&log, "A:activate"), 1);
}
