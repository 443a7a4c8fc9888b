#![allow(dead_code)]

use agentlet::agentlet::{
    ActivationContext, Agentlet, AgentletError, AgentletMetadata, AgentletResult, Pattern, PatternSet,
};
use agentlet::config::{LoaderConfig, RegistryConfig};
use agentlet::events::RegistryEvent;
use agentlet::loader::{ExportTable, StaticFetcher};
use agentlet::navigation::SharedLocation;
use agentlet::registry::AgentletRegistry;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared, ordered log of hook calls such as `"A:activate"`.
pub type HookLog = Arc<Mutex<Vec<String>>>;

pub fn hook_log() -> HookLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn count(log: &HookLog, entry: &str) -> usize {
    log.lock().unwrap().iter().filter(|e| *e == entry).count()
}

/// Agentlet that records every hook call.
pub struct RecordingAgentlet {
    name: String,
    patterns: PatternSet,
    log: HookLog,
    activate_delay: Duration,
    fail_init: bool,
    fail_activate: bool,
    fail_cleanup: bool,
}

impl RecordingAgentlet {
    pub fn new(name: &str, pattern: &str, log: &HookLog) -> Self {
        Self {
            name: name.to_string(),
            patterns: PatternSet::new(vec![Pattern::contains(pattern)]),
            log: log.clone(),
            activate_delay: Duration::ZERO,
            fail_init: false,
            fail_activate: false,
            fail_cleanup: false,
        }
    }

    pub fn slow_activate(mut self, delay: Duration) -> Self {
        self.activate_delay = delay;
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_activate(mut self) -> Self {
        self.fail_activate = true;
        self
    }

    pub fn failing_cleanup(mut self) -> Self {
        self.fail_cleanup = true;
        self
    }

    pub fn shared(self) -> Arc<dyn Agentlet> {
        Arc::new(self)
    }

    fn record(&self, hook: &str) {
        self.log.lock().unwrap().push(format!("{}:{}", self.name, hook));
    }
}

#[async_trait]
impl Agentlet for RecordingAgentlet {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_pattern(&self, url: &str) -> bool {
        self.patterns.matches(url)
    }

    async fn init(&self) -> AgentletResult<()> {
        self.record("init");
        if self.fail_init {
            return Err(AgentletError::new("init exploded"));
        }
        Ok(())
    }

    async fn activate(&self, _ctx: &ActivationContext) -> AgentletResult<()> {
        self.record("activate:start");
        if !self.activate_delay.is_zero() {
            tokio::time::sleep(self.activate_delay).await;
        }
        if self.fail_activate {
            return Err(AgentletError::new("activate exploded"));
        }
        self.record("activate");
        Ok(())
    }

    async fn cleanup(&self, _ctx: &ActivationContext) -> AgentletResult<()> {
        self.record("cleanup");
        if self.fail_cleanup {
            return Err(AgentletError::new("cleanup exploded"));
        }
        Ok(())
    }

    fn metadata(&self) -> AgentletMetadata {
        AgentletMetadata::new(&self.name, "test").with_patterns(self.patterns.patterns())
    }
}

/// Config with short timings so retries and watchers finish quickly.
pub fn fast_config() -> RegistryConfig {
    RegistryConfig::default()
        .with_poll_interval(Duration::from_millis(20))
        .with_navigation_timing(Duration::from_millis(10), Duration::from_millis(5))
        .with_loader(LoaderConfig {
            timeout_ms: 500,
            retry_attempts: 3,
            retry_backoff_ms: 1,
        })
}

pub struct Harness {
    pub registry: AgentletRegistry,
    pub location: SharedLocation,
    pub fetcher: StaticFetcher,
    pub exports: ExportTable,
}

pub fn harness(url: &str) -> Harness {
    harness_with_config(url, fast_config())
}

pub fn harness_with_config(url: &str, config: RegistryConfig) -> Harness {
    let location = SharedLocation::new(url);
    let fetcher = StaticFetcher::new();
    let exports = ExportTable::new();
    let registry = AgentletRegistry::builder(Arc::new(location.clone()))
        .config(config)
        .fetcher(Arc::new(fetcher.clone()))
        .host(Arc::new(exports.clone()))
        .build()
        .unwrap();

    Harness {
        registry,
        location,
        fetcher,
        exports,
    }
}

pub fn topics(events: &[RegistryEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.topic()).collect()
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
