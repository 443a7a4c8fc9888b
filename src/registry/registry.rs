//! Agentlet registry.
//!
//! Holds registered agentlets in insertion order, tracks the single active
//! one, and runs the activation protocol whenever the address may have
//! changed.
//!
//! No lock is held while an agentlet hook runs, so hooks may call back into
//! the registry and a slow hook only holds up its own agentlet. Requests for
//! an agentlet that already has a transition in flight are coalesced by the
//! in-flight tables. The active reference only changes in short critical
//! sections on the state mutex: deactivation takes it before `cleanup`
//! runs, and activation re-checks the registry entry when it commits after
//! `activate` returns.

use crate::agentlet::{ActivationContext, Agentlet, AgentletError};
use crate::config::RegistryConfig;
use crate::core::{now, Error, GuardKey, Result, Timestamp, URL_CHANGE_TRIGGER};
use crate::events::{EventBus, EventBusReceiver, RegistryEvent};
use crate::loader::{ExportTable, HttpFetcher, RemoteLoader, ScriptHost, SourceFetcher};
use crate::monitoring::{MetricsSnapshot, RegistryMetrics};
use crate::navigation::{
    HistoryWatcher, Location, NavigationMonitor, NavigationWatcher, PollingWatcher, UrlChangeHandler,
};
use crate::registry::descriptor::{AgentletDescriptor, RegistryDocument};
use crate::registry::guard::{InFlight, InFlightGuard};
use async_trait::async_trait;
use futures::future::join_all;
use indexmap::{IndexMap, IndexSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use tracing::{debug, info, warn};

/// Called with the new active agentlet name, or `None` when nothing is active.
pub type ChangeCallback = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// Action name of the per-agentlet transition guard.
const TRANSITION: &str = "transition";

/// Result of an activation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The agentlet is now active
    Activated,
    /// The agentlet was already active
    AlreadyActive,
    /// A request for the same agentlet was already in flight
    Coalesced,
    /// The agentlet was unregistered or replaced while `activate` ran
    Superseded,
    /// `init` or `activate` failed; nothing is active
    Failed(String),
}

/// Registered agentlet entry.
struct RegisteredAgentlet {
    agentlet: Arc<dyn Agentlet>,
    initialized: bool,
    registered_at: Timestamp,
}

#[derive(Default)]
struct RegistryState {
    agentlets: IndexMap<String, RegisteredAgentlet>,
    active: Option<String>,
    last_url: Option<String>,
    loaded_registries: IndexSet<String>,
}

impl RegistryState {
    /// Clear the active reference if it names `expected` (any name when `None`).
    fn take_active(&mut self, expected: Option<&str>) -> Option<(String, Arc<dyn Agentlet>)> {
        let name = self.active.clone()?;
        if expected.is_some_and(|e| e != name) {
            return None;
        }
        self.active = None;
        self.agentlets.get(&name).map(|e| (name, e.agentlet.clone()))
    }
}

/// Guards held for the duration of one activation.
struct ActivationGuards {
    _request: InFlightGuard,
    _transition: InFlightGuard,
}

struct RegistryInner {
    config: RegistryConfig,
    bus: EventBus,
    loader: RemoteLoader,
    location: Arc<dyn Location>,
    monitor: NavigationMonitor,
    state: Mutex<RegistryState>,
    registrations: InFlight,
    activations: InFlight,
    transitions: InFlight,
    metrics: RegistryMetrics,
    on_change: RwLock<Option<ChangeCallback>>,
}

fn same_instance(a: &Arc<dyn Agentlet>, b: &Arc<dyn Agentlet>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Builder for [`AgentletRegistry`].
pub struct RegistryBuilder {
    config: RegistryConfig,
    location: Arc<dyn Location>,
    fetcher: Option<Arc<dyn SourceFetcher>>,
    host: Option<Arc<dyn ScriptHost>>,
    watchers: Vec<Arc<dyn NavigationWatcher>>,
    bus: Option<EventBus>,
}

impl RegistryBuilder {
    /// Set configuration.
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Fetch sources and registry documents with `fetcher`.
    pub fn fetcher(mut self, fetcher: Arc<dyn SourceFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Evaluate fetched sources with `host`.
    pub fn host(mut self, host: Arc<dyn ScriptHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Add a navigation watcher. Without any, polling and history watchers are used.
    pub fn watcher(mut self, watcher: Arc<dyn NavigationWatcher>) -> Self {
        self.watchers.push(watcher);
        self
    }

    /// Publish on an existing bus.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Validate the configuration and build the registry.
    pub fn build(self) -> Result<AgentletRegistry> {
        self.config.validate()?;

        let fetcher = self.fetcher.unwrap_or_else(|| Arc::new(HttpFetcher::new()));
        let host = self.host.unwrap_or_else(|| Arc::new(ExportTable::new()));
        let loader = RemoteLoader::new(fetcher, host, self.config.loader.clone());
        let bus = self
            .bus
            .unwrap_or_else(|| EventBus::with_capacity(self.config.event_channel_capacity));

        let watchers = if self.watchers.is_empty() {
            vec![
                Arc::new(PollingWatcher::new(self.config.poll_interval())) as Arc<dyn NavigationWatcher>,
                Arc::new(HistoryWatcher::new(self.location.clone(), self.config.navigation_delay()))
                    as Arc<dyn NavigationWatcher>,
            ]
        } else {
            self.watchers
        };
        let monitor = watchers
            .into_iter()
            .fold(NavigationMonitor::new(self.config.debounce()), |m, w| m.with_watcher(w));

        Ok(AgentletRegistry {
            inner: Arc::new(RegistryInner {
                config: self.config,
                bus,
                loader,
                location: self.location,
                monitor,
                state: Mutex::new(RegistryState::default()),
                registrations: InFlight::new(),
                activations: InFlight::new(),
                transitions: InFlight::new(),
                metrics: RegistryMetrics::new(),
                on_change: RwLock::new(None),
            }),
        })
    }
}

/// Agentlet registry. Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct AgentletRegistry {
    inner: Arc<RegistryInner>,
}

impl AgentletRegistry {
    /// Start building a registry reading addresses from `location`.
    pub fn builder(location: Arc<dyn Location>) -> RegistryBuilder {
        RegistryBuilder {
            config: RegistryConfig::default(),
            location,
            fetcher: None,
            host: None,
            watchers: Vec::new(),
            bus: None,
        }
    }

    /// Registry with default configuration, HTTP fetching and an empty export table.
    pub fn new(location: Arc<dyn Location>) -> Result<Self> {
        Self::builder(location).build()
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: RegistryEvent) {
        debug!(topic = event.topic(), "event");
        self.inner.bus.publish(event);
    }

    fn notify_change(&self, active: Option<&str>) {
        let callback = self
            .inner
            .on_change
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(active);
        }
    }

    /// Shared event bus.
    pub fn event_bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> EventBusReceiver {
        self.inner.bus.subscribe()
    }

    /// Registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Set the callback run after every activation and deactivation.
    pub fn on_agentlet_change<F>(&self, callback: F)
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        *self.inner.on_change.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
    }

    /// Register an agentlet and re-evaluate the current address.
    ///
    /// Returns `Ok(false)` when the call was a no-op: the same instance is
    /// already registered, or a registration under that name is in flight.
    /// A different instance under an existing name replaces the old one,
    /// keeping its position; if the old instance was active it is
    /// deactivated first.
    pub async fn register(&self, agentlet: Arc<dyn Agentlet>) -> Result<bool> {
        let name = agentlet.name().to_string();
        if name.trim().is_empty() {
            return Err(Error::InvalidConfig("agentlet name is required".to_string()));
        }

        let Some(_guard) = self.inner.registrations.try_acquire(GuardKey::new(&name, "register")) else {
            warn!(agentlet = %name, "registration already in progress, ignoring");
            return Ok(false);
        };

        let (replaced, displaced) = {
            let mut state = self.state();
            if let Some(existing) = state.agentlets.get(&name) {
                if same_instance(&existing.agentlet, &agentlet) {
                    warn!(agentlet = %name, "agentlet already registered");
                    return Ok(false);
                }
            }
            let displaced = state.take_active(Some(name.as_str()));
            let replaced = state
                .agentlets
                .insert(
                    name.clone(),
                    RegisteredAgentlet {
                        agentlet: agentlet.clone(),
                        initialized: false,
                        registered_at: now(),
                    },
                )
                .is_some();
            (replaced, displaced)
        };

        if replaced {
            warn!(agentlet = %name, "replacing registered agentlet");
        }
        if let Some((old_name, old)) = displaced {
            self.finish_deactivation(&old_name, old).await;
        }

        agentlet.attach_event_bus(self.inner.bus.clone());
        self.inner.metrics.total_agentlets.inc();
        info!(agentlet = %name, "agentlet registered");
        self.emit(RegistryEvent::ModuleRegistered { module: name });

        self.check_url_change().await;
        Ok(true)
    }

    /// Remove an agentlet, deactivating it first if it is active.
    ///
    /// `cleanup` runs exactly once either way. Returns false for unknown names.
    pub async fn unregister(&self, name: &str) -> bool {
        // Removed before any hook runs, so an activation of this agentlet
        // still in flight cannot commit it.
        let (agentlet, displaced) = {
            let mut state = self.state();
            let displaced = state.take_active(Some(name));
            match state.agentlets.shift_remove(name) {
                Some(entry) => (entry.agentlet, displaced),
                None => {
                    warn!(agentlet = %name, "cannot unregister unknown agentlet");
                    return false;
                }
            }
        };

        match displaced {
            Some((name, agentlet)) => self.finish_deactivation(&name, agentlet).await,
            None => {
                let ctx = ActivationContext::new(&self.inner.location.href()).with_trigger("unregister");
                if let Err(e) = agentlet.cleanup(&ctx).await {
                    warn!(agentlet = %name, error = %e, "cleanup failed during unregister");
                }
            }
        }

        info!(agentlet = %name, "agentlet unregistered");
        self.emit(RegistryEvent::ModuleUnregistered {
            module: name.to_string(),
        });
        true
    }

    /// First agentlet, in registration order, whose patterns match `url`.
    pub fn find_matching_agentlet(&self, url: &str) -> Option<Arc<dyn Agentlet>> {
        // Patterns are evaluated outside the state lock.
        self.agentlets().into_iter().find(|a| a.check_pattern(url))
    }

    /// Make `name` the active agentlet.
    ///
    /// Hook failures are reported through the outcome and the
    /// `module:activationFailed` event, not as `Err`. Only an unknown name
    /// is an error.
    pub async fn activate_agentlet(&self, name: &str, ctx: ActivationContext) -> Result<ActivationOutcome> {
        let trigger = ctx
            .trigger
            .clone()
            .unwrap_or_else(|| self.inner.config.default_trigger.clone());

        let Some(_guards) = self.begin_activation(name, &trigger) else {
            return Ok(ActivationOutcome::Coalesced);
        };

        let ctx = ActivationContext {
            trigger: Some(trigger),
            ..ctx
        };
        self.run_activation(name, ctx).await
    }

    fn begin_activation(&self, name: &str, trigger: &str) -> Option<ActivationGuards> {
        let Some(request) = self.inner.activations.try_acquire(GuardKey::new(name, trigger)) else {
            warn!(agentlet = %name, trigger, "activation already in progress, ignoring");
            return None;
        };
        let Some(transition) = self.inner.transitions.try_acquire(GuardKey::new(name, TRANSITION)) else {
            debug!(agentlet = %name, trigger, "transition already in progress, ignoring");
            return None;
        };
        Some(ActivationGuards {
            _request: request,
            _transition: transition,
        })
    }

    // Caller holds the activation guards for `name`.
    async fn run_activation(&self, name: &str, ctx: ActivationContext) -> Result<ActivationOutcome> {
        let (agentlet, initialized, current) = {
            let state = self.state();
            let entry = state
                .agentlets
                .get(name)
                .ok_or_else(|| Error::AgentletNotFound(name.to_string()))?;
            (entry.agentlet.clone(), entry.initialized, state.active.clone())
        };

        match current.as_deref() {
            Some(current) if current == name => return Ok(ActivationOutcome::AlreadyActive),
            Some(current) => self.run_deactivation(Some(current)).await,
            None => None,
        };

        if !initialized {
            if let Err(e) = agentlet.init().await {
                return Ok(self.activation_failed(name, e));
            }
            let mut state = self.state();
            if let Some(entry) = state.agentlets.get_mut(name) {
                if same_instance(&entry.agentlet, &agentlet) {
                    entry.initialized = true;
                }
            }
        }

        if let Err(e) = agentlet.activate(&ctx).await {
            return Ok(self.activation_failed(name, e));
        }

        enum Commit {
            Done(Option<(String, Arc<dyn Agentlet>)>),
            Unregistered,
            Replaced,
        }
        let commit = {
            let mut state = self.state();
            match state.agentlets.get(name) {
                None => Commit::Unregistered,
                Some(entry) if !same_instance(&entry.agentlet, &agentlet) => Commit::Replaced,
                Some(_) => {
                    // Another agentlet may have committed while our hooks ran.
                    let displaced = state.take_active(None);
                    state.active = Some(name.to_string());
                    Commit::Done(displaced)
                }
            }
        };

        match commit {
            Commit::Done(displaced) => {
                if let Some((other, instance)) = displaced {
                    self.finish_deactivation(&other, instance).await;
                }
            }
            // `unregister` already ran this instance's cleanup.
            Commit::Unregistered => {
                warn!(agentlet = %name, "agentlet unregistered during activation");
                return Ok(ActivationOutcome::Superseded);
            }
            Commit::Replaced => {
                warn!(agentlet = %name, "agentlet replaced during activation, cleaning up old instance");
                if let Err(e) = agentlet.cleanup(&ctx).await {
                    warn!(agentlet = %name, error = %e, "cleanup failed");
                }
                return Ok(ActivationOutcome::Superseded);
            }
        }

        self.inner.metrics.activation_attempts.inc();
        info!(agentlet = %name, trigger = ctx.trigger_label(), url = %ctx.url, "agentlet activated");
        self.emit(RegistryEvent::ModuleActivated {
            module: name.to_string(),
            context: ctx,
        });
        self.notify_change(Some(name));
        Ok(ActivationOutcome::Activated)
    }

    fn activation_failed(&self, name: &str, error: AgentletError) -> ActivationOutcome {
        self.inner.metrics.activation_failures.inc();
        warn!(agentlet = %name, error = %error, "agentlet activation failed");
        self.emit(RegistryEvent::ModuleActivationFailed {
            module: name.to_string(),
            error: error.message.clone(),
        });
        ActivationOutcome::Failed(error.message)
    }

    /// Deactivate the active agentlet. Returns false if nothing was active.
    pub async fn deactivate_agentlet(&self) -> bool {
        self.run_deactivation(None).await.is_some()
    }

    /// Deactivate the active agentlet if it is `expected` (any when `None`).
    async fn run_deactivation(&self, expected: Option<&str>) -> Option<String> {
        let (name, agentlet) = self.state().take_active(expected)?;
        self.finish_deactivation(&name, agentlet).await;
        Some(name)
    }

    // The active reference is already cleared.
    async fn finish_deactivation(&self, name: &str, agentlet: Arc<dyn Agentlet>) {
        let ctx = ActivationContext::new(&self.inner.location.href()).with_trigger("deactivate");
        if let Err(e) = agentlet.cleanup(&ctx).await {
            warn!(agentlet = %name, error = %e, "cleanup failed");
        }

        info!(agentlet = %name, "agentlet deactivated");
        self.emit(RegistryEvent::ModuleDeactivated {
            module: name.to_string(),
        });
        self.notify_change(None);
    }

    /// Re-evaluate the current address.
    ///
    /// Activates or deactivates when the matching agentlet differs from the
    /// active one. Overlapping checks announce a transition once: a check
    /// that finds the transition already in flight stays silent. Returns
    /// true if the address differs from the last one seen.
    pub async fn check_url_change(&self) -> bool {
        let url = self.inner.location.href();
        let previous = self.state().last_url.replace(url.clone());

        let matched = self.find_matching_agentlet(&url).map(|a| a.name().to_string());
        let active = self.active_agentlet_name();

        if matched != active {
            match matched {
                Some(name) => {
                    if let Some(_guards) = self.begin_activation(&name, URL_CHANGE_TRIGGER) {
                        self.emit(RegistryEvent::ApplicationDetected {
                            module: name.clone(),
                            url: url.clone(),
                        });
                        let ctx = ActivationContext::new(&url).with_trigger(URL_CHANGE_TRIGGER);
                        if let Err(e) = self.run_activation(&name, ctx).await {
                            warn!(agentlet = %name, error = %e, "activation after address change failed");
                        }
                    }
                }
                None => {
                    let taken = self.state().take_active(active.as_deref());
                    if let Some((name, agentlet)) = taken {
                        self.emit(RegistryEvent::ApplicationNotDetected { url: url.clone() });
                        self.finish_deactivation(&name, agentlet).await;
                    }
                }
            }
        }

        let changed = previous.as_deref() != Some(url.as_str());
        if changed {
            debug!(old = ?previous, new = %url, "address changed");
            self.emit(RegistryEvent::UrlChanged {
                old_url: previous,
                new_url: url,
            });
        }
        changed
    }

    /// Load every agentlet listed by the registry document at `url`.
    ///
    /// A document is fetched at most once per registry lifetime. A failing
    /// descriptor is counted and skipped. Returns how many agentlets loaded.
    pub async fn load_from_registry(&self, url: &str) -> Result<usize> {
        if self.state().loaded_registries.contains(url) {
            debug!(url, "registry already loaded");
            return Ok(0);
        }
        let Some(_guard) = self.inner.registrations.try_acquire(GuardKey::new(url, "load-registry")) else {
            warn!(url, "registry load already in progress, ignoring");
            return Ok(0);
        };
        if self.state().loaded_registries.contains(url) {
            return Ok(0);
        }

        let document = match self
            .inner
            .loader
            .fetch_text(url)
            .await
            .and_then(|text| RegistryDocument::parse(&text))
        {
            Ok(document) => document,
            Err(e) => {
                self.inner.metrics.registry_load_failures.inc();
                warn!(url, error = %e, "registry load failed");
                self.emit(RegistryEvent::RegistryLoadFailed {
                    url: url.to_string(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let mut loaded = 0;
        for descriptor in document.descriptors() {
            let result = match descriptor {
                Ok(descriptor) => self.load_agentlet(&descriptor).await.map(|_| ()),
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => loaded += 1,
                Err(e) => {
                    self.inner.metrics.registry_load_failures.inc();
                    warn!(registry = url, error = %e, "skipping agentlet descriptor");
                }
            }
        }

        self.state().loaded_registries.insert(url.to_string());
        self.inner.metrics.registries_loaded.inc();
        info!(url, agentlets = loaded, "registry loaded");
        self.emit(RegistryEvent::RegistryLoaded {
            url: url.to_string(),
            agentlet_count: loaded,
        });
        Ok(loaded)
    }

    /// Load one descriptor and register the result.
    ///
    /// An agentlet already registered under the descriptor's name is
    /// returned without fetching. The loaded instance must carry the
    /// descriptor's name, so that name stays the registry key.
    pub async fn load_agentlet(&self, descriptor: &AgentletDescriptor) -> Result<Arc<dyn Agentlet>> {
        if let Some(existing) = self.get_agentlet(&descriptor.name) {
            debug!(agentlet = %descriptor.name, "already registered, skipping load");
            return Ok(existing);
        }

        let agentlet = self
            .inner
            .loader
            .load(&descriptor.url, &descriptor.module, &descriptor.load_options())
            .await?;
        if agentlet.name() != descriptor.name {
            return Err(Error::InvalidExport(
                descriptor.module.clone(),
                format!("named {} but listed as {}", agentlet.name(), descriptor.name),
            ));
        }
        self.register(agentlet.clone()).await?;
        Ok(agentlet)
    }

    /// Start navigation monitoring, load configured registries and check
    /// the current address. Returns false if monitoring was already running.
    pub async fn start(&self) -> bool {
        let handler: Arc<dyn UrlChangeHandler> = Arc::new(RegistryHandle {
            inner: Arc::downgrade(&self.inner),
        });
        let started = self.inner.monitor.start(handler);

        for url in &self.inner.config.auto_load_registries {
            if let Err(e) = self.load_from_registry(url).await {
                warn!(url = %url, error = %e, "configured registry failed to load");
            }
        }

        self.check_url_change().await;
        started
    }

    /// Stop navigation monitoring.
    pub fn stop(&self) {
        self.inner.monitor.stop();
    }

    /// Is navigation monitoring running.
    pub fn is_monitoring(&self) -> bool {
        self.inner.monitor.is_running()
    }

    /// Tear down: stop monitoring, clean up every agentlet, forget loaded
    /// registries and reset metrics.
    pub async fn destroy(&self) {
        self.stop();
        let (active, remaining) = {
            let mut state = self.state();
            let active = state.take_active(None);
            state.loaded_registries.clear();
            state.last_url = None;
            let remaining: Vec<(String, Arc<dyn Agentlet>)> = state
                .agentlets
                .drain(..)
                .filter(|(name, _)| active.as_ref().map(|(a, _)| a) != Some(name))
                .map(|(name, entry)| (name, entry.agentlet))
                .collect();
            (active, remaining)
        };

        if let Some((name, agentlet)) = active {
            self.finish_deactivation(&name, agentlet).await;
        }

        let ctx = ActivationContext::new(&self.inner.location.href()).with_trigger("destroy");
        let cleanups = remaining.iter().map(|(name, agentlet)| {
            let ctx = &ctx;
            async move {
                if let Err(e) = agentlet.cleanup(ctx).await {
                    warn!(agentlet = %name, error = %e, "cleanup failed during teardown");
                }
            }
        });
        join_all(cleanups).await;

        self.inner.metrics.reset();
        info!("registry destroyed");
    }

    /// Registered agentlet by name.
    pub fn get_agentlet(&self, name: &str) -> Option<Arc<dyn Agentlet>> {
        self.state().agentlets.get(name).map(|e| e.agentlet.clone())
    }

    /// All agentlets in registration order.
    pub fn agentlets(&self) -> Vec<Arc<dyn Agentlet>> {
        self.state().agentlets.values().map(|e| e.agentlet.clone()).collect()
    }

    /// Registered names in registration order.
    pub fn agentlet_names(&self) -> Vec<String> {
        self.state().agentlets.keys().cloned().collect()
    }

    /// When `name` was registered.
    pub fn registered_at(&self, name: &str) -> Option<Timestamp> {
        self.state().agentlets.get(name).map(|e| e.registered_at)
    }

    /// Has `name` completed `init`.
    pub fn is_initialized(&self, name: &str) -> bool {
        self.state().agentlets.get(name).is_some_and(|e| e.initialized)
    }

    /// The active agentlet.
    pub fn active_agentlet(&self) -> Option<Arc<dyn Agentlet>> {
        let state = self.state();
        let name = state.active.as_ref()?;
        state.agentlets.get(name).map(|e| e.agentlet.clone())
    }

    /// Name of the active agentlet.
    pub fn active_agentlet_name(&self) -> Option<String> {
        self.state().active.clone()
    }

    /// Last address observed by `check_url_change`.
    pub fn current_url(&self) -> Option<String> {
        self.state().last_url.clone()
    }

    /// Registry documents loaded so far.
    pub fn loaded_registries(&self) -> Vec<String> {
        self.state().loaded_registries.iter().cloned().collect()
    }

    /// Number of registered agentlets.
    pub fn len(&self) -> usize {
        self.state().agentlets.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current counter values.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Counters in Prometheus text format.
    pub fn export_metrics(&self) -> String {
        self.inner.metrics.export_prometheus()
    }
}

/// Monitor-side handle that does not keep the registry alive.
struct RegistryHandle {
    inner: Weak<RegistryInner>,
}

#[async_trait]
impl UrlChangeHandler for RegistryHandle {
    async fn on_url_change(&self) -> bool {
        match self.inner.upgrade() {
            Some(inner) => {
                AgentletRegistry { inner }.check_url_change().await;
                true
            }
            None => false,
        }
    }
}
