//! Validated agentlet construction.
//!
//! [`AgentletSpec`] checks name and patterns up front; [`BasicAgentlet`] is
//! a ready-made agentlet with no-op hooks that tracks its own lifecycle.

use crate::agentlet::interface::{ActivationContext, Agentlet, AgentletMetadata, AgentletResult};
use crate::agentlet::pattern::{Pattern, PatternSet};
use crate::core::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Declarative description of an agentlet.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentletSpec {
    /// Agentlet name
    pub name: String,
    /// Version
    #[serde(default = "default_version")]
    pub version: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Address patterns
    #[serde(default)]
    pub patterns: Vec<Pattern>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl AgentletSpec {
    /// Create a spec.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: default_version(),
            description: String::new(),
            patterns: Vec::new(),
        }
    }

    /// Add a pattern.
    pub fn with_pattern(mut self, pattern: impl Into<Pattern>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Set version.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Set description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Reject a missing name or an empty pattern list.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig("agentlet name is required".to_string()));
        }
        if self.patterns.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "agentlet {} must declare at least one pattern",
                self.name
            )));
        }
        Ok(())
    }

    /// Validate and compile the patterns.
    pub fn compile(&self) -> Result<PatternSet> {
        self.validate()?;
        Ok(PatternSet::new(self.patterns.clone()))
    }
}

/// Agentlet with no-op hooks.
pub struct BasicAgentlet {
    spec: AgentletSpec,
    patterns: PatternSet,
    initialized: AtomicBool,
    active: AtomicBool,
}

impl BasicAgentlet {
    /// Build from a spec, failing on invalid configuration.
    pub fn new(spec: AgentletSpec) -> Result<Self> {
        let patterns = spec.compile()?;
        Ok(Self {
            spec,
            patterns,
            initialized: AtomicBool::new(false),
            active: AtomicBool::new(false),
        })
    }

    /// Build from a JSON manifest.
    pub fn from_json(source: &str) -> Result<Self> {
        let spec: AgentletSpec = serde_json::from_str(source)?;
        Self::new(spec)
    }

    /// Has `init` run.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Is the agentlet running.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agentlet for BasicAgentlet {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn check_pattern(&self, url: &str) -> bool {
        self.patterns.matches(url)
    }

    async fn init(&self) -> AgentletResult<()> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn activate(&self, ctx: &ActivationContext) -> AgentletResult<()> {
        debug!(agentlet = %self.spec.name, url = %ctx.url, "activated");
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn cleanup(&self, _ctx: &ActivationContext) -> AgentletResult<()> {
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn metadata(&self) -> AgentletMetadata {
        let mut meta = AgentletMetadata::new(&self.spec.name, &self.spec.version)
            .with_description(&self.spec.description)
            .with_patterns(self.patterns.patterns());
        meta.initialized = self.is_initialized();
        meta.active = self.is_active();
        meta
    }
}
