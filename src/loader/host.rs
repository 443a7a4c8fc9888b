//! Execution host for fetched module source.
//!
//! The host evaluates source and hands the resulting instance back under
//! the export name the descriptor announced. Nothing is looked up in a
//! global namespace.

use crate::agentlet::{Agentlet, BasicAgentlet};
use crate::core::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Evaluates fetched source into an agentlet instance.
#[async_trait]
pub trait ScriptHost: Send + Sync {
    /// Evaluate `source` and return the instance exported as `export`.
    ///
    /// `Ok(None)` means the source ran but produced no such export.
    async fn evaluate(&self, source: &str, export: &str) -> Result<Option<Arc<dyn Agentlet>>>;
}

/// Builds an agentlet from its source text.
pub type ExportFactory = Arc<dyn Fn(&str) -> Result<Arc<dyn Agentlet>> + Send + Sync>;

/// Host backed by a table of named export factories.
#[derive(Clone, Default)]
pub struct ExportTable {
    factories: Arc<RwLock<HashMap<String, ExportFactory>>>,
}

impl ExportTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under an export name.
    pub fn register_export<F>(&self, export: &str, factory: F)
    where
        F: Fn(&str) -> Result<Arc<dyn Agentlet>> + Send + Sync + 'static,
    {
        if let Ok(mut factories) = self.factories.write() {
            factories.insert(export.to_string(), Arc::new(factory));
        }
    }

    /// Register an export whose source is a JSON agentlet manifest.
    pub fn register_manifest_export(&self, export: &str) {
        self.register_export(export, |source| {
            let agentlet = BasicAgentlet::from_json(source)?;
            Ok(Arc::new(agentlet) as Arc<dyn Agentlet>)
        });
    }

    /// Is an export name known.
    pub fn contains(&self, export: &str) -> bool {
        self.factories
            .read()
            .map(|f| f.contains_key(export))
            .unwrap_or(false)
    }
}

#[async_trait]
impl ScriptHost for ExportTable {
    async fn evaluate(&self, source: &str, export: &str) -> Result<Option<Arc<dyn Agentlet>>> {
        let factory = self
            .factories
            .read()
            .map_err(|_| Error::Internal("export table lock poisoned".to_string()))?
            .get(export)
            .cloned();

        match factory {
            Some(factory) => factory(source).map(Some),
            None => Ok(None),
        }
    }
}
