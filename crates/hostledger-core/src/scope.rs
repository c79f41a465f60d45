//! Shared, runtime-mutable scan scope for the file-integrity agent.

use std::sync::{Arc, RwLock};

use hostledger_contracts::{error::LedgerResult, monitoring::MonitoringConfig};

/// Cloneable handle to the current `MonitoringConfig`.
///
/// The coordinator writes through it (`set_roots`, `set_excluded_dirs`) and
/// the file snapshot source reads it at the start of every poll, so a change
/// takes effect on the next poll without restarting the agent.
#[derive(Debug, Clone)]
pub struct ScanScope {
    inner: Arc<RwLock<MonitoringConfig>>,
}

impl ScanScope {
    pub fn new(config: MonitoringConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// A copy of the current scope.
    pub fn current(&self) -> MonitoringConfig {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Replace the roots; a rejected list leaves the scope unchanged.
    pub fn set_roots(&self, roots: Vec<String>) -> LedgerResult<MonitoringConfig> {
        self.update(|config| config.set_roots(roots))
    }

    /// Replace the excluded directory names; a rejected list leaves the scope unchanged.
    pub fn set_excluded_dirs(&self, excluded: Vec<String>) -> LedgerResult<MonitoringConfig> {
        self.update(|config| config.set_excluded_dirs(excluded))
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut MonitoringConfig) -> LedgerResult<()>,
    ) -> LedgerResult<MonitoringConfig> {
        // MonitoringConfig setters validate before assigning, so a poisoned
        // guard still holds a complete config.
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        apply(&mut guard)?;
        Ok(guard.clone())
    }
}
