use std::sync::Arc;

use dashmap::DashMap;

use crate::model::Hook;

/// Installed hooks, keyed by method selector.
///
/// Installation appends atomically relative to lookup: a dispatch sees either
/// the pre-install or the post-install list for its selector, never a torn
/// one. Order within a selector is installation order.
pub struct HookRegistry {
    hooks: DashMap<String, Vec<Arc<Hook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self {
            hooks: DashMap::new(),
        }
    }

    /// Append the hook to its selector's list.
    pub fn install(&self, hook: Hook) {
        let hook = Arc::new(hook);
        self.hooks
            .entry(hook.selector.clone())
            .or_default()
            .push(hook);
    }

    /// The hook dispatch should run for this selector: the first one
    /// installed, if any.
    pub fn first_match(&self, selector: &str) -> Option<Arc<Hook>> {
        self.hooks
            .get(selector)
            .and_then(|hooks| hooks.first().cloned())
    }

    pub fn has_hooks(&self, selector: &str) -> bool {
        self.hooks
            .get(selector)
            .map(|hooks| !hooks.is_empty())
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        self.hooks.clear();
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
