//! Event system for settings changes
//!
//! Listeners run after a set or remove has been applied, with the previous
//! and the new value of the setting (`None` when absent).

use crate::sync::RwLockExt;
use crate::value::SettingValue;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

/// Type alias for a change callback
pub type ChangeCallback =
    Arc<dyn Fn(&str, Option<&SettingValue>, Option<&SettingValue>) + Send + Sync>;

/// Manages event listeners for settings changes
#[derive(Default)]
pub struct EventManager {
    /// Global listeners (called for all changes)
    global_listeners: RwLock<Vec<ChangeCallback>>,

    /// Per-name listeners (called only for specific setting changes)
    name_listeners: RwLock<HashMap<String, Vec<ChangeCallback>>>,
}

impl EventManager {
    /// Create a new event manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global change listener (called for all settings changes)
    ///
    /// # Arguments
    /// * `callback` - Function receiving (`name`, `old_value`, `new_value`)
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&str, Option<&SettingValue>, Option<&SettingValue>) + Send + Sync + 'static,
    {
        if let Ok(mut guard) = self.global_listeners.write_recovered() {
            guard.push(Arc::new(callback));
        }
    }

    /// Register a listener for a specific setting name
    pub fn watch<F>(&self, name: &str, callback: F)
    where
        F: Fn(&str, Option<&SettingValue>, Option<&SettingValue>) + Send + Sync + 'static,
    {
        if let Ok(mut listeners) = self.name_listeners.write_recovered() {
            listeners
                .entry(name.to_string())
                .or_default()
                .push(Arc::new(callback));
        }
    }

    /// Notify all listeners about a change
    pub fn notify(&self, name: &str, old_value: Option<&SettingValue>, new_value: Option<&SettingValue>) {
        // Snapshot the callbacks so a listener may register others
        let mut callbacks: Vec<ChangeCallback> = self
            .global_listeners
            .read_recovered()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        if let Ok(guard) = self.name_listeners.read_recovered() {
            if let Some(listeners) = guard.get(name) {
                callbacks.extend(listeners.iter().cloned());
            }
        }

        for callback in callbacks {
            callback(name, old_value, new_value);
        }
    }

    /// Remove all listeners for a specific name
    pub fn unwatch(&self, name: &str) {
        if let Ok(mut guard) = self.name_listeners.write_recovered() {
            guard.remove(name);
        }
    }

    /// Clear all listeners
    pub fn clear(&self) {
        if let Ok(mut guard) = self.global_listeners.write_recovered() {
            guard.clear();
        }
        if let Ok(mut guard) = self.name_listeners.write_recovered() {
            guard.clear();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_global_listener() {
        let events = EventManager::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        events.on_change(move |_name, old, new| {
            assert!(old.is_none());
            assert_eq!(new, Some(&SettingValue::from("value")));
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        events.notify("test.key", None, Some(&SettingValue::from("value")));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_name_specific_listener() {
        let events = EventManager::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        events.watch("theme", move |_name, _old, _new| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        events.notify("theme", None, Some(&SettingValue::from("dark")));
        events.notify("language", None, Some(&SettingValue::from("tr")));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        events.unwatch("theme");
        events.notify("theme", None, None);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear() {
        let events = EventManager::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        events.on_change(move |_, _, _| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        events.clear();
        events.notify("any", None, None);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
