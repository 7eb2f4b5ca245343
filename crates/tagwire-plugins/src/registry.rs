// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Plugin registry with replay-on-attach listeners.
//!
//! Registration, removal and listener attachment all run under one mutex.
//! Listeners are notified inside that critical section, sequentially and in
//! attachment order, so a listener attached while other threads register sees
//! every plugin exactly once: either replayed or live, never both.
//!
//! Listeners must not call back into the registry that notifies them.

use crate::descriptor::PluginDescriptor;
use crate::error::PluginError;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Change published to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginEvent {
    Added(Arc<PluginDescriptor>),
    Removed(Arc<PluginDescriptor>),
}

impl PluginEvent {
    pub fn descriptor(&self) -> &PluginDescriptor {
        match self {
            Self::Added(desc) | Self::Removed(desc) => desc,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Added(_) => "added",
            Self::Removed(_) => "removed",
        }
    }
}

pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Receives plugin events. Errors and panics are logged by the registry and
/// do not affect other listeners.
pub trait PluginListener: Send + Sync {
    fn on_event(&self, event: &PluginEvent) -> Result<(), ListenerError>;
}

/// Handle returned by [`PluginRegistry::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Inner {
    /// Registration order; a replaced plugin keeps its slot.
    plugins: Vec<Arc<PluginDescriptor>>,
    listeners: Vec<(ListenerId, Arc<dyn PluginListener>)>,
    next_listener: u64,
}

/// Process-wide table of plugin descriptors.
pub struct PluginRegistry {
    inner: Mutex<Inner>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                plugins: Vec::new(),
                listeners: Vec::new(),
                next_listener: 0,
            }),
        }
    }

    /// Register or replace a plugin and notify every attached listener.
    pub fn register(
        &self,
        descriptor: PluginDescriptor,
    ) -> Result<Arc<PluginDescriptor>, PluginError> {
        descriptor.validate()?;
        let descriptor = Arc::new(descriptor);

        let mut inner = self.inner.lock();
        match inner
            .plugins
            .iter()
            .position(|p| p.name() == descriptor.name())
        {
            Some(idx) => {
                log::debug!("[plugins] replacing {}", descriptor.name());
                inner.plugins[idx] = Arc::clone(&descriptor);
            }
            None => {
                log::debug!(
                    "[plugins] registered {} ({})",
                    descriptor.name(),
                    descriptor.capabilities()
                );
                inner.plugins.push(Arc::clone(&descriptor));
            }
        }
        notify_all(&inner.listeners, &PluginEvent::Added(Arc::clone(&descriptor)));
        Ok(descriptor)
    }

    /// Remove a plugin. Returns `None` (and notifies nobody) if it was absent.
    pub fn unregister(&self, name: &str) -> Option<Arc<PluginDescriptor>> {
        let mut inner = self.inner.lock();
        let idx = inner.plugins.iter().position(|p| p.name() == name)?;
        let removed = inner.plugins.remove(idx);
        log::debug!("[plugins] unregistered {}", name);
        notify_all(&inner.listeners, &PluginEvent::Removed(Arc::clone(&removed)));
        Some(removed)
    }

    /// Replay one `Added` event per registered plugin to `listener`, then add
    /// it to the live set, atomically with respect to `register`.
    pub fn add_listener(&self, listener: Arc<dyn PluginListener>) -> ListenerId {
        let mut inner = self.inner.lock();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;

        for plugin in &inner.plugins {
            notify_one(id, listener.as_ref(), &PluginEvent::Added(Arc::clone(plugin)));
        }
        log::debug!(
            "[plugins] listener {:?} attached after replaying {} plugins",
            id,
            inner.plugins.len()
        );
        inner.listeners.push((id, listener));
        id
    }

    /// Detach a listener. Returns false if the id is unknown.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    pub fn get(&self, name: &str) -> Option<Arc<PluginDescriptor>> {
        self.inner
            .lock()
            .plugins
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    /// Snapshot in registration order.
    pub fn plugins(&self) -> Vec<Arc<PluginDescriptor>> {
        self.inner.lock().plugins.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().plugins.is_empty()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PluginRegistry")
            .field(
                "plugins",
                &inner.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

fn notify_all(listeners: &[(ListenerId, Arc<dyn PluginListener>)], event: &PluginEvent) {
    for (id, listener) in listeners {
        notify_one(*id, listener.as_ref(), event);
    }
}

/// Deliver with failure isolation.
fn notify_one(id: ListenerId, listener: &dyn PluginListener, event: &PluginEvent) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        listener.on_event(event)
    }));
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!(
            "[plugins] listener {:?} failed on {} {}: {}",
            id,
            event.kind(),
            event.descriptor().name(),
            e
        ),
        Err(payload) => log::warn!(
            "[plugins] listener {:?} panicked on {} {}: {}",
            id,
            event.kind(),
            event.descriptor().name(),
            panic_message(payload.as_ref())
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<String> {
            self.seen.lock().clone()
        }
    }

    impl PluginListener for Recorder {
        fn on_event(&self, event: &PluginEvent) -> Result<(), ListenerError> {
            self.seen
                .lock()
                .push(format!("{}:{}", event.kind(), event.descriptor().name()));
            Ok(())
        }
    }

    struct Failing;

    impl PluginListener for Failing {
        fn on_event(&self, _event: &PluginEvent) -> Result<(), ListenerError> {
            Err("backend unavailable".into())
        }
    }

    struct Panicking;

    impl PluginListener for Panicking {
        fn on_event(&self, _event: &PluginEvent) -> Result<(), ListenerError> {
            panic!("listener bug");
        }
    }

    #[test]
    fn test_replay_then_live() {
        let registry = PluginRegistry::new();
        registry.register(PluginDescriptor::new("a")).unwrap();
        registry.register(PluginDescriptor::new("b")).unwrap();

        let recorder = Arc::new(Recorder::default());
        registry.add_listener(recorder.clone());
        registry.register(PluginDescriptor::new("c")).unwrap();
        registry.unregister("a");
        assert!(registry.unregister("missing").is_none());

        assert_eq!(
            recorder.seen(),
            vec!["added:a", "added:b", "added:c", "removed:a"]
        );
        assert_eq!(
            registry
                .plugins()
                .iter()
                .map(|p| p.name().to_string())
                .collect::<Vec<_>>(),
            vec!["b", "c"]
        );
    }

    #[test]
    fn test_replace_keeps_position() {
        let registry = PluginRegistry::new();
        registry.register(PluginDescriptor::new("a")).unwrap();
        registry.register(PluginDescriptor::new("b")).unwrap();
        registry
            .register(PluginDescriptor::new("a").append_only(true))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("a").unwrap().is_append_only());

        let recorder = Arc::new(Recorder::default());
        registry.add_listener(recorder.clone());
        assert_eq!(recorder.seen(), vec!["added:a", "added:b"]);
    }

    #[test]
    fn test_invalid_descriptor_propagates() {
        let registry = PluginRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.add_listener(recorder.clone());

        assert!(registry.register(PluginDescriptor::new("bad name")).is_err());
        assert!(registry.is_empty());
        assert!(recorder.seen().is_empty());
    }

    #[test]
    fn test_listener_failures_are_isolated() {
        let registry = PluginRegistry::new();
        registry.add_listener(Arc::new(Failing));
        registry.add_listener(Arc::new(Panicking));
        let recorder = Arc::new(Recorder::default());
        registry.add_listener(recorder.clone());

        registry.register(PluginDescriptor::new("radar")).unwrap();
        registry.register(PluginDescriptor::new("lidar")).unwrap();
        assert_eq!(recorder.seen(), vec!["added:radar", "added:lidar"]);
    }

    #[test]
    fn test_remove_listener() {
        let registry = PluginRegistry::new();
        let recorder = Arc::new(Recorder::default());
        let id = registry.add_listener(recorder.clone());
        assert_eq!(registry.listener_count(), 1);

        assert!(registry.remove_listener(id));
        assert!(!registry.remove_listener(id));
        registry.register(PluginDescriptor::new("a")).unwrap();
        assert!(recorder.seen().is_empty());
    }

    #[test]
    fn test_notification_order_follows_attachment() {
        struct Tagged(&'static str, Arc<Mutex<Vec<&'static str>>>);
        impl PluginListener for Tagged {
            fn on_event(&self, _event: &PluginEvent) -> Result<(), ListenerError> {
                self.1.lock().push(self.0);
                Ok(())
            }
        }

        let order = Arc::new(Mutex::new(Vec::new()));
        let registry = PluginRegistry::new();
        for tag in ["first", "second", "third"] {
            registry.add_listener(Arc::new(Tagged(tag, Arc::clone(&order))));
        }
        registry.register(PluginDescriptor::new("a")).unwrap();
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }
}
