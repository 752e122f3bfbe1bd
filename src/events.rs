//! Lifecycle events emitted by the plugin registry.

use crate::descriptor::PluginDescriptor;

/// Registry lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A plugin was instantiated
    Plug(PluginDescriptor),
    /// A plugin instance was destroyed
    Unplug(PluginDescriptor),
    /// The host should remove all plugin clients and set them up again
    Replug,
}

impl LifecycleEvent {
    /// Generic name of the plugin concerned, if any.
    pub fn plugin(&self) -> Option<&str> {
        match self {
            LifecycleEvent::Plug(d) | LifecycleEvent::Unplug(d) => Some(&d.generic_name),
            LifecycleEvent::Replug => None,
        }
    }
}

/// Callback invoked for each event.
pub type EventListener = Box<dyn FnMut(&LifecycleEvent)>;

/// Ordered list of event listeners.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<EventListener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener. Listeners run in subscription order.
    pub fn subscribe(&mut self, listener: impl FnMut(&LifecycleEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Deliver an event to every listener.
    pub fn emit(&mut self, event: LifecycleEvent) {
        match &event {
            LifecycleEvent::Plug(d) => tracing::info!("Plugged {}", d.generic_name),
            LifecycleEvent::Unplug(d) => tracing::info!("Unplugged {}", d.generic_name),
            LifecycleEvent::Replug => tracing::debug!("Requesting replug"),
        }
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listeners_run_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = seen.clone();
        bus.subscribe(move |e| first.borrow_mut().push(("first", e.clone())));
        let second = seen.clone();
        bus.subscribe(move |e| second.borrow_mut().push(("second", e.clone())));

        bus.emit(LifecycleEvent::Replug);

        assert_eq!(
            *seen.borrow(),
            vec![
                ("first", LifecycleEvent::Replug),
                ("second", LifecycleEvent::Replug)
            ]
        );
        assert_eq!(bus.len(), 2);
        assert_eq!(LifecycleEvent::Replug.plugin(), None);
    }
}
