use std::rc::Rc;

use crate::core::{flags::Flags, id::NodeId, world::Core};

/// Handle returned by [`Signal::connect`], used to disconnect a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener for lifecycle notifications.
pub type NodeListener = dyn Fn(&mut Core, NodeId);
/// Listener for invalidation notifications. Receives the flags that changed.
pub type InvalidatedListener = dyn Fn(&mut Core, NodeId, Flags);

/// An ordered list of listeners.
///
/// Dispatch works on a snapshot: listeners connected or disconnected while a
/// dispatch is in progress take effect from the next dispatch.
pub struct Signal<F: ?Sized> {
    /// Connected listeners in connection order.
    listeners: Vec<(ListenerId, Rc<F>)>,
    /// Next listener id.
    next: u64,
}

impl<F: ?Sized> Default for Signal<F> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            next: 0,
        }
    }
}

impl<F: ?Sized> Signal<F> {
    /// Connect a listener.
    pub fn connect(&mut self, f: Rc<F>) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.listeners.push((id, f));
        id
    }

    /// Disconnect a listener. Returns false if it was not connected.
    pub fn disconnect(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        before != self.listeners.len()
    }

    /// The current listeners, for dispatch.
    pub fn snapshot(&self) -> Vec<Rc<F>> {
        self.listeners.iter().map(|(_, f)| Rc::clone(f)).collect()
    }

    /// Remove every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Number of connected listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// True if nothing is connected.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// The notification lists every component carries.
#[derive(Default)]
pub struct Listeners {
    /// Fired with the changed flags after an invalidation changes anything.
    pub invalidated: Signal<InvalidatedListener>,
    /// Fired after activation.
    pub activated: Signal<NodeListener>,
    /// Fired after deactivation.
    pub deactivated: Signal<NodeListener>,
    /// Fired once, at the start of disposal.
    pub disposed: Signal<NodeListener>,
}

impl Listeners {
    /// Drop every listener.
    pub fn clear(&mut self) {
        self.invalidated.clear();
        self.activated.clear();
        self.deactivated.clear();
        self.disposed.clear();
    }
}
