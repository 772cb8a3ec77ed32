//! Observers of PHY state transitions.
//!
//! Listeners model side effects of a transition (hardware power state,
//! energy accounting, MAC timers). The PHY holds shared handles in
//! registration order and notifies each one synchronously after every
//! successful transition. Owners keep their own handle and are expected to
//! unregister before dropping a listener they no longer want notified.

use super::Transition;
use std::cell::RefCell;
use std::rc::Rc;

/// Receives PHY transition notifications.
pub trait PhyListener {
    fn on_transition(&self, transition: Transition);
}

impl<F> PhyListener for F
where
    F: Fn(Transition),
{
    fn on_transition(&self, transition: Transition) {
        self(transition)
    }
}

/// Ordered set of listeners owned by one PHY.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<Rc<dyn PhyListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener. The same handle may be registered more than once.
    pub fn register(&mut self, listener: Rc<dyn PhyListener>) {
        self.listeners.push(listener);
    }

    /// Remove the first registration of `listener`, compared by identity.
    ///
    /// Returns `false` if it was not registered.
    pub fn unregister<L: PhyListener + ?Sized>(&mut self, listener: &Rc<L>) -> bool {
        let target = Rc::as_ptr(listener);
        match self
            .listeners
            .iter()
            .position(|l| std::ptr::addr_eq(Rc::as_ptr(l), target))
        {
            Some(index) => {
                self.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Deliver `transition` to every listener in registration order.
    pub fn notify(&self, transition: Transition) {
        for listener in &self.listeners {
            listener.on_transition(transition);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Listener that keeps every transition it sees.
#[derive(Debug, Default)]
pub struct TransitionRecorder {
    transitions: RefCell<Vec<Transition>>,
}

impl TransitionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transitions seen so far, oldest first.
    pub fn transitions(&self) -> Vec<Transition> {
        self.transitions.borrow().clone()
    }

    /// Number of transmissions started.
    pub fn tx_count(&self) -> usize {
        self.transitions
            .borrow()
            .iter()
            .filter(|t| matches!(t, Transition::TxStart { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.transitions.borrow_mut().clear();
    }
}

impl PhyListener for TransitionRecorder {
    fn on_transition(&self, transition: Transition) {
        self.transitions.borrow_mut().push(transition);
    }
}
