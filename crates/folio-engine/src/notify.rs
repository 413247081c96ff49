//! Synchronous change notification.
//!
//! After every committed mutation the notifier walks its subscribers in
//! phase order. The ordering (stats before layout) is enforced by the
//! mechanism itself rather than by registration order, so recomputation
//! stays deterministic no matter how the session wires things up.

use std::cell::RefCell;
use std::rc::Rc;

use crate::editing::Document;

/// Recomputation phases, notified in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NotifyPhase {
    Stats,
    Layout,
}

/// A derived computation that must re-run after each committed
/// document mutation.
pub trait ChangeSubscriber {
    fn phase(&self) -> NotifyPhase;
    fn document_changed(&mut self, doc: &Document);
}

/// Explicit, ordered list of subscribers notified synchronously after
/// a mutation commits.
#[derive(Default)]
pub struct ChangeNotifier {
    subscribers: Vec<Rc<RefCell<dyn ChangeSubscriber>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. Subscribers are kept sorted by phase;
    /// within a phase, registration order is preserved.
    pub fn subscribe(&mut self, subscriber: Rc<RefCell<dyn ChangeSubscriber>>) {
        self.subscribers.push(subscriber);
        self.subscribers.sort_by_key(|s| s.borrow().phase());
    }

    /// Notify all subscribers, in phase order, exactly once each.
    pub fn notify(&self, doc: &Document) {
        for subscriber in &self.subscribers {
            subscriber.borrow_mut().document_changed(doc);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
