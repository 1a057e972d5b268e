//! Recency list node.
//!
//! A node carries a payload, its neighbor links and a one-way lifecycle flag.
//! The forward link owns the successor (`Arc`) and the backward link is a
//! `Weak`, so the chain from the head to the sentinel owns every linked node
//! and never forms a reference cycle.
//!
//! Links are guarded by a per-node `parking_lot::Mutex`. Code that holds more
//! than one node lock always acquires them from predecessor to successor.
//! Because nodes are only ever inserted at the head, that is "newer before
//! older", a total order over every node the list has ever seen.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};
use parking_lot::{Mutex, MutexGuard};
use std::sync::{Arc, Weak};

const VALID: u8 = 0;
const INVALID: u8 = 1;

/// Lifecycle of a node. Only `Valid -> Invalid` is ever taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeState {
    /// Linked (or about to be linked) and representing a resident entry.
    Valid,
    /// Being removed or already removed. Never becomes `Valid` again.
    Invalid,
}

/// Neighbor links of a node, guarded by the node's structural lock.
pub(crate) struct Links<T> {
    /// Older neighbor. `None` only for the sentinel.
    pub(crate) next: Option<Arc<Node<T>>>,
    /// Newer neighbor. Empty for the head, for a node that has not been
    /// published yet, and for a displaced head whose repair is pending.
    pub(crate) prev: Weak<Node<T>>,
    /// Set by whoever splices this node out of the forward chain.
    pub(crate) detached: bool,
}

pub(crate) struct Node<T> {
    payload: Option<T>,
    state: AtomicU8,
    links: Mutex<Links<T>>,
}

impl<T> Node<T> {
    pub(crate) fn new(payload: T) -> Self {
        Self::with_payload(Some(payload))
    }

    /// The permanent least-recently-used anchor. It is never invalidated.
    pub(crate) fn sentinel() -> Self {
        Self::with_payload(None)
    }

    fn with_payload(payload: Option<T>) -> Self {
        Node {
            payload,
            state: AtomicU8::new(VALID),
            links: Mutex::new(Links {
                next: None,
                prev: Weak::new(),
                detached: false,
            }),
        }
    }

    #[inline]
    pub(crate) fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    #[inline]
    pub(crate) fn is_sentinel(&self) -> bool {
        self.payload.is_none()
    }

    #[inline]
    pub(crate) fn state(&self) -> NodeState {
        match self.state.load(Ordering::Acquire) {
            VALID => NodeState::Valid,
            _ => NodeState::Invalid,
        }
    }

    #[inline]
    pub(crate) fn is_valid(&self) -> bool {
        self.state() == NodeState::Valid
    }

    /// Performs the `Valid -> Invalid` transition.
    ///
    /// Returns `true` only for the single call that won the transition; every
    /// other concurrent or later call gets `false`. The sentinel always
    /// refuses.
    pub(crate) fn try_invalidate(&self) -> bool {
        if self.is_sentinel() {
            return false;
        }
        self.state
            .compare_exchange(VALID, INVALID, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, Links<T>> {
        self.links.lock()
    }
}

impl<T> Drop for Node<T> {
    // Unwind uniquely owned successors in a loop so a long chain does not
    // recurse once per node.
    fn drop(&mut self) {
        let mut next = self.links.get_mut().next.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut node) => next = node.links.get_mut().next.take(),
                Err(_) => break,
            }
        }
    }
}

impl<T> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("state", &self.state())
            .field("sentinel", &self.is_sentinel())
            .finish()
    }
}
