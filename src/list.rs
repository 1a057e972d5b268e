//! Concurrent recency list.
//!
//! A doubly linked list ordered from most recently used (the head) to least
//! recently used (the sentinel). Head insertion is a lock-free CAS loop on an
//! `ArcSwap`; splices take short-lived per-node locks.
//!
//! ```text
//!   head ──next──▶ n1 ──next──▶ n2 ──next──▶ sentinel
//!        ◀─prev──     ◀─prev──     ◀─prev──
//!   (MRU)                                    (LRU anchor)
//! ```
//!
//! Removal is two-phase. A node is first invalidated with a CAS on its state,
//! which decides the single winner among concurrent evictions, touches and
//! removals. The winner then splices it out. Every traversal treats Invalid
//! nodes as transparent, so a node that is logically gone but still linked
//! does no harm. A node with no predecessor (the head, or a head displaced by
//! an insertion whose repair has not run yet) cannot be spliced by its
//! remover; the repair that follows the next head insertion splices it.
//!
//! **Note**: This module is internal infrastructure. Only the cache holds
//! node handles.

use crate::node::Node;
use arc_swap::ArcSwap;
use core::fmt;
use core::ptr;
use crossbeam_utils::Backoff;
use std::sync::Arc;

/// Outcome of a touch (`remove_and_add_first`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Touch {
    /// The node was retired and its replacement inserted at the head.
    Promoted,
    /// The node already was the head; nothing changed.
    AlreadyHead,
    /// Another thread invalidated the node first.
    Raced,
    /// The node was retired but the caller declined to insert a replacement.
    Retired,
}

pub(crate) struct ConcurrentRecencyList<T> {
    head: ArcSwap<Node<T>>,
    sentinel: Arc<Node<T>>,
}

impl<T> ConcurrentRecencyList<T> {
    pub(crate) fn new() -> Self {
        let sentinel = Arc::new(Node::sentinel());
        ConcurrentRecencyList {
            head: ArcSwap::new(Arc::clone(&sentinel)),
            sentinel,
        }
    }

    pub(crate) fn is_head(&self, node: &Arc<Node<T>>) -> bool {
        Arc::ptr_eq(&*self.head.load(), node)
    }

    /// Makes `node` the new head.
    ///
    /// Lock-free: a failed CAS means another insertion succeeded. The node
    /// must not have been inserted before.
    pub(crate) fn add_first(&self, node: &Arc<Node<T>>) {
        let backoff = Backoff::new();
        loop {
            let head = self.head.load_full();
            node.lock().next = Some(Arc::clone(&head));
            let previous = self.head.compare_and_swap(&head, Arc::clone(node));
            if Arc::ptr_eq(&*previous, &head) {
                break;
            }
            backoff.spin();
        }
        self.link_successor(node);
    }

    /// Points the first Valid node after `node` back at it, splicing out any
    /// Invalid nodes in between.
    fn link_successor(&self, node: &Arc<Node<T>>) {
        let mut links = node.lock();
        if links.detached {
            // A newer head's repair already spliced this node out.
            return;
        }
        let Some(mut successor) = links.next.clone() else {
            return;
        };
        loop {
            let mut successor_links = successor.lock();
            successor_links.prev = Arc::downgrade(node);
            if successor.is_valid() && !successor_links.detached {
                return;
            }
            let Some(after) = successor_links.next.clone() else {
                return;
            };
            links.next = Some(Arc::clone(&after));
            successor_links.detached = true;
            drop(successor_links);
            successor = after;
        }
    }

    /// The touch: retires `node` and inserts the replacement built by
    /// `replace` at the head.
    ///
    /// `replace` runs after this call has won the invalidation and may return
    /// `None` to skip the re-insertion. The node itself is never re-inserted.
    pub(crate) fn remove_and_add_first_with<F>(&self, node: &Arc<Node<T>>, replace: F) -> Touch
    where
        F: FnOnce() -> Option<Arc<Node<T>>>,
    {
        if self.is_head(node) {
            return Touch::AlreadyHead;
        }
        if !node.try_invalidate() {
            return Touch::Raced;
        }
        let outcome = match replace() {
            Some(fresh) => {
                self.add_first(&fresh);
                Touch::Promoted
            }
            None => Touch::Retired,
        };
        self.unlink(node);
        outcome
    }

    /// Touch with an unconditional replacement.
    #[cfg(test)]
    pub(crate) fn remove_and_add_first(&self, node: &Arc<Node<T>>, fresh: Arc<Node<T>>) -> Touch {
        self.remove_and_add_first_with(node, || Some(fresh))
    }

    /// Invalidates and splices out `node`.
    ///
    /// Returns whether this call performed the invalidation. A node that is
    /// still the head stays linked as Invalid, and keeps its payload alive,
    /// until the next `add_first` splices it out.
    pub(crate) fn remove(&self, node: &Arc<Node<T>>) -> bool {
        if !node.try_invalidate() {
            return false;
        }
        self.unlink(node);
        true
    }

    /// Evicts the least recently used Valid node.
    ///
    /// Scans backward from the sentinel, skipping nodes that already lost
    /// their Valid state, and returns the node this call invalidated. `None`
    /// means there is nothing to evict.
    pub(crate) fn remove_last(&self) -> Option<Arc<Node<T>>> {
        let backoff = Backoff::new();
        'scan: loop {
            let mut cursor = Arc::clone(&self.sentinel);
            loop {
                let previous = cursor.lock().prev.upgrade();
                match previous {
                    Some(candidate) => {
                        if candidate.try_invalidate() {
                            self.unlink(&candidate);
                            return Some(candidate);
                        }
                        cursor = candidate;
                    }
                    None if self.is_head(&cursor) => return None,
                    None => {
                        // A repair is in flight or the link went stale.
                        backoff.snooze();
                        continue 'scan;
                    }
                }
            }
        }
    }

    /// Splices an already invalidated node out of the list.
    fn unlink(&self, node: &Arc<Node<T>>) {
        let backoff = Backoff::new();
        loop {
            let predecessor = {
                let links = node.lock();
                if links.detached {
                    return;
                }
                match links.prev.upgrade() {
                    Some(predecessor) => predecessor,
                    // Head, unpublished, or displaced with a pending repair:
                    // that repair observes the Invalid state and splices.
                    None => return,
                }
            };

            let mut predecessor_links = predecessor.lock();
            let mut links = node.lock();
            if links.detached {
                return;
            }
            let linked = !predecessor_links.detached
                && ptr::eq(links.prev.as_ptr(), Arc::as_ptr(&predecessor))
                && predecessor_links
                    .next
                    .as_ref()
                    .is_some_and(|next| Arc::ptr_eq(next, node));
            if !linked {
                drop(links);
                drop(predecessor_links);
                backoff.snooze();
                continue;
            }

            let Some(successor) = links.next.clone() else {
                return;
            };
            let mut successor_links = successor.lock();
            predecessor_links.next = Some(Arc::clone(&successor));
            successor_links.prev = Arc::downgrade(&predecessor);
            links.detached = true;
            return;
        }
    }

    /// Payloads of Valid nodes from most to least recently used.
    ///
    /// Exact only when no operation is in flight.
    pub(crate) fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.valid_nodes()
            .iter()
            .filter_map(|node| node.payload().cloned())
            .collect()
    }

    /// Number of Valid nodes reachable from the head.
    pub(crate) fn valid_len(&self) -> usize {
        self.valid_nodes().len()
    }

    fn valid_nodes(&self) -> Vec<Arc<Node<T>>> {
        let mut nodes = Vec::new();
        let mut cursor = self.head.load_full();
        loop {
            if cursor.is_valid() && !cursor.is_sentinel() {
                nodes.push(Arc::clone(&cursor));
            }
            let next = cursor.lock().next.clone();
            match next {
                Some(next) => cursor = next,
                None => return nodes,
            }
        }
    }

    /// Verifies that the forward and backward chains agree on the Valid
    /// nodes, returning them from most to least recently used.
    ///
    /// Only meaningful when no operation is in flight.
    pub(crate) fn check_links(&self) -> Result<Vec<Arc<Node<T>>>, String> {
        let forward = self.valid_nodes();

        let mut backward = Vec::with_capacity(forward.len());
        let mut cursor = Arc::clone(&self.sentinel);
        loop {
            let previous = cursor.lock().prev.upgrade();
            match previous {
                Some(previous) => {
                    if previous.is_valid() {
                        backward.push(Arc::clone(&previous));
                    }
                    cursor = previous;
                }
                None => break,
            }
        }
        if !self.is_head(&cursor) {
            return Err("backward walk from the sentinel did not end at the head".into());
        }

        if forward.len() != backward.len() {
            return Err(format!(
                "forward walk saw {} valid nodes, backward walk saw {}",
                forward.len(),
                backward.len()
            ));
        }
        let mirrored = forward
            .iter()
            .zip(backward.iter().rev())
            .all(|(a, b)| Arc::ptr_eq(a, b));
        if !mirrored {
            return Err("forward and backward walks disagree on node order".into());
        }
        Ok(forward)
    }
}

impl<T> fmt::Debug for ConcurrentRecencyList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentRecencyList")
            .field("valid_len", &self.valid_len())
            .finish()
    }
}
