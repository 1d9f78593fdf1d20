//! Buckets and chains: the unsynchronized core of the table.
//!
//! Nodes live in a generational arena. A bucket stores the id of its chain
//! head; every node links to its successor through `next`, and the head
//! additionally anchors the chain's last node in `tail` so appends never walk
//! the chain. Non-head nodes keep `tail == None`.
//!
//! Callers must hold the table lock (shared for `find`/`iter`, exclusive for
//! everything else); nothing here synchronizes.

use crate::key::{Key, KeyRef};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Arena handle of one chain node.
    pub(crate) struct NodeId;
}

#[derive(Debug)]
struct Node<V> {
    key: Key,
    value: V,
    next: Option<NodeId>,
    tail: Option<NodeId>,
}

#[derive(Debug)]
pub(crate) struct Chains<V> {
    buckets: Box<[Option<NodeId>]>,
    nodes: SlotMap<NodeId, Node<V>>,
}

impl<V> Chains<V> {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            buckets: vec![None; capacity].into_boxed_slice(),
            nodes: SlotMap::with_key(),
        }
    }

    /// Number of reachable entries across all buckets.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    fn find_id(&self, index: usize, q: KeyRef<'_>) -> Option<NodeId> {
        let mut cur = self.buckets[index];
        while let Some(id) = cur {
            let node = &self.nodes[id];
            if node.key == q {
                return Some(id);
            }
            cur = node.next;
        }
        None
    }

    pub(crate) fn find(&self, index: usize, q: KeyRef<'_>) -> Option<&V> {
        self.find_id(index, q).map(|id| &self.nodes[id].value)
    }

    pub(crate) fn find_mut(&mut self, index: usize, q: KeyRef<'_>) -> Option<&mut V> {
        self.find_id(index, q).map(|id| &mut self.nodes[id].value)
    }

    /// Overwrites the value of an equal key in place, or appends a new node
    /// as the chain's tail. Returns the previous value on overwrite.
    ///
    /// The presence check and the append happen in one call, so under the
    /// exclusive lock no second entry for the same key can appear.
    pub(crate) fn insert(&mut self, index: usize, key: Key, value: V) -> Option<V> {
        if let Some(id) = self.find_id(index, key.as_key_ref()) {
            return Some(core::mem::replace(&mut self.nodes[id].value, value));
        }

        let id = self.nodes.insert(Node {
            key,
            value,
            next: None,
            tail: None,
        });
        match self.buckets[index] {
            Some(head) => {
                let tail = self.tail_of(head);
                debug_assert!(self.nodes[tail].next.is_none());
                self.nodes[tail].next = Some(id);
                self.nodes[head].tail = Some(id);
            }
            None => {
                self.nodes[id].tail = Some(id);
                self.buckets[index] = Some(id);
            }
        }
        None
    }

    /// The head's tail anchor. A missing anchor breaks the chain invariant;
    /// debug builds assert, release builds re-identify the tail by walking.
    fn tail_of(&self, head: NodeId) -> NodeId {
        match self.nodes[head].tail {
            Some(tail) => tail,
            None => {
                debug_assert!(false, "chain head without a tail anchor");
                let mut last = head;
                while let Some(next) = self.nodes[last].next {
                    last = next;
                }
                last
            }
        }
    }

    /// Detaches the node whose key equals `q` and hands back its key and
    /// value. Absent keys are a no-op.
    pub(crate) fn unlink(&mut self, index: usize, q: KeyRef<'_>) -> Option<(Key, V)> {
        self.unlink_where(index, |_, key| *key == q)
    }

    /// Removes the first node in bucket `index` accepted by `pred`.
    ///
    /// Fixes up, in order: the predecessor's `next` (or the bucket head), the
    /// head's tail anchor when the tail leaves, and the new head's anchor when
    /// the head leaves. Only then does the node leave the arena.
    fn unlink_where<P>(&mut self, index: usize, mut pred: P) -> Option<(Key, V)>
    where
        P: FnMut(NodeId, &Key) -> bool,
    {
        let head = self.buckets[index]?;
        let mut prev: Option<NodeId> = None;
        let mut cur = Some(head);
        while let Some(id) = cur {
            if pred(id, &self.nodes[id].key) {
                break;
            }
            prev = Some(id);
            cur = self.nodes[id].next;
        }
        let id = cur?;
        let next = self.nodes[id].next;

        match prev {
            Some(p) => {
                self.nodes[p].next = next;
                if next.is_none() {
                    self.nodes[head].tail = Some(p);
                }
            }
            None => {
                self.buckets[index] = next;
                if let Some(n) = next {
                    self.nodes[n].tail = self.nodes[id].tail;
                }
            }
        }

        let node = self.nodes.remove(id)?;
        Some((node.key, node.value))
    }

    /// Visits every entry in bucket order, then chain order, and removes the
    /// ones for which `f` returns `false`. The successor is read before `f`
    /// runs, so removing the current node never skips or revisits an entry.
    pub(crate) fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&Key, &mut V) -> bool,
    {
        for index in 0..self.buckets.len() {
            let mut cur = self.buckets[index];
            while let Some(id) = cur {
                let node = &mut self.nodes[id];
                cur = node.next;
                if !f(&node.key, &mut node.value) {
                    let _ = self.unlink_where(index, |other, _| other == id);
                }
            }
        }
    }

    pub(crate) fn iter(&self) -> Iter<'_, V> {
        Iter {
            chains: self,
            bucket: 0,
            cur: None,
        }
    }
}

/// Iterator over entries in bucket order, then chain order.
pub struct Iter<'a, V> {
    chains: &'a Chains<V>,
    bucket: usize,
    cur: Option<NodeId>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a Key, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let chains = self.chains;
        loop {
            if let Some(id) = self.cur {
                let node = &chains.nodes[id];
                self.cur = node.next;
                return Some((&node.key, &node.value));
            }
            if self.bucket >= chains.buckets.len() {
                return None;
            }
            self.cur = chains.buckets[self.bucket];
            self.bucket += 1;
        }
    }
}
