//! LRU (Least Recently Used) cache implementation
//!
//! Nodes live in an arena addressed by index; the hash index maps each key to
//! its node slot, so promotion and eviction are O(1).

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

/// Node in the LRU doubly-linked list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// What a [`LruCache::put`] did to the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion<K, V> {
    /// New key stored, nothing evicted
    Inserted,
    /// Existing key overwritten; carries the previous value
    Replaced(V),
    /// New key stored after evicting the least recently used entry
    Evicted {
        /// Evicted key
        key: K,
        /// Evicted value
        value: V,
    },
}

/// LRU cache with fixed capacity
pub struct LruCache<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        Self {
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
        }
    }

    /// Get a value and promote its key to most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Get a value without touching recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Check for a key without touching recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Insert or overwrite a key and make it most recently used
    ///
    /// Overwrites never evict. A new key on a full cache evicts the tail first.
    pub fn put(&mut self, key: K, value: V) -> Insertion<K, V> {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = &mut self.nodes[idx] {
                let old = std::mem::replace(&mut node.value, value);
                self.move_to_front(idx);
                return Insertion::Replaced(old);
            }
            // A mapped slot is always occupied; fall through and rebuild the entry
            self.map.remove(&key);
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let idx = self.alloc(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.link_front(idx);
        self.map.insert(key, idx);

        match evicted {
            Some((key, value)) => Insertion::Evicted { key, value },
            None => Insertion::Inserted,
        }
    }

    /// Remove a key from the cache
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.map.remove(key)?;
        self.unlink(idx);
        self.release(idx).map(|node| node.value)
    }

    /// Least recently used entry, the next eviction candidate
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        let idx = self.tail?;
        self.nodes[idx].as_ref().map(|node| (&node.key, &node.value))
    }

    /// Iterate entries from most to least recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            next: self.head,
            remaining: self.map.len(),
        }
    }

    /// Get the current size of the cache
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.unlink(idx);
            self.link_front(idx);
        }
    }

    /// Attach a detached slot at the head of the recency list
    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = old_head;
        }

        match old_head.and_then(|head_idx| self.nodes[head_idx].as_mut()) {
            Some(head) => head.prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    /// Detach a slot from the recency list, leaving its own links stale
    fn unlink(&mut self, idx: usize) {
        let Some((prev, next)) = self.nodes[idx].as_ref().map(|node| (node.prev, node.next))
        else {
            return;
        };

        match prev.and_then(|prev_idx| self.nodes[prev_idx].as_mut()) {
            Some(prev_node) => prev_node.next = next,
            None => self.head = next,
        }

        match next.and_then(|next_idx| self.nodes[next_idx].as_mut()) {
            Some(next_node) => next_node.prev = prev,
            None => self.tail = prev,
        }
    }

    // Unlink before releasing the slot: unlink reads the neighbour links from it
    fn evict(&mut self) -> Option<(K, V)> {
        let tail_idx = self.tail?;
        self.unlink(tail_idx);
        let node = self.release(tail_idx)?;
        self.map.remove(&node.key);
        Some((node.key, node.value))
    }

    /// Store a node in a free slot, reusing released slots first
    fn alloc(&mut self, node: Node<K, V>) -> usize {
        match self.free_list.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    /// Empty a slot and return it to the free list
    fn release(&mut self, idx: usize) -> Option<Node<K, V>> {
        let node = self.nodes[idx].take()?;
        self.free_list.push(idx);
        Some(node)
    }
}

/// Iterator over entries from most to least recently used
pub struct Iter<'a, K, V> {
    nodes: &'a [Option<Node<K, V>>],
    next: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        let node = nodes[self.next?].as_ref()?;
        self.next = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
{
    /// Walk the list both ways and check it matches the index exactly
    pub(crate) fn assert_consistent(&self) {
        let mut forward = Vec::new();
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = self.nodes[idx].as_ref().expect("linked slot must be occupied");
            assert_eq!(node.prev, prev, "broken prev link at slot {}", idx);
            assert_eq!(self.map.get(&node.key), Some(&idx), "index disagrees for {:?}", node.key);
            forward.push(idx);
            prev = Some(idx);
            cursor = node.next;
            assert!(forward.len() <= self.map.len(), "cycle in recency list");
        }
        assert_eq!(self.tail, prev, "tail does not end the list");
        assert_eq!(forward.len(), self.map.len(), "index and list sizes differ");
        assert!(self.map.len() <= self.capacity, "capacity exceeded");
    }
}
