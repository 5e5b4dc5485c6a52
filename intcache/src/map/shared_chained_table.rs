use std::ptr;
use std::sync::atomic::{AtomicI32, AtomicPtr, Ordering};

use super::{KeyValueStore, ABSENT};

struct Node {
    key: i32,
    value: AtomicI32,
    // fixed once the node is published
    next: *mut Node,
}

/// A [`ChainedTable`](super::ChainedTable) that is safe to insert into from
/// several threads.
///
/// Same layout and indexing: a power-of-two array of chain heads, never
/// resized. Each head is an [`AtomicPtr`] and a new key is linked in with a
/// compare-and-swap on the head, so racing inserts retry instead of losing
/// each other. Nodes are only ever prepended and are freed when the table is
/// dropped, which lets readers walk a chain without any lock.
pub struct SharedChainedTable {
    buckets: Box<[AtomicPtr<Node>]>,
    mask: usize,
}

impl SharedChainedTable {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let buckets = (0..capacity)
            .map(|_| AtomicPtr::new(ptr::null_mut()))
            .collect();
        SharedChainedTable {
            buckets,
            mask: capacity - 1,
        }
    }

    /// Length of the bucket array.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.buckets
            .iter()
            .map(|head| {
                let mut len = 0;
                let mut link = head.load(Ordering::Acquire);
                while let Some(node) = Self::node_at(link) {
                    len += 1;
                    link = node.next;
                }
                len
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket(&self, key: i32) -> &AtomicPtr<Node> {
        &self.buckets[(key as usize) & self.mask]
    }

    fn node_at<'a>(link: *mut Node) -> Option<&'a Node> {
        // SAFETY: every non-null link was published by a successful
        // compare-and-swap (release) and read back with acquire, and nodes
        // are not freed before the table itself is dropped.
        unsafe { link.as_ref() }
    }

    /// Scan the chain from `from` up to, not including, `until`.
    fn find(&self, from: *mut Node, until: *mut Node, key: i32) -> Option<&Node> {
        let mut link = from;
        while link != until {
            let node = Self::node_at(link)?;
            if node.key == key {
                return Some(node);
            }
            link = node.next;
        }
        None
    }
}

impl KeyValueStore for SharedChainedTable {
    fn get(&self, key: i32) -> i32 {
        let head = self.bucket(key).load(Ordering::Acquire);
        match self.find(head, ptr::null_mut(), key) {
            Some(node) => node.value.load(Ordering::Relaxed),
            None => ABSENT,
        }
    }

    fn put(&self, key: i32, value: i32) {
        let bucket = self.bucket(key);
        let mut head = bucket.load(Ordering::Acquire);
        if let Some(node) = self.find(head, ptr::null_mut(), key) {
            node.value.store(value, Ordering::Relaxed);
            return;
        }

        let node = Box::into_raw(Box::new(Node {
            key,
            value: AtomicI32::new(value),
            next: head,
        }));
        loop {
            match bucket.compare_exchange_weak(
                head,
                node,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(current) => {
                    // anything new sits in front of the head we last scanned
                    if let Some(existing) = self.find(current, head, key) {
                        existing.value.store(value, Ordering::Relaxed);
                        // SAFETY: `node` lost every race, so it was never
                        // published and this is its only owner.
                        drop(unsafe { Box::from_raw(node) });
                        return;
                    }
                    // SAFETY: still unpublished, no other thread can see it.
                    unsafe { (*node).next = current };
                    head = current;
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "sharedintmap"
    }
}

impl Drop for SharedChainedTable {
    fn drop(&mut self) {
        for head in self.buckets.iter_mut() {
            let mut link = std::mem::replace(head.get_mut(), ptr::null_mut());
            while !link.is_null() {
                // SAFETY: `&mut self` means no reader is left, and each node
                // is reachable from exactly one chain.
                let node = unsafe { Box::from_raw(link) };
                link = node.next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        assert_eq!(
            SharedChainedTable::with_capacity(1_000_000).capacity(),
            1_048_576
        );
        assert_eq!(SharedChainedTable::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn holds_twice_its_capacity() {
        let table = SharedChainedTable::with_capacity(1_000_000);
        for i in 0..2_000_000 {
            table.put(i, i);
        }
        for i in 0..2_000_000 {
            assert_eq!(table.get(i), i);
        }
        assert_eq!(table.len(), 2_000_000);
    }

    #[test]
    fn colliding_keys_stay_independent() {
        let table = SharedChainedTable::with_capacity(16);
        table.put(5, 1);
        table.put(5 + 16, 2);
        table.put(5, 3);
        assert_eq!(table.get(5), 3);
        assert_eq!(table.get(5 + 16), 2);
        assert_eq!(table.get(5 + 32), ABSENT);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn racing_inserts_of_the_same_keys_keep_one_node_each() {
        // few buckets so every insert fights over a handful of heads
        let table = Arc::new(SharedChainedTable::with_capacity(4));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    for key in 0..2_000 {
                        table.put(key, key);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(table.len(), 2_000);
        for key in 0..2_000 {
            assert_eq!(table.get(key), key);
        }
    }
}
