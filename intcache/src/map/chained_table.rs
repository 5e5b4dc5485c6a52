use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicI32, Ordering};

use super::{KeyValueStore, ABSENT};

type Chain = Option<Box<Node>>;

struct Node {
    key: i32,
    // overwrites of an existing key go through this atomic, so they never
    // race with readers. Linking a new node into a chain does.
    value: AtomicI32,
    next: Chain,
}

/// A fixed-capacity hash table with separate chaining.
///
/// The number of buckets is the requested capacity rounded up to the next
/// power of two, so a key's bucket is `key & (capacity - 1)`. The table is
/// never resized; undersizing it only makes chains longer. New keys are
/// linked at the head of their chain and chains never shrink.
///
/// # Concurrency hazard
///
/// The table has no internal synchronization and is declared `Sync` only so
/// the unsynchronized baseline can be measured from several threads. It is
/// sound to share between threads only while no thread inserts a key that is
/// not yet present: concurrent `get`s and `put`s that overwrite existing keys
/// are fine, but two threads linking new nodes into the same chain (or one
/// linking while another scans) is a data race that can lose updates or
/// corrupt the chain. Pre-populate the whole key domain before sharing it.
/// Nothing checks this at runtime.
pub struct ChainedTable {
    buckets: Box<[UnsafeCell<Chain>]>,
    mask: usize,
    name: &'static str,
}

// SAFETY: see "Concurrency hazard" above. Callers sharing a table across
// threads take on the obligation that no structural insertion happens
// concurrently with any other access.
unsafe impl Sync for ChainedTable {}

impl ChainedTable {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let buckets = (0..capacity).map(|_| UnsafeCell::new(None)).collect();
        ChainedTable {
            buckets,
            mask: capacity - 1,
            name: "intmap",
        }
    }

    /// Report `name` from [`KeyValueStore::name`] instead of `intmap`.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Length of the bucket array.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        (0..self.buckets.len())
            .map(|idx| self.chain_len(idx))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the longest chain in the table.
    pub fn longest_chain(&self) -> usize {
        (0..self.buckets.len())
            .map(|idx| self.chain_len(idx))
            .max()
            .unwrap_or(0)
    }

    fn index(&self, key: i32) -> usize {
        (key as usize) & self.mask
    }

    fn head(&self, idx: usize) -> &Chain {
        // SAFETY: reading a chain is only racy against a concurrent insertion
        // into the same bucket, which the type's contract rules out.
        unsafe { &*self.buckets[idx].get() }
    }

    fn find(&self, key: i32) -> Option<&Node> {
        let mut link = self.head(self.index(key));
        while let Some(node) = link {
            if node.key == key {
                return Some(node);
            }
            link = &node.next;
        }
        None
    }

    fn chain_len(&self, idx: usize) -> usize {
        let mut len = 0;
        let mut link = self.head(idx);
        while let Some(node) = link {
            len += 1;
            link = &node.next;
        }
        len
    }
}

impl KeyValueStore for ChainedTable {
    fn get(&self, key: i32) -> i32 {
        match self.find(key) {
            Some(node) => node.value.load(Ordering::Relaxed),
            None => ABSENT,
        }
    }

    fn put(&self, key: i32, value: i32) {
        if let Some(node) = self.find(key) {
            node.value.store(value, Ordering::Relaxed);
            return;
        }

        // SAFETY: the key is absent, so this is a structural insertion. The
        // type's contract forbids any other access to the table while it
        // happens, which makes this the only live reference to the chain.
        let head = unsafe { &mut *self.buckets[self.index(key)].get() };
        let next = head.take();
        *head = Some(Box::new(Node {
            key,
            value: AtomicI32::new(value),
            next,
        }));
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for ChainedTable {
    fn drop(&mut self) {
        // unlink iteratively, a recursive drop of a long chain would blow
        // the stack.
        for bucket in self.buckets.iter_mut() {
            let mut link = bucket.get_mut().take();
            while let Some(mut node) = link {
                link = node.next.take();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        assert_eq!(ChainedTable::with_capacity(256_000).capacity(), 262_144);
        assert_eq!(ChainedTable::with_capacity(1_000_000).capacity(), 1_048_576);
        assert_eq!(ChainedTable::with_capacity(1024).capacity(), 1024);
        assert_eq!(ChainedTable::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn colliding_keys_stay_independent() {
        let table = ChainedTable::with_capacity(16);
        let size = table.capacity() as i32;
        table.put(3, 30);
        table.put(3 + size, 40);
        table.put(3 + 2 * size, 50);
        assert_eq!(table.longest_chain(), 3);

        table.put(3 + size, 41);
        assert_eq!(table.get(3), 30);
        assert_eq!(table.get(3 + size), 41);
        assert_eq!(table.get(3 + 2 * size), 50);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn name_defaults_to_intmap() {
        assert_eq!(ChainedTable::with_capacity(8).name(), "intmap");
        assert_eq!(ChainedTable::with_capacity(8).named("intmap2").name(), "intmap2");
    }

    #[test]
    fn overwrite_does_not_grow_chain() {
        let table = ChainedTable::with_capacity(4);
        for v in 0..10 {
            table.put(1, v);
        }
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(1), 9);
    }

    #[test]
    fn negative_keys_index_into_table() {
        let table = ChainedTable::with_capacity(8);
        table.put(-1, 11);
        table.put(7, 12);
        assert_eq!(table.get(-1), 11);
        assert_eq!(table.get(7), 12);
    }

    #[test]
    fn undersized_table_still_holds_whole_domain() {
        let table = ChainedTable::with_capacity(1);
        for key in 0..10_000 {
            table.put(key, key);
        }
        assert_eq!(table.longest_chain(), 10_000);
        assert_eq!(table.get(0), 0);
        assert_eq!(table.get(9_999), 9_999);
        // dropping a single 10k-long chain must not overflow the stack
        drop(table);
    }

    #[quickcheck]
    fn put_then_get_round_trips(entries: Vec<(i32, i32)>) -> bool {
        let table = ChainedTable::with_capacity(64);
        for &(k, v) in &entries {
            table.put(k, v);
        }
        let mut last = std::collections::HashMap::new();
        for &(k, v) in &entries {
            last.insert(k, v);
        }
        last.iter().all(|(&k, &v)| table.get(k) == v) && table.len() == last.len()
    }
}
