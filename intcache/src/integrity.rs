//! Full-domain population and verification.

use log::{debug, info};

use crate::error::{Error, Result};
use crate::map::KeyValueStore;

/// Store the identity mapping `key -> key` for every key in `[0, mask]`.
pub fn populate(store: &dyn KeyValueStore, mask: i32) {
    debug!("populating {} with {} keys", store.name(), mask as i64 + 1);
    for key in 0..=mask {
        store.put(key, key);
    }
}

/// Check that every key in `[0, mask]` still maps to a value whose low bits
/// are the key itself.
///
/// Benchmark writes store the raw generator output under `r & mask`, so
/// only the masked bits are compared. Stops at the first bad key.
pub fn verify(store: &dyn KeyValueStore, mask: i32) -> Result<()> {
    for key in 0..=mask {
        let value = store.get(key);
        if value & mask != key & mask {
            return Err(Error::StructuralCorruption { key, value });
        }
    }
    info!("{}: all {} keys verified", store.name(), mask as i64 + 1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{ChainedTable, ConcurrentMap};

    #[test]
    fn populated_store_verifies() {
        let store = ChainedTable::with_capacity(1024);
        populate(&store, 0xFFF);
        assert_eq!(store.len(), 0x1000);
        verify(&store, 0xFFF).unwrap();
    }

    #[test]
    fn high_bits_are_ignored() {
        let store = ConcurrentMap::new();
        populate(&store, 0xFF);
        store.put(0x12, 0x7700_0012);
        verify(&store, 0xFF).unwrap();
    }

    #[test]
    fn first_mismatch_is_reported() {
        let store = ConcurrentMap::new();
        populate(&store, 0xFF);
        store.put(0x20, 0x21);
        store.put(0x30, 0x31);
        assert_eq!(
            verify(&store, 0xFF),
            Err(Error::StructuralCorruption {
                key: 0x20,
                value: 0x21
            })
        );
    }

    #[test]
    fn missing_key_is_corruption() {
        let store = ConcurrentMap::new();
        // key 0 reads back as the absent sentinel, which happens to match
        assert_eq!(
            verify(&store, 0xF),
            Err(Error::StructuralCorruption { key: 1, value: 0 })
        );
    }
}
