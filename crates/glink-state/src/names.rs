//! Virtual object-name management.
//!
//! The issuing side mints small dense virtual names per namespace and reuses
//! deleted ones, mirroring GL's "a deleted name may be returned again"
//! contract. The executing side maps virtual names to whatever the real
//! driver handed out.

use glink_protocol::Namespace;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Per-namespace monotonic counter plus free list.
#[derive(Debug, Default)]
pub struct NameAllocator {
    next: u32,
    free: Vec<u32>,
}

impl NameAllocator {
    /// Allocate `n` names, reusing freed ones before minting new values.
    ///
    /// Counter exhaustion is unrecoverable and panics.
    pub fn alloc(&mut self, n: usize) -> Vec<u32> {
        let mut names = Vec::with_capacity(n);
        while names.len() < n {
            match self.free.pop() {
                Some(name) => names.push(name),
                None => {
                    self.next = self.next.checked_add(1).expect("virtual name space exhausted");
                    names.push(self.next);
                }
            }
        }
        names
    }

    /// Return deleted names to the pool. Name 0 is never pooled.
    pub fn release(&mut self, names: &[u32]) {
        for &name in names {
            if name != 0 {
                self.free.push(name);
            }
        }
    }
}

/// All four object namespaces. Process-wide on the issuing side, shared by
/// every client thread behind a mutex that is only taken in Gen/Delete paths.
#[derive(Debug, Default)]
pub struct NamePools {
    pools: [NameAllocator; Namespace::ALL.len()],
}

pub type SharedNamePools = Arc<Mutex<NamePools>>;

impl NamePools {
    pub fn shared() -> SharedNamePools {
        Arc::new(Mutex::new(NamePools::default()))
    }

    pub fn alloc(&mut self, namespace: Namespace, n: usize) -> Vec<u32> {
        self.pools[namespace as usize].alloc(n)
    }

    pub fn release(&mut self, namespace: Namespace, names: &[u32]) {
        self.pools[namespace as usize].release(names);
    }
}

/// Executing-side virtual-to-real name map.
#[derive(Debug, Default)]
pub struct NameTable {
    map: HashMap<(Namespace, u32), u32>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn insert(&mut self, namespace: Namespace, virtual_name: u32, real_name: u32) {
        self.map.insert((namespace, virtual_name), real_name);
    }

    pub fn resolve(&self, namespace: Namespace, virtual_name: u32) -> Option<u32> {
        self.map.get(&(namespace, virtual_name)).copied()
    }

    pub fn remove(&mut self, namespace: Namespace, virtual_name: u32) -> Option<u32> {
        self.map.remove(&(namespace, virtual_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_names_are_reused_before_minting() {
        let mut pool = NameAllocator::default();
        let first = pool.alloc(3);
        assert_eq!(first, vec![1, 2, 3]);

        pool.release(&first);
        let second = pool.alloc(3);
        let mut sorted = second.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3]);

        // Pool drained: the next allocation mints a fresh value.
        assert_eq!(pool.alloc(1), vec![4]);
    }

    #[test]
    fn zero_is_never_pooled() {
        let mut pool = NameAllocator::default();
        pool.release(&[0]);
        assert_eq!(pool.alloc(1), vec![1]);
    }

    #[test]
    fn namespaces_are_independent() {
        let mut pools = NamePools::default();
        assert_eq!(pools.alloc(Namespace::Buffer, 2), vec![1, 2]);
        assert_eq!(pools.alloc(Namespace::Texture, 1), vec![1]);
    }

    #[test]
    fn table_tracks_mappings_per_namespace() {
        let mut table = NameTable::new();
        table.insert(Namespace::Buffer, 7, 1001);
        table.insert(Namespace::Texture, 7, 2001);
        assert_eq!(table.resolve(Namespace::Buffer, 7), Some(1001));
        assert_eq!(table.resolve(Namespace::Texture, 7), Some(2001));

        assert_eq!(table.remove(Namespace::Buffer, 7), Some(1001));
        assert_eq!(table.resolve(Namespace::Buffer, 7), None);
        assert_eq!(table.resolve(Namespace::Texture, 7), Some(2001));
    }
}
