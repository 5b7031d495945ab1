use std::hash::Hash;

use hashbrown::HashMap;

use crate::types::Address;

/// Secondary index from a key to the accounts whose record carries it.
#[derive(Debug)]
pub struct VecIndex<K> {
    map: HashMap<K, Vec<Address>>,
}

impl<K: Eq + Hash> VecIndex<K> {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Adds `address` under `key` unless already present.
    pub fn add(&mut self, key: K, address: Address) {
        let entry = self.map.entry(key).or_default();
        if !entry.contains(&address) {
            entry.push(address);
        }
    }

    /// Removes `address` from `key`, dropping the key once empty.
    pub fn remove(&mut self, key: K, address: Address) {
        if let Some(v) = self.map.get_mut(&key) {
            v.retain(|a| *a != address);
            if v.is_empty() {
                self.map.remove(&key);
            }
        }
    }

    /// Addresses filed under `key`.
    pub fn get(&self, key: &K) -> Option<&Vec<Address>> {
        self.map.get(key)
    }
}

impl<K: Eq + Hash> Default for VecIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}
