/*!
Denial-of-existence precompilation for secure zones, NSEC3-shaped.
For each owner name in a secure zone, an iterated salted hash is
computed once at load time and stored
ordered by hash value, so that answering "this name does not exist"
means locating the hash interval the query's hashed name falls into —
the same shape as RFC 5155 NSEC3, simplified to what this nameserver
needs: existence/non-existence, not full signed proof chains (signing
itself is explicitly out of scope).
*/

use sha1::{Digest, Sha1};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct DenialParams {
    pub algorithm: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
}

/// Owner-name hashes for one zone, ordered so that a missing name's
/// hash can be located between two covering entries.
#[derive(Debug, Clone)]
pub struct DenialStore {
    params: DenialParams,
    entries: BTreeMap<Vec<u8>, ()>,
}

impl DenialStore {
    pub fn new(params: DenialParams) -> Self {
        DenialStore { params, entries: BTreeMap::new() }
    }

    pub fn params(&self) -> &DenialParams {
        &self.params
    }

    /// Hash and record one owner name's canonical wire bytes.
    pub fn insert(&mut self, owner_wire: &[u8]) {
        self.entries.insert(hash_name(&self.params, owner_wire), ());
    }

    pub fn contains(&self, owner_wire: &[u8]) -> bool {
        self.entries.contains_key(&hash_name(&self.params, owner_wire))
    }

    /// The covering interval for `owner_wire`: the greatest hash
    /// less-or-equal and the least hash strictly greater, wrapping
    /// around the hash space. Returns `None` only if the store is
    /// empty.
    pub fn covering_interval(&self, owner_wire: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
        if self.entries.is_empty() {
            return None;
        }
        let target = hash_name(&self.params, owner_wire);
        let lower = self
            .entries
            .range(..=target.clone())
            .next_back()
            .map(|(k, _)| k.clone())
            .or_else(|| self.entries.keys().next_back().cloned())?;
        let upper = self
            .entries
            .range(target.clone()..)
            .find(|(k, _)| **k != target)
            .map(|(k, _)| k.clone())
            .or_else(|| self.entries.keys().next().cloned())?;
        Some((lower, upper))
    }

    /// The hash of `owner_wire` under this store's params, for
    /// building a synthetic denial record without a second lookup.
    pub fn hash_of(&self, owner_wire: &[u8]) -> Vec<u8> {
        hash_name(&self.params, owner_wire)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// RFC 5155 §5 iterated hash: `H(salt || H(salt || ... H(salt || owner)))`,
/// applied `iterations + 1` times total.
fn hash_name(params: &DenialParams, owner_wire: &[u8]) -> Vec<u8> {
    let mut digest = owner_wire.to_vec();
    for _ in 0..=params.iterations {
        let mut hasher = Sha1::new();
        hasher.update(&digest);
        hasher.update(&params.salt);
        digest = hasher.finalize().to_vec();
    }
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DenialParams {
        DenialParams { algorithm: 1, iterations: 2, salt: vec![0xAB, 0xCD] }
    }

    #[test]
    fn hash_is_deterministic() {
        let p = params();
        let a = hash_name(&p, b"\x03www\x07example\x03com\x00");
        let b = hash_name(&p, b"\x03www\x07example\x03com\x00");
        assert_eq!(a, b);
    }

    #[test]
    fn different_names_hash_differently() {
        let p = params();
        let a = hash_name(&p, b"\x03www\x07example\x03com\x00");
        let b = hash_name(&p, b"\x04mail\x07example\x03com\x00");
        assert_ne!(a, b);
    }

    #[test]
    fn covering_interval_wraps_around() {
        let mut store = DenialStore::new(params());
        store.insert(b"\x03www\x07example\x03com\x00");
        store.insert(b"\x04mail\x07example\x03com\x00");
        let (lo, hi) = store.covering_interval(b"\x03ftp\x07example\x03com\x00").unwrap();
        assert_ne!(lo, hi);
    }

    #[test]
    fn contains_known_name() {
        let mut store = DenialStore::new(params());
        let owner = b"\x03www\x07example\x03com\x00";
        store.insert(owner);
        assert!(store.contains(owner));
        assert!(!store.contains(b"\x04nope\x07example\x03com\x00"));
    }
}
