//! A single resource record and the set of records sharing an owner,
//! type and class — a node's data is stored as rrsets, never as loose
//! individual records.

use super::rdata::RData;
use super::types::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Rr {
    pub rdata: RData,
}

/// All records at one (owner, type, class). Every record in an rrset
/// shares the same owner, type, class and TTL — this struct enforces
/// the TTL part by storing it once, and [`Rrset::add`] reconciles a
/// mismatched incoming TTL down to the minimum, logging a warning.
#[derive(Debug, Clone)]
pub struct Rrset {
    pub rtype: RrType,
    pub class: RrClass,
    pub ttl: u32,
    pub records: Vec<Rr>,
}

impl Rrset {
    pub fn new(rtype: RrType, class: RrClass, ttl: u32) -> Self {
        Rrset { rtype, class, ttl, records: Vec::new() }
    }

    /// Append a record, reconciling TTL to the minimum of the existing
    /// and incoming value when they differ. Inserting a record already
    /// present in the set is a silent no-op.
    pub fn add(&mut self, rdata: RData, ttl: u32) {
        if self.records.iter().any(|rr| rr.rdata == rdata) {
            return;
        }
        if ttl != self.ttl {
            tracing::warn!(
                rtype = self.rtype,
                existing_ttl = self.ttl,
                incoming_ttl = ttl,
                "rrset TTL mismatch, reconciling to minimum"
            );
            self.ttl = self.ttl.min(ttl);
        }
        self.records.push(Rr { rdata });
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
