//! A zone: the subtree rooted at an apex node that a single SOA
//! governs.

use super::types::*;
use crate::denial::DenialStore;
use crate::name::Name;

#[derive(Debug, Clone)]
pub struct Zone {
    pub id: ZoneId,
    pub apex: NodeId,
    pub apex_name: Name,

    /// Set once the apex has an SOA rrset; checked by [`Zone::is_ok`].
    pub has_soa: bool,
    /// Set once the apex has an NS rrset. Not required for
    /// [`Zone::is_ok`] — a zone can be served before its own NS set is
    /// loaded — but tracked for completeness alongside `has_soa`.
    pub has_ns: bool,

    /// Present once a DNSKEY rrset exists at the apex; gates whether
    /// NSEC3-style denial-of-existence answers are synthesized.
    pub is_secure: bool,
    pub denial: Option<DenialStore>,
}

impl Zone {
    pub fn new(id: ZoneId, apex: NodeId, apex_name: Name) -> Self {
        Zone {
            id,
            apex,
            apex_name,
            has_soa: false,
            has_ns: false,
            is_secure: false,
            denial: None,
        }
    }

    /// A zone is answerable once its apex carries an SOA RRset.
    pub fn is_ok(&self) -> bool {
        self.has_soa
    }
}
