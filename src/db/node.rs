//! A domain name node in the namedb arena. Nodes are owned exclusively
//! by [`super::Namedb`]'s arena `Vec`; every other reference to one is
//! a [`NodeId`] handle, never `Rc`/`&Node`.

use super::rr::Rrset;
use super::types::*;
use crate::name::Name;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: Name,
    pub parent: Option<NodeId>,

    /// True at a zone cut: the apex of a zone rooted here.
    pub is_apex: bool,
    pub zone: Option<ZoneId>,

    /// Child named literally `*`, if any — the wildcard synthesis
    /// source.
    pub wildcard_child: Option<NodeId>,

    /// Count of children plus rrset references pointing at this node;
    /// reaching zero makes the node eligible for pruning.
    pub usage: u32,

    /// One entry per (zone, type, class) present here — keyed by zone
    /// rather than just type/class so that a parent zone's delegation
    /// NS and a child zone's apex SOA can both be recorded at the same
    /// owner name without colliding.
    pub rrsets: BTreeMap<(ZoneId, RrType, RrClass), Rrset>,
}

impl Node {
    pub fn new(id: NodeId, name: Name, parent: Option<NodeId>) -> Self {
        Node {
            id,
            name,
            parent,
            is_apex: false,
            zone: None,
            wildcard_child: None,
            usage: 0,
            rrsets: BTreeMap::new(),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.rrsets.is_empty()
    }

    pub fn rrset(&self, zone: ZoneId, rtype: RrType, class: RrClass) -> Option<&Rrset> {
        self.rrsets.get(&(zone, rtype, class))
    }

    pub fn rrset_mut(&mut self, zone: ZoneId, rtype: RrType, class: RrClass) -> Option<&mut Rrset> {
        self.rrsets.get_mut(&(zone, rtype, class))
    }

    /// Every RRset recorded here under `zone`, regardless of type —
    /// the ANY-qtype answer.
    pub fn rrsets_in_zone(&self, zone: ZoneId, class: RrClass) -> impl Iterator<Item = &Rrset> {
        self.rrsets.iter().filter(move |((z, _, c), _)| *z == zone && *c == class).map(|(_, rrset)| rrset)
    }

    /// A name present in the tree only because some descendant needs
    /// it as an ancestor, with no rrset of its own (an empty
    /// non-terminal).
    pub fn is_empty_non_terminal(&self) -> bool {
        self.rrsets.is_empty()
    }
}
