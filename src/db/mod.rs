/*!
The name database: an arena of [`Node`]s addressed by [`NodeId`], plus
the zones carved out of it. `Namedb` is the single owner of every
node; all other code, including [`crate::tree::NameTree`] indices and
[`crate::db::rdata::RData`] references, holds non-owning [`NodeId`]
handles.
*/

pub mod node;
pub mod rdata;
pub mod rr;
pub mod types;
pub mod zone;

use self::node::Node;
use self::rdata::RData;
use self::rr::Rrset;
use self::types::*;
use self::zone::Zone;
use crate::name::Name;
use crate::tree::{Lookup, NameTree};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DbError {
    #[error("node {0} not found")]
    NoSuchNode(NodeId),
    #[error("zone {0} not found")]
    NoSuchZone(ZoneId),
    #[error("name is not contained in any configured zone")]
    NoZone,
}

/// The outcome of a closest-encloser walk.
pub enum Encloser {
    /// The queried name exists exactly.
    Exact(NodeId),
    /// The name does not exist, but `parent` is its closest existing
    /// ancestor and `matched_labels` is how many labels matched.
    Closest { closest: NodeId, matched_labels: usize },
}

pub struct Namedb {
    nodes: Vec<Node>,
    tree: NameTree<NodeId>,
    zones: Vec<Zone>,
}

impl Namedb {
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        nodes.push(Node::new(ROOT, Name::root(), None));
        let mut tree = NameTree::new();
        tree.insert(&Name::root(), ROOT);
        Namedb { nodes, tree, zones: Vec::new() }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn name_of(&self, id: NodeId) -> &Name {
        &self.nodes[id].name
    }

    pub fn zone(&self, id: ZoneId) -> &Zone {
        &self.zones[id]
    }

    pub fn zone_mut(&mut self, id: ZoneId) -> &mut Zone {
        &mut self.zones[id]
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Find or create the node for `name`, creating empty
    /// non-terminals for every missing ancestor along the way and
    /// bumping each new node's parent's usage counter by one.
    pub fn ensure_node(&mut self, name: &Name) -> NodeId {
        if let Some(id) = self.tree.get(name) {
            return *id;
        }
        let parent_id = if name.is_root() {
            None
        } else {
            Some(self.ensure_node(&name.parent().expect("non-root has a parent")))
        };
        let id = self.nodes.len();
        self.nodes.push(Node::new(id, name.clone(), parent_id));
        self.tree.insert(name, id);
        if let Some(p) = parent_id {
            self.nodes[p].usage += 1;
            if name.label_at(name.label_count() - 1) == b"*" {
                self.nodes[p].wildcard_child = Some(id);
            }
        }
        id
    }

    /// Insert one record into `zone`'s rrset of `(name, rtype, class)`,
    /// creating the node and rrset if absent. A duplicate within the
    /// rrset is a silent no-op (handled by [`Rrset::add`]); inserting a
    /// CNAME alongside other data at the same owner, or other data
    /// alongside an existing CNAME, is logged rather than rejected —
    /// RRSIG/NSEC/NSEC3 are exempt from the exclusivity rule.
    pub fn insert_rr(&mut self, zone: ZoneId, name: &Name, rtype: RrType, class: RrClass, ttl: u32, rdata: RData) {
        let refs = rdata.node_refs();
        let id = self.ensure_node(name);
        let exempt = matches!(rtype, TYPE_RRSIG | TYPE_NSEC | TYPE_NSEC3);
        if !exempt {
            let node = &self.nodes[id];
            let has_cname = node.rrsets.keys().any(|(z, t, c)| *z == zone && *c == class && *t == TYPE_CNAME);
            let has_other = node.rrsets.keys().any(|(z, t, c)| {
                *z == zone && *c == class && *t != TYPE_CNAME && !matches!(*t, TYPE_RRSIG | TYPE_NSEC | TYPE_NSEC3)
            });
            if rtype == TYPE_CNAME && has_other {
                tracing::warn!(name = %name, "CNAME inserted alongside existing data at the same owner");
            } else if rtype != TYPE_CNAME && has_cname {
                tracing::warn!(name = %name, rtype, "data inserted alongside an existing CNAME at the same owner");
            }
        }
        let node = &mut self.nodes[id];
        node
            .rrsets
            .entry((zone, rtype, class))
            .or_insert_with(|| Rrset::new(rtype, class, ttl))
            .add(rdata, ttl);
        for r in refs {
            self.nodes[r].usage += 1;
        }
    }

    /// Remove one record from `zone`'s rrset of `(name, rtype, class)`
    /// if present; absence is never an error. Nodes left with no
    /// rrsets, no children and no remaining references are
    /// garbage-collected upward, stopping at the zone apex.
    pub fn delete_rr(&mut self, zone: ZoneId, name: &Name, rtype: RrType, class: RrClass, rdata: &RData) {
        let Some(&id) = self.tree.get(name) else { return };
        let refs = rdata.node_refs();
        if let Some(rrset) = self.nodes[id].rrsets.get_mut(&(zone, rtype, class)) {
            rrset.records.retain(|rr| rr.rdata != *rdata);
            if rrset.records.is_empty() {
                self.nodes[id].rrsets.remove(&(zone, rtype, class));
            }
        }
        for r in refs {
            self.nodes[r].usage = self.nodes[r].usage.saturating_sub(1);
        }
        self.prune_upward(id);
    }

    /// Walk from `id` toward the root, removing each node from the
    /// name-tree index once it carries no rrsets and nothing else
    /// refers to it, stopping at the first apex or at a node still in
    /// use. The orphaned [`Node`] itself stays in the arena — other
    /// code addresses nodes only by [`NodeId`], and this implementation
    /// never recycles or compacts ids.
    fn prune_upward(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(node_id) = cur {
            if node_id == ROOT || self.nodes[node_id].is_apex {
                break;
            }
            let node = &self.nodes[node_id];
            if !node.rrsets.is_empty() || node.usage > 0 {
                break;
            }
            let name = node.name.clone();
            let parent = node.parent;
            self.tree.remove(&name);
            if let Some(p) = parent {
                self.nodes[p].usage = self.nodes[p].usage.saturating_sub(1);
                if self.nodes[p].wildcard_child == Some(node_id) {
                    self.nodes[p].wildcard_child = None;
                }
            }
            cur = parent;
        }
    }

    /// Resolve `name` to a [`NodeId`] without mutating the db: an exact
    /// match if the name is already present, else the root. Used to
    /// decode untrusted query input, where [`Namedb::ensure_node`]'s
    /// eager creation of empty non-terminals would let a query shape
    /// the db it is only supposed to read.
    pub fn find_or_root(&self, name: &Name) -> NodeId {
        self.tree.get(name).copied().unwrap_or(ROOT)
    }

    /// Closest-encloser search: exact match if present, else walk
    /// predecessor-then-parent until an existing node is found.
    pub fn find_closest(&self, name: &Name) -> Encloser {
        match self.tree.find_less_or_equal(name) {
            Lookup::Exact(&id) => Encloser::Exact(id),
            Lookup::Predecessor(&candidate) => {
                let matched = name.label_match_count(&self.nodes[candidate].name);
                let mut walk = candidate;
                let mut walk_matched = matched;
                while walk_matched < self.nodes[walk].name.label_count() {
                    match self.nodes[walk].parent {
                        Some(p) => walk = p,
                        None => break,
                    }
                    walk_matched = name.label_match_count(&self.nodes[walk].name);
                }
                Encloser::Closest { closest: walk, matched_labels: walk_matched }
            }
            Lookup::Empty => Encloser::Closest { closest: ROOT, matched_labels: 0 },
        }
    }

    /// The zone whose apex most closely encloses `name`, if any —
    /// delegation walks outward from the queried name to the nearest
    /// configured apex.
    pub fn find_zone_for(&self, name: &Name) -> Option<&Zone> {
        let mut best: Option<&Zone> = None;
        for z in &self.zones {
            if name.is_subdomain_of(&z.apex_name) || *name == z.apex_name {
                match best {
                    Some(b) if b.apex_name.label_count() >= z.apex_name.label_count() => {}
                    _ => best = Some(z),
                }
            }
        }
        best
    }

    /// Register `apex` (which must already exist as a node) as a zone
    /// root; SOA/NS bookkeeping is maintained as those rrsets are
    /// inserted via [`Namedb::note_apex_rrset`].
    pub fn add_zone(&mut self, apex_name: &Name) -> ZoneId {
        let apex = self.ensure_node(apex_name);
        let zone_id = self.zones.len();
        self.zones.push(Zone::new(zone_id, apex, apex_name.clone()));
        self.nodes[apex].is_apex = true;
        self.nodes[apex].zone = Some(zone_id);
        zone_id
    }

    /// Update a zone's SOA/NS/secure bookkeeping after inserting an
    /// apex rrset of `rtype`. Call once per insert at an apex node.
    pub fn note_apex_rrset(&mut self, zone_id: ZoneId, rtype: RrType) {
        let zone = &mut self.zones[zone_id];
        match rtype {
            TYPE_SOA => zone.has_soa = true,
            TYPE_NS => zone.has_ns = true,
            TYPE_DNSKEY => zone.is_secure = true,
            _ => {}
        }
    }

    /// The node named literally `*` under `parent`, if any — the
    /// wildcard synthesis source.
    pub fn wildcard_under(&self, parent: NodeId) -> Option<NodeId> {
        self.nodes[parent].wildcard_child
    }

    /// A name is glue if it lies below a delegation NS within `zone`
    /// and bears no SOA of its own — i.e. it is served by this zone's
    /// data but isn't itself an apex. Out-of-bailiwick targets are
    /// never glue here; a resolver looks those up on its own.
    pub fn is_glue(&self, candidate: NodeId, zone: &Zone) -> bool {
        let node = &self.nodes[candidate];
        if !node.name.is_subdomain_of(&zone.apex_name) || candidate == zone.apex {
            return false;
        }
        if node.rrsets.keys().any(|(z, t, _)| *z == zone.id && *t == TYPE_SOA) {
            return false;
        }
        let mut cur = node.parent;
        while let Some(p) = cur {
            if p == zone.apex {
                break;
            }
            if self.nodes[p].rrsets.keys().any(|(z, t, _)| *z == zone.id && *t == TYPE_NS) {
                return true;
            }
            cur = self.nodes[p].parent;
        }
        false
    }
}

impl Default for Namedb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::rdata::RData;
    use std::net::Ipv4Addr;

    fn n(s: &str) -> Name {
        Name::from_text(s).unwrap()
    }

    #[test]
    fn ensure_node_creates_empty_non_terminals() {
        let mut db = Namedb::new();
        let id = db.ensure_node(&n("www.example.com"));
        assert!(db.node(id).is_empty_non_terminal());
        let parent = db.node(id).parent.unwrap();
        assert_eq!(db.name_of(parent), &n("example.com"));
        assert_eq!(db.node(parent).usage, 1);
    }

    #[test]
    fn insert_and_find_exact() {
        let mut db = Namedb::new();
        let zone_id = db.add_zone(&n("example.com"));
        db.insert_rr(zone_id, &n("www.example.com"), TYPE_A, CLASS_IN, 300, RData::A(Ipv4Addr::new(1, 2, 3, 4)));
        match db.find_closest(&n("www.example.com")) {
            Encloser::Exact(id) => assert!(db.node(id).has_data()),
            _ => panic!("expected exact match"),
        }
    }

    #[test]
    fn find_closest_encloser_for_missing_name() {
        let mut db = Namedb::new();
        let zone_id = db.add_zone(&n("example.com"));
        db.insert_rr(zone_id, &n("example.com"), TYPE_A, CLASS_IN, 300, RData::A(Ipv4Addr::new(1, 1, 1, 1)));
        match db.find_closest(&n("nope.example.com")) {
            Encloser::Closest { closest, matched_labels } => {
                assert_eq!(db.name_of(closest), &n("example.com"));
                assert_eq!(matched_labels, 3);
            }
            Encloser::Exact(_) => panic!("should not match exactly"),
        }
    }

    #[test]
    fn wildcard_child_recorded() {
        let mut db = Namedb::new();
        let zone_id = db.add_zone(&n("example.com"));
        db.insert_rr(zone_id, &n("*.example.com"), TYPE_A, CLASS_IN, 300, RData::A(Ipv4Addr::new(9, 9, 9, 9)));
        let parent = db.ensure_node(&n("example.com"));
        assert!(db.wildcard_under(parent).is_some());
    }

    #[test]
    fn zone_is_ok_needs_only_soa() {
        let mut db = Namedb::new();
        let zone_id = db.add_zone(&n("example.com"));
        assert!(!db.zone(zone_id).is_ok());
        db.note_apex_rrset(zone_id, TYPE_SOA);
        assert!(db.zone(zone_id).is_ok());
    }

    #[test]
    fn duplicate_insert_is_idempotent() {
        let mut db = Namedb::new();
        let zone_id = db.add_zone(&n("example.com"));
        let addr = RData::A(Ipv4Addr::new(1, 2, 3, 4));
        db.insert_rr(zone_id, &n("www.example.com"), TYPE_A, CLASS_IN, 300, addr.clone());
        db.insert_rr(zone_id, &n("www.example.com"), TYPE_A, CLASS_IN, 300, addr);
        let id = db.ensure_node(&n("www.example.com"));
        assert_eq!(db.node(id).rrset(zone_id, TYPE_A, CLASS_IN).unwrap().len(), 1);
    }

    #[test]
    fn insert_then_delete_round_trips() {
        let mut db = Namedb::new();
        let zone_id = db.add_zone(&n("example.com"));
        let addr = RData::A(Ipv4Addr::new(1, 2, 3, 4));
        db.insert_rr(zone_id, &n("www.example.com"), TYPE_A, CLASS_IN, 300, addr.clone());
        db.delete_rr(zone_id, &n("www.example.com"), TYPE_A, CLASS_IN, &addr);
        match db.find_closest(&n("www.example.com")) {
            Encloser::Exact(_) => panic!("deleted node should no longer be indexed"),
            Encloser::Closest { closest, .. } => assert_eq!(db.name_of(closest), &n("example.com")),
        }
    }
}
