/*!
The classify phase: given a question already resolved
to a zone, decide what kind of answer it gets — positive, referral,
CNAME-chased, wildcard-synthesized, NODATA, or NXDOMAIN — and which
records belong in which section.
*/

use crate::db::node::Node;
use crate::db::rdata::RData;
use crate::db::types::*;
use crate::db::zone::Zone;
use crate::db::Namedb;
use crate::message::Record;
use crate::name::Name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Positive,
    NoData,
    NameError,
    Referral,
}

pub struct Classified {
    pub disposition: Disposition,
    pub aa: bool,
    pub answers: Vec<Record>,
    pub authority: Vec<Record>,
    pub additional: Vec<Record>,
}

/// Walk from `start` toward the zone apex, returning the first
/// non-apex ancestor carrying an NS rrset — the nearest zone cut above
/// (or at) `start`, if any.
fn find_delegation(db: &Namedb, zone: &Zone, start: NodeId) -> Option<NodeId> {
    let mut cur = start;
    loop {
        if cur != zone.apex && db.node(cur).rrset(zone.id, TYPE_NS, CLASS_IN).is_some() {
            return Some(cur);
        }
        if cur == zone.apex {
            return None;
        }
        cur = db.node(cur).parent?;
    }
}

fn records_for_rrset(zone: &Zone, node: &Node, rtype: RrType, class: RrClass) -> Vec<Record> {
    match node.rrset(zone.id, rtype, class) {
        Some(rrset) => rrset
            .records
            .iter()
            .map(|rr| Record { owner: node.name.clone(), rtype, class, ttl: rrset.ttl, rdata: rr.rdata.clone() })
            .collect(),
        None => Vec::new(),
    }
}

/// Every rrset recorded at `node` within `zone`, for an `ANY`-qtype
/// answer.
fn records_for_any(zone: &Zone, node: &Node, class: RrClass) -> Vec<Record> {
    node.rrsets_in_zone(zone.id, class)
        .flat_map(|rrset| {
            rrset
                .records
                .iter()
                .map(move |rr| Record { owner: node.name.clone(), rtype: rrset.rtype, class, ttl: rrset.ttl, rdata: rr.rdata.clone() })
        })
        .collect()
}

fn referral_records(db: &Namedb, zone: &Zone, cut: NodeId) -> Vec<Record> {
    records_for_rrset(zone, db.node(cut), TYPE_NS, CLASS_IN)
}

/// In-zone address glue for a set of NS records: for every NS target
/// that is itself inside `zone`, its A/AAAA rrsets. Out-of-bailiwick
/// targets never contribute glue here; a resolver must look those up
/// on its own.
fn glue_for_ns(db: &Namedb, zone: &Zone, ns_records: &[Record]) -> Vec<Record> {
    let mut out = Vec::new();
    for rec in ns_records {
        let target = match &rec.rdata {
            RData::Ns(t) => *t,
            _ => continue,
        };
        if !db.is_glue(target, zone) {
            continue;
        }
        let node = db.node(target);
        out.extend(records_for_rrset(zone, node, TYPE_A, CLASS_IN));
        out.extend(records_for_rrset(zone, node, TYPE_AAAA, CLASS_IN));
    }
    out
}

/// SOA record for negative/nodata answers, TTL clamped to the SOA
/// MINIMUM field (RFC 2308).
fn soa_for_negative(db: &Namedb, zone: &Zone) -> Vec<Record> {
    let apex = db.node(zone.apex);
    match apex.rrset(zone.id, TYPE_SOA, CLASS_IN) {
        Some(rrset) => rrset
            .records
            .iter()
            .map(|rr| {
                let minimum = match &rr.rdata {
                    RData::Soa(soa) => soa.minimum,
                    _ => rrset.ttl,
                };
                Record {
                    owner: apex.name.clone(),
                    rtype: TYPE_SOA,
                    class: CLASS_IN,
                    ttl: rrset.ttl.min(minimum),
                    rdata: rr.rdata.clone(),
                }
            })
            .collect(),
        None => Vec::new(),
    }
}

/// Synthetic NSEC3-shaped denial records covering the hash interval
/// `owner_wire` falls into. Deliberately minimal: the hash value only,
/// not a full RR wire format — signing is out of scope, so nothing
/// ever validates these beyond the engine's own denial store.
fn denial_covering(zone: &Zone, owner_wire: &[u8]) -> Vec<Record> {
    let Some(store) = &zone.denial else { return Vec::new() };
    match store.covering_interval(owner_wire) {
        Some((lo, hi)) if lo != hi => vec![
            Record { owner: zone.apex_name.clone(), rtype: TYPE_NSEC3, class: CLASS_IN, ttl: 0, rdata: RData::Unknown { rtype: TYPE_NSEC3, raw: lo } },
            Record { owner: zone.apex_name.clone(), rtype: TYPE_NSEC3, class: CLASS_IN, ttl: 0, rdata: RData::Unknown { rtype: TYPE_NSEC3, raw: hi } },
        ],
        Some((lo, _)) => vec![Record {
            owner: zone.apex_name.clone(),
            rtype: TYPE_NSEC3,
            class: CLASS_IN,
            ttl: 0,
            rdata: RData::Unknown { rtype: TYPE_NSEC3, raw: lo },
        }],
        None => Vec::new(),
    }
}

/// A synthetic NSEC3-shaped record proving `owner_wire` exists but has
/// no data for the queried type (NODATA).
fn denial_exact(zone: &Zone, owner_wire: &[u8]) -> Vec<Record> {
    let Some(store) = &zone.denial else { return Vec::new() };
    if !store.contains(owner_wire) {
        return Vec::new();
    }
    vec![Record {
        owner: zone.apex_name.clone(),
        rtype: TYPE_NSEC3,
        class: CLASS_IN,
        ttl: 0,
        rdata: RData::Unknown { rtype: TYPE_NSEC3, raw: store.hash_of(owner_wire) },
    }]
}

/// If `closest` carries a DNAME rrset and `qname` is a proper
/// descendant of it, synthesize the CNAME mapping DNAME produces: the
/// DNAME record itself plus a literal CNAME from `qname` to the
/// substituted target. Returns `None` when no DNAME applies.
fn dname_synthesis(db: &Namedb, zone: &Zone, closest: NodeId, qname: &Name) -> Option<(Name, Vec<Record>)> {
    let node = db.node(closest);
    let dname_rr = node.rrset(zone.id, TYPE_DNAME, CLASS_IN)?;
    let rr = dname_rr.records.first()?;
    let target = match &rr.rdata {
        RData::Dname(t) => db.name_of(*t).clone(),
        _ => return None,
    };
    let mut out = records_for_rrset(zone, node, TYPE_DNAME, CLASS_IN);
    let synthesized = qname.substitute_suffix(&node.name, &target);
    out.push(Record { owner: qname.clone(), rtype: TYPE_CNAME, class: CLASS_IN, ttl: dname_rr.ttl, rdata: RData::CnameLiteral(synthesized.clone()) });
    Some((synthesized, out))
}

/// Classify a single question already known to fall inside `zone`.
/// `qname` is resolved via [`Namedb::find_closest`]; callers must not
/// have created nodes to perform that lookup (a read-only search).
/// `dnssec_ok` gates whether negative answers are decorated with
/// synthesized denial-of-existence records. `max_chase_depth` bounds
/// CNAME chasing, overridable per deployment via configuration.
pub fn classify(
    db: &Namedb,
    zone: &Zone,
    qname: &Name,
    qtype: RrType,
    qclass: RrClass,
    dnssec_ok: bool,
    max_chase_depth: usize,
) -> Classified {
    use crate::db::Encloser;

    match db.find_closest(qname) {
        Encloser::Exact(id) => {
            // find_delegation never returns the apex itself, so any hit
            // here is a genuine cut strictly below it.
            if let Some(cut) = find_delegation(db, zone, id) {
                let authority = referral_records(db, zone, cut);
                let additional = glue_for_ns(db, zone, &authority);
                return Classified { disposition: Disposition::Referral, aa: false, answers: Vec::new(), authority, additional };
            }
            if qtype == TYPE_ANY {
                let answers = records_for_any(zone, db.node(id), qclass);
                return if answers.is_empty() {
                    let mut authority = soa_for_negative(db, zone);
                    if dnssec_ok {
                        authority.extend(denial_exact(zone, qname.wire_bytes()));
                    }
                    Classified { disposition: Disposition::NoData, aa: true, answers: Vec::new(), authority, additional: Vec::new() }
                } else {
                    Classified { disposition: Disposition::Positive, aa: true, answers, authority: Vec::new(), additional: Vec::new() }
                };
            }
            if qtype != TYPE_CNAME {
                if let Some(cname_rr) = db.node(id).rrset(zone.id, TYPE_CNAME, qclass) {
                    let mut answers = records_for_rrset(zone, db.node(id), TYPE_CNAME, qclass);
                    if let Some(rr) = cname_rr.records.first() {
                        if let RData::Cname(target) = &rr.rdata {
                            answers.extend(chase_cname(db, zone, *target, qtype, qclass, max_chase_depth));
                        }
                    }
                    return Classified {
                        disposition: Disposition::Positive,
                        aa: true,
                        answers,
                        authority: Vec::new(),
                        additional: Vec::new(),
                    };
                }
            }
            let answers = records_for_rrset(zone, db.node(id), qtype, qclass);
            if answers.is_empty() {
                let mut authority = soa_for_negative(db, zone);
                if dnssec_ok {
                    authority.extend(denial_exact(zone, qname.wire_bytes()));
                }
                Classified { disposition: Disposition::NoData, aa: true, answers: Vec::new(), authority, additional: Vec::new() }
            } else {
                Classified { disposition: Disposition::Positive, aa: true, answers, authority: Vec::new(), additional: Vec::new() }
            }
        }
        Encloser::Closest { closest, matched_labels: _ } => {
            if let Some(cut) = find_delegation(db, zone, closest) {
                let authority = referral_records(db, zone, cut);
                let additional = glue_for_ns(db, zone, &authority);
                return Classified { disposition: Disposition::Referral, aa: false, answers: Vec::new(), authority, additional };
            }

            if qtype != TYPE_DNAME {
                if let Some((synthesized, mut answers)) = dname_synthesis(db, zone, closest, qname) {
                    if qtype != TYPE_CNAME {
                        match db.find_closest(&synthesized) {
                            Encloser::Exact(target_id) => {
                                answers.extend(records_for_rrset(zone, db.node(target_id), qtype, qclass));
                            }
                            Encloser::Closest { .. } => {}
                        }
                    }
                    return Classified { disposition: Disposition::Positive, aa: true, answers, authority: Vec::new(), additional: Vec::new() };
                }
            }

            match db.wildcard_under(closest) {
                Some(wc) => {
                    let wc_node = db.node(wc);
                    let answers = if qtype == TYPE_ANY {
                        records_for_any(zone, wc_node, qclass)
                            .into_iter()
                            .map(|mut r| {
                                r.owner = qname.clone();
                                r
                            })
                            .collect::<Vec<_>>()
                    } else {
                        records_for_rrset(zone, wc_node, qtype, qclass)
                            .into_iter()
                            .map(|mut r| {
                                r.owner = qname.clone();
                                r
                            })
                            .collect::<Vec<_>>()
                    };
                    if answers.is_empty() {
                        let mut authority = soa_for_negative(db, zone);
                        if dnssec_ok {
                            authority.extend(denial_covering(zone, qname.wire_bytes()));
                        }
                        Classified { disposition: Disposition::NoData, aa: true, answers: Vec::new(), authority, additional: Vec::new() }
                    } else {
                        Classified {
                            disposition: Disposition::Positive,
                            aa: true,
                            answers,
                            authority: Vec::new(),
                            additional: Vec::new(),
                        }
                    }
                }
                None => {
                    let mut authority = soa_for_negative(db, zone);
                    if dnssec_ok {
                        authority.extend(denial_covering(zone, qname.wire_bytes()));
                    }
                    Classified { disposition: Disposition::NameError, aa: true, answers: Vec::new(), authority, additional: Vec::new() }
                }
            }
        }
    }
}

/// Follow a CNAME chain up to `max_depth` hops, each hop requiring a
/// fresh closest-encloser lookup since the target may sit anywhere in
/// the db.
fn chase_cname(db: &Namedb, zone: &Zone, mut target: NodeId, qtype: RrType, qclass: RrClass, max_depth: usize) -> Vec<Record> {
    use crate::db::Encloser;
    let mut out = Vec::new();
    for _ in 0..max_depth {
        if !db.node(target).name.is_subdomain_of(&zone.apex_name) {
            break;
        }
        let direct = records_for_rrset(zone, db.node(target), qtype, qclass);
        if !direct.is_empty() {
            out.extend(direct);
            break;
        }
        let next_cname = db.node(target).rrset(zone.id, TYPE_CNAME, qclass).and_then(|rrset| {
            rrset.records.first().and_then(|rr| match &rr.rdata {
                RData::Cname(t) => Some(*t),
                _ => None,
            })
        });
        out.extend(records_for_rrset(zone, db.node(target), TYPE_CNAME, qclass));
        match next_cname {
            Some(next) => target = next,
            None => break,
        }
        match db.find_closest(&db.node(target).name.clone()) {
            Encloser::Exact(_) => {}
            Encloser::Closest { .. } => break,
        }
    }
    out
}
