//! End-to-end coverage: build a zone, drive a wire-format query through
//! `answer_query`, and inspect the decoded response.

use authdns::answer_query;
use authdns::auth::{AuthKey, MessageAuthenticator};
use authdns::db::rdata::RData;
use authdns::db::types::*;
use authdns::db::Namedb;
use authdns::message::compress::CompressionTable;
use authdns::message::{Edns, Header, Message, Question, Record};
use authdns::name::Name;
use authdns::wire::WireWriter;
use authdns::zonefile::load_zone;
use std::io::Write;

fn no_keys() -> MessageAuthenticator {
    MessageAuthenticator::new(vec![])
}

/// The zone used by every scenario below:
/// `example.` has an SOA, an NS at the apex, a regular A record, a
/// wildcard under `w.example.`, a CNAME alias, and a delegation to an
/// out-of-bailiwick nameserver at `sub.example.`.
fn scenario_db() -> Namedb {
    let mut file = std::env::temp_dir();
    file.push(format!("authdns-scenario-{:?}.zone", std::thread::current().id()));
    let mut f = std::fs::File::create(&file).unwrap();
    writeln!(f, "example. SOA 3600 ns.example. hostmaster.example. 1 3600 900 604800 300").unwrap();
    writeln!(f, "example. NS 3600 ns.example.").unwrap();
    writeln!(f, "ns.example. A 3600 192.0.2.1").unwrap();
    writeln!(f, "www.example. A 3600 192.0.2.2").unwrap();
    writeln!(f, "*.w.example. A 3600 192.0.2.3").unwrap();
    writeln!(f, "alias.example. CNAME 3600 www.example.").unwrap();
    writeln!(f, "sub.example. NS 3600 a.ns.other.").unwrap();
    writeln!(f, "redir.example. DNAME 3600 example.").unwrap();
    f.flush().unwrap();

    let mut db = Namedb::new();
    load_zone(&mut db, "example", &file).unwrap();
    std::fs::remove_file(&file).ok();
    db
}

fn build_query(db: &mut Namedb, qname: &str, qtype: RrType) -> Vec<u8> {
    build_query_with_edns(db, qname, qtype, None)
}

fn build_query_with_edns(db: &mut Namedb, qname: &str, qtype: RrType, edns: Option<Edns>) -> Vec<u8> {
    let mut header = Header::new();
    header.with_id(0x1234).with_rd(true).with_qdcount(1);
    let question = Question { qname: Name::from_text(qname).unwrap(), qtype, qclass: CLASS_IN };
    let message = Message { header, questions: vec![question], edns, ..Message::default() };
    let mut buf = vec![0u8; 512];
    let encoded = message.encode(db, &mut buf, 512);
    buf.truncate(encoded.len);
    buf
}

fn run_query(db: &mut Namedb, qname: &str, qtype: RrType) -> Message {
    let request = build_query(db, qname, qtype);
    let mut response_buf = vec![0u8; 512];
    let written = answer_query(db, &request, &mut response_buf, 512, &no_keys(), MAX_CHASE_DEPTH);
    response_buf.truncate(written);
    let mut ensure = |n: &Name| db.ensure_node(n);
    Message::decode(&response_buf, &mut ensure).unwrap()
}

#[test]
fn positive_answer_with_glue() {
    let mut db = scenario_db();
    let resp = run_query(&mut db, "www.example", TYPE_A);
    assert_eq!(resp.header.rcode(), RCODE_NOERROR);
    assert!(resp.header.aa());
    assert_eq!(resp.answers.len(), 1);
    assert_eq!(resp.answers[0].owner, Name::from_text("www.example").unwrap());
    assert_eq!(resp.answers[0].rtype, TYPE_A);
}

#[test]
fn cname_is_chased_to_its_target() {
    let mut db = scenario_db();
    let resp = run_query(&mut db, "alias.example", TYPE_A);
    assert_eq!(resp.header.rcode(), RCODE_NOERROR);
    assert!(resp.header.aa());
    assert_eq!(resp.answers.len(), 2);
    assert_eq!(resp.answers[0].rtype, TYPE_CNAME);
    assert_eq!(resp.answers[1].rtype, TYPE_A);
    assert_eq!(resp.answers[1].owner, Name::from_text("www.example").unwrap());
}

#[test]
fn missing_name_is_nxdomain_with_clamped_soa() {
    let mut db = scenario_db();
    let resp = run_query(&mut db, "nope.example", TYPE_A);
    assert_eq!(resp.header.rcode(), RCODE_NXDOMAIN);
    assert!(resp.header.aa());
    assert!(resp.answers.is_empty());
    assert_eq!(resp.authority.len(), 1);
    assert_eq!(resp.authority[0].rtype, TYPE_SOA);
    assert_eq!(resp.authority[0].ttl, 300);
}

#[test]
fn existing_name_wrong_type_is_nodata() {
    let mut db = scenario_db();
    let resp = run_query(&mut db, "www.example", TYPE_AAAA);
    assert_eq!(resp.header.rcode(), RCODE_NOERROR);
    assert!(resp.header.aa());
    assert!(resp.answers.is_empty());
    assert_eq!(resp.authority.len(), 1);
    assert_eq!(resp.authority[0].rtype, TYPE_SOA);
}

#[test]
fn wildcard_is_synthesized_under_the_queried_name() {
    let mut db = scenario_db();
    let resp = run_query(&mut db, "x.w.example", TYPE_A);
    assert_eq!(resp.header.rcode(), RCODE_NOERROR);
    assert!(resp.header.aa());
    assert_eq!(resp.answers.len(), 1);
    assert_eq!(resp.answers[0].owner, Name::from_text("x.w.example").unwrap());
    assert_eq!(resp.answers[0].rtype, TYPE_A);
}

#[test]
fn delegation_clears_aa_and_omits_out_of_zone_glue() {
    let mut db = scenario_db();
    let resp = run_query(&mut db, "host.sub.example", TYPE_A);
    assert_eq!(resp.header.rcode(), RCODE_NOERROR);
    assert!(!resp.header.aa());
    assert!(resp.answers.is_empty());
    assert_eq!(resp.authority.len(), 1);
    assert_eq!(resp.authority[0].rtype, TYPE_NS);
    assert_eq!(resp.authority[0].owner, Name::from_text("sub.example").unwrap());
    assert!(resp.additional.is_empty(), "a.ns.other. is out of bailiwick, no glue to add");
}

#[test]
fn unsupported_opcode_is_notimp() {
    let mut db = scenario_db();
    let mut header = Header::new();
    header.with_id(1).with_opcode(4).with_qdcount(1);
    let question = Question { qname: Name::from_text("example").unwrap(), qtype: TYPE_A, qclass: CLASS_IN };
    let mut compress = CompressionTable::new();
    let mut buf = vec![0u8; 64];
    let mut w = authdns::wire::WireWriter::new(&mut buf);
    w.write_bytes(&header.bytes()).unwrap();
    question.encode(&mut w, &mut compress).unwrap();
    let len = w.into_len();

    let mut response_buf = vec![0u8; 64];
    let written = answer_query(&mut db, &buf[..len], &mut response_buf, 64, &no_keys(), MAX_CHASE_DEPTH);
    assert_eq!(written, 12);
    let resp_header = Header::from_bytes(response_buf[..12].try_into().unwrap());
    assert_eq!(resp_header.rcode(), RCODE_NOTIMP);
}

#[test]
fn any_qtype_returns_every_rrset_at_the_owner() {
    let mut db = scenario_db();
    let resp = run_query(&mut db, "example", TYPE_ANY);
    assert_eq!(resp.header.rcode(), RCODE_NOERROR);
    assert!(resp.header.aa());
    let types: std::collections::HashSet<_> = resp.answers.iter().map(|r| r.rtype).collect();
    assert!(types.contains(&TYPE_SOA));
    assert!(types.contains(&TYPE_NS));
}

#[test]
fn dname_synthesizes_a_cname_to_the_substituted_target() {
    let mut db = scenario_db();
    let resp = run_query(&mut db, "www.redir.example", TYPE_A);
    assert_eq!(resp.header.rcode(), RCODE_NOERROR);
    assert!(resp.header.aa());
    assert_eq!(resp.answers[0].rtype, TYPE_DNAME);
    assert_eq!(resp.answers[1].rtype, TYPE_CNAME);
    assert_eq!(resp.answers[1].owner, Name::from_text("www.redir.example").unwrap());
    assert_eq!(resp.answers.last().unwrap().rtype, TYPE_A);
}

#[test]
fn unsupported_edns_version_is_badvers() {
    let mut db = scenario_db();
    let edns = Edns { udp_payload_size: 4096, extended_rcode: 0, version: 1, dnssec_ok: false };
    let request = build_query_with_edns(&mut db, "www.example", TYPE_A, Some(edns));
    let mut response_buf = vec![0u8; 512];
    let written = answer_query(&mut db, &request, &mut response_buf, 512, &no_keys(), MAX_CHASE_DEPTH);
    response_buf.truncate(written);
    let mut ensure = |n: &Name| db.ensure_node(n);
    let resp = Message::decode(&response_buf, &mut ensure).unwrap();
    assert_eq!(resp.header.rcode(), RCODE_NOERROR);
    let edns = resp.edns.expect("OPT record present");
    assert_eq!(edns.extended_rcode, (RCODE_BADVERS >> 4) as u8);
}

/// Builds a signed request the same way `query::encode_signed` builds a
/// signed response: encode everything but the authentication record,
/// bump ARCOUNT to account for the record about to be appended, sign
/// that prefix, then hand-append the record.
#[test]
fn authenticated_query_gets_a_signed_response() {
    let mut db = scenario_db();
    let authenticator = MessageAuthenticator::new(vec![AuthKey::new("key.example", b"shared-secret-bytes".to_vec())]);

    let mut header = Header::new();
    header.with_id(0x1234).with_rd(true).with_qdcount(1);
    let question = Question { qname: Name::from_text("www.example").unwrap(), qtype: TYPE_A, qclass: CLASS_IN };
    let unsigned = Message { header, questions: vec![question], ..Message::default() };
    let mut buf = vec![0u8; 512];
    let prefix_len = unsigned.encode(&db, &mut buf, 512).len;

    let arcount = u16::from_be_bytes([buf[10], buf[11]]) + 1;
    buf[10..12].copy_from_slice(&arcount.to_be_bytes());
    let mac = authenticator.sign("key.example", &buf[..prefix_len]).unwrap();

    let record = Record {
        owner: Name::from_text("key.example").unwrap(),
        rtype: TYPE_TSIG,
        class: CLASS_IN,
        ttl: 0,
        rdata: RData::Unknown { rtype: TYPE_TSIG, raw: mac },
    };
    let mut compress = CompressionTable::new();
    let full_len = {
        let mut w = WireWriter::new(&mut buf[prefix_len..]);
        record.encode(&db, &mut w, &mut compress).unwrap();
        prefix_len + w.into_len()
    };

    let mut response_buf = vec![0u8; 512];
    let written = answer_query(&mut db, &buf[..full_len], &mut response_buf, 512, &authenticator, MAX_CHASE_DEPTH);
    response_buf.truncate(written);
    let mut ensure = |n: &Name| db.ensure_node(n);
    let resp = Message::decode(&response_buf, &mut ensure).unwrap();
    assert_eq!(resp.header.rcode(), RCODE_NOERROR);
    assert_eq!(resp.additional.last().unwrap().rtype, TYPE_TSIG);
}
