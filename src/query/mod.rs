/*!
The query engine: turns a decoded [`Message`] into a response
`Message`, synchronously and without ever suspending — no I/O, no
async, just db lookups.
*/

pub mod classify;

use self::classify::{classify, Disposition};
use crate::auth::MessageAuthenticator;
use crate::db::rdata::RData;
use crate::db::types::*;
use crate::db::Namedb;
use crate::message::{Edns, Header, Message, Question, Record};
use crate::name::Name;
use crate::wire::{WireReader, WireWriter};
use tracing::debug;

/// Parse a wire-format query and produce the wire-format response,
/// writing it into `response_buf` (sized to at least `udp_budget`
/// bytes when the transport is UDP). Returns the number of bytes
/// written. `max_chase_depth` bounds CNAME/DNAME chasing per
/// [`crate::config::Config::chase_depth`].
pub fn answer_query(
    db: &mut Namedb,
    request: &[u8],
    response_buf: &mut [u8],
    udp_budget: usize,
    authenticator: &MessageAuthenticator,
    max_chase_depth: usize,
) -> usize {
    // Query decode must never mutate the db: an attacker-controlled
    // name that doesn't already exist resolves to the root rather than
    // being materialized as an empty non-terminal.
    let mut find_or_root = |name: &Name| db.find_or_root(name);
    let parsed = Message::decode(request, &mut find_or_root);

    let message = match parsed {
        Ok(m) => m,
        Err(_) => {
            let mut header = Header::new();
            header.with_qr(true).with_rcode(RCODE_FORMERR);
            return encode_error(&header, response_buf);
        }
    };

    let mut header = message.header;
    header.with_qr(true);
    header.with_aa(false);
    header.with_ra(false);

    if header.opcode() != OPCODE_QUERY {
        header.with_rcode(RCODE_NOTIMP);
        return encode_error(&header, response_buf);
    }

    // Authenticated-signing passthrough: a trailing record of the
    // reserved authentication type is parsed and verified before the
    // query is answered. On failure the response carries only that
    // record, re-signed, with no answer data.
    let auth_record = find_trailing_auth(request, db);
    if let Some(TrailingAuth { signed_len, key_name, mac }) = &auth_record {
        if authenticator.verify(key_name, &request[..*signed_len], mac).is_err() {
            header.with_rcode(RCODE_NOTAUTH);
            return encode_auth_only(&header, response_buf, authenticator, key_name, db);
        }
    }

    let question = match message.questions.first() {
        Some(q) => q.clone(),
        None => {
            header.with_rcode(RCODE_FORMERR);
            return encode_error(&header, response_buf);
        }
    };

    if question.qclass != CLASS_IN {
        header.with_rcode(RCODE_REFUSED);
        return encode_error(&header, response_buf);
    }

    if let Some(edns) = &message.edns {
        if edns.version != 0 {
            return encode_badvers(&header, response_buf, &question, edns.udp_payload_size, db);
        }
    }
    let dnssec_ok = message.edns.as_ref().map(|e| e.dnssec_ok).unwrap_or(false);

    let zone = match db.find_zone_for(&question.qname) {
        Some(z) if z.is_ok() => z.clone(),
        _ => {
            header.with_rcode(RCODE_REFUSED);
            return encode_error(&header, response_buf);
        }
    };

    let classified = classify(db, &zone, &question.qname, question.qtype, question.qclass, dnssec_ok, max_chase_depth);
    debug!(qname = %question.qname, qtype = question.qtype, disposition = ?classified.disposition, "answered query");

    header.with_aa(classified.aa);
    header.with_rcode(match classified.disposition {
        Disposition::NameError => RCODE_NXDOMAIN,
        _ => RCODE_NOERROR,
    });

    let response = Message {
        header,
        questions: vec![question],
        answers: classified.answers,
        authority: classified.authority,
        additional: classified.additional,
        edns: message.edns.map(|e| Edns { udp_payload_size: e.udp_payload_size, extended_rcode: 0, version: 0, dnssec_ok: e.dnssec_ok }),
    };

    let budget = response.edns.as_ref().map(|e| e.udp_payload_size as usize).unwrap_or(512).min(udp_budget.max(12));
    match &auth_record {
        Some(auth) => encode_signed(&response, db, response_buf, budget.max(12), authenticator, &auth.key_name),
        None => response.encode(db, response_buf, budget.max(12)).len,
    }
}

fn encode_error(header: &Header, buf: &mut [u8]) -> usize {
    buf[..12].copy_from_slice(&header.bytes());
    12
}

/// BADVERS: the header's own rcode nibble stays 0; the unsupported
/// version is reported via the OPT record's extended-rcode byte.
fn encode_badvers(header: &Header, buf: &mut [u8], question: &Question, udp_payload_size: u16, db: &Namedb) -> usize {
    let mut header = *header;
    header.with_rcode(0);
    let response = Message {
        header,
        questions: vec![question.clone()],
        answers: Vec::new(),
        authority: Vec::new(),
        additional: Vec::new(),
        edns: Some(Edns { udp_payload_size, extended_rcode: (RCODE_BADVERS >> 4) as u8, version: 0, dnssec_ok: false }),
    };
    response.encode(db, buf, buf.len()).len
}

/// A failed or rejected signed query gets a bare response carrying the
/// re-signed authentication record and nothing else.
fn encode_auth_only(header: &Header, buf: &mut [u8], authenticator: &MessageAuthenticator, key_name: &str, db: &Namedb) -> usize {
    let body_len = 12;
    buf[..body_len].copy_from_slice(&header.bytes());
    let mac = authenticator.sign(key_name, &buf[..body_len]).unwrap_or_default();
    let total = append_auth_record(buf, body_len, key_name, &mac, db);
    let arcount = if total > body_len { 1u16 } else { 0 };
    let mut header = *header;
    header.with_arcount(arcount);
    buf[..12].copy_from_slice(&header.bytes());
    total
}

/// Encode `response`, then append a freshly-signed authentication
/// record covering the bytes written so far — a two-pass encode, since
/// the record to append is itself a function of the bytes that precede
/// it.
fn encode_signed(response: &Message, db: &Namedb, buf: &mut [u8], budget: usize, authenticator: &MessageAuthenticator, key_name: &str) -> usize {
    let encoded = response.encode(db, buf, budget.saturating_sub(64).max(12));
    let mac = authenticator.sign(key_name, &buf[..encoded.len]).unwrap_or_default();
    let total = append_auth_record(buf, encoded.len, key_name, &mac, db);
    if total > encoded.len {
        let arcount = u16::from_be_bytes([buf[10], buf[11]]) + 1;
        buf[10..12].copy_from_slice(&arcount.to_be_bytes());
    }
    total
}

/// Append one record to `buf` at `offset`: owner `key_name`, the
/// reserved authentication type, and `mac` as raw rdata. Returns the
/// new length, unchanged from `offset` if it didn't fit.
fn append_auth_record(buf: &mut [u8], offset: usize, key_name: &str, mac: &[u8], db: &Namedb) -> usize {
    let Ok(owner) = Name::from_text(key_name) else { return offset };
    let record = Record { owner, rtype: TYPE_TSIG, class: CLASS_IN, ttl: 0, rdata: RData::Unknown { rtype: TYPE_TSIG, raw: mac.to_vec() } };
    let mut compress = crate::message::compress::CompressionTable::new();
    let mut w = WireWriter::new(&mut buf[offset..]);
    match record.encode(db, &mut w, &mut compress) {
        Ok(()) => offset + w.into_len(),
        Err(_) => offset,
    }
}

struct TrailingAuth {
    signed_len: usize,
    key_name: String,
    mac: Vec<u8>,
}

/// Re-walk `buf` purely to find the byte offset where a trailing
/// authentication record begins (if the last additional-section entry
/// is one), since the MAC covers everything before it. Never mutates
/// `db`.
fn find_trailing_auth(buf: &[u8], db: &Namedb) -> Option<TrailingAuth> {
    let mut reader = WireReader::new(buf);
    if buf.len() < 12 {
        return None;
    }
    let mut header_bytes = [0u8; 12];
    header_bytes.copy_from_slice(reader.read_bytes(12).ok()?);
    let header = Header::from_bytes(header_bytes);
    let mut find_or_root = |name: &Name| db.find_or_root(name);

    for _ in 0..header.qdcount() {
        Question::decode(&mut reader).ok()?;
    }
    for _ in 0..header.ancount() {
        Record::decode(&mut reader, &mut find_or_root).ok()?;
    }
    for _ in 0..header.nscount() {
        Record::decode(&mut reader, &mut find_or_root).ok()?;
    }

    let arcount = header.arcount();
    if arcount == 0 {
        return None;
    }
    let mut last_start = None;
    for i in 0..arcount {
        let start = reader.pos();
        if i == 0 && reader.byte_at(start).ok()? == 0 {
            if let Ok(type_bytes) = reader.peek_at(start + 1, 2) {
                if u16::from_be_bytes([type_bytes[0], type_bytes[1]]) == TYPE_OPT {
                    Edns::decode(&mut reader).ok()?;
                    continue;
                }
            }
        }
        last_start = Some(start);
        Record::decode(&mut reader, &mut find_or_root).ok()?;
    }
    let last_start = last_start?;

    let mut tail_reader = WireReader::new(buf);
    tail_reader.seek(last_start).ok()?;
    let record = Record::decode(&mut tail_reader, &mut find_or_root).ok()?;
    if record.rtype != TYPE_TSIG {
        return None;
    }
    let mac = match record.rdata {
        RData::Unknown { raw, .. } => raw,
        _ => return None,
    };
    Some(TrailingAuth { signed_len: last_start, key_name: record.owner.to_text().trim_end_matches('.').to_string(), mac })
}
