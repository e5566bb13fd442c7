/*!
A complete DNS message: header, question, and the three record
sections, plus assembly into a size-budgeted wire buffer.
*/

use super::compress::CompressionTable;
use super::edns::Edns;
use super::header::Header;
use super::question::Question;
use crate::db::rdata::RData;
use crate::db::types::*;
use crate::db::Namedb;
use crate::name::Name;
use crate::wire::{WireError, WireReader, WireWriter};

#[derive(Debug, Clone)]
pub struct Record {
    pub owner: Name,
    pub rtype: RrType,
    pub class: RrClass,
    pub ttl: u32,
    pub rdata: RData,
}

impl Record {
    pub fn decode(reader: &mut WireReader, ensure_node: &mut impl FnMut(&Name) -> NodeId) -> Result<Self, WireError> {
        let owner = Name::from_wire(reader).map_err(|_| WireError::Truncated)?;
        let rtype = reader.read_u16()?;
        let class = reader.read_u16()?;
        let ttl = reader.read_u32()?;
        let rdlen = reader.read_u16()? as usize;
        let rdata = RData::decode(rtype, reader, rdlen, ensure_node)?;
        Ok(Record { owner, rtype, class, ttl, rdata })
    }

    pub fn encode(&self, db: &Namedb, w: &mut WireWriter, compress: &mut CompressionTable) -> Result<(), WireError> {
        compress.write_name(w, &self.owner, true)?;
        w.write_u16(self.rtype)?;
        w.write_u16(self.class)?;
        w.write_u32(self.ttl)?;
        let rdlen_at = w.pos();
        w.write_u16(0)?; // placeholder, patched below
        let rdata_start = w.pos();
        self.rdata.encode(db, w, compress)?;
        let rdlen = w.pos() - rdata_start;
        w.patch_u16(rdlen_at, rdlen as u16);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
    pub authority: Vec<Record>,
    pub additional: Vec<Record>,
    pub edns: Option<Edns>,
}

/// How much of a [`Message`] made it into the encoded buffer.
pub struct Encoded {
    pub len: usize,
    pub truncated: bool,
}

impl Message {
    pub fn decode(buf: &[u8], ensure_node: &mut impl FnMut(&Name) -> NodeId) -> Result<Self, WireError> {
        let mut reader = WireReader::new(buf);
        if buf.len() < 12 {
            return Err(WireError::Truncated);
        }
        let mut header_bytes = [0u8; 12];
        header_bytes.copy_from_slice(reader.read_bytes(12)?);
        let header = Header::from_bytes(header_bytes);

        let mut questions = Vec::with_capacity(header.qdcount() as usize);
        for _ in 0..header.qdcount() {
            questions.push(Question::decode(&mut reader)?);
        }
        let mut answers = Vec::with_capacity(header.ancount() as usize);
        for _ in 0..header.ancount() {
            answers.push(Record::decode(&mut reader, ensure_node)?);
        }
        let mut authority = Vec::with_capacity(header.nscount() as usize);
        for _ in 0..header.nscount() {
            authority.push(Record::decode(&mut reader, ensure_node)?);
        }
        let mut additional = Vec::new();
        let mut edns = None;
        for i in 0..header.arcount() {
            if i == 0 {
                if let Some(candidate) = peek_opt(&reader) {
                    if candidate {
                        edns = Some(Edns::decode(&mut reader)?);
                        continue;
                    }
                }
            }
            additional.push(Record::decode(&mut reader, ensure_node)?);
        }

        Ok(Message { header, questions, answers, authority, additional, edns })
    }

    /// Encode into `buf`, stopping at `budget` bytes. Answer-section
    /// records that do not fit cause truncation (TC set, remaining
    /// sections dropped); authority/additional records that do not fit
    /// are simply omitted without setting TC, matching the common
    /// nameserver convention that only answer-section loss counts as
    /// truncation.
    pub fn encode(&self, db: &Namedb, buf: &mut [u8], budget: usize) -> Encoded {
        let mut w = WireWriter::new(buf);
        w.set_budget(budget);
        let mut compress = CompressionTable::new();
        let mut header = self.header;

        w.write_bytes(&header.bytes()).expect("12-byte header always fits in any real budget");
        header.with_qdcount(self.questions.len() as u16);

        for q in &self.questions {
            q.encode(&mut w, &mut compress).expect("question section must fit, caller sized budget for it");
        }

        let mut truncated = false;
        let an_written = write_section(&mut w, db, &mut compress, &self.answers);
        header.with_ancount(an_written as u16);
        if an_written < self.answers.len() {
            truncated = true;
            header.with_tc(true);
        }

        let (ns_written, ar_written) = if truncated {
            (0, 0)
        } else {
            let ns_written = write_section(&mut w, db, &mut compress, &self.authority);
            let ar_written = if ns_written == self.authority.len() {
                let base = write_section(&mut w, db, &mut compress, &self.additional);
                if let Some(edns) = &self.edns {
                    let mark = w.mark();
                    if edns.encode(&mut w).is_err() {
                        w.reset(mark);
                        base
                    } else {
                        base + 1
                    }
                } else {
                    base
                }
            } else {
                0
            };
            (ns_written, ar_written)
        };
        header.with_nscount(ns_written as u16);
        header.with_arcount(ar_written as u16);

        let len = w.into_len();
        buf[..12].copy_from_slice(&header.bytes());
        Encoded { len, truncated }
    }
}

/// Write as many records as fit, rolling back the writer on the first
/// one that doesn't, and returning how many were committed.
fn write_section(w: &mut WireWriter, db: &Namedb, compress: &mut CompressionTable, records: &[Record]) -> usize {
    let mut count = 0;
    for r in records {
        let mark = w.mark();
        if r.encode(db, w, compress).is_err() {
            w.reset(mark);
            break;
        }
        count += 1;
    }
    count
}

/// Look ahead (without consuming) to see whether the next record in
/// the additional section looks like an OPT pseudo-record, by peeking
/// its type field past a root owner name.
fn peek_opt(reader: &WireReader) -> Option<bool> {
    let pos = reader.pos();
    if reader.byte_at(pos).ok()? != 0 {
        return Some(false);
    }
    let type_bytes = reader.peek_at(pos + 1, 2).ok()?;
    Some(u16::from_be_bytes([type_bytes[0], type_bytes[1]]) == TYPE_OPT)
}
