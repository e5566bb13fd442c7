/*!
Typed rdata: each record type has a fixed shape — field names,
widths, whether a field is a reference, whether the name is
compressible on the wire, and a per-field length-calculation hook for
variable types.

Rather than a runtime descriptor table, this follows one Rust type per
RR type plus a dispatching enum, which gives the same behaviour
(decode, encode, and the reference/compressible-name distinction per
field) through the type system instead of data. Name-bearing fields
that may be compressed on the wire (NS, CNAME, SOA's MNAME/RNAME, MX,
PTR, DNAME) hold a [`NodeId`]: a non-owning handle into the namedb's
node arena, never an owning reference. Types this implementation has
no specific handler for fall back to `Unknown`, a single opaque
binary field.
*/

use super::types::*;
use super::Namedb;
use crate::message::compress::CompressionTable;
use crate::name::Name;
use crate::wire::{WireError, WireReader, WireWriter};
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq)]
pub struct SoaData {
    pub mname: NodeId,
    pub rname: NodeId,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MxData {
    pub preference: u16,
    pub exchange: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RrsigData {
    pub type_covered: RrType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: NodeId,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DnskeyData {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Nsec3ParamData {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
}

/// One RR's typed payload; see the module doc for why this is a Rust
/// enum rather than a runtime descriptor table.
#[derive(Debug, Clone, PartialEq)]
pub enum RData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ns(NodeId),
    Cname(NodeId),
    /// A CNAME target that may not exist as a namedb node — the
    /// synthesized mapping a DNAME produces at query time, where the
    /// decode path must stay read-only. Carries the owned name
    /// directly rather than a [`NodeId`].
    CnameLiteral(Name),
    Dname(NodeId),
    Ptr(NodeId),
    Soa(SoaData),
    Mx(MxData),
    Txt(Vec<Vec<u8>>),
    Hinfo { cpu: Vec<u8>, os: Vec<u8> },
    Rrsig(RrsigData),
    Dnskey(DnskeyData),
    Nsec3Param(Nsec3ParamData),
    /// Generic fallback for any type without a dedicated handler.
    Unknown { rtype: RrType, raw: Vec<u8> },
}

impl RData {
    pub fn rtype(&self) -> RrType {
        match self {
            RData::A(_) => TYPE_A,
            RData::Aaaa(_) => TYPE_AAAA,
            RData::Ns(_) => TYPE_NS,
            RData::Cname(_) => TYPE_CNAME,
            RData::CnameLiteral(_) => TYPE_CNAME,
            RData::Dname(_) => TYPE_DNAME,
            RData::Ptr(_) => TYPE_PTR,
            RData::Soa(_) => TYPE_SOA,
            RData::Mx(_) => TYPE_MX,
            RData::Txt(_) => TYPE_TXT,
            RData::Hinfo { .. } => TYPE_HINFO,
            RData::Rrsig(_) => TYPE_RRSIG,
            RData::Dnskey(_) => TYPE_DNSKEY,
            RData::Nsec3Param(_) => TYPE_NSEC3PARAM,
            RData::Unknown { rtype, .. } => *rtype,
        }
    }

    /// All [`NodeId`] references this rdata holds, for usage-counter
    /// bookkeeping on insert/delete.
    pub fn node_refs(&self) -> Vec<NodeId> {
        match self {
            RData::Ns(n) | RData::Cname(n) | RData::Dname(n) | RData::Ptr(n) => vec![*n],
            RData::Soa(soa) => vec![soa.mname, soa.rname],
            RData::Mx(mx) => vec![mx.exchange],
            RData::Rrsig(sig) => vec![sig.signer_name],
            _ => vec![],
        }
    }

    /// Decode rdata of `rtype` starting at `reader`'s current
    /// position, which must be the first rdata octet; `rdlen` bounds
    /// it. `ensure_node` resolves an embedded name to a [`NodeId`],
    /// creating empty non-terminals as needed.
    pub fn decode(
        rtype: RrType,
        reader: &mut WireReader,
        rdlen: usize,
        ensure_node: &mut impl FnMut(&Name) -> NodeId,
    ) -> Result<Self, WireError> {
        let start = reader.pos();
        let end = start + rdlen;
        let rdata = match rtype {
            TYPE_A => {
                let b = reader.read_bytes(4)?;
                RData::A(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
            }
            TYPE_AAAA => {
                let b = reader.read_bytes(16)?;
                let mut octets = [0u8; 16];
                octets.copy_from_slice(b);
                RData::Aaaa(Ipv6Addr::from(octets))
            }
            TYPE_NS => RData::Ns(ensure_node(&decode_name(reader)?)),
            TYPE_CNAME => RData::Cname(ensure_node(&decode_name(reader)?)),
            TYPE_DNAME => RData::Dname(ensure_node(&decode_name(reader)?)),
            TYPE_PTR => RData::Ptr(ensure_node(&decode_name(reader)?)),
            TYPE_SOA => {
                let mname = ensure_node(&decode_name(reader)?);
                let rname = ensure_node(&decode_name(reader)?);
                RData::Soa(SoaData {
                    mname,
                    rname,
                    serial: reader.read_u32()?,
                    refresh: reader.read_u32()?,
                    retry: reader.read_u32()?,
                    expire: reader.read_u32()?,
                    minimum: reader.read_u32()?,
                })
            }
            TYPE_MX => {
                let preference = reader.read_u16()?;
                let exchange = ensure_node(&decode_name(reader)?);
                RData::Mx(MxData { preference, exchange })
            }
            TYPE_TXT => {
                let mut strings = Vec::new();
                while reader.pos() < end {
                    let len = reader.read_u8()? as usize;
                    strings.push(reader.read_bytes(len)?.to_vec());
                }
                RData::Txt(strings)
            }
            TYPE_HINFO => {
                let cpu_len = reader.read_u8()? as usize;
                let cpu = reader.read_bytes(cpu_len)?.to_vec();
                let os_len = reader.read_u8()? as usize;
                let os = reader.read_bytes(os_len)?.to_vec();
                RData::Hinfo { cpu, os }
            }
            TYPE_RRSIG => {
                let type_covered = reader.read_u16()?;
                let algorithm = reader.read_u8()?;
                let labels = reader.read_u8()?;
                let original_ttl = reader.read_u32()?;
                let expiration = reader.read_u32()?;
                let inception = reader.read_u32()?;
                let key_tag = reader.read_u16()?;
                let signer_name = ensure_node(&decode_name(reader)?);
                let sig_len = end - reader.pos();
                let signature = reader.read_bytes(sig_len)?.to_vec();
                RData::Rrsig(RrsigData {
                    type_covered,
                    algorithm,
                    labels,
                    original_ttl,
                    expiration,
                    inception,
                    key_tag,
                    signer_name,
                    signature,
                })
            }
            TYPE_DNSKEY => {
                let flags = reader.read_u16()?;
                let protocol = reader.read_u8()?;
                let algorithm = reader.read_u8()?;
                let key_len = end - reader.pos();
                let public_key = reader.read_bytes(key_len)?.to_vec();
                RData::Dnskey(DnskeyData { flags, protocol, algorithm, public_key })
            }
            TYPE_NSEC3PARAM => {
                let hash_algorithm = reader.read_u8()?;
                let flags = reader.read_u8()?;
                let iterations = reader.read_u16()?;
                let salt_len = reader.read_u8()? as usize;
                let salt = reader.read_bytes(salt_len)?.to_vec();
                RData::Nsec3Param(Nsec3ParamData { hash_algorithm, flags, iterations, salt })
            }
            other => {
                let raw = reader.read_bytes(rdlen)?.to_vec();
                RData::Unknown { rtype: other, raw }
            }
        };
        // Defensive: a handler that mis-parses length would otherwise
        // desync every record after it.
        reader.seek(end)?;
        Ok(rdata)
    }

    /// Encode into `w`. `compressible` controls whether name fields
    /// may reference `compress` — the traditional rule that only
    /// NS/CNAME/SOA/MX/PTR/DNAME owner-name-shaped fields are ever
    /// compressible; literal/uncompressed slots never emit a pointer
    /// even if passed `compressible = true`, since only this function
    /// decides which of its own fields qualify.
    pub fn encode(
        &self,
        db: &Namedb,
        w: &mut WireWriter,
        compress: &mut CompressionTable,
    ) -> Result<(), WireError> {
        match self {
            RData::A(addr) => w.write_bytes(&addr.octets()),
            RData::Aaaa(addr) => w.write_bytes(&addr.octets()),
            RData::Ns(n) | RData::Cname(n) | RData::Dname(n) | RData::Ptr(n) => {
                compress.write_name(w, db.name_of(*n), true)
            }
            RData::CnameLiteral(name) => compress.write_name(w, name, true),
            RData::Soa(soa) => {
                compress.write_name(w, db.name_of(soa.mname), true)?;
                compress.write_name(w, db.name_of(soa.rname), true)?;
                w.write_u32(soa.serial)?;
                w.write_u32(soa.refresh)?;
                w.write_u32(soa.retry)?;
                w.write_u32(soa.expire)?;
                w.write_u32(soa.minimum)
            }
            RData::Mx(mx) => {
                w.write_u16(mx.preference)?;
                compress.write_name(w, db.name_of(mx.exchange), true)
            }
            RData::Txt(strings) => {
                for s in strings {
                    w.write_u8(s.len() as u8)?;
                    w.write_bytes(s)?;
                }
                Ok(())
            }
            RData::Hinfo { cpu, os } => {
                w.write_u8(cpu.len() as u8)?;
                w.write_bytes(cpu)?;
                w.write_u8(os.len() as u8)?;
                w.write_bytes(os)
            }
            RData::Rrsig(sig) => {
                w.write_u16(sig.type_covered)?;
                w.write_u8(sig.algorithm)?;
                w.write_u8(sig.labels)?;
                w.write_u32(sig.original_ttl)?;
                w.write_u32(sig.expiration)?;
                w.write_u32(sig.inception)?;
                w.write_u16(sig.key_tag)?;
                // Signer name is never compressed (RFC 4034 §6.2).
                compress.write_name(w, db.name_of(sig.signer_name), false)?;
                w.write_bytes(&sig.signature)
            }
            RData::Dnskey(key) => {
                w.write_u16(key.flags)?;
                w.write_u8(key.protocol)?;
                w.write_u8(key.algorithm)?;
                w.write_bytes(&key.public_key)
            }
            RData::Nsec3Param(p) => {
                w.write_u8(p.hash_algorithm)?;
                w.write_u8(p.flags)?;
                w.write_u16(p.iterations)?;
                w.write_u8(p.salt.len() as u8)?;
                w.write_bytes(&p.salt)
            }
            RData::Unknown { raw, .. } => w.write_bytes(raw),
        }
    }
}

fn decode_name(reader: &mut WireReader) -> Result<Name, WireError> {
    Name::from_wire(reader).map_err(|_| WireError::Truncated)
}
