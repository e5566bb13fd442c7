//! Shared scalar types for the namedb, lifted out of `rr.rs`/`node.rs`
//! so the type table below has one home.

pub type NodeId = usize;
pub type ZoneId = usize;
pub type RrType = u16;
pub type RrClass = u16;

pub const CLASS_IN: RrClass = 1;

pub const TYPE_A: RrType = 1;
pub const TYPE_NS: RrType = 2;
pub const TYPE_CNAME: RrType = 5;
pub const TYPE_SOA: RrType = 6;
pub const TYPE_PTR: RrType = 12;
pub const TYPE_HINFO: RrType = 13;
pub const TYPE_MX: RrType = 15;
pub const TYPE_TXT: RrType = 16;
pub const TYPE_AAAA: RrType = 28;
pub const TYPE_DNAME: RrType = 39;
pub const TYPE_OPT: RrType = 41;
pub const TYPE_DS: RrType = 43;
pub const TYPE_RRSIG: RrType = 46;
pub const TYPE_NSEC: RrType = 47;
pub const TYPE_DNSKEY: RrType = 48;
pub const TYPE_NSEC3: RrType = 50;
pub const TYPE_NSEC3PARAM: RrType = 51;
pub const TYPE_TSIG: RrType = 250;
pub const TYPE_AXFR: RrType = 252;
pub const TYPE_ANY: RrType = 255;

pub const ROOT: NodeId = 0;

pub const RCODE_NOERROR: u8 = 0;
pub const RCODE_FORMERR: u8 = 1;
pub const RCODE_SERVFAIL: u8 = 2;
pub const RCODE_NXDOMAIN: u8 = 3;
pub const RCODE_NOTIMP: u8 = 4;
pub const RCODE_REFUSED: u8 = 5;
pub const RCODE_NOTAUTH: u8 = 9;

/// Carried in the OPT extended-rcode byte, not the header's 4-bit
/// field: the low nibble a `BADVERS` response sets in the header is
/// always 0.
pub const RCODE_BADVERS: u8 = 16;

pub const OPCODE_QUERY: u8 = 0;

/// Default bound on CNAME/DNAME chasing within one answer, guarding
/// against a cyclic or very long alias chain. `Config` may override
/// this per deployment.
pub const MAX_CHASE_DEPTH: usize = 10;

/// The SOA MINIMUM, used to clamp negative-answer TTLs. Not a protocol
/// constant, just the field name.
pub fn soa_minimum(soa: &super::rdata::SoaData) -> u32 {
    soa.minimum
}
