/*!
EDNS0, carried as a pseudo resource record in the additional section
(RFC 6891). The extended flags are packed into the OPT record's
class/TTL fields on the wire but exposed here as a plain struct up
front, decoded once rather than re-derived on every accessor call.
*/

use crate::db::types::RrClass;
use crate::wire::{WireError, WireReader, WireWriter};

const DO_BIT: u32 = 0x8000;

#[derive(Debug, Clone, Copy)]
pub struct Edns {
    pub udp_payload_size: u16,
    pub extended_rcode: u8,
    pub version: u8,
    pub dnssec_ok: bool,
}

impl Edns {
    pub fn new(udp_payload_size: u16) -> Self {
        Edns { udp_payload_size, extended_rcode: 0, version: 0, dnssec_ok: false }
    }

    /// Decode from an already-parsed OPT record: `class` carries the
    /// requestor's UDP payload size, `ttl` packs rcode/version/flags.
    pub fn from_opt_fields(class: RrClass, ttl: u32) -> Self {
        let bytes = ttl.to_be_bytes();
        Edns {
            udp_payload_size: class,
            extended_rcode: bytes[0],
            version: bytes[1],
            dnssec_ok: (ttl & DO_BIT) != 0,
        }
    }

    /// The (class, ttl) pair an OPT record should carry for this EDNS
    /// state, given the low 4 rcode bits already placed in the header.
    pub fn to_opt_fields(&self) -> (RrClass, u32) {
        let mut ttl = u32::from_be_bytes([self.extended_rcode, self.version, 0, 0]);
        if self.dnssec_ok {
            ttl |= DO_BIT;
        }
        (self.udp_payload_size, ttl)
    }

    /// Encode as a bare OPT record: owner `.`, type 41, the packed
    /// class/ttl, and an empty rdata (no options supported).
    pub fn encode(&self, w: &mut WireWriter) -> Result<(), WireError> {
        w.write_u8(0)?; // root owner name
        w.write_u16(crate::db::types::TYPE_OPT)?;
        let (class, ttl) = self.to_opt_fields();
        w.write_u16(class)?;
        w.write_u32(ttl)?;
        w.write_u16(0) // RDLENGTH, no options
    }

    pub fn decode(reader: &mut WireReader) -> Result<Self, WireError> {
        let owner_len = reader.read_u8()?;
        if owner_len != 0 {
            return Err(WireError::Truncated);
        }
        let rtype = reader.read_u16()?;
        let class = reader.read_u16()?;
        let ttl = reader.read_u32()?;
        let rdlen = reader.read_u16()? as usize;
        reader.read_bytes(rdlen)?;
        if rtype != crate::db::types::TYPE_OPT {
            return Err(WireError::Truncated);
        }
        Ok(Edns::from_opt_fields(class, ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_opt_fields() {
        let edns = Edns { udp_payload_size: 4096, extended_rcode: 0, version: 0, dnssec_ok: true };
        let (class, ttl) = edns.to_opt_fields();
        let back = Edns::from_opt_fields(class, ttl);
        assert_eq!(back.udp_payload_size, 4096);
        assert!(back.dnssec_ok);
    }

    #[test]
    fn wire_round_trip() {
        let mut buf = [0u8; 16];
        let mut w = WireWriter::new(&mut buf);
        let edns = Edns::new(1232);
        edns.encode(&mut w).unwrap();
        let len = w.pos();
        let mut r = WireReader::new(&buf[..len]);
        let decoded = Edns::decode(&mut r).unwrap();
        assert_eq!(decoded.udp_payload_size, 1232);
        assert!(!decoded.dnssec_ok);
    }
}
