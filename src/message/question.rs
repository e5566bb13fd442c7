//! The question section entry.

use super::compress::CompressionTable;
use crate::db::types::{RrClass, RrType};
use crate::name::Name;
use crate::wire::{WireError, WireReader, WireWriter};

#[derive(Debug, Clone)]
pub struct Question {
    pub qname: Name,
    pub qtype: RrType,
    pub qclass: RrClass,
}

impl Question {
    pub fn decode(reader: &mut WireReader) -> Result<Self, WireError> {
        let qname = Name::from_wire(reader).map_err(|_| WireError::Truncated)?;
        let qtype = reader.read_u16()?;
        let qclass = reader.read_u16()?;
        Ok(Question { qname, qtype, qclass })
    }

    pub fn encode(&self, w: &mut WireWriter, compress: &mut CompressionTable) -> Result<(), WireError> {
        compress.write_name(w, &self.qname, true)?;
        w.write_u16(self.qtype)?;
        w.write_u16(self.qclass)
    }
}
