/*!
Name compression on encode: remember where a name (or one of its
suffixes) was already written so a later occurrence can reference it
with a pointer, keyed by the suffix's wire bytes, and capped at the
14-bit pointer range per RFC 1035 §4.1.4.
*/

use crate::name::Name;
use crate::wire::{WireError, WireWriter};
use std::collections::HashMap;

const MAX_POINTER_OFFSET: usize = 0x3FFF;
const POINTER_TAG: u8 = 0xC0;

pub struct CompressionTable {
    offsets: HashMap<Vec<u8>, u16>,
}

impl CompressionTable {
    pub fn new() -> Self {
        CompressionTable { offsets: HashMap::new() }
    }

    /// Write `name` into `w`, compressing against any previously
    /// written name sharing a suffix when `compressible` is true.
    /// Every newly written label position within range is recorded
    /// for later names to reference.
    pub fn write_name(&mut self, w: &mut WireWriter, name: &Name, compressible: bool) -> Result<(), WireError> {
        let start = w.pos();

        // Search from the leaf inward (longest suffix first) so the
        // match found, if any, gives the best compression.
        let mut matched_at: Option<(usize, u16)> = None;
        if compressible {
            for index in (0..name.label_count()).rev() {
                if let Some(&offset) = self.offsets.get(name.wire_suffix(index)) {
                    matched_at = Some((index, offset));
                    break;
                }
            }
        }

        match matched_at {
            Some((index, offset)) => {
                let split = self.split_offset(name, index);
                w.write_bytes(&name.wire_bytes()[..split])?;
                self.record_new_suffixes(name, index, start);
                w.write_u8(POINTER_TAG | ((offset >> 8) as u8 & 0x3F))?;
                w.write_u8((offset & 0xFF) as u8)
            }
            None => {
                w.write_bytes(name.wire_bytes())?;
                self.record_new_suffixes(name, 0, start);
                Ok(())
            }
        }
    }

    fn split_offset(&self, name: &Name, index: usize) -> usize {
        name.label_offset(index)
    }

    /// Record the message offset of every label more leafward than
    /// `covered_index` (whose suffix was either matched already, for
    /// `covered_index > 0`, or is the bare root, for `covered_index ==
    /// 0`), for a name written starting at message offset `start`. The
    /// root label itself is never registered: a pointer to it never
    /// beats writing the single zero byte directly.
    fn record_new_suffixes(&mut self, name: &Name, covered_index: usize, start: usize) {
        for index in (covered_index + 1)..name.label_count() {
            let suffix = name.wire_suffix(index);
            let message_offset = start + self.split_offset(name, index);
            if message_offset > MAX_POINTER_OFFSET {
                continue;
            }
            self.offsets.entry(suffix.to_vec()).or_insert(message_offset as u16);
        }
    }
}

impl Default for CompressionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_occurrence_compresses() {
        let mut buf = [0u8; 64];
        let mut w = WireWriter::new(&mut buf);
        let mut table = CompressionTable::new();
        let a = Name::from_text("www.example.com").unwrap();
        let b = Name::from_text("mail.example.com").unwrap();
        table.write_name(&mut w, &a, true).unwrap();
        let first_len = w.pos();
        table.write_name(&mut w, &b, true).unwrap();
        let second_len = w.pos() - first_len;
        // "mail" (5 bytes) + pointer (2 bytes), much shorter than a
        // fully spelled out "mail.example.com." (18 bytes).
        assert_eq!(second_len, 7);
    }

    #[test]
    fn non_compressible_never_emits_pointer() {
        let mut buf = [0u8; 64];
        let mut w = WireWriter::new(&mut buf);
        let mut table = CompressionTable::new();
        let a = Name::from_text("www.example.com").unwrap();
        table.write_name(&mut w, &a, true).unwrap();
        let before = w.pos();
        table.write_name(&mut w, &a, false).unwrap();
        assert_eq!(w.pos() - before, a.wire_bytes().len());
    }
}
