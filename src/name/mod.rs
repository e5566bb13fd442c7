/*!
The domain name value.

A [`Name`] owns its canonical wire-format encoding plus an array of
per-label byte offsets ordered root-to-leaf, so that "the suffix
starting at label `i` counted from the root" is a `O(1)` slice of the
backing buffer — no label is ever re-walked to answer a subdomain or
closest-encloser question.

Comparisons are ASCII case-insensitive; canonical order compares
labels root-first, matching RFC 4034's left-padding rule: a strict
prefix (fewer labels, otherwise identical) sorts before its extensions.
*/

use crate::wire::{WireError, WireReader};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_LABELS: usize = 128;
const MAX_POINTER_HOPS: usize = 128;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum NameError {
    #[error("name read past end of message")]
    Truncated,
    #[error("malformed domain name")]
    Malformed,
}

impl From<WireError> for NameError {
    fn from(_: WireError) -> Self {
        NameError::Truncated
    }
}

/// A canonical, owned domain name: wire bytes plus root-to-leaf label
/// offsets into those bytes.
#[derive(Clone, Eq)]
pub struct Name {
    wire: Vec<u8>,
    /// Offset (into `wire`) of each label's length byte, root first.
    /// The last entry is always the leaf label; the first is always
    /// the root's zero-length terminator.
    label_offsets: Vec<usize>,
}

impl Name {
    pub fn root() -> Self {
        Name {
            wire: vec![0],
            label_offsets: vec![0],
        }
    }

    /// Parse a name starting at the reader's current position,
    /// following compression pointers. On success the reader is
    /// advanced past the direct encoding (the two bytes
    /// of the first pointer, or the terminating root octet if there
    /// was no pointer) — never past a pointer target.
    pub fn from_wire(reader: &mut WireReader) -> Result<Self, NameError> {
        let data = reader.full_buf();
        let start = reader.pos();
        let mut cur = start;
        let mut advance_to: Option<usize> = None;
        // (content_offset_in_data, len), leaf to root, root excluded.
        let mut labels: Vec<(usize, u8)> = Vec::new();
        let mut visited_pointers: Vec<usize> = Vec::new();
        let mut total_len = 0usize;
        let mut hops = 0usize;

        loop {
            let len_byte = *data.get(cur).ok_or(NameError::Truncated)?;
            if len_byte == 0 {
                if advance_to.is_none() {
                    advance_to = Some(cur + 1);
                }
                total_len += 1;
                break;
            } else if len_byte & 0xC0 == 0xC0 {
                let b2 = *data.get(cur + 1).ok_or(NameError::Truncated)?;
                let ptr = (((len_byte & 0x3F) as usize) << 8) | b2 as usize;
                if advance_to.is_none() {
                    advance_to = Some(cur + 2);
                }
                if ptr >= cur || visited_pointers.contains(&ptr) {
                    return Err(NameError::Malformed);
                }
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(NameError::Malformed);
                }
                visited_pointers.push(ptr);
                cur = ptr;
                continue;
            } else if len_byte & 0xC0 != 0 {
                return Err(NameError::Malformed);
            }

            let len = len_byte as usize;
            debug_assert!(len <= MAX_LABEL_LEN);
            let content_off = cur + 1;
            if content_off + len > data.len() {
                return Err(NameError::Truncated);
            }
            labels.push((content_off, len as u8));
            total_len += len + 1;
            if labels.len() >= MAX_LABELS {
                return Err(NameError::Malformed);
            }
            cur = content_off + len;
        }

        if total_len > MAX_NAME_LEN {
            return Err(NameError::Malformed);
        }

        let mut wire = Vec::with_capacity(total_len);
        let mut spans = Vec::with_capacity(labels.len() + 1);
        for (content_off, len) in &labels {
            spans.push(wire.len());
            wire.push(*len);
            wire.extend_from_slice(&data[*content_off..*content_off + *len as usize]);
        }
        spans.push(wire.len());
        wire.push(0);
        spans.reverse();

        reader.seek(advance_to.unwrap())?;
        Ok(Name {
            wire,
            label_offsets: spans,
        })
    }

    /// Build a name from presentation text (`"www.example.com"` or
    /// `"www.example.com."`); `"."` and `""` both mean the root. Does
    /// not interpret `\DDD` escapes on input — zone data that needs
    /// them should decode before calling this.
    pub fn from_text(text: &str) -> Result<Self, NameError> {
        let trimmed = text.strip_suffix('.').unwrap_or(text);
        if trimmed.is_empty() {
            return Ok(Name::root());
        }
        let mut wire = Vec::new();
        let mut spans_leaf_first = Vec::new();
        for label in trimmed.split('.') {
            let bytes = label.as_bytes();
            if bytes.is_empty() || bytes.len() > MAX_LABEL_LEN {
                return Err(NameError::Malformed);
            }
            spans_leaf_first.push(wire.len());
            wire.push(bytes.len() as u8);
            wire.extend_from_slice(bytes);
        }
        if spans_leaf_first.len() >= MAX_LABELS {
            return Err(NameError::Malformed);
        }
        let root_span = wire.len();
        wire.push(0);
        if wire.len() > MAX_NAME_LEN {
            return Err(NameError::Malformed);
        }
        let mut label_offsets = spans_leaf_first;
        label_offsets.push(root_span);
        label_offsets.reverse();
        Ok(Name { wire, label_offsets })
    }

    /// The canonical, uncompressed wire encoding (including the
    /// trailing root octet). Used verbatim for literal/uncompressed
    /// rdata name slots.
    pub fn wire_bytes(&self) -> &[u8] {
        &self.wire
    }

    pub fn label_count(&self) -> usize {
        self.label_offsets.len()
    }

    pub fn is_root(&self) -> bool {
        self.label_offsets.len() == 1
    }

    /// The label at `index`, counted from the root (`0` is always the
    /// zero-length root label).
    pub fn label_at(&self, index: usize) -> &[u8] {
        let off = self.label_offsets[index];
        let len = self.wire[off] as usize;
        &self.wire[off + 1..off + 1 + len]
    }

    /// The byte offset into [`Name::wire_bytes`] where label `index`
    /// (root-to-leaf) begins.
    pub fn label_offset(&self, index: usize) -> usize {
        self.label_offsets[index]
    }

    /// The wire bytes of the suffix starting at label `index`
    /// (root-to-leaf), through the end of the name. Used by message
    /// compression to find and record suffix matches without
    /// allocating a new [`Name`] for every candidate.
    pub fn wire_suffix(&self, index: usize) -> &[u8] {
        &self.wire[self.label_offsets[index]..]
    }

    /// The ancestor of this name obtained by dropping the
    /// `drop_leaf_labels` labels closest to the leaf, keeping the
    /// root-ward remainder. `drop_leaf_labels == 0` returns a clone of
    /// the whole name; `drop_leaf_labels == label_count() - 1` returns
    /// the root.
    ///
    /// Because the wire encoding is leaf-first and root-to-leaf
    /// offsets therefore decrease monotonically, the kept labels are
    /// always a contiguous tail of `wire` — no copying label-by-label
    /// is needed, just a slice from the right offset.
    pub fn ancestor(&self, drop_leaf_labels: usize) -> Name {
        let keep = self.label_count() - drop_leaf_labels;
        let index = keep - 1;
        let off = self.label_offsets[index];
        Name {
            wire: self.wire[off..].to_vec(),
            label_offsets: self.label_offsets[..keep].iter().map(|o| o - off).collect(),
        }
    }

    /// The immediate parent of this name. Returns `None` for the root.
    pub fn parent(&self) -> Option<Name> {
        if self.is_root() {
            None
        } else {
            Some(self.ancestor(1))
        }
    }

    /// Number of labels shared between `self` and `other`, counted
    /// from the root inward (the longest common suffix by labels).
    pub fn label_match_count(&self, other: &Name) -> usize {
        let n = self.label_count().min(other.label_count());
        let mut matched = 0;
        for i in 0..n {
            if !labels_eq_ci(self.label_at(i), other.label_at(i)) {
                break;
            }
            matched += 1;
        }
        matched
    }

    /// True iff `self` is `other` or a descendant of `other`.
    pub fn is_subdomain_of(&self, other: &Name) -> bool {
        other.label_count() <= self.label_count()
            && self.label_match_count(other) == other.label_count()
    }

    /// The sort key used by the name tree: labels
    /// lowercased and reversed (root first), each terminated by a
    /// separator that compares less than any label content byte, so
    /// that plain `Vec<u8>`/byte-slice comparison reproduces canonical
    /// DNS order including the "prefix sorts before extension" rule.
    pub fn sort_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.wire.len() * 2);
        // Skip index 0 (root): every name shares it, so it carries no
        // ordering information and omitting it keeps keys shorter.
        for i in 1..self.label_count() {
            for &b in self.label_at(i) {
                let lower = b.to_ascii_lowercase();
                if lower == 0 {
                    key.push(0);
                    key.push(1);
                } else {
                    key.push(lower);
                }
            }
            key.push(0);
            key.push(0);
        }
        key
    }

    /// DNAME synthesis: the name obtained by keeping this name's labels
    /// below `owner` and substituting `target` for the `owner` suffix.
    /// `self` must be a subdomain of `owner`. Built the same way
    /// [`Name::from_text`] builds a fresh wire encoding, rather than
    /// slicing `self`'s buffer, since the substituted suffix has a
    /// different length than the one it replaces.
    pub fn substitute_suffix(&self, owner: &Name, target: &Name) -> Name {
        let mut wire = Vec::new();
        let mut spans_leaf_first = Vec::new();
        for i in (owner.label_count()..self.label_count()).rev() {
            let label = self.label_at(i);
            spans_leaf_first.push(wire.len());
            wire.push(label.len() as u8);
            wire.extend_from_slice(label);
        }
        for i in (0..target.label_count()).rev() {
            let label = target.label_at(i);
            spans_leaf_first.push(wire.len());
            wire.push(label.len() as u8);
            wire.extend_from_slice(label);
        }
        let mut label_offsets = spans_leaf_first;
        label_offsets.reverse();
        Name { wire, label_offsets }
    }

    /// Presentation-format text, escaping non-printable bytes and the
    /// characters `\ . ; ( )` and space as `\DDD` decimal triplets.
    /// Always emits the trailing root dot.
    pub fn to_text(&self) -> String {
        if self.is_root() {
            return ".".to_string();
        }
        let mut out = String::new();
        for i in 1..self.label_count() {
            if i > 1 {
                out.push('.');
            }
            for &b in self.label_at(i) {
                match b {
                    b'\\' | b'.' | b';' | b'(' | b')' | b' ' => {
                        out.push('\\');
                        out.push(b as char);
                    }
                    0x21..=0x7E => out.push(b as char),
                    _ => out.push_str(&format!("\\{:03}", b)),
                }
            }
        }
        out.push('.');
        out
    }
}

fn labels_eq_ci(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_ignore_ascii_case(y))
}

fn cmp_label_ci(a: &[u8], b: &[u8]) -> Ordering {
    let n = a.len().min(b.len());
    for i in 0..n {
        let ca = a[i].to_ascii_lowercase();
        let cb = b[i].to_ascii_lowercase();
        if ca != cb {
            return ca.cmp(&cb);
        }
    }
    a.len().cmp(&b.len())
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.label_count() == other.label_count()
            && (0..self.label_count()).all(|i| labels_eq_ci(self.label_at(i), other.label_at(i)))
    }
}

impl std::hash::Hash for Name {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state)
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        let n = self.label_count().min(other.label_count());
        for i in 0..n {
            let c = cmp_label_ci(self.label_at(i), other.label_at(i));
            if c != Ordering::Equal {
                return c;
            }
        }
        self.label_count().cmp(&other.label_count())
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.to_text())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire_name(labels: &[&str]) -> Vec<u8> {
        let mut v = Vec::new();
        for l in labels {
            v.push(l.len() as u8);
            v.extend_from_slice(l.as_bytes());
        }
        v.push(0);
        v
    }

    #[test]
    fn round_trip_simple() {
        let data = wire_name(&["www", "example", "com"]);
        let mut r = WireReader::new(&data);
        let name = Name::from_wire(&mut r).unwrap();
        assert_eq!(name.to_text(), "www.example.com.");
        assert_eq!(r.pos(), data.len());
        assert_eq!(name.wire_bytes(), &data[..]);
    }

    #[test]
    fn compression_pointer_resolves() {
        let mut data = wire_name(&["example", "com"]);
        let base_offset = data.len();
        data.push(3);
        data.extend_from_slice(b"www");
        data.push(0xC0);
        data.push(0x00); // pointer to offset 0
        let mut r = WireReader::new(&data);
        r.seek(base_offset).unwrap();
        let name = Name::from_wire(&mut r).unwrap();
        assert_eq!(name.to_text(), "www.example.com.");
        // cursor advances only past the direct (non-pointer) bytes.
        assert_eq!(r.pos(), base_offset + 4 + 2);
    }

    #[test]
    fn self_pointing_cycle_rejected() {
        let mut data = vec![0u8; 4];
        data[0] = 0xC0;
        data[1] = 0x00;
        let mut r = WireReader::new(&data);
        assert_eq!(Name::from_wire(&mut r), Err(NameError::Malformed));
    }

    #[test]
    fn label_length_boundary() {
        let ok_label = "a".repeat(63);
        let data = wire_name(&[&ok_label]);
        let mut r = WireReader::new(&data);
        assert!(Name::from_wire(&mut r).is_ok());

        let mut bad = vec![64u8];
        bad.extend(vec![b'a'; 64]);
        bad.push(0);
        let mut r2 = WireReader::new(&bad);
        assert_eq!(Name::from_wire(&mut r2), Err(NameError::Malformed));
    }

    #[test]
    fn total_length_boundary() {
        // 3 labels of 63 + 1 label of 61: 4*1 + 63*3+61 = 4+189+61=254, +1 root = 255 (ok)
        let l63 = "a".repeat(63);
        let l61 = "a".repeat(61);
        let data = wire_name(&[&l63, &l63, &l63, &l61]);
        assert_eq!(data.len(), 255);
        let mut r = WireReader::new(&data);
        assert!(Name::from_wire(&mut r).is_ok());

        let l62 = "a".repeat(62);
        let data2 = wire_name(&[&l63, &l63, &l63, &l62]);
        assert_eq!(data2.len(), 256);
        let mut r2 = WireReader::new(&data2);
        assert_eq!(Name::from_wire(&mut r2), Err(NameError::Malformed));
    }

    #[test]
    fn canonical_ordering_prefix_sorts_first() {
        let a = Name::from_text("b.example.com").unwrap();
        let b = Name::from_text("c.b.example.com").unwrap();
        assert!(a < b);
    }

    #[test]
    fn canonical_ordering_case_insensitive() {
        let a = Name::from_text("WWW.example.com").unwrap();
        let b = Name::from_text("www.EXAMPLE.com").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn sort_key_matches_canonical_order() {
        let mut names = vec![
            Name::from_text("example.com").unwrap(),
            Name::from_text("a.example.com").unwrap(),
            Name::from_text("ab.example.com").unwrap(),
            Name::from_text("b.example.com").unwrap(),
            Name::from_text("www.example.com").unwrap(),
        ];
        let mut by_key = names.clone();
        by_key.sort_by_key(|n| n.sort_key());
        names.sort();
        for (a, b) in names.iter().zip(by_key.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn parent_chain() {
        let n = Name::from_text("www.example.com").unwrap();
        let p1 = n.parent().unwrap();
        assert_eq!(p1.to_text(), "example.com.");
        let p2 = p1.parent().unwrap();
        assert_eq!(p2.to_text(), "com.");
        let p3 = p2.parent().unwrap();
        assert!(p3.is_root());
        assert!(p3.parent().is_none());
    }

    #[test]
    fn subdomain_test() {
        let a = Name::from_text("www.example.com").unwrap();
        let b = Name::from_text("example.com").unwrap();
        let c = Name::from_text("other.com").unwrap();
        assert!(a.is_subdomain_of(&b));
        assert!(b.is_subdomain_of(&b));
        assert!(!c.is_subdomain_of(&b));
    }

    #[test]
    fn text_escaping() {
        let mut wire = vec![1u8, b' ', 3, b'c', b'o', b'm', 0];
        let mut r = WireReader::new(&mut wire);
        let name = Name::from_wire(&mut r).unwrap();
        assert_eq!(name.to_text(), "\\ .com.");
    }
}
