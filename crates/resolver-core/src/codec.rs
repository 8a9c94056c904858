//! Cursor operations over wire-encoded names
//!
//! A wire name is a sequence of `len ++ bytes` labels closed by a zero byte.
//! These functions walk that form directly, without building a [`Name`].
//!
//! [`Name`]: crate::Name

use crate::error::CodecError;
use crate::hash::{child_node, keccak256};
use crate::label::parse_commitment;
use crate::Node;

/// Read the label header at `offset`.
///
/// Returns `(size, next_offset)`. A size of zero marks the terminator.
pub fn read_label(name: &[u8], offset: usize) -> Result<(usize, usize), CodecError> {
    let size = *name
        .get(offset)
        .ok_or_else(|| CodecError::decoding(offset, "truncated length prefix"))? as usize;
    let next = offset + 1 + size;
    if next > name.len() {
        return Err(CodecError::decoding(
            offset,
            format!("label of {} bytes runs past end of name", size),
        ));
    }
    Ok((size, next))
}

/// Hash the label at `offset` and advance past it.
///
/// Fails at the terminator, on malformed headers, and on commitment
/// labels whose hash is zero.
pub fn next_label(name: &[u8], offset: usize) -> Result<([u8; 32], usize), CodecError> {
    let (size, next) = read_label(name, offset)?;
    if size == 0 {
        return Err(CodecError::decoding(offset, "no label after terminator"));
    }
    let bytes = &name[offset + 1..next];
    let hash = match parse_commitment(bytes) {
        Some(hash) if hash == [0u8; 32] => {
            return Err(CodecError::decoding(offset, "zero label commitment"));
        }
        Some(hash) => hash,
        None => keccak256(bytes),
    };
    Ok((hash, next))
}

/// Offset of the label that precedes the one starting at `offset`.
///
/// `offset` must be a label boundary greater than zero.
pub fn prev_label(name: &[u8], offset: usize) -> Result<usize, CodecError> {
    if offset == 0 {
        return Err(CodecError::decoding(0, "no label before start of name"));
    }
    let mut cursor = 0;
    loop {
        let (size, next) = read_label(name, cursor)?;
        if next == offset {
            return Ok(cursor);
        }
        if size == 0 || next > offset {
            return Err(CodecError::decoding(offset, "offset is not a label boundary"));
        }
        cursor = next;
    }
}

/// Offsets of every label boundary from `offset` up to and including the terminator
fn boundaries(name: &[u8], offset: usize) -> Result<(Vec<usize>, Vec<[u8; 32]>), CodecError> {
    let mut offsets = Vec::new();
    let mut hashes = Vec::new();
    let mut cursor = offset;
    loop {
        let (size, next) = read_label(name, cursor)?;
        offsets.push(cursor);
        if size == 0 {
            if next != name.len() {
                return Err(CodecError::decoding(next, "trailing bytes after terminator"));
            }
            return Ok((offsets, hashes));
        }
        let (hash, _) = next_label(name, cursor)?;
        hashes.push(hash);
        cursor = next;
    }
}

/// Namehash of the suffix starting at `offset`
pub fn namehash(name: &[u8], offset: usize) -> Result<Node, CodecError> {
    let (_, hashes) = boundaries(name, offset)?;
    Ok(hashes
        .iter()
        .rev()
        .fold([0u8; 32], |node, label| child_node(&node, label)))
}

/// Result of [`match_suffix`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixMatch {
    pub matched: bool,
    /// Namehash of the whole name from the starting offset
    pub node: Node,
    /// Boundary reached by the walk when the match was found; equals
    /// `match_offset` on a match and the starting offset otherwise
    pub prev_offset: usize,
    /// Boundary where the matching suffix starts
    pub match_offset: usize,
}

/// Find the suffix of `name` (from `offset`) whose namehash is `target`.
///
/// The full namehash is computed in the same pass, so callers get it even
/// when nothing matches. The root suffix matches the zero node.
pub fn match_suffix(name: &[u8], offset: usize, target: &Node) -> Result<SuffixMatch, CodecError> {
    let (offsets, hashes) = boundaries(name, offset)?;

    let mut nodes = vec![[0u8; 32]; offsets.len()];
    for i in (0..hashes.len()).rev() {
        nodes[i] = child_node(&nodes[i + 1], &hashes[i]);
    }

    let found = nodes.iter().position(|node| node == target);
    Ok(match found {
        Some(i) => SuffixMatch {
            matched: true,
            node: nodes[0],
            prev_offset: offsets[i],
            match_offset: offsets[i],
        },
        None => SuffixMatch {
            matched: false,
            node: nodes[0],
            prev_offset: offset,
            match_offset: offset,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::encode;

    #[test]
    fn test_namehash_root_is_zero() {
        assert_eq!(namehash(&[0], 0).unwrap(), [0u8; 32]);
    }

    #[test]
    fn test_namehash_known_vectors() {
        let eth = encode("eth").unwrap();
        assert_eq!(
            hex::encode(namehash(&eth, 0).unwrap()),
            "93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        let foo = encode("foo.eth").unwrap();
        assert_eq!(
            hex::encode(namehash(&foo, 0).unwrap()),
            "de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
        assert_eq!(namehash(&foo, 4).unwrap(), namehash(&eth, 0).unwrap());
    }

    #[test]
    fn test_next_label_walks_and_stops_at_terminator() {
        let name = encode("a.bc").unwrap();
        let (hash, next) = next_label(&name, 0).unwrap();
        assert_eq!(hash, keccak256(b"a"));
        assert_eq!(next, 2);
        let (hash, next) = next_label(&name, next).unwrap();
        assert_eq!(hash, keccak256(b"bc"));
        assert_eq!(next, 5);
        assert!(next_label(&name, next).is_err());
    }

    #[test]
    fn test_prev_label() {
        let name = encode("a.bc.d").unwrap();
        assert_eq!(prev_label(&name, 2).unwrap(), 0);
        assert_eq!(prev_label(&name, 5).unwrap(), 2);
        assert_eq!(prev_label(&name, 7).unwrap(), 5);
        assert!(prev_label(&name, 0).is_err());
        assert!(prev_label(&name, 3).is_err());
    }

    #[test]
    fn test_zero_commitment_rejected() {
        let text = format!("[{}].eth", "0".repeat(64));
        let name = encode(&text).unwrap();
        assert!(matches!(namehash(&name, 0), Err(CodecError::Decoding { .. })));
    }

    #[test]
    fn test_commitment_hashes_like_literal() {
        let literal = encode("vitalik.eth").unwrap();
        let hashed = encode(&format!("[{}].eth", hex::encode(keccak256(b"vitalik")))).unwrap();
        assert_eq!(namehash(&literal, 0).unwrap(), namehash(&hashed, 0).unwrap());
    }

    #[test]
    fn test_truncated_inputs() {
        assert!(namehash(&[], 0).is_err());
        assert!(namehash(&[3, b'a', b'b'], 0).is_err());
        assert!(namehash(&[1, b'a'], 0).is_err());
        assert!(namehash(&[1, b'a', 0, 0], 0).is_err());
    }

    #[test]
    fn test_match_suffix_ancestor() {
        let name = encode("a.b.c.d").unwrap();
        let target = namehash(&encode("c.d").unwrap(), 0).unwrap();
        let m = match_suffix(&name, 0, &target).unwrap();
        assert!(m.matched);
        assert_eq!(m.node, namehash(&name, 0).unwrap());
        assert_eq!((m.prev_offset, m.match_offset), (4, 4));
    }

    #[test]
    fn test_match_suffix_self_and_root() {
        let name = encode("a.b").unwrap();
        let full = namehash(&name, 0).unwrap();
        let m = match_suffix(&name, 0, &full).unwrap();
        assert!(m.matched);
        assert_eq!((m.prev_offset, m.match_offset), (0, 0));

        let m = match_suffix(&name, 0, &[0u8; 32]).unwrap();
        assert!(m.matched);
        assert_eq!(m.match_offset, name.len() - 1);
        assert_eq!(m.prev_offset, name.len() - 1);
    }

    #[test]
    fn test_match_suffix_miss_still_hashes() {
        let name = encode("a.b").unwrap();
        let m = match_suffix(&name, 0, &[0x42u8; 32]).unwrap();
        assert!(!m.matched);
        assert_eq!(m.node, namehash(&name, 0).unwrap());
    }

    #[test]
    fn test_match_suffix_offset_property() {
        let full = "sub.vitalik.eth";
        let name = encode(full).unwrap();
        for ancestor in ["sub.vitalik.eth", "vitalik.eth", "eth", ""] {
            let encoded = encode(ancestor).unwrap();
            let target = namehash(&encoded, 0).unwrap();
            let m = match_suffix(&name, 0, &target).unwrap();
            assert!(m.matched, "{ancestor}");
            assert_eq!(m.match_offset, name.len() - encoded.len(), "{ancestor}");
        }
    }
}
