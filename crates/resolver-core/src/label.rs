//! Name labels: literal bytes or a hash commitment

use std::fmt;

use crate::hash::keccak256;

/// Wire length of a commitment label: `[` + 64 hex digits + `]`
pub const COMMITMENT_LABEL_LEN: usize = 66;

/// Longest literal label that fits behind a one-byte length prefix
pub const MAX_LITERAL_LABEL_LEN: usize = 255;

/// A single label of a name
///
/// A commitment stands for a label whose preimage is unknown or too long
/// to carry: it contributes its hash to the namehash directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Literal(Vec<u8>),
    Commitment([u8; 32]),
}

impl Label {
    /// Parse a label from its textual or wire bytes.
    ///
    /// `[<64 hex>]` becomes a commitment; anything else is literal.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        parse_commitment(bytes)
            .map(Label::Commitment)
            .unwrap_or_else(|| Label::Literal(bytes.to_vec()))
    }

    /// The label hash that feeds the namehash
    pub fn hash(&self) -> [u8; 32] {
        match self {
            Label::Literal(bytes) => keccak256(bytes),
            Label::Commitment(hash) => *hash,
        }
    }

    /// Bytes written after the length prefix on the wire
    ///
    /// Literals longer than 255 bytes are carried as their commitment.
    pub fn wire_bytes(&self) -> Vec<u8> {
        match self {
            Label::Literal(bytes) if bytes.len() <= MAX_LITERAL_LABEL_LEN => bytes.clone(),
            Label::Literal(bytes) => commitment_text(&keccak256(bytes)).into_bytes(),
            Label::Commitment(hash) => commitment_text(hash).into_bytes(),
        }
    }

    pub fn is_commitment(&self) -> bool {
        matches!(self, Label::Commitment(_))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Literal(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Label::Commitment(hash) => write!(f, "{}", commitment_text(hash)),
        }
    }
}

fn commitment_text(hash: &[u8; 32]) -> String {
    format!("[{}]", hex::encode(hash))
}

/// Returns the committed hash if `bytes` is `[<64 hex digits>]`
pub fn parse_commitment(bytes: &[u8]) -> Option<[u8; 32]> {
    if bytes.len() != COMMITMENT_LABEL_LEN || bytes[0] != b'[' || bytes[65] != b']' {
        return None;
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(&bytes[1..65], &mut hash).ok()?;
    Some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_hash() {
        let label = Label::from_bytes(b"eth");
        assert_eq!(label, Label::Literal(b"eth".to_vec()));
        assert_eq!(
            hex::encode(label.hash()),
            "4f5b812789fc606be1b3b16908db13fc7a9adf7ca72641f84d75b47069d3d7f0"
        );
    }

    #[test]
    fn test_commitment_round_trip() {
        let hash = keccak256(b"vitalik");
        let text = format!("[{}]", hex::encode(hash));
        let label = Label::from_bytes(text.as_bytes());
        assert_eq!(label, Label::Commitment(hash));
        assert_eq!(label.hash(), hash);
        assert_eq!(label.to_string(), text);
    }

    #[test]
    fn test_bracketed_non_hex_is_literal() {
        let text = format!("[{}]", "z".repeat(64));
        assert!(!Label::from_bytes(text.as_bytes()).is_commitment());
        assert!(!Label::from_bytes(b"[abc]").is_commitment());
    }

    #[test]
    fn test_long_literal_wire_form_is_commitment() {
        let long = vec![b'a'; 300];
        let label = Label::Literal(long.clone());
        let wire = label.wire_bytes();
        assert_eq!(wire.len(), COMMITMENT_LABEL_LEN);
        assert_eq!(parse_commitment(&wire), Some(keccak256(&long)));
    }
}
