//! Dotted names and their length-prefixed wire form

use std::fmt;

use crate::codec;
use crate::error::CodecError;
use crate::label::Label;
use crate::Node;

/// A name as an ordered list of labels, leaf first. Empty is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Name {
    labels: Vec<Label>,
}

impl Name {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_labels(labels: Vec<Label>) -> Self {
        Self { labels }
    }

    /// Parse a dotted name. Empty labels are rejected; `""` is the root.
    pub fn parse(name: &str) -> Result<Self, CodecError> {
        if name.is_empty() {
            return Ok(Self::root());
        }
        let labels = name
            .split('.')
            .map(|label| {
                if label.is_empty() {
                    Err(CodecError::Encoding(format!("empty label in {:?}", name)))
                } else {
                    Ok(Label::from_bytes(label.as_bytes()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { labels })
    }

    /// Decode a wire name, requiring it to end exactly at its terminator
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut labels = Vec::new();
        let mut offset = 0;
        loop {
            let (size, next) = codec::read_label(bytes, offset)?;
            if size == 0 {
                if next != bytes.len() {
                    return Err(CodecError::decoding(next, "trailing bytes after terminator"));
                }
                return Ok(Self { labels });
            }
            labels.push(Label::from_bytes(&bytes[offset + 1..next]));
            offset = next;
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for label in &self.labels {
            let bytes = label.wire_bytes();
            out.push(bytes.len() as u8);
            out.extend_from_slice(&bytes);
        }
        out.push(0);
        out
    }

    pub fn namehash(&self) -> Result<Node, CodecError> {
        codec::namehash(&self.encode(), 0)
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Name with the leaf label removed. The root has no parent.
    pub fn parent(&self) -> Option<Self> {
        if self.labels.is_empty() {
            return None;
        }
        Some(Self {
            labels: self.labels[1..].to_vec(),
        })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", label)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Name {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Encode a dotted name into wire form
pub fn encode(name: &str) -> Result<Vec<u8>, CodecError> {
    Ok(Name::parse(name)?.encode())
}

/// Decode a wire name
pub fn decode(bytes: &[u8]) -> Result<Name, CodecError> {
    Name::decode(bytes)
}

/// Namehash of a dotted name
pub fn namehash_str(name: &str) -> Result<Node, CodecError> {
    Name::parse(name)?.namehash()
}
