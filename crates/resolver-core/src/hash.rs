//! Keccak-256 helpers shared by the name codec and reverse-name builder

use tiny_keccak::{Hasher, Keccak};

use crate::Node;

/// Keccak-256 of `data`
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Combine a parent node with a label hash: `keccak256(parent ++ labelhash)`
pub fn child_node(parent: &Node, label_hash: &[u8; 32]) -> Node {
    let mut hasher = Keccak::v256();
    hasher.update(parent);
    hasher.update(label_hash);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}
