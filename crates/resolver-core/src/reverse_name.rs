//! Reverse names (ENSIP-19): `<hex address>.<coin type label>.reverse`

use crate::coin_type::reverse_label;
use crate::error::Error;
use crate::name::Name;
use crate::Node;

/// Dotted reverse name for an address under a coin type
pub fn reverse_name(address: &[u8], coin_type: u64) -> Result<String, Error> {
    if address.is_empty() {
        return Err(Error::InvalidAddress("empty address".to_string()));
    }
    Ok(format!(
        "{}.{}.reverse",
        hex::encode(address),
        reverse_label(coin_type)
    ))
}

/// Wire-encoded reverse name
pub fn encode_reverse_name(address: &[u8], coin_type: u64) -> Result<Vec<u8>, Error> {
    Ok(Name::parse(&reverse_name(address, coin_type)?)?.encode())
}

/// Namehash of the reverse name
pub fn reverse_node(address: &[u8], coin_type: u64) -> Result<Node, Error> {
    Ok(Name::parse(&reverse_name(address, coin_type)?)?.namehash()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin_type::{COIN_TYPE_DEFAULT, COIN_TYPE_ETH};

    const ADDR: [u8; 20] = [
        0xd8, 0xda, 0x6b, 0xf2, 0x69, 0x64, 0xaf, 0x9d, 0x7e, 0xed, 0x9e, 0x03, 0xe5, 0x34, 0x15,
        0xd3, 0x7a, 0xa9, 0x60, 0x45,
    ];

    #[test]
    fn test_reverse_names() {
        assert_eq!(
            reverse_name(&ADDR, COIN_TYPE_ETH).unwrap(),
            "d8da6bf26964af9d7eed9e03e53415d37aa96045.addr.reverse"
        );
        assert_eq!(
            reverse_name(&ADDR, COIN_TYPE_DEFAULT).unwrap(),
            "d8da6bf26964af9d7eed9e03e53415d37aa96045.default.reverse"
        );
        assert_eq!(
            reverse_name(&ADDR, 0x8000_000a).unwrap(),
            "d8da6bf26964af9d7eed9e03e53415d37aa96045.8000000a.reverse"
        );
    }

    #[test]
    fn test_empty_address_rejected() {
        assert!(matches!(reverse_name(&[], COIN_TYPE_ETH), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_reverse_node_matches_encoded() {
        let encoded = encode_reverse_name(&ADDR, COIN_TYPE_ETH).unwrap();
        assert_eq!(
            reverse_node(&ADDR, COIN_TYPE_ETH).unwrap(),
            crate::codec::namehash(&encoded, 0).unwrap()
        );
    }
}
