//! Resolver profile queries and their answers

use alloy_primitives::{Bytes, B256, U256};
use alloy_sol_types::SolCall;

use resolver_core::COIN_TYPE_ETH;

use crate::abi::{
    self, IAddrResolver, IAddressResolver, IContentHashResolver, INameResolver, ITextResolver,
};

/// One record request: profile calldata `selector ++ abi(node, args...)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileQuery {
    calldata: Bytes,
}

impl ProfileQuery {
    /// Wrap raw calldata; resolvers interpret it, the engine does not
    pub fn raw(calldata: impl Into<Bytes>) -> Self {
        Self {
            calldata: calldata.into(),
        }
    }

    /// `addr(bytes32)`: the mainnet address record
    pub fn addr(node: B256) -> Self {
        Self::raw(IAddrResolver::addrCall { node }.abi_encode())
    }

    /// `addr(bytes32,uint256)`: address record for a coin type
    pub fn addr_coin(node: B256, coin_type: u64) -> Self {
        Self::raw(
            IAddressResolver::addrCall {
                node,
                coinType: U256::from(coin_type),
            }
            .abi_encode(),
        )
    }

    /// Address query in the shape legacy resolvers answer for `coin_type`
    pub fn address(node: B256, coin_type: u64) -> Self {
        if coin_type == COIN_TYPE_ETH {
            Self::addr(node)
        } else {
            Self::addr_coin(node, coin_type)
        }
    }

    pub fn text(node: B256, key: &str) -> Self {
        Self::raw(
            ITextResolver::textCall {
                node,
                key: key.to_string(),
            }
            .abi_encode(),
        )
    }

    pub fn contenthash(node: B256) -> Self {
        Self::raw(IContentHashResolver::contenthashCall { node }.abi_encode())
    }

    /// `name(bytes32)`: the primary name stored on a reverse node
    pub fn name(node: B256) -> Self {
        Self::raw(INameResolver::nameCall { node }.abi_encode())
    }

    pub fn calldata(&self) -> &Bytes {
        &self.calldata
    }

    /// First four bytes of the calldata, zero-padded when shorter
    pub fn selector(&self) -> [u8; 4] {
        let mut selector = [0u8; 4];
        let n = self.calldata.len().min(4);
        selector[..n].copy_from_slice(&self.calldata[..n]);
        selector
    }
}

impl From<Bytes> for ProfileQuery {
    fn from(calldata: Bytes) -> Self {
        Self::raw(calldata)
    }
}

/// Decode the answer to an address query into raw address bytes
///
/// `addr(bytes32)` answers an `address`, where zero means unset; the
/// coin-typed form answers `bytes`, where empty means unset. Both come back
/// as an empty vector when unset.
pub fn decode_address_record(query: &ProfileQuery, payload: &[u8]) -> Option<Bytes> {
    if query.selector() == IAddrResolver::addrCall::SELECTOR {
        let address = abi::decode_address(payload).ok()?;
        if address.is_zero() {
            Some(Bytes::new())
        } else {
            Some(Bytes::copy_from_slice(address.as_slice()))
        }
    } else {
        abi::decode_bytes(payload).ok()
    }
}

pub fn decode_text(payload: &[u8]) -> Option<String> {
    abi::decode_string(payload).ok()
}

pub fn decode_contenthash(payload: &[u8]) -> Option<Bytes> {
    abi::decode_bytes(payload).ok()
}

pub fn decode_name(payload: &[u8]) -> Option<String> {
    abi::decode_string(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    #[test]
    fn test_selectors_follow_profile() {
        let node = B256::repeat_byte(1);
        assert_eq!(ProfileQuery::addr(node).selector(), [0x3b, 0x3b, 0x57, 0xde]);
        assert_eq!(ProfileQuery::address(node, 60), ProfileQuery::addr(node));
        assert_eq!(
            ProfileQuery::address(node, 0x8000_000a).selector(),
            [0xf1, 0xcb, 0x7e, 0x06]
        );
        assert_eq!(ProfileQuery::text(node, "url").selector(), [0x59, 0xd1, 0xd4, 0x3c]);
        assert_eq!(ProfileQuery::raw(Bytes::from_static(&[1, 2])).selector(), [1, 2, 0, 0]);
    }

    #[test]
    fn test_decode_address_record() {
        let node = B256::ZERO;
        let legacy = ProfileQuery::addr(node);
        let addr = Address::repeat_byte(0x42);
        assert_eq!(
            decode_address_record(&legacy, &abi::encode_address(addr)).unwrap().as_ref(),
            addr.as_slice()
        );
        assert!(decode_address_record(&legacy, &abi::encode_address(Address::ZERO))
            .unwrap()
            .is_empty());

        let typed = ProfileQuery::addr_coin(node, 0);
        assert_eq!(
            decode_address_record(&typed, &abi::encode_bytes(&[0x00, 0x14])).unwrap().as_ref(),
            &[0x00, 0x14]
        );
        assert!(decode_address_record(&typed, &[1, 2, 3]).is_none());
    }
}
