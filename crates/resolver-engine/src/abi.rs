//! Solidity ABI surface used on the wire: resolver profiles, the extended
//! resolver entry point, EIP-3668 `OffchainLookup`, and the batch gateway.

use alloy_primitives::{keccak256, Address, Bytes, FixedBytes};
use alloy_sol_types::{sol, SolValue};

sol! {
    interface IExtendedResolver {
        function resolve(bytes name, bytes data) external view returns (bytes);
    }

    interface IERC165 {
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
    }

    interface IFeatureSupporter {
        function supportsFeature(bytes4 feature) external view returns (bool);
    }

    interface IMulticallable {
        function multicall(bytes[] data) external returns (bytes[] results);
    }

    interface IAddrResolver {
        function addr(bytes32 node) external view returns (address);
    }

    interface IAddressResolver {
        function addr(bytes32 node, uint256 coinType) external view returns (bytes);
    }

    interface ITextResolver {
        function text(bytes32 node, string key) external view returns (string);
    }

    interface IContentHashResolver {
        function contenthash(bytes32 node) external view returns (bytes);
    }

    interface INameResolver {
        function name(bytes32 node) external view returns (string);
    }

    interface IRegistry {
        function owner(bytes32 node) external view returns (address);
        function resolver(bytes32 node) external view returns (address);
    }

    interface IOwnable {
        function owner() external view returns (address);
    }

    interface IERC1271 {
        function isValidSignature(bytes32 hash, bytes signature) external view returns (bytes4);
    }

    interface IBatchGateway {
        struct Request {
            address sender;
            string[] urls;
            bytes data;
        }

        function query(Request[] requests) external view returns (bool[] failures, bytes[] responses);
    }

    interface IReverseRegistrar {
        function setNameForAddrWithSignature(
            address addr,
            uint256 signatureExpiry,
            string name,
            uint256[] coinTypes,
            bytes signature
        ) external;

        function setNameForOwnableWithSignature(
            address contractAddr,
            address owner,
            uint256 signatureExpiry,
            string name,
            uint256[] coinTypes,
            bytes signature
        ) external;
    }

    error OffchainLookup(address sender, string[] urls, bytes callData, bytes4 callbackFunction, bytes extraData);

    error HttpError(uint16 status, string message);
}

/// ERC-165 id of `IExtendedResolver` (`resolve(bytes,bytes)`)
pub const EXTENDED_RESOLVER_INTERFACE: [u8; 4] = [0x90, 0x61, 0xb9, 0x23];

/// ERC-165 id of ERC-165 itself
pub const ERC165_INTERFACE: [u8; 4] = [0x01, 0xff, 0xc9, 0xa7];

/// ERC-1271 success value (`isValidSignature.selector`)
pub const ERC1271_MAGIC: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

/// Trailing 32 bytes that mark an ERC-6492 wrapped signature
pub const ERC6492_SUFFIX: [u8; 32] = [
    0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92,
    0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92,
];

/// Feature flag a resolver advertises when `resolve(name, multicall(...))` is answered natively
pub fn multicall_feature() -> FixedBytes<4> {
    let hash = keccak256("eth.ens.resolver.extended.multicall");
    FixedBytes::from_slice(&hash[..4])
}

/// ABI-encode a single `bytes` return value
pub fn encode_bytes(data: &[u8]) -> Bytes {
    (Bytes::copy_from_slice(data),).abi_encode_params().into()
}

/// Decode a single `bytes` return value
pub fn decode_bytes(data: &[u8]) -> Result<Bytes, alloy_sol_types::Error> {
    <(Bytes,) as SolValue>::abi_decode_params(data).map(|(bytes,)| bytes)
}

/// ABI-encode a single `bytes[]` return value
pub fn encode_bytes_array(items: &[Bytes]) -> Bytes {
    (items.to_vec(),).abi_encode_params().into()
}

/// Decode a single `bytes[]` return value
pub fn decode_bytes_array(data: &[u8]) -> Result<Vec<Bytes>, alloy_sol_types::Error> {
    <(Vec<Bytes>,) as SolValue>::abi_decode_params(data).map(|(items,)| items)
}

/// ABI-encode a single `address` return value
pub fn encode_address(address: Address) -> Bytes {
    (address,).abi_encode_params().into()
}

/// Decode a single `address` return value
pub fn decode_address(data: &[u8]) -> Result<Address, alloy_sol_types::Error> {
    <(Address,) as SolValue>::abi_decode_params(data).map(|(address,)| address)
}

/// ABI-encode a single `bool` return value
pub fn encode_bool(value: bool) -> Bytes {
    (value,).abi_encode_params().into()
}

/// Decode a single `bool` return value
pub fn decode_bool(data: &[u8]) -> Result<bool, alloy_sol_types::Error> {
    <(bool,) as SolValue>::abi_decode_params(data).map(|(value,)| value)
}

/// ABI-encode a single `string` return value
pub fn encode_string(value: &str) -> Bytes {
    (value.to_string(),).abi_encode_params().into()
}

/// Decode a single `string` return value
pub fn decode_string(data: &[u8]) -> Result<String, alloy_sol_types::Error> {
    <(String,) as SolValue>::abi_decode_params(data).map(|(value,)| value)
}

/// Batch gateway response body: `(bool[] failures, bytes[] responses)`
pub fn encode_batch_response(failures: Vec<bool>, responses: Vec<Bytes>) -> Bytes {
    (failures, responses).abi_encode_params().into()
}

pub fn decode_batch_response(data: &[u8]) -> Result<(Vec<bool>, Vec<Bytes>), alloy_sol_types::Error> {
    <(Vec<bool>, Vec<Bytes>) as SolValue>::abi_decode_params(data)
}
