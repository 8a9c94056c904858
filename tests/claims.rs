//! Signed reverse claim verification
//!
//! Signatures come from a fixed development key so digests are stable
//! across runs.

use alloy_primitives::{Address, Bytes, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use resolver_core::{ClaimPolicy, COIN_TYPE_ETH};
use resolver_engine::mock::MockChain;
use resolver_engine::{ClaimError, ClaimVerifier, SignedClaim};

const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const REGISTRAR: Address = Address::repeat_byte(0x5e);
const NOW: u64 = 1_750_000_000;

fn signer() -> PrivateKeySigner {
    DEV_KEY.parse().unwrap()
}

fn sign(digest: B256, key: &PrivateKeySigner) -> Bytes {
    Bytes::copy_from_slice(&key.sign_hash_sync(&digest).unwrap().as_bytes())
}

fn signed_claim(verifier: &ClaimVerifier<MockChain>, expiry: u64) -> SignedClaim {
    let key = signer();
    let mut claim = SignedClaim {
        target: key.address(),
        signer: key.address(),
        expiry,
        name: "dev.eth".to_string(),
        coin_types: vec![COIN_TYPE_ETH],
        signature: Bytes::new(),
    };
    claim.signature = sign(verifier.claim_digest(&claim), &key);
    claim
}

#[test]
fn test_dev_key_address() {
    assert_eq!(
        signer().address().to_checksum(None),
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
    );
}

#[tokio::test]
async fn test_expiry_boundaries() {
    let verifier = ClaimVerifier::new(MockChain::new(), REGISTRAR, COIN_TYPE_ETH);

    // expiry == now is still valid
    let claim = signed_claim(&verifier, NOW);
    verifier.verify_claim(&claim, NOW).await.unwrap();

    let claim = signed_claim(&verifier, NOW - 1);
    assert_eq!(
        verifier.verify_claim(&claim, NOW).await,
        Err(ClaimError::SignatureExpired {
            expiry: NOW - 1,
            now: NOW
        })
    );

    let claim = signed_claim(&verifier, NOW + 3600);
    verifier.verify_claim(&claim, NOW).await.unwrap();

    let claim = signed_claim(&verifier, NOW + 3601);
    assert_eq!(
        verifier.verify_claim(&claim, NOW).await,
        Err(ClaimError::SignatureExpiryTooHigh {
            expiry: NOW + 3601,
            max: NOW + 3600
        })
    );
}

#[tokio::test]
async fn test_configured_horizon() {
    let verifier = ClaimVerifier::new(MockChain::new(), REGISTRAR, COIN_TYPE_ETH).with_policy(
        ClaimPolicy {
            max_expiry_horizon_secs: 86_400,
        },
    );
    let claim = signed_claim(&verifier, NOW + 7200);
    verifier.verify_claim(&claim, NOW).await.unwrap();
}

#[tokio::test]
async fn test_claim_is_bound_to_registrar_and_coin_type() {
    let verifier = ClaimVerifier::new(MockChain::new(), REGISTRAR, COIN_TYPE_ETH);
    let claim = signed_claim(&verifier, NOW + 60);

    let other_registrar =
        ClaimVerifier::new(MockChain::new(), Address::repeat_byte(0x01), COIN_TYPE_ETH);
    assert_eq!(
        other_registrar.verify_claim(&claim, NOW).await,
        Err(ClaimError::InvalidSignature)
    );

    let other_chain = ClaimVerifier::new(MockChain::new(), REGISTRAR, 0x8000_000a);
    assert_eq!(
        other_chain.verify_claim(&claim, NOW).await,
        Err(ClaimError::CoinTypeNotFound(0x8000_000a))
    );
}

#[tokio::test]
async fn test_ownable_owner_checked_before_signature() {
    let chain = MockChain::new();
    let contract = Address::repeat_byte(0xc0);
    chain.set_owner(contract, Address::repeat_byte(0x99));
    let verifier = ClaimVerifier::new(chain, REGISTRAR, COIN_TYPE_ETH);

    let key = signer();
    let claim = SignedClaim {
        target: contract,
        signer: key.address(),
        expiry: NOW + 60,
        name: "contract.eth".to_string(),
        coin_types: vec![COIN_TYPE_ETH],
        // garbage: the owner check must fail first
        signature: Bytes::from_static(&[0u8; 3]),
    };
    assert_eq!(
        verifier.verify_ownable_claim(&claim, NOW).await,
        Err(ClaimError::NotOwnerOfContract {
            contract,
            signer: key.address()
        })
    );
}
