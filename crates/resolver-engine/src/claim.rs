//! Signature-authenticated reverse claims
//!
//! A claim lets `signer` set the primary name of `target` through a
//! registrar without sending the transaction itself. The signed message
//! binds the registrar, the registrar function, the target, the expiry, the
//! name and the coin types the claim may be executed for:
//!
//! ```text
//! keccak256(registrar ++ selector ++ target ++ uint256(expiry) ++ name ++ uint256[] coinTypes)
//! ```
//!
//! hashed again under EIP-191. The owner-delegated variant packs
//! `contract ++ owner` in place of `target`.

use alloy_primitives::{
    eip191_hash_message, keccak256, Address, Bytes, FixedBytes, Signature, B256, U256,
};
use alloy_sol_types::{SolCall, SolValue};
use tracing::debug;

use resolver_core::ClaimPolicy;

use crate::abi::{IReverseRegistrar, ERC6492_SUFFIX};
use crate::backend::{ContractSignatureChecker, CounterfactualDeployer, OwnershipProbe, Registry};
use crate::error::ClaimError;

/// A signed request to set `target`'s primary name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedClaim {
    /// Address (or ownable contract) whose name is set
    pub target: Address,
    /// Key or contract that produced `signature`
    pub signer: Address,
    /// Unix seconds after which the claim is void
    pub expiry: u64,
    pub name: String,
    /// Coin types this claim may be executed for
    pub coin_types: Vec<u64>,
    pub signature: Bytes,
}

/// Checks claims for one registrar executing under one coin type
pub struct ClaimVerifier<B> {
    backend: B,
    registrar: Address,
    coin_type: u64,
    policy: ClaimPolicy,
}

impl<B> ClaimVerifier<B>
where
    B: Registry + OwnershipProbe + ContractSignatureChecker + CounterfactualDeployer,
{
    pub fn new(backend: B, registrar: Address, coin_type: u64) -> Self {
        Self {
            backend,
            registrar,
            coin_type,
            policy: ClaimPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ClaimPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// EIP-191 digest a signer signs for `setNameForAddrWithSignature`
    pub fn claim_digest(&self, claim: &SignedClaim) -> B256 {
        let packed = (
            self.registrar,
            FixedBytes::<4>::from(IReverseRegistrar::setNameForAddrWithSignatureCall::SELECTOR),
            claim.target,
            U256::from(claim.expiry),
            claim.name.clone(),
            coin_types(claim),
        )
            .abi_encode_packed();
        eip191_hash_message(keccak256(packed))
    }

    /// EIP-191 digest for `setNameForOwnableWithSignature`
    pub fn ownable_claim_digest(&self, claim: &SignedClaim) -> B256 {
        let packed = (
            self.registrar,
            FixedBytes::<4>::from(IReverseRegistrar::setNameForOwnableWithSignatureCall::SELECTOR),
            claim.target,
            claim.signer,
            U256::from(claim.expiry),
            claim.name.clone(),
            coin_types(claim),
        )
            .abi_encode_packed();
        eip191_hash_message(keccak256(packed))
    }

    /// Verify a claim signed by the target address itself
    pub async fn verify_claim(&self, claim: &SignedClaim, now: u64) -> Result<(), ClaimError> {
        self.check_terms(claim, now)?;
        if claim.signer != claim.target {
            return Err(ClaimError::InvalidSignature);
        }
        let digest = self.claim_digest(claim);
        self.check_signature(claim.signer, digest, &claim.signature)
            .await
    }

    /// Verify a claim signed by the owner of the target contract
    ///
    /// Ownership is settled before the signature is looked at.
    pub async fn verify_ownable_claim(&self, claim: &SignedClaim, now: u64) -> Result<(), ClaimError> {
        self.check_terms(claim, now)?;
        let owner = self.backend.owner_of(claim.target).await?;
        if owner != Some(claim.signer) {
            return Err(ClaimError::NotOwnerOfContract {
                contract: claim.target,
                signer: claim.signer,
            });
        }
        let digest = self.ownable_claim_digest(claim);
        self.check_signature(claim.signer, digest, &claim.signature)
            .await
    }

    fn check_terms(&self, claim: &SignedClaim, now: u64) -> Result<(), ClaimError> {
        if !claim.coin_types.contains(&self.coin_type) {
            return Err(ClaimError::CoinTypeNotFound(self.coin_type));
        }
        if claim.expiry < now {
            return Err(ClaimError::SignatureExpired {
                expiry: claim.expiry,
                now,
            });
        }
        let max = now.saturating_add(self.policy.max_expiry_horizon_secs);
        if claim.expiry > max {
            return Err(ClaimError::SignatureExpiryTooHigh {
                expiry: claim.expiry,
                max,
            });
        }
        Ok(())
    }

    /// ERC-6492, then ERC-1271 for deployed contracts, then ECDSA
    async fn check_signature(
        &self,
        signer: Address,
        digest: B256,
        signature: &[u8],
    ) -> Result<(), ClaimError> {
        if let Some(wrapped) = signature.strip_suffix(&ERC6492_SUFFIX) {
            let (factory, calldata, inner) =
                <(Address, Bytes, Bytes) as SolValue>::abi_decode_params(wrapped)
                    .map_err(|_| ClaimError::InvalidSignature)?;
            if !self.backend.is_contract(signer).await? {
                debug!(%signer, %factory, "Deploying counterfactual signer");
                if !self.backend.deploy(factory, calldata).await? {
                    return Err(ClaimError::InvalidSignature);
                }
            }
            return self.check_contract_signature(signer, digest, inner).await;
        }

        if self.backend.is_contract(signer).await? {
            return self
                .check_contract_signature(signer, digest, Bytes::copy_from_slice(signature))
                .await;
        }

        let recovered = Signature::from_raw(signature)
            .ok()
            .and_then(|sig| sig.recover_address_from_prehash(&digest).ok());
        match recovered {
            Some(address) if address == signer => Ok(()),
            _ => Err(ClaimError::InvalidSignature),
        }
    }

    async fn check_contract_signature(
        &self,
        contract: Address,
        digest: B256,
        signature: Bytes,
    ) -> Result<(), ClaimError> {
        if self
            .backend
            .is_valid_signature(contract, digest, signature)
            .await?
        {
            Ok(())
        } else {
            Err(ClaimError::InvalidSignature)
        }
    }
}

fn coin_types(claim: &SignedClaim) -> Vec<U256> {
    claim.coin_types.iter().map(|&c| U256::from(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChain;
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;
    use resolver_core::COIN_TYPE_ETH;

    const REGISTRAR: Address = Address::repeat_byte(0x5e);
    const NOW: u64 = 1_700_000_000;

    fn claim(signer: &PrivateKeySigner) -> SignedClaim {
        SignedClaim {
            target: signer.address(),
            signer: signer.address(),
            expiry: NOW + 600,
            name: "alice.eth".into(),
            coin_types: vec![COIN_TYPE_ETH, 0x8000_000a],
            signature: Bytes::new(),
        }
    }

    fn sign(digest: B256, signer: &PrivateKeySigner) -> Bytes {
        Bytes::copy_from_slice(&signer.sign_hash_sync(&digest).unwrap().as_bytes())
    }

    #[test]
    fn test_digest_binds_every_field() {
        let verifier = ClaimVerifier::new(MockChain::new(), REGISTRAR, COIN_TYPE_ETH);
        let signer = PrivateKeySigner::random();
        let base = claim(&signer);
        let digest = verifier.claim_digest(&base);

        let mut other = base.clone();
        other.name = "bob.eth".into();
        assert_ne!(verifier.claim_digest(&other), digest);

        let mut other = base.clone();
        other.coin_types = vec![COIN_TYPE_ETH];
        assert_ne!(verifier.claim_digest(&other), digest);

        assert_ne!(verifier.ownable_claim_digest(&base), digest);
    }

    #[tokio::test]
    async fn test_ecdsa_claim() {
        let verifier = ClaimVerifier::new(MockChain::new(), REGISTRAR, COIN_TYPE_ETH);
        let signer = PrivateKeySigner::random();
        let mut c = claim(&signer);
        c.signature = sign(verifier.claim_digest(&c), &signer);
        verifier.verify_claim(&c, NOW).await.unwrap();

        let mut forged = c.clone();
        forged.name = "bob.eth".into();
        assert_eq!(
            verifier.verify_claim(&forged, NOW).await,
            Err(ClaimError::InvalidSignature)
        );
    }

    #[tokio::test]
    async fn test_validation_order() {
        let verifier = ClaimVerifier::new(MockChain::new(), REGISTRAR, 0x8000_2105);
        let signer = PrivateKeySigner::random();
        let c = claim(&signer);
        // coin type is checked before expiry
        let mut expired = c.clone();
        expired.expiry = NOW - 1;
        assert_eq!(
            verifier.verify_claim(&expired, NOW).await,
            Err(ClaimError::CoinTypeNotFound(0x8000_2105))
        );

        let verifier = ClaimVerifier::new(MockChain::new(), REGISTRAR, COIN_TYPE_ETH)
            .with_policy(ClaimPolicy {
                max_expiry_horizon_secs: 60,
            });
        assert!(matches!(
            verifier.verify_claim(&c, NOW).await,
            Err(ClaimError::SignatureExpiryTooHigh { max, .. }) if max == NOW + 60
        ));
    }

    #[tokio::test]
    async fn test_ownable_claim() {
        let chain = MockChain::new();
        let contract = Address::repeat_byte(0xc0);
        let owner = PrivateKeySigner::random();
        chain.set_owner(contract, owner.address());
        let verifier = ClaimVerifier::new(chain, REGISTRAR, COIN_TYPE_ETH);

        let mut c = claim(&owner);
        c.target = contract;
        c.signature = sign(verifier.ownable_claim_digest(&c), &owner);
        verifier.verify_ownable_claim(&c, NOW).await.unwrap();

        // a stranger is rejected before the signature is checked
        let stranger = PrivateKeySigner::random();
        let mut s = claim(&stranger);
        s.target = contract;
        assert_eq!(
            verifier.verify_ownable_claim(&s, NOW).await,
            Err(ClaimError::NotOwnerOfContract {
                contract,
                signer: stranger.address()
            })
        );
    }

    #[tokio::test]
    async fn test_contract_signers() {
        let chain = MockChain::new();
        let key = PrivateKeySigner::random();
        let wallet = Address::repeat_byte(0x77);
        chain.add_wallet(wallet, key.address());

        let factory = Address::repeat_byte(0xfa);
        let pending = Address::repeat_byte(0x78);
        let init = Bytes::from_static(&[0x01, 0x02]);
        chain.add_counterfactual_wallet(factory, init.clone(), pending, key.address());

        let verifier = ClaimVerifier::new(chain, REGISTRAR, COIN_TYPE_ETH);

        // ERC-1271
        let mut c = claim(&key);
        c.target = wallet;
        c.signer = wallet;
        c.signature = sign(verifier.claim_digest(&c), &key);
        verifier.verify_claim(&c, NOW).await.unwrap();

        // ERC-6492
        let mut c = claim(&key);
        c.target = pending;
        c.signer = pending;
        let inner = sign(verifier.claim_digest(&c), &key);
        let mut wrapped = (factory, init, inner).abi_encode_params();
        wrapped.extend_from_slice(&ERC6492_SUFFIX);
        c.signature = wrapped.into();
        assert!(!verifier.backend().is_deployed(pending));
        verifier.verify_claim(&c, NOW).await.unwrap();
        assert!(verifier.backend().is_deployed(pending));
    }
}
