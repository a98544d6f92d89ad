//! Signature verification and order signing
//!
//! Externally-owned signers are authenticated by secp256k1 public-key
//! recovery over the order digest. Both the 65-byte `(r, s, v)` encoding and
//! the 64-byte EIP-2098 compact encoding `(r, vs)` are accepted. Signers
//! registered as contracts are delegated to an ERC-1271 style callback.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use tracing::debug;

use crate::errors::SignatureError;

/// Return value of a contract signer accepting a hash
/// (`bytes4(keccak256("isValidSignature(bytes32,bytes)"))`).
pub const ERC1271_MAGIC_VALUE: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

/// Half of the secp256k1 group order. Larger `s` values are malleable.
pub const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Contract account able to approve hashes on its own terms.
pub trait ContractSigner: Send + Sync {
    /// Return [`ERC1271_MAGIC_VALUE`] to approve `hash`.
    fn is_valid_signature(&self, hash: B256, signature: &[u8]) -> [u8; 4];
}

/// Authenticates the signer of an order digest.
#[derive(Default, Clone)]
pub struct SignatureVerifier {
    contract_signers: HashMap<Address, Arc<dyn ContractSigner>>,
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("contract_signers", &self.contract_signers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SignatureVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `address` as a contract account validated by `validator`.
    pub fn register_contract_signer(&mut self, address: Address, validator: Arc<dyn ContractSigner>) {
        self.contract_signers.insert(address, validator);
    }

    pub fn remove_contract_signer(&mut self, address: &Address) {
        self.contract_signers.remove(address);
    }

    pub fn is_contract(&self, address: &Address) -> bool {
        self.contract_signers.contains_key(address)
    }

    /// Authenticate `signature` over `hash` for `signer`.
    ///
    /// Check order: length, `v`, `s`, non-null recovery, signer match.
    /// Contract signers skip all of these and answer through their callback.
    pub fn verify(
        &self,
        signer: Address,
        hash: B256,
        signature: &[u8],
    ) -> Result<(), SignatureError> {
        if let Some(contract) = self.contract_signers.get(&signer) {
            if contract.is_valid_signature(hash, signature) != ERC1271_MAGIC_VALUE {
                debug!(%signer, "Contract signer rejected hash");
                return Err(SignatureError::Mismatch { signer });
            }
            return Ok(());
        }

        let (r, s, v) = split_signature(signature)?;

        if v != 27 && v != 28 {
            return Err(SignatureError::VInvalid { v });
        }
        if s > SECP256K1_HALF_ORDER {
            return Err(SignatureError::SInvalid);
        }

        let recovered = recover_signer(hash, &r, &s, v)?;
        if recovered.is_zero() {
            return Err(SignatureError::NullSigner);
        }
        if recovered != signer {
            debug!(%signer, %recovered, "Recovered signer mismatch");
            return Err(SignatureError::Mismatch { signer });
        }
        Ok(())
    }

    /// Non-failing variant for pre-flight checks.
    pub fn is_valid(&self, signer: Address, hash: B256, signature: &[u8]) -> bool {
        self.verify(signer, hash, signature).is_ok()
    }
}

/// Split a 64- or 65-byte signature into `(r, s, v)`.
fn split_signature(signature: &[u8]) -> Result<([u8; 32], [u8; 32], u8), SignatureError> {
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    match signature.len() {
        65 => {
            r.copy_from_slice(&signature[..32]);
            s.copy_from_slice(&signature[32..64]);
            Ok((r, s, signature[64]))
        }
        64 => {
            // EIP-2098: the top bit of `vs` carries the y-parity
            r.copy_from_slice(&signature[..32]);
            s.copy_from_slice(&signature[32..64]);
            let parity = s[0] >> 7;
            s[0] &= 0x7f;
            Ok((r, s, parity + 27))
        }
        length => Err(SignatureError::LengthInvalid { length }),
    }
}

fn recover_signer(hash: B256, r: &[u8; 32], s: &[u8; 32], v: u8) -> Result<Address, SignatureError> {
    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(r);
    rs[32..].copy_from_slice(s);

    // Zero or out-of-range scalars recover nothing
    let signature = Signature::from_slice(&rs).map_err(|_| SignatureError::NullSigner)?;
    let recovery_id = RecoveryId::from_byte(v - 27).ok_or(SignatureError::VInvalid { v })?;
    let key = VerifyingKey::recover_from_prehash(hash.as_slice(), &signature, recovery_id)
        .map_err(|_| SignatureError::NullSigner)?;
    Ok(public_key_address(&key))
}

/// Ethereum address of a public key: last 20 bytes of keccak256(x ‖ y).
pub fn public_key_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Off-chain signer for maker orders.
#[derive(Clone)]
pub struct OrderSigner {
    key: SigningKey,
}

impl fmt::Debug for OrderSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderSigner")
            .field("address", &self.address())
            .finish()
    }
}

impl OrderSigner {
    /// Build a signer from a 32-byte secret scalar.
    pub fn from_secret(secret: &[u8; 32]) -> Result<Self, SignatureError> {
        let key = SigningKey::from_slice(secret).map_err(|_| SignatureError::NullSigner)?;
        Ok(Self { key })
    }

    pub fn address(&self) -> Address {
        public_key_address(self.key.verifying_key())
    }

    /// 65-byte `(r, s, v)` signature over a digest, low-`s` normalized.
    pub fn sign_digest(&self, digest: B256) -> Result<[u8; 65], SignatureError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_slice())
            .map_err(|_| SignatureError::NullSigner)?;
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = 27 + recovery_id.to_byte();
        Ok(out)
    }

    /// 64-byte EIP-2098 compact signature over a digest.
    pub fn sign_digest_compact(&self, digest: B256) -> Result<[u8; 64], SignatureError> {
        let full = self.sign_digest(digest)?;
        let mut out = [0u8; 64];
        out.copy_from_slice(&full[..64]);
        if full[64] == 28 {
            out[32] |= 0x80;
        }
        Ok(out)
    }
}
