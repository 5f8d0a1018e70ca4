// Copyright (c) 2024-2025 The Tapcard Developers

//! Certificate chain verification to the factory root
//!
//! Cards carry a chain of signatures from their own key up to a key burned
//! in at the factory. Each link attests the hash of the previous key;
//! walking the whole chain and comparing the final recovered key against
//! the trusted root set proves the card key was issued by the
//! manufacturer. Verification fails closed: any broken link or an unknown
//! terminal key rejects the device outright.

use const_decoder::Decoder;
use log::debug;
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId, Signature},
    Message, PublicKey,
};

use crate::{
    error::Error,
    message::{auth_message, sha256, AuthContext},
    CARD_NONCE_SIZE, SECP, USER_NONCE_SIZE,
};

/// Production factory root certificate key
const FACTORY_ROOT_PUBKEY: [u8; 33] =
    Decoder::Hex.decode(b"03028a0e89e70d0ec0d932053a89ab1da7d9182bdc6d2f03e706ee99517d05d9e1");

/// Minimum number of links in a plausible certificate chain
const MIN_CHAIN_LENGTH: usize = 2;

/// Trusted factory root key set.
///
/// Fixed at construction and shared read-only between verifications;
/// [`Default`] carries the production root.
#[derive(Clone, Debug, PartialEq)]
pub struct FactoryRootKeys(Vec<PublicKey>);

impl FactoryRootKeys {
    pub fn new(keys: Vec<PublicKey>) -> Self {
        Self(keys)
    }

    /// Look up a key by exact byte comparison of its compressed form
    fn find(&self, candidate: &PublicKey) -> Option<&PublicKey> {
        let bytes = candidate.serialize();
        self.0.iter().find(|k| k.serialize() == bytes)
    }
}

impl Default for FactoryRootKeys {
    fn default() -> Self {
        let root = PublicKey::from_slice(&FACTORY_ROOT_PUBKEY)
            .expect("embedded factory root key is valid");
        Self(vec![root])
    }
}

/// Verify a card's authentication signature and certificate chain.
///
/// The card must have signed the nonce-bound message with its reported
/// key, and the chain of recovery signatures starting from that key must
/// terminate at one of the trusted factory roots. Returns the matched
/// root key on success.
///
/// A sealed slot key, when supplied, is bound into the signed message so
/// the attestation also covers the not-yet-exposed slot.
pub fn verify_authority(
    card_nonce: &[u8; CARD_NONCE_SIZE],
    card_pubkey: &PublicKey,
    host_nonce: &[u8; USER_NONCE_SIZE],
    cert_chain: &[[u8; 65]],
    auth_sig: &[u8; 64],
    sealed_pubkey: Option<&[u8; 33]>,
    roots: &FactoryRootKeys,
) -> Result<PublicKey, Error> {
    if cert_chain.len() < MIN_CHAIN_LENGTH {
        return Err(Error::ChainTooShort);
    }

    let context = match sealed_pubkey {
        Some(k) => AuthContext::SealedKey(k),
        None => AuthContext::Bare,
    };
    let msg = auth_message(card_nonce, host_nonce, context)?;
    let digest = Message::from_digest(sha256(&msg));

    let sig = Signature::from_compact(auth_sig)?;
    SECP.verify_ecdsa(&digest, &sig, card_pubkey)
        .map_err(|_| Error::BadAuthSignature)?;

    // Walk every link, each one attests the hash of the key before it.
    // There is no shortcut: a forged link recovers to some other key and
    // the terminal comparison below cannot match a factory root.
    let mut pubkey = *card_pubkey;
    for link in cert_chain {
        pubkey = recover_signer(&pubkey, link)?;
    }

    match roots.find(&pubkey) {
        Some(root) => {
            debug!("certificate chain verified to factory root");
            Ok(*root)
        }
        None => Err(Error::CounterfeitDevice(
            "certificate chain does not terminate at a factory root",
        )),
    }
}

/// Recover the signer of one chain link from the previous key's hash
fn recover_signer(prev: &PublicKey, link: &[u8; 65]) -> Result<PublicKey, Error> {
    let rec_id = RecoveryId::from_i32((link[0].wrapping_sub(27) & 0x03) as i32)?;
    let sig = RecoverableSignature::from_compact(&link[1..], rec_id)?;

    let digest = Message::from_digest(sha256(&prev.serialize()));

    Ok(SECP.recover_ecdsa(&digest, &sig)?)
}
