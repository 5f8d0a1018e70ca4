// Copyright (c) 2024-2025 The Tapcard Developers

//! Per-command session key and verification code encryption
//!
//! Authenticated commands carry the user's verification code XOR-masked
//! under a key derived from an ephemeral Diffie-Hellman exchange with the
//! card. The same session key later unmasks the encrypted field in the
//! card's response.

use rand_core::OsRng;
use secp256k1::{ecdh::SharedSecret, PublicKey, SecretKey};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{error::Error, CARD_NONCE_SIZE, SECP};

/// Minimum verification code length
pub const CVC_MIN_LENGTH: usize = 6;

/// Maximum verification code length
pub const CVC_MAX_LENGTH: usize = 32;

/// Symmetric key shared with the card for a single authenticated command
#[derive(Clone, PartialEq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; 32]);

impl SessionKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for SessionKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl core::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Key material stays out of logs
        f.write_str("SessionKey(..)")
    }
}

/// Ephemeral public key and encrypted verification code sent alongside an
/// authenticated command
#[derive(Clone, Debug, PartialEq)]
pub struct AuthPayload {
    pub epubkey: PublicKey,
    pub xcvc: Vec<u8>,
}

/// Derive the session key and encrypted verification code for a command.
///
/// A fresh ephemeral keypair is generated on every call; reusing one
/// across commands would correlate session keys and is not supported by
/// this API. The returned [`SessionKey`] decrypts the encrypted field of
/// the card's response to this command.
pub fn calc_xcvc(
    cmd: &str,
    card_nonce: &[u8; CARD_NONCE_SIZE],
    card_pubkey: &PublicKey,
    cvc: &[u8],
) -> Result<(SessionKey, AuthPayload), Error> {
    let ephemeral = SecretKey::new(&mut OsRng);

    calc_xcvc_with(cmd, card_nonce, card_pubkey, cvc, &ephemeral)
}

/// Deterministic inner derivation, exercised directly by tests
pub(crate) fn calc_xcvc_with(
    cmd: &str,
    card_nonce: &[u8; CARD_NONCE_SIZE],
    card_pubkey: &PublicKey,
    cvc: &[u8],
    ephemeral: &SecretKey,
) -> Result<(SessionKey, AuthPayload), Error> {
    if cvc.len() < CVC_MIN_LENGTH || cvc.len() > CVC_MAX_LENGTH {
        return Err(Error::InvalidInput("verification code must be 6..=32 bytes"));
    }

    let epubkey = ephemeral.public_key(&SECP);

    // Hashed ECDH shared secret with the card's long-term key
    let session_key = SessionKey(SharedSecret::new(card_pubkey, ephemeral).secret_bytes());

    // Mask digest binds the card nonce and the command name
    let mut md = Sha256::new();
    md.update(card_nonce);
    md.update(cmd.as_bytes());
    let md: [u8; 32] = md.finalize().into();

    let mut mask: Vec<u8> = session_key
        .0
        .iter()
        .zip(md.iter())
        .map(|(a, b)| a ^ b)
        .take(cvc.len())
        .collect();

    let xcvc = cvc.iter().zip(mask.iter()).map(|(c, m)| c ^ m).collect();
    mask.zeroize();

    Ok((session_key, AuthPayload { epubkey, xcvc }))
}
