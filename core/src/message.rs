// Copyright (c) 2024-2025 The Tapcard Developers

//! Fixed layout messages signed by card and host
//!
//! Every signature exchanged during authentication covers the same shape:
//! domain separation prefix, card nonce, host nonce, then an optional
//! context field binding the operation (slot index, sealed slot key or
//! chain code).

use sha2::{Digest, Sha256};

use crate::{error::Error, CARD_NONCE_SIZE, USER_NONCE_SIZE};

/// Domain separation prefix for all signed protocol messages
pub const AUTH_PREFIX: &[u8; 8] = b"OPENDIME";

/// Optional trailing context bound into an authentication message
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AuthContext<'a> {
    /// No additional context
    Bare,
    /// Single byte slot index
    Slot(u8),
    /// Public key of a sealed slot, attested before unsealing
    SealedKey(&'a [u8; 33]),
    /// Chain code binding a master key attestation
    ChainCode(&'a [u8; 32]),
}

impl AuthContext<'_> {
    fn encoded_len(&self) -> usize {
        match self {
            AuthContext::Bare => 0,
            AuthContext::Slot(_) => 1,
            AuthContext::SealedKey(_) => 33,
            AuthContext::ChainCode(_) => 32,
        }
    }
}

/// Build the message covered by an authentication signature.
///
/// Fields arrive pre-validated for length, the final concatenation is
/// still checked against the expected component sum before anything is
/// signed or verified with it.
pub fn auth_message(
    card_nonce: &[u8; CARD_NONCE_SIZE],
    host_nonce: &[u8; USER_NONCE_SIZE],
    context: AuthContext<'_>,
) -> Result<Vec<u8>, Error> {
    let expected = AUTH_PREFIX.len() + CARD_NONCE_SIZE + USER_NONCE_SIZE + context.encoded_len();

    let mut msg = Vec::with_capacity(expected);
    msg.extend_from_slice(AUTH_PREFIX);
    msg.extend_from_slice(card_nonce);
    msg.extend_from_slice(host_nonce);

    match context {
        AuthContext::Bare => (),
        AuthContext::Slot(s) => msg.push(s),
        AuthContext::SealedKey(k) => msg.extend_from_slice(&k[..]),
        AuthContext::ChainCode(c) => msg.extend_from_slice(&c[..]),
    }

    if msg.len() != expected {
        return Err(Error::Framing {
            actual: msg.len(),
            expected,
        });
    }

    Ok(msg)
}

/// SHA-256 helper shared by the verification modules
pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn message_layout() {
        let card_nonce = [0xaa; CARD_NONCE_SIZE];
        let host_nonce = [0xbb; USER_NONCE_SIZE];

        let msg = auth_message(&card_nonce, &host_nonce, AuthContext::Bare).unwrap();
        assert_eq!(msg.len(), 8 + CARD_NONCE_SIZE + USER_NONCE_SIZE);
        assert_eq!(&msg[..8], AUTH_PREFIX);
        assert_eq!(&msg[8..24], &card_nonce);
        assert_eq!(&msg[24..40], &host_nonce);
    }

    #[test]
    fn message_context_lengths() {
        let card_nonce = [1u8; CARD_NONCE_SIZE];
        let host_nonce = [2u8; USER_NONCE_SIZE];
        let sealed = [3u8; 33];
        let chain_code = [4u8; 32];

        let base = 8 + CARD_NONCE_SIZE + USER_NONCE_SIZE;

        let m = auth_message(&card_nonce, &host_nonce, AuthContext::Slot(7)).unwrap();
        assert_eq!(m.len(), base + 1);
        assert_eq!(m[base], 7);

        let m = auth_message(&card_nonce, &host_nonce, AuthContext::SealedKey(&sealed)).unwrap();
        assert_eq!(m.len(), base + 33);
        assert_eq!(&m[base..], &sealed);

        let m = auth_message(&card_nonce, &host_nonce, AuthContext::ChainCode(&chain_code)).unwrap();
        assert_eq!(m.len(), base + 32);
        assert_eq!(&m[base..], &chain_code);
    }
}
