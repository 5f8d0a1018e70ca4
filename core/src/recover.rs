// Copyright (c) 2024-2025 The Tapcard Developers

//! Recovery of attested keys and addresses from card responses
//!
//! Both variants follow one pattern: take an encrypted or plaintext field
//! from a read response, then confirm the card signed a nonce-bound
//! message with the key it just revealed. Possession of the private key is
//! proven without it ever leaving the card.

use log::debug;
use secp256k1::{ecdsa::Signature, Message, PublicKey};
use strum::{Display, EnumString};

use crate::{
    address::{render_address, Network},
    error::Error,
    message::{auth_message, sha256, AuthContext},
    session::SessionKey,
    CARD_NONCE_SIZE, SECP, USER_NONCE_SIZE,
};

/// Number of address characters compared on each side of the redaction
pub const ADDR_TRIM: usize = 12;

/// Operating personality reported by a card
#[derive(Copy, Clone, Debug, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CardMode {
    /// Hierarchical signing key protected by a verification code
    Signer,
    /// Sealed payment slots with on-card addresses
    Cash,
}

/// Key and rendered address recovered from a payment slot
#[derive(Clone, Debug, PartialEq)]
pub struct RecoveredAddress {
    pub pubkey: PublicKey,
    pub address: String,
}

/// Unmask and verify the key attested by a signer card's read response.
///
/// Bytes after the leading parity byte arrive XOR-masked with the session
/// key established for the read command. The card must have signed the
/// nonce-bound message with the unmasked key.
pub fn recover_pubkey(
    mode: CardMode,
    card_nonce: &[u8; CARD_NONCE_SIZE],
    host_nonce: &[u8; USER_NONCE_SIZE],
    masked_pubkey: &[u8; 33],
    sig: &[u8; 64],
    session_key: &SessionKey,
) -> Result<PublicKey, Error> {
    if mode != CardMode::Signer {
        return Err(Error::WrongDeviceType);
    }

    // Undo the response mask, the parity byte is sent in the clear
    let mut unmasked = [0u8; 33];
    unmasked[0] = masked_pubkey[0];
    for (i, b) in masked_pubkey[1..].iter().enumerate() {
        unmasked[i + 1] = b ^ session_key.as_bytes()[i];
    }
    let pubkey = PublicKey::from_slice(&unmasked)?;

    let msg = auth_message(card_nonce, host_nonce, AuthContext::Slot(0))?;
    let digest = Message::from_digest(sha256(&msg));

    let sig = Signature::from_compact(sig)?;
    SECP.verify_ecdsa(&digest, &sig, &pubkey)
        .map_err(|_| Error::ProofOfPossession)?;

    debug!("recovered signer card key");

    Ok(pubkey)
}

/// Verify the key attested by a payment slot and its rendered address.
///
/// The card reports a partially redacted address in its status response;
/// the address rendered from the proven key must reproduce the visible
/// prefix and suffix exactly. This is the anti-counterfeiting check, so
/// every mismatch is [`Error::CounterfeitDevice`], distinct from ordinary
/// validation failures.
#[allow(clippy::too_many_arguments)]
pub fn recover_address(
    mode: CardMode,
    card_nonce: &[u8; CARD_NONCE_SIZE],
    host_nonce: &[u8; USER_NONCE_SIZE],
    slot: u8,
    expect_addr: &str,
    pubkey: &[u8; 33],
    sig: &[u8; 64],
    network: Network,
) -> Result<RecoveredAddress, Error> {
    if mode != CardMode::Cash {
        return Err(Error::WrongDeviceType);
    }

    let msg = auth_message(card_nonce, host_nonce, AuthContext::Slot(slot))?;
    let digest = Message::from_digest(sha256(&msg));

    let pubkey = PublicKey::from_slice(pubkey)?;
    let sig = Signature::from_compact(sig)?;
    SECP.verify_ecdsa(&digest, &sig, &pubkey)
        .map_err(|_| Error::ProofOfPossession)?;

    let address = render_address(&pubkey.serialize(), network)?;
    match_redacted_address(expect_addr, &address)?;

    debug!("recovered slot address matching card report");

    Ok(RecoveredAddress { pubkey, address })
}

/// Compare a derived address against the card's partially redacted report.
///
/// The redacted form keeps a prefix and a suffix around a separator run;
/// both windows must be exactly [`ADDR_TRIM`] characters and match the
/// derived address at their respective ends.
pub fn match_redacted_address(expect_addr: &str, derived: &str) -> Result<(), Error> {
    let (left, right) = match (expect_addr.find('_'), expect_addr.rfind('_')) {
        (Some(l), Some(r)) => (&expect_addr[..l], &expect_addr[r + 1..]),
        _ => {
            return Err(Error::CounterfeitDevice(
                "reported address is not in redacted form",
            ))
        }
    };

    if left.len() != ADDR_TRIM || right.len() != ADDR_TRIM {
        return Err(Error::CounterfeitDevice(
            "redacted address windows violate trim policy",
        ));
    }

    if !derived.starts_with(left) || !derived.ends_with(right) {
        return Err(Error::CounterfeitDevice(
            "derived address does not match card report",
        ));
    }

    Ok(())
}

/// Verify a card's master key attestation bound to its chain code.
///
/// Used before any derived-key operation: the card proves possession of
/// the master key it promises to derive from, with the chain code framed
/// into the signed message.
pub fn verify_master_pubkey(
    master_pubkey: &[u8; 33],
    sig: &[u8; 64],
    chain_code: &[u8; 32],
    card_nonce: &[u8; CARD_NONCE_SIZE],
    host_nonce: &[u8; USER_NONCE_SIZE],
) -> Result<PublicKey, Error> {
    let msg = auth_message(card_nonce, host_nonce, AuthContext::ChainCode(chain_code))?;
    let digest = Message::from_digest(sha256(&msg));

    let pubkey = PublicKey::from_slice(master_pubkey)?;
    let sig = Signature::from_compact(sig)?;
    SECP.verify_ecdsa(&digest, &sig, &pubkey)
        .map_err(|_| Error::ProofOfPossession)?;

    Ok(pubkey)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn redacted_window_policy() {
        let derived = "bc1q7h3snp3slg6yrjkkmzye5gjtl35kvqtsankmxf";
        let left = &derived[..ADDR_TRIM];
        let right = &derived[derived.len() - ADDR_TRIM..];

        // Matching windows
        let expect = format!("{left}___{right}");
        assert!(match_redacted_address(&expect, derived).is_ok());

        // Window narrower than policy
        let expect = format!("{}___{right}", &left[..ADDR_TRIM - 1]);
        assert!(match_redacted_address(&expect, derived).unwrap_err().is_counterfeit());

        // No redaction separators at all
        assert!(match_redacted_address(derived, derived).unwrap_err().is_counterfeit());

        // Mismatched suffix
        let expect = format!("{left}___qqqqqqqqqqqq");
        assert!(match_redacted_address(&expect, derived).unwrap_err().is_counterfeit());
    }
}
