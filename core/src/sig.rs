// Copyright (c) 2024-2025 The Tapcard Developers

//! Recoverable signature reconstruction
//!
//! Cards return 64 byte non-recoverable signatures; downstream consumers
//! want the 65 byte recoverable form. The recovery id is not transmitted,
//! so it is rediscovered by trying all four candidates against the
//! expected key or address.

use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey,
};

use crate::{
    address::{render_address, Network},
    error::Error,
    SECP,
};

/// Base value for the recovery header byte on reconstructed signatures
const SIG_HEADER_BASE: u8 = 39;

/// Reconstruct the recoverable form of a card signature.
///
/// Tries recovery id candidates 0..=3 in order. Curve parity makes ids 2
/// and 3 invalid for almost all signatures, so recovery failures there
/// are skipped; a failure for id 0 or 1 is a real error and propagates.
/// A candidate is accepted only when it satisfies every supplied
/// constraint: exact match on `expect_pubkey`, and the rendered address
/// ending with `expect_addr`.
pub fn make_recoverable(
    digest: &[u8; 32],
    sig: &[u8; 64],
    expect_addr: Option<&str>,
    expect_pubkey: Option<&PublicKey>,
    network: Network,
) -> Result<[u8; 65], Error> {
    let msg = Message::from_digest(*digest);

    for rec_id in 0..4i32 {
        let id = RecoveryId::from_i32(rec_id)?;
        let rsig = RecoverableSignature::from_compact(sig, id)?;

        let pubkey = match SECP.recover_ecdsa(&msg, &rsig) {
            Ok(pk) => pk,
            Err(_) if rec_id >= 2 => continue,
            Err(e) => return Err(e.into()),
        };

        if let Some(expect) = expect_pubkey {
            if *expect != pubkey {
                continue;
            }
        }

        if let Some(addr) = expect_addr {
            let derived = render_address(&pubkey.serialize(), network)?;
            if !derived.ends_with(addr) {
                continue;
            }
        }

        let mut out = [0u8; 65];
        out[0] = SIG_HEADER_BASE + rec_id as u8;
        out[1..].copy_from_slice(sig);
        return Ok(out);
    }

    Err(Error::SignatureRecovery)
}

/// Recover the signing key from a 65 byte headered signature.
///
/// The leading byte encodes the recovery id as `(byte - 27) & 3`,
/// accepting any of the conventional header base values.
pub fn sig_to_pubkey(digest: &[u8; 32], sig: &[u8; 65]) -> Result<PublicKey, Error> {
    let rec_id = RecoveryId::from_i32((sig[0].wrapping_sub(27) & 0x03) as i32)?;
    let rsig = RecoverableSignature::from_compact(&sig[1..], rec_id)?;

    Ok(SECP.recover_ecdsa(&Message::from_digest(*digest), &rsig)?)
}
