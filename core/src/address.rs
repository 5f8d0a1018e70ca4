// Copyright (c) 2024-2025 The Tapcard Developers

//! Payment address rendering and first-child re-derivation
//!
//! Addresses are segwit v0 over the 20 byte key hash. Re-derivation takes
//! a chain code and master key reported by the card, derives the first
//! non-hardened child the card is expected to use, and renders its
//! address so the host can compare against the card's claim.

use bech32::{hrp, segwit};
use byteorder::{BigEndian, ByteOrder};
use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use secp256k1::{PublicKey, Scalar, SecretKey};
use sha2::{Digest, Sha256, Sha512};
use strum::{Display, EnumString};

use crate::{error::Error, SECP};

type HmacSha512 = Hmac<Sha512>;

/// Network selecting the address human readable prefix
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Network {
    Main,
    Test,
}

/// RIPEMD-160 over SHA-256, the address hash
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

/// Normalize a caller supplied key to a compressed public key.
///
/// A 32 byte private scalar is accepted in place of a 33 byte public key
/// and converted first.
fn normalize_pubkey(key: &[u8]) -> Result<PublicKey, Error> {
    match key.len() {
        33 => Ok(PublicKey::from_slice(key)?),
        32 => Ok(SecretKey::from_slice(key)?.public_key(&SECP)),
        _ => Err(Error::InvalidInput("key must be 32 or 33 bytes")),
    }
}

/// Render a key as a segwit v0 payment address
pub fn render_address(key: &[u8], network: Network) -> Result<String, Error> {
    let pubkey = normalize_pubkey(key)?;
    let program = hash160(&pubkey.serialize());

    let hrp = match network {
        Network::Main => hrp::BC,
        Network::Test => hrp::TB,
    };

    segwit::encode_v0(hrp, &program).map_err(|_| Error::InvalidInput("address encoding failed"))
}

/// Derive the first non-hardened child of a master key and render it.
///
/// Returns the address the card is expected to reproduce along with the
/// derived child key, for comparison before any private material is
/// exposed.
pub fn rederive_address(
    chain_code: &[u8; 32],
    master: &[u8],
    network: Network,
) -> Result<(String, PublicKey), Error> {
    let master = normalize_pubkey(master)?;

    // CKDpub for child index zero
    let mut mac = HmacSha512::new_from_slice(chain_code)
        .map_err(|_| Error::InvalidInput("bad chain code"))?;
    let mut data = [0u8; 37];
    data[..33].copy_from_slice(&master.serialize());
    BigEndian::write_u32(&mut data[33..], 0);
    mac.update(&data);
    let i = mac.finalize().into_bytes();

    let mut tweak = [0u8; 32];
    tweak.copy_from_slice(&i[..32]);
    let tweak =
        Scalar::from_be_bytes(tweak).map_err(|_| Error::InvalidInput("derivation tweak invalid"))?;

    let child = master.add_exp_tweak(&SECP, &tweak)?;
    let address = render_address(&child.serialize(), network)?;

    Ok((address, child))
}

#[cfg(test)]
mod test {
    use super::*;

    // Generator point key, the classic segwit v0 vector
    const VECTOR_SECKEY: [u8; 32] = {
        let mut k = [0u8; 32];
        k[31] = 1;
        k
    };
    const VECTOR_ADDR: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    #[test]
    fn known_vector() {
        let addr = render_address(&VECTOR_SECKEY, Network::Main).unwrap();
        assert_eq!(addr, VECTOR_ADDR);
    }

    #[test]
    fn private_scalar_matches_public_key() {
        let seckey = SecretKey::from_slice(&VECTOR_SECKEY).unwrap();
        let pubkey = seckey.public_key(&SECP);

        let from_sec = render_address(&VECTOR_SECKEY, Network::Main).unwrap();
        let from_pub = render_address(&pubkey.serialize(), Network::Main).unwrap();
        assert_eq!(from_sec, from_pub);

        // Test network only changes the prefix
        let test_addr = render_address(&pubkey.serialize(), Network::Test).unwrap();
        assert!(test_addr.starts_with("tb1q"));
        assert_ne!(test_addr, from_pub);
    }

    #[test]
    fn rejects_odd_key_lengths() {
        let e = render_address(&[0u8; 31], Network::Main).unwrap_err();
        assert!(matches!(e, Error::InvalidInput(_)));
    }

    #[test]
    fn rederivation_is_deterministic() {
        let (_, master) = SECP.generate_keypair(&mut rand::thread_rng());
        let chain_code = [0x17; 32];

        let (addr_a, child_a) =
            rederive_address(&chain_code, &master.serialize(), Network::Main).unwrap();
        let (addr_b, child_b) =
            rederive_address(&chain_code, &master.serialize(), Network::Main).unwrap();

        assert_eq!(addr_a, addr_b);
        assert_eq!(child_a, child_b);
        assert_ne!(child_a, master);

        // Different chain code, different child
        let (addr_c, _) = rederive_address(&[0x18; 32], &master.serialize(), Network::Main).unwrap();
        assert_ne!(addr_a, addr_c);
    }

    #[test]
    fn rederivation_accepts_private_master() {
        let seckey = SecretKey::new(&mut rand::thread_rng());
        let pubkey = seckey.public_key(&SECP);
        let chain_code = [0x2b; 32];

        let (from_sec, _) =
            rederive_address(&chain_code, &seckey.secret_bytes(), Network::Main).unwrap();
        let (from_pub, _) =
            rederive_address(&chain_code, &pubkey.serialize(), Network::Main).unwrap();

        assert_eq!(from_sec, from_pub);
    }
}
