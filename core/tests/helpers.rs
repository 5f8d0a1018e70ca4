//! Shared helpers emulating the card side of the protocol
#![allow(dead_code)]

use sha2::{Digest, Sha256};

use tapcard_core::secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use tapcard_core::FactoryRootKeys;

/// Factory issuing authority: a root key and an intermediate batch key
pub struct TestAuthority {
    secp: Secp256k1<tapcard_core::secp256k1::All>,
    root_seckey: SecretKey,
    pub root_pubkey: PublicKey,
    batch_seckey: SecretKey,
    pub batch_pubkey: PublicKey,
}

impl TestAuthority {
    pub fn new() -> Self {
        let secp = Secp256k1::new();
        let (root_seckey, root_pubkey) = secp.generate_keypair(&mut rand::thread_rng());
        let (batch_seckey, batch_pubkey) = secp.generate_keypair(&mut rand::thread_rng());

        Self {
            secp,
            root_seckey,
            root_pubkey,
            batch_seckey,
            batch_pubkey,
        }
    }

    /// Trusted root set containing only this authority's root
    pub fn roots(&self) -> FactoryRootKeys {
        FactoryRootKeys::new(vec![self.root_pubkey])
    }

    /// Issue the two link chain root -> batch -> card
    pub fn certify(&self, card_pubkey: &PublicKey) -> Vec<[u8; 65]> {
        vec![
            self.sign_link(&self.batch_seckey, card_pubkey),
            self.sign_link(&self.root_seckey, &self.batch_pubkey),
        ]
    }

    /// Recoverable signature over the hash of the subject key
    pub fn sign_link(&self, signer: &SecretKey, subject: &PublicKey) -> [u8; 65] {
        let digest: [u8; 32] = Sha256::digest(subject.serialize()).into();
        let msg = Message::from_digest(digest);

        let (id, compact) = self
            .secp
            .sign_ecdsa_recoverable(&msg, signer)
            .serialize_compact();

        let mut link = [0u8; 65];
        link[0] = 31 + id.to_i32() as u8;
        link[1..].copy_from_slice(&compact);
        link
    }
}

/// Compact signature over the hash of an authentication message
pub fn sign_auth(seckey: &SecretKey, msg: &[u8]) -> [u8; 64] {
    let secp = Secp256k1::new();
    let digest: [u8; 32] = Sha256::digest(msg).into();

    secp.sign_ecdsa(&Message::from_digest(digest), seckey)
        .serialize_compact()
}

/// Flip a link's recovery id between the two valid parities, the smallest
/// single byte mutation that still recovers a key
pub fn flip_link_parity(link: &mut [u8; 65]) {
    let rec_id = (link[0] - 27) & 0x03;
    link[0] = if rec_id == 0 { link[0] + 1 } else { link[0] - 1 };
}
