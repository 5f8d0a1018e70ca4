// Copyright (c) 2024-2025 The Tapcard Developers

//! Human readable card identity fingerprint

use data_encoding::BASE32;
use sha2::{Digest, Sha256};

/// Render the stable identity label for a card's public key.
///
/// Base-32 of the key hash, grouped `XXXXX-XXXXX-XXXXX-XXXXX` for
/// display. Not a secret, deterministic per card.
pub fn card_ident(card_pubkey: &[u8; 33]) -> String {
    let md = BASE32.encode(&Sha256::digest(card_pubkey));

    let mut ident = String::with_capacity(23);
    for (i, c) in md.chars().take(20).enumerate() {
        if i > 0 && i % 5 == 0 {
            ident.push('-');
        }
        ident.push(c);
    }

    ident
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ident_shape() {
        let ident = card_ident(&[0x02; 33]);

        assert_eq!(ident.len(), 23);
        for (i, c) in ident.chars().enumerate() {
            if i % 6 == 5 {
                assert_eq!(c, '-');
            } else {
                assert!(c.is_ascii_uppercase() || ('2'..='7').contains(&c));
            }
        }
    }

    #[test]
    fn ident_is_deterministic() {
        let a = card_ident(&[0x03; 33]);
        let b = card_ident(&[0x03; 33]);
        let c = card_ident(&[0x02; 33]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
