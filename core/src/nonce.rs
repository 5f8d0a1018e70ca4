// Copyright (c) 2024-2025 The Tapcard Developers

//! Host side challenge nonce generation

use rand_core::{CryptoRng, OsRng, RngCore};

use crate::{error::Error, USER_NONCE_SIZE};

/// Attempts before concluding the entropy source is suspect
const NONCE_RETRIES: usize = 3;

/// Pick a fresh challenge nonce from the system entropy source.
///
/// Nonces must be regenerated for every operation and never reused across
/// two message constructions.
pub fn pick_nonce() -> Result<[u8; USER_NONCE_SIZE], Error> {
    pick_nonce_with(&mut OsRng)
}

/// Pick a fresh challenge nonce from the provided generator.
///
/// Degenerate draws (first byte equal to the last, or fewer than two
/// distinct byte values) are rejected and retried a bounded number of
/// times. Exhausting the retries means the randomness source itself is
/// suspect and is reported as [`Error::WeakNonce`] rather than returning
/// a weak value.
pub fn pick_nonce_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<[u8; USER_NONCE_SIZE], Error> {
    let mut nonce = [0u8; USER_NONCE_SIZE];

    for _ in 0..NONCE_RETRIES {
        rng.fill_bytes(&mut nonce);

        if !is_degenerate(&nonce) {
            return Ok(nonce);
        }
    }

    Err(Error::WeakNonce)
}

fn is_degenerate(buf: &[u8]) -> bool {
    let mut seen = [false; 256];
    let mut distinct = 0usize;

    for b in buf {
        if !seen[*b as usize] {
            seen[*b as usize] = true;
            distinct += 1;
        }
    }

    buf[0] == buf[buf.len() - 1] || distinct < 2
}

#[cfg(test)]
mod test {
    use super::*;

    /// Generator returning a fixed byte, never acceptable as a nonce
    struct FixedRng(u8);

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            u32::from_le_bytes([self.0; 4])
        }

        fn next_u64(&mut self) -> u64 {
            u64::from_le_bytes([self.0; 8])
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(self.0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for FixedRng {}

    #[test]
    fn nonce_from_system_rng() {
        let a = pick_nonce().unwrap();
        let b = pick_nonce().unwrap();

        assert_ne!(a, b, "nonces must differ across calls");
        assert!(!is_degenerate(&a));
    }

    #[test]
    fn degenerate_source_is_fatal() {
        let mut rng = FixedRng(0x41);

        assert_eq!(pick_nonce_with(&mut rng), Err(Error::WeakNonce));
    }

    #[test]
    fn degenerate_patterns() {
        // All identical bytes
        assert!(is_degenerate(&[7u8; USER_NONCE_SIZE]));

        // First byte matching the last
        let mut buf = [0u8; USER_NONCE_SIZE];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = i as u8;
        }
        buf[USER_NONCE_SIZE - 1] = buf[0];
        assert!(is_degenerate(&buf));

        // Distinct first and last with mixed content
        buf[USER_NONCE_SIZE - 1] = 0xff;
        assert!(!is_degenerate(&buf));
    }
}
