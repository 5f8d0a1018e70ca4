// Copyright (c) 2024-2025 The Tapcard Developers

/// Verification engine errors
#[derive(Clone, PartialEq, Debug, thiserror::Error)]
pub enum Error {
    /// Framed message length mismatch, nothing may be signed or verified
    #[error("framed message length mismatch (actual: {actual}, expected: {expected})")]
    Framing { actual: usize, expected: usize },

    /// Caller supplied value out of contract
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Entropy source produced degenerate nonces on every attempt
    #[error("weak nonce entropy, randomness source suspect")]
    WeakNonce,

    /// Card authentication signature failed verification
    #[error("card authentication signature check failed")]
    BadAuthSignature,

    /// Card could not prove possession of the key it revealed
    #[error("card failed proof of key possession")]
    ProofOfPossession,

    /// Certificate chain shorter than the protocol minimum
    #[error("certificate chain too short")]
    ChainTooShort,

    /// Certificate or address verification failed, device is not genuine
    #[error("counterfeit device: {0}")]
    CounterfeitDevice(&'static str),

    /// Operation invoked against an incompatible card mode
    #[error("operation not supported by this card type")]
    WrongDeviceType,

    /// No recovery id candidate satisfied the supplied constraints
    #[error("signature could not be matched to the expected key or address")]
    SignatureRecovery,

    /// Derivation path component outside the 31 bit range
    #[error("derivation path component out of range")]
    PathRange,

    /// Derivation path syntax violation
    #[error("malformed derivation path")]
    MalformedPath,

    /// Malformed key or signature material
    #[error("secp256k1: {0}")]
    Secp(#[from] secp256k1::Error),
}

impl Error {
    /// True for security relevant rejections which a host application must
    /// surface as a hard "device rejected" warning, never as a generic
    /// input or I/O error.
    pub fn is_counterfeit(&self) -> bool {
        matches!(self, Error::CounterfeitDevice(_))
    }
}
