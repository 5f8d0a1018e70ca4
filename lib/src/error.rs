// Copyright (c) 2024-2025 The Tapcard Developers

/// Tap card host API error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Verification failure from the core engine
    #[error(transparent)]
    Verify(#[from] tapcard_core::Error),

    /// Error reported by the card itself
    #[error("card error: {msg} (code {code})")]
    Card { msg: String, code: u16 },

    /// CBOR encode / decode failure
    #[error("cbor: {0}")]
    Cbor(#[from] serde_cbor::Error),

    /// Transport failure
    #[error("transport: {0}")]
    Transport(String),

    /// Response shape did not match the issued command
    #[error("unexpected response")]
    UnexpectedResponse,
}

impl Error {
    /// True when the failure means the device is counterfeit rather than
    /// misbehaving, hosts must present these as a hard rejection.
    pub fn is_counterfeit(&self) -> bool {
        matches!(self, Error::Verify(e) if e.is_counterfeit())
    }
}
