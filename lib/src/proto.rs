// Copyright (c) 2024-2025 The Tapcard Developers

//! Protocol objects exchanged with a card
//!
//! Every command is a CBOR map carrying a `cmd` tag; responses are CBOR
//! maps whose fields depend on the command. Responses to nonce-consuming
//! commands include a fresh `card_nonce` for the next exchange.

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

use tapcard_core::{CardMode, Network};

/// Request the card's current state
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusCommand {
    cmd: &'static str,
}

impl StatusCommand {
    pub fn new() -> Self {
        Self { cmd: "status" }
    }
}

impl Default for StatusCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch the card's certificate chain
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CertsCommand {
    cmd: &'static str,
}

impl CertsCommand {
    pub fn new() -> Self {
        Self { cmd: "certs" }
    }
}

/// Challenge the card to sign the host nonce
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckCommand {
    cmd: &'static str,
    nonce: ByteBuf,
}

impl CheckCommand {
    pub fn new(nonce: &[u8]) -> Self {
        Self {
            cmd: "check",
            nonce: ByteBuf::from(nonce),
        }
    }
}

/// Read the attested key of the active slot.
///
/// Signer cards require the session payload; payment slot cards answer
/// the bare form.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReadCommand {
    cmd: &'static str,
    nonce: ByteBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    epubkey: Option<ByteBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    xcvc: Option<ByteBuf>,
}

impl ReadCommand {
    pub fn new(nonce: &[u8]) -> Self {
        Self {
            cmd: "read",
            nonce: ByteBuf::from(nonce),
            epubkey: None,
            xcvc: None,
        }
    }

    pub fn authenticated(nonce: &[u8], epubkey: &[u8; 33], xcvc: &[u8]) -> Self {
        Self {
            cmd: "read",
            nonce: ByteBuf::from(nonce),
            epubkey: Some(ByteBuf::from(&epubkey[..])),
            xcvc: Some(ByteBuf::from(xcvc)),
        }
    }
}

/// Request the active slot's chain code and master key attestation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeriveCommand {
    cmd: &'static str,
    nonce: ByteBuf,
}

impl DeriveCommand {
    pub fn new(nonce: &[u8]) -> Self {
        Self {
            cmd: "derive",
            nonce: ByteBuf::from(nonce),
        }
    }
}

/// Card state response
#[derive(Clone, Debug, Deserialize)]
pub struct StatusResponse {
    /// Protocol version
    pub proto: u8,
    /// Applet version string
    pub ver: String,
    /// Birth block / provisioning epoch
    pub birth: u32,
    /// (active, total) payment slots, absent on signer cards
    #[serde(default)]
    pub slots: Option<(u8, u8)>,
    /// Redacted address of the active slot, absent on signer cards
    #[serde(default)]
    pub addr: Option<String>,
    /// Set when the card is a hierarchical signer
    #[serde(default)]
    pub signer: Option<bool>,
    /// Signer derivation path, when one is set
    #[serde(default)]
    pub path: Option<Vec<u32>>,
    /// Set on test network cards
    #[serde(default)]
    pub testnet: Option<bool>,
    /// Card's long-term public key
    pub pubkey: ByteBuf,
    /// Rotating nonce for the next authenticated exchange
    pub card_nonce: ByteBuf,
}

impl StatusResponse {
    pub fn mode(&self) -> CardMode {
        match self.signer {
            Some(true) => CardMode::Signer,
            _ => CardMode::Cash,
        }
    }

    pub fn network(&self) -> Network {
        match self.testnet {
            Some(true) => Network::Test,
            _ => Network::Main,
        }
    }

    /// Active slot index, zero for signer cards
    pub fn active_slot(&self) -> u8 {
        self.slots.map(|(active, _)| active).unwrap_or(0)
    }
}

/// Certificate chain response
#[derive(Clone, Debug, Deserialize)]
pub struct CertsResponse {
    /// Ordered chain of recovery signatures, card first
    pub cert_chain: Vec<ByteBuf>,
}

/// Challenge response
#[derive(Clone, Debug, Deserialize)]
pub struct CheckResponse {
    /// Signature over the nonce-bound challenge message
    pub auth_sig: ByteBuf,
    pub card_nonce: ByteBuf,
}

/// Slot read response
#[derive(Clone, Debug, Deserialize)]
pub struct ReadResponse {
    /// Attested key, XOR-masked on signer cards
    pub pubkey: ByteBuf,
    /// Signature proving possession of the attested key
    pub sig: ByteBuf,
    pub card_nonce: ByteBuf,
}

/// Derivation attestation response
#[derive(Clone, Debug, Deserialize)]
pub struct DeriveResponse {
    /// Chain code the derived key is bound to
    pub chain_code: ByteBuf,
    /// Master key of the active slot
    pub master_pubkey: ByteBuf,
    /// Signature binding chain code and nonces to the master key
    pub sig: ByteBuf,
    pub card_nonce: ByteBuf,
}

/// Error map returned by the card in place of a response
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}
