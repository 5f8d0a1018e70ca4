// Copyright (c) 2024-2025 The Tapcard Developers

//! Tap card authentication and verification engine
//!
//! This implements the host side of the card authentication protocol:
//! session key derivation for command encryption, certificate chain
//! verification to a trusted factory root, challenge / response nonce
//! handling, recovery of keys and payment addresses from encrypted card
//! responses, and address re-derivation used as an anti-counterfeiting
//! check.
//!
//! Everything here is a synchronous pure function over explicit byte
//! inputs. Exchanging command and response frames with a physical card is
//! the job of a transport (see the `tapcard` crate); elliptic curve
//! operations are delegated to [secp256k1] and text encodings to the
//! `bech32` / `data-encoding` crates.
//!
//! ## Operations
//!
//! Before issuing an authenticated command the host derives a per-command
//! session key and encrypted verification code with
//! [`calc_xcvc`][session::calc_xcvc].
//!
//! After receiving responses the host:
//!
//! 1. checks the card's certificate chain against the factory root set
//!    with [`verify_authority`][certs::verify_authority],
//! 2. recovers the attested key or payment address with
//!    [`recover_pubkey`][recover::recover_pubkey] /
//!    [`recover_address`][recover::recover_address], proving the card
//!    holds the corresponding private key,
//! 3. optionally confirms a promised derivation with
//!    [`verify_master_pubkey`][recover::verify_master_pubkey] and
//!    [`rederive_address`][address::rederive_address].
//!
//! Any failure is surfaced as a typed [`Error`]; verification failures are
//! never downgraded or retried here. Security relevant rejections can be
//! distinguished with [`Error::is_counterfeit`] so hosts can present a
//! strong warning rather than a generic error.

use once_cell::sync::Lazy;
use secp256k1::{All, Secp256k1};

// Re-export the curve implementation for consumers and tests
pub use secp256k1;

pub mod address;
pub mod certs;
pub mod error;
pub mod ident;
pub mod message;
pub mod nonce;
pub mod path;
pub mod recover;
pub mod session;
pub mod sig;

pub use address::{hash160, rederive_address, render_address, Network};
pub use certs::{verify_authority, FactoryRootKeys};
pub use error::Error;
pub use ident::card_ident;
pub use message::{auth_message, AuthContext, AUTH_PREFIX};
pub use nonce::{pick_nonce, pick_nonce_with};
pub use path::{path2str, str2path, HARDENED};
pub use recover::{
    match_redacted_address, recover_address, recover_pubkey, verify_master_pubkey, CardMode,
    RecoveredAddress, ADDR_TRIM,
};
pub use session::{calc_xcvc, AuthPayload, SessionKey, CVC_MAX_LENGTH, CVC_MIN_LENGTH};
pub use sig::{make_recoverable, sig_to_pubkey};

/// Length of the rotating nonce supplied by the card in each response
pub const CARD_NONCE_SIZE: usize = 16;

/// Length of the host-side challenge nonce
pub const USER_NONCE_SIZE: usize = 16;

/// Process wide secp256k1 context
pub(crate) static SECP: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);
