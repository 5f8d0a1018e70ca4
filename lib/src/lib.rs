// Copyright (c) 2024-2025 The Tapcard Developers

//! Tap card host interface library
//!
//! Drives the authentication flows against a connected card: status,
//! certificate fetch, challenge / response, slot reads and derivation
//! checks. Commands and responses are CBOR maps exchanged through a
//! [`CardTransport`]; all cryptographic verification is delegated to
//! [`tapcard-core`][tapcard_core].
//!
//! Transport implementations (PC/SC readers, phone NFC, emulators) live
//! outside this crate and only need to move raw APDU bytes, including the
//! initial applet selection.

/// Re-export the verification engine for consumers
pub use tapcard_core as engine;

mod error;
pub use error::Error;

pub mod proto;

mod transport;
pub use transport::CardTransport;

mod handle;
pub use handle::CardHandle;
