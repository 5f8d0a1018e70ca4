// Copyright (c) 2024-2025 The Tapcard Developers

//! Transport seam for card communication
//!
//! Only the byte level exchange is defined here; PC/SC, NFC and emulator
//! implementations live in their own crates. The transport is expected to
//! have selected the card applet before the first exchange.

use async_trait::async_trait;
use log::trace;
use serde::{de::DeserializeOwned, Serialize};

use crate::{proto::ErrorResponse, Error};

/// APDU class and instruction wrapping protocol CBOR bodies
const APDU_CLA: u8 = 0x00;
const APDU_INS: u8 = 0xcb;

/// Raw APDU exchange with a card
#[async_trait]
pub trait CardTransport {
    /// Transmit a request APDU and return the raw response bytes
    async fn exchange(&self, apdu: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Encode a command, exchange it, decode the typed response.
///
/// Card-reported error maps are surfaced as [`Error::Card`] before any
/// attempt to decode the expected response shape.
pub(crate) async fn transmit<T, C, R>(transport: &T, command: &C) -> Result<R, Error>
where
    T: CardTransport + ?Sized,
    C: Serialize,
    R: DeserializeOwned,
{
    let body = serde_cbor::to_vec(command)?;
    if body.len() > 0xff {
        return Err(Error::Transport("command exceeds apdu capacity".into()));
    }

    let mut apdu = Vec::with_capacity(5 + body.len());
    apdu.extend_from_slice(&[APDU_CLA, APDU_INS, 0x00, 0x00, body.len() as u8]);
    apdu.extend_from_slice(&body);

    trace!("request apdu: {}", hex::encode(&apdu));

    let raw = transport.exchange(&apdu).await?;

    trace!("response: {}", hex::encode(&raw));

    if let Ok(e) = serde_cbor::from_slice::<ErrorResponse>(&raw) {
        return Err(Error::Card {
            msg: e.error,
            code: e.code,
        });
    }

    Ok(serde_cbor::from_slice(&raw)?)
}
