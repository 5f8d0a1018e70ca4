// Copyright (c) 2024-2025 The Tapcard Developers

//! Handle for connected cards
//!
//! This caches the card state reported at connect time (rotating nonce,
//! card key, mode and network) and provides the authentication flows,
//! generic over [CardTransport].

use log::debug;

use tapcard_core::secp256k1::PublicKey;
use tapcard_core::{
    calc_xcvc, card_ident, pick_nonce, recover_address, recover_pubkey, rederive_address,
    verify_authority, verify_master_pubkey, CardMode, FactoryRootKeys, Network, RecoveredAddress,
    CARD_NONCE_SIZE,
};

use crate::{
    proto::{
        CertsCommand, CertsResponse, CheckCommand, CheckResponse, DeriveCommand, DeriveResponse,
        ReadCommand, ReadResponse, StatusCommand, StatusResponse,
    },
    transport::transmit,
    CardTransport, Error,
};

/// Handle for a connected card.
///
/// Every nonce-consuming command rotates the cached card nonce from its
/// response; verification failures surface immediately and are never
/// retried here.
pub struct CardHandle<T: CardTransport> {
    t: T,
    /// Rotating nonce from the last card response
    card_nonce: [u8; CARD_NONCE_SIZE],
    /// Card's long-term public key
    pubkey: PublicKey,
    mode: CardMode,
    network: Network,
    /// Redacted address reported for the active payment slot
    addr: Option<String>,
    active_slot: u8,
    roots: FactoryRootKeys,
}

impl<T: CardTransport> CardHandle<T> {
    /// Connect to a card, issuing an initial status request
    pub async fn connect(t: T) -> Result<Self, Error> {
        Self::connect_with(t, FactoryRootKeys::default()).await
    }

    /// Connect with a custom trusted factory root set
    pub async fn connect_with(t: T, roots: FactoryRootKeys) -> Result<Self, Error> {
        let status: StatusResponse = transmit(&t, &StatusCommand::new()).await?;

        debug!(
            "connected: proto {} ver {} mode {}",
            status.proto,
            status.ver,
            status.mode()
        );

        let pubkey =
            PublicKey::from_slice(&status.pubkey).map_err(tapcard_core::Error::from)?;

        Ok(Self {
            card_nonce: fixed(&status.card_nonce)?,
            pubkey,
            mode: status.mode(),
            network: status.network(),
            active_slot: status.active_slot(),
            addr: status.addr.clone(),
            roots,
            t,
        })
    }

    /// Card's long-term public key as reported at connect time
    pub fn pubkey(&self) -> &PublicKey {
        &self.pubkey
    }

    pub fn mode(&self) -> CardMode {
        self.mode
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Human readable fingerprint of the card key
    pub fn ident(&self) -> String {
        card_ident(&self.pubkey.serialize())
    }

    /// Verify the card's certificate chain against the trusted roots.
    ///
    /// Generates a fresh challenge nonce, fetches the chain, has the card
    /// sign the challenge and checks the whole construction. Returns the
    /// matched factory root key.
    pub async fn verify_card(&mut self) -> Result<PublicKey, Error> {
        let host_nonce = pick_nonce()?;

        let certs: CertsResponse = transmit(&self.t, &CertsCommand::new()).await?;
        let check: CheckResponse = transmit(&self.t, &CheckCommand::new(&host_nonce)).await?;

        let chain: Vec<[u8; 65]> = certs
            .cert_chain
            .iter()
            .map(|link| fixed(link))
            .collect::<Result<_, _>>()?;

        let root = verify_authority(
            &self.card_nonce,
            &self.pubkey,
            &host_nonce,
            &chain,
            &fixed(&check.auth_sig)?,
            None,
            &self.roots,
        )?;

        self.card_nonce = fixed(&check.card_nonce)?;

        debug!("card {} verified to factory root", self.ident());

        Ok(root)
    }

    /// Read and verify the signing key of a signer card.
    ///
    /// The verification code authorizes the command; the key arrives
    /// masked under the derived session key and is checked for
    /// possession before being returned.
    pub async fn read_key(&mut self, cvc: &str) -> Result<PublicKey, Error> {
        if self.mode != CardMode::Signer {
            return Err(tapcard_core::Error::WrongDeviceType.into());
        }

        let host_nonce = pick_nonce()?;
        let (session_key, payload) =
            calc_xcvc("read", &self.card_nonce, &self.pubkey, cvc.as_bytes())?;

        let read: ReadResponse = transmit(
            &self.t,
            &ReadCommand::authenticated(&host_nonce, &payload.epubkey.serialize(), &payload.xcvc),
        )
        .await?;

        let pubkey = recover_pubkey(
            self.mode,
            &self.card_nonce,
            &host_nonce,
            &fixed(&read.pubkey)?,
            &fixed(&read.sig)?,
            &session_key,
        )?;

        self.card_nonce = fixed(&read.card_nonce)?;

        Ok(pubkey)
    }

    /// Read and verify the active payment slot.
    ///
    /// The address rendered from the proven slot key must reproduce the
    /// redacted address the card reported at connect time.
    pub async fn read_slot(&mut self) -> Result<RecoveredAddress, Error> {
        if self.mode != CardMode::Cash {
            return Err(tapcard_core::Error::WrongDeviceType.into());
        }
        let expect = self.addr.clone().ok_or(Error::UnexpectedResponse)?;

        let host_nonce = pick_nonce()?;
        let read: ReadResponse = transmit(&self.t, &ReadCommand::new(&host_nonce)).await?;

        let recovered = recover_address(
            self.mode,
            &self.card_nonce,
            &host_nonce,
            self.active_slot,
            &expect,
            &fixed(&read.pubkey)?,
            &fixed(&read.sig)?,
            self.network,
        )?;

        self.card_nonce = fixed(&read.card_nonce)?;

        Ok(recovered)
    }

    /// Confirm the active slot's address is honestly derived.
    ///
    /// The card attests its master key bound to a chain code; the host
    /// re-derives the first child address independently and compares it
    /// against the card's redacted report.
    pub async fn check_derived_address(&mut self) -> Result<String, Error> {
        if self.mode != CardMode::Cash {
            return Err(tapcard_core::Error::WrongDeviceType.into());
        }

        let host_nonce = pick_nonce()?;
        let derive: DeriveResponse = transmit(&self.t, &DeriveCommand::new(&host_nonce)).await?;

        let chain_code: [u8; 32] = fixed(&derive.chain_code)?;

        let master = verify_master_pubkey(
            &fixed(&derive.master_pubkey)?,
            &fixed(&derive.sig)?,
            &chain_code,
            &self.card_nonce,
            &host_nonce,
        )?;

        let (address, _child) =
            rederive_address(&chain_code, &master.serialize(), self.network)?;

        if let Some(expect) = &self.addr {
            tapcard_core::match_redacted_address(expect, &address)?;
        }

        self.card_nonce = fixed(&derive.card_nonce)?;

        debug!("derived address confirmed for slot {}", self.active_slot);

        Ok(address)
    }
}

/// Check a response field against its expected fixed width
fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], Error> {
    bytes.try_into().map_err(|_| Error::UnexpectedResponse)
}
