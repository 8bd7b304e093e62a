//! Packet conversion adapter.
//!
//! Hooks for a fungible token transfer application. Inbound transfers of an
//! externally owned token are turned back into contract tokens for the receiver,
//! and failed outbound transfers refund the sender on the contract side.

use alloc::{
    format,
    string::{String, ToString},
    vec,
};

use serde::{Deserialize, Serialize};
use sp_runtime::{DispatchError, DispatchResult};
use sp_std::prelude::*;

use crate::{
    types::OwnerKind, AccountCodec, AddressMapping, Amount, Config, DenomOf, Error, Event,
    NativeLedger, Pallet, TokenPairOf, LOG_TARGET,
};

/// Transfer packet as delivered by the relay layer.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Packet {
    pub sequence: u64,
    pub source_port: String,
    pub source_channel: String,
    pub destination_port: String,
    pub destination_channel: String,
    pub data: Vec<u8>,
}

/// JSON payload of a fungible token transfer.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FungibleTokenPacketData {
    /// Denomination trace as seen by the sending chain
    pub denom: String,
    /// Decimal integer string
    pub amount: String,
    pub sender: String,
    pub receiver: String,
    #[serde(default)]
    pub memo: String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Acknowledgement {
    Result(Vec<u8>),
    Error(String),
}

impl Acknowledgement {
    pub fn success() -> Self {
        Acknowledgement::Result(vec![1])
    }

    pub fn error(reason: &str) -> Self {
        Acknowledgement::Error(reason.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Acknowledgement::Result(_))
    }
}

impl FungibleTokenPacketData {
    pub fn decode(data: &[u8]) -> Option<Self> {
        serde_json::from_slice(data).ok()
    }

    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    fn amount(&self) -> Option<Amount> {
        if self.amount.is_empty() || !self.amount.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Amount::from_dec_str(&self.amount).ok()
    }
}

/// `ibc/<HEX>` voucher denomination of a full denomination trace.
pub fn voucher_denom(trace: &str) -> String {
    let hash = sp_io::hashing::sha2_256(trace.as_bytes());
    format!("ibc/{}", hex::encode_upper(hash))
}

/// Local denomination of tokens received over `packet`.
///
/// Tokens coming back through the channel they left on lose the hop prefix; all
/// other tokens become a voucher of the destination hop plus their trace.
pub fn received_denom(packet: &Packet, denom: &str) -> String {
    let source_prefix = format!("{}/{}/", packet.source_port, packet.source_channel);
    match denom.strip_prefix(source_prefix.as_str()) {
        Some(unprefixed) if unprefixed.contains('/') => voucher_denom(unprefixed),
        Some(unprefixed) => unprefixed.to_string(),
        None => voucher_denom(&format!(
            "{}/{}/{}",
            packet.destination_port, packet.destination_channel, denom
        )),
    }
}

/// Local denomination of tokens this chain sent out.
fn sent_denom(denom: &str) -> String {
    if denom.contains('/') {
        voucher_denom(denom)
    } else {
        denom.to_string()
    }
}

impl<T: Config> Pallet<T> {
    /// Convert an inbound transfer into contract tokens for the receiver when the
    /// denomination belongs to an externally owned pair.
    pub fn on_recv_packet(packet: &Packet) -> Acknowledgement {
        let Some(data) = FungibleTokenPacketData::decode(&packet.data) else {
            return Acknowledgement::error("cannot unmarshal fungible token packet data");
        };
        if !Self::is_erc20_enabled() {
            return Acknowledgement::success();
        }

        let Some(amount) = data.amount() else {
            return Acknowledgement::error("invalid transfer amount");
        };
        if T::AccountCodec::decode_account(&data.sender).is_none() {
            return Acknowledgement::error("invalid sender");
        }
        let Some(receiver) = T::AccountCodec::decode_account(&data.receiver) else {
            return Acknowledgement::error("invalid receiver");
        };

        if receiver == Self::module_account() || T::NativeLedger::is_blocked(&receiver) {
            log::debug!(
                target: LOG_TARGET,
                "packet {} to reserved account, skipping conversion",
                packet.sequence
            );
            return Acknowledgement::success();
        }

        let denom = received_denom(packet, &data.denom);
        let Some(pair) = Self::token_pair_by_denom(denom.as_bytes()) else {
            return Acknowledgement::success();
        };
        if !pair.enabled {
            return Acknowledgement::success();
        }

        match pair.contract_owner {
            OwnerKind::External => {
                let address = T::AddressMapping::into_address(&receiver);
                match Self::convert_native_to_contract(&pair, amount, &receiver, address) {
                    Ok(()) => Acknowledgement::success(),
                    Err(err) => Acknowledgement::error(err_reason(err)),
                }
            }
            // Native coins stay native; the precompile already exposes them.
            OwnerKind::Module | OwnerKind::Unspecified => Acknowledgement::success(),
        }
    }

    /// Refund an outbound transfer the counterparty rejected.
    pub fn on_acknowledgement_packet(packet: &Packet, ack: &Acknowledgement) -> DispatchResult {
        if ack.is_success() {
            return Ok(());
        }
        Self::refund_packet(packet)
    }

    /// Refund an outbound transfer that timed out.
    pub fn on_timeout_packet(packet: &Packet) -> DispatchResult {
        Self::refund_packet(packet)
    }

    /// The relay layer has already returned the escrowed native coins to the sender.
    /// Turn them back into the contract tokens the sender originally held.
    fn refund_packet(packet: &Packet) -> DispatchResult {
        let data = FungibleTokenPacketData::decode(&packet.data).ok_or(Error::<T>::InvalidPacket)?;
        let sender =
            T::AccountCodec::decode_account(&data.sender).ok_or(Error::<T>::InvalidPacket)?;
        let amount = data.amount().ok_or(Error::<T>::InvalidPacket)?;

        if sender == Self::module_account() || !Self::is_erc20_enabled() {
            return Ok(());
        }

        let Some(pair) = Self::token_pair_by_denom(sent_denom(&data.denom).as_bytes()) else {
            return Ok(());
        };
        if !pair.is_native_erc20() {
            return Ok(());
        }

        if Self::is_self_destructed(&pair) {
            Self::conversion_failed(&sender, amount, &pair);
            return Err(Error::<T>::SelfDestructedContract.into());
        }

        let address = T::AddressMapping::into_address(&sender);
        Self::convert_native_to_contract(&pair, amount, &sender, address)
    }

    fn conversion_failed(sender: &T::AccountId, amount: Amount, pair: &TokenPairOf<T>) {
        log::warn!(
            target: LOG_TARGET,
            "refund of {:?} into self-destructed contract {:?} failed",
            amount,
            pair.erc20_address,
        );
        let denom: DenomOf<T> = pair.denom.clone();
        Self::deposit_event(Event::ConversionFailed {
            sender: sender.clone(),
            amount,
            denom,
            erc20_address: pair.erc20_address,
        });
    }
}

fn err_reason(err: DispatchError) -> &'static str {
    err.into()
}
