//! Data model shared by the registry, the conversion engine and the precompile.

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use frame_support::{
    traits::Get, BoundedVec, CloneNoBound, EqNoBound, PartialEqNoBound, RuntimeDebugNoBound,
};
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};
use sp_core::{H160, H256, U256};
use sp_runtime::RuntimeDebug;
use sp_std::prelude::*;

/// Which side of a pair is authoritative for supply.
#[derive(
    Clone,
    Copy,
    Encode,
    Decode,
    DecodeWithMemTracking,
    MaxEncodedLen,
    TypeInfo,
    PartialEq,
    Eq,
    RuntimeDebug,
    Default,
    Serialize,
    Deserialize,
)]
pub enum OwnerKind {
    /// Invalid or undefined owner. Conversions against such a pair are rejected.
    #[default]
    Unspecified,
    /// The native ledger is authoritative. The contract address is served by the
    /// ERC-20 precompile and value moves only through owner-gated mint/burn.
    Module,
    /// The contract ledger is authoritative. Native coins exist only as the
    /// result of a prior contract-to-native conversion.
    External,
}

/// A registered mapping between a native denomination and a contract address.
#[derive(
    CloneNoBound,
    Encode,
    Decode,
    MaxEncodedLen,
    TypeInfo,
    PartialEqNoBound,
    EqNoBound,
    RuntimeDebugNoBound,
)]
#[scale_info(skip_type_params(MaxDenomLen))]
#[codec(mel_bound(AccountId: MaxEncodedLen))]
pub struct TokenPair<AccountId, MaxDenomLen>
where
    AccountId: Clone + PartialEq + Eq + core::fmt::Debug,
    MaxDenomLen: Get<u32>,
{
    pub erc20_address: H160,
    pub denom: BoundedVec<u8, MaxDenomLen>,
    pub enabled: bool,
    pub contract_owner: OwnerKind,
    /// Account allowed to mint, burn on behalf of others and hand over ownership.
    /// Only meaningful for [`OwnerKind::Module`] pairs.
    pub owner_address: Option<AccountId>,
}

impl<AccountId, MaxDenomLen> TokenPair<AccountId, MaxDenomLen>
where
    AccountId: Clone + PartialEq + Eq + core::fmt::Debug,
    MaxDenomLen: Get<u32>,
{
    pub fn new(
        erc20_address: H160,
        denom: BoundedVec<u8, MaxDenomLen>,
        contract_owner: OwnerKind,
        owner_address: Option<AccountId>,
    ) -> Self {
        Self { erc20_address, denom, enabled: true, contract_owner, owner_address }
    }

    /// Stable identifier of the pair; a pure function of the contract address.
    pub fn id(&self) -> H256 {
        pair_id(&self.erc20_address)
    }

    pub fn is_native_coin(&self) -> bool {
        self.contract_owner == OwnerKind::Module
    }

    pub fn is_native_erc20(&self) -> bool {
        self.contract_owner == OwnerKind::External
    }

    pub fn is_owner(&self, who: &AccountId) -> bool {
        self.owner_address.as_ref() == Some(who)
    }
}

/// Derive the pair identifier for a contract address.
pub fn pair_id(erc20_address: &H160) -> H256 {
    H256(sp_io::hashing::blake2_256(erc20_address.as_bytes()))
}

/// Denomination used for an externally owned contract registered on the native ledger.
pub fn erc20_denom(erc20_address: &H160) -> Vec<u8> {
    let mut denom = b"erc20:0x".to_vec();
    denom.extend_from_slice(hex::encode(erc20_address.as_bytes()).as_bytes());
    denom
}

/// Contract address under which a native coin is exposed through the precompile.
pub fn coin_address(denom: &[u8]) -> H160 {
    let hash = sp_io::hashing::keccak_256(denom);
    H160::from_slice(&hash[12..])
}

/// Whether a token reference must be routed to the contract index.
///
/// Accepts 40 hex characters with or without a `0x`/`0X` prefix. Anything that
/// parses as an address is always treated as one, never as a denomination.
pub fn parse_hex_address(token: &[u8]) -> Option<H160> {
    let digits = match token {
        [b'0', b'x' | b'X', rest @ ..] => rest,
        other => other,
    };
    if digits.len() != 40 {
        return None;
    }
    let mut raw = [0u8; 20];
    hex::decode_to_slice(digits, &mut raw).ok()?;
    Some(H160(raw))
}

/// Mutable module parameters.
#[derive(
    Clone,
    Copy,
    Encode,
    Decode,
    DecodeWithMemTracking,
    MaxEncodedLen,
    TypeInfo,
    PartialEq,
    Eq,
    RuntimeDebug,
    Serialize,
    Deserialize,
)]
pub struct BridgeParams {
    /// Global switch for registration, conversion and packet conversion.
    pub enable_erc20: bool,
    /// When false, registering an external contract needs the admin origin.
    pub permissionless_registration: bool,
}

impl Default for BridgeParams {
    fn default() -> Self {
        Self { enable_erc20: true, permissionless_registration: true }
    }
}

/// Account state reported by the contract engine.
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug, Default)]
pub struct ContractAccount {
    pub is_contract: bool,
}

/// A log entry produced by contract execution or by the precompile.
#[derive(Clone, PartialEq, Eq, Encode, Decode, TypeInfo, RuntimeDebug)]
pub struct Log {
    pub address: H160,
    pub topics: Vec<H256>,
    pub data: Vec<u8>,
}

/// Result of a contract call on the contract engine.
#[derive(Clone, PartialEq, Eq, RuntimeDebug, Default)]
pub struct CallOutcome {
    pub return_value: Vec<u8>,
    pub logs: Vec<Log>,
}

/// Amount type used on both ledgers. The two sides share the same integer unit.
pub type Amount = U256;
