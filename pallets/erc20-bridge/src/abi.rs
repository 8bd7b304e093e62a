//! ERC-20 contract bindings.
//!
//! The token interface is declared once with `sol!` and used both ways: the
//! precompile decodes calls and encodes returns and logs with it, and the
//! conversion engine uses it to call external tokens and check their logs.
//! The helpers below bridge the runtime's `H160`/`U256` and the ABI types.

use alloc::string::String;

use alloy_primitives::{Address, B256, U256 as Uint};
use alloy_sol_types::{sol, Revert, SolError, SolEvent};
use sp_core::{H160, H256};
use sp_std::prelude::*;

use crate::types::{Amount, Log};

sol! {
    /// Token interface served for module owned pairs and expected from external tokens.
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function increaseAllowance(address spender, uint256 addedValue) external returns (bool);
        function decreaseAllowance(address spender, uint256 subtractedValue) external returns (bool);

        function mint(address to, uint256 amount) external;
        /// Burn from the caller
        function burn(uint256 amount) external;
        /// Owner-gated burn from any holder
        function burn(address from, uint256 amount) external;
        function burnFrom(address account, uint256 amount) external;
        function transferOwnership(address newOwner) external;

        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function owner() external view returns (address);
    }
}

pub fn address(value: H160) -> Address {
    Address::from(value.0)
}

pub fn h160(value: Address) -> H160 {
    H160(value.0 .0)
}

pub fn uint(value: Amount) -> Uint {
    Uint::from_be_bytes(value.to_big_endian())
}

pub fn amount(value: Uint) -> Amount {
    Amount::from_big_endian(&value.to_be_bytes::<32>())
}

/// Log entry for `event` as emitted by `contract`.
pub fn event_log<E: SolEvent>(contract: H160, event: &E) -> Log {
    let topics = event.encode_topics().into_iter().map(|topic| H256(topic.0 .0)).collect();
    Log { address: contract, topics, data: event.encode_data() }
}

/// Decode `log` as an `E` event. `None` when the signature, topic count or data
/// do not match.
pub fn decode_log<E: SolEvent>(log: &Log) -> Option<E> {
    let topics = log.topics.iter().map(|topic| B256::from(topic.0));
    E::decode_raw_log(topics, &log.data, true).ok()
}

/// `Error(string)` revert data.
pub fn revert_reason(message: &str) -> Vec<u8> {
    Revert { reason: message.into() }.abi_encode()
}

pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    Revert::abi_decode(data, true).ok().map(|revert| revert.reason)
}
