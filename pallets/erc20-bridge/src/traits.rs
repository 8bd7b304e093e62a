//! Interfaces of the collaborators this pallet drives but does not own.
//!
//! The native ledger and the contract engine are supplied by the runtime. Every
//! mutation they perform must take part in the enclosing storage transaction so
//! that a failed conversion leaves neither ledger touched.

use sp_core::H160;
use sp_runtime::{DispatchError, DispatchResult};

use crate::types::{Amount, CallOutcome, ContractAccount};

/// Multi-denomination account ledger.
pub trait NativeLedger<AccountId> {
    /// Total balance of `denom` held by `who`.
    fn balance(who: &AccountId, denom: &[u8]) -> Amount;

    /// Portion of the balance that can currently be moved.
    fn spendable_balance(who: &AccountId, denom: &[u8]) -> Amount;

    /// Move coins between accounts. Must enforce the send-enabled flag and the
    /// blocked-address list, and fail with `TokenError::FundsUnavailable` on
    /// underflow.
    fn send(from: &AccountId, to: &AccountId, denom: &[u8], amount: Amount) -> DispatchResult;

    /// Move coins from an account into the module account `module`. Module accounts
    /// sit on the blocked-address list, which this path must not apply. The
    /// send-enabled flag and the underflow error are the same as for [`Self::send`].
    fn send_to_module(
        from: &AccountId,
        module: &AccountId,
        denom: &[u8],
        amount: Amount,
    ) -> DispatchResult;

    /// Create `amount` new coins in `to`.
    fn mint(to: &AccountId, denom: &[u8], amount: Amount) -> DispatchResult;

    /// Destroy `amount` coins held by `from`.
    fn burn(from: &AccountId, denom: &[u8], amount: Amount) -> DispatchResult;

    fn is_send_enabled(denom: &[u8]) -> bool;

    fn set_send_enabled(denom: &[u8], enabled: bool);

    /// Accounts that may not receive funds (module accounts and the like).
    fn is_blocked(who: &AccountId) -> bool;
}

/// Contract execution engine.
pub trait ContractEngine {
    /// Execute `input` against `contract` with `from` as the caller. When `commit`
    /// is false the call is a read and its state changes are discarded.
    fn call(
        from: H160,
        contract: H160,
        input: sp_std::vec::Vec<u8>,
        commit: bool,
    ) -> Result<CallOutcome, DispatchError>;

    /// Account information, `None` when the address has never been created or
    /// was deleted.
    fn account(address: H160) -> Option<ContractAccount>;

    /// Credit the engine's own balance cache for the fee denomination.
    fn add_balance(address: H160, amount: Amount);

    /// Debit the engine's own balance cache for the fee denomination.
    fn sub_balance(address: H160, amount: Amount) -> DispatchResult;

    fn delete_account(address: H160);
}

/// Bidirectional mapping between native accounts and contract-ledger addresses.
pub trait AddressMapping<AccountId> {
    fn into_account_id(address: H160) -> AccountId;

    fn into_address(account: &AccountId) -> H160;
}

/// Parses account strings carried in cross-chain packet data.
pub trait AccountCodec<AccountId> {
    fn decode_account(encoded: &str) -> Option<AccountId>;
}

/// Contract state setup for benchmarks, which cannot deploy bytecode themselves.
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper {
    /// Deploy a well-behaved ERC-20 token at `address`.
    fn deploy_token(address: H160);

    fn set_token_balance(contract: H160, holder: H160, amount: Amount);
}
