//! Conversion engine.
//!
//! Moves value between the native ledger and the contract ledger for externally
//! owned pairs, and mints or burns native coins for module owned pairs. Every
//! balance movement is checked against the ledgers afterwards, and every entry
//! point runs inside its own storage layer so a failed check undoes all writes.

use alloy_sol_types::SolCall;
use frame_support::{ensure, pallet_prelude::*, storage::with_storage_layer};
use sp_core::{H160, H256};
use sp_std::prelude::*;

use crate::{
    abi::{self, IERC20},
    types::{CallOutcome, OwnerKind},
    Amount, Config, ContractEngine, Error, Event, NativeLedger, Pallet, TokenPairOf, TokenPairs,
    LOG_TARGET,
};

impl<T: Config> Pallet<T> {
    /// Resolve a pair and check that value may move into `receiver` through it.
    pub fn ensure_conversion_enabled(
        receiver: &T::AccountId,
        id: Option<H256>,
    ) -> Result<TokenPairOf<T>, DispatchError> {
        ensure!(Self::is_erc20_enabled(), Error::<T>::Erc20Disabled);

        let id = id.ok_or(Error::<T>::TokenPairNotFound)?;
        let pair = TokenPairs::<T>::get(id).ok_or(Error::<T>::TokenPairNotFound)?;
        ensure!(pair.enabled, Error::<T>::TokenPairDisabled);
        ensure!(T::NativeLedger::is_send_enabled(&pair.denom), Error::<T>::SendDisabled);
        ensure!(!T::NativeLedger::is_blocked(receiver), Error::<T>::ReceiverBlocked);
        Ok(pair)
    }

    /// Whether the contract behind an externally owned pair is gone.
    pub fn is_self_destructed(pair: &TokenPairOf<T>) -> bool {
        pair.contract_owner == OwnerKind::External
            && !T::ContractEngine::account(pair.erc20_address)
                .map(|account| account.is_contract)
                .unwrap_or(false)
    }

    /// Drop a pair whose contract no longer exists.
    ///
    /// Returns true when the pair was removed. Callers treat this as a successful
    /// conversion that moved nothing.
    pub(crate) fn remove_if_self_destructed(pair: &TokenPairOf<T>) -> bool {
        if !Self::is_self_destructed(pair) {
            return false;
        }
        log::debug!(
            target: LOG_TARGET,
            "contract {:?} of pair {:?} is gone, deleting the pair",
            pair.erc20_address,
            pair.id(),
        );
        Self::delete_token_pair(pair);
        Self::deposit_event(Event::TokenPairDeleted {
            id: pair.id(),
            erc20_address: pair.erc20_address,
        });
        true
    }

    /// Escrow native coins from `sender`, pay out the same amount of contract tokens
    /// from the custodial address to `receiver`, then burn the escrow.
    pub fn convert_native_to_contract(
        pair: &TokenPairOf<T>,
        amount: Amount,
        sender: &T::AccountId,
        receiver: H160,
    ) -> DispatchResult {
        ensure!(pair.is_native_erc20(), Error::<T>::NativeConversionDisabled);
        ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);

        with_storage_layer(|| -> DispatchResult {
            let module = Self::module_account();
            let custodial = Self::module_address();
            let before = Self::token_balance(pair.erc20_address, receiver)?;

            T::NativeLedger::send_to_module(sender, &module, &pair.denom, amount)?;

            let outcome = T::ContractEngine::call(
                custodial,
                pair.erc20_address,
                Self::encode_transfer(receiver, amount),
                true,
            )
            .map_err(|_| Error::<T>::ContractCallFailed)?;
            let contract = pair.erc20_address;
            Self::ensure_transfer_succeeded(contract, &outcome, custodial, receiver, amount)?;

            let after = Self::token_balance(pair.erc20_address, receiver)?;
            ensure!(Some(after) == before.checked_add(amount), Error::<T>::BalanceInvariance);

            T::NativeLedger::burn(&module, &pair.denom, amount)
        })
    }

    /// Pull contract tokens from `sender` into the custodial address, then mint the
    /// same amount of native coins and hand them to `receiver`.
    pub fn convert_contract_to_native(
        pair: &TokenPairOf<T>,
        amount: Amount,
        sender: H160,
        receiver: &T::AccountId,
    ) -> DispatchResult {
        ensure!(pair.is_native_erc20(), Error::<T>::NativeConversionDisabled);
        ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);

        with_storage_layer(|| -> DispatchResult {
            let module = Self::module_account();
            let custodial = Self::module_address();
            let receiver_before = T::NativeLedger::balance(receiver, &pair.denom);
            let custodial_before = Self::token_balance(pair.erc20_address, custodial)?;

            let outcome = T::ContractEngine::call(
                sender,
                pair.erc20_address,
                Self::encode_transfer(custodial, amount),
                true,
            )
            .map_err(|_| Error::<T>::ContractCallFailed)?;
            let contract = pair.erc20_address;
            Self::ensure_transfer_succeeded(contract, &outcome, sender, custodial, amount)?;

            let custodial_after = Self::token_balance(pair.erc20_address, custodial)?;
            ensure!(
                Some(custodial_after) == custodial_before.checked_add(amount),
                Error::<T>::BalanceInvariance
            );

            T::NativeLedger::mint(&module, &pair.denom, amount)?;
            T::NativeLedger::send(&module, receiver, &pair.denom, amount)?;

            let receiver_after = T::NativeLedger::balance(receiver, &pair.denom);
            ensure!(
                Some(receiver_after) == receiver_before.checked_add(amount),
                Error::<T>::BalanceInvariance
            );
            Ok(())
        })
    }

    /// Owner-gated mint of a module owned coin into `receiver`.
    pub fn mint_coins(
        sender: &T::AccountId,
        receiver: &T::AccountId,
        amount: Amount,
        id: H256,
    ) -> Result<TokenPairOf<T>, DispatchError> {
        ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);
        let pair = Self::ensure_conversion_enabled(receiver, Some(id))?;
        ensure!(pair.is_native_coin(), Error::<T>::NonNativeCoinMintingDisabled);
        ensure!(pair.is_owner(sender), Error::<T>::SenderIsNotOwner);

        with_storage_layer(|| -> DispatchResult {
            let module = Self::module_account();
            T::NativeLedger::mint(&module, &pair.denom, amount)?;
            T::NativeLedger::send(&module, receiver, &pair.denom, amount)
        })?;

        Self::deposit_event(Event::CoinsMinted {
            to: receiver.clone(),
            amount,
            denom: pair.denom.clone(),
        });
        Ok(pair)
    }

    /// Burn module owned coins held by `from`. Authorization is the caller's concern.
    pub fn burn_coins(
        from: &T::AccountId,
        amount: Amount,
        id: H256,
    ) -> Result<TokenPairOf<T>, DispatchError> {
        ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);
        let pair = TokenPairs::<T>::get(id).ok_or(Error::<T>::TokenPairNotFound)?;
        ensure!(pair.is_native_coin(), Error::<T>::NonNativeCoinBurningDisabled);

        with_storage_layer(|| -> DispatchResult {
            let module = Self::module_account();
            T::NativeLedger::send_to_module(from, &module, &pair.denom, amount)?;
            T::NativeLedger::burn(&module, &pair.denom, amount)
        })?;

        Self::deposit_event(Event::CoinsBurned {
            from: from.clone(),
            amount,
            denom: pair.denom.clone(),
        });
        Ok(pair)
    }

    /// Read a token balance through the contract's own `balanceOf`.
    pub fn token_balance(contract: H160, owner: H160) -> Result<Amount, DispatchError> {
        let input = IERC20::balanceOfCall { account: abi::address(owner) }.abi_encode();
        let outcome = T::ContractEngine::call(Self::module_address(), contract, input, false)
            .map_err(|_| Error::<T>::ContractCallFailed)?;
        IERC20::balanceOfCall::abi_decode_returns(&outcome.return_value, true)
            .map(|balance| abi::amount(balance._0))
            .map_err(|_| Error::<T>::AbiDecodeFailed.into())
    }

    fn encode_transfer(to: H160, amount: Amount) -> Vec<u8> {
        IERC20::transferCall { to: abi::address(to), amount: abi::uint(amount) }.abi_encode()
    }

    /// Accept either an explicit `true` return value or, for tokens that return
    /// nothing, a matching `Transfer` log emitted by the token itself.
    fn ensure_transfer_succeeded(
        contract: H160,
        outcome: &CallOutcome,
        from: H160,
        to: H160,
        amount: Amount,
    ) -> DispatchResult {
        if outcome.return_value.is_empty() {
            let found = outcome
                .logs
                .iter()
                .filter(|log| log.address == contract)
                .filter_map(abi::decode_log::<IERC20::Transfer>)
                .any(|event| {
                    abi::h160(event.from) == from
                        && abi::h160(event.to) == to
                        && abi::amount(event.value) == amount
                });
            ensure!(found, Error::<T>::ExpectedTransferEvent);
            return Ok(());
        }

        let success = IERC20::transferCall::abi_decode_returns(&outcome.return_value, true)
            .map_err(|_| Error::<T>::AbiDecodeFailed)?
            ._0;
        ensure!(success, Error::<T>::TransferFailed);
        Ok(())
    }
}
