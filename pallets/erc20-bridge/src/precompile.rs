//! ERC-20 precompile for module owned pairs.
//!
//! Contract bytecode calling the address of a [`OwnerKind::Module`] pair reaches
//! [`Erc20Precompile::execute`], which reads and writes the native ledger directly.
//! Each call is one state transition: on failure nothing it touched is kept.

use core::marker::PhantomData;

use alloy_sol_types::{SolCall, SolEvent, SolInterface};
use frame_support::{storage::with_storage_layer, traits::Get};
use sp_core::{H160, U256};
use sp_runtime::{DispatchError, TokenError};
use sp_std::prelude::*;

use crate::{
    abi::{
        self,
        IERC20::{self, IERC20Calls},
    },
    types::{Log, OwnerKind},
    AddressMapping, Amount, Config, ContractEngine, Error, NativeLedger, Pallet, TokenPairOf,
};

/// Category of a precompile failure, as seen by the calling contract.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FailureKind {
    InsufficientBalance,
    InsufficientAllowance,
    SenderIsNotOwner,
    InvalidArguments,
    /// Address is not a registered module owned pair
    NotFound,
    Other,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PrecompileFailure {
    pub kind: FailureKind,
    /// `Error(string)` revert data
    pub reason: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct PrecompileOutput {
    pub output: Vec<u8>,
    pub logs: Vec<Log>,
}

enum Failure {
    Dispatch(DispatchError),
    Abi(alloy_sol_types::Error),
}

impl From<DispatchError> for Failure {
    fn from(err: DispatchError) -> Self {
        Failure::Dispatch(err)
    }
}

impl From<alloy_sol_types::Error> for Failure {
    fn from(err: alloy_sol_types::Error) -> Self {
        Failure::Abi(err)
    }
}

pub struct Erc20Precompile<T>(PhantomData<T>);

impl<T: Config> Erc20Precompile<T> {
    /// Whether `address` is served by this precompile.
    pub fn is_precompile(address: H160) -> bool {
        Pallet::<T>::token_pair_by_contract(address)
            .map(|pair| pair.contract_owner == OwnerKind::Module)
            .unwrap_or(false)
    }

    pub fn execute(
        address: H160,
        caller: H160,
        input: &[u8],
    ) -> Result<PrecompileOutput, PrecompileFailure> {
        let pair = Pallet::<T>::token_pair_by_contract(address)
            .filter(|pair| pair.contract_owner == OwnerKind::Module)
            .ok_or_else(|| failure(FailureKind::NotFound, "token pair not found"))?;

        let mut call = Call::<T> { pair, caller, logs: Vec::new() };
        let output = with_storage_layer(|| call.dispatch(input)).map_err(Self::map_failure)?;
        Ok(PrecompileOutput { output, logs: call.logs })
    }

    fn map_failure(err: Failure) -> PrecompileFailure {
        match err {
            Failure::Abi(alloy_sol_types::Error::UnknownSelector { .. }) => {
                failure(FailureKind::InvalidArguments, "unknown method")
            }
            Failure::Abi(_) => failure(FailureKind::InvalidArguments, "invalid arguments"),
            Failure::Dispatch(DispatchError::Token(TokenError::FundsUnavailable)) => {
                failure(FailureKind::InsufficientBalance, "ERC20: transfer amount exceeds balance")
            }
            Failure::Dispatch(err) if is_error(&err, Error::<T>::InsufficientAllowance) => {
                failure(FailureKind::InsufficientAllowance, "ERC20: insufficient allowance")
            }
            Failure::Dispatch(err) if is_error(&err, Error::<T>::SenderIsNotOwner) => {
                failure(FailureKind::SenderIsNotOwner, "sender is not the owner")
            }
            Failure::Dispatch(err) if is_error(&err, Error::<T>::ZeroAmount) => {
                failure(FailureKind::InvalidArguments, "amount is not positive")
            }
            Failure::Dispatch(err) => {
                let reason: &'static str = err.into();
                failure(FailureKind::Other, reason)
            }
        }
    }
}

fn is_error<T: Config>(err: &DispatchError, expected: Error<T>) -> bool {
    *err == DispatchError::from(expected)
}

fn failure(kind: FailureKind, reason: &str) -> PrecompileFailure {
    PrecompileFailure { kind, reason: abi::revert_reason(reason) }
}

/// State of one precompile invocation.
struct Call<T: Config> {
    pair: TokenPairOf<T>,
    caller: H160,
    logs: Vec<Log>,
}

impl<T: Config> Call<T> {
    fn dispatch(&mut self, input: &[u8]) -> Result<Vec<u8>, Failure> {
        self.logs.clear();

        match IERC20Calls::abi_decode(input, true)? {
            IERC20Calls::transfer(IERC20::transferCall { to, amount }) => {
                self.transfer(self.caller, abi::h160(to), abi::amount(amount))?;
                Ok(IERC20::transferCall::abi_encode_returns(&(true,)))
            }
            IERC20Calls::transferFrom(IERC20::transferFromCall { from, to, amount }) => {
                let (from, amount) = (abi::h160(from), abi::amount(amount));
                let remaining = self.spend_allowance(from, amount)?;
                self.transfer(from, abi::h160(to), amount)?;
                self.approval_log(from, self.caller, remaining);
                Ok(IERC20::transferFromCall::abi_encode_returns(&(true,)))
            }
            IERC20Calls::approve(IERC20::approveCall { spender, amount }) => {
                let (spender, amount) = (abi::h160(spender), abi::amount(amount));
                Pallet::<T>::set_allowance(self.pair.erc20_address, self.caller, spender, amount)?;
                self.approval_log(self.caller, spender, amount);
                Ok(IERC20::approveCall::abi_encode_returns(&(true,)))
            }
            IERC20Calls::increaseAllowance(IERC20::increaseAllowanceCall {
                spender,
                addedValue: added,
            }) => {
                let spender = abi::h160(spender);
                let updated = Pallet::<T>::increase_allowance(
                    self.pair.erc20_address,
                    self.caller,
                    spender,
                    abi::amount(added),
                )?;
                self.approval_log(self.caller, spender, updated);
                Ok(IERC20::increaseAllowanceCall::abi_encode_returns(&(true,)))
            }
            IERC20Calls::decreaseAllowance(IERC20::decreaseAllowanceCall {
                spender,
                subtractedValue: subtracted,
            }) => {
                let spender = abi::h160(spender);
                let updated = Pallet::<T>::decrease_allowance(
                    self.pair.erc20_address,
                    self.caller,
                    spender,
                    abi::amount(subtracted),
                )?;
                self.approval_log(self.caller, spender, updated);
                Ok(IERC20::decreaseAllowanceCall::abi_encode_returns(&(true,)))
            }
            IERC20Calls::mint(IERC20::mintCall { to, amount }) => {
                let (to, amount) = (abi::h160(to), abi::amount(amount));
                let (minter, receiver) = (self.account(self.caller), self.account(to));
                Pallet::<T>::mint_coins(&minter, &receiver, amount, self.pair.id())?;
                if let Some(scaled) = self.fee_cache_amount(amount)? {
                    T::ContractEngine::add_balance(to, scaled);
                }
                self.transfer_log(H160::zero(), to, amount);
                Ok(Vec::new())
            }
            IERC20Calls::burn_0(IERC20::burn_0Call { amount }) => {
                self.burn(self.caller, abi::amount(amount))?;
                Ok(Vec::new())
            }
            IERC20Calls::burn_1(IERC20::burn_1Call { from, amount }) => {
                self.ensure_owner()?;
                self.burn(abi::h160(from), abi::amount(amount))?;
                Ok(Vec::new())
            }
            IERC20Calls::burnFrom(IERC20::burnFromCall { account, amount }) => {
                let (owner, amount) = (abi::h160(account), abi::amount(amount));
                let remaining = self.spend_allowance(owner, amount)?;
                self.burn(owner, amount)?;
                self.approval_log(owner, self.caller, remaining);
                Ok(Vec::new())
            }
            IERC20Calls::transferOwnership(IERC20::transferOwnershipCall { newOwner: to }) => {
                let caller = self.account(self.caller);
                let new_owner = self.account(abi::h160(to));
                Pallet::<T>::do_transfer_ownership(
                    Some(&caller),
                    Some(self.pair.id()),
                    new_owner.clone(),
                )?;
                self.pair.owner_address = Some(new_owner);
                self.emit(&IERC20::OwnershipTransferred {
                    previousOwner: abi::address(self.caller),
                    newOwner: to,
                });
                Ok(Vec::new())
            }
            IERC20Calls::balanceOf(IERC20::balanceOfCall { account }) => {
                let who = self.account(abi::h160(account));
                let balance = T::NativeLedger::balance(&who, &self.pair.denom);
                Ok(IERC20::balanceOfCall::abi_encode_returns(&(abi::uint(balance),)))
            }
            IERC20Calls::allowance(IERC20::allowanceCall { owner, spender }) => {
                let value = Pallet::<T>::allowance(
                    self.pair.erc20_address,
                    abi::h160(owner),
                    abi::h160(spender),
                )
                .unwrap_or_default();
                Ok(IERC20::allowanceCall::abi_encode_returns(&(abi::uint(value),)))
            }
            IERC20Calls::owner(_) => {
                let owner = self
                    .pair
                    .owner_address
                    .as_ref()
                    .map(T::AddressMapping::into_address)
                    .unwrap_or_default();
                Ok(IERC20::ownerCall::abi_encode_returns(&(abi::address(owner),)))
            }
        }
    }

    fn account(&self, address: H160) -> T::AccountId {
        T::AddressMapping::into_account_id(address)
    }

    fn ensure_owner(&self) -> Result<(), Failure> {
        if self.pair.is_owner(&self.account(self.caller)) {
            Ok(())
        } else {
            Err(DispatchError::from(Error::<T>::SenderIsNotOwner).into())
        }
    }

    fn spend_allowance(&self, owner: H160, amount: Amount) -> Result<Amount, Failure> {
        let contract = self.pair.erc20_address;
        Ok(Pallet::<T>::decrease_allowance(contract, owner, self.caller, amount)?)
    }

    fn transfer(&mut self, from: H160, to: H160, amount: Amount) -> Result<(), Failure> {
        if amount.is_zero() {
            return Err(DispatchError::from(Error::<T>::ZeroAmount).into());
        }
        T::NativeLedger::send(&self.account(from), &self.account(to), &self.pair.denom, amount)?;
        if let Some(scaled) = self.fee_cache_amount(amount)? {
            T::ContractEngine::sub_balance(from, scaled)?;
            T::ContractEngine::add_balance(to, scaled);
        }
        self.transfer_log(from, to, amount);
        Ok(())
    }

    fn burn(&mut self, from: H160, amount: Amount) -> Result<(), Failure> {
        Pallet::<T>::burn_coins(&self.account(from), amount, self.pair.id())?;
        if let Some(scaled) = self.fee_cache_amount(amount)? {
            T::ContractEngine::sub_balance(from, scaled)?;
        }
        self.transfer_log(from, H160::zero(), amount);
        Ok(())
    }

    /// The contract engine keeps its own 18 decimal balance for the fee denomination,
    /// so movements of that one denom are mirrored there.
    fn fee_cache_amount(&self, amount: Amount) -> Result<Option<Amount>, Failure> {
        if self.pair.denom.as_slice() != T::FeeDenom::get() {
            return Ok(None);
        }
        let decimals = T::FeeDenomDecimals::get();
        if decimals > 18 {
            return Err(DispatchError::from(Error::<T>::UnsupportedDecimals).into());
        }
        let factor = U256::from(10u8).pow(U256::from(18 - decimals));
        amount
            .checked_mul(factor)
            .map(Some)
            .ok_or_else(|| DispatchError::from(Error::<T>::AmountOverflow).into())
    }

    fn transfer_log(&mut self, from: H160, to: H160, amount: Amount) {
        self.emit(&IERC20::Transfer {
            from: abi::address(from),
            to: abi::address(to),
            value: abi::uint(amount),
        });
    }

    fn approval_log(&mut self, owner: H160, spender: H160, amount: Amount) {
        self.emit(&IERC20::Approval {
            owner: abi::address(owner),
            spender: abi::address(spender),
            value: abi::uint(amount),
        });
    }

    fn emit<E: SolEvent>(&mut self, event: &E) {
        self.logs.push(abi::event_log(self.pair.erc20_address, event));
    }
}
