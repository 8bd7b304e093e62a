//! Token pair registry.
//!
//! Three maps describe one pair: the primary `TokenPairs` entry and the two
//! secondary indices by denom and by contract address. They are only ever written
//! together.

use frame_support::{ensure, pallet_prelude::*};
use sp_core::{H160, H256};
use sp_std::prelude::*;

use crate::{
    types::{self, OwnerKind, TokenPair},
    Allowances, Config, ContractEngine, DenomOf, Error, Event, Pallet, TokenPairIdByContract,
    TokenPairIdByDenom, TokenPairOf, TokenPairs,
};

impl<T: Config> Pallet<T> {
    /// Insert a pair and both of its indices. A collision on either key is rejected
    /// even if the other key is free.
    pub fn set_token(pair: TokenPairOf<T>) -> Result<H256, DispatchError> {
        ensure!(
            !TokenPairIdByDenom::<T>::contains_key(&pair.denom),
            Error::<T>::TokenPairAlreadyExists
        );
        ensure!(
            !TokenPairIdByContract::<T>::contains_key(pair.erc20_address),
            Error::<T>::TokenPairAlreadyExists
        );

        let id = pair.id();
        TokenPairIdByDenom::<T>::insert(&pair.denom, id);
        TokenPairIdByContract::<T>::insert(pair.erc20_address, id);
        TokenPairs::<T>::insert(id, pair);
        Ok(id)
    }

    /// Resolve a token reference to a pair id.
    ///
    /// Anything shaped like a hex contract address goes to the contract index,
    /// everything else to the denom index.
    pub fn token_pair_id(token: &[u8]) -> Option<H256> {
        match types::parse_hex_address(token) {
            Some(address) => TokenPairIdByContract::<T>::get(address),
            None => {
                let denom: DenomOf<T> = token.to_vec().try_into().ok()?;
                TokenPairIdByDenom::<T>::get(denom)
            }
        }
    }

    pub fn token_pair_by_denom(denom: &[u8]) -> Option<TokenPairOf<T>> {
        let denom: DenomOf<T> = denom.to_vec().try_into().ok()?;
        TokenPairIdByDenom::<T>::get(denom).and_then(TokenPairs::<T>::get)
    }

    pub fn token_pair_by_contract(address: H160) -> Option<TokenPairOf<T>> {
        TokenPairIdByContract::<T>::get(address).and_then(TokenPairs::<T>::get)
    }

    /// All registered pairs, in storage order.
    pub fn token_pairs() -> Vec<TokenPairOf<T>> {
        TokenPairs::<T>::iter_values().collect()
    }

    /// Remove a pair, both indices and every allowance granted on its contract.
    pub fn delete_token_pair(pair: &TokenPairOf<T>) {
        let id = pair.id();
        TokenPairs::<T>::remove(id);
        TokenPairIdByDenom::<T>::remove(&pair.denom);
        TokenPairIdByContract::<T>::remove(pair.erc20_address);
        let _ = Allowances::<T>::clear_prefix(pair.erc20_address, u32::MAX, None);
    }

    pub fn set_enabled(id: H256, enabled: bool) -> DispatchResult {
        TokenPairs::<T>::try_mutate(id, |maybe_pair| {
            let pair = maybe_pair.as_mut().ok_or(Error::<T>::TokenPairNotFound)?;
            pair.enabled = enabled;
            Ok(())
        })
    }

    pub fn set_owner(id: H256, owner: T::AccountId) -> DispatchResult {
        TokenPairs::<T>::try_mutate(id, |maybe_pair| {
            let pair = maybe_pair.as_mut().ok_or(Error::<T>::TokenPairNotFound)?;
            pair.owner_address = Some(owner);
            Ok(())
        })
    }

    /// Flip the enabled flag and return the new value.
    pub(crate) fn toggle_pair(id: H256) -> Result<bool, DispatchError> {
        let pair = TokenPairs::<T>::get(id).ok_or(Error::<T>::TokenPairNotFound)?;
        let enabled = !pair.enabled;
        Self::set_enabled(id, enabled)?;
        Ok(enabled)
    }

    /// Register an already deployed contract as an externally owned pair.
    pub(crate) fn register_external_contract(contract: H160) -> Result<H256, DispatchError> {
        let account = T::ContractEngine::account(contract).ok_or(Error::<T>::NotAContract)?;
        ensure!(account.is_contract, Error::<T>::NotAContract);

        let denom: DenomOf<T> = types::erc20_denom(&contract)
            .try_into()
            .map_err(|_| Error::<T>::DenomTooLong)?;
        let pair = TokenPair::new(contract, denom.clone(), OwnerKind::External, None);
        let id = Self::set_token(pair)?;

        Self::deposit_event(Event::TokenPairRegistered {
            id,
            denom,
            erc20_address: contract,
            contract_owner: OwnerKind::External,
        });
        Ok(id)
    }

    /// Expose a native coin at its derived precompile address.
    pub(crate) fn register_native_coin(
        denom: Vec<u8>,
        owner: Option<T::AccountId>,
    ) -> Result<H256, DispatchError> {
        let erc20_address = types::coin_address(&denom);
        let occupied = T::ContractEngine::account(erc20_address)
            .map(|account| account.is_contract)
            .unwrap_or(false);
        ensure!(!occupied, Error::<T>::TokenPairAlreadyExists);

        let denom: DenomOf<T> = denom.try_into().map_err(|_| Error::<T>::DenomTooLong)?;
        let pair = TokenPair::new(erc20_address, denom.clone(), OwnerKind::Module, owner);
        let id = Self::set_token(pair)?;

        Self::deposit_event(Event::TokenPairRegistered {
            id,
            denom,
            erc20_address,
            contract_owner: OwnerKind::Module,
        });
        Ok(id)
    }
}
