use frame_support::{ensure, pallet_prelude::*};
use sp_core::H160;

use crate::{Allowances, Amount, Config, Error, Pallet, TokenPairIdByContract};

impl<T: Config> Pallet<T> {
    /// Stored allowance, `None` when nothing was ever approved or it was used up.
    pub fn allowance(contract: H160, owner: H160, spender: H160) -> Option<Amount> {
        Allowances::<T>::get(contract, (owner, spender))
    }

    /// Overwrite an allowance. Setting zero removes the record.
    pub fn set_allowance(
        contract: H160,
        owner: H160,
        spender: H160,
        amount: Amount,
    ) -> DispatchResult {
        ensure!(
            TokenPairIdByContract::<T>::contains_key(contract),
            Error::<T>::TokenPairNotFound
        );
        if amount.is_zero() {
            Allowances::<T>::remove(contract, (owner, spender));
        } else {
            Allowances::<T>::insert(contract, (owner, spender), amount);
        }
        Ok(())
    }

    /// Add to the current allowance and return the new value.
    pub fn increase_allowance(
        contract: H160,
        owner: H160,
        spender: H160,
        added: Amount,
    ) -> Result<Amount, DispatchError> {
        let current = Self::allowance(contract, owner, spender).unwrap_or_default();
        let updated = current.checked_add(added).ok_or(Error::<T>::AllowanceOverflow)?;
        Self::set_allowance(contract, owner, spender, updated)?;
        Ok(updated)
    }

    /// Consume `amount` of the allowance `owner` granted to `spender` and return
    /// what is left. A record that reaches zero is deleted.
    pub fn decrease_allowance(
        contract: H160,
        owner: H160,
        spender: H160,
        amount: Amount,
    ) -> Result<Amount, DispatchError> {
        let current = Self::allowance(contract, owner, spender).unwrap_or_default();
        let remaining = current.checked_sub(amount).ok_or(Error::<T>::InsufficientAllowance)?;
        Self::set_allowance(contract, owner, spender, remaining)?;
        Ok(remaining)
    }
}
