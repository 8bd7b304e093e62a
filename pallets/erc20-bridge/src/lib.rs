#![cfg_attr(not(feature = "std"), no_std)]
// Allow deprecated getter attribute (storage getters are still used by the tests)
#![allow(deprecated)]
#![allow(clippy::let_unit_value)]

//! Token pair registry and conversion bridge between the native ledger and the
//! contract ledger.
//!
//! A [`TokenPair`] binds a native denomination to a contract address. Value moves
//! between the two representations only through:
//!
//! - the conversion engine ([`Pallet::convert_coin`] / [`Pallet::convert_erc20`])
//!   for pairs whose contract is authoritative ([`OwnerKind::External`]),
//! - the ERC-20 precompile ([`precompile::Erc20Precompile`]) for pairs whose native
//!   coin is authoritative ([`OwnerKind::Module`]),
//! - the packet adapter ([`ibc`]) which converts inbound transfers and refunds.
//!
//! Every path checks the balance it was supposed to move after the fact and aborts
//! the whole state transition when the numbers disagree.

extern crate alloc;

use frame_support::{
    dispatch::DispatchResult, ensure, pallet_prelude::*, traits::EnsureOrigin, PalletId,
};
use frame_system::{ensure_signed, pallet_prelude::*};
use sp_core::{H160, H256};
use sp_runtime::traits::AccountIdConversion;
use sp_std::prelude::*;

pub use pallet::*;

pub mod abi;
mod allowance;
mod conversion;
pub mod ibc;
pub mod migrations;
pub mod precompile;
mod registry;
pub mod traits;
pub mod types;
pub mod weights;

#[cfg(test)]
mod mock;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub use traits::{AccountCodec, AddressMapping, ContractEngine, NativeLedger};
pub use types::{Amount, BridgeParams, OwnerKind, TokenPair};
pub use weights::WeightInfo;

/// The current storage version.
const STORAGE_VERSION: StorageVersion = StorageVersion::new(1);

pub(crate) const LOG_TARGET: &str = "runtime::erc20-bridge";

/// Native denomination bounded by the runtime's limit.
pub type DenomOf<T> = BoundedVec<u8, <T as Config>::MaxDenomLength>;

pub type TokenPairOf<T> =
    TokenPair<<T as frame_system::Config>::AccountId, <T as Config>::MaxDenomLength>;

#[frame_support::pallet]
pub mod pallet {
    use super::*;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Governance authority: registers native coins, toggles pairs, updates params.
        type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        type NativeLedger: NativeLedger<Self::AccountId>;

        type ContractEngine: ContractEngine;

        type AddressMapping: AddressMapping<Self::AccountId>;

        /// Decodes account strings found in packet data.
        type AccountCodec: AccountCodec<Self::AccountId>;

        /// Identifier of the module account that escrows native coins. The custodial
        /// contract-ledger address is the mapped address of the same account.
        #[pallet::constant]
        type PalletId: Get<PalletId>;

        /// Canonical fee denomination whose balance the contract engine caches.
        type FeeDenom: Get<&'static [u8]>;

        /// Decimals of the fee denomination on the native ledger.
        #[pallet::constant]
        type FeeDenomDecimals: Get<u8>;

        #[pallet::constant]
        type MaxDenomLength: Get<u32>;

        type WeightInfo: WeightInfo;

        #[cfg(feature = "runtime-benchmarks")]
        type BenchmarkHelper: traits::BenchmarkHelper;
    }

    #[pallet::pallet]
    #[pallet::storage_version(STORAGE_VERSION)]
    pub struct Pallet<T>(_);

    /// Module parameters
    #[pallet::storage]
    #[pallet::getter(fn params)]
    pub type Params<T> = StorageValue<_, BridgeParams, ValueQuery>;

    /// Registered token pairs by pair id
    #[pallet::storage]
    #[pallet::getter(fn token_pair)]
    pub type TokenPairs<T: Config> = StorageMap<_, Identity, H256, TokenPairOf<T>, OptionQuery>;

    /// Pair id by native denomination
    #[pallet::storage]
    pub type TokenPairIdByDenom<T: Config> =
        StorageMap<_, Blake2_128Concat, DenomOf<T>, H256, OptionQuery>;

    /// Pair id by contract address
    #[pallet::storage]
    pub type TokenPairIdByContract<T> = StorageMap<_, Blake2_128Concat, H160, H256, OptionQuery>;

    /// Authorized spend: contract address -> (owner, spender) -> amount.
    /// Zero allowances are never stored.
    #[pallet::storage]
    pub type Allowances<T> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        H160,
        Blake2_128Concat,
        (H160, H160),
        Amount,
        OptionQuery,
    >;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// A token pair was added to the registry
        TokenPairRegistered {
            id: H256,
            denom: DenomOf<T>,
            erc20_address: H160,
            contract_owner: OwnerKind,
        },
        /// Conversion for a pair was switched on or off
        ConversionToggled { id: H256, enabled: bool },
        /// Native coins were converted into contract tokens
        CoinConverted {
            sender: T::AccountId,
            receiver: H160,
            amount: Amount,
            denom: DenomOf<T>,
            erc20_address: H160,
        },
        /// Contract tokens were converted into native coins
        Erc20Converted {
            sender: H160,
            receiver: T::AccountId,
            amount: Amount,
            denom: DenomOf<T>,
            erc20_address: H160,
        },
        /// A pair backed by a self-destructed contract was removed
        TokenPairDeleted { id: H256, erc20_address: H160 },
        /// Owner of a module-owned pair changed
        OwnershipTransferred { id: H256, new_owner: T::AccountId },
        /// Owner minted native coins of a module-owned pair
        CoinsMinted { to: T::AccountId, amount: Amount, denom: DenomOf<T> },
        /// Native coins of a module-owned pair were burned
        CoinsBurned { from: T::AccountId, amount: Amount, denom: DenomOf<T> },
        /// Module parameters were replaced
        ParamsUpdated { params: BridgeParams },
        /// Refunded coins could not be converted back into contract tokens
        ConversionFailed {
            sender: T::AccountId,
            amount: Amount,
            denom: DenomOf<T>,
            erc20_address: H160,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// Registration and conversion are disabled by governance
        Erc20Disabled,
        TokenPairNotFound,
        TokenPairAlreadyExists,
        /// Conversion is disabled for this pair
        TokenPairDisabled,
        UndefinedOwner,
        /// Module-owned pairs cannot be converted manually
        NativeConversionDisabled,
        /// Post-operation balance check failed
        BalanceInvariance,
        ZeroAmount,
        /// Contract engine call reverted or could not be executed
        ContractCallFailed,
        /// Token contract reported an unsuccessful transfer
        TransferFailed,
        /// Token contract returned no value and emitted no transfer log
        ExpectedTransferEvent,
        AbiDecodeFailed,
        SenderIsNotOwner,
        NonNativeCoinMintingDisabled,
        NonNativeCoinBurningDisabled,
        NonNativeTransferOwnershipDisabled,
        InsufficientAllowance,
        AllowanceOverflow,
        AmountOverflow,
        /// Transfers of this denomination are disabled on the native ledger
        SendDisabled,
        /// Receiver may not hold funds
        ReceiverBlocked,
        DenomTooLong,
        /// Address holds no contract code
        NotAContract,
        /// Fee denomination has more than 18 decimals
        UnsupportedDecimals,
        /// Packet data is not a fungible token transfer
        InvalidPacket,
        /// Contract backing the pair no longer exists
        SelfDestructedContract,
    }

    #[pallet::hooks]
    impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
        #[cfg(feature = "try-runtime")]
        fn try_state(_n: BlockNumberFor<T>) -> Result<(), sp_runtime::TryRuntimeError> {
            Self::do_try_state()
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Register externally owned contracts. Permissionless unless the module
        /// parameters say otherwise.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::register_erc20(contracts.len() as u32))]
        pub fn register_erc20(origin: OriginFor<T>, contracts: Vec<H160>) -> DispatchResult {
            Self::ensure_registrar(origin)?;
            ensure!(Self::is_erc20_enabled(), Error::<T>::Erc20Disabled);

            for contract in contracts {
                Self::register_external_contract(contract)?;
            }
            Ok(())
        }

        /// Expose a native coin through the ERC-20 precompile.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::register_coin())]
        pub fn register_coin(
            origin: OriginFor<T>,
            denom: Vec<u8>,
            owner: Option<T::AccountId>,
        ) -> DispatchResult {
            T::AdminOrigin::ensure_origin(origin)?;
            ensure!(Self::is_erc20_enabled(), Error::<T>::Erc20Disabled);
            Self::register_native_coin(denom, owner)?;
            Ok(())
        }

        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::toggle_conversion())]
        pub fn toggle_conversion(origin: OriginFor<T>, token: Vec<u8>) -> DispatchResult {
            T::AdminOrigin::ensure_origin(origin)?;
            ensure!(Self::is_erc20_enabled(), Error::<T>::Erc20Disabled);

            let id = Self::token_pair_id(&token).ok_or(Error::<T>::TokenPairNotFound)?;
            let enabled = Self::toggle_pair(id)?;
            Self::deposit_event(Event::ConversionToggled { id, enabled });
            Ok(())
        }

        /// Convert native coins of an externally owned pair into contract tokens.
        #[pallet::call_index(3)]
        #[pallet::weight(T::WeightInfo::convert_coin())]
        pub fn convert_coin(
            origin: OriginFor<T>,
            denom: Vec<u8>,
            amount: Amount,
            receiver: H160,
        ) -> DispatchResult {
            let sender = ensure_signed(origin)?;
            let receiver_account = T::AddressMapping::into_account_id(receiver);
            let id = Self::token_pair_id(&denom);
            let pair = Self::ensure_conversion_enabled(&receiver_account, id)?;

            match pair.contract_owner {
                OwnerKind::External => {
                    if Self::remove_if_self_destructed(&pair) {
                        return Ok(());
                    }
                    Self::convert_native_to_contract(&pair, amount, &sender, receiver)?;
                    Self::deposit_event(Event::CoinConverted {
                        sender,
                        receiver,
                        amount,
                        denom: pair.denom,
                        erc20_address: pair.erc20_address,
                    });
                    Ok(())
                }
                OwnerKind::Module => Err(Error::<T>::NativeConversionDisabled.into()),
                OwnerKind::Unspecified => Err(Error::<T>::UndefinedOwner.into()),
            }
        }

        /// Convert contract tokens of an externally owned pair into native coins.
        #[pallet::call_index(4)]
        #[pallet::weight(T::WeightInfo::convert_erc20())]
        pub fn convert_erc20(
            origin: OriginFor<T>,
            contract: H160,
            amount: Amount,
            receiver: T::AccountId,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let sender = T::AddressMapping::into_address(&who);
            let id = TokenPairIdByContract::<T>::get(contract);
            let pair = Self::ensure_conversion_enabled(&receiver, id)?;

            match pair.contract_owner {
                OwnerKind::External => {
                    if Self::remove_if_self_destructed(&pair) {
                        return Ok(());
                    }
                    Self::convert_contract_to_native(&pair, amount, sender, &receiver)?;
                    Self::deposit_event(Event::Erc20Converted {
                        sender,
                        receiver,
                        amount,
                        denom: pair.denom,
                        erc20_address: pair.erc20_address,
                    });
                    Ok(())
                }
                OwnerKind::Module => Err(Error::<T>::NativeConversionDisabled.into()),
                OwnerKind::Unspecified => Err(Error::<T>::UndefinedOwner.into()),
            }
        }

        /// Hand ownership of a module-owned pair to another account. Only the
        /// current owner may call this.
        #[pallet::call_index(5)]
        #[pallet::weight(T::WeightInfo::transfer_ownership())]
        pub fn transfer_ownership(
            origin: OriginFor<T>,
            token: Vec<u8>,
            new_owner: T::AccountId,
        ) -> DispatchResult {
            let sender = ensure_signed(origin)?;
            Self::do_transfer_ownership(Some(&sender), Self::token_pair_id(&token), new_owner)
        }

        /// Governance variant of [`Pallet::transfer_ownership`].
        #[pallet::call_index(6)]
        #[pallet::weight(T::WeightInfo::transfer_ownership())]
        pub fn force_transfer_ownership(
            origin: OriginFor<T>,
            token: Vec<u8>,
            new_owner: T::AccountId,
        ) -> DispatchResult {
            T::AdminOrigin::ensure_origin(origin)?;
            Self::do_transfer_ownership(None, Self::token_pair_id(&token), new_owner)
        }

        #[pallet::call_index(7)]
        #[pallet::weight(T::WeightInfo::update_params())]
        pub fn update_params(origin: OriginFor<T>, params: BridgeParams) -> DispatchResult {
            T::AdminOrigin::ensure_origin(origin)?;
            Params::<T>::put(params);
            Self::deposit_event(Event::ParamsUpdated { params });
            Ok(())
        }
    }

    #[pallet::genesis_config]
    #[derive(frame_support::DefaultNoBound)]
    pub struct GenesisConfig<T: Config> {
        pub params: BridgeParams,
        /// Pairs seeded at genesis: (contract address, denom, owner kind, owner, enabled)
        pub token_pairs: Vec<(H160, Vec<u8>, OwnerKind, Option<T::AccountId>, bool)>,
    }

    #[pallet::genesis_build]
    impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
        fn build(&self) {
            Params::<T>::put(self.params);

            for (erc20_address, denom, contract_owner, owner, enabled) in &self.token_pairs {
                let denom: DenomOf<T> =
                    denom.clone().try_into().expect("Genesis denom exceeds MaxDenomLength");
                let mut pair =
                    TokenPair::new(*erc20_address, denom, *contract_owner, owner.clone());
                pair.enabled = *enabled;
                Pallet::<T>::set_token(pair).expect("Genesis token pairs must be unique");
            }
        }
    }
}

impl<T: Config> Pallet<T> {
    /// Native account holding escrowed coins.
    pub fn module_account() -> T::AccountId {
        T::PalletId::get().into_account_truncating()
    }

    /// Contract-ledger address holding escrowed tokens.
    pub fn module_address() -> H160 {
        T::AddressMapping::into_address(&Self::module_account())
    }

    pub fn is_erc20_enabled() -> bool {
        Params::<T>::get().enable_erc20
    }

    fn ensure_registrar(origin: OriginFor<T>) -> DispatchResult {
        if Params::<T>::get().permissionless_registration && ensure_signed(origin.clone()).is_ok() {
            return Ok(());
        }
        T::AdminOrigin::ensure_origin(origin)?;
        Ok(())
    }

    /// Hand a module owned pair to `new_owner`. `sender` must be the current owner
    /// unless the change comes from governance (`None`).
    pub fn do_transfer_ownership(
        sender: Option<&T::AccountId>,
        id: Option<H256>,
        new_owner: T::AccountId,
    ) -> DispatchResult {
        let id = id.ok_or(Error::<T>::TokenPairNotFound)?;
        let pair = TokenPairs::<T>::get(id).ok_or(Error::<T>::TokenPairNotFound)?;
        if let Some(sender) = sender {
            ensure!(pair.is_owner(sender), Error::<T>::SenderIsNotOwner);
        }
        ensure!(pair.is_native_coin(), Error::<T>::NonNativeTransferOwnershipDisabled);

        Self::set_owner(id, new_owner.clone())?;
        Self::deposit_event(Event::OwnershipTransferred { id, new_owner });
        Ok(())
    }

    /// Check that every pair is reachable through both secondary indices and that
    /// no index entry or allowance points at a missing pair.
    #[cfg(any(feature = "try-runtime", test))]
    pub fn do_try_state() -> Result<(), sp_runtime::TryRuntimeError> {
        for (id, pair) in TokenPairs::<T>::iter() {
            ensure!(pair.id() == id, "pair stored under a foreign id");
            ensure!(
                TokenPairIdByDenom::<T>::get(&pair.denom) == Some(id),
                "denom index out of sync"
            );
            ensure!(
                TokenPairIdByContract::<T>::get(pair.erc20_address) == Some(id),
                "contract index out of sync"
            );
        }
        for (_, id) in TokenPairIdByDenom::<T>::iter() {
            ensure!(TokenPairs::<T>::contains_key(id), "dangling denom index entry");
        }
        for (_, id) in TokenPairIdByContract::<T>::iter() {
            ensure!(TokenPairs::<T>::contains_key(id), "dangling contract index entry");
        }
        for (contract, _, amount) in Allowances::<T>::iter() {
            ensure!(!amount.is_zero(), "zero allowance stored");
            ensure!(
                TokenPairIdByContract::<T>::contains_key(contract),
                "allowance for unregistered contract"
            );
        }
        Ok(())
    }
}
