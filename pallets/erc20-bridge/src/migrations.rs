//! Storage migrations for pallet-erc20-bridge.
//!
//! Every migration is gated on the on-chain storage version and bumps it when done,
//! so running one twice is harmless.
//!
//! # Adding a migration
//!
//! 1. Bump `STORAGE_VERSION` in `lib.rs`
//! 2. Add a `vN` module with a `MigrateToVN` implementing `OnRuntimeUpgrade`
//! 3. Cover it with tests below (from the old version, idempotence, skipped on newer)
//! 4. Append it to the runtime's `Executive` migration tuple:
//!
//! ```ignore
//! pub type Executive = frame_executive::Executive<
//!     Runtime,
//!     Block,
//!     frame_system::ChainContext<Runtime>,
//!     Runtime,
//!     AllPalletsWithSystem,
//!     (pallet_erc20_bridge::migrations::v1::MigrateToV1<Runtime>,),
//! >;
//! ```

use frame_support::{pallet_prelude::*, traits::OnRuntimeUpgrade};
use sp_std::marker::PhantomData;

use crate::{Config, Pallet, TokenPairIdByContract, TokenPairIdByDenom, TokenPairs, LOG_TARGET};

/// Version 0 stored only the pairs themselves. Version 1 adds the denom and
/// contract lookup indices, rebuilt here from the stored pairs.
pub mod v1 {
    use super::*;

    pub struct MigrateToV1<T>(PhantomData<T>);

    impl<T: Config> OnRuntimeUpgrade for MigrateToV1<T> {
        fn on_runtime_upgrade() -> Weight {
            let on_chain_version = Pallet::<T>::on_chain_storage_version();

            if on_chain_version >= 1 {
                log::info!(
                    target: LOG_TARGET,
                    "Storage already at v{on_chain_version:?}, skipping v1 migration"
                );
                return T::DbWeight::get().reads(1);
            }

            let mut indexed: u64 = 0;
            let mut skipped: u64 = 0;
            for (id, pair) in TokenPairs::<T>::iter() {
                // Pairs keyed under a stale id or colliding with an indexed pair
                // are left unindexed and reported.
                if id != pair.id()
                    || TokenPairIdByDenom::<T>::contains_key(&pair.denom)
                    || TokenPairIdByContract::<T>::contains_key(pair.erc20_address)
                {
                    log::warn!(
                        target: LOG_TARGET,
                        "Not indexing token pair {id:?} for {:?}",
                        pair.erc20_address
                    );
                    skipped += 1;
                    continue;
                }
                TokenPairIdByDenom::<T>::insert(&pair.denom, id);
                TokenPairIdByContract::<T>::insert(pair.erc20_address, id);
                indexed += 1;
            }

            StorageVersion::new(1).put::<Pallet<T>>();
            log::info!(
                target: LOG_TARGET,
                "Migrated to v1: indexed {indexed} token pairs, skipped {skipped}"
            );

            let pairs = indexed + skipped;
            T::DbWeight::get().reads_writes(1 + pairs * 3, 1 + indexed * 2)
        }

        #[cfg(feature = "try-runtime")]
        fn pre_upgrade() -> Result<sp_std::vec::Vec<u8>, sp_runtime::TryRuntimeError> {
            let on_chain_version = Pallet::<T>::on_chain_storage_version();
            let pairs = TokenPairs::<T>::iter_keys().count() as u32;
            log::info!(
                target: LOG_TARGET,
                "Pre-upgrade: storage version {on_chain_version:?}, {pairs} token pairs"
            );
            Ok((on_chain_version, pairs).encode())
        }

        #[cfg(feature = "try-runtime")]
        fn post_upgrade(state: sp_std::vec::Vec<u8>) -> Result<(), sp_runtime::TryRuntimeError> {
            let (pre_version, pre_pairs): (StorageVersion, u32) =
                Decode::decode(&mut &state[..])
                    .map_err(|_| sp_runtime::TryRuntimeError::Other("Failed to decode pre-state"))?;

            ensure!(
                Pallet::<T>::on_chain_storage_version() >= 1,
                sp_runtime::TryRuntimeError::Other("Migration to v1 did not complete")
            );
            ensure!(
                TokenPairs::<T>::iter_keys().count() as u32 == pre_pairs,
                sp_runtime::TryRuntimeError::Other("Token pairs changed during migration")
            );
            if pre_version < 1 {
                Pallet::<T>::do_try_state()?;
            }
            Ok(())
        }
    }
}
