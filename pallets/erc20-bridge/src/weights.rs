//! Weights for `pallet_erc20_bridge`.
//!
//! Placeholder values until the benchmarks in `benchmarking.rs` are run against a
//! reference machine. Contract engine execution is charged by the engine itself and
//! is not included here.

#![allow(unused_parens)]
#![allow(unused_imports)]

use core::marker::PhantomData;
use frame_support::{traits::Get, weights::Weight};

pub trait WeightInfo {
    fn register_erc20(n: u32) -> Weight;
    fn register_coin() -> Weight;
    fn toggle_conversion() -> Weight;
    fn convert_coin() -> Weight;
    fn convert_erc20() -> Weight;
    fn transfer_ownership() -> Weight;
    fn update_params() -> Weight;
}

/// Weights scaled by the runtime's database costs.
pub struct SubstrateWeight<T>(PhantomData<T>);

impl<T: frame_system::Config> WeightInfo for SubstrateWeight<T> {
    // Reads: Params, TokenPairIdByDenom, TokenPairIdByContract (per contract)
    // Writes: TokenPairs, TokenPairIdByDenom, TokenPairIdByContract (per contract)
    fn register_erc20(n: u32) -> Weight {
        Weight::from_parts(12_000_000, 0)
            .saturating_add(Weight::from_parts(18_000_000, 0).saturating_mul(n.into()))
            .saturating_add(T::DbWeight::get().reads(1))
            .saturating_add(T::DbWeight::get().reads((2_u64).saturating_mul(n.into())))
            .saturating_add(T::DbWeight::get().writes((3_u64).saturating_mul(n.into())))
    }
    fn register_coin() -> Weight {
        Weight::from_parts(20_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(3))
            .saturating_add(T::DbWeight::get().writes(3))
    }
    fn toggle_conversion() -> Weight {
        Weight::from_parts(14_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(3))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn convert_coin() -> Weight {
        Weight::from_parts(45_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(4))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn convert_erc20() -> Weight {
        Weight::from_parts(45_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(4))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn transfer_ownership() -> Weight {
        Weight::from_parts(15_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn update_params() -> Weight {
        Weight::from_parts(8_000_000, 0).saturating_add(T::DbWeight::get().writes(1))
    }
}

// For tests
impl WeightInfo for () {
    fn register_erc20(n: u32) -> Weight {
        Weight::from_parts(10_000, 0).saturating_mul(n.max(1).into())
    }
    fn register_coin() -> Weight {
        Weight::from_parts(10_000, 0)
    }
    fn toggle_conversion() -> Weight {
        Weight::from_parts(10_000, 0)
    }
    fn convert_coin() -> Weight {
        Weight::from_parts(10_000, 0)
    }
    fn convert_erc20() -> Weight {
        Weight::from_parts(10_000, 0)
    }
    fn transfer_ownership() -> Weight {
        Weight::from_parts(10_000, 0)
    }
    fn update_params() -> Weight {
        Weight::from_parts(10_000, 0)
    }
}
