//! Benchmarking setup for pallet-erc20-bridge

use super::*;

#[allow(unused)]
use crate::Pallet as Erc20Bridge;
use crate::traits::BenchmarkHelper;
use frame_benchmarking::v2::*;
use frame_system::RawOrigin;

const DENOM: &[u8] = b"ubench";

fn bench_token(index: u32) -> H160 {
    H160::from_low_u64_be(0x1000 + index as u64)
}

/// Deploy and register an externally owned token, returning its address.
fn external_pair<T: Config>() -> H160 {
    let token = bench_token(0);
    T::BenchmarkHelper::deploy_token(token);
    Pallet::<T>::register_external_contract(token).expect("register token");
    token
}

fn module_pair<T: Config>(owner: T::AccountId) {
    Pallet::<T>::register_native_coin(DENOM.to_vec(), Some(owner)).expect("register coin");
}

#[benchmarks]
mod benchmarks {
    use super::*;

    #[benchmark]
    fn register_erc20(n: Linear<1, 16>) {
        let contracts: Vec<H160> = (0..n).map(bench_token).collect();
        for contract in &contracts {
            T::BenchmarkHelper::deploy_token(*contract);
        }
        let origin = T::AdminOrigin::try_successful_origin().expect("Admin origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, contracts.clone());

        assert_eq!(TokenPairs::<T>::iter_keys().count(), n as usize);
    }

    #[benchmark]
    fn register_coin() {
        let owner: T::AccountId = account("owner", 0, 0);
        let origin = T::AdminOrigin::try_successful_origin().expect("Admin origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, DENOM.to_vec(), Some(owner));

        assert!(Erc20Bridge::<T>::token_pair_by_denom(DENOM).is_some());
    }

    #[benchmark]
    fn toggle_conversion() {
        module_pair::<T>(account("owner", 0, 0));
        let origin = T::AdminOrigin::try_successful_origin().expect("Admin origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, DENOM.to_vec());

        assert!(!Erc20Bridge::<T>::token_pair_by_denom(DENOM).expect("pair").enabled);
    }

    #[benchmark]
    fn convert_coin() {
        let caller: T::AccountId = whitelisted_caller();
        let token = external_pair::<T>();
        let denom = types::erc20_denom(&token);
        let amount = Amount::from(1_000_000u64);

        T::BenchmarkHelper::set_token_balance(token, Erc20Bridge::<T>::module_address(), amount);
        T::NativeLedger::mint(&caller, &denom, amount).expect("fund caller");
        let receiver = T::AddressMapping::into_address(&caller);

        #[extrinsic_call]
        _(RawOrigin::Signed(caller.clone()), denom.clone(), amount, receiver);

        assert!(T::NativeLedger::balance(&caller, &denom).is_zero());
    }

    #[benchmark]
    fn convert_erc20() {
        let caller: T::AccountId = whitelisted_caller();
        let token = external_pair::<T>();
        let denom = types::erc20_denom(&token);
        let amount = Amount::from(1_000_000u64);

        let holder = T::AddressMapping::into_address(&caller);
        T::BenchmarkHelper::set_token_balance(token, holder, amount);

        #[extrinsic_call]
        _(RawOrigin::Signed(caller.clone()), token, amount, caller.clone());

        assert_eq!(T::NativeLedger::balance(&caller, &denom), amount);
    }

    #[benchmark]
    fn transfer_ownership() {
        let caller: T::AccountId = whitelisted_caller();
        let new_owner: T::AccountId = account("new_owner", 0, 0);
        module_pair::<T>(caller.clone());

        #[extrinsic_call]
        _(RawOrigin::Signed(caller), DENOM.to_vec(), new_owner.clone());

        let pair = Erc20Bridge::<T>::token_pair_by_denom(DENOM).expect("pair");
        assert_eq!(pair.owner_address, Some(new_owner));
    }

    #[benchmark]
    fn update_params() {
        let params = BridgeParams { enable_erc20: true, permissionless_registration: false };
        let origin = T::AdminOrigin::try_successful_origin().expect("Admin origin");

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, params);

        assert_eq!(Params::<T>::get(), params);
    }

    impl_benchmark_test_suite!(Erc20Bridge, crate::mock::new_test_ext(), crate::mock::Test);
}
