use crate as pallet_erc20_bridge;
use crate::{
    abi::{
        self,
        IERC20::{self, IERC20Calls},
    },
    types::{CallOutcome, ContractAccount},
    AccountCodec, AddressMapping, Amount, ContractEngine, NativeLedger,
};
use alloy_sol_types::{SolCall, SolInterface};
use codec::{Decode, Encode};
use frame_support::{
    derive_impl, parameter_types,
    pallet_prelude::{OptionQuery, ValueQuery},
    traits::{ConstU32, ConstU64},
    Blake2_128Concat, PalletId,
};
use sp_core::{H160, H256, U256};
use sp_runtime::{
    traits::{BlakeTwo256, IdentityLookup},
    BuildStorage, DispatchError, DispatchResult, TokenError,
};

type Block = frame_system::mocking::MockBlock<Test>;

// Configure a mock runtime to test the pallet.
frame_support::construct_runtime!(
    pub enum Test {
        System: frame_system,
        Erc20Bridge: pallet_erc20_bridge,
    }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
    type BaseCallFilter = frame_support::traits::Everything;
    type BlockWeights = ();
    type BlockLength = ();
    type DbWeight = ();
    type RuntimeOrigin = RuntimeOrigin;
    type RuntimeCall = RuntimeCall;
    type Nonce = u64;
    type Hash = H256;
    type Hashing = BlakeTwo256;
    type AccountId = u64;
    type Lookup = IdentityLookup<Self::AccountId>;
    type Block = Block;
    type RuntimeEvent = RuntimeEvent;
    type BlockHashCount = ConstU64<250>;
    type Version = ();
    type PalletInfo = PalletInfo;
    type AccountData = ();
    type OnNewAccount = ();
    type OnKilledAccount = ();
    type SystemWeightInfo = ();
    type SS58Prefix = ();
    type OnSetCode = ();
    type MaxConsumers = ConstU32<16>;
}

pub const ADMIN: u64 = 1;
pub const ALICE: u64 = 2;
pub const BOB: u64 = 3;
pub const CAROL: u64 = 4;
pub const DAVE: u64 = 5;

pub const FEE_DENOM: &[u8] = b"ufee";

parameter_types! {
    pub const AdminAccount: u64 = ADMIN;
    pub const BridgePalletId: PalletId = PalletId(*b"erc20brg");
    pub const FeeDenom: &'static [u8] = FEE_DENOM;
    pub const FeeDenomDecimals: u8 = 6;
    pub const MaxDenomLength: u32 = 128;
}

pub struct EnsureAdmin;
impl frame_support::traits::EnsureOrigin<RuntimeOrigin> for EnsureAdmin {
    type Success = u64;

    fn try_origin(o: RuntimeOrigin) -> Result<Self::Success, RuntimeOrigin> {
        match o.clone().into() {
            Ok(frame_system::RawOrigin::Signed(account)) if account == AdminAccount::get() => {
                Ok(account)
            }
            _ => Err(o),
        }
    }

    #[cfg(feature = "runtime-benchmarks")]
    fn try_successful_origin() -> Result<RuntimeOrigin, ()> {
        Ok(RuntimeOrigin::signed(AdminAccount::get()))
    }
}

// ============================================================================
// Mock native ledger
// ============================================================================

#[frame_support::storage_alias(verbatim)]
pub type NativeBalances = StorageDoubleMap<
    MockLedgerState,
    Blake2_128Concat,
    u64,
    Blake2_128Concat,
    Vec<u8>,
    Amount,
    ValueQuery,
>;

#[frame_support::storage_alias(verbatim)]
pub type NativeSupply =
    StorageMap<MockLedgerState, Blake2_128Concat, Vec<u8>, Amount, ValueQuery>;

#[frame_support::storage_alias(verbatim)]
pub type SendDisabled = StorageMap<MockLedgerState, Blake2_128Concat, Vec<u8>, bool, ValueQuery>;

#[frame_support::storage_alias(verbatim)]
pub type BlockedAccounts = StorageMap<MockLedgerState, Blake2_128Concat, u64, bool, ValueQuery>;

pub struct MockLedger;

impl MockLedger {
    fn move_coins(from: &u64, to: &u64, denom: &[u8], amount: Amount) -> DispatchResult {
        if SendDisabled::get(denom.to_vec()) {
            return Err(DispatchError::Other("send disabled"));
        }
        let remaining = Self::balance(from, denom)
            .checked_sub(amount)
            .ok_or(DispatchError::Token(TokenError::FundsUnavailable))?;
        NativeBalances::insert(from, denom.to_vec(), remaining);
        NativeBalances::mutate(to, denom.to_vec(), |b| *b += amount);
        Ok(())
    }
}

impl NativeLedger<u64> for MockLedger {
    fn balance(who: &u64, denom: &[u8]) -> Amount {
        NativeBalances::get(who, denom.to_vec())
    }

    fn spendable_balance(who: &u64, denom: &[u8]) -> Amount {
        Self::balance(who, denom)
    }

    fn send(from: &u64, to: &u64, denom: &[u8], amount: Amount) -> DispatchResult {
        if BlockedAccounts::get(to) {
            return Err(DispatchError::Other("blocked receiver"));
        }
        Self::move_coins(from, to, denom, amount)
    }

    fn send_to_module(from: &u64, module: &u64, denom: &[u8], amount: Amount) -> DispatchResult {
        Self::move_coins(from, module, denom, amount)
    }

    fn mint(to: &u64, denom: &[u8], amount: Amount) -> DispatchResult {
        NativeBalances::mutate(to, denom.to_vec(), |b| *b += amount);
        NativeSupply::mutate(denom.to_vec(), |s| *s += amount);
        Ok(())
    }

    fn burn(from: &u64, denom: &[u8], amount: Amount) -> DispatchResult {
        let remaining = Self::balance(from, denom)
            .checked_sub(amount)
            .ok_or(DispatchError::Token(TokenError::FundsUnavailable))?;
        NativeBalances::insert(from, denom.to_vec(), remaining);
        NativeSupply::mutate(denom.to_vec(), |s| *s -= amount);
        Ok(())
    }

    fn is_send_enabled(denom: &[u8]) -> bool {
        !SendDisabled::get(denom.to_vec())
    }

    fn set_send_enabled(denom: &[u8], enabled: bool) {
        SendDisabled::insert(denom.to_vec(), !enabled);
    }

    fn is_blocked(who: &u64) -> bool {
        BlockedAccounts::get(who)
    }
}

// ============================================================================
// Mock contract engine
// ============================================================================

/// How a deployed mock token answers `transfer`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Encode, Decode)]
pub enum TokenBehaviour {
    /// Moves the amount, returns `true`, emits `Transfer`
    Standard,
    /// Moves the amount, returns nothing, emits `Transfer`
    NoReturn,
    /// Moves the amount, returns nothing, emits nothing
    Silent,
    /// Moves nothing and returns `false`
    ReturnsFalse,
    /// Returns `true` but delivers one unit less than asked
    Skims,
}

#[frame_support::storage_alias(verbatim)]
pub type Contracts =
    StorageMap<MockEngineState, Blake2_128Concat, H160, TokenBehaviour, OptionQuery>;

#[frame_support::storage_alias(verbatim)]
pub type TokenBalances = StorageDoubleMap<
    MockEngineState,
    Blake2_128Concat,
    H160,
    Blake2_128Concat,
    H160,
    Amount,
    ValueQuery,
>;

#[frame_support::storage_alias(verbatim)]
pub type EngineBalances = StorageMap<MockEngineState, Blake2_128Concat, H160, Amount, ValueQuery>;

pub struct MockEngine;

impl MockEngine {
    fn transfer(
        contract: H160,
        behaviour: TokenBehaviour,
        from: H160,
        to: H160,
        amount: Amount,
    ) -> Result<CallOutcome, DispatchError> {
        if behaviour == TokenBehaviour::ReturnsFalse {
            let return_value = IERC20::transferCall::abi_encode_returns(&(false,));
            return Ok(CallOutcome { return_value, logs: vec![] });
        }

        let remaining = TokenBalances::get(contract, from)
            .checked_sub(amount)
            .ok_or(DispatchError::Other("ERC20: transfer amount exceeds balance"))?;
        TokenBalances::insert(contract, from, remaining);
        let delivered = if behaviour == TokenBehaviour::Skims {
            amount.saturating_sub(U256::one())
        } else {
            amount
        };
        TokenBalances::mutate(contract, to, |b| *b += delivered);

        let event = IERC20::Transfer {
            from: abi::address(from),
            to: abi::address(to),
            value: abi::uint(amount),
        };
        let log = abi::event_log(contract, &event);
        let outcome = match behaviour {
            TokenBehaviour::NoReturn => CallOutcome { return_value: vec![], logs: vec![log] },
            TokenBehaviour::Silent => CallOutcome::default(),
            _ => CallOutcome {
                return_value: IERC20::transferCall::abi_encode_returns(&(true,)),
                logs: vec![log],
            },
        };
        Ok(outcome)
    }
}

impl ContractEngine for MockEngine {
    fn call(
        from: H160,
        contract: H160,
        input: Vec<u8>,
        _commit: bool,
    ) -> Result<CallOutcome, DispatchError> {
        let behaviour = Contracts::get(contract).ok_or(DispatchError::Other("no contract code"))?;
        let call =
            IERC20Calls::abi_decode(&input, true).map_err(|_| DispatchError::Other("bad input"))?;

        match call {
            IERC20Calls::balanceOf(IERC20::balanceOfCall { account }) => {
                let balance = abi::uint(TokenBalances::get(contract, abi::h160(account)));
                let return_value = IERC20::balanceOfCall::abi_encode_returns(&(balance,));
                Ok(CallOutcome { return_value, logs: vec![] })
            }
            IERC20Calls::transfer(IERC20::transferCall { to, amount }) => {
                Self::transfer(contract, behaviour, from, abi::h160(to), abi::amount(amount))
            }
            _ => Err(DispatchError::Other("unknown selector")),
        }
    }

    fn account(address: H160) -> Option<ContractAccount> {
        Contracts::get(address).map(|_| ContractAccount { is_contract: true })
    }

    fn add_balance(address: H160, amount: Amount) {
        EngineBalances::mutate(address, |b| *b += amount);
    }

    fn sub_balance(address: H160, amount: Amount) -> DispatchResult {
        EngineBalances::try_mutate(address, |b| {
            *b = b.checked_sub(amount).ok_or(DispatchError::Token(TokenError::FundsUnavailable))?;
            Ok(())
        })
    }

    fn delete_account(address: H160) {
        Contracts::remove(address);
    }
}

pub struct MockAddressMapping;

impl AddressMapping<u64> for MockAddressMapping {
    fn into_account_id(address: H160) -> u64 {
        address.to_low_u64_be()
    }

    fn into_address(account: &u64) -> H160 {
        H160::from_low_u64_be(*account)
    }
}

/// Packet accounts are plain decimal account ids.
pub struct DecimalAccountCodec;

impl AccountCodec<u64> for DecimalAccountCodec {
    fn decode_account(encoded: &str) -> Option<u64> {
        encoded.parse().ok()
    }
}

impl pallet_erc20_bridge::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type AdminOrigin = EnsureAdmin;
    type NativeLedger = MockLedger;
    type ContractEngine = MockEngine;
    type AddressMapping = MockAddressMapping;
    type AccountCodec = DecimalAccountCodec;
    type PalletId = BridgePalletId;
    type FeeDenom = FeeDenom;
    type FeeDenomDecimals = FeeDenomDecimals;
    type MaxDenomLength = MaxDenomLength;
    type WeightInfo = ();
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper = MockBenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::traits::BenchmarkHelper for MockBenchmarkHelper {
    fn deploy_token(address: H160) {
        Contracts::insert(address, TokenBehaviour::Standard);
    }

    fn set_token_balance(contract: H160, holder: H160, amount: Amount) {
        TokenBalances::insert(contract, holder, amount);
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn addr(account: u64) -> H160 {
    MockAddressMapping::into_address(&account)
}

pub fn deploy_token(address: H160, behaviour: TokenBehaviour) {
    Contracts::insert(address, behaviour);
}

/// Remove the code of a token while leaving its balances behind.
pub fn self_destruct(address: H160) {
    MockEngine::delete_account(address);
}

pub fn set_token_balance(contract: H160, holder: H160, amount: u128) {
    TokenBalances::insert(contract, holder, Amount::from(amount));
}

pub fn token_balance(contract: H160, holder: H160) -> Amount {
    TokenBalances::get(contract, holder)
}

pub fn token_supply(contract: H160) -> Amount {
    TokenBalances::iter_prefix_values(contract).fold(Amount::zero(), |acc, b| acc + b)
}

pub fn fund_native(who: u64, denom: &[u8], amount: u128) {
    assert!(MockLedger::mint(&who, denom, Amount::from(amount)).is_ok());
}

pub fn native_balance(who: u64, denom: &[u8]) -> Amount {
    MockLedger::balance(&who, denom)
}

pub fn native_supply(denom: &[u8]) -> Amount {
    NativeSupply::get(denom.to_vec())
}

pub fn engine_balance(address: H160) -> Amount {
    EngineBalances::get(address)
}

pub fn block(who: u64) {
    BlockedAccounts::insert(who, true);
}

// Build genesis storage according to the mock runtime.
pub fn new_test_ext() -> sp_io::TestExternalities {
    new_test_ext_with_pairs(vec![])
}

pub fn new_test_ext_with_pairs(
    token_pairs: Vec<(H160, Vec<u8>, crate::OwnerKind, Option<u64>, bool)>,
) -> sp_io::TestExternalities {
    let mut t = frame_system::GenesisConfig::<Test>::default().build_storage().unwrap();

    pallet_erc20_bridge::GenesisConfig::<Test> { params: Default::default(), token_pairs }
        .assimilate_storage(&mut t)
        .unwrap();

    let mut ext: sp_io::TestExternalities = t.into();
    ext.execute_with(|| {
        System::set_block_number(1);
        // Module accounts never receive ordinary sends.
        block(Erc20Bridge::module_account());
    });
    ext
}
