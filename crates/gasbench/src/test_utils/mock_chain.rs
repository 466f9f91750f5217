use std::collections::HashMap;

use alloy_primitives::{keccak256, Address, Bytes, Log, LogData, B256, U256};
use alloy_sol_types::{SolCall, SolEvent, SolInterface, SolValue};
use parking_lot::Mutex;
use tracing::trace;

use crate::{
    client::{ChainClient, TxOutcome},
    config::AddressBook,
    contracts::{
        ICryptoOperations::{self, ICryptoOperationsCalls},
        IDvrf::{self, IDvrfCalls},
        IFlexiRand::{self, IFlexiRandCalls},
        IInstaRand::{self, IInstaRandCalls},
        IStorageOperations::{self, IStorageOperationsCalls},
        IVrf::{self, IVrfCalls},
    },
    error::SubmissionError,
    protocols::Protocol,
};

/// Gas charged for every transaction before execution.
pub const BASE_TX_GAS: u64 = 21_000;

/// Gas charged per calldata byte.
pub const CALLDATA_BYTE_GAS: u64 = 16;

/// Execution gas of the instant VRF fulfillment after a successful pre-verification.
pub const INSTANT_VER_PREVERIFIED_GAS: u64 = 95_000;

/// Execution gas of the instant VRF fulfillment without pre-verification.
pub const INSTANT_VER_FULL_GAS: u64 = 210_000;

/// Receipt gas of a transaction with `calldata_len` bytes of input that executed `exec_gas`.
pub const fn receipt_gas(calldata_len: usize, exec_gas: u64) -> u64 {
    BASE_TX_GAS + CALLDATA_BYTE_GAS * calldata_len as u64 + exec_gas
}

/// The output a contract derives from a curve point or proof pair.
pub fn hash_point(point: &[U256; 2]) -> B256 {
    keccak256(point.abi_encode())
}

/// One transaction seen by the [`MockChain`], in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Sender.
    pub from: Address,
    /// Target contract.
    pub to: Address,
    /// Function selector.
    pub selector: [u8; 4],
    /// Whether the transaction reverted.
    pub reverted: bool,
}

/// An in-memory chain hosting one simulated contract per protocol.
///
/// Contracts enforce step order and request id threading, check that submitted outputs match
/// the proof they were derived from, and meter gas deterministically: the event carries the
/// execution gas and the receipt adds [`receipt_gas`] overhead. Faults can be injected per
/// contract function by call count, counting both transactions and read-only calls.
#[derive(Debug)]
pub struct MockChain {
    inner: Mutex<Inner>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new(8)
    }
}

impl MockChain {
    /// Creates a chain exposing `accounts` funded accounts.
    pub fn new(accounts: usize) -> Self {
        let accounts =
            (1..=accounts as u64).map(|i| Address::left_padding_from(&i.to_be_bytes())).collect();
        Self { inner: Mutex::new(Inner { accounts, ..Default::default() }) }
    }

    /// Deploys a fresh contract for `protocol` and returns its address.
    pub fn deploy(&self, protocol: Protocol) -> Address {
        let mut inner = self.inner.lock();
        let address =
            Address::left_padding_from(&(0xc0de_0000 + inner.contracts.len() as u64).to_be_bytes());
        inner.contracts.insert(address, Contract::new(protocol));
        address
    }

    /// Deploys one contract per protocol.
    pub fn deploy_all(&self) -> AddressBook {
        Protocol::ALL.into_iter().map(|protocol| (protocol, self.deploy(protocol))).collect()
    }

    /// Makes the `n`-th (1-based) invocation of `T` on `contract` revert.
    pub fn fail_nth<T: SolCall>(&self, contract: Address, n: usize) {
        self.inner.lock().faults.entry((contract, T::SELECTOR)).or_default().revert.push(n);
    }

    /// Makes the `n`-th (1-based) invocation of `T` on `contract` succeed without emitting its
    /// event.
    pub fn drop_event_nth<T: SolCall>(&self, contract: Address, n: usize) {
        self.inner.lock().faults.entry((contract, T::SELECTOR)).or_default().drop_event.push(n);
    }

    /// Every transaction submitted so far.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.inner.lock().journal.clone()
    }

    /// Transactions submitted to `contract` calling `T`, reverted ones included.
    pub fn transactions<T: SolCall>(&self, contract: Address) -> Vec<JournalEntry> {
        self.inner
            .lock()
            .journal
            .iter()
            .filter(|entry| entry.to == contract && entry.selector == T::SELECTOR)
            .cloned()
            .collect()
    }
}

impl ChainClient for MockChain {
    async fn accounts(&self) -> Result<Vec<Address>, SubmissionError> {
        Ok(self.inner.lock().accounts.clone())
    }

    async fn send(
        &self,
        from: Address,
        to: Address,
        input: Bytes,
    ) -> Result<TxOutcome, SubmissionError> {
        tokio::task::yield_now().await;
        self.inner.lock().send(from, to, &input)
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, SubmissionError> {
        tokio::task::yield_now().await;
        self.inner.lock().call(to, &input)
    }
}

#[derive(Debug, Default)]
struct Inner {
    accounts: Vec<Address>,
    contracts: HashMap<Address, Contract>,
    faults: HashMap<(Address, [u8; 4]), Faults>,
    journal: Vec<JournalEntry>,
}

impl Inner {
    fn send(
        &mut self,
        from: Address,
        to: Address,
        input: &[u8],
    ) -> Result<TxOutcome, SubmissionError> {
        let tx_hash = keccak256((self.journal.len() as u64).to_be_bytes());
        let selector = selector(input);
        let fault = self.faults.entry((to, selector)).or_default().next();

        let executed = if fault == Fault::Revert {
            Err(Revert("injected fault"))
        } else if !self.accounts.contains(&from) {
            Err(Revert("unknown sender"))
        } else {
            match self.contracts.get_mut(&to) {
                Some(contract) => contract.execute(input),
                None => Err(Revert("no contract")),
            }
        };
        self.journal.push(JournalEntry { from, to, selector, reverted: executed.is_err() });

        match executed {
            Ok(executed) => {
                let logs = match (fault, executed.log) {
                    (Fault::DropEvent, _) | (_, None) => Vec::new(),
                    (_, Some(data)) => vec![Log { address: to, data }],
                };
                Ok(TxOutcome { tx_hash, gas_used: receipt_gas(input.len(), executed.gas), logs })
            }
            Err(Revert(reason)) => {
                trace!(target: "gasbench::mock", %tx_hash, %to, reason, "Reverted");
                Err(SubmissionError::Reverted { tx_hash, to })
            }
        }
    }

    fn call(&mut self, to: Address, input: &[u8]) -> Result<Bytes, SubmissionError> {
        if self.faults.entry((to, selector(input))).or_default().next() == Fault::Revert {
            return Err(SubmissionError::CallReverted(to));
        }
        self.contracts
            .get(&to)
            .ok_or(Revert("no contract"))
            .and_then(|contract| contract.view(input))
            .map_err(|_| SubmissionError::CallReverted(to))
    }
}

fn selector(input: &[u8]) -> [u8; 4] {
    input.get(..4).and_then(|s| s.try_into().ok()).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    None,
    Revert,
    DropEvent,
}

#[derive(Debug, Default)]
struct Faults {
    seen: usize,
    revert: Vec<usize>,
    drop_event: Vec<usize>,
}

impl Faults {
    fn next(&mut self) -> Fault {
        self.seen += 1;
        if self.revert.contains(&self.seen) {
            Fault::Revert
        } else if self.drop_event.contains(&self.seen) {
            Fault::DropEvent
        } else {
            Fault::None
        }
    }
}

#[derive(Debug)]
struct Revert(&'static str);

fn ensure(condition: bool, reason: &'static str) -> Result<(), Revert> {
    condition.then_some(()).ok_or(Revert(reason))
}

struct Executed {
    gas: u64,
    log: Option<LogData>,
}

impl Executed {
    const fn silent(gas: u64) -> Self {
        Self { gas, log: None }
    }

    fn emit<E: SolEvent>(gas: u64, event: impl FnOnce(U256) -> E) -> Self {
        Self { gas, log: Some(event(U256::from(gas)).encode_log_data()) }
    }
}

type Execution = Result<Executed, Revert>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum RequestInput {
    Seed(B256),
    Client { pk: [U256; 2], e: B256 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Requested,
    BlindingSubmitted,
    PreVerified,
    Fulfilled,
}

#[derive(Debug)]
struct Request {
    input: RequestInput,
    stage: Stage,
}

#[derive(Debug)]
struct Contract {
    protocol: Protocol,
    pk_set: bool,
    last_id: U256,
    requests: HashMap<U256, Request>,
    commitments: HashMap<U256, B256>,
    points: HashMap<U256, [U256; 2]>,
}

impl Contract {
    fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            pk_set: false,
            last_id: U256::ZERO,
            requests: HashMap::new(),
            commitments: HashMap::new(),
            points: HashMap::new(),
        }
    }

    fn execute(&mut self, input: &[u8]) -> Execution {
        let bad = |_| Revert("bad calldata");
        match self.protocol {
            Protocol::Vrf => self.vrf(IVrfCalls::abi_decode(input, true).map_err(bad)?),
            Protocol::Dvrf => self.dvrf(IDvrfCalls::abi_decode(input, true).map_err(bad)?),
            Protocol::InstaRand => {
                self.instarand(IInstaRandCalls::abi_decode(input, true).map_err(bad)?)
            }
            Protocol::FlexiRand => {
                self.flexirand(IFlexiRandCalls::abi_decode(input, true).map_err(bad)?)
            }
            Protocol::CryptoOperations => {
                self.crypto(ICryptoOperationsCalls::abi_decode(input, true).map_err(bad)?)
            }
            Protocol::StorageOperations => {
                self.storage(IStorageOperationsCalls::abi_decode(input, true).map_err(bad)?)
            }
        }
    }

    fn view(&self, input: &[u8]) -> Result<Bytes, Revert> {
        let bad = |_| Revert("bad calldata");
        let y = match self.protocol {
            Protocol::Vrf => match IVrfCalls::abi_decode(input, true).map_err(bad)? {
                IVrfCalls::_hash_gamma_to_y(call) => hash_point(&call.gamma),
                _ => return Err(Revert("not a view function")),
            },
            Protocol::Dvrf => match IDvrfCalls::abi_decode(input, true).map_err(bad)? {
                IDvrfCalls::_hash_proof(call) => hash_point(&call.pi),
                _ => return Err(Revert("not a view function")),
            },
            Protocol::InstaRand => match IInstaRandCalls::abi_decode(input, true).map_err(bad)? {
                IInstaRandCalls::_hash_gamma_to_y(call) => hash_point(&call.gamma),
                _ => return Err(Revert("not a view function")),
            },
            Protocol::FlexiRand => match IFlexiRandCalls::abi_decode(input, true).map_err(bad)? {
                IFlexiRandCalls::_hash_proof(call) => hash_point(&call.pi),
                _ => return Err(Revert("not a view function")),
            },
            Protocol::CryptoOperations => {
                match ICryptoOperationsCalls::abi_decode(input, true).map_err(bad)? {
                    ICryptoOperationsCalls::_hash_gamma_to_y(call) => hash_point(&call.gamma),
                    _ => return Err(Revert("not a view function")),
                }
            }
            Protocol::StorageOperations => return Err(Revert("not a view function")),
        };
        Ok(y.abi_encode().into())
    }

    fn open(&mut self, input: RequestInput) -> U256 {
        self.last_id += U256::from(1);
        self.requests.insert(self.last_id, Request { input, stage: Stage::Requested });
        self.last_id
    }

    /// Moves request `reqid` to `to` if it is in one of `from` and matches `input`. Returns the
    /// previous stage.
    fn advance(
        &mut self,
        reqid: U256,
        input: Option<&RequestInput>,
        from: &[Stage],
        to: Stage,
    ) -> Result<Stage, Revert> {
        let request = self.requests.get_mut(&reqid).ok_or(Revert("unknown request"))?;
        ensure(input.is_none_or(|input| *input == request.input), "input mismatch")?;
        ensure(from.contains(&request.stage), "step out of order")?;
        Ok(core::mem::replace(&mut request.stage, to))
    }

    fn require_pk(&self) -> Result<(), Revert> {
        ensure(self.pk_set, "public key not set")
    }

    fn vrf(&mut self, call: IVrfCalls) -> Execution {
        match call {
            IVrfCalls::set_pk(_) => {
                self.pk_set = true;
                Ok(Executed::silent(45_000))
            }
            IVrfCalls::req(IVrf::reqCall { x }) => {
                let reqid = self.open(RequestInput::Seed(x));
                Ok(Executed::emit(48_000, |gas| IVrf::ReqGen { reqid, gas }))
            }
            IVrfCalls::fulf(IVrf::fulfCall { x, y, pi }) => {
                self.require_pk()?;
                ensure(y == hash_point(&pi.gamma), "output does not match gamma")?;
                let input = RequestInput::Seed(x.x);
                self.advance(x.reqid, Some(&input), &[Stage::Requested], Stage::Fulfilled)?;
                Ok(Executed::emit(180_000, |gas| IVrf::ReqFulf { reqid: x.reqid, gas }))
            }
            IVrfCalls::_hash_gamma_to_y(_) => Err(Revert("view function")),
        }
    }

    fn dvrf(&mut self, call: IDvrfCalls) -> Execution {
        match call {
            IDvrfCalls::set_pk(_) => {
                self.pk_set = true;
                Ok(Executed::silent(67_000))
            }
            IDvrfCalls::req(IDvrf::reqCall { x }) => {
                let reqid = self.open(RequestInput::Seed(x));
                Ok(Executed::emit(48_000, |gas| IDvrf::ReqGen { reqid, gas }))
            }
            IDvrfCalls::fulf(IDvrf::fulfCall { x, y, pi }) => {
                self.require_pk()?;
                ensure(y == hash_point(&pi), "output does not match proof")?;
                let input = RequestInput::Seed(x.x);
                self.advance(x.reqid, Some(&input), &[Stage::Requested], Stage::Fulfilled)?;
                Ok(Executed::emit(160_000, |gas| IDvrf::ReqFulf { reqid: x.reqid, gas }))
            }
            IDvrfCalls::_hash_proof(_) => Err(Revert("view function")),
        }
    }

    fn instarand(&mut self, call: IInstaRandCalls) -> Execution {
        match call {
            IInstaRandCalls::set_pk(_) => {
                self.pk_set = true;
                Ok(Executed::silent(67_000))
            }
            IInstaRandCalls::register_client_key(IInstaRand::register_client_keyCall {
                e,
                pk_c,
            }) => {
                let reqid = self.open(RequestInput::Client { pk: pk_c, e });
                Ok(Executed::emit(70_000, |gas| IInstaRand::KeyRegistered { reqid, gas }))
            }
            IInstaRandCalls::pre_ver(IInstaRand::pre_verCall { x, .. }) => {
                let input = RequestInput::Client { pk: x.pk, e: x.e };
                self.advance(x.reqid, Some(&input), &[Stage::Requested], Stage::PreVerified)?;
                Ok(Executed::emit(120_000, |gas| IInstaRand::Prever { reqid: x.reqid, gas }))
            }
            IInstaRandCalls::fulfill(IInstaRand::fulfillCall { x, w_i, pi_i, .. }) => {
                self.require_pk()?;
                ensure(w_i == hash_point(&pi_i.gamma), "output does not match gamma")?;
                let input = RequestInput::Client { pk: x.pk, e: x.e };
                let previous = self.advance(
                    x.reqid,
                    Some(&input),
                    &[Stage::Requested, Stage::PreVerified],
                    Stage::Fulfilled,
                )?;
                let gas = match previous {
                    Stage::PreVerified => INSTANT_VER_PREVERIFIED_GAS,
                    _ => INSTANT_VER_FULL_GAS,
                };
                Ok(Executed::emit(gas, |gas| IInstaRand::Ver { reqid: x.reqid, gas }))
            }
            IInstaRandCalls::_hash_gamma_to_y(_) => Err(Revert("view function")),
        }
    }

    fn flexirand(&mut self, call: IFlexiRandCalls) -> Execution {
        match call {
            IFlexiRandCalls::set_pk(_) => {
                self.pk_set = true;
                Ok(Executed::silent(67_000))
            }
            IFlexiRandCalls::gen_req(IFlexiRand::gen_reqCall { e }) => {
                let reqid = self.open(RequestInput::Seed(e));
                Ok(Executed::emit(50_000, |gas| IFlexiRand::ReqGen { reqid, gas }))
            }
            IFlexiRandCalls::submit_blinding(IFlexiRand::submit_blindingCall { x, .. }) => {
                let input = RequestInput::Seed(x.x);
                self.advance(x.reqid, Some(&input), &[Stage::Requested], Stage::BlindingSubmitted)?;
                Ok(Executed::emit(130_000, |gas| IFlexiRand::BlindedInputSubmitted {
                    reqid: x.reqid,
                    gas,
                }))
            }
            IFlexiRandCalls::pre_ver(IFlexiRand::pre_verCall { reqid, .. }) => {
                self.advance(reqid, None, &[Stage::BlindingSubmitted], Stage::PreVerified)?;
                Ok(Executed::emit(115_000, |gas| IFlexiRand::Prever { reqid, gas }))
            }
            IFlexiRandCalls::fulf(IFlexiRand::fulfCall { x, y, pi }) => {
                self.require_pk()?;
                ensure(y == hash_point(&pi), "output does not match proof")?;
                let input = RequestInput::Seed(x.x);
                self.advance(x.reqid, Some(&input), &[Stage::PreVerified], Stage::Fulfilled)?;
                Ok(Executed::emit(140_000, |gas| IFlexiRand::Ver { reqid: x.reqid, gas }))
            }
            IFlexiRandCalls::_hash_proof(_) => Err(Revert("view function")),
        }
    }

    fn crypto(&mut self, call: ICryptoOperationsCalls) -> Execution {
        use ICryptoOperationsCalls as Call;

        let gas = match call {
            Call::bench_secp256k1_hash_to_curve(_) => 28_000,
            Call::bench_ddh_vrf_ver(ICryptoOperations::bench_ddh_vrf_verCall { y, pi, .. }) => {
                ensure(y == hash_point(&pi.gamma), "output does not match gamma")?;
                95_000
            }
            Call::bench_bn254_hash_to_curve(_) => 35_000,
            Call::bench_bls_vrf_ver_str(ICryptoOperations::bench_bls_vrf_ver_strCall {
                y, sig, ..
            }) => {
                ensure(y == hash_point(&sig), "output does not match signature")?;
                140_000
            }
            Call::bench_bls_verify_pairing(_) => 113_000,
            Call::bench_bls_sig_ver_str(_) => 130_000,
            Call::_hash_gamma_to_y(_) => return Err(Revert("view function")),
        };
        Ok(Executed::emit(gas, |gas| ICryptoOperations::GasMeasuredOperations { gas }))
    }

    fn storage(&mut self, call: IStorageOperationsCalls) -> Execution {
        use IStorageOperationsCalls as Call;

        let (gas, nonce) = match call {
            Call::bench_increment_nonce(_) => {
                self.last_id += U256::from(1);
                (5_000, self.last_id)
            }
            Call::bench_store_hash(IStorageOperations::bench_store_hashCall { nonce, hash }) => {
                self.require_issued(nonce)?;
                self.commitments.insert(nonce, hash);
                (22_100, nonce)
            }
            Call::bench_delete_commitment(IStorageOperations::bench_delete_commitmentCall {
                nonce,
            }) => {
                self.commitments.remove(&nonce).ok_or(Revert("nothing stored"))?;
                (2_900, nonce)
            }
            Call::bench_hash_and_store(IStorageOperations::bench_hash_and_storeCall {
                nonce,
                inp,
            }) => {
                self.require_issued(nonce)?;
                self.commitments.insert(nonce, keccak256(inp));
                (22_300, nonce)
            }
            Call::bench_store_ecp(IStorageOperations::bench_store_ecpCall { nonce, ecp }) => {
                self.require_issued(nonce)?;
                self.points.insert(nonce, ecp);
                (44_200, nonce)
            }
        };
        Ok(Executed::emit(gas, |gas| IStorageOperations::GasMeasuredOperations { gas, nonce }))
    }

    fn require_issued(&self, nonce: U256) -> Result<(), Revert> {
        ensure(!nonce.is_zero() && nonce <= self.last_id, "nonce not issued")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{client::BenchContract, contracts::VrfInput, synth::InputFactory};

    #[tokio::test]
    async fn request_ids_thread_into_fulfillment() {
        let chain = MockChain::new(1);
        let vrf = chain.deploy(Protocol::Vrf);
        let account = chain.accounts().await.unwrap()[0];
        let contract = BenchContract::new(&chain, vrf);

        let pk = [U256::from(1), U256::from(2)];
        contract.submit(account, &IVrf::set_pkCall { pk }).await.unwrap();
        let x = B256::repeat_byte(7);
        let outcome = contract.submit(account, &IVrf::reqCall { x }).await.unwrap();
        let reqid = IVrf::ReqGen::decode_log(&outcome.logs[0], true).unwrap().data.reqid;
        assert_eq!(reqid, U256::from(1));

        let gamma = [U256::from(3), U256::from(4)];
        let y = contract.read(&IVrf::_hash_gamma_to_yCall { gamma }).await.unwrap().y;
        assert_eq!(y, hash_point(&gamma));

        let pi = InputFactory::seeded(0).fixed_gamma_ddh_proof(gamma);
        let input = VrfInput { x, reqid };
        let wrong = IVrf::fulfCall { x: input.clone(), y: B256::ZERO, pi: pi.clone() };
        assert!(matches!(
            contract.submit(account, &wrong).await,
            Err(SubmissionError::Reverted { .. })
        ));

        let fulf = IVrf::fulfCall { x: input, y, pi };
        let outcome = contract.submit(account, &fulf).await.unwrap();
        assert_eq!(outcome.gas_used, receipt_gas(fulf.abi_encode().len(), 180_000));

        // A request is fulfilled at most once.
        assert!(contract.submit(account, &fulf).await.is_err());
    }

    #[tokio::test]
    async fn injected_faults_count_per_function() {
        let chain = MockChain::new(1);
        let storage = chain.deploy(Protocol::StorageOperations);
        let account = chain.accounts().await.unwrap()[0];
        let contract = BenchContract::new(&chain, storage);
        chain.fail_nth::<IStorageOperations::bench_increment_nonceCall>(storage, 2);
        chain.drop_event_nth::<IStorageOperations::bench_increment_nonceCall>(storage, 3);

        let call = IStorageOperations::bench_increment_nonceCall {};
        assert_eq!(contract.submit(account, &call).await.unwrap().logs.len(), 1);
        assert!(contract.submit(account, &call).await.is_err());
        assert!(contract.submit(account, &call).await.unwrap().logs.is_empty());

        let journal = chain.transactions::<IStorageOperations::bench_increment_nonceCall>(storage);
        assert_eq!(journal.iter().map(|e| e.reverted).collect::<Vec<_>>(), [false, true, false]);
    }

    #[tokio::test]
    async fn unknown_sender_reverts() {
        let chain = MockChain::new(1);
        let crypto = chain.deploy(Protocol::CryptoOperations);
        let contract = BenchContract::new(&chain, crypto);
        let call = ICryptoOperations::bench_bn254_hash_to_curveCall {
            domain: B256::ZERO,
            msg: B256::ZERO,
        };

        assert!(contract.submit(Address::repeat_byte(0xee), &call).await.is_err());
    }
}
