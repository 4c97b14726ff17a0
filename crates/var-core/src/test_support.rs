//! Shared fixtures for orchestrator tests.
//!
//! [`FakeChain`] backs a `MockDeliveryInterface` with a tiny in-memory chain:
//! creations get deterministic addresses, `botDeployEcosystem` emits a
//! `Deployed` event, and reads answer from a table keyed by selector.

use crate::{ContractSources, Session};
use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::JsonAbi;
use alloy_primitives::{keccak256, Address, Bytes, Selector, B256, U256};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use var_compiler::standard_json::{BytecodeOutput, ContractOutput, EvmOutput};
use var_compiler::{
	Compiler, ImportResolver, MockCompilerBackend, ResolverRoots, SourceReference,
	StandardJsonOutput,
};
use var_delivery::{DeliveryError, MockDeliveryInterface, TransactionManager};
use var_storage::implementations::memory::MemoryRegistryBackend;
use var_storage::{ActivityLog, ContractRegistry};
use var_types::utils::builders::{LogBuilder, TransactionReceiptBuilder};
use var_types::{NetworkProfile, Transaction, TransactionHash};

pub(crate) const FACTORY: &str = "VARDeployer";
pub(crate) const VAR: &str = "VAR";

pub(crate) const FACTORY_ABI: &str = r#"[
	{"type":"function","name":"initialize","inputs":[{"name":"implementation","type":"address"}],"outputs":[],"stateMutability":"nonpayable"},
	{"type":"function","name":"setDeployerBot","inputs":[{"name":"bot","type":"address"}],"outputs":[],"stateMutability":"nonpayable"},
	{"type":"function","name":"setImplementation","inputs":[{"name":"implementation","type":"address"}],"outputs":[],"stateMutability":"nonpayable"},
	{"type":"function","name":"botDeployEcosystem","inputs":[{"name":"name","type":"string"},{"name":"symbol","type":"string"},{"name":"initialMint","type":"uint256"}],"outputs":[{"name":"proxy","type":"address"}],"stateMutability":"nonpayable"},
	{"type":"function","name":"owner","inputs":[],"outputs":[{"name":"","type":"address"}],"stateMutability":"view"},
	{"type":"function","name":"sendNative","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"},
	{"type":"event","name":"Deployed","anonymous":false,"inputs":[
		{"name":"proxy","type":"address","indexed":true},
		{"name":"implementation","type":"address","indexed":false}
	]}
]"#;

pub(crate) const VAR_ABI: &str = r#"[
	{"type":"function","name":"add","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"},
	{"type":"function","name":"remove","inputs":[{"name":"amount","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"},
	{"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
	{"type":"function","name":"transfer","inputs":[{"name":"from","type":"address"},{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
	{"type":"function","name":"totalSupply","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
	{"type":"function","name":"balanceOf","inputs":[{"name":"account","type":"address"}],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
	{"type":"function","name":"taxBps","inputs":[],"outputs":[{"name":"","type":"uint16"}],"stateMutability":"view"},
	{"type":"function","name":"setTaxConfig","inputs":[{"name":"recipient","type":"address"},{"name":"bps","type":"uint16"}],"outputs":[],"stateMutability":"nonpayable"},
	{"type":"function","name":"withdrawNative","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"},
	{"type":"function","name":"authority","inputs":[],"outputs":[{"name":"","type":"address"}],"stateMutability":"view"},
	{"type":"function","name":"owner","inputs":[],"outputs":[{"name":"","type":"address"}],"stateMutability":"view"},
	{"type":"function","name":"upgradeToAndCall","inputs":[{"name":"newImplementation","type":"address"},{"name":"data","type":"bytes"}],"outputs":[],"stateMutability":"payable"}
]"#;

pub(crate) fn owner() -> Address {
	Address::repeat_byte(0x0a)
}

pub(crate) fn proxy_address() -> Address {
	Address::repeat_byte(0x99)
}

/// Address of the contract created by the `index`-th submitted transaction.
pub(crate) fn created_address(index: usize) -> Address {
	Address::repeat_byte(0xc0 + index as u8)
}

pub(crate) fn selector(signature: &str) -> Selector {
	Selector::from_slice(&keccak256(signature)[..4])
}

fn tx_hash(index: usize) -> TransactionHash {
	TransactionHash(B256::with_last_byte(index as u8 + 1))
}

#[derive(Default)]
struct ChainState {
	submitted: Vec<Transaction>,
	omit_deployed_event: bool,
	reverts: HashMap<Selector, String>,
	reads: HashMap<(Option<Address>, Selector), Bytes>,
	balances: HashMap<Address, U256>,
	code: HashMap<Address, Bytes>,
}

/// In-memory stand-in for a chain, shared between a test and its mock.
#[derive(Clone, Default)]
pub(crate) struct FakeChain {
	state: Arc<Mutex<ChainState>>,
}

impl FakeChain {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn without_deployed_event(self) -> Self {
		self.state.lock().unwrap().omit_deployed_event = true;
		self
	}

	/// Submissions of `signature` revert with `reason`.
	pub fn revert_on(self, signature: &str, reason: &str) -> Self {
		self.state
			.lock()
			.unwrap()
			.reverts
			.insert(selector(signature), reason.to_string());
		self
	}

	/// Submissions of `signature` succeed again.
	pub fn stop_reverting(&self, signature: &str) {
		self.state.lock().unwrap().reverts.remove(&selector(signature));
	}

	/// Calls of `signature` on any address return `output`.
	pub fn read(self, signature: &str, output: Vec<u8>) -> Self {
		self.state
			.lock()
			.unwrap()
			.reads
			.insert((None, selector(signature)), output.into());
		self
	}

	/// Calls of `signature` on `address` return `output`.
	pub fn read_at(self, address: Address, signature: &str, output: Vec<u8>) -> Self {
		self.state
			.lock()
			.unwrap()
			.reads
			.insert((Some(address), selector(signature)), output.into());
		self
	}

	pub fn balance(self, address: Address, amount: U256) -> Self {
		self.state.lock().unwrap().balances.insert(address, amount);
		self
	}

	pub fn code(self, address: Address, code: Vec<u8>) -> Self {
		self.state.lock().unwrap().code.insert(address, code.into());
		self
	}

	/// Every transaction submitted so far, including rejected ones.
	pub fn submitted(&self) -> Vec<Transaction> {
		self.state.lock().unwrap().submitted.clone()
	}

	fn submit(&self, tx: Transaction) -> Result<TransactionHash, DeliveryError> {
		let mut state = self.state.lock().unwrap();
		let revert = tx
			.data
			.get(..4)
			.and_then(|prefix| state.reverts.get(&Selector::from_slice(prefix)))
			.cloned();
		state.submitted.push(tx);
		match revert {
			Some(reason) => Err(DeliveryError::TransactionFailed {
				hash: None,
				reason: format!("execution reverted: {}", reason),
				revert_data: Some(Bytes::from(vec![0x08, 0xc3, 0x79, 0xa0])),
			}),
			None => Ok(tx_hash(state.submitted.len() - 1)),
		}
	}

	fn confirm(&self, hash: &TransactionHash) -> Result<var_types::TransactionReceipt, DeliveryError> {
		let state = self.state.lock().unwrap();
		let index = (hash.0[31] - 1) as usize;
		let tx = &state.submitted[index];

		let mut receipt = TransactionReceiptBuilder::new()
			.with_hash(*hash)
			.with_block_number(100 + index as u64);
		if tx.is_create() {
			receipt = receipt.with_contract_address(created_address(index));
		}
		let deploys_ecosystem =
			tx.data.get(..4) == Some(selector("botDeployEcosystem(string,string,uint256)").as_slice());
		if deploys_ecosystem && !state.omit_deployed_event {
			receipt = receipt.with_logs(ecosystem_logs(tx.to.unwrap_or_default()));
		}
		Ok(receipt.build())
	}

	fn call(&self, tx: &Transaction) -> Result<Bytes, DeliveryError> {
		let state = self.state.lock().unwrap();
		let Some(prefix) = tx.data.get(..4) else {
			return Ok(Bytes::new());
		};
		let selector = Selector::from_slice(prefix);
		state
			.reads
			.get(&(tx.to, selector))
			.or_else(|| state.reads.get(&(None, selector)))
			.cloned()
			.ok_or_else(|| DeliveryError::Network(format!("no response for {}", selector)))
	}

	/// A mock delivery backed by this chain.
	pub fn delivery(&self, wallet: Option<Address>) -> MockDeliveryInterface {
		let mut delivery = MockDeliveryInterface::new();
		delivery.expect_chain_id().return_const(31337u64);
		delivery.expect_signer_address().return_const(wallet);

		let chain = self.clone();
		delivery.expect_submit().returning(move |tx| {
			let result = chain.submit(tx);
			Box::pin(async move { result })
		});
		let chain = self.clone();
		delivery
			.expect_wait_for_confirmation()
			.returning(move |hash, _| {
				let result = chain.confirm(hash);
				Box::pin(async move { result })
			});
		let chain = self.clone();
		delivery.expect_get_receipt().returning(move |hash| {
			let result = chain.confirm(hash);
			Box::pin(async move { result })
		});
		let chain = self.clone();
		delivery.expect_eth_call().returning(move |tx, _| {
			let result = chain.call(&tx);
			Box::pin(async move { result })
		});
		let chain = self.clone();
		delivery.expect_get_balance().returning(move |address| {
			let balance = chain
				.state
				.lock()
				.unwrap()
				.balances
				.get(&address)
				.copied()
				.unwrap_or_default();
			Box::pin(async move { Ok(balance) })
		});
		let chain = self.clone();
		delivery.expect_get_code().returning(move |address| {
			let code = chain
				.state
				.lock()
				.unwrap()
				.code
				.get(&address)
				.cloned()
				.unwrap_or_default();
			Box::pin(async move { Ok(code) })
		});
		delivery
	}
}

/// An unrelated token transfer followed by the factory's `Deployed` event.
fn ecosystem_logs(factory: Address) -> Vec<var_types::Log> {
	let abi: JsonAbi = serde_json::from_str(FACTORY_ABI).unwrap();
	let deployed = abi.event("Deployed").unwrap()[0].selector();
	vec![
		LogBuilder::new(proxy_address())
			.topic(keccak256("Transfer(address,address,uint256)"))
			.address_topic(Address::ZERO)
			.address_topic(owner())
			.data(U256::from(1u64).to_be_bytes::<32>().to_vec())
			.build(),
		LogBuilder::new(factory)
			.topic(deployed)
			.address_topic(proxy_address())
			.data(DynSolValue::Tuple(vec![DynSolValue::Address(Address::ZERO)]).abi_encode_params())
			.build(),
	]
}

fn compiler_output(unit: &str, contract: &str, abi: &str) -> StandardJsonOutput {
	let mut contracts = BTreeMap::new();
	contracts.insert(
		contract.to_string(),
		ContractOutput {
			abi: Some(serde_json::from_str(abi).unwrap()),
			evm: Some(EvmOutput {
				bytecode: Some(BytecodeOutput {
					object: "6080604052".to_string(),
				}),
			}),
		},
	);
	let mut output = StandardJsonOutput::default();
	output.contracts.insert(unit.to_string(), contracts);
	output
}

/// A session over a fake chain, a mock compiler, a memory registry and a
/// temporary activity log.
pub(crate) struct Harness {
	pub session: Session,
	_dir: TempDir,
}

impl Harness {
	pub fn builder() -> HarnessBuilder {
		HarnessBuilder {
			compilations: Vec::new(),
			wallet: Some(owner()),
			chain: FakeChain::new(),
		}
	}

	pub async fn activity_lines(&self) -> Vec<String> {
		self.session.activity().tail(100).await.unwrap()
	}
}

pub(crate) struct HarnessBuilder {
	compilations: Vec<(&'static str, usize)>,
	wallet: Option<Address>,
	chain: FakeChain,
}

impl HarnessBuilder {
	/// Expects `contract` to be compiled exactly `times` times.
	pub fn compilations(mut self, contract: &'static str, times: usize) -> Self {
		self.compilations.push((contract, times));
		self
	}

	pub fn without_wallet(mut self) -> Self {
		self.wallet = None;
		self
	}

	pub fn chain(mut self, chain: FakeChain) -> Self {
		self.chain = chain;
		self
	}

	pub async fn build(self) -> Harness {
		let dir = TempDir::new().unwrap();
		let src = dir.path().join("src");
		tokio::fs::create_dir_all(&src).await.unwrap();
		for contract in [FACTORY, VAR] {
			tokio::fs::write(
				src.join(format!("{contract}.sol")),
				format!("pragma solidity ^0.8.20;\ncontract {contract} {{}}\n"),
			)
			.await
			.unwrap();
		}

		let mut backend = MockCompilerBackend::new();
		for (contract, times) in self.compilations {
			let unit = format!("{contract}.sol");
			let abi = if contract == FACTORY { FACTORY_ABI } else { VAR_ABI };
			let expected = unit.clone();
			backend
				.expect_compile()
				.withf(move |input| input.sources.contains_key(&expected))
				.times(times)
				.returning(move |_| {
					let output = compiler_output(&unit, contract, abi);
					Box::pin(async move { Ok(output) })
				});
		}

		let resolver = ImportResolver::new(ResolverRoots {
			source_root: src.clone(),
			upgradeable_root: dir.path().join("lib/upgradeable"),
			library_roots: vec![dir.path().join("lib/contracts")],
		});
		let compiler = Compiler::new(Arc::new(backend), resolver, 200);

		let network = NetworkProfile {
			id: "testnet".to_string(),
			name: "Test Network".to_string(),
			rpc_url: None,
			fallback_rpc_url: "http://127.0.0.1:8545".to_string(),
			chain_id: 31337,
			explorer_url: "https://explorer.test/".to_string(),
		};
		let transactions = TransactionManager::new(Arc::new(self.chain.delivery(self.wallet)), 1);
		let registry = ContractRegistry::new(Arc::new(MemoryRegistryBackend::new()));
		let activity = ActivityLog::new(dir.path().join("var_manager.log"));
		let sources = ContractSources {
			factory: SourceReference::new(src.join("VARDeployer.sol"), FACTORY),
			implementation: SourceReference::new(src.join("VAR.sol"), VAR),
		};

		let session = Session::new(
			network,
			transactions,
			registry,
			activity,
			Arc::new(compiler),
			sources,
		);
		Harness { session, _dir: dir }
	}
}
