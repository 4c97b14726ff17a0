//! Built-in configuration.
//!
//! Loaded first and overlaid with the operator's file, so a bare checkout
//! runs against the three supported networks with keys taken from the
//! environment.

pub(crate) const DEFAULT_CONFIG: &str = r#"
[wallet]
private_key = "${PRIVATE_KEY:-}"

[paths]
project_root = "."
registry_file = "deployed_contracts.json"
activity_log = "var_manager.log"

[compiler]
solc = "${SOLC:-solc}"
optimizer_runs = 200

[compiler.resolver]
source_root = "VAR (implementation)/src"
upgradeable_root = "VAR (implementation)/lib/openzeppelin-contracts-upgradeable/contracts"
library_roots = [
	"VAR (implementation)/lib/openzeppelin-contracts/contracts",
	"VAR (implementation)/lib/openzeppelin-contracts",
	"VARProxy/lib/openzeppelin-contracts",
	"node_modules/@openzeppelin/contracts",
]

[contracts]
factory_source = "VAR (implementation)/src/VARDeployer.sol"
factory_name = "VARDeployer"
implementation_source = "VAR (implementation)/src/VAR.sol"
implementation_name = "VAR"

[deployment]
default_network = "sepolia"
default_supply = "1000000"
confirmations = 1
confirmation_timeout_seconds = 300

[networks.sepolia]
name = "Sepolia (Ethereum Testnet)"
rpc_url = "${SEPOLIA_RPC_URL:-}"
fallback_rpc_url = "https://rpc2.sepolia.org"
chain_id = 11155111
explorer_url = "https://sepolia.etherscan.io/"

[networks.bsc_testnet]
name = "BSC Testnet"
rpc_url = "${BSC_TESTNET_RPC_URL:-}"
fallback_rpc_url = "https://data-seed-prebsc-1-s1.binance.org:8545/"
chain_id = 97
explorer_url = "https://testnet.bscscan.com/"

[networks.bsc_mainnet]
name = "BSC Mainnet"
rpc_url = "${BSC_MAINNET_RPC_URL:-}"
fallback_rpc_url = "https://bsc-dataseed.binance.org/"
chain_id = 56
explorer_url = "https://bscscan.com/"
"#;
