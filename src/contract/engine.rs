//! Contract host: deployment, dispatch and atomic execution
//!
//! The engine owns every contract instance, the world state and the current
//! height. Each call frame (top-level or nested through `rcall`) takes a
//! checkpoint of the world state before consuming its deposit, and reverts to
//! it if the method fails. A top-level call that succeeds commits.
//!
//! Production-grade limits:
//! - Call depth limit (1024, like EVM)
//! - Reentrancy detection

use crate::contract::context::{Deposit, ExecutionContext};
use crate::contract::registry::{Args, Contract, ContractRegistry};
use crate::contract::runtime::Runtime;
use crate::contract::state::{LedgerEvent, WorldState};
use crate::core::{ensure, fail, Address, Amount, ExecResult, Failure, Value};
use crate::protocols;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maximum call depth (EVM uses 1024)
pub const MAX_CALL_DEPTH: usize = 1024;

/// Engine limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of frames on the call stack
    pub max_call_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

/// A deployed contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Contract address (derived from deployer + nonce)
    pub address: Address,
    /// Registered contract type
    pub type_name: String,
    /// Deployer address
    pub deployer: Address,
    /// Height at deployment
    pub deployed_at: u64,
    /// Contracts this one reaches by name through `rcall`
    pub depends: BTreeMap<String, Address>,
}

/// A top-level call
#[derive(Debug, Clone)]
pub struct Call {
    pub user: Address,
    pub contract: Address,
    pub method: String,
    pub args: Vec<Value>,
    pub deposit: Option<Deposit>,
}

impl Call {
    pub fn new(user: Address, contract: Address, method: &str, args: Vec<Value>) -> Self {
        Self {
            user,
            contract,
            method: method.to_string(),
            args,
            deposit: None,
        }
    }

    pub fn with_deposit(mut self, deposit: Deposit) -> Self {
        self.deposit = Some(deposit);
        self
    }
}

/// Everything the engine persists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub height: u64,
    pub nonce: u64,
    pub instances: BTreeMap<Address, Instance>,
    pub state: WorldState,
}

/// The contract host
pub struct Engine {
    registry: ContractRegistry,
    config: EngineConfig,
    pub(crate) instances: BTreeMap<Address, Instance>,
    pub(crate) state: WorldState,
    height: u64,
    nonce: u64,
    /// Contracts currently executing, innermost last
    call_stack: Vec<Address>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with every built-in protocol registered
    pub fn new() -> Self {
        Self::with_registry(protocols::registry(), EngineConfig::default())
    }

    pub fn with_registry(registry: ContractRegistry, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            instances: BTreeMap::new(),
            state: WorldState::new(),
            height: 0,
            nonce: 0,
            call_stack: Vec::new(),
        }
    }

    /// Rebuild an engine from persisted state
    pub fn from_snapshot(
        snapshot: EngineSnapshot,
        registry: ContractRegistry,
        config: EngineConfig,
    ) -> Self {
        let mut engine = Self::with_registry(registry, config);
        engine.height = snapshot.height;
        engine.nonce = snapshot.nonce;
        engine.instances = snapshot.instances;
        engine.state = snapshot.state;
        engine
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            height: self.height,
            nonce: self.nonce,
            instances: self.instances.clone(),
            state: self.state.clone(),
        }
    }

    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Height
    // =========================================================================

    pub fn height(&self) -> u64 {
        self.height
    }

    /// Move to `height`; height never decreases
    pub fn set_height(&mut self, height: u64) -> ExecResult<()> {
        ensure(
            height >= self.height,
            format!("height cannot decrease: {} < {}", height, self.height),
            None,
        )?;
        self.height = height;
        Ok(())
    }

    pub fn advance(&mut self, blocks: u64) -> ExecResult<u64> {
        let height = match self.height.checked_add(blocks) {
            Some(h) => h,
            None => return fail("height overflow", None),
        };
        self.height = height;
        Ok(height)
    }

    // =========================================================================
    // Ledger access
    // =========================================================================

    /// Issue funds to an external account outside of any contract
    pub fn credit(&mut self, owner: &Address, currency: &Address, amount: Amount) -> ExecResult<()> {
        let checkpoint = self.state.checkpoint();
        match self
            .state
            .issue(currency, owner, amount, Some("genesis".to_string()), self.height)
        {
            Ok(()) => {
                self.state.commit();
                Ok(())
            }
            Err(failure) => {
                self.state.revert(checkpoint);
                Err(failure)
            }
        }
    }

    pub fn balance(&self, owner: &Address, currency: &Address) -> Amount {
        self.state.balance(owner, currency)
    }

    pub fn balances_of(&self, owner: &Address) -> Vec<(Address, Amount)> {
        self.state.balances_of(owner)
    }

    pub fn supply(&self, currency: &Address) -> Amount {
        self.state.supply(currency)
    }

    pub fn events(&self) -> &[LedgerEvent] {
        self.state.events()
    }

    /// Storage field of a contract
    pub fn read(&self, contract: &Address, field: &str) -> Value {
        self.state.read(contract, field)
    }

    pub fn fields(&self, contract: &Address) -> Option<&BTreeMap<String, Value>> {
        self.state.fields(contract)
    }

    // =========================================================================
    // Instances
    // =========================================================================

    pub fn instance(&self, address: &Address) -> Option<&Instance> {
        self.instances.get(address)
    }

    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    pub fn count(&self) -> usize {
        self.instances.len()
    }

    /// Deploy a registered contract type and run its constructor
    pub fn deploy(
        &mut self,
        type_name: &str,
        deployer: &Address,
        args: &[Value],
        depends: BTreeMap<String, Address>,
    ) -> ExecResult<Address> {
        let code = self
            .registry
            .get(type_name)
            .ok_or_else(|| Failure::new(format!("unknown contract type: {}", type_name)))?;

        let address = self.generate_address(deployer);
        self.nonce += 1;
        if self.instances.contains_key(&address) {
            return fail(format!("contract already exists: {}", address), None);
        }

        self.instances.insert(
            address,
            Instance {
                address,
                type_name: type_name.to_string(),
                deployer: *deployer,
                deployed_at: self.height,
                depends,
            },
        );

        let context = ExecutionContext {
            user: *deployer,
            contract: address,
            height: self.height,
            deposit: None,
        };
        let checkpoint = self.state.checkpoint();
        self.call_stack.push(address);
        let result = {
            let mut rt = Runtime::new(self, context, false);
            code.init(&mut rt, Args::new(args))
        };
        self.call_stack.pop();

        match result {
            Ok(()) => {
                self.state.commit();
                log::info!("Contract {} deployed at {}", type_name, address);
                Ok(address)
            }
            Err(failure) => {
                self.state.revert(checkpoint);
                self.instances.remove(&address);
                log::info!("Deployment of {} failed: {}", type_name, failure);
                Err(failure)
            }
        }
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Execute a top-level call atomically
    pub fn call(&mut self, call: Call) -> ExecResult<Value> {
        let checkpoint = self.state.checkpoint();
        let result = self.dispatch(
            call.user,
            call.contract,
            &call.method,
            &call.args,
            call.deposit,
            false,
        );
        match result {
            Ok(value) => {
                self.state.commit();
                Ok(value)
            }
            Err(failure) => {
                self.state.revert(checkpoint);
                log::warn!(
                    "Call {}.{} by {} failed: {}",
                    call.contract,
                    call.method,
                    call.user,
                    failure
                );
                Err(failure)
            }
        }
    }

    /// Run a const method; nothing is committed
    pub fn query(
        &mut self,
        user: &Address,
        contract: &Address,
        method: &str,
        args: &[Value],
    ) -> ExecResult<Value> {
        let checkpoint = self.state.checkpoint();
        let result = self.dispatch(*user, *contract, method, args, None, true);
        self.state.revert(checkpoint);
        result
    }

    /// Run one frame; on failure everything it did is reverted
    pub(crate) fn dispatch(
        &mut self,
        user: Address,
        target: Address,
        method: &str,
        args: &[Value],
        deposit: Option<Deposit>,
        read_only: bool,
    ) -> ExecResult<Value> {
        let depth = self.call_stack.len();
        ensure(
            depth < self.config.max_call_depth,
            format!(
                "call depth exceeded: {} (max: {})",
                depth, self.config.max_call_depth
            ),
            None,
        )?;
        ensure(
            !self.call_stack.contains(&target),
            format!("reentrancy detected: contract {} is already executing", target),
            None,
        )?;

        let code = self.code_of(&target)?;
        let spec = code
            .methods()
            .iter()
            .find(|m| m.name == method)
            .copied()
            .ok_or_else(|| Failure::new(format!("no such method: {}", method)))?;
        ensure(spec.is_public(), format!("method not public: {}", method), None)?;
        ensure(
            deposit.is_none() || spec.is_payable(),
            format!("method not payable: {}", method),
            None,
        )?;
        // a const frame may only reach other const methods
        ensure(!read_only || spec.is_const(), "write in const method", None)?;

        log::debug!("dispatch {}.{} by {} (depth {})", target, method, user, depth);

        let checkpoint = self.state.checkpoint();
        self.call_stack.push(target);
        let result = self.run_frame(code, user, target, method, args, deposit, spec.is_const());
        self.call_stack.pop();

        if let Err(failure) = &result {
            log::debug!("rollback {}.{}: {}", target, method, failure);
            self.state.revert(checkpoint);
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn run_frame(
        &mut self,
        code: Arc<dyn Contract>,
        user: Address,
        target: Address,
        method: &str,
        args: &[Value],
        deposit: Option<Deposit>,
        read_only: bool,
    ) -> ExecResult<Value> {
        if let Some(deposit) = deposit {
            self.state.transfer(
                crate::contract::state::EventKind::Deposit,
                &user,
                &target,
                &deposit.currency,
                deposit.amount,
                None,
                self.height,
            )?;
        }

        let context = ExecutionContext {
            user,
            contract: target,
            height: self.height,
            deposit,
        };
        let mut rt = Runtime::new(self, context, read_only);
        code.call(&mut rt, method, Args::new(args))
    }

    fn code_of(&self, address: &Address) -> ExecResult<Arc<dyn Contract>> {
        let instance = self
            .instances
            .get(address)
            .ok_or_else(|| Failure::new(format!("contract not found: {}", address)))?;
        self.registry.get(&instance.type_name).ok_or_else(|| {
            Failure::new(format!("unknown contract type: {}", instance.type_name))
        })
    }

    /// Generate contract address from deployer and nonce
    fn generate_address(&self, deployer: &Address) -> Address {
        let input = format!("{}:{}", deployer, self.nonce);
        Address::hash_of(input.as_bytes())
    }
}
