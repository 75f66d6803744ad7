//! The host surface a contract method sees
//!
//! A [`Runtime`] wraps the engine for the duration of one call frame. It
//! exposes the frame's [`ExecutionContext`] and the primitives that touch
//! state (`read`, `write`, `balance`, `send`, `mint`, `rcall`). In a const
//! frame every mutating primitive fails.

use crate::contract::builtins;
use crate::contract::context::{Deposit, ExecutionContext};
use crate::contract::engine::Engine;
use crate::contract::state::EventKind;
use crate::core::{fail, Address, Amount, ExecResult, Value};

pub struct Runtime<'a> {
    engine: &'a mut Engine,
    context: ExecutionContext,
    read_only: bool,
}

impl<'a> Runtime<'a> {
    pub(crate) fn new(engine: &'a mut Engine, context: ExecutionContext, read_only: bool) -> Self {
        Self {
            engine,
            context,
            read_only,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// `this.user`
    pub fn user(&self) -> Address {
        self.context.user
    }

    /// `this.address`
    pub fn this(&self) -> Address {
        self.context.contract
    }

    /// `this.height`
    pub fn height(&self) -> u64 {
        self.context.height
    }

    /// `this.deposit`
    pub fn deposit(&self) -> Option<Deposit> {
        self.context.deposit
    }

    pub fn is_const(&self) -> bool {
        self.read_only
    }

    fn check_writable(&self) -> ExecResult<()> {
        if self.read_only {
            return fail("write in const method", None);
        }
        Ok(())
    }

    /// Storage probe; missing fields read as null
    pub fn read(&self, field: &str) -> Value {
        self.engine.state.read(&self.context.contract, field)
    }

    pub fn write(&mut self, field: &str, value: impl Into<Value>) -> ExecResult<()> {
        self.check_writable()?;
        self.engine
            .state
            .write(&self.context.contract, field, value.into());
        Ok(())
    }

    /// Balance of this contract
    pub fn balance(&self, currency: &Address) -> Amount {
        self.engine.state.balance(&self.context.contract, currency)
    }

    /// Pay `amount` of `currency` from this contract to `target`
    pub fn send(
        &mut self,
        target: &Address,
        amount: Amount,
        currency: &Address,
        memo: Option<&str>,
    ) -> ExecResult<()> {
        self.check_writable()?;
        self.engine.state.transfer(
            EventKind::Send,
            &self.context.contract,
            target,
            currency,
            amount,
            memo.map(str::to_string),
            self.context.height,
        )
    }

    /// Issue `amount` of this contract's own currency to `target`
    pub fn mint(&mut self, target: &Address, amount: Amount, memo: Option<&str>) -> ExecResult<()> {
        self.check_writable()?;
        self.engine.state.issue(
            &self.context.contract,
            target,
            amount,
            memo.map(str::to_string),
            self.context.height,
        )
    }

    /// Resolve a dependency name or an address value to a contract address
    pub fn resolve(&self, contract: &Value) -> ExecResult<Address> {
        if let Value::String(name) = contract {
            if let Some(address) = self
                .engine
                .instances
                .get(&self.context.contract)
                .and_then(|instance| instance.depends.get(name))
            {
                return Ok(*address);
            }
        }
        builtins::bech32(contract)
    }

    /// Synchronous call into another contract as `this`
    pub fn rcall(&mut self, contract: &Value, method: &str, args: &[Value]) -> ExecResult<Value> {
        let target = self.resolve(contract)?;
        self.engine.dispatch(
            self.context.contract,
            target,
            method,
            args,
            None,
            self.read_only,
        )
    }

    /// Like [`Runtime::rcall`], attaching a deposit paid from this contract
    pub fn rcall_with_deposit(
        &mut self,
        contract: &Value,
        method: &str,
        args: &[Value],
        deposit: Deposit,
    ) -> ExecResult<Value> {
        self.check_writable()?;
        let target = self.resolve(contract)?;
        self.engine.dispatch(
            self.context.contract,
            target,
            method,
            args,
            Some(deposit),
            false,
        )
    }
}
