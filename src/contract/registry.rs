//! Contract types and their method tables
//!
//! A contract type is stateless code: it implements [`Contract`] and keeps
//! everything it needs in storage through the [`Runtime`]. Types are
//! registered by name and validated once, at registration.

use crate::contract::runtime::Runtime;
use crate::core::{ExecResult, Value};
use bitflags::bitflags;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

bitflags! {
    /// Method attributes
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodFlags: u8 {
        /// Callable from outside the contract
        const PUBLIC = 0b001;
        /// Performs no mutation
        const CONST = 0b010;
        /// Accepts a deposit
        const PAYABLE = 0b100;
    }
}

/// Entry of a contract's method table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Method {
    pub name: &'static str,
    pub flags: MethodFlags,
}

impl Method {
    pub const fn public(name: &'static str) -> Self {
        Self {
            name,
            flags: MethodFlags::PUBLIC,
        }
    }

    pub const fn constant(name: &'static str) -> Self {
        Self {
            name,
            flags: MethodFlags::PUBLIC.union(MethodFlags::CONST),
        }
    }

    pub const fn payable(name: &'static str) -> Self {
        Self {
            name,
            flags: MethodFlags::PUBLIC.union(MethodFlags::PAYABLE),
        }
    }

    pub fn is_const(&self) -> bool {
        self.flags.contains(MethodFlags::CONST)
    }

    pub fn is_payable(&self) -> bool {
        self.flags.contains(MethodFlags::PAYABLE)
    }

    pub fn is_public(&self) -> bool {
        self.flags.contains(MethodFlags::PUBLIC)
    }
}

/// Positional call arguments; missing trailing arguments read as null
#[derive(Debug, Clone, Copy)]
pub struct Args<'a>(&'a [Value]);

static MISSING: Value = Value::Null;

impl<'a> Args<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self(values)
    }

    pub fn get(&self, index: usize) -> &'a Value {
        self.0.get(index).unwrap_or(&MISSING)
    }

    /// Arguments from `index` on
    pub fn rest(&self, index: usize) -> &'a [Value] {
        self.0.get(index..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Code of a contract type
pub trait Contract: Send + Sync {
    /// Registry name, e.g. `"escrow"`
    fn type_name(&self) -> &'static str;

    /// Every method that `call` dispatches on
    fn methods(&self) -> &'static [Method];

    /// Constructor, run once at deployment
    fn init(&self, rt: &mut Runtime<'_>, args: Args<'_>) -> ExecResult<()>;

    /// Run a method already checked against the method table
    fn call(&self, rt: &mut Runtime<'_>, method: &str, args: Args<'_>) -> ExecResult<Value>;
}

/// Registration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Contract type already registered: {0}")]
    AlreadyRegistered(String),
    #[error("Duplicate method {method} in {contract}")]
    DuplicateMethod { contract: String, method: String },
    #[error("Reserved method name {method} in {contract}")]
    ReservedMethod { contract: String, method: String },
    #[error("Const method {method} in {contract} cannot be payable")]
    PayableConst { contract: String, method: String },
}

/// All known contract types by name
#[derive(Clone, Default)]
pub struct ContractRegistry {
    types: BTreeMap<&'static str, Arc<dyn Contract>>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a contract's method table and add it
    pub fn register(&mut self, contract: Arc<dyn Contract>) -> Result<(), RegistryError> {
        let name = contract.type_name();
        if self.types.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }

        let mut seen = HashSet::new();
        for method in contract.methods() {
            if method.name.is_empty() || method.name == "init" {
                return Err(RegistryError::ReservedMethod {
                    contract: name.to_string(),
                    method: method.name.to_string(),
                });
            }
            if !seen.insert(method.name) {
                return Err(RegistryError::DuplicateMethod {
                    contract: name.to_string(),
                    method: method.name.to_string(),
                });
            }
            if method.is_const() && method.is_payable() {
                return Err(RegistryError::PayableConst {
                    contract: name.to_string(),
                    method: method.name.to_string(),
                });
            }
        }

        self.types.insert(name, contract);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Contract>> {
        self.types.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.types.keys().copied().collect()
    }

    pub fn count(&self) -> usize {
        self.types.len()
    }
}

impl std::fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.types.keys()).finish()
    }
}
