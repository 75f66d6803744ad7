//! Ownership relay
//!
//! Ownership moves in two phases: the owner names a `transfer_target`, and
//! only that address calling `complete` takes over. Until then the old owner
//! keeps every right, including overwriting the pending target. The owner can
//! also forward arbitrary calls through the relay, which then acts as the
//! caller.
//!
//! Codes: 1 not owner, 2 no pending transfer, 3 not the pending target.

use crate::contract::builtins::bech32;
use crate::contract::{Args, Contract, Method, Runtime};
use crate::core::{ensure, fail, Address, ExecResult, Value};

pub struct Relay;

static METHODS: &[Method] = &[
    Method::payable("deposit"),
    Method::public("transfer"),
    Method::public("complete"),
    Method::public("claim_all"),
    Method::public("exec"),
    Method::constant("get_owner"),
    Method::constant("get_transfer_target"),
];

fn only_owner(rt: &Runtime<'_>) -> ExecResult<Address> {
    let owner = bech32(&rt.read("owner"))?;
    ensure(rt.user() == owner, "user != owner", 1)?;
    Ok(owner)
}

impl Contract for Relay {
    fn type_name(&self) -> &'static str {
        "relay"
    }

    fn methods(&self) -> &'static [Method] {
        METHODS
    }

    fn init(&self, rt: &mut Runtime<'_>, args: Args<'_>) -> ExecResult<()> {
        let owner = match args.get(0) {
            Value::Null => rt.user(),
            other => bech32(other)?,
        };
        rt.write("owner", owner)
    }

    fn call(&self, rt: &mut Runtime<'_>, method: &str, args: Args<'_>) -> ExecResult<Value> {
        match method {
            "deposit" => {
                let currency = rt.deposit().map(|d| d.currency).unwrap_or(Address::NATIVE);
                Ok(Value::from(rt.balance(&currency)))
            }
            "transfer" => {
                only_owner(rt)?;
                let target = bech32(args.get(0))?;
                rt.write("transfer_target", target)?;
                Ok(Value::Null)
            }
            "complete" => {
                let pending = rt.read("transfer_target");
                ensure(!pending.is_null(), "no pending transfer", 2)?;
                ensure(
                    rt.user() == bech32(&pending)?,
                    "user != transfer_target",
                    3,
                )?;
                let new_owner = rt.user();
                rt.write("owner", new_owner)?;
                rt.write("transfer_target", Value::Null)?;
                Ok(Value::Null)
            }
            "claim_all" => {
                let owner = only_owner(rt)?;
                let currency = bech32(args.get(0))?;
                let amount = rt.balance(&currency);
                rt.send(&owner, amount, &currency, Some("relay claim"))?;
                Ok(Value::from(amount))
            }
            // exec(contract, method, [args...])
            "exec" => {
                only_owner(rt)?;
                let method = match args.get(1).as_str() {
                    Some(name) => name.to_string(),
                    None => return fail("method name must be a string", None),
                };
                let forwarded = match args.get(2) {
                    Value::Null => Vec::new(),
                    Value::Array(items) => items.clone(),
                    other => return fail(format!("args must be an array, got {}", other.type_name()), None),
                };
                rt.rcall(args.get(0), &method, &forwarded)
            }
            "get_owner" => Ok(rt.read("owner")),
            "get_transfer_target" => Ok(rt.read("transfer_target")),
            other => fail(format!("unhandled method: {}", other), None),
        }
    }
}
