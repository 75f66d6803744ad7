//! Three-party escrow
//!
//! `source`, `target` and `agent` are fixed at construction. Only the agent
//! decides where the funds go: all of one currency to `target` (`unlock`) or
//! back to `source` (`revoke`).

use crate::contract::builtins::bech32;
use crate::contract::{Args, Contract, Method, Runtime};
use crate::core::{ensure, fail, Address, ExecResult, Value};

pub struct Escrow;

static METHODS: &[Method] = &[
    Method::payable("deposit"),
    Method::public("unlock"),
    Method::public("revoke"),
    Method::constant("get_parties"),
];

impl Escrow {
    /// Pay the full balance of `currency` to the party stored in `field`
    fn release(rt: &mut Runtime<'_>, field: &str, currency: &Value, memo: &str) -> ExecResult<Value> {
        let agent = bech32(&rt.read("agent"))?;
        ensure(rt.user() == agent, "user != agent", None)?;

        let to = bech32(&rt.read(field))?;
        let currency = bech32(currency)?;
        let amount = rt.balance(&currency);
        rt.send(&to, amount, &currency, Some(memo))?;
        Ok(Value::from(amount))
    }
}

impl Contract for Escrow {
    fn type_name(&self) -> &'static str {
        "escrow"
    }

    fn methods(&self) -> &'static [Method] {
        METHODS
    }

    /// `init(source, target, agent)`
    fn init(&self, rt: &mut Runtime<'_>, args: Args<'_>) -> ExecResult<()> {
        for (i, field) in ["source", "target", "agent"].into_iter().enumerate() {
            let party = args.get(i);
            ensure(!party.is_null(), format!("missing {}", field), None)?;
            rt.write(field, bech32(party)?)?;
        }
        Ok(())
    }

    fn call(&self, rt: &mut Runtime<'_>, method: &str, args: Args<'_>) -> ExecResult<Value> {
        match method {
            "deposit" => {
                let currency = rt.deposit().map(|d| d.currency).unwrap_or(Address::NATIVE);
                Ok(Value::from(rt.balance(&currency)))
            }
            "unlock" => Self::release(rt, "target", args.get(0), "escrow unlock"),
            "revoke" => Self::release(rt, "source", args.get(0), "escrow revoke"),
            "get_parties" => Ok(Value::object([
                ("source", rt.read("source")),
                ("target", rt.read("target")),
                ("agent", rt.read("agent")),
            ])),
            other => fail(format!("unhandled method: {}", other), None),
        }
    }
}
