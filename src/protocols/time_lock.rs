//! Height-gated vault
//!
//! Funds deposited here can be withdrawn by the owner once
//! `height >= unlock_height`. The threshold can only move later.
//!
//! Codes: 1 not owner, 2 still locked, 3 unlock height decreased.

use crate::contract::builtins::{bech32, uint};
use crate::contract::{Args, Contract, Method, Runtime};
use crate::core::{ensure, fail, Address, ExecResult, Value};

pub struct TimeLock;

static METHODS: &[Method] = &[
    Method::payable("deposit"),
    Method::public("withdraw"),
    Method::public("set_unlock_height"),
    Method::public("transfer"),
    Method::constant("is_locked"),
    Method::constant("get_unlock_height"),
    Method::constant("get_owner"),
];

fn only_owner(rt: &Runtime<'_>) -> ExecResult<Address> {
    let owner = bech32(&rt.read("owner"))?;
    ensure(rt.user() == owner, "user != owner", 1)?;
    Ok(owner)
}

fn unlock_height(rt: &Runtime<'_>) -> ExecResult<u128> {
    uint(&rt.read("unlock_height"))
}

impl Contract for TimeLock {
    fn type_name(&self) -> &'static str {
        "time_lock"
    }

    fn methods(&self) -> &'static [Method] {
        METHODS
    }

    /// `init(unlock_height[, owner])`
    fn init(&self, rt: &mut Runtime<'_>, args: Args<'_>) -> ExecResult<()> {
        let height = uint(args.get(0))?;
        let owner = match args.get(1) {
            Value::Null => rt.user(),
            other => bech32(other)?,
        };
        rt.write("owner", owner)?;
        rt.write("unlock_height", Value::from(height))
    }

    fn call(&self, rt: &mut Runtime<'_>, method: &str, args: Args<'_>) -> ExecResult<Value> {
        match method {
            "deposit" => {
                let currency = rt.deposit().map(|d| d.currency).unwrap_or(Address::NATIVE);
                Ok(Value::from(rt.balance(&currency)))
            }
            // withdraw(amount[, currency]); amount 0 or omitted takes everything
            "withdraw" => {
                let owner = only_owner(rt)?;
                ensure(
                    u128::from(rt.height()) >= unlock_height(rt)?,
                    "still locked",
                    2,
                )?;
                let currency = bech32(args.get(1))?;
                let amount = match args.get(0) {
                    Value::Null => 0,
                    other => uint(other)?,
                };
                let amount = if amount == 0 {
                    rt.balance(&currency)
                } else {
                    amount
                };
                rt.send(&owner, amount, &currency, Some("time lock withdraw"))?;
                Ok(Value::from(amount))
            }
            "set_unlock_height" => {
                only_owner(rt)?;
                let height = uint(args.get(0))?;
                ensure(
                    height >= unlock_height(rt)?,
                    "unlock height cannot decrease",
                    3,
                )?;
                rt.write("unlock_height", Value::from(height))?;
                Ok(Value::Null)
            }
            "transfer" => {
                only_owner(rt)?;
                let new_owner = bech32(args.get(0))?;
                rt.write("owner", new_owner)?;
                Ok(Value::Null)
            }
            "is_locked" => Ok(Value::from(
                u128::from(rt.height()) < unlock_height(rt)?,
            )),
            "get_unlock_height" => Ok(rt.read("unlock_height")),
            "get_owner" => Ok(rt.read("owner")),
            other => fail(format!("unhandled method: {}", other), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::contract::{Deposit, Engine};
    use crate::core::{Address, Value};
    use crate::protocols::testing::{call, pay, user};
    use std::collections::BTreeMap;

    fn setup() -> (Engine, Address, Address) {
        let mut engine = Engine::new();
        let owner = user("owner");
        engine.credit(&owner, &Address::NATIVE, 1_000).unwrap();
        let lock = engine
            .deploy("time_lock", &owner, &[Value::from(100u64)], BTreeMap::new())
            .unwrap();
        pay(&mut engine, owner, lock, "deposit", vec![], Deposit::native(500)).unwrap();
        (engine, owner, lock)
    }

    #[test]
    fn test_withdraw_fails_while_locked() {
        let (mut engine, owner, lock) = setup();
        engine.set_height(99).unwrap();

        let err = call(&mut engine, owner, lock, "withdraw", vec![Value::from(10u64)]).unwrap_err();
        assert_eq!(err.code, Some(2));
        assert_eq!(engine.balance(&lock, &Address::NATIVE), 500);
        assert_eq!(
            engine.query(&owner, &lock, "is_locked", &[]).unwrap(),
            Value::from(true)
        );
    }

    #[test]
    fn test_withdraw_exact_amount_once_unlocked() {
        let (mut engine, owner, lock) = setup();
        engine.set_height(100).unwrap();

        let sent = call(&mut engine, owner, lock, "withdraw", vec![Value::from(120u64)]).unwrap();
        assert_eq!(sent, Value::from(120u64));
        assert_eq!(engine.balance(&lock, &Address::NATIVE), 380);
        assert_eq!(engine.balance(&owner, &Address::NATIVE), 620);

        call(&mut engine, owner, lock, "withdraw", vec![]).unwrap();
        assert_eq!(engine.balance(&lock, &Address::NATIVE), 0);
    }

    #[test]
    fn test_only_owner_withdraws() {
        let (mut engine, _owner, lock) = setup();
        engine.set_height(200).unwrap();
        let err = call(&mut engine, user("thief"), lock, "withdraw", vec![Value::from(1u64)])
            .unwrap_err();
        assert_eq!(err.code, Some(1));
    }

    #[test]
    fn test_unlock_height_only_increases() {
        let (mut engine, owner, lock) = setup();

        let err = call(&mut engine, owner, lock, "set_unlock_height", vec![Value::from(99u64)])
            .unwrap_err();
        assert_eq!(err.code, Some(3));

        call(&mut engine, owner, lock, "set_unlock_height", vec![Value::from(150u64)]).unwrap();
        assert_eq!(
            engine.query(&owner, &lock, "get_unlock_height", &[]).unwrap(),
            Value::from(150u64)
        );
    }

    #[test]
    fn test_transfer_ownership() {
        let (mut engine, owner, lock) = setup();
        let heir = user("heir");
        call(&mut engine, owner, lock, "transfer", vec![Value::Address(heir)]).unwrap();
        engine.set_height(100).unwrap();

        assert_eq!(
            call(&mut engine, owner, lock, "withdraw", vec![]).unwrap_err().code,
            Some(1)
        );
        call(&mut engine, heir, lock, "withdraw", vec![]).unwrap();
        assert_eq!(engine.balance(&heir, &Address::NATIVE), 500);
    }
}
