//! Wallet with recurring payment plans
//!
//! The owner registers named plans `{amount, currency, target, memo,
//! interval, next_pay, active}`. Anyone may trigger a due payment; each
//! trigger pays once and moves `next_pay` forward by exactly one interval, so
//! missed periods are neither skipped nor paid in bulk.
//!
//! Codes: 1 not owner, 2 active plan exists, 3 no such plan, 4 plan inactive,
//! 5 payment not due.

use crate::contract::builtins::{bech32, uint};
use crate::contract::{Args, Contract, Method, Runtime};
use crate::core::{ensure, fail, Address, ExecResult, Value};

pub struct SmartWallet;

static METHODS: &[Method] = &[
    Method::payable("deposit"),
    Method::public("withdraw"),
    Method::public("add_plan"),
    Method::public("plan_payment"),
    Method::public("cancel_plan"),
    Method::constant("get_plan"),
    Method::constant("get_owner"),
];

fn only_owner(rt: &Runtime<'_>) -> ExecResult<Address> {
    let owner = bech32(&rt.read("owner"))?;
    ensure(rt.user() == owner, "user != owner", 1)?;
    Ok(owner)
}

fn plan_name(value: &Value) -> ExecResult<String> {
    match value.as_str() {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => fail("plan name must be a non-empty string", None),
    }
}

/// Existing plan by name, code 3 if missing
fn load_plan(plans: &Value, name: &str) -> ExecResult<Value> {
    let plan = plans.get(name);
    ensure(!plan.is_null(), format!("no such plan: {}", name), 3)?;
    Ok(plan.clone())
}

impl Contract for SmartWallet {
    fn type_name(&self) -> &'static str {
        "smart_wallet"
    }

    fn methods(&self) -> &'static [Method] {
        METHODS
    }

    fn init(&self, rt: &mut Runtime<'_>, args: Args<'_>) -> ExecResult<()> {
        let owner = match args.get(0) {
            Value::Null => rt.user(),
            other => bech32(other)?,
        };
        rt.write("owner", owner)?;
        rt.write("plans", Value::map())
    }

    fn call(&self, rt: &mut Runtime<'_>, method: &str, args: Args<'_>) -> ExecResult<Value> {
        match method {
            "deposit" => {
                let currency = rt.deposit().map(|d| d.currency).unwrap_or(Address::NATIVE);
                Ok(Value::from(rt.balance(&currency)))
            }
            // withdraw(amount[, currency]); 0 or omitted takes everything
            "withdraw" => {
                let owner = only_owner(rt)?;
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
                rt.send(&owner, amount, &currency, Some("wallet withdraw"))?;
                Ok(Value::from(amount))
            }
            // add_plan(name, amount, currency, target, memo, interval[, start])
            "add_plan" => {
                only_owner(rt)?;
                let name = plan_name(args.get(0))?;
                let mut plans = rt.read("plans");
                let existing = plans.get(name.as_str());
                ensure(
                    existing.is_null() || existing.get("active").as_bool() != Some(true),
                    format!("plan already exists: {}", name),
                    2,
                )?;

                let amount = uint(args.get(1))?;
                let currency = bech32(args.get(2))?;
                let target = bech32(args.get(3))?;
                let memo = match args.get(4) {
                    Value::Null => name.clone(),
                    other => other.to_string(),
                };
                let interval = uint(args.get(5))?;
                ensure(interval > 0, "interval must be positive", None)?;
                let next_pay = match args.get(6) {
                    Value::Null => match u128::from(rt.height()).checked_add(interval) {
                        Some(h) => h,
                        None => return fail("next_pay overflow", None),
                    },
                    other => uint(other)?,
                };

                let plan = Value::object([
                    ("amount", Value::from(amount)),
                    ("currency", Value::Address(currency)),
                    ("target", Value::Address(target)),
                    ("memo", Value::from(memo)),
                    ("interval", Value::from(interval)),
                    ("next_pay", Value::from(next_pay)),
                    ("active", Value::from(true)),
                ]);
                plans.insert(name.as_str(), plan.clone())?;
                rt.write("plans", plans)?;
                Ok(plan)
            }
            "plan_payment" => {
                let name = plan_name(args.get(0))?;
                let mut plans = rt.read("plans");
                let mut plan = load_plan(&plans, &name)?;
                ensure(
                    plan.get("active").as_bool() == Some(true),
                    "plan inactive",
                    4,
                )?;
                let next_pay = uint(plan.get("next_pay"))?;
                ensure(u128::from(rt.height()) >= next_pay, "payment not due", 5)?;

                let interval = uint(plan.get("interval"))?;
                let advanced = match next_pay.checked_add(interval) {
                    Some(h) => h,
                    None => return fail("next_pay overflow", None),
                };
                plan.insert("next_pay", Value::from(advanced))?;

                let amount = uint(plan.get("amount"))?;
                let currency = bech32(plan.get("currency"))?;
                let target = bech32(plan.get("target"))?;
                let memo = plan.get("memo").to_string();

                plans.insert(name.as_str(), plan)?;
                rt.write("plans", plans)?;
                rt.send(&target, amount, &currency, Some(&memo))?;
                Ok(Value::from(advanced))
            }
            "cancel_plan" => {
                only_owner(rt)?;
                let name = plan_name(args.get(0))?;
                let mut plans = rt.read("plans");
                let mut plan = load_plan(&plans, &name)?;
                plan.insert("active", Value::from(false))?;
                plans.insert(name.as_str(), plan)?;
                rt.write("plans", plans)?;
                Ok(Value::Null)
            }
            "get_plan" => {
                let name = plan_name(args.get(0))?;
                Ok(rt.read("plans").get(name.as_str()).clone())
            }
            "get_owner" => Ok(rt.read("owner")),
            other => fail(format!("unhandled method: {}", other), None),
        }
    }
}
