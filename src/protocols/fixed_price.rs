//! Fixed-price token sale
//!
//! The contract sells its own currency (the contract address) for a
//! configured sale currency. `price` is a fixed-point number in units of
//! `2^-64`, so a deposit of `amount` mints `floor(amount * price / 2^64)`.
//! The remainder is kept by the seller.
//!
//! Codes: 1 not owner, 2 missing deposit, 3 wrong currency.

use crate::contract::builtins::{bech32, uint};
use crate::contract::{Args, Contract, Method, Runtime};
use crate::core::{ensure, fail, Address, Amount, ExecResult, Value};
use primitive_types::U256;

/// Fractional bits of `price`
pub const PRICE_SHIFT: usize = 64;

pub struct FixedPrice;

static METHODS: &[Method] = &[
    Method::payable("buy"),
    Method::public("withdraw"),
    Method::public("transfer"),
    Method::public("recover"),
    Method::constant("get_price"),
    Method::constant("get_owner"),
    Method::constant("get_currency"),
    Method::constant("get_decimals"),
];

/// Tokens bought by `amount` at `price`
pub fn quote(amount: Amount, price: Amount) -> ExecResult<Amount> {
    let minted = (U256::from(amount) * U256::from(price)) >> PRICE_SHIFT;
    if minted > U256::from(u128::MAX) {
        return fail("mint amount overflow", None);
    }
    Ok(minted.low_u128())
}

fn only_owner(rt: &Runtime<'_>) -> ExecResult<Address> {
    let owner = bech32(&rt.read("owner"))?;
    ensure(rt.user() == owner, "user != owner", 1)?;
    Ok(owner)
}

impl Contract for FixedPrice {
    fn type_name(&self) -> &'static str {
        "fixed_price"
    }

    fn methods(&self) -> &'static [Method] {
        METHODS
    }

    /// `init(owner, currency, price, decimals)`; null owner is the deployer
    fn init(&self, rt: &mut Runtime<'_>, args: Args<'_>) -> ExecResult<()> {
        ensure(rt.read("decimals").is_null(), "already initialized", None)?;

        let owner = match args.get(0) {
            Value::Null => rt.user(),
            other => bech32(other)?,
        };
        let currency = bech32(args.get(1))?;
        ensure(
            currency != rt.this(),
            "cannot sell for the token itself",
            None,
        )?;
        let price = uint(args.get(2))?;
        let decimals = match args.get(3) {
            Value::Null => 0,
            other => uint(other)?,
        };

        rt.write("owner", owner)?;
        rt.write("currency", currency)?;
        rt.write("price", Value::from(price))?;
        rt.write("decimals", Value::from(decimals))
    }

    fn call(&self, rt: &mut Runtime<'_>, method: &str, args: Args<'_>) -> ExecResult<Value> {
        match method {
            "buy" => {
                let deposit = match rt.deposit() {
                    Some(deposit) if deposit.amount > 0 => deposit,
                    _ => return fail("deposit required", 2),
                };
                let currency = bech32(&rt.read("currency"))?;
                ensure(deposit.currency == currency, "wrong currency", 3)?;

                let price = uint(&rt.read("price"))?;
                let minted = quote(deposit.amount, price)?;
                let buyer = rt.user();
                rt.mint(&buyer, minted, Some("fixed price sale"))?;
                Ok(Value::from(minted))
            }
            // withdraw([amount]); 0 or omitted takes all proceeds
            "withdraw" => {
                let owner = only_owner(rt)?;
                let currency = bech32(&rt.read("currency"))?;
                let amount = match args.get(0) {
                    Value::Null => 0,
                    other => uint(other)?,
                };
                let amount = if amount == 0 {
                    rt.balance(&currency)
                } else {
                    amount
                };
                rt.send(&owner, amount, &currency, Some("sale proceeds"))?;
                Ok(Value::from(amount))
            }
            "transfer" => {
                only_owner(rt)?;
                let new_owner = bech32(args.get(0))?;
                rt.write("owner", new_owner)?;
                Ok(Value::Null)
            }
            // recover(currency): rescue anything that is not sale proceeds
            "recover" => {
                let owner = only_owner(rt)?;
                let currency = bech32(args.get(0))?;
                ensure(
                    currency != bech32(&rt.read("currency"))?,
                    "use withdraw for sale proceeds",
                    None,
                )?;
                let amount = rt.balance(&currency);
                rt.send(&owner, amount, &currency, Some("recover"))?;
                Ok(Value::from(amount))
            }
            "get_price" => Ok(rt.read("price")),
            "get_owner" => Ok(rt.read("owner")),
            "get_currency" => Ok(rt.read("currency")),
            "get_decimals" => Ok(rt.read("decimals")),
            other => fail(format!("unhandled method: {}", other), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::quote;
    use crate::contract::{Deposit, Engine};
    use crate::core::{Address, Value};
    use crate::protocols::testing::{call, pay, user};
    use std::collections::BTreeMap;

    const HALF: u128 = 1 << 63;

    fn setup(price: u128) -> (Engine, Address, Address) {
        let mut engine = Engine::new();
        let owner = user("owner");
        let sale = engine
            .deploy(
                "fixed_price",
                &owner,
                &[
                    Value::Null,
                    Value::Null,
                    Value::from(price),
                    Value::from(8u64),
                ],
                BTreeMap::new(),
            )
            .unwrap();
        (engine, owner, sale)
    }

    #[test]
    fn test_quote_is_floor_of_fixed_point_product() {
        assert_eq!(quote(2, HALF).unwrap(), 1);
        assert_eq!(quote(3, HALF).unwrap(), 1);
        // 2^64 at half price buys 2^63 tokens, not 1
        assert_eq!(quote(1 << 64, HALF).unwrap(), HALF);
        assert_eq!(quote(u128::MAX, 1 << 64).unwrap(), u128::MAX);
        assert!(quote(u128::MAX, u128::MAX).is_err());
    }

    #[test]
    fn test_buy_mints_own_token() {
        let (mut engine, owner, sale) = setup(HALF);
        let buyer = user("buyer");
        engine.credit(&buyer, &Address::NATIVE, 10).unwrap();

        let minted = pay(&mut engine, buyer, sale, "buy", vec![], Deposit::native(2)).unwrap();
        assert_eq!(minted, Value::from(1u64));
        assert_eq!(engine.balance(&buyer, &sale), 1);
        assert_eq!(engine.supply(&sale), 1);
        assert_eq!(engine.balance(&sale, &Address::NATIVE), 2);

        // proceeds go to the owner
        call(&mut engine, owner, sale, "withdraw", vec![]).unwrap();
        assert_eq!(engine.balance(&owner, &Address::NATIVE), 2);
    }

    #[test]
    fn test_buy_rejects_other_currency() {
        let (mut engine, _owner, sale) = setup(HALF);
        let buyer = user("buyer");
        let other = user("other-token");
        engine.credit(&buyer, &other, 10).unwrap();

        let err = pay(&mut engine, buyer, sale, "buy", vec![], Deposit::new(other, 10)).unwrap_err();
        assert_eq!(err.code, Some(3));
        // deposit rolled back with the failed call
        assert_eq!(engine.balance(&buyer, &other), 10);

        let err = call(&mut engine, buyer, sale, "buy", vec![]).unwrap_err();
        assert_eq!(err.code, Some(2));
    }

    #[test]
    fn test_withdraw_partial_and_owner_only() {
        let (mut engine, owner, sale) = setup(1 << 64);
        let buyer = user("buyer");
        engine.credit(&buyer, &Address::NATIVE, 100).unwrap();
        pay(&mut engine, buyer, sale, "buy", vec![], Deposit::native(100)).unwrap();
        assert_eq!(engine.balance(&buyer, &sale), 100);

        let err = call(&mut engine, buyer, sale, "withdraw", vec![]).unwrap_err();
        assert_eq!(err.code, Some(1));

        call(&mut engine, owner, sale, "withdraw", vec![Value::from(30u64)]).unwrap();
        assert_eq!(engine.balance(&sale, &Address::NATIVE), 70);
        call(&mut engine, owner, sale, "withdraw", vec![Value::from(0u64)]).unwrap();
        assert_eq!(engine.balance(&sale, &Address::NATIVE), 0);
    }

    #[test]
    fn test_recover_and_transfer() {
        let (mut engine, owner, sale) = setup(HALF);
        let stray = user("stray-token");
        engine.credit(&sale, &stray, 7).unwrap();

        assert!(call(&mut engine, owner, sale, "recover", vec![Value::Null]).is_err());
        call(&mut engine, owner, sale, "recover", vec![Value::Address(stray)]).unwrap();
        assert_eq!(engine.balance(&owner, &stray), 7);

        let heir = user("heir");
        call(&mut engine, owner, sale, "transfer", vec![Value::Address(heir)]).unwrap();
        assert_eq!(
            engine.query(&heir, &sale, "get_owner", &[]).unwrap(),
            Value::Address(heir)
        );
        assert_eq!(
            engine.query(&heir, &sale, "get_price", &[]).unwrap(),
            Value::from(HALF)
        );
    }
}
