//! Single-unit NFT
//!
//! The creator may mint exactly one unit of this contract's currency, once.

use crate::contract::builtins::bech32;
use crate::contract::{Args, Contract, Method, Runtime};
use crate::core::{ensure, fail, ExecResult, Value};

pub struct Nft;

static METHODS: &[Method] = &[
    Method::public("mint_to"),
    Method::constant("is_minted"),
    Method::constant("get_mint_height"),
    Method::constant("get_creator"),
];

impl Contract for Nft {
    fn type_name(&self) -> &'static str {
        "nft"
    }

    fn methods(&self) -> &'static [Method] {
        METHODS
    }

    fn init(&self, rt: &mut Runtime<'_>, args: Args<'_>) -> ExecResult<()> {
        let creator = match args.get(0) {
            Value::Null => rt.user(),
            other => bech32(other)?,
        };
        rt.write("creator", creator)
    }

    fn call(&self, rt: &mut Runtime<'_>, method: &str, args: Args<'_>) -> ExecResult<Value> {
        match method {
            "mint_to" => {
                let creator = bech32(&rt.read("creator"))?;
                ensure(rt.user() == creator, "user != creator", 1)?;
                ensure(rt.read("mint_height").is_null(), "already minted", 2)?;

                let target = bech32(args.get(0))?;
                let height = rt.height();
                rt.write("mint_height", height)?;
                rt.mint(&target, 1, Some("nft"))?;
                Ok(Value::from(height))
            }
            "is_minted" => Ok(Value::from(!rt.read("mint_height").is_null())),
            "get_mint_height" => Ok(rt.read("mint_height")),
            "get_creator" => Ok(rt.read("creator")),
            other => fail(format!("unhandled method: {}", other), None),
        }
    }
}
