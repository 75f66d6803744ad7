//! Multi-mint authority for numbered NFTs
//!
//! The template stores only `sha256(creator_key)`. Whoever holds a signature
//! by that key over their own address can claim one unused serial number:
//!
//! 1. the serial is a non-zero integer
//! 2. the serial is not registered yet
//! 3. the revealed key matches the stored commitment
//! 4. the signature over `this.user` verifies under that key
//!
//! Each check has the matching failure code and runs only if the previous
//! ones passed.

use crate::contract::builtins::{self, binary};
use crate::contract::{Args, Contract, Method, Runtime};
use crate::core::{ensure, fail, ExecResult, Value};

pub struct Template;

static METHODS: &[Method] = &[
    Method::public("add"),
    Method::constant("get_minter"),
    Method::constant("count"),
    Method::constant("get_creator"),
];

impl Contract for Template {
    fn type_name(&self) -> &'static str {
        "template"
    }

    fn methods(&self) -> &'static [Method] {
        METHODS
    }

    /// `init(creator)` where `creator` is the 32-byte key commitment
    fn init(&self, rt: &mut Runtime<'_>, args: Args<'_>) -> ExecResult<()> {
        let creator = binary(args.get(0))?;
        ensure(creator.len() == 32, "creator must be a sha256 digest", None)?;
        rt.write("creator", Value::Binary(creator))?;
        rt.write("nfts", Value::map())
    }

    fn call(&self, rt: &mut Runtime<'_>, method: &str, args: Args<'_>) -> ExecResult<Value> {
        match method {
            // add(serial, creator_key, signature)
            "add" => {
                let serial = match args.get(0) {
                    Value::Uint(n) if *n != 0 => Value::Uint(*n),
                    _ => return fail("invalid serial", 1),
                };

                let mut nfts = rt.read("nfts");
                ensure(nfts.get(serial.clone()).is_null(), "serial already registered", 2)?;

                let key = args.get(1);
                let matches = match builtins::sha256(key) {
                    Ok(digest) => digest == rt.read("creator"),
                    Err(_) => false,
                };
                ensure(matches, "invalid creator", 3)?;

                let minter = rt.user();
                ensure(
                    builtins::ecdsa_verify(&Value::Address(minter), key, args.get(2)),
                    "invalid signature",
                    4,
                )?;

                nfts.insert(serial.clone(), Value::Address(minter))?;
                rt.write("nfts", nfts)?;
                Ok(serial)
            }
            "get_minter" => Ok(rt.read("nfts").get(args.get(0).clone()).clone()),
            "count" => Ok(Value::from(rt.read("nfts").size()? as u64)),
            "get_creator" => {
                // stored commitment, never a raw key
                let creator = rt.read("creator");
                Ok(Value::from(builtins::binary_hex(&creator)?))
            }
            other => fail(format!("unhandled method: {}", other), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::contract::Engine;
    use crate::core::{Address, Value};
    use crate::crypto::{sha256, KeyPair};
    use crate::protocols::testing::{call, user};
    use std::collections::BTreeMap;

    fn setup() -> (Engine, Address, KeyPair) {
        let mut engine = Engine::new();
        let creator = KeyPair::generate();
        let commitment = sha256(&creator.public_key_bytes());
        let template = engine
            .deploy(
                "template",
                &user("deployer"),
                &[Value::binary(commitment)],
                BTreeMap::new(),
            )
            .unwrap();
        (engine, template, creator)
    }

    fn add_args(serial: Value, key: &KeyPair, signature: Vec<u8>) -> Vec<Value> {
        vec![
            serial,
            Value::binary(key.public_key_bytes()),
            Value::binary(signature),
        ]
    }

    #[test]
    fn test_serial_registered_once() {
        let (mut engine, template, creator) = setup();
        let (alice, bob) = (user("alice"), user("bob"));

        let sig = creator.sign_address(&alice);
        let serial = call(
            &mut engine,
            alice,
            template,
            "add",
            add_args(Value::from(7u64), &creator, sig),
        )
        .unwrap();
        assert_eq!(serial, Value::from(7u64));
        assert_eq!(
            engine
                .query(&bob, &template, "get_minter", &[Value::from(7u64)])
                .unwrap(),
            Value::Address(alice)
        );

        // valid or not, the signature is never reached
        let sig2 = creator.sign_address(&bob);
        let err = call(
            &mut engine,
            bob,
            template,
            "add",
            add_args(Value::from(7u64), &creator, sig2),
        )
        .unwrap_err();
        assert_eq!(err.code, Some(2));
        let err = call(
            &mut engine,
            bob,
            template,
            "add",
            add_args(Value::from(7u64), &creator, vec![0u8; 3]),
        )
        .unwrap_err();
        assert_eq!(err.code, Some(2));

        assert_eq!(
            engine.query(&bob, &template, "count", &[]).unwrap(),
            Value::from(1u64)
        );
    }

    #[test]
    fn test_invalid_serials() {
        let (mut engine, template, creator) = setup();
        let alice = user("alice");
        for serial in [Value::from(0u64), Value::from(-3i64), Value::from("7"), Value::Null] {
            let err = call(
                &mut engine,
                alice,
                template,
                "add",
                add_args(serial, &creator, creator.sign_address(&alice)),
            )
            .unwrap_err();
            assert_eq!(err.code, Some(1));
        }
    }

    #[test]
    fn test_wrong_key_fails_before_signature() {
        let (mut engine, template, _creator) = setup();
        let alice = user("alice");
        let impostor = KeyPair::generate();

        // a perfectly valid signature by the wrong key
        let err = call(
            &mut engine,
            alice,
            template,
            "add",
            add_args(Value::from(1u64), &impostor, impostor.sign_address(&alice)),
        )
        .unwrap_err();
        assert_eq!(err.code, Some(3));
    }

    #[test]
    fn test_signature_must_cover_caller() {
        let (mut engine, template, creator) = setup();
        let (alice, mallory) = (user("alice"), user("mallory"));

        // mallory replays alice's signature
        let err = call(
            &mut engine,
            mallory,
            template,
            "add",
            add_args(Value::from(3u64), &creator, creator.sign_address(&alice)),
        )
        .unwrap_err();
        assert_eq!(err.code, Some(4));
        assert!(engine
            .query(&alice, &template, "get_minter", &[Value::from(3u64)])
            .unwrap()
            .is_null());

        call(
            &mut engine,
            alice,
            template,
            "add",
            add_args(Value::from(3u64), &creator, creator.sign_address(&alice)),
        )
        .unwrap();
    }

    #[test]
    fn test_creator_is_commitment() {
        let (mut engine, template, creator) = setup();
        let shown = engine
            .query(&user("x"), &template, "get_creator", &[])
            .unwrap();
        assert_eq!(
            shown,
            Value::from(hex::encode(sha256(&creator.public_key_bytes())))
        );

        let err = Engine::new()
            .deploy("template", &user("d"), &[Value::binary(vec![1, 2])], BTreeMap::new())
            .unwrap_err();
        assert!(err.reason.contains("sha256"));
    }
}
