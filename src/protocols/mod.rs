//! Built-in protocol contracts
//!
//! Each protocol is a stateless [`Contract`] implementation keeping its state
//! in storage fields. Access control is checked locally in every contract,
//! before any side effect, against `this.user`.
//!
//! | type           | purpose                                        |
//! |----------------|------------------------------------------------|
//! | `escrow`       | agent releases funds to target or back to source |
//! | `time_lock`    | funds withdrawable from a given height on      |
//! | `relay`        | two-phase ownership transfer, call forwarding  |
//! | `smart_wallet` | recurring payment plans                        |
//! | `fixed_price`  | token sale at a fixed-point price              |
//! | `nft`          | single-unit mint                               |
//! | `template`     | signature-gated multi-mint registry            |

pub mod escrow;
pub mod fixed_price;
pub mod nft;
pub mod relay;
pub mod smart_wallet;
pub mod template;
pub mod time_lock;

pub use escrow::Escrow;
pub use fixed_price::FixedPrice;
pub use nft::Nft;
pub use relay::Relay;
pub use smart_wallet::SmartWallet;
pub use template::Template;
pub use time_lock::TimeLock;

use crate::contract::{Contract, ContractRegistry};
use std::sync::Arc;

/// Every built-in protocol
pub fn builtin() -> Vec<Arc<dyn Contract>> {
    vec![
        Arc::new(Escrow),
        Arc::new(TimeLock),
        Arc::new(Relay),
        Arc::new(SmartWallet),
        Arc::new(FixedPrice),
        Arc::new(Nft),
        Arc::new(Template),
    ]
}

/// Add every built-in protocol to `registry`
pub fn register_all(registry: &mut ContractRegistry) {
    for contract in builtin() {
        if let Err(e) = registry.register(contract) {
            log::error!("Failed to register built-in contract: {}", e);
        }
    }
}

/// A registry holding every built-in protocol
pub fn registry() -> ContractRegistry {
    let mut registry = ContractRegistry::new();
    register_all(&mut registry);
    registry
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_protocols_register() {
        let registry = registry();
        assert_eq!(
            registry.names(),
            vec![
                "escrow",
                "fixed_price",
                "nft",
                "relay",
                "smart_wallet",
                "template",
                "time_lock"
            ]
        );
    }
}
