//! Contract storage and the balance ledger
//!
//! All mutations go through [`WorldState`], which journals the previous value
//! of everything it touches. A call frame takes a [`Checkpoint`] before it
//! runs and reverts to it on failure; a successful top-level call commits,
//! which simply forgets the journal.

use crate::core::{fail, Address, Amount, ExecResult, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How funds moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Attached to a call and consumed by the callee
    Deposit,
    /// Paid out by a contract
    Send,
    /// Newly issued
    Mint,
}

/// Audit record of a balance change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub kind: EventKind,
    /// `None` for issuance
    pub from: Option<Address>,
    pub to: Address,
    pub currency: Address,
    pub amount: Amount,
    pub memo: Option<String>,
    pub height: u64,
}

#[derive(Debug, Clone)]
enum JournalEntry {
    Storage {
        contract: Address,
        field: String,
        prev: Option<Value>,
    },
    Balance {
        owner: Address,
        currency: Address,
        prev: Amount,
    },
    Supply {
        currency: Address,
        prev: Amount,
    },
    Event,
}

/// Position in the journal a frame can roll back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Persistent storage, balances, issuance and events of every contract
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldState {
    storage: BTreeMap<Address, BTreeMap<String, Value>>,
    balances: BTreeMap<Address, BTreeMap<Address, Amount>>,
    supply: BTreeMap<Address, Amount>,
    events: Vec<LedgerEvent>,
    #[serde(skip)]
    journal: Vec<JournalEntry>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Storage field of a contract; missing fields read as null
    pub fn read(&self, contract: &Address, field: &str) -> Value {
        self.storage
            .get(contract)
            .and_then(|fields| fields.get(field))
            .cloned()
            .unwrap_or_default()
    }

    /// All storage fields of a contract
    pub fn fields(&self, contract: &Address) -> Option<&BTreeMap<String, Value>> {
        self.storage.get(contract)
    }

    pub fn balance(&self, owner: &Address, currency: &Address) -> Amount {
        self.balances
            .get(owner)
            .and_then(|by_currency| by_currency.get(currency))
            .copied()
            .unwrap_or(0)
    }

    /// Non-zero balances of an owner
    pub fn balances_of(&self, owner: &Address) -> Vec<(Address, Amount)> {
        self.balances
            .get(owner)
            .map(|by_currency| by_currency.iter().map(|(c, a)| (*c, *a)).collect())
            .unwrap_or_default()
    }

    /// Total issued amount of a currency
    pub fn supply(&self, currency: &Address) -> Amount {
        self.supply.get(currency).copied().unwrap_or(0)
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    // =========================================================================
    // Journaled mutations
    // =========================================================================

    /// Write a storage field; writing null removes it
    pub fn write(&mut self, contract: &Address, field: &str, value: Value) {
        let fields = self.storage.entry(*contract).or_default();
        let prev = if value.is_null() {
            fields.remove(field)
        } else {
            fields.insert(field.to_string(), value)
        };
        self.journal.push(JournalEntry::Storage {
            contract: *contract,
            field: field.to_string(),
            prev,
        });
    }

    /// Move `amount` of `currency` between two owners
    #[allow(clippy::too_many_arguments)]
    pub fn transfer(
        &mut self,
        kind: EventKind,
        from: &Address,
        to: &Address,
        currency: &Address,
        amount: Amount,
        memo: Option<String>,
        height: u64,
    ) -> ExecResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let have = self.balance(from, currency);
        if have < amount {
            return fail(
                format!("insufficient funds: have {}, need {}", have, amount),
                None,
            );
        }
        self.set_balance(from, currency, have - amount);

        let credited = match self.balance(to, currency).checked_add(amount) {
            Some(total) => total,
            None => return fail("balance overflow", None),
        };
        self.set_balance(to, currency, credited);

        self.push_event(LedgerEvent {
            kind,
            from: Some(*from),
            to: *to,
            currency: *currency,
            amount,
            memo,
            height,
        });
        Ok(())
    }

    /// Create `amount` new units of `currency` for `to`
    pub fn issue(
        &mut self,
        currency: &Address,
        to: &Address,
        amount: Amount,
        memo: Option<String>,
        height: u64,
    ) -> ExecResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let supply = match self.supply(currency).checked_add(amount) {
            Some(total) => total,
            None => return fail("supply overflow", None),
        };
        let credited = match self.balance(to, currency).checked_add(amount) {
            Some(total) => total,
            None => return fail("balance overflow", None),
        };

        let prev = self.supply.insert(*currency, supply).unwrap_or(0);
        self.journal.push(JournalEntry::Supply {
            currency: *currency,
            prev,
        });
        self.set_balance(to, currency, credited);

        self.push_event(LedgerEvent {
            kind: EventKind::Mint,
            from: None,
            to: *to,
            currency: *currency,
            amount,
            memo,
            height,
        });
        Ok(())
    }

    fn set_balance(&mut self, owner: &Address, currency: &Address, amount: Amount) {
        let prev = self.balance(owner, currency);
        self.put_balance(owner, currency, amount);
        self.journal.push(JournalEntry::Balance {
            owner: *owner,
            currency: *currency,
            prev,
        });
    }

    fn put_balance(&mut self, owner: &Address, currency: &Address, amount: Amount) {
        let by_currency = self.balances.entry(*owner).or_default();
        if amount == 0 {
            by_currency.remove(currency);
            if by_currency.is_empty() {
                self.balances.remove(owner);
            }
        } else {
            by_currency.insert(*currency, amount);
        }
    }

    fn push_event(&mut self, event: LedgerEvent) {
        self.events.push(event);
        self.journal.push(JournalEntry::Event);
    }

    // =========================================================================
    // Checkpoints
    // =========================================================================

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.journal.len())
    }

    /// Undo every mutation made since `checkpoint`
    pub fn revert(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.0 {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            match entry {
                JournalEntry::Storage {
                    contract,
                    field,
                    prev,
                } => {
                    let fields = self.storage.entry(contract).or_default();
                    match prev {
                        Some(value) => {
                            fields.insert(field, value);
                        }
                        None => {
                            fields.remove(&field);
                        }
                    }
                    if fields.is_empty() {
                        self.storage.remove(&contract);
                    }
                }
                JournalEntry::Balance {
                    owner,
                    currency,
                    prev,
                } => self.put_balance(&owner, &currency, prev),
                JournalEntry::Supply { currency, prev } => {
                    if prev == 0 {
                        self.supply.remove(&currency);
                    } else {
                        self.supply.insert(currency, prev);
                    }
                }
                JournalEntry::Event => {
                    self.events.pop();
                }
            }
        }
    }

    /// Make everything since the last commit permanent
    pub fn commit(&mut self) {
        self.journal.clear();
    }

    /// Number of uncommitted journal entries
    pub fn pending(&self) -> usize {
        self.journal.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: &str) -> Address {
        Address::hash_of(tag.as_bytes())
    }

    #[test]
    fn test_storage_write_and_revert() {
        let mut state = WorldState::new();
        let contract = addr("c");

        state.write(&contract, "owner", Value::from("alice"));
        state.commit();

        let cp = state.checkpoint();
        state.write(&contract, "owner", Value::from("bob"));
        state.write(&contract, "extra", Value::from(1u64));
        assert_eq!(state.read(&contract, "owner"), Value::from("bob"));

        state.revert(cp);
        assert_eq!(state.read(&contract, "owner"), Value::from("alice"));
        assert!(state.read(&contract, "extra").is_null());
    }

    #[test]
    fn test_transfer_and_insufficient_funds() {
        let mut state = WorldState::new();
        let (a, b, native) = (addr("a"), addr("b"), Address::NATIVE);

        state.issue(&native, &a, 100, None, 0).unwrap();
        state
            .transfer(EventKind::Send, &a, &b, &native, 40, Some("memo".into()), 1)
            .unwrap();
        assert_eq!(state.balance(&a, &native), 60);
        assert_eq!(state.balance(&b, &native), 40);

        let err = state
            .transfer(EventKind::Send, &a, &b, &native, 61, None, 1)
            .unwrap_err();
        assert!(err.reason.contains("insufficient funds"));
        assert_eq!(state.balance(&a, &native), 60);
    }

    #[test]
    fn test_revert_restores_balances_supply_and_events() {
        let mut state = WorldState::new();
        let (a, b, token) = (addr("a"), addr("b"), addr("token"));

        state.issue(&token, &a, 10, None, 0).unwrap();
        state.commit();
        assert_eq!(state.events().len(), 1);

        let cp = state.checkpoint();
        state.issue(&token, &b, 5, None, 1).unwrap();
        state
            .transfer(EventKind::Send, &a, &b, &token, 10, None, 1)
            .unwrap();
        assert_eq!(state.supply(&token), 15);

        state.revert(cp);
        assert_eq!(state.supply(&token), 10);
        assert_eq!(state.balance(&a, &token), 10);
        assert_eq!(state.balance(&b, &token), 0);
        assert_eq!(state.events().len(), 1);
        assert!(state.balances_of(&b).is_empty());
    }

    #[test]
    fn test_nested_checkpoints() {
        let mut state = WorldState::new();
        let c = addr("c");

        let outer = state.checkpoint();
        state.write(&c, "x", Value::from(1u64));
        let inner = state.checkpoint();
        state.write(&c, "x", Value::from(2u64));

        state.revert(inner);
        assert_eq!(state.read(&c, "x"), Value::from(1u64));

        state.revert(outer);
        assert!(state.read(&c, "x").is_null());
        assert_eq!(state.pending(), 0);
    }

    #[test]
    fn test_zero_amounts_are_noops() {
        let mut state = WorldState::new();
        let (a, b) = (addr("a"), addr("b"));
        state
            .transfer(EventKind::Send, &a, &b, &Address::NATIVE, 0, None, 0)
            .unwrap();
        state.issue(&a, &b, 0, None, 0).unwrap();
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_issue_overflow() {
        let mut state = WorldState::new();
        let (a, token) = (addr("a"), addr("token"));
        state.issue(&token, &a, u128::MAX, None, 0).unwrap();
        assert!(state.issue(&token, &a, 1, None, 0).is_err());
    }

    #[test]
    fn test_serde_skips_journal() {
        let mut state = WorldState::new();
        let c = addr("c");
        state.write(&c, "n", Value::from(3u64));
        state.issue(&Address::NATIVE, &c, 7, None, 0).unwrap();

        let json = serde_json::to_string(&state).unwrap();
        let back: WorldState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.read(&c, "n"), Value::from(3u64));
        assert_eq!(back.balance(&c, &Address::NATIVE), 7);
        assert_eq!(back.pending(), 0);
    }
}
