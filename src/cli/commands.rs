//! CLI commands for the ledger
//!
//! Implements all command handlers for the CLI interface.

use crate::contract::{Call, Deposit, Engine, EngineConfig, EventKind};
use crate::core::{Address, Amount, Value};
use crate::crypto::KeyPair;
use crate::protocols;
use crate::storage::{Storage, StorageConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub engine: Engine,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize application state
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage_config = StorageConfig {
            data_dir: data_dir.clone(),
            ..Default::default()
        };

        let storage = Storage::new(storage_config)?;

        // Load or create ledger
        let engine = if storage.exists() {
            let saved = storage.load()?;
            log::debug!("Loaded state saved at {}", saved.saved_at);
            Engine::from_snapshot(
                saved.snapshot,
                protocols::registry(),
                EngineConfig::default(),
            )
        } else {
            println!("🆕 Creating new ledger...");
            let engine = Engine::new();
            storage.save(&engine.snapshot())?;
            engine
        };

        Ok(Self {
            engine,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.engine.snapshot())?;
        Ok(())
    }
}

/// Parse a JSON array of call arguments
pub fn parse_args(args: Option<&str>) -> CliResult<Vec<Value>> {
    let Some(raw) = args else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Array(items) => Ok(items.into_iter().map(Value::from_json).collect()),
        other => Ok(vec![Value::from_json(other)]),
    }
}

/// Parse `name=address` pairs separated by commas
pub fn parse_depends(depends: Option<&str>) -> CliResult<BTreeMap<String, Address>> {
    let mut map = BTreeMap::new();
    let Some(raw) = depends else {
        return Ok(map);
    };
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, address) = pair
            .split_once('=')
            .ok_or_else(|| format!("dependency must be name=address: {}", pair))?;
        map.insert(name.trim().to_string(), Address::parse(address.trim())?);
    }
    Ok(map)
}

fn parse_currency(currency: Option<&str>) -> CliResult<Address> {
    match currency {
        None | Some("") | Some("native") => Ok(Address::NATIVE),
        Some(s) => Ok(Address::parse(s)?),
    }
}

fn currency_label(currency: &Address) -> String {
    if currency.is_native() {
        "native".to_string()
    } else {
        currency.to_string()
    }
}

/// Initialize a new ledger
pub fn cmd_init(data_dir: &Path, force: bool) -> CliResult<()> {
    let storage_config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };

    let storage = Storage::new(storage_config)?;

    if storage.exists() {
        if !force {
            println!("⚠️  Ledger already exists at {:?}", data_dir);
            println!("   Use --force to reinitialize (this will delete existing data)");
            return Ok(());
        }
        storage.delete()?;
    }

    let engine = Engine::new();
    storage.save(&engine.snapshot())?;

    println!("✅ Ledger initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!(
        "   📜 Contract types: {}",
        engine.registry().names().join(", ")
    );

    Ok(())
}

/// Generate a key pair
pub fn cmd_keygen() -> CliResult<()> {
    let keypair = KeyPair::generate();
    let commitment = crate::crypto::sha256_hex(&keypair.public_key_bytes());

    println!("🔐 New key pair");
    println!("   📍 Address: {}", keypair.address());
    println!("   🔑 Public key: {}", keypair.public_key_hex());
    println!("   #️⃣  Key commitment: {}", commitment);
    println!("   🗝️  Private key: {}", keypair.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: The private key is not stored anywhere. Keep it safe!");

    Ok(())
}

/// Sign an address with a private key
pub fn cmd_sign(private_key: &str, address: &str) -> CliResult<()> {
    let keypair = KeyPair::from_private_key_hex(private_key)?;
    let address = Address::parse(address)?;
    let signature = keypair.sign_address(&address);

    println!("✍️  Signature over {}", address);
    println!("   {}", hex::encode(signature));
    println!("   Public key: {}", keypair.public_key_hex());

    Ok(())
}

/// Issue funds to an account
pub fn cmd_credit(
    state: &mut AppState,
    to: &str,
    amount: Amount,
    currency: Option<&str>,
) -> CliResult<()> {
    let to = Address::parse(to)?;
    let currency = parse_currency(currency)?;
    state.engine.credit(&to, &currency, amount)?;
    state.save()?;

    println!("💰 Credited {} {} to {}", amount, currency_label(&currency), to);
    println!("   New balance: {}", state.engine.balance(&to, &currency));

    Ok(())
}

/// Move the height forward
pub fn cmd_advance(state: &mut AppState, blocks: Option<u64>, to: Option<u64>) -> CliResult<()> {
    match to {
        Some(height) => state.engine.set_height(height)?,
        None => {
            state.engine.advance(blocks.unwrap_or(1))?;
        }
    }
    state.save()?;

    println!("⏩ Height is now {}", state.engine.height());
    Ok(())
}

/// Deploy a contract
pub fn cmd_deploy(
    state: &mut AppState,
    contract_type: &str,
    from: &str,
    args: Option<&str>,
    depends: Option<&str>,
) -> CliResult<()> {
    let deployer = Address::parse(from)?;
    let args = parse_args(args)?;
    let depends = parse_depends(depends)?;

    match state.engine.deploy(contract_type, &deployer, &args, depends) {
        Ok(address) => {
            state.save()?;
            println!("📜 Contract deployed!");
            println!("   📍 Address: {}", address);
            println!("   🏷️  Type: {}", contract_type);
            println!("   🧱 Height: {}", state.engine.height());
        }
        Err(failure) => {
            println!("❌ Deployment failed: {}", failure);
        }
    }

    Ok(())
}

/// Call a contract method
#[allow(clippy::too_many_arguments)]
pub fn cmd_call(
    state: &mut AppState,
    from: &str,
    contract: &str,
    method: &str,
    args: Option<&str>,
    deposit: Option<Amount>,
    currency: Option<&str>,
) -> CliResult<()> {
    let user = Address::parse(from)?;
    let contract = Address::parse(contract)?;
    let mut call = Call::new(user, contract, method, parse_args(args)?);
    if let Some(amount) = deposit {
        call = call.with_deposit(Deposit::new(parse_currency(currency)?, amount));
    }

    println!("📞 Calling {}.{}", contract, method);
    match state.engine.call(call) {
        Ok(value) => {
            state.save()?;
            println!("✅ Success");
            println!("   Result: {}", value);
        }
        Err(failure) => {
            println!("❌ Call failed: {}", failure);
            println!("   No changes were applied.");
        }
    }

    Ok(())
}

/// Run a const method without changing state
pub fn cmd_query(
    state: &mut AppState,
    from: Option<&str>,
    contract: &str,
    method: &str,
    args: Option<&str>,
) -> CliResult<()> {
    let user = match from {
        Some(from) => Address::parse(from)?,
        None => Address::NATIVE,
    };
    let contract = Address::parse(contract)?;
    let args = parse_args(args)?;

    match state.engine.query(&user, &contract, method, &args) {
        Ok(value) => println!("{}", value),
        Err(failure) => println!("❌ Query failed: {}", failure),
    }

    Ok(())
}

/// Show all balances of an address
pub fn cmd_balance(state: &AppState, address: &str) -> CliResult<()> {
    let address = Address::parse(address)?;
    let balances = state.engine.balances_of(&address);

    println!("💰 Balances for {}", address);
    if balances.is_empty() {
        println!("   (none)");
    }
    for (currency, amount) in balances {
        println!("   └─ {} {}", amount, currency_label(&currency));
    }

    Ok(())
}

/// Show a contract instance
pub fn cmd_info(state: &AppState, contract: &str) -> CliResult<()> {
    let address = Address::parse(contract)?;
    let Some(instance) = state.engine.instance(&address) else {
        println!("❌ Contract not found: {}", address);
        return Ok(());
    };

    println!("📜 Contract {}", instance.address);
    println!("   ├─ Type: {}", instance.type_name);
    println!("   ├─ Deployer: {}", instance.deployer);
    println!("   ├─ Deployed at: {}", instance.deployed_at);
    println!("   ├─ Supply: {}", state.engine.supply(&address));
    for (name, dep) in &instance.depends {
        println!("   ├─ Depends: {} = {}", name, dep);
    }

    println!("   └─ Storage:");
    if let Some(fields) = state.engine.fields(&address) {
        for (field, value) in fields {
            println!("      {} = {}", field, value);
        }
    }

    Ok(())
}

/// List contract types and deployed instances
pub fn cmd_list(state: &AppState) -> CliResult<()> {
    println!("🧩 Contract types: {}", state.engine.registry().names().join(", "));
    println!("   Height: {}", state.engine.height());

    if state.engine.count() == 0 {
        println!("📭 No contracts deployed");
        return Ok(());
    }

    println!("📋 Contracts:");
    for instance in state.engine.instances() {
        println!(
            "   {} | {} | deployed at {}",
            instance.address, instance.type_name, instance.deployed_at
        );
    }

    Ok(())
}

/// Show recent ledger events
pub fn cmd_events(state: &AppState, count: usize) -> CliResult<()> {
    let events = state.engine.events();
    let start = events.len().saturating_sub(count);

    println!("🧾 Ledger events ({} total):", events.len());
    for event in &events[start..] {
        let kind = match event.kind {
            EventKind::Deposit => "deposit",
            EventKind::Send => "send",
            EventKind::Mint => "mint",
        };
        let from = event
            .from
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   #{} {} {} {} {} -> {} {}",
            event.height,
            kind,
            event.amount,
            currency_label(&event.currency),
            from,
            event.to,
            event.memo.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

/// Export the ledger state to a file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.engine.snapshot(), path)?;
    println!("📦 Ledger exported to {:?}", path);
    Ok(())
}

/// Import the ledger state from a file, replacing the current one
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    let saved = crate::storage::load_from_file(path)?;
    state.engine = Engine::from_snapshot(
        saved.snapshot,
        protocols::registry(),
        EngineConfig::default(),
    );
    state.save()?;

    println!("📥 Ledger imported from {:?}", path);
    println!("   Saved at: {}", saved.saved_at);
    println!("   Height: {}", state.engine.height());
    println!("   Contracts: {}", state.engine.count());
    Ok(())
}

/// Restore a backup, or list the available ones
pub fn cmd_restore(state: &mut AppState, backup: Option<usize>) -> CliResult<()> {
    let Some(index) = backup else {
        let stats = state.storage.stats()?;
        println!("💾 Storage at {:?}", stats.data_dir);
        println!("   State file: {} bytes", stats.file_size);
        println!("   Backups: {}", stats.backup_count);
        for index in state.storage.list_backups() {
            println!("   └─ backup {}", index);
        }
        return Ok(());
    };

    let saved = state.storage.restore_backup(index)?;
    state.engine = Engine::from_snapshot(
        saved.snapshot,
        protocols::registry(),
        EngineConfig::default(),
    );
    state.save()?;

    println!("⏪ Restored backup {} (saved at {})", index, saved.saved_at);
    println!("   Height: {}", state.engine.height());
    Ok(())
}
