//! CLI commands for the ledger
//!
//! Implements all command handlers for the CLI interface. Every mutating
//! command loads the stored snapshot, runs one call through the host and
//! saves the result.

use crate::config::LedgerConfig;
use crate::storage::{Storage, StorageError};
use crate::token::{
    format_units, parse_units, Address, Amount, EventRecord, Ledger, LedgerEvent, LedgerHost,
};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub host: LedgerHost,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the stored ledger
    pub fn new(data_dir: PathBuf, config: &LedgerConfig) -> CliResult<Self> {
        let storage = Storage::new(config.storage(data_dir.clone()))?;

        if !storage.exists() {
            return Err(format!(
                "No ledger found in {:?}. Create one with: ledger init --creator <ACCOUNT>",
                data_dir
            )
            .into());
        }

        let snapshot = storage.load()?;
        log::debug!(
            "Loaded {} ledger with {} holders",
            snapshot.ledger.symbol(),
            snapshot.ledger.holder_count()
        );

        Ok(Self {
            host: LedgerHost::from_snapshot(snapshot),
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.host.snapshot())?;
        Ok(())
    }

    fn decimals(&self) -> u8 {
        self.host.read(|ledger| ledger.decimals())
    }

    fn symbol(&self) -> String {
        self.host.read(|ledger| ledger.symbol().to_string())
    }

    /// Parse a human-scale amount using the token's decimals
    pub fn parse_amount(&self, text: &str) -> CliResult<Amount> {
        Ok(parse_units(text, self.decimals())?)
    }

    /// Format raw units as "<human> <SYMBOL>"
    pub fn display_amount(&self, amount: Amount) -> String {
        format!("{} {}", format_units(amount, self.decimals()), self.symbol())
    }
}

/// Resolve an account argument (hex address or label)
pub fn resolve_account(input: &str) -> CliResult<Address> {
    Ok(Address::resolve(input)?)
}

/// Initialize a new ledger
pub fn cmd_init(
    data_dir: &Path,
    config: &LedgerConfig,
    creator: &str,
    force: bool,
) -> CliResult<()> {
    let storage = Storage::new(config.storage(data_dir.to_path_buf()))?;

    if storage.exists() && !force {
        println!("⚠️  Ledger already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will delete existing data)");
        return Ok(());
    }

    let creator = resolve_account(creator)?;
    let ledger = Ledger::new(config.metadata()?, config.initial_supply, creator)?;
    let host = LedgerHost::with_history_limit(ledger, config.history_limit);

    storage.delete()?;
    storage.save(&host.snapshot())?;

    let (name, symbol, decimals, supply, digest) = host.read(|l| {
        (
            l.name().to_string(),
            l.symbol().to_string(),
            l.decimals(),
            l.total_supply(),
            l.state_digest(),
        )
    });

    println!("✅ Ledger initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   🪙 Token: {} ({})", name, symbol);
    println!(
        "   💰 Total supply: {} {} (raw {})",
        format_units(supply, decimals),
        symbol,
        supply
    );
    println!("   👤 Creator: {}", creator);
    println!("   🔏 State digest: {}", digest);

    Ok(())
}

/// Display ledger info
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let (name, symbol, decimals, supply, creator, holders, digest) = state.host.read(|l| {
        (
            l.name().to_string(),
            l.symbol().to_string(),
            l.decimals(),
            l.total_supply(),
            l.creator(),
            l.holder_count(),
            l.state_digest(),
        )
    });
    let stats = state.storage.stats()?;

    println!("🪙 Token Info");
    println!("   ├─ Name: {}", name);
    println!("   ├─ Symbol: {}", symbol);
    println!("   ├─ Decimals: {}", decimals);
    println!("   ├─ Total supply: {}", state.display_amount(supply));
    println!("   ├─ Creator: {}", creator);
    println!("   ├─ Holders: {}", holders);
    println!("   ├─ Snapshot size: {} bytes", stats.file_size);
    println!("   ├─ Backups: {}", stats.backup_count);
    println!("   └─ State digest: {}", digest);

    Ok(())
}

/// Show an account balance
pub fn cmd_balance(state: &AppState, account: &str) -> CliResult<()> {
    let account = resolve_account(account)?;
    let balance = state.host.balance_of(&account);

    println!("💰 Balance for {}", account);
    println!("   {} (raw {})", state.display_amount(balance), balance);

    Ok(())
}

/// Show an allowance
pub fn cmd_allowance(state: &AppState, owner: &str, spender: &str) -> CliResult<()> {
    let owner = resolve_account(owner)?;
    let spender = resolve_account(spender)?;
    let allowance = state.host.allowance(&owner, &spender);

    println!("🔓 Allowance");
    println!("   Owner:   {}", owner);
    println!("   Spender: {}", spender);
    println!("   Amount:  {} (raw {})", state.display_amount(allowance), allowance);

    Ok(())
}

/// Direct transfer
pub fn cmd_transfer(state: &mut AppState, from: &str, to: &str, amount: &str) -> CliResult<()> {
    let from = resolve_account(from)?;
    let to = resolve_account(to)?;
    let amount = state.parse_amount(amount)?;

    let record = state.host.transfer(from, to, amount)?;
    state.save()?;

    println!("📤 Transfer committed");
    print_record(state, &record);

    Ok(())
}

/// Set an allowance
pub fn cmd_approve(
    state: &mut AppState,
    owner: &str,
    spender: &str,
    amount: &str,
) -> CliResult<()> {
    let owner = resolve_account(owner)?;
    let spender = resolve_account(spender)?;
    let amount = state.parse_amount(amount)?;

    let record = state.host.approve(owner, spender, amount)?;
    state.save()?;

    println!("🔓 Approval committed");
    print_record(state, &record);

    Ok(())
}

/// Delegated transfer
pub fn cmd_transfer_from(
    state: &mut AppState,
    spender: &str,
    owner: &str,
    to: &str,
    amount: &str,
) -> CliResult<()> {
    let spender = resolve_account(spender)?;
    let owner = resolve_account(owner)?;
    let to = resolve_account(to)?;
    let amount = state.parse_amount(amount)?;

    let record = state.host.transfer_from(spender, owner, to, amount)?;
    state.save()?;

    println!("📤 Delegated transfer committed");
    println!("   Spender: {}", spender);
    print_record(state, &record);
    println!(
        "   Remaining allowance: {}",
        state.display_amount(state.host.allowance(&owner, &spender))
    );

    Ok(())
}

/// List holders, largest balance first
pub fn cmd_holders(state: &AppState) -> CliResult<()> {
    let holders = state.host.read(|ledger| ledger.holders());

    println!("👥 Holders ({}):", holders.len());
    for (account, balance) in holders {
        println!("   {} - {}", account, state.display_amount(balance));
    }

    Ok(())
}

/// Show recent events
pub fn cmd_history(state: &AppState, count: usize) -> CliResult<()> {
    let records = state.host.history(count);

    if records.is_empty() {
        println!("📭 No events recorded yet.");
        return Ok(());
    }

    println!("📜 Recent events:");
    for record in &records {
        println!(
            "   #{} | {} | {}",
            record.sequence,
            record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            describe(state, &record.event)
        );
    }

    Ok(())
}

/// Verify stored invariants
pub fn cmd_verify(state: &AppState) -> CliResult<()> {
    println!("🔍 Verifying ledger...");

    match state.host.read(|ledger| ledger.check_invariants()) {
        Ok(()) => {
            println!("✅ Ledger is consistent!");
            println!(
                "   Balances sum to total supply ({})",
                state.display_amount(state.host.total_supply())
            );
            Ok(())
        }
        Err(e) => {
            println!("❌ Ledger verification FAILED!");
            Err(e.into())
        }
    }
}

/// Export the snapshot to a file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.host.snapshot(), path)?;
    println!("📦 Ledger exported to {:?}", path);
    Ok(())
}

/// Import a snapshot from a file, replacing the stored ledger
pub fn cmd_import(data_dir: &Path, config: &LedgerConfig, path: &Path) -> CliResult<()> {
    let snapshot = match crate::storage::load_from_file(path) {
        Ok(snapshot) => snapshot,
        Err(StorageError::Corrupted(e)) => {
            println!("❌ Imported ledger is invalid: {}", e);
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let storage = Storage::new(config.storage(data_dir.to_path_buf()))?;
    storage.save(&snapshot)?;

    println!("📥 Ledger imported from {:?}", path);
    println!(
        "   {} holders, {} journaled events",
        snapshot.ledger.holder_count(),
        snapshot.journal.len()
    );

    Ok(())
}

/// Print an address, derived from a label or freshly generated
pub fn cmd_account(label: Option<&str>) -> CliResult<()> {
    match label {
        Some(label) => {
            println!("🏷️  Account for label {:?}", label);
            println!("   📍 Address: {}", Address::derive(label));
        }
        None => {
            println!("🆕 Random account");
            println!("   📍 Address: {}", Address::random());
        }
    }
    Ok(())
}

fn describe(state: &AppState, event: &LedgerEvent) -> String {
    match event {
        LedgerEvent::Transfer(e) => format!(
            "Transfer {} → {} : {}",
            e.from.short(),
            e.to.short(),
            state.display_amount(e.value)
        ),
        LedgerEvent::Approval(e) => format!(
            "Approval {} → {} : {}",
            e.owner.short(),
            e.spender.short(),
            state.display_amount(e.value)
        ),
    }
}

fn print_record(state: &AppState, record: &EventRecord) {
    match &record.event {
        LedgerEvent::Transfer(e) => {
            println!("   From:   {}", e.from);
            println!("   To:     {}", e.to);
            println!("   Amount: {}", state.display_amount(e.value));
        }
        LedgerEvent::Approval(e) => {
            println!("   Owner:   {}", e.owner);
            println!("   Spender: {}", e.spender);
            println!("   Amount:  {}", state.display_amount(e.value));
        }
    }
    println!("   Event #{}: {}", record.sequence, record.event.name());
}
