//! SHADOW CLI
//!
//! Command-line wallet for the SHADOW stealth address protocol.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Password};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zeroize::Zeroizing;

use shadow_core::constants::DEFAULT_MNEMONIC_WORDS;
use shadow_core::error::ShadowError;
use shadow_core::traits::{Announcer, VaultStore};
use shadow_core::types::{BlockRange, EncryptedVault, EthAddress, StealthMetaAddress};
use shadow_crypto::validate_mnemonic;
use shadow_registry::{FileAnnouncer, FileVaultStore};
use shadow_scanner::Scanner;
use shadow_stealth::{change_password, create_stealth_payment, create_wallet, import_wallet, ShadowWallet};

use crate::config::CliConfig;

/// SHADOW - Stealth Address Wallet
#[derive(Parser)]
#[command(name = "shadow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Vault file (overrides SHADOW_VAULT_PATH)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Announcement log file (overrides SHADOW_ANNOUNCEMENTS_PATH)
    #[arg(long, global = true)]
    announcements: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet
    Init {
        /// Number of mnemonic words (12, 15, 18, 21 or 24)
        #[arg(short, long, default_value_t = DEFAULT_MNEMONIC_WORDS)]
        words: usize,
    },

    /// Import a wallet from an existing seed phrase
    Import,

    /// Show wallet keys
    Keys {
        /// Also print private keys
        #[arg(long)]
        reveal: bool,
    },

    /// Print the stealth meta-address to share with senders
    MetaAddress,

    /// Create a stealth payment and append its announcement to the log
    Pay {
        /// Recipient's stealth meta-address (hex)
        meta_address: StealthMetaAddress,
        /// Hash of the transaction that funded the stealth address
        #[arg(long)]
        tx_hash: Option<String>,
    },

    /// Scan the announcement log for payments
    Scan {
        /// First block to scan (inclusive)
        #[arg(long)]
        from_block: Option<u64>,
        /// Last block to scan (inclusive)
        #[arg(long)]
        to_block: Option<u64>,
        /// Concurrent scan batches (overrides SHADOW_SCAN_WORKERS)
        #[arg(long)]
        workers: Option<usize>,
        /// Announcements per batch (overrides SHADOW_SCAN_BATCH_SIZE)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Derive the private key of a received stealth address
    SpendKey {
        /// The stealth address
        stealth_address: EthAddress,
    },

    /// Re-encrypt the vault under a new password
    ChangePassword,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::from_env().context("Invalid environment configuration")?;

    if let Some(path) = cli.vault.clone() {
        config.vault_path = path;
    }
    if let Some(path) = cli.announcements.clone() {
        config.announcements_path = path;
    }

    init_logging(cli.verbose, config.log_json);
    tracing::debug!(
        home = %config.home.display(),
        vault = %config.vault_path.display(),
        announcements = %config.announcements_path.display(),
        "Loaded configuration"
    );

    let result = match cli.command {
        Commands::Init { words } => cmd_init(&config, words).await,
        Commands::Import => cmd_import(&config).await,
        Commands::Keys { reveal } => cmd_keys(&config, reveal).await,
        Commands::MetaAddress => cmd_meta_address(&config).await,
        Commands::Pay { meta_address, tx_hash } => cmd_pay(&config, &meta_address, tx_hash).await,
        Commands::Scan {
            from_block,
            to_block,
            workers,
            batch_size,
        } => {
            if let Some(workers) = workers {
                config.scan_workers = workers;
            }
            if let Some(batch_size) = batch_size {
                config.scan_batch_size = batch_size;
            }
            cmd_scan(&config, block_range(from_block, to_block)?).await
        }
        Commands::SpendKey { stealth_address } => cmd_spend_key(&config, stealth_address).await,
        Commands::ChangePassword => cmd_change_password(&config).await,
    };

    if let Err(ref err) = result {
        if let Some(hint) = error_hint(err) {
            eprintln!("{} {}", "hint:".yellow().bold(), hint);
        }
    }
    result
}

/// Suggests a next step for errors the user can act on.
fn error_hint(err: &anyhow::Error) -> Option<&'static str> {
    let err = err.chain().find_map(|e| e.downcast_ref::<ShadowError>())?;

    if err.is_auth_error() {
        Some("check the password or recovery phrase and try again")
    } else if err.is_validation_error() {
        Some("check the address or meta-address for typos")
    } else if err.is_crypto_error() {
        Some("the key material looks corrupt; re-import the wallet from its recovery phrase")
    } else if err.is_recoverable() {
        Some("this may be transient; retrying the command is safe")
    } else {
        None
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        "shadow=debug,info"
    } else {
        "shadow=info,warn"
    };

    // Logs go to stderr so command output can be piped
    let (json_layer, text_layer) = if json {
        (Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn block_range(from_block: Option<u64>, to_block: Option<u64>) -> Result<BlockRange> {
    if let (Some(from), Some(to)) = (from_block, to_block) {
        if from > to {
            bail!("--from-block ({from}) is after --to-block ({to})");
        }
    }
    Ok(BlockRange {
        from_block,
        to_block,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROMPTS
// ═══════════════════════════════════════════════════════════════════════════════

fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    let password = Password::new().with_prompt(prompt).interact()?;
    Ok(Zeroizing::new(password))
}

fn prompt_new_password(prompt: &str) -> Result<Zeroizing<String>> {
    let password = Password::new()
        .with_prompt(prompt)
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;
    Ok(Zeroizing::new(password))
}

/// Asks before replacing an existing vault. Returns false if the user declines.
async fn confirm_overwrite(store: &FileVaultStore) -> Result<bool> {
    if store.load().await?.is_none() {
        return Ok(true);
    }

    println!(
        "{} {}",
        "⚠️  A wallet already exists at".yellow(),
        store.path().display()
    );
    let overwrite = Confirm::new()
        .with_prompt("Replace it? The old seed phrase is the only way to recover it")
        .default(false)
        .interact()?;
    Ok(overwrite)
}

async fn load_vault(store: &FileVaultStore) -> Result<EncryptedVault> {
    match store.load().await.context("Failed to read vault file")? {
        Some(vault) => Ok(vault),
        None => bail!(
            "No wallet found at {}. Run `shadow init` or `shadow import` first.",
            store.path().display()
        ),
    }
}

async fn unlock(config: &CliConfig) -> Result<ShadowWallet> {
    let store = FileVaultStore::new(&config.vault_path);
    let vault = load_vault(&store).await?;
    let password = prompt_password("Password")?;
    ShadowWallet::unlock(&vault, &password).context("Failed to unlock wallet")
}

// ═══════════════════════════════════════════════════════════════════════════════
// WALLET COMMANDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Create a new wallet
async fn cmd_init(config: &CliConfig, words: usize) -> Result<()> {
    let store = FileVaultStore::new(&config.vault_path);
    if !confirm_overwrite(&store).await? {
        return Ok(());
    }

    println!("{}", "🔑 Creating a new SHADOW wallet...".cyan().bold());
    let password = prompt_new_password("New password")?;

    let (phrase, vault) = create_wallet(&password, words).context("Failed to create wallet")?;
    store.save(&vault).await.context("Failed to save vault")?;

    println!("{} {}", "✅ Vault saved to:".green(), store.path().display());
    println!("\n{}", "Seed phrase:".yellow().bold());
    println!("   {}", phrase.as_str());
    println!("\n{}", "⚠️  IMPORTANT: Write this down now. It will not be shown again.".red().bold());
    println!("   Anyone with the seed phrase controls every stealth address of this wallet.");

    Ok(())
}

/// Import a wallet from a seed phrase
async fn cmd_import(config: &CliConfig) -> Result<()> {
    let store = FileVaultStore::new(&config.vault_path);
    if !confirm_overwrite(&store).await? {
        return Ok(());
    }

    let phrase = prompt_password("Seed phrase")?;
    if !validate_mnemonic(&phrase) {
        bail!("Invalid seed phrase: check the words and their order");
    }
    let password = prompt_new_password("New password")?;

    let vault = import_wallet(&phrase, &password).context("Failed to import wallet")?;
    store.save(&vault).await.context("Failed to save vault")?;

    let wallet = ShadowWallet::unlock(&vault, &password)?;
    println!("{}", "✅ Wallet imported".green().bold());
    println!("   {} {}", "Address:".dimmed(), wallet.master_address());
    println!("   {} {}", "Vault:".dimmed(), store.path().display());

    Ok(())
}

/// Show wallet keys
async fn cmd_keys(config: &CliConfig, reveal: bool) -> Result<()> {
    let wallet = unlock(config).await?;

    let rows = [
        ("Master", wallet.master()),
        ("Spending", wallet.spending()),
        ("Viewing", wallet.viewing()),
    ];

    for (label, pair) in rows {
        println!("\n{}", format!("{label} key").yellow().bold());
        println!("   {} {}", "Address:".dimmed(), pair.address);
        println!("   {} 0x{}", "Public key:".dimmed(), pair.public_key.to_hex());
        if reveal {
            println!("   {} 0x{}", "Private key:".red(), pair.private_key.to_hex());
        }
    }

    if reveal {
        println!("\n{}", "⚠️  Private keys shown above. Clear your terminal.".red().bold());
    }

    Ok(())
}

/// Print the stealth meta-address
async fn cmd_meta_address(config: &CliConfig) -> Result<()> {
    let wallet = unlock(config).await?;
    println!("{}", wallet.meta_address());
    Ok(())
}

/// Re-encrypt the vault
async fn cmd_change_password(config: &CliConfig) -> Result<()> {
    let store = FileVaultStore::new(&config.vault_path);
    let vault = load_vault(&store).await?;

    let old_password = prompt_password("Current password")?;
    let new_password = prompt_new_password("New password")?;

    let resealed = change_password(&vault, &old_password, &new_password)
        .context("Failed to change password")?;
    store.save(&resealed).await.context("Failed to save vault")?;

    println!("{}", "✅ Password changed".green().bold());
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAYMENT COMMANDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Create a stealth payment
async fn cmd_pay(config: &CliConfig, meta: &StealthMetaAddress, tx_hash: Option<String>) -> Result<()> {
    println!("{}", "💸 Creating stealth payment...".cyan().bold());

    let mut payment = create_stealth_payment(meta).context("Failed to create stealth payment")?;
    payment.announcement.transaction_hash = tx_hash;

    let announcer = FileAnnouncer::open(&config.announcements_path)
        .await
        .context("Failed to open announcement log")?;
    let id = announcer
        .announce(payment.announcement.clone())
        .await
        .context("Failed to record announcement")?;

    println!("\n{}", "✅ Stealth payment created:".green().bold());
    println!("   {} {}", "Address:".yellow(), payment.stealth_address);
    println!("   {} {}", "View tag:".dimmed(), payment.view_tag);
    println!("   {} 0x{}", "Ephemeral key:".dimmed(), payment.ephemeral_public_key.to_hex());
    println!("   {} #{}", "Announcement:".dimmed(), id);

    println!("\n{}", "📋 Announcement (JSON):".yellow().bold());
    println!("{}", serde_json::to_string_pretty(&payment.announcement)?);

    if payment.announcement.transaction_hash.is_none() {
        println!("\n{}", "ℹ️  Next step:".cyan());
        println!("   Send funds to the stealth address above.");
    }

    Ok(())
}

/// Scan for payments
async fn cmd_scan(config: &CliConfig, range: BlockRange) -> Result<()> {
    let wallet = unlock(config).await?;
    let scanner = Scanner::from_wallet(&wallet, config.scanner_config());
    drop(wallet);

    let announcer = FileAnnouncer::open(&config.announcements_path)
        .await
        .context("Failed to open announcement log")?;
    let announcements = announcer.announcements(range).await?;

    if announcements.is_empty() {
        println!("{}", "⚠️  No announcements in range. Nothing to scan.".yellow());
        return Ok(());
    }

    println!(
        "{} {} announcements",
        "🔎 Scanning".cyan().bold(),
        announcements.len()
    );

    let pb = ProgressBar::new(announcements.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let bar = pb.clone();
    let owned = scanner
        .scan_with_batch_progress(
            &announcements,
            Box::new(move |progress| {
                bar.set_position(progress.scanned);
                bar.set_message(format!("{} found", progress.discoveries));
            }),
        )
        .await?;
    pb.finish_and_clear();

    if owned.is_empty() {
        println!("{}", "No payments found.".yellow());
    } else {
        println!("\n{} {} payment(s) found:", "✅".green(), owned.len());
        for found in &owned {
            println!("   {} {}", "Address:".green(), found.stealth_address);
            match found.announcement.block_number {
                Some(block) => println!("      Announcement #{} (block {})", found.announcement.id, block),
                None => println!("      Announcement #{}", found.announcement.id),
            }
        }
    }

    let summary = scanner.summary();
    println!(
        "\n   {} {} scanned in {} ms ({:.0}/s), {:.1}% filtered by view tag, {} malformed, {} unsupported",
        "Stats:".dimmed(),
        summary.total_scanned,
        summary.duration_ms,
        summary.rate,
        summary.filter_efficiency,
        summary.malformed,
        summary.unsupported_scheme
    );

    Ok(())
}

/// Derive the private key for a received stealth address
async fn cmd_spend_key(config: &CliConfig, stealth_address: EthAddress) -> Result<()> {
    let wallet = unlock(config).await?;
    let scanner = Scanner::from_wallet(&wallet, config.scanner_config());

    let announcer = FileAnnouncer::open(&config.announcements_path)
        .await
        .context("Failed to open announcement log")?;
    let announcements = announcer.announcements(BlockRange::all()).await?;

    let candidates = announcements
        .iter()
        .filter(|announcement| announcement.stealth_address == stealth_address);
    let Some(owned) = scanner.scan_iter(candidates).next() else {
        bail!("No announcement for {stealth_address} belongs to this wallet");
    };

    let key_pair = wallet
        .stealth_key_pair(&owned)
        .context("Failed to derive stealth private key")?;

    println!("{}", "🔓 Stealth key recovered".green().bold());
    println!("   {} {}", "Address:".dimmed(), key_pair.address);
    println!("   {} 0x{}", "Private key:".red(), key_pair.private_key.to_hex());
    println!("\n{}", "⚠️  Import this key only into a wallet you trust.".red().bold());

    Ok(())
}
