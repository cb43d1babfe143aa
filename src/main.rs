//! CLI entry point for sto-keybind-manager
//!
//! Provides command-line interface for checking keybind files,
//! previewing chains, exporting with backups and auditing
//! message catalogs.

use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sto_keybind_manager::core::{
    build_preview, import_file, ChainTokenParser, Command, CommandRegistry, StaticRegistry,
};
use sto_keybind_manager::export::{validate_profile, ExportManager, ExportTransaction};
use sto_keybind_manager::i18n::{
    apply_updates, duplicate_keys, extra_keys, missing_keys, prune_extra_keys, render_issue,
    unknown_update_keys, untranslated_builtin_keys, JsonCatalog, MessageCatalog,
};
use sto_keybind_manager::validation::{
    Issue, RuleSettings, Severity, ValidationContext, ValidationEngine, ValidationResult,
};

#[derive(Parser)]
#[command(name = "sto-keybind-manager")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command metadata registry (TOML)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Rule thresholds and unsafe keys (TOML)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Message catalog used to render issues (JSON)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a keybind file
    Check {
        /// Path to keybind file
        file: PathBuf,
    },

    /// List all keybinds and aliases
    List {
        /// Path to keybind file
        file: PathBuf,
    },

    /// Show the exact line a chain would export as
    Preview {
        /// Key name (e.g. F1, Alt+Q)
        #[arg(short, long)]
        key: String,

        /// Mirror the chain for stable execution order
        #[arg(short, long)]
        stabilize: bool,

        /// Commands in execution order
        #[arg(required = true)]
        commands: Vec<String>,
    },

    /// Re-render a keybind file in canonical form
    Export {
        /// Keybind file to read
        input: PathBuf,

        /// Destination (backed up first if it exists)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Compare translation catalogs against a reference
    CatalogDiff {
        /// Reference catalog (usually en.json)
        reference: PathBuf,

        /// Catalogs to audit
        #[arg(required = true)]
        others: Vec<PathBuf>,

        /// Remove keys the reference does not have and save the catalogs
        #[arg(long)]
        prune: bool,
    },

    /// Merge new or changed messages into sibling catalogs
    CatalogUpdate {
        /// Reference catalog (usually en.json)
        reference: PathBuf,

        /// JSON object mapping language code to updates,
        /// e.g. {"de": {"ui.title": "Tastenbelegung"}}
        updates: PathBuf,
    },
}

/// Shared state built from the global flags
struct Context {
    parser: ChainTokenParser,
    engine: ValidationEngine,
    catalog: Option<JsonCatalog>,
}

impl Context {
    fn catalog(&self) -> Option<&dyn MessageCatalog> {
        self.catalog.as_ref().map(|c| c as &dyn MessageCatalog)
    }
}

fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::CatalogDiff {
            reference,
            others,
            prune,
        } => return catalog_diff(reference, others, *prune),
        Commands::CatalogUpdate { reference, updates } => {
            return catalog_update(reference, updates)
        }
        _ => {}
    }

    let ctx = build_context(&cli)?;

    match cli.command {
        Commands::Check { file } => check_file(&file, &ctx)?,
        Commands::List { file } => list_keybinds(&file, &ctx)?,
        Commands::Preview {
            key,
            stabilize,
            commands,
        } => preview_chain(&key, stabilize, &commands, &ctx),
        Commands::Export { input, output } => export_file(&input, &output, &ctx)?,
        Commands::CatalogDiff { .. } | Commands::CatalogUpdate { .. } => {}
    }

    Ok(())
}

/// Expand tilde in path
fn expand(path: &Path) -> anyhow::Result<PathBuf> {
    let expanded = shellexpand::tilde(
        path.to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding"))?,
    );
    Ok(PathBuf::from(expanded.as_ref()))
}

fn build_context(cli: &Cli) -> anyhow::Result<Context> {
    let registry: Arc<dyn CommandRegistry> = match &cli.registry {
        Some(path) => Arc::new(StaticRegistry::load(&expand(path)?)?),
        None => Arc::new(StaticRegistry::new()),
    };

    let settings = match &cli.settings {
        Some(path) => RuleSettings::load(&expand(path)?)?,
        None => RuleSettings::default(),
    };

    let catalog = match &cli.catalog {
        Some(path) => Some(JsonCatalog::load(&expand(path)?)?),
        None => None,
    };

    Ok(Context {
        parser: ChainTokenParser::with_registry(Arc::clone(&registry)),
        engine: ValidationEngine::with_default_rules(registry, &settings),
        catalog,
    })
}

fn read_file(path: &Path) -> anyhow::Result<(PathBuf, String)> {
    let path = expand(path)?;
    let content =
        fs::read_to_string(&path).map_err(|e| anyhow::anyhow!("Failed to read file: {}", e))?;
    Ok((path, content))
}

fn print_issue(issue: &Issue, ctx: &Context) {
    let marker = match issue.severity {
        Severity::Error => "✗".red().bold(),
        Severity::Warning => "⚠".yellow().bold(),
    };
    println!(
        "  {} {} {}",
        marker,
        render_issue(issue, ctx.catalog()),
        format!("[{}]", issue.rule_id).dimmed()
    );
}

fn print_result(name: &str, result: &ValidationResult, ctx: &Context) {
    if result.is_success() {
        return;
    }
    println!("{}", name.cyan().bold());
    for issue in result.issues() {
        print_issue(issue, ctx);
    }
    println!();
}

/// Parse and validate every chain in a keybind file
fn check_file(file: &Path, ctx: &Context) -> anyhow::Result<()> {
    let (path, content) = read_file(file)?;
    println!("{} Parsing keybind file: {}", "→".cyan(), path.display());

    let profile = import_file(&content, &ctx.parser);
    println!(
        "{} Found {} keybinds and {} aliases\n",
        "✓".green(),
        profile.keybinds.len(),
        profile.aliases.len()
    );

    for error in &profile.errors {
        println!("{} {}", "✗".red().bold(), error);
    }
    if !profile.errors.is_empty() {
        println!();
    }

    let results = validate_profile(&profile.keybinds, &profile.aliases, &ctx.engine, &ctx.parser);
    for (name, result) in &results {
        print_result(name, result, ctx);
    }

    let error_count = results.iter().filter(|(_, r)| r.has_errors()).count();
    let warning_count: usize = results.iter().map(|(_, r)| r.warnings.len()).sum();

    if error_count == 0 && profile.errors.is_empty() {
        if warning_count == 0 {
            println!("{} {}", "✓".green().bold(), "All chains are valid!".bold());
        } else {
            println!(
                "{} {} warning{} (export allowed)",
                "⚠".yellow().bold(),
                warning_count,
                if warning_count == 1 { "" } else { "s" }
            );
        }
        return Ok(());
    }

    println!(
        "{} {} parse error{}, {} chain{} with errors",
        "✗".red().bold(),
        profile.errors.len(),
        if profile.errors.len() == 1 { "" } else { "s" },
        error_count,
        if error_count == 1 { "" } else { "s" }
    );
    std::process::exit(1);
}

/// List all keybinds and aliases in the file
fn list_keybinds(file: &Path, ctx: &Context) -> anyhow::Result<()> {
    let (path, content) = read_file(file)?;
    let profile = import_file(&content, &ctx.parser);

    println!("{}", format!("Keybinds from: {}\n", path.display()).bold());

    for binding in &profile.keybinds {
        let chain: Vec<&str> = binding.commands.iter().map(|c| c.raw.as_str()).collect();
        let stabilized = if binding.stabilize {
            " (stabilized)".magenta().to_string()
        } else {
            String::new()
        };
        println!(
            "{} → {}{}",
            binding.key.cyan().bold(),
            chain.join(" $$ ").green(),
            stabilized
        );
    }

    if !profile.aliases.is_empty() {
        println!("\n{}", "Aliases:".bold());
        for alias in &profile.aliases {
            let body = match alias.to_chain(&ctx.parser) {
                Ok(chain) => chain
                    .iter()
                    .map(|c| c.raw.as_str())
                    .collect::<Vec<_>>()
                    .join(" $$ "),
                Err(e) => format!("<{}>", e),
            };
            println!("{} → {}", alias.name.cyan().bold(), body);
        }
    }

    println!(
        "\n{} {} keybinds, {} aliases",
        "Total:".bold(),
        profile.keybinds.len(),
        profile.aliases.len()
    );

    Ok(())
}

/// Print the exported line for a chain plus its validation result
fn preview_chain(key: &str, stabilize: bool, commands: &[String], ctx: &Context) {
    let commands: Vec<Command> = commands.iter().map(Command::new).collect();
    let preview = build_preview(key, &commands, stabilize, &ctx.parser);

    println!("{}", preview.line);
    println!("{} {} characters", "→".cyan(), preview.length);

    let context = ValidationContext::for_keybind(key, &commands, stabilize, &ctx.parser);
    let result = ctx.engine.validate(&context);
    for issue in result.issues() {
        print_issue(issue, ctx);
    }

    if result.has_errors() {
        std::process::exit(1);
    }
}

/// Re-render a keybind file through a validated export transaction
fn export_file(input: &Path, output: &Path, ctx: &Context) -> anyhow::Result<()> {
    let (_, content) = read_file(input)?;
    let profile = import_file(&content, &ctx.parser);

    for error in &profile.errors {
        println!("{} {} (line dropped)", "⚠".yellow().bold(), error);
    }

    let manager = ExportManager::new(expand(output)?)?;
    let tx = ExportTransaction::begin(&manager)?;
    if let Some(backup) = tx.backup_path() {
        println!("{} Backup: {}", "→".cyan(), backup.display());
    }

    match tx.commit_with_validation(&profile.keybinds, &profile.aliases, &ctx.engine, &ctx.parser)
    {
        Ok(warnings) => {
            for issue in &warnings {
                print_issue(issue, ctx);
            }
            println!(
                "{} Exported to {}",
                "✓".green().bold(),
                manager.target_path().display()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red().bold(), e);
            println!("This keybind file will NOT be written.");
            std::process::exit(1);
        }
    }
}

/// Report missing, extra and duplicate keys per catalog
fn catalog_diff(reference: &Path, others: &[PathBuf], prune: bool) -> anyhow::Result<()> {
    let reference_path = expand(reference)?;
    let reference = JsonCatalog::load(&reference_path)?;
    let mut missing_total = 0;

    println!("{} Reference: {}", "→".cyan(), reference_path.display());

    for key in untranslated_builtin_keys(&reference) {
        println!("  {} built-in key not in reference: {}", "⚠".yellow(), key);
    }
    for group in duplicate_keys(&reference) {
        println!("  {} duplicate keys: {}", "⚠".yellow(), group.join(", "));
    }

    for other_path in others {
        let other_path = expand(other_path)?;
        let mut other = JsonCatalog::load(&other_path)?;
        let missing = missing_keys(&reference, &other);
        let extra = extra_keys(&reference, &other);
        missing_total += missing.len();

        println!("\n{}", other_path.display().to_string().bold());

        if missing.is_empty() && extra.is_empty() {
            println!("  {} in sync", "✓".green());
            continue;
        }
        for key in &missing {
            println!("  {} missing: {}", "✗".red(), key);
        }
        for key in &extra {
            println!("  {} extra: {}", "⚠".yellow(), key.dimmed());
        }

        if prune && !extra.is_empty() {
            let removed = prune_extra_keys(&reference, &mut other);
            other.save(&other_path)?;
            println!("  {} pruned {} key(s)", "✓".green(), removed.len());
        }
    }

    if missing_total > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Apply a per-language update batch to the catalogs next to `reference`
///
/// Nothing is written if any update key has no place in the reference.
fn catalog_update(reference: &Path, updates: &Path) -> anyhow::Result<()> {
    let reference_path = expand(reference)?;
    let reference = JsonCatalog::load(&reference_path)?;
    let (_, content) = read_file(updates)?;
    let batch: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid update file: {}", e))?;

    let mut languages = Vec::new();
    let mut rejected = Vec::new();
    for (lang, lang_updates) in &batch {
        let Some(lang_updates) = lang_updates.as_object() else {
            rejected.push(format!("{}: updates must be an object", lang));
            continue;
        };
        for key in unknown_update_keys(&reference, lang_updates) {
            rejected.push(format!("{}: {} is not in the reference catalog", lang, key));
        }
        languages.push((lang, lang_updates));
    }

    if !rejected.is_empty() {
        for reason in &rejected {
            println!("{} {}", "✗".red().bold(), reason);
        }
        println!("No catalogs were changed.");
        std::process::exit(1);
    }

    let dir = reference_path.parent().unwrap_or_else(|| Path::new("."));
    for (lang, lang_updates) in languages {
        let path = dir.join(format!("{}.json", lang));
        let mut catalog = JsonCatalog::load(&path)?;
        let report = apply_updates(&mut catalog, lang_updates);
        catalog.save(&path)?;

        println!("{} {}", "→".cyan(), path.display().to_string().bold());
        for key in &report.added {
            println!("  {} added: {}", "✓".green(), key);
        }
        for key in &report.updated {
            println!("  {} updated: {}", "✓".green(), key);
        }
        if report.is_empty() {
            println!("  {} no changes", "✓".green());
        }
    }

    Ok(())
}
