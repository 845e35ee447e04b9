//! Thin CLI collaborator around the calculator core.
//!
//! Maps terminal input to logical tokens, renders the display value, and
//! drives the offline cache lifecycle from the configured manifest. All
//! product behavior lives in the library.

use anyhow::Context;
use clap::{Parser, Subcommand};
use qcalc::Calculator;
use qcalc::cache::{CacheManifest, DirSource, OfflineCache};
use qcalc::config::Config;
use qcalc::haptics::LogHaptics;
use qcalc::history::HistoryStore;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qcalc", about = "Offline-first calculator with persisted history")]
struct Cli {
    /// Alternative config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the persisted history, newest first.
    History,
    /// Remove the persisted history.
    ClearHistory,
    /// Offline cache lifecycle.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Fetch and store all manifest assets under the current generation.
    Install,
    /// Remove every generation except the current one.
    Activate,
    /// List installed generations.
    Status,
    /// Serve one asset cache-first and write it to stdout.
    Serve { path: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        None => repl(&config),
        Some(Command::History) => {
            let store = history_store(&config)?;
            for entry in store.load_all() {
                println!("{} = {}", entry.expression, entry.result);
            }
            Ok(())
        }
        Some(Command::ClearHistory) => {
            history_store(&config)?.clear()?;
            Ok(())
        }
        Some(Command::Cache { command }) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to build async runtime")?;
            runtime.block_on(run_cache_command(&config, command))
        }
    }
}

fn history_store(config: &Config) -> anyhow::Result<HistoryStore> {
    let path = config
        .history_path
        .clone()
        .or_else(HistoryStore::default_path)
        .context("no usable history location on this platform")?;
    Ok(HistoryStore::new(path))
}

fn offline_cache(config: &Config) -> anyhow::Result<OfflineCache> {
    let root = config
        .cache
        .root
        .clone()
        .or_else(OfflineCache::default_root)
        .context("no usable cache location on this platform")?;
    Ok(OfflineCache::new(root))
}

fn asset_source(config: &Config) -> anyhow::Result<DirSource> {
    let origin = config
        .cache
        .origin
        .clone()
        .context("cache.origin is not configured")?;
    Ok(DirSource::new(origin))
}

async fn run_cache_command(config: &Config, command: CacheCommand) -> anyhow::Result<()> {
    let cache = offline_cache(config)?;
    let manifest: CacheManifest = config.cache_manifest();

    match command {
        CacheCommand::Install => {
            let source = asset_source(config)?;
            cache.install(&manifest, &source).await?;
            println!("installed generation {}", manifest.version);
        }
        CacheCommand::Activate => {
            cache.activate(&manifest.version)?;
            println!("active generation: {}", manifest.version);
        }
        CacheCommand::Status => {
            for generation in cache.generations()? {
                let marker = if generation == manifest.version { "*" } else { " " };
                println!("{marker} {generation}");
            }
        }
        CacheCommand::Serve { path } => {
            let source = asset_source(config)?;
            let body = cache.serve(&path, &source).await?;
            std::io::stdout().write_all(&body)?;
        }
    }
    Ok(())
}

/// Interactive loop: each character of a line is one logical token, so
/// typing `1+1=` evaluates. `C` and `Backspace` work spelled out, and a few
/// colon commands expose the history surface.
fn repl(config: &Config) -> anyhow::Result<()> {
    let store = history_store(config)?;
    let mut calc = Calculator::with_haptics(store, LogHaptics, config.haptic_strength);

    println!("{}", calc.display());
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        match input {
            "" => continue,
            ":quit" | ":q" => break,
            ":history" => {
                for entry in calc.history() {
                    println!("{} = {}", entry.expression, entry.result);
                }
                continue;
            }
            ":clear-history" => {
                calc.clear_history()?;
                continue;
            }
            "C" | "Backspace" => {
                println!("{}", calc.handle_input(input));
                continue;
            }
            _ => {}
        }
        let mut display = calc.display();
        for c in input.chars() {
            display = calc.handle_input(&c.to_string());
        }
        println!("{display}");
    }
    Ok(())
}
