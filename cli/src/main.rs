//! Caravel CLI - binary entry point.
//!
//! Without arguments, serves LSP on stdio (the editor integration).
//! `caravel check [path]` runs a single aggregation pass and prints the
//! result to the terminal, exiting non-zero when errors were found.
//!
//! Logging goes to a file, never to stdout/stderr: stdout carries LSP
//! frames and must stay clean.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use std::{env, process};

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use caravel_engine::Engine;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    if let Some((path, file)) = open_log_file() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();
        tracing::info!(path = %path.display(), "logging initialized");
        return;
    }

    // No usable log file: prefer silence over corrupting the LSP stream.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> Option<(PathBuf, fs::File)> {
    let dir = caravel_engine::config_path()?.parent()?.join("logs");
    fs::create_dir_all(&dir).ok()?;
    let path = dir.join("caravel.log");
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;
    Some((path, file))
}

fn usage() -> &'static str {
    "usage: caravel            serve LSP on stdio\n       caravel check [path]  run one check pass and print diagnostics"
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => serve().await,
        Some("check") => check(args.get(1).map(PathBuf::from)).await,
        Some("--help" | "-h") => {
            println!("{}", usage());
            Ok(())
        }
        Some(other) => {
            eprintln!("unknown argument `{other}`\n{}", usage());
            process::exit(2);
        }
    }
}

async fn serve() -> Result<()> {
    let config = caravel_engine::load_config()?;
    let engine = Engine::new(config)?;
    caravel_lsp::run_stdio(engine).await
}

async fn check(path: Option<PathBuf>) -> Result<()> {
    let root = match path {
        Some(path) => path,
        None => env::current_dir().context("resolving current directory")?,
    };
    let config = caravel_engine::load_config()?;
    let engine = Engine::new(config)?;

    let set = engine.check_pass(&root).await?;
    for (path, items) in set.files() {
        for diagnostic in items {
            println!("{}", diagnostic.display_with_path(path));
        }
    }
    println!(
        "{} diagnostics in {} files ({} errors, {} warnings)",
        set.total_count(),
        set.file_count(),
        set.error_count(),
        set.warning_count(),
    );
    if set.error_count() > 0 {
        process::exit(1);
    }
    Ok(())
}
