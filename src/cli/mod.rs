//! mlstep CLI Module
//!
//! Runs the HTTP gateway or drives the whole pipeline offline on a file.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::pipeline::Pipeline;
use crate::server::{run_server, ServerConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    for line in text.lines() {
        println!("    {}", dim(line));
    }
    Ok(())
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "mlstep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Stepwise tabular ML pipeline: load, target, preprocess, split, train")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind address (defaults to API_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port (defaults to API_PORT or 8000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run every stage on a local file and print each summary
    Run {
        /// Input data file (.csv, .xls or .xlsx)
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name
        #[arg(short, long)]
        target: String,

        /// Preprocessing strategy (standardization, normalization); skipped if absent
        #[arg(long)]
        preprocess: Option<String>,

        /// Fraction of rows used for training
        #[arg(short, long, default_value = "0.8")]
        ratio: f64,

        /// Model type (logistic_regression, decision_tree)
        #[arg(short, long, default_value = "decision_tree")]
        model: String,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let defaults = ServerConfig::default();
    let config = ServerConfig {
        host: host.unwrap_or(defaults.host.clone()),
        port: port.unwrap_or(defaults.port),
        ..defaults
    };

    println!();
    println!("  {}  {}", "mlstep".white().bold(), dim(&format!("v{}", env!("CARGO_PKG_VERSION"))));
    println!("  {}", kv("API    ", &format!("http://{}:{}", config.host, config.port)));
    println!("  {}", kv("Health ", &format!("http://{}:{}/health", config.host, config.port)));
    println!("  {}", dim("ctrl+c to stop"));
    println!();

    run_server(config).await
}

pub fn cmd_run(
    data_path: &Path,
    target: &str,
    preprocess: Option<&str>,
    ratio: f64,
    model: &str,
) -> anyhow::Result<()> {
    let file_name = data_path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid data path: {}", data_path.display()))?;
    let bytes = std::fs::read(data_path)
        .with_context(|| format!("failed to read {}", data_path.display()))?;

    let mut pipeline = Pipeline::new();

    section("Load");
    step_run(&format!("Reading {}", file_name.cyan()));
    let start = Instant::now();
    let loaded = pipeline.load(&bytes, file_name)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        loaded.row_count,
        loaded.column_count,
        start.elapsed()
    ));
    print_json(&loaded)?;

    section("Target");
    print_json(&pipeline.select_target(target)?)?;

    if let Some(strategy) = preprocess {
        section("Preprocess");
        step_run(&format!("Applying {}", strategy.cyan()));
        let start = Instant::now();
        let summary = pipeline.preprocess(strategy)?;
        step_done(&format!("{:?}", start.elapsed()));
        print_json(&summary)?;
    }

    section("Split");
    print_json(&pipeline.split(ratio)?)?;

    section("Train");
    step_run(&format!("Training {}", model.cyan()));
    let start = Instant::now();
    let trained = pipeline.train(model)?;
    step_done(&format!("{:?}", start.elapsed()));
    print_json(&trained)?;

    println!();
    println!("  {:<16} {}", muted("Test accuracy"), format!("{:.4}", trained.accuracy).white().bold());
    println!("  {:<16} {}", muted("Train accuracy"), format!("{:.4}", trained.train_accuracy).white());
    println!();

    Ok(())
}
