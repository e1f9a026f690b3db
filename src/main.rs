extern crate anyhow;

use anyhow::Context as _;
use clap::Parser;
use std::path::PathBuf;
use tirepl::{Context, Evaluator, IOReader, Options, Outcome, PromptReader, Session, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Interactive evaluation session.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Prompt shown before each new chunk.
    #[arg(long, default_value = "> ")]
    prompt: String,

    /// Print promise-like results as they are instead of waiting for them.
    #[arg(long)]
    no_async: bool,

    /// Report unfinished input as an error instead of reading more lines.
    #[arg(long)]
    no_recover: bool,

    /// Load and save line history at this path.
    #[arg(long, value_name = "PATH")]
    history: Option<PathBuf>,

    /// Syntax error messages matching this regex ask for more input.
    #[arg(long, value_name = "REGEX")]
    recover_pattern: Option<String>,

    /// Bind NAME to the value of LITERAL before the first prompt.
    #[arg(long, value_name = "NAME=LITERAL", value_parser = parse_binding)]
    expose: Vec<(String, String)>,

    /// Read chunks from this file instead of prompting.
    script: Option<PathBuf>,
}

fn parse_binding(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, literal)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), literal.to_string()))
        }
        _ => Err(format!("expected NAME=LITERAL, got `{}`", s)),
    }
}

fn literal(source: &str) -> anyhow::Result<Value> {
    let evaluator = Evaluator::new()
        .with_eval_async(false)
        .with_recover_errors(false);
    match evaluator.evaluate_now(source, &mut Context::new(), "expose") {
        Some(Outcome::Value(value)) => Ok(value),
        Some(Outcome::Error(e)) => anyhow::bail!("Failed to evaluate `{}`: {}", source, e),
        _ => anyhow::bail!("`{}` did not produce a value.", source),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut options = Options::new()
        .with_prompt(cli.prompt)
        .with_eval_async(!cli.no_async)
        .with_recover_errors(!cli.no_recover);
    if let Some(path) = cli.history {
        options = options.with_history(path);
    }
    if let Some(pattern) = &cli.recover_pattern {
        options = options
            .with_recover_pattern(pattern)
            .context("Invalid --recover-pattern.")?;
    }
    for (name, source) in &cli.expose {
        options = options.expose(name.as_str(), literal(source)?);
    }

    match cli.script {
        Some(path) => Session::new(IOReader::new_file(path)?, options)?.all(),
        None => Session::new(PromptReader::new(), options)?.all(),
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse()).unwrap_or_else(|e| {
        eprintln!("{:#}", e);
        std::process::exit(1);
    })
}
