mod browser;
mod config;
mod error;
mod output;
mod parser;
mod portal;
mod prompt;

use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Color;
use tracing::{info, warn};

use crate::browser::Page;
use crate::config::{Backend, Settings};
use crate::output::Presentation;
use crate::parser::classify::classify;
use crate::parser::extract::ExtractOptions;
use crate::portal::SearchOutcome;

#[derive(Parser)]
#[command(
    name = "transparency_lookup",
    about = "Look up people on the Portal da Transparência"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Browser backend (default from config: chrome)
    #[arg(long, global = true, value_enum)]
    backend: Option<Backend>,

    /// Seconds to wait for page elements
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show the Chrome window
    #[arg(long, global = true)]
    headful: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, pick a result, and show the disclosed profile
    Lookup {
        /// CPF or name (prompted when omitted)
        term: Option<String>,
        /// 1-based result to open (prompted when omitted)
        #[arg(short, long)]
        pick: Option<String>,
    },
    /// List search results only
    Search {
        /// CPF or name
        term: String,
    },
    /// Show which extraction strategy a status label selects
    Classify {
        /// Status text as shown in the search results
        label: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let settings = match load_settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };
    let out = Presentation::new(&settings, cli.json);

    let raw_term = match &cli.command {
        Commands::Classify { label } => {
            out.strategy(label, classify(label));
            return ExitCode::SUCCESS;
        }
        Commands::Search { term } => Ok(term.clone()),
        Commands::Lookup { term: Some(term), .. } => Ok(term.clone()),
        Commands::Lookup { term: None, .. } => prompt::ask("Enter CPF or name to search: "),
    };
    let term = match raw_term.map(|t| prompt::validate_term(&t)) {
        Ok(Ok(term)) => term,
        Ok(Err(e)) => {
            out.error(&e.to_string());
            return ExitCode::FAILURE;
        }
        Err(e) => {
            out.error(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    let mut page = match browser::open(&settings).await {
        Ok(page) => page,
        Err(e) => {
            out.error(&format!("An unexpected error occurred: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let code = session(page.as_mut(), &cli.command, &term, &settings, &out).await;
    info!("Done in {}", format_duration(t0.elapsed()));
    code
}

/// Run the interaction on an open page and close it whatever the outcome.
async fn session(
    page: &mut dyn Page,
    command: &Commands,
    term: &str,
    settings: &Settings,
    out: &Presentation,
) -> ExitCode {
    let result = run(page, command, term, settings, out).await;

    if let Err(e) = page.close().await {
        warn!("Browser shutdown: {}", e);
    }

    match result {
        Ok(code) => code,
        Err(e) => {
            out.error(&format!("An unexpected error occurred: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load()?;
    if let Some(backend) = cli.backend {
        settings.backend = backend;
    }
    if let Some(secs) = cli.timeout {
        settings.timeout_secs = secs;
    }
    if cli.headful {
        settings.headless = false;
    }
    if cli.no_color {
        settings.color = false;
    }
    Ok(settings)
}

/// Search → choose → extract → render. The caller owns the browser and closes it.
async fn run(
    page: &mut dyn Page,
    command: &Commands,
    term: &str,
    settings: &Settings,
    out: &Presentation,
) -> Result<ExitCode> {
    let base = settings.base()?;

    let spinner = out.spinner("Searching the portal...");
    let outcome = portal::search(page, term, &base, settings.timeout()).await;
    spinner.finish_and_clear();

    let candidates = match outcome.context("Search failed")? {
        SearchOutcome::Candidates(c) => c,
        SearchOutcome::NoResults => {
            out.warn("No results found for the entered term.");
            return Ok(ExitCode::SUCCESS);
        }
        SearchOutcome::TimedOut { waited } => {
            out.error(&format!(
                "No results found on the search page (gave up after {:.0}s).",
                waited.as_secs_f64()
            ));
            return Ok(ExitCode::FAILURE);
        }
    };

    out.candidates(&candidates);

    let Commands::Lookup { pick, .. } = command else {
        return Ok(ExitCode::SUCCESS);
    };
    let raw = match pick {
        Some(p) => p.clone(),
        None => prompt::ask("\nEnter the number of the result you want to open: ")?,
    };
    let index = match prompt::parse_selection(&raw, candidates.len()) {
        Ok(i) => i,
        Err(e) => {
            out.error(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    let chosen = &candidates[index];
    out.message(&format!("\nOpening the page of {}...", chosen.name), Color::Yellow);

    let opts = ExtractOptions {
        base,
        timeout: settings.timeout(),
    };
    let spinner = out.spinner("Reading profile...");
    let extraction = portal::open_candidate(page, chosen, &opts).await;
    spinner.finish_and_clear();
    let extraction = extraction.with_context(|| format!("Failed to open {}", chosen.detail_url))?;

    out.extraction(&extraction);
    Ok(ExitCode::SUCCESS)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
