use std::time::Duration;

use colored::{Color, Colorize};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::config::Settings;
use crate::parser::classify::Strategy;
use crate::parser::extract::{Extraction, FactSheet, Notice, Outcome};
use crate::parser::results::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Console rendering. Everything it needs is passed in; nothing is read from globals.
#[derive(Debug, Clone, Copy)]
pub struct Presentation {
    pub color: bool,
    pub format: OutputFormat,
}

impl Presentation {
    pub fn new(settings: &Settings, json: bool) -> Self {
        Self {
            color: settings.color,
            format: if json { OutputFormat::Json } else { OutputFormat::Table },
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    /// Status text. Goes to stderr in JSON mode so stdout stays parseable.
    pub fn message(&self, text: &str, color: Color) {
        let line = self.paint(text, color);
        match self.format {
            OutputFormat::Table => println!("{}", line),
            OutputFormat::Json => eprintln!("{}", line),
        }
    }

    pub fn warn(&self, text: &str) {
        self.message(text, Color::Yellow);
    }

    pub fn error(&self, text: &str) {
        eprintln!("{}", self.paint(text, Color::Red));
    }

    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.format == OutputFormat::Json {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn candidates(&self, candidates: &[Candidate]) {
        match self.format {
            OutputFormat::Table => {
                println!("\n{}", self.paint("Results found:", Color::Green));
                println!("{}", candidates_table(candidates));
            }
            OutputFormat::Json => print_json(&candidates),
        }
    }

    pub fn extraction(&self, extraction: &Extraction) {
        if self.format == OutputFormat::Json {
            print_json(extraction);
            return;
        }

        let banner = format!("========== {} ==========", extraction.strategy.title());
        println!("\n{}\n", self.paint(&banner, Color::Cyan));

        if !extraction.facts.is_empty() {
            println!("{}", facts_table(&extraction.facts));
        }

        match &extraction.notice {
            Some(Notice::NoData) => self.warn("No additional information found."),
            Some(Notice::TableNotFound { panel }) => {
                self.warn("Table not found. Panel content:");
                println!("{}", panel);
            }
            None => {}
        }

        if extraction.failed() {
            for d in &extraction.diagnostics {
                if let Outcome::Failed(reason) = &d.outcome {
                    self.error(&format!("An error occurred while fetching details: {}", reason));
                }
            }
            self.warn("Showing what could be read before the error.");
        }
    }

    pub fn strategy(&self, label: &str, strategy: Strategy) {
        match self.format {
            OutputFormat::Table => {
                println!("{:?}", label);
                for s in Strategy::ALL {
                    if s == strategy {
                        println!("  → {}", self.paint(&s.to_string(), Color::Cyan));
                    } else {
                        println!("    {}", s);
                    }
                }
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({ "label": label, "strategy": strategy }))
            }
        }
    }
}

pub fn candidates_table(candidates: &[Candidate]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Index", "Name", "CPF", "Status"]);
    for (i, c) in candidates.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            c.name.clone(),
            c.masked_identifier.clone(),
            c.status_label.clone(),
        ]);
    }
    table
}

pub fn facts_table(facts: &FactSheet) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Information", "Detail"]);
    for (label, value) in facts.pairs() {
        table.add_row(vec![label, value]);
    }
    table
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}
