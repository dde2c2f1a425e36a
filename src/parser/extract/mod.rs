pub mod beneficiary;
pub mod generic_benefit;
pub mod pension;
pub mod public_server;

use std::sync::LazyLock;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::warn;
use url::Url;

use super::classify::Strategy;
use super::{absolute_url, clean_label, text_of};
use crate::browser::Page;
use crate::error::PortalError;

/// Profile panel every detail page renders into.
pub const PANEL: &str = "div.box-ficha__resultados";
pub const DETAIL_LINK: &str = "a.link-detalhar[href]";
pub const DETAIL_LINK_LABEL: &str = "Detail link";

static STRONG_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("strong").unwrap());
static SPAN_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static DETAIL_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(DETAIL_LINK).unwrap());

// ── Types ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fact {
    pub label: String,
    pub value: String,
}

/// Ordered label/value pairs in document order. Labels repeat freely but are never blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FactSheet(Vec<Fact>);

impl FactSheet {
    /// Append a fact. Returns false (and stores nothing) when the label is blank.
    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) -> bool {
        let label = label.into();
        if label.trim().is_empty() {
            return false;
        }
        self.0.push(Fact {
            label,
            value: value.into(),
        });
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// (label, value) pairs, mostly for assertions and table rows.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.0
            .iter()
            .map(|f| (f.label.as_str(), f.value.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Found,
    NotFound,
    /// Present but not in the expected shape.
    Malformed(String),
    /// A fault (usually a wait timeout) stopped the step.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub field: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    NoData,
    /// Raw panel markup kept for diagnosis.
    TableNotFound { panel: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub strategy: Strategy,
    pub facts: FactSheet,
    pub diagnostics: Vec<Diagnostic>,
    pub notice: Option<Notice>,
}

impl Extraction {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            facts: FactSheet::default(),
            diagnostics: Vec::new(),
            notice: None,
        }
    }

    pub fn note(&mut self, field: impl Into<String>, outcome: Outcome) {
        self.diagnostics.push(Diagnostic {
            field: field.into(),
            outcome,
        });
    }

    /// Outcome recorded for `field`, if any.
    #[cfg(test)]
    pub fn outcome_of(&self, field: &str) -> Option<&Outcome> {
        self.diagnostics
            .iter()
            .find(|d| d.field == field)
            .map(|d| &d.outcome)
    }

    pub fn failed(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d.outcome, Outcome::Failed(_)))
    }
}

/// What every strategy needs besides the page.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub base: Url,
    pub timeout: Duration,
}

// ── Dispatch ──

/// Run `strategy` against the loaded detail page. Never fails: faults are logged,
/// recorded as a `Failed` diagnostic, and whatever was collected is returned.
pub async fn extract(strategy: Strategy, page: &mut dyn Page, opts: &ExtractOptions) -> Extraction {
    let mut out = Extraction::new(strategy);
    let result = match strategy {
        Strategy::PublicServer => public_server::run(page, opts, &mut out).await,
        Strategy::Beneficiary => beneficiary::run(page, opts, &mut out).await,
        Strategy::PensionInstitutor => pension::run(page, opts, &mut out).await,
        Strategy::GenericBenefit => generic_benefit::run(page, opts, &mut out).await,
    };

    if let Err(e) = result {
        warn!("An error occurred while fetching {} details: {}", strategy, e);
        out.note("page", Outcome::Failed(e.to_string()));
    }
    out
}

/// Wait for `selector`, then return the whole rendered document.
pub async fn read_when_ready(
    page: &mut dyn Page,
    selector: &str,
    timeout: Duration,
) -> Result<String, PortalError> {
    page.wait_for(selector, timeout).await?;
    page.content().await
}

// ── Shared markup helpers ──

/// Collect `<strong>` term / `<span>` value pairs from each block matching `block_sel`
/// under `scope`. Blocks missing either half are skipped. Returns the number of facts added.
pub fn term_value_pairs(scope: ElementRef, block_sel: &Selector, out: &mut Extraction) -> usize {
    let mut added = 0;
    for (i, block) in scope.select(block_sel).enumerate() {
        let term = block.select(&STRONG_SEL).next();
        let value = block.select(&SPAN_SEL).next();
        match (term, value) {
            (Some(term), Some(value)) => {
                let label = clean_label(&text_of(term));
                if out.facts.push(label.clone(), text_of(value)) {
                    out.note(label, Outcome::Found);
                    added += 1;
                } else {
                    out.note(format!("block {}", i + 1), Outcome::Malformed("blank term".into()));
                }
            }
            _ => out.note(
                format!("block {}", i + 1),
                Outcome::Malformed("missing term or value element".into()),
            ),
        }
    }
    added
}

/// Append the "Detail link" fact when the page carries the detail anchor.
pub fn detail_link(doc: &Html, base: &Url, out: &mut Extraction) {
    let Some(anchor) = doc.select(&DETAIL_LINK_SEL).next() else {
        out.note(DETAIL_LINK_LABEL, Outcome::NotFound);
        return;
    };
    let href = anchor.value().attr("href").unwrap_or_default();
    match absolute_url(base, href) {
        Some(url) => {
            out.facts.push(DETAIL_LINK_LABEL, url);
            out.note(DETAIL_LINK_LABEL, Outcome::Found);
        }
        None => out.note(
            DETAIL_LINK_LABEL,
            Outcome::Malformed(format!("unusable href {:?}", href)),
        ),
    }
}

pub(crate) fn strong_selector() -> &'static Selector {
    &STRONG_SEL
}

pub(crate) fn span_selector() -> &'static Selector {
    &SPAN_SEL
}

#[cfg(test)]
pub(crate) fn test_options() -> ExtractOptions {
    ExtractOptions {
        base: Url::parse("https://portaldatransparencia.gov.br").unwrap(),
        timeout: Duration::from_secs(10),
    }
}

// ── Tests ──
