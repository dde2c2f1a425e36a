use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::public_server::AFFILIATION_BLOCK;
use super::{
    detail_link, read_when_ready, span_selector, strong_selector, term_value_pairs, ExtractOptions,
    Extraction, Notice, Outcome, PANEL,
};
use crate::browser::Page;
use crate::error::PortalError;
use crate::parser::{clean_label, text_of};

pub const PENSIONS: &str = "div#pensoes";
const PENSION_KEYWORDS: &[&str] = &["pensão", "pensao", "pension", "instituidor"];

static PANEL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(PANEL).unwrap());
static PENSIONS_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(PENSIONS).unwrap());
static BLOCK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(AFFILIATION_BLOCK).unwrap());
static TERM_OR_VALUE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong, span").unwrap());

pub async fn run(
    page: &mut dyn Page,
    opts: &ExtractOptions,
    out: &mut Extraction,
) -> Result<(), PortalError> {
    let html = read_when_ready(page, PANEL, opts.timeout).await?;
    parse(&html, &opts.base, out);
    Ok(())
}

/// The pension section is not marked up consistently: try the named section first,
/// then fall back to scanning bold terms that mention a pension.
pub fn parse(html: &str, base: &Url, out: &mut Extraction) {
    let doc = Html::parse_document(html);
    let panel = doc.select(&PANEL_SEL).next();

    let mut added = match panel.and_then(|p| p.select(&PENSIONS_SEL).next()) {
        Some(section) => {
            out.note("pensions", Outcome::Found);
            term_value_pairs(section, &BLOCK_SEL, out)
        }
        None => {
            out.note("pensions", Outcome::NotFound);
            0
        }
    };

    if added == 0 {
        debug!("Pension section empty or absent, scanning bold terms");
        added = scan_terms(panel.unwrap_or_else(|| doc.root_element()), out);
    }

    if added == 0 {
        out.notice = Some(Notice::NoData);
    }

    detail_link(&doc, base, out);
}

fn is_pension_term(text: &str) -> bool {
    let lower = text.to_lowercase();
    PENSION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Pair each pension-related `<strong>` with the next `<span>` after it in document order.
fn scan_terms(scope: ElementRef, out: &mut Extraction) -> usize {
    let nodes: Vec<ElementRef> = scope.select(&TERM_OR_VALUE_SEL).collect();
    let strong = strong_selector();
    let span = span_selector();
    let mut added = 0;

    for (i, term) in nodes.iter().enumerate() {
        if !strong.matches(term) {
            continue;
        }
        let text = text_of(*term);
        if !is_pension_term(&text) {
            continue;
        }
        let label = clean_label(&text);
        let value = nodes[i + 1..]
            .iter()
            .find(|el| span.matches(el) && !el.ancestors().any(|a| a.id() == term.id()));

        match value {
            Some(value) if out.facts.push(label.clone(), text_of(*value)) => {
                out.note(label, Outcome::Found);
                added += 1;
            }
            Some(_) => out.note("pension term", Outcome::Malformed("blank term".into())),
            None => out.note(label, Outcome::Malformed("no value after term".into())),
        }
    }
    added
}
