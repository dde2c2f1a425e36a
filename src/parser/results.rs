use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::{absolute_url, text_of};

pub const RESULT_ANCHOR: &str = "a.link-busca-nome";
pub const RESULTS_CONTAINER: &str = "#resultados";

static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(RESULT_ANCHOR).unwrap());

/// One row of the person-search listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub detail_url: String,
    pub masked_identifier: String,
    pub status_label: String,
}

/// Parse every result row in a rendered listing page.
pub fn parse_results(html: &str, base: &Url) -> Vec<Candidate> {
    let doc = Html::parse_document(html);
    doc.select(&ANCHOR_SEL)
        .filter_map(|a| parse_row(a, base))
        .collect()
}

/// Name and link come from the anchor; the masked CPF and status are the first two
/// non-blank `div`s following the anchor's parent.
fn parse_row(anchor: ElementRef, base: &Url) -> Option<Candidate> {
    let name = text_of(anchor);
    if name.is_empty() {
        debug!("Skipping result row with blank name");
        return None;
    }

    let href = anchor.value().attr("href").unwrap_or_default();
    let Some(detail_url) = absolute_url(base, href) else {
        debug!("Skipping '{}': unusable href {:?}", name, href);
        return None;
    };

    let mut values = anchor
        .parent()
        .and_then(ElementRef::wrap)
        .map(|parent| {
            parent
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.value().name() == "div")
                .map(text_of)
                .filter(|t| !t.is_empty())
                .take(2)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
        .into_iter();

    Some(Candidate {
        name,
        detail_url,
        masked_identifier: values.next().unwrap_or_default(),
        status_label: values.next().unwrap_or_default(),
    })
}
