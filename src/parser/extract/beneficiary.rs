use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::{read_when_ready, ExtractOptions, Extraction, Outcome, PANEL};
use crate::browser::Page;
use crate::error::PortalError;
use crate::parser::text_of;

pub const NOT_FOUND: &str = "Not found";
pub const HEADER: (&str, &str) = ("Record", "Resource beneficiary");

/// (label, element id) of the two amounts, in display order.
pub const AMOUNTS: [(&str, &str); 2] = [
    ("Direct disbursements", "recursosRecebidos"),
    ("Confidential transfers", "recursosSigilosos"),
];

static AMOUNT_SELS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    AMOUNTS
        .iter()
        .map(|(_, id)| Selector::parse(&format!("#{}", id)).unwrap())
        .collect()
});

/// Always leaves exactly three facts, even when the panel never renders.
pub async fn run(
    page: &mut dyn Page,
    opts: &ExtractOptions,
    out: &mut Extraction,
) -> Result<(), PortalError> {
    match read_when_ready(page, PANEL, opts.timeout).await {
        Ok(html) => {
            parse(Some(&html), out);
            Ok(())
        }
        Err(e) => {
            parse(None, out);
            Err(e)
        }
    }
}

pub fn parse(html: Option<&str>, out: &mut Extraction) {
    let doc = html.map(Html::parse_document);

    out.facts.push(HEADER.0, HEADER.1);
    for ((label, id), sel) in AMOUNTS.iter().zip(AMOUNT_SELS.iter()) {
        let raw = doc.as_ref().and_then(|d| d.select(sel).next()).map(text_of);
        let value = match raw {
            Some(text) => match normalize_amount(&text) {
                Some(v) => {
                    out.note(*label, Outcome::Found);
                    v
                }
                None => {
                    out.note(*label, Outcome::Malformed(format!("#{} has no value", id)));
                    NOT_FOUND.to_string()
                }
            },
            None => {
                if doc.is_some() {
                    out.note(*label, Outcome::NotFound);
                }
                NOT_FOUND.to_string()
            }
        };
        out.facts.push(*label, value);
    }
}

/// "Total recebido: R$ 1.234,56" → "R$ 1.234,56". Text without a colon is kept whole.
pub fn normalize_amount(text: &str) -> Option<String> {
    let tail = text.rsplit(':').next().unwrap_or(text).trim();
    if tail.is_empty() {
        None
    } else {
        Some(tail.to_string())
    }
}
