use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::info;
use url::Url;

use super::{
    detail_link, read_when_ready, term_value_pairs, ExtractOptions, Extraction, Notice, Outcome,
    PANEL,
};
use crate::browser::Page;
use crate::error::PortalError;

pub const AFFILIATIONS: &str = "div#vinculos";
pub const AFFILIATION_BLOCK: &str = "div.col-sm-12.col-md-6";

static PANEL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(PANEL).unwrap());
static AFFILIATIONS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(AFFILIATIONS).unwrap());
static BLOCK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(AFFILIATION_BLOCK).unwrap());

pub async fn run(
    page: &mut dyn Page,
    opts: &ExtractOptions,
    out: &mut Extraction,
) -> Result<(), PortalError> {
    let html = read_when_ready(page, PANEL, opts.timeout).await?;
    parse(&html, &opts.base, out);
    Ok(())
}

/// Affiliation ("vínculos") term/value pairs from the profile panel, then the detail link.
pub fn parse(html: &str, base: &Url, out: &mut Extraction) {
    let doc = Html::parse_document(html);

    let section = doc
        .select(&PANEL_SEL)
        .next()
        .and_then(|panel| panel.select(&AFFILIATIONS_SEL).next());

    let added = match section {
        Some(section) => {
            out.note("affiliations", Outcome::Found);
            term_value_pairs(section, &BLOCK_SEL, out)
        }
        None => {
            info!("No linkage data found in HTML.");
            out.note("affiliations", Outcome::NotFound);
            0
        }
    };

    if added == 0 {
        out.notice = Some(Notice::NoData);
    }

    detail_link(&doc, base, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fixture::{load, FixturePage};
    use crate::parser::classify::Strategy;
    use crate::parser::extract::{extract, test_options, DETAIL_LINK_LABEL};

    #[test]
    fn affiliations_in_document_order() {
        let mut out = Extraction::new(Strategy::PublicServer);
        parse(&load("public_server"), &test_options().base, &mut out);
        assert_eq!(
            out.facts.pairs(),
            vec![
                ("Position", "Analyst"),
                ("Department", "Finance"),
                (
                    DETAIL_LINK_LABEL,
                    "https://portaldatransparencia.gov.br/servidores/1234567-maria-da-silva",
                ),
            ]
        );
        assert_eq!(out.notice, None);
        assert!(matches!(out.outcome_of("block 3"), Some(Outcome::Malformed(_))));
    }

    #[test]
    fn no_link_no_extra_fact() {
        let html = r#"<div class="box-ficha__resultados"><div id="vinculos">
            <div class="col-sm-12 col-md-6"><strong>Position:</strong><span>Analyst</span></div>
            <div class="col-sm-12 col-md-6"><strong>Department:</strong><span>Finance</span></div>
        </div></div>"#;
        let mut out = Extraction::new(Strategy::PublicServer);
        parse(html, &test_options().base, &mut out);
        assert_eq!(out.facts.pairs(), vec![("Position", "Analyst"), ("Department", "Finance")]);
        assert_eq!(out.outcome_of(DETAIL_LINK_LABEL), Some(&Outcome::NotFound));
        assert!(!out.failed());
    }

    #[test]
    fn missing_affiliations_means_no_data() {
        let html = r#"<div class="box-ficha__resultados"><p>Sem vínculos</p></div>"#;
        let mut out = Extraction::new(Strategy::PublicServer);
        parse(html, &test_options().base, &mut out);
        assert!(out.facts.is_empty());
        assert_eq!(out.notice, Some(Notice::NoData));
        assert_eq!(out.outcome_of("affiliations"), Some(&Outcome::NotFound));
    }

    #[test]
    fn empty_affiliations_means_no_data() {
        let html = r#"<div class="box-ficha__resultados"><div id="vinculos"></div></div>"#;
        let mut out = Extraction::new(Strategy::PublicServer);
        parse(html, &test_options().base, &mut out);
        assert!(out.facts.is_empty());
        assert_eq!(out.notice, Some(Notice::NoData));
    }

    #[tokio::test]
    async fn through_the_page() {
        let mut page = FixturePage::loaded(&load("public_server"));
        let out = extract(Strategy::PublicServer, &mut page, &test_options()).await;
        assert_eq!(out.facts.len(), 3);
        assert!(!out.failed());
    }
}
