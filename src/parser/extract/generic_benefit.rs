use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::{read_when_ready, ExtractOptions, Extraction, Notice, Outcome};
use crate::browser::Page;
use crate::error::PortalError;
use crate::parser::text_of;

pub const ACCORDION: &str = "div#accordion1";
pub const BENEFITS_TABLE: &str = "table#tabelaBeneficios";

static ACCORDION_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(ACCORDION).unwrap());
static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(BENEFITS_TABLE).unwrap());
static HEAD_ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("thead tr").unwrap());
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static TD_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static TH_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());

pub async fn run(
    page: &mut dyn Page,
    opts: &ExtractOptions,
    out: &mut Extraction,
) -> Result<(), PortalError> {
    let html = read_when_ready(page, ACCORDION, opts.timeout).await?;
    parse(&html, out);
    Ok(())
}

/// Each body row of the benefits table becomes one fact per cell, labelled by its column header.
pub fn parse(html: &str, out: &mut Extraction) {
    let doc = Html::parse_document(html);

    let Some(accordion) = doc.select(&ACCORDION_SEL).next() else {
        out.note("accordion", Outcome::NotFound);
        out.notice = Some(Notice::TableNotFound { panel: String::new() });
        return;
    };

    let Some(table) = accordion.select(&TABLE_SEL).next() else {
        warn!("Table not found in the benefits panel");
        out.note("table", Outcome::NotFound);
        out.notice = Some(Notice::TableNotFound {
            panel: accordion.inner_html().trim().to_string(),
        });
        return;
    };
    out.note("table", Outcome::Found);

    let headers = header_names(table);
    let rows: Vec<ElementRef> = table
        .select(&ROW_SEL)
        .filter(|tr| tr.select(&TD_SEL).next().is_some())
        .collect();

    if rows.is_empty() {
        out.note("rows", Outcome::NotFound);
        out.notice = Some(Notice::NoData);
        return;
    }

    for tr in &rows {
        for (i, cell) in cells(*tr).into_iter().enumerate() {
            let label = headers
                .get(i)
                .cloned()
                .unwrap_or_else(|| column_name(i));
            out.facts.push(label, text_of(cell));
        }
    }
    out.note("rows", Outcome::Found);
}

/// Header cells from `<thead>`, else from the first row made only of `<th>`.
fn header_names(table: ElementRef) -> Vec<String> {
    let head_row = table.select(&HEAD_ROW_SEL).next().or_else(|| {
        table
            .select(&ROW_SEL)
            .find(|tr| tr.select(&TD_SEL).next().is_none() && tr.select(&TH_SEL).next().is_some())
    });

    head_row
        .map(|tr| {
            cells(tr)
                .into_iter()
                .enumerate()
                .map(|(i, cell)| {
                    let name = text_of(cell);
                    if name.is_empty() {
                        column_name(i)
                    } else {
                        name
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Direct `<td>`/`<th>` children of a row, in order.
fn cells(tr: ElementRef) -> Vec<ElementRef> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect()
}

fn column_name(i: usize) -> String {
    format!("Column {}", i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fixture::{load, FixturePage};
    use crate::parser::classify::Strategy;
    use crate::parser::extract::{extract, test_options};

    fn run_parse(html: &str) -> Extraction {
        let mut out = Extraction::new(Strategy::GenericBenefit);
        parse(html, &mut out);
        out
    }

    #[test]
    fn rows_become_labelled_facts() {
        let out = run_parse(&load("generic_benefit"));
        assert_eq!(
            out.facts.pairs(),
            vec![
                ("Benefício", "Bolsa Família"),
                ("Mês", "01/2024"),
                ("Valor", "R$ 600,00"),
                ("Benefício", "Auxílio Gás"),
                ("Mês", "02/2024"),
                ("Valor", "R$ 102,00"),
            ]
        );
        assert_eq!(out.notice, None);
    }

    #[test]
    fn header_only_table_is_no_data() {
        let html = r#"<div id="accordion1"><table id="tabelaBeneficios">
            <thead><tr><th>Benefício</th><th>Valor</th></tr></thead><tbody></tbody>
        </table></div>"#;
        let out = run_parse(html);
        assert!(out.facts.is_empty());
        assert_eq!(out.notice, Some(Notice::NoData));
    }

    #[test]
    fn missing_table_keeps_panel_markup() {
        let html = r#"<div id="accordion1"><p>Nenhum benefício</p></div>"#;
        let out = run_parse(html);
        assert!(out.facts.is_empty());
        match out.notice {
            Some(Notice::TableNotFound { panel }) => assert_eq!(panel, "<p>Nenhum benefício</p>"),
            other => panic!("unexpected notice: {:?}", other),
        }
    }

    #[test]
    fn header_row_without_thead_and_blank_headers() {
        let html = r#"<div id="accordion1"><table id="tabelaBeneficios">
            <tr><th>Programa</th><th></th></tr>
            <tr><td>Seguro Defeso</td><td>R$ 1.412,00</td><td>extra</td></tr>
        </table></div>"#;
        let out = run_parse(html);
        assert_eq!(
            out.facts.pairs(),
            vec![
                ("Programa", "Seguro Defeso"),
                ("Column 2", "R$ 1.412,00"),
                ("Column 3", "extra"),
            ]
        );
    }

    #[tokio::test]
    async fn header_only_through_the_page_is_not_an_error() {
        let html = r#"<div id="accordion1"><table id="tabelaBeneficios">
            <tr><th>Benefício</th></tr></table></div>"#;
        let mut page = FixturePage::loaded(html);
        let out = extract(Strategy::GenericBenefit, &mut page, &test_options()).await;
        assert!(out.facts.is_empty());
        assert_eq!(out.notice, Some(Notice::NoData));
        assert!(!out.failed());
    }

    #[tokio::test]
    async fn accordion_never_renders() {
        let mut page = FixturePage::loaded("<html><body></body></html>");
        let out = extract(Strategy::GenericBenefit, &mut page, &test_options()).await;
        assert!(out.failed());
        assert_eq!(out.notice, None);
    }
}
