pub mod classify;
pub mod extract;
pub mod results;

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;
use url::Url;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Visible text of an element, whitespace collapsed and trimmed.
pub fn text_of(el: ElementRef) -> String {
    let raw: String = el.text().collect();
    WS_RE.replace_all(&raw, " ").trim().to_string()
}

/// Term label as shown in bold on the portal: colons dropped, trimmed.
pub fn clean_label(raw: &str) -> String {
    raw.replace(':', "").trim().to_string()
}

/// Resolve `href` against the portal origin. `None` if it cannot form a valid URL.
pub fn absolute_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn text_collapses_whitespace() {
        let doc = Html::parse_fragment("<span>\n   R$ 1.234,56 \t</span>");
        let sel = Selector::parse("span").unwrap();
        let el = doc.select(&sel).next().unwrap();
        assert_eq!(text_of(el), "R$ 1.234,56");
    }

    #[test]
    fn label_drops_colons() {
        assert_eq!(clean_label(" Cargo: "), "Cargo");
        assert_eq!(clean_label("Pensão Concedida:"), "Pensão Concedida");
    }

    #[test]
    fn relative_and_absolute_hrefs() {
        let base = Url::parse("https://portaldatransparencia.gov.br").unwrap();
        assert_eq!(
            absolute_url(&base, "/busca/pessoa-fisica/123").as_deref(),
            Some("https://portaldatransparencia.gov.br/busca/pessoa-fisica/123")
        );
        assert_eq!(
            absolute_url(&base, "https://example.org/x").as_deref(),
            Some("https://example.org/x")
        );
        assert_eq!(absolute_url(&base, "   "), None);
    }
}
