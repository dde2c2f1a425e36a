use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{info, warn};
use url::Url;

use crate::browser::{document_has, Page};
use crate::error::PortalError;
use crate::parser::classify::classify;
use crate::parser::extract::{self, ExtractOptions, Extraction};
use crate::parser::results::{parse_results, Candidate, RESULTS_CONTAINER, RESULT_ANCHOR};

const SEARCH_PATH: &str = "/pessoa-fisica/busca/lista";
const PAGE_SIZE: u32 = 10;

static CPF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}\.?\d{3}\.?\d{3}-?\d{2}$").unwrap());

#[derive(Debug)]
pub enum SearchOutcome {
    Candidates(Vec<Candidate>),
    /// The listing rendered and holds no rows.
    NoResults,
    /// Neither rows nor the listing container showed up in time.
    TimedOut { waited: Duration },
}

pub fn looks_like_cpf(term: &str) -> bool {
    CPF_RE.is_match(term.trim())
}

/// First page of the person-search listing for `term`.
pub fn search_url(base: &Url, term: &str) -> Result<Url, PortalError> {
    let mut url = base.join(SEARCH_PATH).map_err(|source| PortalError::InvalidUrl {
        url: format!("{}{}", base, SEARCH_PATH),
        source,
    })?;
    url.query_pairs_mut()
        .append_pair("termo", term)
        .append_pair("pagina", "1")
        .append_pair("tamanhoPagina", &PAGE_SIZE.to_string());
    Ok(url)
}

/// Run a search. `term` must already be validated as non-empty.
pub async fn search(
    page: &mut dyn Page,
    term: &str,
    base: &Url,
    timeout: Duration,
) -> Result<SearchOutcome, PortalError> {
    let url = search_url(base, term)?;
    let kind = if looks_like_cpf(term) { "CPF" } else { "name" };
    info!("Searching by {}: {}", kind, term);
    page.navigate(url.as_str()).await?;

    match page.wait_for(RESULT_ANCHOR, timeout).await {
        Ok(()) => {}
        Err(PortalError::Timeout { waited, .. }) => {
            let html = page.content().await?;
            if document_has(&html, RESULTS_CONTAINER)? {
                info!("Listing rendered without results");
                return Ok(SearchOutcome::NoResults);
            }
            warn!("No results found on the search page within {:.1}s", waited.as_secs_f64());
            return Ok(SearchOutcome::TimedOut { waited });
        }
        Err(e) => return Err(e),
    }

    let html = page.content().await?;
    let candidates = parse_results(&html, base);
    info!("Parsed {} result rows", candidates.len());
    if candidates.is_empty() {
        Ok(SearchOutcome::NoResults)
    } else {
        Ok(SearchOutcome::Candidates(candidates))
    }
}

/// Load a candidate's detail page and extract it with the strategy its status selects.
/// Navigation faults are fatal; extraction faults are folded into the result.
pub async fn open_candidate(
    page: &mut dyn Page,
    candidate: &Candidate,
    opts: &ExtractOptions,
) -> Result<Extraction, PortalError> {
    let strategy = classify(&candidate.status_label);
    info!(
        "Opening {} as {} (status: {:?})",
        candidate.name, strategy, candidate.status_label
    );
    page.navigate(&candidate.detail_url).await?;
    let extraction = extract::extract(strategy, page, opts).await;
    info!("Extracted {} facts", extraction.facts.len());
    Ok(extraction)
}
