use std::time::Duration;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use crate::models::{
    FailureKind, PageOutcome, PageReport, SeoAttributes, NOT_AVAILABLE,
};

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const H2_DELIMITER: &str = " | ";

// ── Lazy static selectors ────────────────────────────────────────────────────

static H1_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static H2_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static DESCRIPTION_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static CANONICAL_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"link[rel="canonical"]"#).unwrap());
static ROBOTS_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="robots"]"#).unwrap());

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("{0}")]
    Request(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("URL did not return HTML")]
    NotHtml,
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl ExtractionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExtractionError::Request(_) | ExtractionError::Status(_) => {
                FailureKind::Request
            }
            ExtractionError::NotHtml | ExtractionError::Body(_) => FailureKind::Analysis,
        }
    }
}

// ── HTTP client ──────────────────────────────────────────────────────────────

/// Browser-like client shared across all requests. 10 s total timeout per
/// request, redirects followed.
pub fn build_client() -> reqwest::Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
            .parse()
            .unwrap(),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        "en-US,en;q=0.9".parse().unwrap(),
    );
    headers.insert(reqwest::header::CONNECTION, "keep-alive".parse().unwrap());

    reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Fetch one page and extract its on-page SEO attributes. Never fails the
/// batch: any error becomes a `PageOutcome::Failed` report with the input
/// URL preserved.
pub async fn extract(client: &reqwest::Client, raw_url: &str) -> PageReport {
    let target = normalize_url(raw_url);
    match fetch_html(client, &target).await {
        Ok((html, final_url)) => {
            // Show the redirect target when there was one; otherwise keep
            // the user's input verbatim.
            let redirected = Url::parse(&target)
                .map(|u| u.as_str() != final_url)
                .unwrap_or(true);
            let url = if redirected { final_url } else { raw_url.to_string() };
            PageReport {
                url,
                outcome: PageOutcome::Extracted(extract_attributes(&html)),
            }
        }
        Err(e) => {
            tracing::warn!(url = raw_url, error = %e, "extraction failed");
            PageReport {
                url: raw_url.to_string(),
                outcome: PageOutcome::Failed(e.kind()),
            }
        }
    }
}

/// Prepend `https://` when the input has no explicit scheme.
pub fn normalize_url(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

// ── HTTP fetch ───────────────────────────────────────────────────────────────

async fn fetch_html(
    client: &reqwest::Client,
    url: &str,
) -> Result<(String, String), ExtractionError> {
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractionError::Request(format!("TimeoutError: {}", e))
        } else if e.is_connect() {
            ExtractionError::Request(format!("ConnectError: {}", e))
        } else {
            ExtractionError::Request(format!("RequestError: {}", e))
        }
    })?;

    if !response.status().is_success() {
        return Err(ExtractionError::Status(response.status().as_u16()));
    }

    let final_url = response.url().to_string();

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    if !content_type.contains("text/html") {
        return Err(ExtractionError::NotHtml);
    }

    let body = response
        .text()
        .await
        .map_err(|e| ExtractionError::Body(e.to_string()))?;

    Ok((body, final_url))
}

// ── HTML attribute extraction ────────────────────────────────────────────────

/// Pull the fixed attribute set out of an HTML document. Absent elements
/// yield the `N/A` marker and a length of 0.
pub fn extract_attributes(html: &str) -> SeoAttributes {
    let document = Html::parse_document(html);

    let h1 = document
        .select(&H1_SEL)
        .next()
        .map(|el| normalize_text(el.text().collect()))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let h2s: Vec<String> = document
        .select(&H2_SEL)
        .map(|el| normalize_text(el.text().collect()))
        .filter(|s| !s.is_empty())
        .collect();
    let h2 = if h2s.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        h2s.join(H2_DELIMITER)
    };

    let title = document
        .select(&TITLE_SEL)
        .next()
        .map(|el| normalize_text(el.text().collect()));
    let meta_title_length = title.as_deref().map(count_chars).unwrap_or(0);
    let meta_title = title.unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let description = document
        .select(&DESCRIPTION_SEL)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string());
    let meta_description_length = description.as_deref().map(count_chars).unwrap_or(0);
    let meta_description = description.unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let canonical = document
        .select(&CANONICAL_SEL)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let meta_robots = document
        .select(&ROBOTS_SEL)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    SeoAttributes {
        h1,
        h2,
        meta_title,
        meta_title_length,
        meta_description,
        meta_description_length,
        canonical,
        meta_robots,
    }
}

/// Collapse whitespace and trim.
fn normalize_text(text: String) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn count_chars(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_prepends_https() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(
            normalize_url("https://example.com/page"),
            "https://example.com/page"
        );
    }

    #[test]
    fn extracts_first_h1_text() {
        let attrs = extract_attributes(
            "<html><body><h1> First <b>heading</b> </h1><h1>Second</h1></body></html>",
        );
        assert_eq!(attrs.h1, "First heading");
    }

    #[test]
    fn missing_elements_yield_markers_and_zero_lengths() {
        let attrs = extract_attributes("<html><body><p>nothing here</p></body></html>");
        assert_eq!(attrs.h1, NOT_AVAILABLE);
        assert_eq!(attrs.h2, NOT_AVAILABLE);
        assert_eq!(attrs.meta_title, NOT_AVAILABLE);
        assert_eq!(attrs.meta_title_length, 0);
        assert_eq!(attrs.meta_description, NOT_AVAILABLE);
        assert_eq!(attrs.meta_description_length, 0);
        assert_eq!(attrs.canonical, NOT_AVAILABLE);
        assert_eq!(attrs.meta_robots, NOT_AVAILABLE);
    }

    #[test]
    fn h2s_join_in_document_order_skipping_empty() {
        let attrs = extract_attributes(
            "<html><body>\
             <h2>One</h2><h2>   </h2><h2>Two</h2><h2>Three</h2>\
             </body></html>",
        );
        assert_eq!(attrs.h2, "One | Two | Three");
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        let attrs =
            extract_attributes("<html><head><title>caffè e più</title></head></html>");
        assert_eq!(attrs.meta_title, "caffè e più");
        assert_eq!(attrs.meta_title_length, 11);
    }

    #[test]
    fn extracts_meta_and_link_attributes() {
        let attrs = extract_attributes(
            r#"<html><head>
                 <title>Example Domain</title>
                 <meta name="description" content="  A sample page.  ">
                 <link rel="canonical" href="https://example.com/">
                 <meta name="robots" content="noindex, nofollow">
               </head></html>"#,
        );
        assert_eq!(attrs.meta_title, "Example Domain");
        assert_eq!(attrs.meta_title_length, 14);
        assert_eq!(attrs.meta_description, "A sample page.");
        assert_eq!(attrs.meta_description_length, 14);
        assert_eq!(attrs.canonical, "https://example.com/");
        assert_eq!(attrs.meta_robots, "noindex, nofollow");
    }

    #[test]
    fn title_only_page_matches_expected_shape() {
        let attrs =
            extract_attributes("<html><head><title>Example Domain</title></head></html>");
        assert_eq!(attrs.meta_title, "Example Domain");
        assert_eq!(attrs.meta_title_length, 14);
        assert_eq!(attrs.h1, NOT_AVAILABLE);
        assert_eq!(attrs.h2, NOT_AVAILABLE);
        assert_eq!(attrs.meta_description, NOT_AVAILABLE);
        assert_eq!(attrs.canonical, NOT_AVAILABLE);
        assert_eq!(attrs.meta_robots, NOT_AVAILABLE);
    }

    #[test]
    fn error_kinds_split_request_from_analysis() {
        assert_eq!(
            ExtractionError::Request("ConnectError: refused".into()).kind(),
            FailureKind::Request
        );
        assert_eq!(ExtractionError::Status(404).kind(), FailureKind::Request);
        assert_eq!(ExtractionError::NotHtml.kind(), FailureKind::Analysis);
        assert_eq!(
            ExtractionError::Body("decode".into()).kind(),
            FailureKind::Analysis
        );
    }
}
