//! Paginated fetching of LMS collection resources.
//!
//! The LMS paginates collections and advertises the next page through
//! the RFC 5988 `Link` response header. [`fetch_all`] follows the
//! `rel="next"` chain and flattens every page's records into one
//! ordered sequence, bounded by a configurable page ceiling.
//!
//! The HTTP round-trip sits behind the [`PageFetch`] trait so the
//! aggregation logic (and everything above it) can run against a fake
//! in tests.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// One page of a paginated resource.
#[derive(Debug, Clone)]
pub struct Page {
    /// Parsed response body.
    pub body: Value,
    /// URL of the next page, if the response advertised one.
    pub next: Option<String>,
}

/// A single authenticated page fetch.
#[async_trait]
pub trait PageFetch: Send + Sync {
    /// Issues one authenticated GET and returns the parsed body plus
    /// the next-page link, if any.
    async fn fetch_page(
        &self,
        url: &str,
        token: &str,
        token_type: &str,
    ) -> Result<Page, FetchError>;
}

/// Production fetcher backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a fresh HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be constructed.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetch for HttpFetcher {
    async fn fetch_page(
        &self,
        url: &str,
        token: &str,
        token_type: &str,
    ) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("{token_type} {token}"),
            )
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let next = next_link(response.headers());

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(Page { body, next })
    }
}

/// Extracts the `rel="next"` target from `Link` headers, if present.
#[must_use]
pub fn next_link(headers: &reqwest::header::HeaderMap) -> Option<String> {
    for header in headers.get_all(reqwest::header::LINK) {
        let Ok(header) = header.to_str() else {
            continue;
        };

        for entry in header.split(',') {
            let mut segments = entry.split(';');
            let target = segments.next().unwrap_or_default().trim();
            if !(target.starts_with('<') && target.ends_with('>')) {
                continue;
            }

            let is_next = segments.any(|param| {
                let param = param.trim();
                param == r#"rel="next""# || param == "rel=next"
            });

            if is_next {
                return Some(target[1..target.len() - 1].to_string());
            }
        }
    }

    None
}

/// Fetches every page of a collection resource, flattened in order.
///
/// List bodies extend the result element-wise; a single-object body is
/// appended as one record; anything else contributes nothing.
/// Pagination ends when a page advertises no next link.
///
/// # Errors
///
/// Returns an error on any transport or status failure, or when the
/// chain exceeds `max_pages` — an upstream that never stops linking is
/// treated as a protocol error rather than followed forever.
pub async fn fetch_all<F>(
    fetcher: &F,
    url: &str,
    token: &str,
    token_type: &str,
    max_pages: u32,
) -> Result<Vec<Value>, FetchError>
where
    F: PageFetch + ?Sized,
{
    let mut records = Vec::new();
    let mut next = Some(url.to_string());
    let mut pages: u32 = 0;

    while let Some(page_url) = next {
        if pages == max_pages {
            return Err(FetchError::PageLimitExceeded {
                url: page_url,
                limit: max_pages,
            });
        }

        let page = fetcher.fetch_page(&page_url, token, token_type).await?;

        match page.body {
            Value::Array(items) => records.extend(items),
            body @ Value::Object(_) => records.push(body),
            _ => {}
        }

        next = page.next;
        pages += 1;
    }

    debug!(url, pages, records = records.len(), "fetched collection");

    Ok(records)
}

/// Errors from paginated fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be sent or the response not received.
    Transport(String),
    /// The upstream answered with a non-success status.
    Status { url: String, status: u16 },
    /// The response body was not parsable JSON.
    Body(String),
    /// The next-link chain exceeded the configured ceiling.
    PageLimitExceeded { url: String, limit: u32 },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "fetch transport error: {msg}"),
            Self::Status { url, status } => {
                write!(f, "error fetching {url}: status {status}")
            }
            Self::Body(msg) => write!(f, "unparsable fetch response: {msg}"),
            Self::PageLimitExceeded { url, limit } => {
                write!(f, "pagination exceeded {limit} pages at {url}")
            }
        }
    }
}

impl std::error::Error for FetchError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    /// Serves canned pages keyed by URL.
    struct FakeFetcher {
        pages: HashMap<String, Page>,
    }

    impl FakeFetcher {
        fn new(pages: Vec<(&str, Value, Option<&str>)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(url, body, next)| {
                        (
                            url.to_string(),
                            Page {
                                body,
                                next: next.map(str::to_string),
                            },
                        )
                    })
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PageFetch for FakeFetcher {
        async fn fetch_page(
            &self,
            url: &str,
            _token: &str,
            _token_type: &str,
        ) -> Result<Page, FetchError> {
            self.pages.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    #[tokio::test]
    async fn three_page_chain_flattens_in_order() {
        let fetcher = FakeFetcher::new(vec![
            ("http://lms/p1", json!([1, 2]), Some("http://lms/p2")),
            ("http://lms/p2", json!([3]), Some("http://lms/p3")),
            ("http://lms/p3", json!([4, 5]), None),
        ]);

        let records = fetch_all(&fetcher, "http://lms/p1", "tok", "Bearer", 64)
            .await
            .expect("records");

        assert_eq!(records, vec![json!(1), json!(2), json!(3), json!(4), json!(5)]);
    }

    #[tokio::test]
    async fn missing_next_link_ends_after_one_page() {
        let fetcher = FakeFetcher::new(vec![("http://lms/only", json!([1]), None)]);

        let records = fetch_all(&fetcher, "http://lms/only", "tok", "Bearer", 64)
            .await
            .expect("records");

        assert_eq!(records, vec![json!(1)]);
    }

    #[tokio::test]
    async fn single_object_body_is_one_record() {
        let fetcher = FakeFetcher::new(vec![("http://lms/one", json!({"id": 7}), None)]);

        let records = fetch_all(&fetcher, "http://lms/one", "tok", "Bearer", 64)
            .await
            .expect("records");

        assert_eq!(records, vec![json!({"id": 7})]);
    }

    #[tokio::test]
    async fn scalar_body_contributes_nothing() {
        let fetcher = FakeFetcher::new(vec![("http://lms/odd", json!("nope"), None)]);

        let records = fetch_all(&fetcher, "http://lms/odd", "tok", "Bearer", 64)
            .await
            .expect("records");

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn endless_chain_hits_the_page_ceiling() {
        // A page that links back to itself never terminates on its own.
        let fetcher = FakeFetcher::new(vec![(
            "http://lms/loop",
            json!([1]),
            Some("http://lms/loop"),
        )]);

        let err = fetch_all(&fetcher, "http://lms/loop", "tok", "Bearer", 3)
            .await
            .expect_err("must hit ceiling");

        assert_eq!(
            err,
            FetchError::PageLimitExceeded {
                url: "http://lms/loop".to_string(),
                limit: 3,
            }
        );
    }

    #[tokio::test]
    async fn upstream_error_status_aborts() {
        let fetcher = FakeFetcher::new(vec![]);

        let err = fetch_all(&fetcher, "http://lms/missing", "tok", "Bearer", 64)
            .await
            .expect_err("must fail");

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[test]
    fn next_link_parses_canvas_style_header() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::LINK,
            concat!(
                "<https://lms/api/v1/courses?page=1>; rel=\"current\", ",
                "<https://lms/api/v1/courses?page=2>; rel=\"next\", ",
                "<https://lms/api/v1/courses?page=9>; rel=\"last\"",
            )
            .parse()
            .expect("header value"),
        );

        assert_eq!(
            next_link(&headers),
            Some("https://lms/api/v1/courses?page=2".to_string())
        );
    }

    #[test]
    fn next_link_absent_when_no_next_relation() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::LINK,
            "<https://lms/api/v1/courses?page=1>; rel=\"current\""
                .parse()
                .expect("header value"),
        );

        assert_eq!(next_link(&headers), None);
    }

    #[test]
    fn next_link_absent_without_link_header() {
        let headers = reqwest::header::HeaderMap::new();
        assert_eq!(next_link(&headers), None);
    }
}
