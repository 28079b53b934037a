//! Paginated download of the monster dataset.
//!
//! Follows `next` links page by page, retrying each page up to three times
//! with a linear back-off (0 ms → 100 ms → 200 ms), and feeds every page to a
//! [`DatasetAssembler`] as soon as it arrives.

use std::collections::HashSet;
use std::time::Duration;

use ecology_core::error::{EcologyError, Result};
use ecology_data::assembler::{Dataset, DatasetAssembler};
use tracing::{debug, info, warn};

use crate::source::{PageSource, RawPage};

/// Maximum number of attempts per page before giving up.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Back-off added per retry.
const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(100);

/// Downloads every page reachable from a start URL.
pub struct DatasetFetcher<S: PageSource> {
    source: S,
    /// Stop after this many pages.
    max_pages: Option<usize>,
    backoff_step: Duration,
}

impl<S: PageSource> DatasetFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_pages: None,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    /// Fetch and normalize all pages starting at `start_url`.
    ///
    /// Stops when a page has no `next` link, when a page URL repeats, or when
    /// the page limit is reached. A page that still fails after
    /// [`MAX_RETRY_ATTEMPTS`] aborts the whole fetch.
    pub async fn fetch_all(&self, start_url: &str) -> Result<Dataset> {
        let mut assembler = DatasetAssembler::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut next = Some(start_url.to_string());

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                warn!("page {} already fetched; stopping", url);
                break;
            }

            let page = self.fetch_with_retry(&url).await?;
            assembler.add_records(&page.results);
            info!(
                "Fetched page {} ({} monsters so far)",
                visited.len(),
                assembler.len()
            );

            if self.max_pages.is_some_and(|max| visited.len() >= max) {
                debug!("page limit reached");
                break;
            }
            next = page.next.filter(|n| !n.trim().is_empty());
        }

        Ok(assembler.finalize())
    }

    /// Attempt up to [`MAX_RETRY_ATTEMPTS`] fetches of one page.
    async fn fetch_with_retry(&self, url: &str) -> Result<RawPage> {
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                let sleep = self.backoff_step * attempt;
                debug!(attempt, sleep_ms = sleep.as_millis() as u64, "retrying page after back-off");
                tokio::time::sleep(sleep).await;
            }

            match self.source.fetch_page(url).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    warn!(attempt, error = %e, "page fetch failed");
                    last_err = e.to_string();
                }
            }
        }

        Err(EcologyError::SourceUnavailable {
            url: url.to_string(),
            reason: format!("{MAX_RETRY_ATTEMPTS} attempts failed; last error: {last_err}"),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
