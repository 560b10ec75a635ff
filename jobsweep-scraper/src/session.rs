//! The scrape session: one sequential browser run over one configured site.
//!
//! Control flow is a single await chain. Navigate, dismiss the cookie banner,
//! read the page count, then walk the pages extracting cards; every transient
//! failure degrades to a log line and the run keeps going. The browser is the
//! only resource, and it is released on every exit path.

use crate::export;
use crate::port::BrowserPort;
use crate::record::{CardSnapshot, JobRecord};
use chrono::Local;
use jobsweep_common::{Result, SweepError};
use jobsweep_config::{OutputSettings, PacingSettings, SiteSpec};
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

/// Largest page label accepted from a pagination control. Numeric tokens
/// above this are some other number the site renders (result counts,
/// tracking ids), not a page.
const MAX_PLAUSIBLE_PAGES: u32 = 500;

/// One scrape run over one site. Owns the browser port for its lifetime.
pub struct ScrapeSession {
    site: SiteSpec,
    pacing: PacingSettings,
    output: OutputSettings,
    port: Box<dyn BrowserPort>,
}

impl ScrapeSession {
    pub fn new(
        site: SiteSpec,
        pacing: PacingSettings,
        output: OutputSettings,
        port: Box<dyn BrowserPort>,
    ) -> Self {
        Self {
            site,
            pacing,
            output,
            port,
        }
    }

    /// Drive the full session and return every record collected.
    ///
    /// Saving happens before teardown when the site enables it; the browser
    /// is released afterwards regardless of how the run went.
    pub async fn run(mut self) -> Result<Vec<JobRecord>> {
        let outcome = self.drive().await;

        match &outcome {
            Ok(records) => {
                if self.site.save_csv {
                    let today = Local::now().date_naive();
                    match export::save(records, &self.site.url, &self.output.dir, today) {
                        Ok(path) => {
                            info!(site = %self.site.name, path = %path.display(), records = records.len(), "results written")
                        }
                        Err(e) => {
                            error!(site = %self.site.name, error = %e, "failed to write results")
                        }
                    }
                } else {
                    info!(site = %self.site.name, records = records.len(), "saving disabled for this site");
                }
            }
            Err(e) => error!(site = %self.site.name, error = %e, "scrape run failed"),
        }

        if let Err(e) = self.port.close().await {
            warn!(site = %self.site.name, error = %e, "browser session did not shut down cleanly");
        }
        outcome
    }

    async fn drive(&mut self) -> Result<Vec<JobRecord>> {
        info!(site = %self.site.name, url = %self.site.url, "starting scrape session");
        self.port.navigate(&self.site.url).await?;
        self.accept_cookie().await;

        let total = self.count_pages().await;
        info!(site = %self.site.name, pages = total, "result pages detected");

        // Page 1 is already loaded after navigation and is never re-clicked;
        // controls are clicked for labels 2..=total.
        let mut records = Vec::new();
        for page in 1..=total {
            if page > 1 {
                self.port
                    .pause(
                        Duration::from_secs(self.pacing.page_delay_min_secs),
                        Duration::from_secs(self.pacing.page_delay_max_secs),
                    )
                    .await;
            }
            if self.error_state().await {
                warn!(site = %self.site.name, page, "site error banner shown; skipping this page");
                continue;
            }
            if page > 1 {
                self.next_page(page).await;
            }

            let mut found = self.extract_page().await;
            info!(site = %self.site.name, page, records = found.len(), "page extracted");
            records.append(&mut found);

            if self.pacing.settle_secs > 0 {
                let settle = Duration::from_secs(self.pacing.settle_secs);
                self.port.pause(settle, settle).await;
            }
        }
        Ok(records)
    }

    /// Cookie banner absence is normal; failure to dismiss one only warns.
    async fn accept_cookie(&mut self) {
        let timeout = Duration::from_secs(self.pacing.cookie_wait_secs);
        match self
            .port
            .click_when_clickable(&self.site.selectors.cookie_accept, timeout)
            .await
        {
            Ok(()) => info!(site = %self.site.name, "cookie banner dismissed"),
            Err(e) => warn!(site = %self.site.name, error = %e, "cookie banner not dismissed"),
        }
    }

    /// Number of result pages: the maximum numeric label on the pagination
    /// control, or 1 when the site renders no numeric pagination at all
    /// (single-page result sets).
    async fn count_pages(&mut self) -> u32 {
        let labels = match self
            .port
            .pagination_labels(&self.site.selectors.pagination)
            .await
        {
            Ok(labels) => labels,
            Err(e) => {
                warn!(site = %self.site.name, error = %e, "pagination control unreadable; assuming a single page");
                return 1;
            }
        };
        max_numeric_label(&labels).unwrap_or(1)
    }

    /// Click the control labeled `page`. Failure is non-fatal; extraction
    /// proceeds on whatever page is currently loaded.
    async fn next_page(&mut self, page: u32) {
        let locator = page_locator(&self.site.selectors.pagination, page);
        info!(site = %self.site.name, page, "navigating to the next page");
        let timeout = Duration::from_secs(self.pacing.page_click_wait_secs);
        if let Err(e) = self.port.click_when_clickable(&locator, timeout).await {
            warn!(site = %self.site.name, page, error = %e, "page control not clickable; staying on the current page");
        }
    }

    /// Collect and validate the cards on the current page.
    ///
    /// A stale node set restarts the collection from scratch, up to the
    /// configured retry bound; each attempt re-fetches the container list, so
    /// a successful attempt alone determines the result. After the last stale
    /// attempt the page yields nothing rather than failing the run.
    async fn extract_page(&mut self) -> Vec<JobRecord> {
        let base = self.base_url().await;
        for attempt in 1..=self.pacing.stale_retries {
            match self.port.collect_cards(&self.site.selectors).await {
                Ok(cards) => return self.validate_cards(cards, base.as_ref()),
                Err(SweepError::StaleDom(what)) => {
                    warn!(site = %self.site.name, attempt, what = %what, "stale element set; re-collecting");
                }
                Err(e) => {
                    warn!(site = %self.site.name, error = %e, "container collection failed; skipping this page");
                    return Vec::new();
                }
            }
        }
        warn!(
            site = %self.site.name,
            retries = self.pacing.stale_retries,
            "page kept re-rendering; giving up on it"
        );
        Vec::new()
    }

    fn validate_cards(&self, cards: Vec<CardSnapshot>, base: Option<&Url>) -> Vec<JobRecord> {
        let mut records = Vec::with_capacity(cards.len());
        for card in cards {
            match JobRecord::from_card(card, &self.site.default_location, base) {
                Ok(record) => records.push(record),
                Err(missing) => {
                    warn!(site = %self.site.name, field = %missing, "card missing required field; record skipped")
                }
            }
        }
        records
    }

    /// Base URL for resolving relative links, read from the live page so
    /// redirects are accounted for; falls back to the configured URL.
    async fn base_url(&mut self) -> Option<Url> {
        match self.port.page_url().await {
            Ok(raw) => Url::parse(&raw).ok(),
            Err(_) => Url::parse(&self.site.url).ok(),
        }
    }

    async fn error_state(&mut self) -> bool {
        let Some(banner) = self.site.selectors.error_banner.clone() else {
            return false;
        };
        match self.port.error_banner_present(&banner).await {
            Ok(present) => present,
            Err(e) => {
                warn!(site = %self.site.name, error = %e, "error banner check failed; assuming none");
                false
            }
        }
    }
}

/// Largest numeric token among the pagination labels. Non-numeric labels
/// ("Next", "Weiter", ellipses) and implausibly large numbers are ignored.
fn max_numeric_label(labels: &[String]) -> Option<u32> {
    labels
        .iter()
        .filter_map(|label| label.trim().parse::<u32>().ok())
        .filter(|n| (1..=MAX_PLAUSIBLE_PAGES).contains(n))
        .max()
}

/// Locator for the pagination element carrying the given page label, built
/// from the site's base pagination locator.
fn page_locator(pagination: &str, page: u32) -> String {
    format!("{pagination}[contains(text(), '{page}')]")
}
