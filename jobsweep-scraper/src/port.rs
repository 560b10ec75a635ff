//! The seam between session logic and the live browser.
//!
//! [`BrowserPort`] captures exactly the operations a scrape run performs, so
//! the session can be exercised against a scripted implementation in tests.
//! [`WebDriverPort`] is the live implementation backed by the fantoccini
//! driver wrapper.

use crate::record::CardSnapshot;
use async_trait::async_trait;
use fantoccini::error::CmdError;
use jobsweep_common::{Result, StealthLevel, SweepError};
use jobsweep_config::SelectorSet;
use jobsweep_drivers::sweep_browser::driver::SweepDriver;
use jobsweep_drivers::sweep_browser::page::{SweepElement, SweepPage, is_stale};
use std::time::Duration;

/// The operations the scrape session needs from a browser.
#[async_trait]
pub trait BrowserPort: Send {
    /// Load the target URL in the session's tab.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Current page URL, used to resolve relative links.
    async fn page_url(&mut self) -> Result<String>;

    /// Wait until the element matching `xpath` is interactable, then perform
    /// a pointer move-and-click gesture on it.
    async fn click_when_clickable(&mut self, xpath: &str, timeout: Duration) -> Result<()>;

    /// Visible texts of every element matching the pagination locator.
    async fn pagination_labels(&mut self, xpath: &str) -> Result<Vec<String>>;

    /// Whether the site currently renders its error container.
    async fn error_banner_present(&mut self, xpath: &str) -> Result<bool>;

    /// One raw snapshot per job container, in document order. Fails with
    /// [`SweepError::StaleDom`] when the node set detaches mid-read; callers
    /// re-collect from scratch.
    async fn collect_cards(&mut self, selectors: &SelectorSet) -> Result<Vec<CardSnapshot>>;

    /// Randomized pause between page turns.
    async fn pause(&mut self, min: Duration, max: Duration);

    /// Release the underlying browser. Called exactly once, on every exit
    /// path of a run.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Map a WebDriver error onto the session's taxonomy.
fn classify(what: &str, err: CmdError) -> SweepError {
    if is_stale(&err) {
        SweepError::StaleDom(what.to_string())
    } else if matches!(err, CmdError::WaitTimeout) {
        SweepError::Timeout(what.to_string())
    } else {
        SweepError::Driver(err.into())
    }
}

/// Live port backed by the fantoccini driver wrapper.
pub struct WebDriverPort {
    driver: SweepDriver,
    page: Option<SweepPage>,
}

impl WebDriverPort {
    /// Start a browser session against a running WebDriver service.
    pub async fn connect(
        webdriver_url: &str,
        headless: bool,
        stealth: StealthLevel,
    ) -> Result<Self> {
        let driver = SweepDriver::new(webdriver_url, headless, stealth)
            .await
            .map_err(SweepError::Driver)?;
        Ok(Self { driver, page: None })
    }

    fn page(&self) -> Result<&SweepPage> {
        self.page
            .as_ref()
            .ok_or_else(|| SweepError::Driver(anyhow::anyhow!("no page loaded yet")))
    }
}

#[async_trait]
impl BrowserPort for WebDriverPort {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let page = self.driver.goto(url).await.map_err(SweepError::Driver)?;
        self.page = Some(page);
        Ok(())
    }

    async fn page_url(&mut self) -> Result<String> {
        self.page()?
            .current_url()
            .await
            .map_err(|e| classify("current url", e))
    }

    async fn click_when_clickable(&mut self, xpath: &str, timeout: Duration) -> Result<()> {
        let page = self.page()?;
        let element = page
            .wait_clickable(xpath, timeout)
            .await
            .map_err(|e| classify(xpath, e))?;
        page.click(&element).await.map_err(SweepError::Driver)
    }

    async fn pagination_labels(&mut self, xpath: &str) -> Result<Vec<String>> {
        let page = self.page()?;
        let elements = page.find_all(xpath).await.map_err(|e| classify(xpath, e))?;
        let mut labels = Vec::with_capacity(elements.len());
        for element in elements {
            // An unreadable label is no label; staleness here resolves itself
            // on the next operation.
            if let Ok(text) = element.text().await {
                labels.push(text);
            }
        }
        Ok(labels)
    }

    async fn error_banner_present(&mut self, xpath: &str) -> Result<bool> {
        self.page()?
            .exists(xpath)
            .await
            .map_err(|e| classify(xpath, e))
    }

    async fn collect_cards(&mut self, selectors: &SelectorSet) -> Result<Vec<CardSnapshot>> {
        let page = self.page()?;
        let containers = page
            .find_all(&selectors.container)
            .await
            .map_err(|e| classify(&selectors.container, e))?;

        let mut cards = Vec::with_capacity(containers.len());
        for container in &containers {
            cards.push(CardSnapshot {
                title: read_text(container, &selectors.title).await?,
                link: read_link(container, &selectors.link).await?,
                company: read_text(container, &selectors.company).await?,
                location: read_text(container, &selectors.location).await?,
            });
        }
        Ok(cards)
    }

    async fn pause(&mut self, min: Duration, max: Duration) {
        self.driver
            .behavioral_engine
            .random_delay(min.as_millis() as u64, max.as_millis() as u64)
            .await;
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.driver.close().await.map_err(SweepError::Driver)
    }
}

/// Text of a child element. Absent or unreadable children become `None`;
/// staleness bubbles up so the whole collection restarts.
async fn read_text(container: &SweepElement, xpath: &str) -> Result<Option<String>> {
    match container.find(xpath).await {
        Ok(child) => match child.text().await {
            Ok(text) => Ok(Some(text)),
            Err(e) if is_stale(&e) => Err(SweepError::StaleDom(xpath.to_string())),
            Err(_) => Ok(None),
        },
        Err(e) if is_stale(&e) => Err(SweepError::StaleDom(xpath.to_string())),
        Err(_) => Ok(None),
    }
}

/// Link of a child element: the browser-resolved `href` property when
/// available, the raw attribute otherwise.
async fn read_link(container: &SweepElement, xpath: &str) -> Result<Option<String>> {
    let child = match container.find(xpath).await {
        Ok(child) => child,
        Err(e) if is_stale(&e) => return Err(SweepError::StaleDom(xpath.to_string())),
        Err(_) => return Ok(None),
    };
    match child.prop("href").await {
        Ok(Some(href)) => Ok(Some(href)),
        Ok(None) => match child.attr("href").await {
            Ok(href) => Ok(href),
            Err(e) if is_stale(&e) => Err(SweepError::StaleDom(xpath.to_string())),
            Err(_) => Ok(None),
        },
        Err(e) if is_stale(&e) => Err(SweepError::StaleDom(xpath.to_string())),
        Err(_) => Ok(None),
    }
}
