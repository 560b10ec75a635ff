use crate::sweep_browser::{
    behavioral::BehavioralEngine, fingerprint::BrowserProfile, stealth::StealthScripts,
};
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, Locator};
use jobsweep_common::StealthLevel;
use std::time::Duration;
use fantoccini::error::ErrorStatus;
use tracing::trace;

/// Polling interval for [`SweepPage::wait_clickable`].
const CLICKABLE_POLL: Duration = Duration::from_millis(250);

/// True when the error reports a DOM node that detached between locate and
/// read (the page re-rendered underneath us).
pub fn is_stale(err: &CmdError) -> bool {
    matches!(err, CmdError::Standard(w) if w.error == ErrorStatus::StaleElementReference)
}

/// True when the error only means "no matching element".
pub fn is_absent(err: &CmdError) -> bool {
    matches!(err, CmdError::Standard(w) if w.error == ErrorStatus::NoSuchElement)
}

/// High-level page wrapper providing element queries and bounded waits.
pub struct SweepPage {
    client: Client,
    stealth_level: StealthLevel,
    profile: BrowserProfile,
    behavioral: BehavioralEngine,
}

impl SweepPage {
    /// Construct a page wrapper around an existing WebDriver client.
    pub fn new(
        client: Client,
        stealth_level: StealthLevel,
        profile: BrowserProfile,
        behavioral: BehavioralEngine,
    ) -> Self {
        Self {
            client,
            stealth_level,
            profile,
            behavioral,
        }
    }

    /// Navigate to `url` and re-apply the evasion scripts.
    pub(crate) async fn goto(&self, url: &str) -> anyhow::Result<()> {
        self.behavioral.random_delay(300, 1200).await;
        self.client.goto(url).await?;
        self.apply_evasions().await?;
        Ok(())
    }

    /// Apply the JS evasions for the session's stealth tier.
    async fn apply_evasions(&self) -> anyhow::Result<()> {
        self.client
            .execute(StealthScripts::core_evasions(), vec![])
            .await?;

        match self.stealth_level {
            StealthLevel::Lightweight => {
                // No additional scripts for the lightest tier.
            }
            StealthLevel::Balanced => {
                self.client
                    .execute(&StealthScripts::identity_overrides(&self.profile), vec![])
                    .await?;
            }
            StealthLevel::Maximum => {
                self.client
                    .execute(&StealthScripts::identity_overrides(&self.profile), vec![])
                    .await?;
                self.client
                    .execute(&StealthScripts::webgl_overrides(&self.profile), vec![])
                    .await?;
            }
        }
        Ok(())
    }

    /// Return the current page URL.
    pub async fn current_url(&self) -> Result<String, CmdError> {
        self.client.current_url().await.map(|url| url.to_string())
    }

    /// Wait until the element matching `xpath` is present, displayed, and
    /// enabled, then return it. Gives up with [`CmdError::WaitTimeout`] once
    /// `timeout` elapses.
    pub async fn wait_clickable(
        &self,
        xpath: &str,
        timeout: Duration,
    ) -> Result<SweepElement, CmdError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.client.find(Locator::XPath(xpath)).await {
                Ok(el) => {
                    let displayed = el.is_displayed().await.unwrap_or(false);
                    let enabled = el.is_enabled().await.unwrap_or(false);
                    if displayed && enabled {
                        return Ok(SweepElement::new(el, &self.behavioral));
                    }
                    trace!(%xpath, displayed, enabled, "element present but not interactable yet");
                }
                Err(e) if is_absent(&e) => {}
                Err(e) => return Err(e),
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(CmdError::WaitTimeout);
            }
            tokio::time::sleep(CLICKABLE_POLL).await;
        }
    }

    /// Find zero or more elements by XPath.
    pub async fn find_all(&self, xpath: &str) -> Result<Vec<SweepElement>, CmdError> {
        let elements = self.client.find_all(Locator::XPath(xpath)).await?;
        Ok(elements
            .into_iter()
            .map(|element| SweepElement::new(element, &self.behavioral))
            .collect())
    }

    /// Whether at least one element matches `xpath` right now.
    pub async fn exists(&self, xpath: &str) -> Result<bool, CmdError> {
        Ok(!self.client.find_all(Locator::XPath(xpath)).await?.is_empty())
    }

    /// Pointer move-and-click gesture on `element`.
    pub async fn click(&self, element: &SweepElement) -> anyhow::Result<()> {
        self.behavioral
            .move_and_click(&self.client, &element.element)
            .await
    }
}

/// Wrapper for DOM elements providing the reads the scraper needs.
#[derive(Clone)]
pub struct SweepElement {
    pub element: Element,
    behavioral: BehavioralEngine,
}

impl SweepElement {
    pub fn new(element: Element, behavioral: &BehavioralEngine) -> Self {
        Self {
            element,
            behavioral: behavioral.clone(),
        }
    }

    /// Find a child element by a relative XPath.
    pub async fn find(&self, xpath: &str) -> Result<SweepElement, CmdError> {
        let element = self.element.find(Locator::XPath(xpath)).await?;
        Ok(SweepElement::new(element, &self.behavioral))
    }

    /// The element's visible text.
    pub async fn text(&self) -> Result<String, CmdError> {
        self.element.text().await
    }

    /// Read a raw attribute value.
    pub async fn attr(&self, attribute: &str) -> Result<Option<String>, CmdError> {
        self.element.attr(attribute).await
    }

    /// Read a DOM property value. For `href` this is the browser-resolved
    /// absolute URL, unlike the raw attribute.
    pub async fn prop(&self, property: &str) -> Result<Option<String>, CmdError> {
        self.element.prop(property).await
    }
}
