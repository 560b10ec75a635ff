use crate::sweep_browser::{
    behavioral::BehavioralEngine, fingerprint::BrowserProfile, page::SweepPage,
    stealth::build_stealth_arguments,
};
use anyhow::Result;
use fantoccini::{Client, ClientBuilder};
use jobsweep_common::StealthLevel;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;
use webdriver::capabilities::Capabilities;

/// Thin wrapper around a `fantoccini` WebDriver client with stealth and
/// behavioral helpers.
pub struct SweepDriver {
    pub client: Client,
    pub behavioral_engine: BehavioralEngine,
    pub profile: BrowserProfile,
    pub stealth_level: StealthLevel,
}

impl SweepDriver {
    /// Create a new driver connected to a running WebDriver service
    /// (Chromedriver at `http://localhost:9515` in the default setup).
    ///
    /// Fails when no WebDriver service answers at `webdriver_url`; nothing
    /// downstream can run without a session, so callers treat this as fatal.
    pub async fn new(
        webdriver_url: &str,
        headless: bool,
        stealth_level: StealthLevel,
    ) -> Result<Self> {
        let mut caps = Capabilities::new();
        let mut chrome_opts = HashMap::new();
        let profile = BrowserProfile::desktop_chrome();

        let mut args = build_stealth_arguments(stealth_level, &profile);
        if headless {
            args.push("--headless".to_string());
            args.push("--disable-gpu".to_string());
        }
        debug!(?stealth_level, headless, "launching browser session");
        chrome_opts.insert("args".to_string(), json!(args));
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await?;

        Ok(Self {
            client,
            behavioral_engine: BehavioralEngine::new(),
            profile,
            stealth_level,
        })
    }

    /// Navigate to `url` and return a [`SweepPage`] with the evasion scripts
    /// applied.
    pub async fn goto(&self, url: &str) -> Result<SweepPage> {
        let page = SweepPage::new(
            self.client.clone(),
            self.stealth_level,
            self.profile.clone(),
            self.behavioral_engine.clone(),
        );
        // Navigate via SweepPage so the evasions are applied consistently.
        page.goto(url).await?;
        Ok(page)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}
