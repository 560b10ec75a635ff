//! Loader for the per-site scraping configuration: YAML + environment overlays.
//!
//! A `jobsweep.yaml` file declares the sites to scrape (one locator set per
//! site), the pacing applied between page transitions, the output directory,
//! and the WebDriver endpoint. `JOBSWEEP_`-prefixed environment variables
//! override file values, and `${VAR}` references inside the file are expanded
//! before the merged result is validated.
//!
//! Every locator travels in the configuration; the session core never embeds
//! a site-specific string.
use config::{Config, ConfigError, Environment, File};
use jobsweep_common::StealthLevel;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use url::Url;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Errors surfaced while loading or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error(transparent)]
    Source(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration for one jobsweep process.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub driver: DriverSettings,
    #[serde(default)]
    pub pacing: PacingSettings,
    #[serde(default)]
    pub output: OutputSettings,
    pub sites: Vec<SiteSpec>,
}

impl SweepConfig {
    /// Look up a site bundle by its configured name.
    pub fn site(&self, name: &str) -> Option<&SiteSpec> {
        self.sites.iter().find(|s| s.name == name)
    }

    /// Reject configurations the session could not run against.
    ///
    /// Called by the loader, so a successfully loaded `SweepConfig` is always
    /// a usable one.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.sites.is_empty() {
            return Err(invalid("at least one site must be configured"));
        }
        for (i, site) in self.sites.iter().enumerate() {
            if site.name.trim().is_empty() {
                return Err(invalid(format!("sites[{i}]: name must not be empty")));
            }
            if self.sites.iter().filter(|s| s.name == site.name).count() > 1 {
                return Err(invalid(format!("duplicate site name '{}'", site.name)));
            }
            let url = Url::parse(&site.url)
                .map_err(|e| invalid(format!("site '{}': unparseable url: {e}", site.name)))?;
            if url.host_str().is_none() {
                return Err(invalid(format!("site '{}': url has no host", site.name)));
            }
            if site.default_location.trim().is_empty() {
                return Err(invalid(format!(
                    "site '{}': default_location must not be empty",
                    site.name
                )));
            }
            site.selectors
                .validate()
                .map_err(|field| invalid(format!("site '{}': selector '{field}' is empty", site.name)))?;
        }
        if self.pacing.page_delay_min_secs > self.pacing.page_delay_max_secs {
            return Err(invalid(
                "pacing: page_delay_min_secs must not exceed page_delay_max_secs",
            ));
        }
        if self.pacing.stale_retries == 0 {
            return Err(invalid("pacing: stale_retries must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigLoadError {
    ConfigLoadError::Invalid(msg.into())
}

/// Connection settings for the WebDriver service.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverSettings {
    /// Endpoint of a running WebDriver service (Chromedriver by default).
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default)]
    pub stealth: StealthLevel,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: true,
            stealth: StealthLevel::default(),
        }
    }
}

/// Waits and delays applied while driving a site.
///
/// The bounded waits keep a hung page from blocking the process forever; the
/// randomized inter-page delay breaks the constant cadence an automated run
/// would otherwise show.
#[derive(Debug, Clone, Deserialize)]
pub struct PacingSettings {
    /// Longest wait for the cookie-consent control to become clickable.
    #[serde(default = "default_cookie_wait")]
    pub cookie_wait_secs: u64,
    /// Longest wait for a numbered page control to become clickable.
    #[serde(default = "default_page_click_wait")]
    pub page_click_wait_secs: u64,
    /// Bounds of the randomized pause before each page transition.
    #[serde(default = "default_page_delay_min")]
    pub page_delay_min_secs: u64,
    #[serde(default = "default_page_delay_max")]
    pub page_delay_max_secs: u64,
    /// Fixed pause after each page extraction; 0 disables it.
    #[serde(default)]
    pub settle_secs: u64,
    /// Attempts at collecting a page's containers when the DOM goes stale.
    #[serde(default = "default_stale_retries")]
    pub stale_retries: u32,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            cookie_wait_secs: default_cookie_wait(),
            page_click_wait_secs: default_page_click_wait(),
            page_delay_min_secs: default_page_delay_min(),
            page_delay_max_secs: default_page_delay_max(),
            settle_secs: 0,
            stale_retries: default_stale_retries(),
        }
    }
}

/// Where run output lands.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// One scrape target: a results URL plus the locators describing its DOM.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSpec {
    pub name: String,
    pub url: String,
    /// Fallback locality written when a card has no readable location.
    #[serde(default = "default_locality")]
    pub default_location: String,
    /// Whether the run's records are written to the dated CSV file.
    #[serde(default = "default_true")]
    pub save_csv: bool,
    pub selectors: SelectorSet,
}

/// The XPath locators for one site.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorSet {
    /// Matches one element per job card.
    pub container: String,
    /// Evaluated relative to each card.
    pub title: String,
    pub link: String,
    pub company: String,
    pub location: String,
    /// Absolute locator for the cookie-consent control.
    pub cookie_accept: String,
    /// Base locator for the numbered page controls; the session appends a
    /// `[contains(text(), 'N')]` predicate when clicking page N.
    pub pagination: String,
    /// Optional locator for the site's own error container; a page showing it
    /// is skipped.
    #[serde(default)]
    pub error_banner: Option<String>,
}

impl SelectorSet {
    fn validate(&self) -> Result<(), &'static str> {
        let required: [(&'static str, &str); 7] = [
            ("container", &self.container),
            ("title", &self.title),
            ("link", &self.link),
            ("company", &self.company),
            ("location", &self.location),
            ("cookie_accept", &self.cookie_accept),
            ("pagination", &self.pagination),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(field);
            }
        }
        Ok(())
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_output_dir() -> String {
    ".".into()
}
fn default_locality() -> String {
    "NA".into()
}
fn default_true() -> bool {
    true
}
fn default_cookie_wait() -> u64 {
    60
}
fn default_page_click_wait() -> u64 {
    38
}
fn default_page_delay_min() -> u64 {
    3
}
fn default_page_delay_max() -> u64 {
    8
}
fn default_stale_retries() -> u32 {
    3
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML file + env overrides).
pub struct SweepConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SweepConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepConfigLoader {
    /// Start with sensible defaults: YAML file + `JOBSWEEP_` env overrides.
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("JOBSWEEP").separator("__"));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self.builder.add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet, mostly useful for tests and doctests.
    ///
    /// ```
    /// use jobsweep_config::SweepConfigLoader;
    ///
    /// let cfg = SweepConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// version: "1"
    /// sites:
    ///   - name: indeed
    ///     url: "https://de.indeed.com/jobs?q=werkstudent"
    ///     default_location: "München"
    ///     selectors:
    ///       container: "//td[div[h2]]"
    ///       title: ".//h2/a/span"
    ///       link: ".//h2/a"
    ///       company: ".//span[@data-testid='company-name']"
    ///       location: ".//div[@data-testid='text-location']"
    ///       cookie_accept: "//button[contains(text(), 'Alle Cookies')]"
    ///       pagination: "//nav//li/a"
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.sites.len(), 1);
    /// assert!(cfg.driver.headless);
    /// assert_eq!(cfg.pacing.cookie_wait_secs, 60);
    /// assert_eq!(cfg.sites[0].default_location, "München");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into a
    /// validated [`SweepConfig`].
    ///
    /// The loader combines the YAML sources with `JOBSWEEP_`-prefixed
    /// environment variables and expands `${VAR}` placeholders before
    /// materialising the typed configuration.
    pub fn load(self) -> Result<SweepConfig, ConfigLoadError> {
        let cfg = self.builder.build()?;

        // Deserialize to a loose tree first so env expansion can walk it.
        let mut v: Value = cfg.try_deserialize().map_err(ConfigLoadError::Source)?;
        expand_env_in_value(&mut v);

        let typed: SweepConfig = serde_json::from_value(v)
            .map_err(|e| ConfigLoadError::Source(ConfigError::Message(e.to_string())))?;

        typed.validate()?;
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_yaml(url: &str) -> String {
        format!(
            r#"
sites:
  - name: indeed
    url: "{url}"
    selectors:
      container: "//td[div[h2]]"
      title: ".//h2/a/span"
      link: ".//h2/a"
      company: ".//span[@data-testid='company-name']"
      location: ".//div[@data-testid='text-location']"
      cookie_accept: "//button[contains(text(), 'Alle Cookies')]"
      pagination: "//nav//li/a"
"#
        )
    }

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("SWEEP_CITY", Some("munich"), || {
            let mut v = json!("q=werkstudent&l=${SWEEP_CITY}");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("q=werkstudent&l=munich"));
        });
    }

    #[test]
    fn expands_in_nested_structures() {
        temp_env::with_vars([("SEL_TAG", Some("h2")), ("SEL_ATTR", Some("href"))], || {
            let mut v = json!({
                "selectors": [".//${SEL_TAG}/a", { "attr": "${SEL_ATTR}" }],
                "pages": 3,
                "headless": true
            });
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!({
                    "selectors": [".//h2/a", { "attr": "href" }],
                    "pages": 3,
                    "headless": true
                })
            );
        });
    }

    #[test]
    fn expansion_terminates_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("//button[@id='${DOES_NOT_EXIST}']");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("//button[@id='${DOES_NOT_EXIST}']"));
    }

    #[test]
    fn defaults_are_applied() {
        let cfg = SweepConfigLoader::new()
            .with_yaml_str(&minimal_yaml("https://de.indeed.com/jobs?q=werkstudent"))
            .load()
            .expect("minimal config loads");
        assert_eq!(cfg.driver.webdriver_url, "http://localhost:9515");
        assert!(cfg.driver.headless);
        assert_eq!(cfg.pacing.page_click_wait_secs, 38);
        assert_eq!(cfg.pacing.page_delay_min_secs, 3);
        assert_eq!(cfg.pacing.page_delay_max_secs, 8);
        assert_eq!(cfg.pacing.stale_retries, 3);
        assert_eq!(cfg.output.dir, ".");
        assert_eq!(cfg.sites[0].default_location, "NA");
        assert!(cfg.sites[0].save_csv);
        assert!(cfg.sites[0].selectors.error_banner.is_none());
    }

    #[test]
    fn rejects_unparseable_site_url() {
        let err = SweepConfigLoader::new()
            .with_yaml_str(&minimal_yaml("not a url"))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_selector() {
        let yaml = minimal_yaml("https://de.indeed.com/jobs").replace(".//h2/a/span", "");
        let err = SweepConfigLoader::new().with_yaml_str(&yaml).load().unwrap_err();
        assert!(matches!(err, ConfigLoadError::Invalid(msg) if msg.contains("title")));
    }

    #[test]
    fn rejects_inverted_page_delay_bounds() {
        let yaml = format!(
            "{}pacing:\n  page_delay_min_secs: 9\n  page_delay_max_secs: 2\n",
            minimal_yaml("https://de.indeed.com/jobs")
        );
        let err = SweepConfigLoader::new().with_yaml_str(&yaml).load().unwrap_err();
        assert!(matches!(err, ConfigLoadError::Invalid(msg) if msg.contains("page_delay")));
    }

    #[test]
    fn site_lookup_by_name() {
        let cfg = SweepConfigLoader::new()
            .with_yaml_str(&minimal_yaml("https://de.indeed.com/jobs"))
            .load()
            .unwrap();
        assert!(cfg.site("indeed").is_some());
        assert!(cfg.site("stepstone").is_none());
    }
}
