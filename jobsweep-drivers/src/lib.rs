//! Driver layer for browser automation.
//!
//! Wraps a `fantoccini` WebDriver client with the anti-detection measures the
//! scraper requests: launch arguments, page-load JS evasions, a plausible
//! desktop fingerprint, and human-like pacing for clicks and page turns.
//!
//! - [`sweep_browser::driver::SweepDriver`]: WebDriver client wrapper
//! - [`sweep_browser::page::SweepPage`]: DOM helpers (bounded waits, XPath queries)
//! - [`sweep_browser::behavioral::BehavioralEngine`]: randomized pacing and pointer gestures
//! - [`sweep_browser::stealth`]: stealth launch arguments and JS evasions
pub mod sweep_browser;
