//! Common types shared across the jobsweep workspace.
//!
//! This crate defines the error taxonomy, the shared result alias, the
//! observability helpers, and the small enums the other crates agree on. It is
//! intentionally lightweight so every crate can depend on it without pulling
//! in the WebDriver or export stacks.
//!
//! # Overview
//!
//! - [`SweepError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`StealthLevel`]: anti-detection tier requested from the driver layer
//!
//! # Examples
//!
//! ```rust
//! use jobsweep_common::StealthLevel;
//!
//! assert_eq!(StealthLevel::default(), StealthLevel::Balanced);
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Anti-detection tier requested for a browser session.
///
/// The scraper only asks for a tier; which launch arguments and page scripts
/// implement it is the driver layer's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthLevel {
    Lightweight,
    Balanced,
    Maximum,
}

impl Default for StealthLevel {
    fn default() -> Self {
        StealthLevel::Balanced
    }
}

/// Error types used across the jobsweep system.
#[derive(thiserror::Error, Debug)]
pub enum SweepError {
    /// The WebDriver session could not be started, or an operation on it
    /// failed in a way the session cannot absorb.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The DOM re-rendered between locating elements and reading them.
    #[error("Stale DOM while reading '{0}'")]
    StaleDom(String),

    /// A bounded wait for an interactable element elapsed.
    #[error("Timed out waiting for '{0}'")]
    Timeout(String),

    /// Writing the collected records failed.
    #[error("Export error: {0}")]
    Export(String),
}

/// Convenient alias for results that use [`SweepError`].
pub type Result<T> = std::result::Result<T, SweepError>;
