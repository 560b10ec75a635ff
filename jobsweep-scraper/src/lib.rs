//! The scrape session core: everything between "browser is up" and "CSV is
//! on disk".
//!
//! - [`record`]: job records and the validation applied to raw DOM text
//! - [`port`]: the seam between session logic and the live browser
//! - [`session`]: the sequential per-site scrape run
//! - [`export`]: dated CSV output
pub mod export;
pub mod port;
pub mod record;
pub mod session;

pub use port::{BrowserPort, WebDriverPort};
pub use record::{CardSnapshot, JobRecord};
pub use session::ScrapeSession;
