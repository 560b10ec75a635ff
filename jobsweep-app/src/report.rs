//! Console summary printed after each run.

use jobsweep_scraper::record::JobRecord;

/// Human-readable run summary: a count line followed by one block per record.
pub fn summary(site: &str, records: &[JobRecord]) -> String {
    let mut out = format!("{site}: {} job(s) collected", records.len());
    for (i, record) in records.iter().enumerate() {
        out.push_str(&format!(
            "\n{:>4}. {} | {} ({})\n      {}",
            i + 1,
            record.title,
            record.company,
            record.location,
            record.link
        ));
    }
    out
}
