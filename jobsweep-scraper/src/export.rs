//! Dated CSV export: one file per site per calendar day.
//!
//! A rerun on the same day produces the same file name and silently
//! overwrites the earlier output.

use crate::record::JobRecord;
use chrono::NaiveDate;
use jobsweep_common::{Result, SweepError};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Column order of the output file.
const HEADER: [&str; 4] = ["Title", "Company", "location", "link"];

/// Short site identifier derived from the configured URL: the
/// registrable-domain label, so `https://de.indeed.com/...` yields `indeed`
/// and `https://www.stepstone.de/...` yields `stepstone`.
pub fn site_fragment(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| SweepError::Export(format!("no host in url: {url}")))?;
    let labels: Vec<&str> = host.split('.').collect();
    let fragment = if labels.len() >= 2 {
        labels[labels.len() - 2]
    } else {
        host
    };
    if fragment.is_empty() {
        return Err(SweepError::Export(format!("unusable host in url: {url}")));
    }
    Ok(fragment.to_string())
}

/// Output file name for one run: `{site}-{DD}-{MM}-{YYYY}.csv`.
pub fn file_name(url: &Url, date: NaiveDate) -> Result<String> {
    Ok(format!(
        "{}-{}.csv",
        site_fragment(url)?,
        date.format("%d-%m-%Y")
    ))
}

/// Serialize the records as UTF-8 CSV under `path`, header row included.
pub fn write_records(path: &Path, records: &[JobRecord]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| SweepError::Export(e.to_string()))?;
    writer
        .write_record(HEADER)
        .map_err(|e| SweepError::Export(e.to_string()))?;
    for record in records {
        writer
            .write_record([
                record.title.as_str(),
                record.company.as_str(),
                record.location.as_str(),
                record.link.as_str(),
            ])
            .map_err(|e| SweepError::Export(e.to_string()))?;
    }
    writer.flush().map_err(|e| SweepError::Export(e.to_string()))?;
    debug!(path = %path.display(), rows = records.len(), "csv flushed");
    Ok(())
}

/// Write one run's records into `dir` and return the resulting path.
pub fn save(
    records: &[JobRecord],
    site_url: &str,
    dir: &str,
    date: NaiveDate,
) -> Result<PathBuf> {
    let url = Url::parse(site_url)
        .map_err(|e| SweepError::Export(format!("unparseable site url {site_url}: {e}")))?;
    let path = Path::new(dir).join(file_name(&url, date)?);
    write_records(&path, records)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn fragment_takes_the_registrable_label() {
        assert_eq!(
            site_fragment(&url("https://de.indeed.com/Jobs?q=x")).unwrap(),
            "indeed"
        );
        assert_eq!(
            site_fragment(&url("https://www.stepstone.de/jobs")).unwrap(),
            "stepstone"
        );
        assert_eq!(site_fragment(&url("http://localhost/x")).unwrap(), "localhost");
    }

    #[test]
    fn file_name_is_deterministic_for_a_date() {
        assert_eq!(
            file_name(&url("https://de.indeed.com/Jobs?q=x"), may_first()).unwrap(),
            "indeed-01-05-2024.csv"
        );
    }

    #[test]
    fn writes_header_and_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let records = vec![
            JobRecord {
                title: "Werkstudent Informatik".into(),
                company: "ACME GmbH".into(),
                location: "München".into(),
                link: "https://de.indeed.com/rc/clk?jk=a".into(),
            },
            JobRecord {
                title: "Working Student, Data".into(),
                company: "NA".into(),
                location: "München".into(),
                link: "https://de.indeed.com/rc/clk?jk=b".into(),
            },
        ];

        let path = save(
            &records,
            "https://de.indeed.com/Jobs?q=x",
            tmp.path().to_str().unwrap(),
            may_first(),
        )
        .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "indeed-01-05-2024.csv"
        );

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Title,Company,location,link");
        assert!(lines[1].starts_with("Werkstudent Informatik,ACME GmbH"));
    }

    #[test]
    fn header_is_written_even_without_records() {
        let tmp = tempfile::tempdir().unwrap();
        let path = save(
            &[],
            "https://de.indeed.com/Jobs",
            tmp.path().to_str().unwrap(),
            may_first(),
        )
        .unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), "Title,Company,location,link");
    }

    #[test]
    fn same_day_rerun_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_str().unwrap();
        let one = vec![JobRecord {
            title: "First".into(),
            company: "NA".into(),
            location: "NA".into(),
            link: "https://example.com/1".into(),
        }];
        save(&one, "https://de.indeed.com/Jobs", dir, may_first()).unwrap();
        save(&[], "https://de.indeed.com/Jobs", dir, may_first()).unwrap();

        let contents =
            std::fs::read_to_string(tmp.path().join("indeed-01-05-2024.csv")).unwrap();
        assert!(!contents.contains("First"));
    }
}
