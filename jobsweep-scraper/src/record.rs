//! Job records and the validation applied to raw DOM text.
//!
//! Everything read out of the page is untrusted: whitespace-padded, possibly
//! empty, possibly a relative URL. Raw reads arrive as a [`CardSnapshot`] and
//! only leave as a [`JobRecord`] once the field contract holds.

use url::Url;

/// Company value written when a card has no readable company element.
pub const COMPANY_FALLBACK: &str = "NA";

/// One extracted job listing. Construction goes through
/// [`JobRecord::from_card`]; a record never holds an empty required field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
}

/// Raw field reads from one job container. `None` means the child element was
/// missing or unreadable; what that implies per field is decided in
/// [`JobRecord::from_card`], not at the DOM.
#[derive(Debug, Clone, Default)]
pub struct CardSnapshot {
    pub title: Option<String>,
    pub link: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
}

/// A required field was absent; the one record is skipped, never the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Title,
    Link,
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingField::Title => write!(f, "title"),
            MissingField::Link => write!(f, "link"),
        }
    }
}

impl JobRecord {
    /// Validate one card against the field contract.
    ///
    /// Title and link are required; a value that is missing or empty after
    /// normalization skips the record. Company falls back to
    /// [`COMPANY_FALLBACK`], location to the site's default locality. The
    /// link is resolved to an absolute URL, against `base` when relative.
    pub fn from_card(
        card: CardSnapshot,
        default_location: &str,
        base: Option<&Url>,
    ) -> Result<JobRecord, MissingField> {
        let title = card
            .title
            .as_deref()
            .map(normalize_text)
            .filter(|t| !t.is_empty())
            .ok_or(MissingField::Title)?;

        let link = card
            .link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .and_then(|l| absolutize(l, base))
            .ok_or(MissingField::Link)?;

        let company = card
            .company
            .as_deref()
            .map(normalize_text)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| COMPANY_FALLBACK.to_string());

        let location = card
            .location
            .as_deref()
            .map(normalize_text)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| default_location.to_string());

        Ok(JobRecord {
            title,
            company,
            location,
            link,
        })
    }
}

/// Collapse runs of whitespace (including newlines inside a card) to single
/// spaces and trim the ends.
fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// An already-absolute link passes through; a relative one is joined against
/// `base`. Unresolvable links count as missing.
fn absolutize(link: &str, base: Option<&Url>) -> Option<String> {
    if let Ok(url) = Url::parse(link) {
        return Some(url.to_string());
    }
    base.and_then(|b| b.join(link).ok()).map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_card() -> CardSnapshot {
        CardSnapshot {
            title: Some("Werkstudent Informatik (m/w/d)".into()),
            link: Some("https://de.indeed.com/rc/clk?jk=abc".into()),
            company: Some("ACME GmbH".into()),
            location: Some("München".into()),
        }
    }

    #[test]
    fn full_card_passes_through() {
        let record = JobRecord::from_card(full_card(), "München", None).unwrap();
        assert_eq!(record.title, "Werkstudent Informatik (m/w/d)");
        assert_eq!(record.company, "ACME GmbH");
        assert_eq!(record.location, "München");
        assert_eq!(record.link, "https://de.indeed.com/rc/clk?jk=abc");
    }

    #[test]
    fn missing_title_skips_the_record() {
        let card = CardSnapshot {
            title: None,
            ..full_card()
        };
        assert_eq!(
            JobRecord::from_card(card, "München", None),
            Err(MissingField::Title)
        );
    }

    #[test]
    fn whitespace_only_title_counts_as_missing() {
        let card = CardSnapshot {
            title: Some("  \n\t ".into()),
            ..full_card()
        };
        assert_eq!(
            JobRecord::from_card(card, "München", None),
            Err(MissingField::Title)
        );
    }

    #[test]
    fn missing_company_falls_back_to_sentinel() {
        let card = CardSnapshot {
            company: None,
            ..full_card()
        };
        let record = JobRecord::from_card(card, "München", None).unwrap();
        assert_eq!(record.company, "NA");
    }

    #[test]
    fn missing_location_falls_back_to_default_locality() {
        let card = CardSnapshot {
            location: Some("".into()),
            ..full_card()
        };
        let record = JobRecord::from_card(card, "München", None).unwrap();
        assert_eq!(record.location, "München");
        assert!(!record.location.is_empty());
    }

    #[test]
    fn inner_whitespace_is_collapsed() {
        let card = CardSnapshot {
            title: Some("Werkstudent\n  Informatik".into()),
            ..full_card()
        };
        let record = JobRecord::from_card(card, "München", None).unwrap();
        assert_eq!(record.title, "Werkstudent Informatik");
    }

    #[test]
    fn relative_link_resolves_against_base() {
        let base = Url::parse("https://de.indeed.com/Jobs?q=x").unwrap();
        let card = CardSnapshot {
            link: Some("/rc/clk?jk=abc".into()),
            ..full_card()
        };
        let record = JobRecord::from_card(card, "München", Some(&base)).unwrap();
        assert_eq!(record.link, "https://de.indeed.com/rc/clk?jk=abc");
    }

    #[test]
    fn relative_link_without_base_counts_as_missing() {
        let card = CardSnapshot {
            link: Some("/rc/clk?jk=abc".into()),
            ..full_card()
        };
        assert_eq!(
            JobRecord::from_card(card, "München", None),
            Err(MissingField::Link)
        );
    }
}
