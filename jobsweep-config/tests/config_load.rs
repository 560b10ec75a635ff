use jobsweep_config::SweepConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const TWO_SITE_YAML: &str = r#"
version: "1"
driver:
  webdriver_url: "http://localhost:9515"
  headless: true
  stealth: maximum
pacing:
  settle_secs: 2
output:
  dir: "runs"
sites:
  - name: indeed
    url: "https://de.indeed.com/Jobs?q=werkstudent+informatik&l=m%C3%BCnchen"
    default_location: "München"
    selectors:
      container: "//tr/td[@class='resultContent'][div[h2]]"
      title: ".//h2/a/span"
      link: ".//h2/a"
      company: ".//div/div/span[@data-testid='company-name']"
      location: ".//div/div[@data-testid='text-location']"
      cookie_accept: "//button[contains(text(), 'Alle Cookies')]"
      pagination: "//nav[@role='navigation']//li/a"
      error_banner: "//main[@class='error']"
  - name: stepstone
    url: "https://www.stepstone.de/jobs/werkstudent?token=${STEPSTONE_TOKEN}"
    default_location: "Berlin"
    save_csv: false
    selectors:
      container: "//article[@data-testid='job-item']"
      title: ".//h2/a"
      link: ".//h2/a"
      company: ".//span[@data-at='job-item-company-name']"
      location: ".//span[@data-at='job-item-location']"
      cookie_accept: "//button[@id='ccmgt_explicit_accept']"
      pagination: "//nav[@aria-label='pagination']//a"
"#;

#[test]
#[serial]
fn loads_two_sites_with_env_expansion() {
    temp_env::with_var("STEPSTONE_TOKEN", Some("abc123"), || {
        let tmp = TempDir::new().unwrap();
        let p = write_yaml(&tmp, "jobsweep.yaml", TWO_SITE_YAML);

        let cfg = SweepConfigLoader::new()
            .with_file(p)
            .load()
            .expect("load sweep config");

        assert_eq!(cfg.sites.len(), 2);
        assert_eq!(cfg.output.dir, "runs");
        assert_eq!(cfg.pacing.settle_secs, 2);

        let indeed = cfg.site("indeed").expect("indeed configured");
        assert_eq!(indeed.default_location, "München");
        assert!(indeed.save_csv);
        assert_eq!(
            indeed.selectors.error_banner.as_deref(),
            Some("//main[@class='error']")
        );

        let stepstone = cfg.site("stepstone").expect("stepstone configured");
        assert!(!stepstone.save_csv);
        assert!(stepstone.url.ends_with("token=abc123"));
    });
}

#[test]
#[serial]
fn rejects_duplicate_site_names() {
    let tmp = TempDir::new().unwrap();
    let yaml = TWO_SITE_YAML.replace("name: stepstone", "name: indeed");
    let p = write_yaml(&tmp, "jobsweep.yaml", &yaml);

    let err = SweepConfigLoader::new().with_file(p).load().unwrap_err();
    assert!(err.to_string().contains("duplicate site name"));
}

#[test]
#[serial]
fn rejects_empty_site_list() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "jobsweep.yaml", "version: \"1\"\nsites: []\n");

    let err = SweepConfigLoader::new().with_file(p).load().unwrap_err();
    assert!(err.to_string().contains("at least one site"));
}
