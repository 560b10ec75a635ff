use anyhow::{Context, Result, bail};
use clap::Parser;
use jobsweep_common::observability::{LogConfig, init_logging};
use jobsweep_config::{SweepConfig, SweepConfigLoader};
use jobsweep_scraper::port::WebDriverPort;
use jobsweep_scraper::session::ScrapeSession;
use tracing::{error, info};

mod report;

/// Browser-driven job listing harvester.
#[derive(Parser, Debug)]
#[command(name = "jobsweep", version, about)]
struct Cli {
    /// Path to the site configuration file.
    #[arg(long, default_value = "jobsweep.yaml")]
    config: std::path::PathBuf,

    /// Only scrape the named site (default: every configured site, in order).
    #[arg(long)]
    site: Option<String>,

    /// Override the configured WebDriver endpoint.
    #[arg(long)]
    webdriver_url: Option<String>,

    /// Force a visible browser window regardless of configuration.
    #[arg(long)]
    headed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg: SweepConfig = SweepConfigLoader::new()
        .with_file(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(url) = cli.webdriver_url {
        cfg.driver.webdriver_url = url;
    }
    if cli.headed {
        cfg.driver.headless = false;
    }

    let log_path = init_logging(LogConfig {
        emit_stderr: true,
        ..LogConfig::default()
    })?;
    info!(log = %log_path.display(), "logging initialised");

    let selected = match &cli.site {
        Some(name) => match cfg.site(name) {
            Some(site) => vec![site.clone()],
            None => bail!("unknown site '{name}' (configured: {})", site_names(&cfg)),
        },
        None => cfg.sites.clone(),
    };

    // One browser session per site, strictly in sequence.
    for site in selected {
        info!(site = %site.name, "opening browser session");
        let port = WebDriverPort::connect(
            &cfg.driver.webdriver_url,
            cfg.driver.headless,
            cfg.driver.stealth,
        )
        .await
        .with_context(|| {
            format!(
                "starting browser session via {}",
                cfg.driver.webdriver_url
            )
        })?;

        let session = ScrapeSession::new(
            site.clone(),
            cfg.pacing.clone(),
            cfg.output.clone(),
            Box::new(port),
        );
        match session.run().await {
            Ok(records) => println!("{}", report::summary(&site.name, &records)),
            Err(e) => error!(site = %site.name, error = %e, "scrape run failed"),
        }
    }

    Ok(())
}

fn site_names(cfg: &SweepConfig) -> String {
    cfg.sites
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
