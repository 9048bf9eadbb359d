//! CLI for linkfetch.

use anyhow::Result;
use clap::Parser;
use linkfetch_core::batch::BatchSummary;
use linkfetch_core::config::{self, FetchConfig, LinkfetchConfig};
use linkfetch_core::progress::ConsoleReporter;
use linkfetch_core::run::download_files;
use std::path::PathBuf;

pub const USAGE: &str = "Usage: linkfetch 5 output_folder links.txt";

/// Download every `<url> <filename>` pair of a link list with a fixed number of parallel workers.
///
/// Each positional argument is optional on its own; missing ones come from
/// the config file, then the built-in defaults (5, output_folder, links.txt).
#[derive(Debug, Parser)]
#[command(name = "linkfetch")]
#[command(about = "linkfetch: parallel batch downloader for link lists", long_about = None)]
pub struct Cli {
    /// Number of parallel downloads.
    pub concurrency: Option<String>,

    /// Directory to write downloaded files to (its parent must exist).
    pub output_dir: Option<PathBuf>,

    /// Link list: one `<url> <filename>` pair per line.
    pub links_file: Option<PathBuf>,

    /// Verify that HTTPS certificates match the host name (off by default for compatibility).
    #[arg(long)]
    pub verify_hostname: bool,

    /// Connect timeout per request, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub connect_timeout_ms: Option<u64>,

    /// Abort a request when no data arrives for this long, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub read_timeout_ms: Option<u64>,

    /// Count HTTP status >= 400 as a failed item instead of saving the error page.
    #[arg(long)]
    pub fail_on_http_error: bool,

    /// Read settings from this file instead of ~/.config/linkfetch/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Settings for one run after merging CLI arguments over the config file.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub concurrency: String,
    pub output_dir: PathBuf,
    pub links_file: PathBuf,
    pub fetch: FetchConfig,
}

impl Cli {
    /// No arguments at all: print usage and do nothing.
    pub fn is_bare(&self) -> bool {
        self.concurrency.is_none()
            && self.output_dir.is_none()
            && self.links_file.is_none()
            && !self.verify_hostname
            && self.connect_timeout_ms.is_none()
            && self.read_timeout_ms.is_none()
            && !self.fail_on_http_error
            && self.config.is_none()
    }

    /// CLI argument > config file > default, checked independently per setting.
    pub fn settings(&self, cfg: &LinkfetchConfig) -> RunSettings {
        let mut fetch = cfg.fetch.clone();
        fetch.verify_hostname |= self.verify_hostname;
        fetch.fail_on_http_error |= self.fail_on_http_error;
        if self.connect_timeout_ms.is_some() {
            fetch.connect_timeout_ms = self.connect_timeout_ms;
        }
        if self.read_timeout_ms.is_some() {
            fetch.read_timeout_ms = self.read_timeout_ms;
        }
        RunSettings {
            concurrency: self
                .concurrency
                .clone()
                .unwrap_or_else(|| cfg.concurrency.to_string()),
            output_dir: self
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(&cfg.output_dir)),
            links_file: self
                .links_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(&cfg.links_file)),
            fetch,
        }
    }

    fn load_config(&self) -> Result<LinkfetchConfig> {
        if let Some(path) = &self.config {
            return config::load_from_path(path);
        }
        match config::load_or_init() {
            Ok(cfg) => Ok(cfg),
            Err(err) => {
                tracing::warn!("using built-in defaults, config unavailable: {:#}", err);
                Ok(LinkfetchConfig::default())
            }
        }
    }

    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if cli.is_bare() {
            println!("{}", USAGE);
            return Ok(());
        }
        let cfg = cli.load_config()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let settings = cli.settings(&cfg);

        let summary = download_files(
            &settings.concurrency,
            &settings.output_dir,
            &settings.links_file,
            &settings.fetch,
            &ConsoleReporter,
        )?;
        print_summary(&summary);
        Ok(())
    }
}

fn print_summary(summary: &BatchSummary) {
    println!(
        "Downloaded {} of {} files ({} failed)",
        summary.completed_items, summary.total_items, summary.failed_items
    );
    for failure in &summary.failures {
        eprintln!(
            "  failed: {} -> {}: {}",
            failure.item.source, failure.item.destination_name, failure.error
        );
    }
}

#[cfg(test)]
mod tests;
