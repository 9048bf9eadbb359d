//! One-call entry point: link list in, files on disk out.

use anyhow::{Context, Result};
use std::path::Path;

use crate::batch::{BatchDownloader, BatchSummary};
use crate::config::{Concurrency, FetchConfig};
use crate::fetch::CurlFetcher;
use crate::links::{LinkFile, LinkSource};
use crate::progress::ProgressReporter;
use crate::storage::DirStorage;

/// Downloads every item of `links_file` into `output_dir` with up to
/// `concurrency` parallel transfers, reporting after each finished item.
///
/// A non-numeric or zero `concurrency` and an unreadable link list are fatal.
/// Individual item failures are not: they are counted in the summary.
pub fn download_files(
    concurrency: &str,
    output_dir: &Path,
    links_file: &Path,
    fetch: &FetchConfig,
    reporter: &dyn ProgressReporter,
) -> Result<BatchSummary> {
    let concurrency: Concurrency = concurrency.parse()?;
    let items = LinkFile::new(links_file)
        .items()
        .context("could not load link list")?;
    tracing::info!(
        links = %links_file.display(),
        output = %output_dir.display(),
        items = items.len(),
        %concurrency,
        "download_files"
    );

    let batch = BatchDownloader::new(
        CurlFetcher::new(fetch.to_options()),
        DirStorage::new(output_dir),
        concurrency,
    )
    .fail_on_http_error(fetch.fail_on_http_error);

    Ok(batch.run(items, reporter))
}
