// src/pipeline/directory.rs

use anyhow::{bail, Context, Result};
use tracing::{info, instrument, warn};
use url::Url;

use super::pause;
use crate::directory::{Detail, DetailParser, FacultyRow, ListingEntry, ListingParser};
use crate::fetch::{images::download_image, Fetcher};
use crate::settings::DirectorySettings;
use crate::table::RowWriter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub records: usize,
    pub detail_failures: usize,
    pub image_failures: usize,
}

/// Listing page → one CSV row per record block, plus `images/<slug>.jpg`.
///
/// Only the listing fetch is fatal. A failed detail page leaves its columns
/// empty; a failed image puts the error text in the `image` column.
#[instrument(level = "info", skip(fetcher, settings), fields(url = %settings.listing_url))]
pub async fn scrape_directory<F: Fetcher>(
    fetcher: &F,
    settings: &DirectorySettings,
) -> Result<ScrapeSummary> {
    if settings.listing_url.trim().is_empty() {
        bail!("directory.listing_url must be set");
    }
    let listing_url = Url::parse(settings.listing_url.trim())
        .with_context(|| format!("parsing listing URL {}", settings.listing_url))?;

    // compile selectors before any network traffic
    let listing_parser = ListingParser::new(&settings.listing)?;
    let detail_parser = DetailParser::new(&settings.detail)?;

    let html = fetcher
        .text(&listing_url)
        .await
        .context("fetching listing page")?;
    let entries = listing_parser.parse(&html, &listing_url);
    info!(records = entries.len(), "parsed listing");

    let mut writer = RowWriter::create(&settings.output, &FacultyRow::HEADER)?;
    let mut summary = ScrapeSummary::default();

    for entry in &entries {
        let detail = fetch_detail(fetcher, settings, &detail_parser, entry, &mut summary).await;
        let image = fetch_image(fetcher, settings, entry, &mut summary).await;

        writer.write(&FacultyRow::new(entry, detail.as_ref(), image))?;
        summary.records += 1;
    }

    info!(
        records = summary.records,
        detail_failures = summary.detail_failures,
        image_failures = summary.image_failures,
        output = %settings.output.display(),
        "directory done"
    );
    Ok(summary)
}

async fn fetch_detail<F: Fetcher>(
    fetcher: &F,
    settings: &DirectorySettings,
    parser: &DetailParser,
    entry: &ListingEntry,
    summary: &mut ScrapeSummary,
) -> Option<Detail> {
    let link = entry.link.as_ref().filter(|_| settings.fetch_details)?;
    pause(settings.interval()).await;
    match fetcher.text(link).await {
        Ok(html) => Some(parser.parse(&html)),
        Err(e) => {
            warn!(name = ?entry.name, %link, "detail page failed: {:#}", e);
            summary.detail_failures += 1;
            None
        }
    }
}

async fn fetch_image<F: Fetcher>(
    fetcher: &F,
    settings: &DirectorySettings,
    entry: &ListingEntry,
    summary: &mut ScrapeSummary,
) -> Option<String> {
    let url = entry.image.as_ref().filter(|_| settings.download_images)?;
    pause(settings.interval()).await;
    let name = entry.name.as_deref().unwrap_or_default();
    match download_image(fetcher, url, name, &settings.images_dir).await {
        Ok(file_name) => Some(file_name),
        Err(e) => {
            warn!(name = ?entry.name, %url, "image failed: {:#}", e);
            summary.image_failures += 1;
            Some(format!("{:#}", e))
        }
    }
}
