use anyhow::Result;
use geoscrape::{
    fetch::{self, HttpFetcher},
    logging, pipeline,
    settings::Settings,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    info!("startup");

    let settings = Settings::load()?;
    let client = fetch::build_client(settings.routing.timeout())?;
    let fetcher = HttpFetcher::new(client);

    let summary = pipeline::scrape_directory(&fetcher, &settings.directory).await?;
    info!(records = summary.records, "all done");
    Ok(())
}
