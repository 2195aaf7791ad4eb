use anyhow::Result;
use geoscrape::{
    fetch, logging, pipeline,
    routing::OpenRouteService,
    settings::{self, Settings},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    info!("startup");

    let settings = Settings::load()?;
    let api_key = settings::api_key_from_env()?;
    let client = fetch::build_client(settings.routing.timeout())?;
    let service = OpenRouteService::new(client, &settings.routing.base_url, api_key)?;

    let summary =
        pipeline::run_isochrones(&service, &settings.isochrones, settings.routing.interval())
            .await?;
    info!(
        written = summary.written,
        failed = summary.failed,
        "all done"
    );
    Ok(())
}
