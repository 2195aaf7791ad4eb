use anyhow::Result;
use geoscrape::{
    fetch, logging, pipeline,
    routing::OpenRouteService,
    settings::{self, Settings},
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    info!("startup");

    let settings = Settings::load()?;
    let api_key = settings::api_key_from_env()?;
    let client = fetch::build_client(settings.routing.timeout())?;
    let service = OpenRouteService::new(client, &settings.routing.base_url, api_key)?;

    let job = &settings.route;
    match pipeline::run_route(&service, &job.request, &job.output).await {
        Ok(fc) => info!(features = fc.features.len(), "done"),
        // reported, not escalated
        Err(e) => error!("route failed: {:#}", e),
    }
    Ok(())
}
