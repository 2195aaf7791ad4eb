use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, instrument};

use crate::geometry::{write_geojson, FeatureCollection};
use crate::routing::{GeometryRequest, RoutingService};

/// Issue one request and save the response as received.
#[instrument(level = "info", skip(service, request), fields(profile = %request.profile))]
pub async fn run_route<S: RoutingService>(
    service: &S,
    request: &GeometryRequest,
    out: &Path,
) -> Result<FeatureCollection> {
    let response = service
        .request(request)
        .await
        .with_context(|| format!("{} request failed", request.endpoint()))?;
    let collection = FeatureCollection::from_value(&response)?;

    write_geojson(out, &response)?;
    info!(features = collection.features.len(), path = %out.display(), "wrote GeoJSON");
    Ok(collection)
}
