// src/pipeline/mod.rs

pub mod directory;
pub mod isochrones;
pub mod route;

pub use directory::{scrape_directory, ScrapeSummary};
pub use isochrones::{run_isochrones, IsochroneSummary};
pub use route::run_route;

use std::time::Duration;
use tokio::time::sleep;

/// The fixed inter-request delay. No backoff, no jitter.
async fn pause(interval: Duration) {
    if !interval.is_zero() {
        sleep(interval).await;
    }
}
