// src/settings.rs

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

use crate::directory::{DetailSelectors, ListingSelectors};
use crate::routing::{client::DEFAULT_BASE_URL, GeometryRequest, Profile, RangeType};

pub const API_KEY_VAR: &str = "ORS_API_KEY";
pub const CONFIG_VAR: &str = "GEOSCRAPE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "geoscrape.yaml";

/// Everything the binaries need apart from the API key. Every field has a default,
/// so an empty (or missing) YAML file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub routing: RoutingSettings,
    pub route: RouteJob,
    pub isochrones: IsochroneJob,
    pub directory: DirectorySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    pub base_url: String,
    /// Fixed pause between consecutive requests, to stay under the service quota.
    pub request_interval_secs: f64,
    pub timeout_secs: u64,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            // free tier allows 20 isochrone requests per minute
            request_interval_secs: 3.0,
            timeout_secs: 30,
        }
    }
}

impl RoutingSettings {
    pub fn interval(&self) -> Duration {
        secs(self.request_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A single request whose response is saved verbatim as GeoJSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteJob {
    pub request: GeometryRequest,
    pub output: PathBuf,
}

impl Default for RouteJob {
    fn default() -> Self {
        Self {
            request: GeometryRequest::isochrone(
                Profile::FootWalking,
                [-71.1, 42.3],
                vec![600.0],
                RangeType::Time,
                None,
            ),
            output: PathBuf::from("output/isochrone.geojson"),
        }
    }
}

/// One isochrone per row of a stations CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsochroneJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Also write every returned feature, tagged with its station, to this file.
    pub geojson_output: Option<PathBuf>,
    pub profile: Profile,
    pub range: Vec<f64>,
    pub range_type: RangeType,
    pub smoothing: Option<f64>,
}

impl Default for IsochroneJob {
    fn default() -> Self {
        Self {
            input: PathBuf::from("stations.csv"),
            output: PathBuf::from("output/station_isochrones.csv"),
            geojson_output: None,
            profile: Profile::FootWalking,
            range: vec![600.0],
            range_type: RangeType::Time,
            smoothing: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySettings {
    pub listing_url: String,
    pub output: PathBuf,
    pub images_dir: PathBuf,
    pub fetch_details: bool,
    pub download_images: bool,
    pub request_interval_secs: f64,
    pub listing: ListingSelectors,
    pub detail: DetailSelectors,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            listing_url: String::new(),
            output: PathBuf::from("output/faculty.csv"),
            images_dir: PathBuf::from("images"),
            fetch_details: true,
            download_images: true,
            request_interval_secs: 1.0,
            listing: ListingSelectors::default(),
            detail: DetailSelectors::default(),
        }
    }
}

impl DirectorySettings {
    pub fn interval(&self) -> Duration {
        secs(self.request_interval_secs)
    }
}

fn secs(s: f64) -> Duration {
    if s.is_finite() && s > 0.0 {
        Duration::from_secs_f64(s)
    } else {
        Duration::ZERO
    }
}

impl Settings {
    /// Load from `$GEOSCRAPE_CONFIG`, else `./geoscrape.yaml`, else defaults.
    /// A path named explicitly through the environment must exist.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        let _ = dotenv();

        match env::var(CONFIG_VAR) {
            Ok(path) => Self::from_file(&path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => {
                info!("no {} found; using built-in defaults", DEFAULT_CONFIG_PATH);
                Ok(Self::default())
            }
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading settings {:?}", path))?;
        let settings = Self::from_yaml(&text).with_context(|| format!("parsing settings {:?}", path))?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

/// The routing service key, from the process environment or a local `.env`.
pub fn api_key_from_env() -> Result<String> {
    let _ = dotenv();
    let key = env::var(API_KEY_VAR).with_context(|| format!("{} must be set", API_KEY_VAR))?;
    if key.trim().is_empty() {
        bail!("{} is empty", API_KEY_VAR);
    }
    Ok(key.trim().to_string())
}
