// src/routing/mod.rs

pub mod client;

pub use client::OpenRouteService;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// `[x, y]`, i.e. `[longitude, latitude]`.
pub type Coordinate = [f64; 2];

/// Travel profiles understood by the routing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    DrivingCar,
    DrivingHgv,
    CyclingRegular,
    CyclingRoad,
    CyclingMountain,
    CyclingElectric,
    #[default]
    FootWalking,
    FootHiking,
    Wheelchair,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::DrivingCar => "driving-car",
            Profile::DrivingHgv => "driving-hgv",
            Profile::CyclingRegular => "cycling-regular",
            Profile::CyclingRoad => "cycling-road",
            Profile::CyclingMountain => "cycling-mountain",
            Profile::CyclingElectric => "cycling-electric",
            Profile::FootWalking => "foot-walking",
            Profile::FootHiking => "foot-hiking",
            Profile::Wheelchair => "wheelchair",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of an isochrone range: seconds or metres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeType {
    #[default]
    Time,
    Distance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestKind {
    /// Directions through every coordinate, in order.
    Route,
    /// One reachability polygon per location and range value.
    Isochrone {
        range: Vec<f64>,
        #[serde(default)]
        range_type: RangeType,
        #[serde(default)]
        smoothing: Option<f64>,
    },
}

/// One call to the routing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRequest {
    #[serde(default)]
    pub profile: Profile,
    pub coordinates: Vec<Coordinate>,
    pub kind: RequestKind,
}

impl GeometryRequest {
    pub fn route(profile: Profile, coordinates: Vec<Coordinate>) -> Self {
        Self {
            profile,
            coordinates,
            kind: RequestKind::Route,
        }
    }

    pub fn isochrone(
        profile: Profile,
        location: Coordinate,
        range: Vec<f64>,
        range_type: RangeType,
        smoothing: Option<f64>,
    ) -> Self {
        Self {
            profile,
            coordinates: vec![location],
            kind: RequestKind::Isochrone {
                range,
                range_type,
                smoothing,
            },
        }
    }

    /// Reject requests the service would refuse anyway.
    pub fn validate(&self) -> Result<(), RoutingError> {
        if self
            .coordinates
            .iter()
            .flatten()
            .any(|v| !v.is_finite())
        {
            return Err(RoutingError::InvalidRequest(
                "coordinates must be finite numbers".into(),
            ));
        }
        match &self.kind {
            RequestKind::Route if self.coordinates.len() < 2 => Err(RoutingError::InvalidRequest(
                format!("a route needs at least 2 coordinates, got {}", self.coordinates.len()),
            )),
            RequestKind::Isochrone { .. } if self.coordinates.is_empty() => Err(
                RoutingError::InvalidRequest("an isochrone needs at least 1 location".into()),
            ),
            RequestKind::Isochrone { range, .. } if range.is_empty() => Err(
                RoutingError::InvalidRequest("an isochrone needs at least 1 range value".into()),
            ),
            RequestKind::Isochrone {
                smoothing: Some(s), ..
            } if !(0.0..=100.0).contains(s) => Err(RoutingError::InvalidRequest(format!(
                "smoothing must be within 0..=100, got {}",
                s
            ))),
            _ => Ok(()),
        }
    }

    /// Path relative to the service root.
    pub fn endpoint(&self) -> String {
        match self.kind {
            RequestKind::Route => format!("v2/directions/{}/geojson", self.profile),
            RequestKind::Isochrone { .. } => format!("v2/isochrones/{}", self.profile),
        }
    }

    /// JSON request body.
    pub fn body(&self) -> Value {
        match &self.kind {
            RequestKind::Route => json!({ "coordinates": self.coordinates }),
            RequestKind::Isochrone {
                range,
                range_type,
                smoothing,
            } => {
                let mut body = json!({
                    "locations": self.coordinates,
                    "range": range,
                    "range_type": range_type,
                });
                if let Some(s) = smoothing {
                    body["smoothing"] = json!(s);
                }
                body
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },

    #[error("undecodable response: {0}")]
    Decode(String),
}

/// A remote service that turns a [`GeometryRequest`] into a GeoJSON FeatureCollection.
#[allow(async_fn_in_trait)]
pub trait RoutingService {
    async fn request(&self, request: &GeometryRequest) -> Result<Value, RoutingError>;
}
