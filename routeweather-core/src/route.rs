//! Route fetcher: driving routes from an OSRM-compatible routing service.

use serde::Deserialize;
use std::sync::Arc;

use crate::error::Error;
use crate::model::{Coordinate, RouteStep};
use crate::transport::Transport;

pub const DEFAULT_OSRM_URL: &str = "http://router.project-osrm.org";

const UNNAMED_ROAD: &str = "Unnamed Road";

#[derive(Debug, Clone)]
pub struct RouteFetcher {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl RouteFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_base_url(transport, DEFAULT_OSRM_URL)
    }

    pub fn with_base_url(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// Fetch the driving route from `start` to `end`: the ordered step list
    /// of the first route's first leg, plus the leg's total duration in
    /// seconds.
    ///
    /// Retry and caching live in the injected transport; this client makes
    /// a single logical request.
    pub async fn fetch_route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<(Vec<RouteStep>, f64), Error> {
        // OSRM takes coordinates in lon,lat order.
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, start.lon, start.lat, end.lon, end.lat
        );
        let query = [
            ("overview", "full".to_string()),
            ("steps", "true".to_string()),
        ];

        tracing::debug!(%url, "requesting driving route");

        let body = self
            .transport
            .get_json(&url, &query)
            .await
            .map_err(|err| match err.body() {
                Some(body) => Error::RouteUnavailable(body.to_string()),
                None => Error::RouteUnavailable(err.to_string()),
            })?;

        let parsed: OsrmResponse = serde_json::from_value(body)
            .map_err(|err| Error::RouteUnavailable(format!("unexpected response shape: {err}")))?;

        let leg = parsed
            .routes
            .into_iter()
            .next()
            .and_then(|route| route.legs.into_iter().next())
            .ok_or_else(|| Error::RouteUnavailable("no routes found in the response".into()))?;

        let steps = leg.steps.into_iter().map(RouteStep::from).collect();

        Ok((steps, leg.duration))
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    steps: Vec<OsrmStep>,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    maneuver: OsrmManeuver,
    #[serde(default)]
    name: String,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    /// `[lon, lat]` per the OSRM response format.
    location: [f64; 2],
}

impl From<OsrmStep> for RouteStep {
    fn from(step: OsrmStep) -> Self {
        let road_name = if step.name.is_empty() {
            UNNAMED_ROAD.to_string()
        } else {
            step.name
        };

        Self {
            road_name,
            maneuver_location: Coordinate::new(step.maneuver.location[1], step.maneuver.location[0]),
            duration_secs: step.duration,
        }
    }
}
