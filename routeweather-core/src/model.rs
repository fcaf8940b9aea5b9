use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// A geographic point. Latitude in [-90, 90], longitude in [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

/// One maneuver segment of a driving route, as returned by the route fetcher.
#[derive(Debug, Clone)]
pub struct RouteStep {
    /// Road name, or `"Unnamed Road"` when the service omits it.
    pub road_name: String,
    /// Location of the maneuver that starts this step.
    pub maneuver_location: Coordinate,
    /// Expected traversal time for this step, in seconds. Non-negative.
    pub duration_secs: f64,
}

/// Hourly forecast series for one coordinate: UTC instants index-aligned
/// with temperatures in °C. Fetched fresh per query and discarded after the
/// nearest-sample lookup.
#[derive(Debug, Clone)]
pub struct HourlyForecastSeries {
    pub times: Vec<DateTime<Utc>>,
    pub temperatures_c: Vec<f64>,
}

impl HourlyForecastSeries {
    /// Index, instant and temperature of the sample closest to `target`.
    ///
    /// Exact ties break to the earliest index: `min_by_key` returns the
    /// first of equally-minimal elements, which keeps the selection
    /// deterministic. Returns `None` for an empty series.
    pub fn nearest_sample(&self, target: DateTime<Utc>) -> Option<(usize, DateTime<Utc>, f64)> {
        self.times
            .iter()
            .zip(self.temperatures_c.iter())
            .enumerate()
            .min_by_key(|(_, (time, _))| (**time - target).num_seconds().abs())
            .map(|(idx, (time, temp))| (idx, *time, *temp))
    }
}

/// A point along the route annotated with estimated arrival time and the
/// forecast sample closest to that time. Output record of the pipeline.
#[derive(Debug, Clone)]
pub struct WeatherWaypoint {
    pub label: String,
    pub location: Coordinate,
    pub temperature_f: f64,
    pub arrival_local: DateTime<FixedOffset>,
}

impl WeatherWaypoint {
    /// Arrival time formatted for display and popups.
    pub fn arrival_time_local(&self) -> String {
        self.arrival_local.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Three-band temperature classification used for marker colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    Cold,
    Mild,
    Warm,
}

impl TemperatureBand {
    /// Classify a Fahrenheit temperature: `< 32 → Cold`, `[32, 50] → Mild`,
    /// `> 50 → Warm`.
    pub fn from_fahrenheit(temp_f: f64) -> Self {
        if temp_f < 32.0 {
            Self::Cold
        } else if temp_f <= 50.0 {
            Self::Mild
        } else {
            Self::Warm
        }
    }

    /// Marker color for this band.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Cold => "blue",
            Self::Mild => "green",
            Self::Warm => "red",
        }
    }
}

/// Exact conversion, reversible within floating-point tolerance.
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}
