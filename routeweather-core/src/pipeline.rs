//! The driver: fetch the route once, then walk the steps sequentially,
//! sampling the forecast at each estimated arrival time.

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::error::Error;
use crate::model::{celsius_to_fahrenheit, Coordinate, WeatherWaypoint};
use crate::route::RouteFetcher;
use crate::weather::WeatherSampler;

#[derive(Debug, Clone)]
pub struct RouteWeather {
    fetcher: RouteFetcher,
    sampler: WeatherSampler,
}

impl RouteWeather {
    pub fn new(fetcher: RouteFetcher, sampler: WeatherSampler) -> Self {
        Self { fetcher, sampler }
    }

    /// Build the annotated waypoint list for a drive from `start` to `end`
    /// departing at `start_time`.
    ///
    /// One waypoint per route step, in step order. The running clock starts
    /// at `start_time` and advances by each step's duration before that
    /// step's weather lookup, so arrival times are non-decreasing. Weather
    /// lookups are sequential; any single failure aborts the run, with no
    /// partial-result mode.
    pub async fn build_weather_route(
        &self,
        start: Coordinate,
        end: Coordinate,
        start_time: DateTime<FixedOffset>,
    ) -> Result<Vec<WeatherWaypoint>, Error> {
        let (steps, total_duration) = self.fetcher.fetch_route(start, end).await?;

        tracing::info!(
            steps = steps.len(),
            total_duration_secs = total_duration,
            "route fetched"
        );

        // Comparisons against forecast timestamps happen in UTC; the
        // caller's offset is kept only for display.
        let offset = *start_time.offset();
        let mut clock: DateTime<Utc> = start_time.with_timezone(&Utc);

        let mut waypoints = Vec::with_capacity(steps.len());

        for step in steps {
            clock += Duration::milliseconds((step.duration_secs * 1000.0) as i64);

            let (temperature_c, _sample_time) = self
                .sampler
                .fetch_nearest_hourly(step.maneuver_location, clock)
                .await?;

            let waypoint = WeatherWaypoint {
                label: step.road_name,
                location: step.maneuver_location,
                temperature_f: celsius_to_fahrenheit(temperature_c),
                arrival_local: clock.with_timezone(&offset),
            };

            tracing::info!(
                road = %waypoint.label,
                arrival = %waypoint.arrival_time_local(),
                step_minutes = %format!("{:.2}", step.duration_secs / 60.0),
                "waypoint annotated"
            );

            waypoints.push(waypoint);
        }

        Ok(waypoints)
    }
}
