//! Weather sampler: hourly 2-meter temperature forecasts from Open-Meteo,
//! reduced to the single sample nearest a target arrival instant.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Error;
use crate::model::{Coordinate, HourlyForecastSeries};
use crate::transport::Transport;

pub const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com";

/// An in-range hourly series puts the nearest sample at most 30 minutes
/// from the target. A larger gap means the one-day forecast window does not
/// cover the arrival time, and returning the closest sample anyway would be
/// misleading; fail instead.
const MAX_SAMPLE_GAP_SECS: i64 = 3 * 3600;

#[derive(Debug, Clone)]
pub struct WeatherSampler {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl WeatherSampler {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_base_url(transport, DEFAULT_OPEN_METEO_URL)
    }

    pub fn with_base_url(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// Fetch one day of hourly forecast for `loc` and return the sample
    /// nearest `target_utc`: temperature in °C (unconverted) and the sample
    /// instant (UTC). Ties break to the earliest sample.
    pub async fn fetch_nearest_hourly(
        &self,
        loc: Coordinate,
        target_utc: DateTime<Utc>,
    ) -> Result<(f64, DateTime<Utc>), Error> {
        let series = self.fetch_hourly(loc).await?;

        let (_, sample_time, temperature_c) = series
            .nearest_sample(target_utc)
            .ok_or_else(|| Error::WeatherUnavailable("forecast series is empty".into()))?;

        let gap = (sample_time - target_utc).num_seconds().abs();
        if gap > MAX_SAMPLE_GAP_SECS {
            return Err(Error::WeatherUnavailable(format!(
                "nearest forecast sample ({sample_time}) is {}h away from target ({target_utc})",
                gap / 3600
            )));
        }

        Ok((temperature_c, sample_time))
    }

    async fn fetch_hourly(&self, loc: Coordinate) -> Result<HourlyForecastSeries, Error> {
        let url = format!("{}/v1/forecast", self.base_url);
        let query = [
            ("latitude", loc.lat.to_string()),
            ("longitude", loc.lon.to_string()),
            ("hourly", "temperature_2m".to_string()),
            ("forecast_days", "1".to_string()),
        ];

        tracing::debug!(%url, %loc, "requesting hourly forecast");

        let body = self
            .transport
            .get_json(&url, &query)
            .await
            .map_err(|err| match err.body() {
                Some(body) => Error::WeatherUnavailable(body.to_string()),
                None => Error::WeatherUnavailable(err.to_string()),
            })?;

        let parsed: OpenMeteoResponse = serde_json::from_value(body).map_err(|err| {
            Error::WeatherUnavailable(format!("unexpected response shape: {err}"))
        })?;

        parsed.hourly.into_series()
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: OpenMeteoHourly,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoHourly {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
}

impl OpenMeteoHourly {
    fn into_series(self) -> Result<HourlyForecastSeries, Error> {
        if self.time.len() != self.temperature_2m.len() {
            return Err(Error::WeatherUnavailable(format!(
                "misaligned hourly series: {} timestamps vs {} temperatures",
                self.time.len(),
                self.temperature_2m.len()
            )));
        }

        let times = self
            .time
            .iter()
            .map(|raw| parse_utc(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HourlyForecastSeries {
            times,
            temperatures_c: self.temperature_2m,
        })
    }
}

/// Normalize an Open-Meteo timestamp to a UTC-aware instant. The service
/// emits zoneless `%Y-%m-%dT%H:%M` strings, which are UTC by default;
/// offset-carrying RFC 3339 strings are converted.
fn parse_utc(raw: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::WeatherUnavailable(format!("invalid forecast timestamp: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn hourly(time: Vec<&str>, temps: Vec<f64>) -> OpenMeteoHourly {
        serde_json::from_value(json!({
            "time": time,
            "temperature_2m": temps,
        }))
        .unwrap()
    }

    #[test]
    fn parses_zoneless_timestamps_as_utc() {
        let dt = parse_utc("2025-01-12T10:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 12, 10, 0, 0).unwrap());
    }

    #[test]
    fn converts_offset_timestamps_to_utc() {
        let dt = parse_utc("2025-01-12T05:00:00-05:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 12, 10, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_utc("not a time").is_err());
    }

    #[test]
    fn into_series_rejects_misaligned_arrays() {
        let err = hourly(vec!["2025-01-12T10:00", "2025-01-12T11:00"], vec![1.0])
            .into_series()
            .unwrap_err();
        assert!(err.to_string().contains("misaligned"));
    }

    #[test]
    fn into_series_parses_full_response() {
        let response: OpenMeteoResponse = serde_json::from_value(json!({
            "latitude": 40.7,
            "longitude": -74.0,
            "hourly_units": {"time": "iso8601", "temperature_2m": "°C"},
            "hourly": {
                "time": ["2025-01-12T00:00", "2025-01-12T01:00"],
                "temperature_2m": [-2.5, -3.0]
            }
        }))
        .unwrap();

        let series = response.hourly.into_series().unwrap();
        assert_eq!(series.times.len(), 2);
        assert_eq!(series.temperatures_c, vec![-2.5, -3.0]);
    }
}
