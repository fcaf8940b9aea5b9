use thiserror::Error;

/// Pipeline errors. Both kinds are unrecoverable at the point of origin
/// (there is no fallback route or fallback weather source) and abort the
/// whole run. The message carries the raw service error text when the
/// failing service provided one.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no route available: {0}")]
    RouteUnavailable(String),

    #[error("weather lookup failed: {0}")]
    WeatherUnavailable(String),
}
