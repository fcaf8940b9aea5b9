//! Core library for the `routeweather` CLI.
//!
//! This crate defines:
//! - Shared domain models (coordinates, route steps, waypoints)
//! - The injected HTTP transport (disk cache + retries)
//! - Clients for the routing and weather services
//! - The sequential route-annotation pipeline and the map renderer
//!
//! It is used by `routeweather-cli`, but can also be reused by other
//! binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod route;
pub mod transport;
pub mod weather;

pub use config::{Config, TransportConfig};
pub use error::Error;
pub use model::{Coordinate, HourlyForecastSeries, RouteStep, TemperatureBand, WeatherWaypoint};
pub use pipeline::RouteWeather;
pub use render::{render_map, write_map};
pub use route::RouteFetcher;
pub use transport::{HttpTransport, RetryPolicy, Transport, TransportError};
pub use weather::WeatherSampler;
