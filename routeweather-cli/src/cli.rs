use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use routeweather_core::{
    write_map, Config, Coordinate, HttpTransport, RetryPolicy, RouteFetcher, RouteWeather,
    Transport, WeatherSampler, WeatherWaypoint,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "routeweather", version, about = "Weather along a driving route")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Trip parameters shared by all subcommands. Anything left unset falls
/// back to the stored config (which defaults to the New York → Boston
/// example trip).
#[derive(Debug, Args)]
pub struct TripArgs {
    /// Start latitude.
    #[arg(long, allow_negative_numbers = true)]
    pub start_lat: Option<f64>,

    /// Start longitude.
    #[arg(long, allow_negative_numbers = true)]
    pub start_lon: Option<f64>,

    /// Destination latitude.
    #[arg(long, allow_negative_numbers = true)]
    pub end_lat: Option<f64>,

    /// Destination longitude.
    #[arg(long, allow_negative_numbers = true)]
    pub end_lon: Option<f64>,

    /// Departure time, RFC 3339 (e.g. 2025-01-12T10:00:00Z). A value
    /// without a UTC offset is interpreted as UTC.
    #[arg(long)]
    pub depart: Option<String>,

    /// Bypass the on-disk response cache for this run.
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Persist the given trip parameters as the new defaults.
    Configure {
        #[command(flatten)]
        trip: TripArgs,

        /// Default output path for rendered maps.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the annotated waypoints for the trip.
    Show {
        #[command(flatten)]
        trip: TripArgs,
    },

    /// Render the trip as an interactive HTML map.
    Render {
        #[command(flatten)]
        trip: TripArgs,

        /// Output path for the map document.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure { trip, output } => {
                apply_overrides(&mut config, &trip, output)?;
                config.save()?;
                println!(
                    "Configuration saved to {}",
                    Config::config_file_path()?.display()
                );
            }
            Command::Show { trip } => {
                let (waypoints, _) = build(&config, &trip).await?;
                print_waypoints(&waypoints);
            }
            Command::Render { trip, output } => {
                let (waypoints, start) = build(&config, &trip).await?;
                let path = output.unwrap_or_else(|| config.output.clone());
                write_map(&path, &waypoints, start)?;
                println!("Map written to {}", path.display());
            }
        }

        Ok(())
    }
}

/// Merge flag overrides into `config`. The departure time is validated
/// before it is stored so a bad value never reaches the config file.
fn apply_overrides(config: &mut Config, trip: &TripArgs, output: Option<PathBuf>) -> Result<()> {
    if let Some(lat) = trip.start_lat {
        config.start.lat = lat;
    }
    if let Some(lon) = trip.start_lon {
        config.start.lon = lon;
    }
    if let Some(lat) = trip.end_lat {
        config.end.lat = lat;
    }
    if let Some(lon) = trip.end_lon {
        config.end.lon = lon;
    }
    if let Some(depart) = &trip.depart {
        parse_depart(depart)?;
        config.start_time = depart.clone();
    }
    if let Some(output) = output {
        config.output = output;
    }

    Ok(())
}

async fn build(config: &Config, trip: &TripArgs) -> Result<(Vec<WeatherWaypoint>, Coordinate)> {
    let start = Coordinate::new(
        trip.start_lat.unwrap_or(config.start.lat),
        trip.start_lon.unwrap_or(config.start.lon),
    );
    let end = Coordinate::new(
        trip.end_lat.unwrap_or(config.end.lat),
        trip.end_lon.unwrap_or(config.end.lon),
    );

    let depart_raw = trip.depart.as_deref().unwrap_or(&config.start_time);
    let depart = parse_depart(depart_raw)?;

    let transport = build_transport(config, trip.no_cache)?;
    let pipeline = RouteWeather::new(
        RouteFetcher::new(transport.clone()),
        WeatherSampler::new(transport),
    );

    let waypoints = pipeline.build_weather_route(start, end, depart).await?;
    Ok((waypoints, start))
}

fn build_transport(config: &Config, no_cache: bool) -> Result<Arc<dyn Transport>> {
    let mut transport = HttpTransport::new()
        .context("Failed to build HTTP transport")?
        .with_retry(RetryPolicy {
            retries: config.transport.retries,
            backoff: std::time::Duration::from_millis(config.transport.backoff_ms),
        });

    if !no_cache {
        transport = transport.with_cache(
            config.transport.cache_dir.clone(),
            chrono::Duration::seconds(config.transport.cache_expiry_secs as i64),
        );
    }

    Ok(Arc::new(transport))
}

/// Parse a departure time. Offset-carrying RFC 3339 strings keep their
/// offset; zoneless strings are interpreted as UTC.
fn parse_depart(raw: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map(|naive| naive.and_utc().fixed_offset())
        .with_context(|| format!("Invalid departure time: {raw} (expected RFC 3339)"))
}

fn print_waypoints(waypoints: &[WeatherWaypoint]) {
    for (i, wp) in waypoints.iter().enumerate() {
        println!("Step {}:", i + 1);
        println!(
            "  Location: {} ({:.2}, {:.2})",
            wp.label, wp.location.lat, wp.location.lon
        );
        println!("  Temperature: {:.2}°F", wp.temperature_f);
        println!("  Time: {}\n", wp.arrival_time_local());
    }
}
