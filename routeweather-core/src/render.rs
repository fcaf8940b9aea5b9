//! Renderer: the annotated waypoint list as a self-contained Leaflet map
//! document (markers, popups, route polyline), written to an HTML file.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::model::{Coordinate, TemperatureBand, WeatherWaypoint};

const ZOOM: u32 = 12;

/// Build the map document: a view centered on `center` with a labeled
/// start marker, one band-colored circle marker per waypoint (popup: road
/// name, temperature to two decimals, arrival time), and a single red
/// polyline joining the waypoints in order.
pub fn render_map(waypoints: &[WeatherWaypoint], center: Coordinate) -> String {
    let mut markers = String::new();
    let mut line_coords = String::new();

    for wp in waypoints {
        let color = TemperatureBand::from_fahrenheit(wp.temperature_f).color();
        let popup = format!(
            "Location: {}<br>Temperature: {:.2}°F<br>Time: {}",
            escape_html(&wp.label),
            wp.temperature_f,
            wp.arrival_time_local(),
        );

        let _ = writeln!(
            markers,
            "L.circleMarker([{lat}, {lon}], {{radius: 8, color: \"{color}\", fill: true, \
             fillColor: \"{color}\", fillOpacity: 0.6}}).bindPopup({popup:?}).addTo(map);",
            lat = wp.location.lat,
            lon = wp.location.lon,
        );

        if !line_coords.is_empty() {
            line_coords.push_str(", ");
        }
        let _ = write!(line_coords, "[{}, {}]", wp.location.lat, wp.location.lon);
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Route weather</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map('map').setView([{center_lat}, {center_lon}], {ZOOM});
L.tileLayer('https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
  maxZoom: 19,
  attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);
L.marker([{center_lat}, {center_lon}]).bindPopup("Start").addTo(map);
{markers}L.polyline([{line_coords}], {{color: "red", weight: 2.5, opacity: 1.0}}).addTo(map);
</script>
</body>
</html>
"#,
        center_lat = center.lat,
        center_lon = center.lon,
    )
}

/// Render and write the map document to `path`.
pub fn write_map(path: &Path, waypoints: &[WeatherWaypoint], center: Coordinate) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
        }
    }

    fs::write(path, render_map(waypoints, center))
        .with_context(|| format!("Failed to write map file: {}", path.display()))?;

    tracing::info!(path = %path.display(), waypoints = waypoints.len(), "map written");
    Ok(())
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn waypoint(label: &str, lat: f64, lon: f64, temp_f: f64) -> WeatherWaypoint {
        WeatherWaypoint {
            label: label.to_string(),
            location: Coordinate::new(lat, lon),
            temperature_f: temp_f,
            arrival_local: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2025, 1, 12, 10, 10, 0)
                .unwrap(),
        }
    }

    #[test]
    fn map_contains_start_marker_and_center() {
        let html = render_map(&[], Coordinate::new(40.7128, -74.006));
        assert!(html.contains("setView([40.7128, -74.006], 12)"));
        assert!(html.contains("bindPopup(\"Start\")"));
    }

    #[test]
    fn markers_are_colored_by_band() {
        let waypoints = [
            waypoint("Icy Rd", 40.0, -74.0, 20.0),
            waypoint("Cool St", 41.0, -73.0, 40.0),
            waypoint("Warm Ave", 42.0, -72.0, 60.0),
        ];

        let html = render_map(&waypoints, Coordinate::new(40.0, -74.0));
        assert!(html.contains("color: \"blue\""));
        assert!(html.contains("color: \"green\""));
        assert!(html.contains("color: \"red\""));
    }

    #[test]
    fn popup_shows_name_temperature_and_time() {
        let html = render_map(&[waypoint("Broadway", 40.0, -74.0, 41.5)], Coordinate::new(40.0, -74.0));
        assert!(html.contains("Location: Broadway"));
        assert!(html.contains("Temperature: 41.50°F"));
        assert!(html.contains("Time: 2025-01-12 10:10:00"));
    }

    #[test]
    fn road_names_are_html_escaped() {
        let html = render_map(
            &[waypoint("A <b>weird</b> & \"odd\" road", 40.0, -74.0, 41.5)],
            Coordinate::new(40.0, -74.0),
        );
        assert!(html.contains("A &lt;b&gt;weird&lt;/b&gt; &amp; &quot;odd&quot; road"));
        assert!(!html.contains("<b>weird</b>"));
    }

    #[test]
    fn polyline_joins_waypoints_in_order() {
        let waypoints = [
            waypoint("First", 40.0, -74.0, 45.0),
            waypoint("Second", 41.0, -73.0, 45.0),
        ];

        let html = render_map(&waypoints, Coordinate::new(40.0, -74.0));
        assert!(html.contains("L.polyline([[40, -74], [41, -73]]"));
    }

    #[test]
    fn write_map_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route.html");

        write_map(&path, &[], Coordinate::new(40.0, -74.0)).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("<div id=\"map\">"));
    }
}
