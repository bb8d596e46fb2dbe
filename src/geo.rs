//! Photo geolocation from EXIF GPS tags, plus distance helpers.
//!
//! - [`read_gps`] pulls signed decimal coordinates out of an image's EXIF
//!   block (JPEG, TIFF, PNG, WebP, HEIF/HEIC).
//! - [`haversine_km`] gives great-circle distance.
//! - [`RoutingClient`] asks an OSRM server for road distance and duration.
//! - [`GeocodingClient`] turns coordinates into a place name via Nominatim.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::{Config, GeocodingConfig, RoutingConfig};
use crate::http;
use crate::models::PhotoLocation;

/// Mean Earth radius (IUGG), kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

const GEO_MAX_RETRIES: u32 = 0;
/// Nominatim's usage policy allows one request per second.
const NOMINATIM_MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("invalid EXIF data: {0}")]
    Exif(String),
    #[error("invalid hemisphere reference '{0}' (expected N, S, E or W)")]
    InvalidReference(String),
    #[error("malformed GPS tag {0}")]
    MalformedTag(&'static str),
    #[error("{axis} {value} out of range")]
    OutOfRange { axis: &'static str, value: f64 },
    #[error("invalid coordinates '{0}' (expected LAT,LON)")]
    InvalidCoordinates(String),
}

/// Degrees/minutes/seconds to signed decimal degrees. `S` and `W` are negative.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, reference: &str) -> Result<f64, GeoError> {
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    match reference.trim().to_ascii_uppercase().as_str() {
        "N" | "E" => Ok(value),
        "S" | "W" => Ok(-value),
        other => Err(GeoError::InvalidReference(other.to_string())),
    }
}

/// Read `(latitude, longitude)` from an image's EXIF GPS tags.
///
/// Returns `Ok(None)` when the image has no EXIF block or no GPS position.
pub fn read_gps(bytes: &[u8]) -> Result<Option<(f64, f64)>, GeoError> {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(None),
        Err(e) => return Err(GeoError::Exif(e.to_string())),
    };

    let lat = gps_coordinate(&exif, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef)?;
    let lon = gps_coordinate(&exif, exif::Tag::GPSLongitude, exif::Tag::GPSLongitudeRef)?;

    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            check_range(lat, lon)?;
            Ok(Some((lat, lon)))
        }
        _ => Ok(None),
    }
}

fn gps_coordinate(
    exif: &exif::Exif,
    value_tag: exif::Tag,
    ref_tag: exif::Tag,
) -> Result<Option<f64>, GeoError> {
    let (Some(value), Some(reference)) = (
        exif.get_field(value_tag, exif::In::PRIMARY),
        exif.get_field(ref_tag, exif::In::PRIMARY),
    ) else {
        return Ok(None);
    };

    let dms: Vec<f64> = match &value.value {
        exif::Value::Rational(parts) if parts.len() >= 3 => {
            parts.iter().take(3).map(|r| r.to_f64()).collect()
        }
        _ => return Err(GeoError::MalformedTag(tag_name(value_tag))),
    };
    if dms.iter().any(|v| !v.is_finite()) {
        return Err(GeoError::MalformedTag(tag_name(value_tag)));
    }

    let reference = match &reference.value {
        exif::Value::Ascii(parts) => parts
            .first()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_default(),
        _ => return Err(GeoError::MalformedTag(tag_name(ref_tag))),
    };

    dms_to_decimal(dms[0], dms[1], dms[2], &reference).map(Some)
}

fn tag_name(tag: exif::Tag) -> &'static str {
    match tag {
        exif::Tag::GPSLatitude => "GPSLatitude",
        exif::Tag::GPSLatitudeRef => "GPSLatitudeRef",
        exif::Tag::GPSLongitude => "GPSLongitude",
        exif::Tag::GPSLongitudeRef => "GPSLongitudeRef",
        _ => "GPS",
    }
}

fn check_range(lat: f64, lon: f64) -> Result<(), GeoError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeoError::OutOfRange {
            axis: "latitude",
            value: lat,
        });
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeoError::OutOfRange {
            axis: "longitude",
            value: lon,
        });
    }
    Ok(())
}

/// Parse `"LAT,LON"` into validated decimal degrees.
pub fn parse_coords(s: &str) -> Result<(f64, f64), GeoError> {
    let invalid = || GeoError::InvalidCoordinates(s.to_string());
    let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
    check_range(lat, lon)?;
    Ok((lat, lon))
}

/// Great-circle distance between two `(lat, lon)` points in kilometres.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairDistance {
    pub from: String,
    pub to: String,
    pub km: f64,
}

/// Great-circle distance for every unordered pair, in input order.
pub fn pairwise_distances(locations: &[PhotoLocation]) -> Vec<PairDistance> {
    let mut pairs = Vec::new();
    for (i, a) in locations.iter().enumerate() {
        for b in &locations[i + 1..] {
            pairs.push(PairDistance {
                from: a.filename.clone(),
                to: b.filename.clone(),
                km: haversine_km(a.coords(), b.coords()),
            });
        }
    }
    pairs
}

// ============ Routing (OSRM) ============

#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    pub distance_km: f64,
    pub duration_min: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_min: f64,
    pub legs: Vec<RouteLeg>,
}

/// Road routing against an OSRM `route` service.
pub struct RoutingClient {
    url: String,
    profile: String,
    client: reqwest::Client,
}

impl RoutingClient {
    pub fn new(config: &RoutingConfig) -> Result<Self> {
        Ok(Self {
            url: config.url.clone(),
            profile: config.profile.clone(),
            client: http::client(config.timeout_secs)?,
        })
    }

    /// Route through `points` (`(lat, lon)`) in order.
    pub async fn route(&self, points: &[(f64, f64)]) -> Result<RouteSummary> {
        if points.len() < 2 {
            anyhow::bail!("a route needs at least two points, got {}", points.len());
        }
        // OSRM wants lon,lat
        let coords = points
            .iter()
            .map(|(lat, lon)| format!("{:.6},{:.6}", lon, lat))
            .collect::<Vec<_>>()
            .join(";");
        let url = http::join_url(
            &self.url,
            &format!("route/v1/{}/{}", self.profile, coords),
        );

        let response = http::send_with_retry("OSRM", GEO_MAX_RETRIES, || {
            self.client.get(&url).query(&[("overview", "false")])
        })
        .await?;

        let json: serde_json::Value = response.json().await?;
        parse_osrm_response(&json)
    }
}

fn parse_osrm_response(json: &serde_json::Value) -> Result<RouteSummary> {
    let code = json.get("code").and_then(|c| c.as_str()).unwrap_or("");
    if code != "Ok" {
        let message = json
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("no message");
        anyhow::bail!("OSRM returned {}: {}", if code.is_empty() { "no code" } else { code }, message);
    }

    let route = json
        .get("routes")
        .and_then(|r| r.as_array())
        .and_then(|r| r.first())
        .ok_or_else(|| anyhow::anyhow!("OSRM returned no routes"))?;

    let leg_of = |v: &serde_json::Value| -> Result<RouteLeg> {
        let distance = v
            .get("distance")
            .and_then(|d| d.as_f64())
            .ok_or_else(|| anyhow::anyhow!("Invalid OSRM response: missing distance"))?;
        let duration = v
            .get("duration")
            .and_then(|d| d.as_f64())
            .ok_or_else(|| anyhow::anyhow!("Invalid OSRM response: missing duration"))?;
        Ok(RouteLeg {
            distance_km: distance / 1000.0,
            duration_min: duration / 60.0,
        })
    };

    let total = leg_of(route)?;
    let legs = route
        .get("legs")
        .and_then(|l| l.as_array())
        .map(|legs| legs.iter().map(leg_of).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    Ok(RouteSummary {
        distance_km: total.distance_km,
        duration_min: total.duration_min,
        legs,
    })
}

// ============ Reverse geocoding (Nominatim) ============

pub struct GeocodingClient {
    url: String,
    user_agent: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
    client: reqwest::Client,
}

impl GeocodingClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        Ok(Self {
            url: config.url.clone(),
            user_agent: config.user_agent.clone(),
            min_interval: NOMINATIM_MIN_INTERVAL,
            last_request: Mutex::new(None),
            client: http::client(config.timeout_secs)?,
        })
    }

    /// Sleep until `min_interval` has passed since the previous request.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let wait = (prev + self.min_interval).saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                debug!(?wait, "throttling nominatim");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Display name for the place at `(lat, lon)`, or `None` if Nominatim
    /// has nothing there (open sea, for instance).
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        self.throttle().await;
        let url = http::join_url(&self.url, "reverse");
        let lat = format!("{:.6}", lat);
        let lon = format!("{:.6}", lon);

        let response = http::send_with_retry("Nominatim", GEO_MAX_RETRIES, || {
            self.client
                .get(&url)
                .header(reqwest::header::USER_AGENT, &self.user_agent)
                .query(&[("format", "jsonv2"), ("lat", lat.as_str()), ("lon", lon.as_str())])
        })
        .await?;

        let json: serde_json::Value = response.json().await?;
        if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
            debug!(error = err, "reverse geocoding found nothing");
            return Ok(None);
        }
        Ok(json
            .get("display_name")
            .and_then(|n| n.as_str())
            .map(|s| s.to_string()))
    }
}

// ============ Photos ============

/// Read GPS positions for each file. Files that can't be read, can't be
/// parsed, or carry no position are skipped with a warning.
pub fn locate_photos(paths: &[PathBuf]) -> Vec<PhotoLocation> {
    paths
        .iter()
        .filter_map(|path| match locate_photo(path) {
            Ok(Some(loc)) => Some(loc),
            Ok(None) => {
                warn!(file = %path.display(), "no GPS data");
                None
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping photo");
                None
            }
        })
        .collect()
}

fn locate_photo(path: &Path) -> Result<Option<PhotoLocation>> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(read_gps(&bytes)?.map(|(lat, lon)| PhotoLocation::new(filename, lat, lon)))
}

/// Options for `askdoc photos`.
#[derive(Debug, Clone, Default)]
pub struct PhotoOptions {
    pub origin: Option<(f64, f64)>,
    pub road: bool,
    pub route: bool,
    pub geocode: bool,
}

/// `askdoc photos`: print where each photo was taken and how far apart they are.
pub async fn run_photos(config: &Config, files: &[PathBuf], opts: &PhotoOptions) -> Result<()> {
    let mut locations = locate_photos(files);
    if locations.is_empty() {
        anyhow::bail!("None of the given files contain GPS location data.");
    }

    let router = if opts.road || opts.route {
        Some(RoutingClient::new(&config.routing)?)
    } else {
        None
    };

    if opts.geocode {
        let geocoder = GeocodingClient::new(&config.geocoding)?;
        for loc in &mut locations {
            match geocoder.reverse(loc.latitude, loc.longitude).await {
                Ok(place) => loc.place = place,
                Err(e) => warn!(file = %loc.filename, error = %e, "reverse geocoding failed"),
            }
        }
    }

    if let Some(origin) = opts.origin {
        for loc in &mut locations {
            match router.as_ref().filter(|_| opts.road) {
                Some(router) => match router.route(&[origin, loc.coords()]).await {
                    Ok(summary) => {
                        loc.distance_km = Some(summary.distance_km);
                        loc.duration_min = Some(summary.duration_min);
                    }
                    Err(e) => {
                        warn!(file = %loc.filename, error = %e, "road routing failed, using great-circle distance");
                        loc.distance_km = Some(haversine_km(origin, loc.coords()));
                    }
                },
                None => loc.distance_km = Some(haversine_km(origin, loc.coords())),
            }
        }
    }

    for loc in &locations {
        println!("{}: {:.6}, {:.6}", loc.filename, loc.latitude, loc.longitude);
        if let Some(place) = &loc.place {
            println!("  place: {}", place);
        }
        match (loc.distance_km, loc.duration_min) {
            (Some(km), Some(min)) => println!("  {:.2} km by road from origin, {:.0} min", km, min),
            (Some(km), None) => println!("  {:.2} km from origin (great-circle)", km),
            _ => {}
        }
    }

    if locations.len() > 1 {
        println!();
        println!("Great-circle distances:");
        for pair in pairwise_distances(&locations) {
            println!("  {} -> {}: {:.2} km", pair.from, pair.to, pair.km);
        }
    }

    if opts.route {
        if let Some(router) = &router {
            let points: Vec<(f64, f64)> = locations.iter().map(|l| l.coords()).collect();
            println!();
            if points.len() < 2 {
                println!("Route: needs at least two located photos.");
            } else {
                let summary = router.route(&points).await?;
                println!(
                    "Route through {} photos: {:.2} km, {:.0} min",
                    points.len(),
                    summary.distance_km,
                    summary.duration_min
                );
                for (leg, pair) in summary.legs.iter().zip(locations.windows(2)) {
                    println!(
                        "  {} -> {}: {:.2} km, {:.0} min",
                        pair[0].filename, pair[1].filename, leg.distance_km, leg.duration_min
                    );
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Little-endian TIFF with an IFD0 pointing at a GPS IFD holding the
    /// four position tags. Seconds are stored with a denominator of 100.
    fn gps_tiff(lat: (u32, u32, f64), lat_ref: u8, lon: (u32, u32, f64), lon_ref: u8) -> Vec<u8> {
        fn u16le(buf: &mut Vec<u8>, v: u16) {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        fn u32le(buf: &mut Vec<u8>, v: u32) {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        fn entry(buf: &mut Vec<u8>, tag: u16, typ: u16, count: u32, value: [u8; 4]) {
            u16le(buf, tag);
            u16le(buf, typ);
            u32le(buf, count);
            buf.extend_from_slice(&value);
        }

        const GPS_IFD: u32 = 26;
        const LAT_DATA: u32 = 80;
        const LON_DATA: u32 = 104;

        let mut b = Vec::new();
        b.extend_from_slice(b"II");
        u16le(&mut b, 42);
        u32le(&mut b, 8);

        // IFD0: GPSInfo pointer
        u16le(&mut b, 1);
        entry(&mut b, 0x8825, 4, 1, GPS_IFD.to_le_bytes());
        u32le(&mut b, 0);
        assert_eq!(b.len() as u32, GPS_IFD);

        // GPS IFD
        u16le(&mut b, 4);
        entry(&mut b, 0x0001, 2, 2, [lat_ref, 0, 0, 0]);
        entry(&mut b, 0x0002, 5, 3, LAT_DATA.to_le_bytes());
        entry(&mut b, 0x0003, 2, 2, [lon_ref, 0, 0, 0]);
        entry(&mut b, 0x0004, 5, 3, LON_DATA.to_le_bytes());
        u32le(&mut b, 0);
        assert_eq!(b.len() as u32, LAT_DATA);

        for (d, m, s) in [lat, lon] {
            u32le(&mut b, d);
            u32le(&mut b, 1);
            u32le(&mut b, m);
            u32le(&mut b, 1);
            u32le(&mut b, (s * 100.0).round() as u32);
            u32le(&mut b, 100);
        }
        b
    }

    #[test]
    fn dms_signs_follow_hemisphere() {
        let n = dms_to_decimal(40.0, 26.0, 46.302, "N").unwrap();
        assert!((n - 40.446195).abs() < 1e-6);
        assert!((dms_to_decimal(40.0, 26.0, 46.302, "s").unwrap() + n).abs() < 1e-12);
        assert_eq!(dms_to_decimal(10.0, 30.0, 0.0, "E").unwrap(), 10.5);
        assert_eq!(dms_to_decimal(10.0, 30.0, 0.0, "W").unwrap(), -10.5);
        assert!(matches!(
            dms_to_decimal(1.0, 0.0, 0.0, "X"),
            Err(GeoError::InvalidReference(_))
        ));
    }

    #[test]
    fn haversine_reference_distances() {
        assert_eq!(haversine_km((12.0, 34.0), (12.0, 34.0)), 0.0);
        assert!((haversine_km((0.0, 0.0), (0.0, 1.0)) - 111.195).abs() < 0.001);
        let paris_london = haversine_km((48.8566, 2.3522), (51.5074, -0.1278));
        assert!((paris_london - 343.56).abs() < 0.1);
        // symmetric
        assert_eq!(
            paris_london,
            haversine_km((51.5074, -0.1278), (48.8566, 2.3522))
        );
        // antipodal stays finite
        assert!((haversine_km((0.0, 0.0), (0.0, 180.0)) - 20015.11).abs() < 0.1);
    }

    #[test]
    fn coordinates_parse_and_validate() {
        assert_eq!(parse_coords("48.85, 2.35").unwrap(), (48.85, 2.35));
        assert!(parse_coords("91,0").is_err());
        assert!(parse_coords("0,181").is_err());
        assert!(parse_coords("nope").is_err());
    }

    #[test]
    fn pairwise_covers_every_pair_once() {
        let locs = vec![
            PhotoLocation::new("a.jpg", 0.0, 0.0),
            PhotoLocation::new("b.jpg", 0.0, 1.0),
            PhotoLocation::new("c.jpg", 1.0, 0.0),
        ];
        let pairs = pairwise_distances(&locs);
        assert_eq!(pairs.len(), 3);
        assert_eq!((pairs[0].from.as_str(), pairs[0].to.as_str()), ("a.jpg", "b.jpg"));
        assert_eq!((pairs[2].from.as_str(), pairs[2].to.as_str()), ("b.jpg", "c.jpg"));
        assert!(pairwise_distances(&locs[..1]).is_empty());
    }

    #[test]
    fn gps_is_read_from_exif() {
        let tiff = gps_tiff((40, 26, 46.30), b'N', (79, 58, 56.0), b'W');
        let (lat, lon) = read_gps(&tiff).unwrap().unwrap();
        assert!((lat - 40.446194).abs() < 1e-5);
        assert!((lon + 79.982222).abs() < 1e-5);
    }

    #[test]
    fn southern_eastern_hemispheres() {
        let tiff = gps_tiff((33, 51, 54.0), b'S', (151, 12, 36.0), b'E');
        let (lat, lon) = read_gps(&tiff).unwrap().unwrap();
        assert!(lat < 0.0 && lon > 0.0);
        assert!((lat + 33.865).abs() < 1e-6);
        assert!((lon - 151.21).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let tiff = gps_tiff((95, 0, 0.0), b'N', (10, 0, 0.0), b'E');
        assert!(matches!(
            read_gps(&tiff),
            Err(GeoError::OutOfRange { axis: "latitude", .. })
        ));
    }

    #[test]
    fn non_image_bytes_are_an_error() {
        assert!(read_gps(b"definitely not an image").is_err());
    }

    #[test]
    fn osrm_response_parsing() {
        let json = serde_json::json!({
            "code": "Ok",
            "routes": [{
                "distance": 12500.0,
                "duration": 900.0,
                "legs": [
                    {"distance": 5000.0, "duration": 300.0},
                    {"distance": 7500.0, "duration": 600.0}
                ]
            }]
        });
        let summary = parse_osrm_response(&json).unwrap();
        assert_eq!(summary.distance_km, 12.5);
        assert_eq!(summary.duration_min, 15.0);
        assert_eq!(summary.legs.len(), 2);
        assert_eq!(summary.legs[1].duration_min, 10.0);

        let no_route = serde_json::json!({"code": "NoRoute", "message": "Impossible route"});
        assert!(parse_osrm_response(&no_route)
            .unwrap_err()
            .to_string()
            .contains("NoRoute"));
        assert!(parse_osrm_response(&serde_json::json!({"code": "Ok", "routes": []})).is_err());
    }

    #[tokio::test]
    async fn routing_against_mock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/route/v1/driving/2.352200,48.856600;-0.127800,51.507400",
            ))
            .and(query_param("overview", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "Ok",
                "routes": [{"distance": 459000.0, "duration": 27000.0, "legs": [{"distance": 459000.0, "duration": 27000.0}]}]
            })))
            .mount(&server)
            .await;

        let client = RoutingClient::new(&RoutingConfig {
            url: server.uri(),
            ..RoutingConfig::default()
        })
        .unwrap();
        let summary = client
            .route(&[(48.8566, 2.3522), (51.5074, -0.1278)])
            .await
            .unwrap();
        assert_eq!(summary.distance_km, 459.0);
        assert_eq!(summary.duration_min, 450.0);

        assert!(client.route(&[(0.0, 0.0)]).await.is_err());
    }

    #[tokio::test]
    async fn reverse_geocoding_against_mock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("lat", "48.858400"))
            .and(header("user-agent", "askdoc-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "display_name": "Tour Eiffel, Paris, France"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "Unable to geocode"
            })))
            .mount(&server)
            .await;

        let mut client = GeocodingClient::new(&GeocodingConfig {
            url: server.uri(),
            user_agent: "askdoc-test".to_string(),
            ..GeocodingConfig::default()
        })
        .unwrap();
        client.min_interval = Duration::from_millis(10);
        assert_eq!(
            client.reverse(48.8584, 2.2945).await.unwrap().as_deref(),
            Some("Tour Eiffel, Paris, France")
        );
        assert_eq!(client.reverse(0.0, -30.0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn reverse_geocoding_waits_between_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "display_name": "Somewhere"
            })))
            .expect(3)
            .mount(&server)
            .await;

        let mut client = GeocodingClient::new(&GeocodingConfig {
            url: server.uri(),
            ..GeocodingConfig::default()
        })
        .unwrap();
        assert_eq!(client.min_interval, Duration::from_secs(1));
        client.min_interval = Duration::from_millis(200);

        let started = std::time::Instant::now();
        for _ in 0..3 {
            client.reverse(1.0, 2.0).await.unwrap();
        }
        assert!(
            started.elapsed() >= Duration::from_millis(400),
            "three requests finished in {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn locate_photos_skips_files_without_gps() {
        let tmp = tempfile::TempDir::new().unwrap();
        let good = tmp.path().join("trail.tif");
        let bad = tmp.path().join("notes.jpg");
        std::fs::write(&good, gps_tiff((46, 0, 0.0), b'N', (7, 30, 0.0), b'E')).unwrap();
        std::fs::write(&bad, b"not a jpeg").unwrap();

        let found = locate_photos(&[good, bad, tmp.path().join("missing.jpg")]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].filename, "trail.tif");
        assert_eq!(found[0].coords(), (46.0, 7.5));
    }
}
