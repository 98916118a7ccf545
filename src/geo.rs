//! Great-circle distance and coordinate normalization.

use crate::provider::{value_as_f64, Provider};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mean earth radius used by the distance labels, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lat, lng }
    }

    /// Finite and inside the latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_meters(self, other)
    }
}

/// Haversine distance between two points, in meters.
pub fn haversine_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Read a provider's position from whichever encoding it carries.
///
/// Tried in order, first success wins:
/// 1. `geopoint` as `{lat, lng}`
/// 2. `coordinates` as a `[lng, lat]` array
/// 3. `coordinates` as a JSON string holding either shape
/// 4. `coordinates` as a `{lat, lng}` object
pub fn normalize_coordinates(provider: &Provider) -> Option<GeoPoint> {
    if let Some(point) = provider.geopoint.as_ref().and_then(point_from_object) {
        return Some(point);
    }

    let raw = provider.coordinates.as_ref()?;
    let point = match raw {
        Value::Array(_) => point_from_array(raw),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed) => point_from_array(&parsed).or_else(|| point_from_object(&parsed)),
            Err(e) => {
                warn!(
                    "Unparseable coordinates for provider {}: {}",
                    provider.id, e
                );
                None
            }
        },
        Value::Object(_) => point_from_object(raw),
        _ => None,
    };

    if point.is_none() {
        debug!("No usable location for provider {}", provider.id);
    }
    point
}

fn point_from_array(value: &Value) -> Option<GeoPoint> {
    match value.as_array()?.as_slice() {
        [lng, lat, ..] => checked(GeoPoint::new(value_as_f64(lat)?, value_as_f64(lng)?)),
        _ => None,
    }
}

fn point_from_object(value: &Value) -> Option<GeoPoint> {
    let object = value.as_object()?;
    let lat = object.get("lat").and_then(value_as_f64)?;
    let lng = object.get("lng").and_then(value_as_f64)?;
    checked(GeoPoint::new(lat, lng))
}

fn checked(point: GeoPoint) -> Option<GeoPoint> {
    point.is_valid().then_some(point)
}

/// Display label for a distance: `450m away`, `2.3km away`.
pub fn format_distance(meters: f64) -> String {
    let rounded = meters.round();
    if rounded < 1000.0 {
        format!("{}m away", rounded as i64)
    } else {
        format!("{:.1}km away", meters / 1000.0)
    }
}

/// Distance label from the user to a provider, `None` when either position
/// is unknown.
pub fn distance_label(user: Option<&GeoPoint>, provider: &Provider) -> Option<String> {
    let user = user.filter(|p| p.is_valid())?;
    let target = normalize_coordinates(provider)?;
    Some(format_distance(haversine_meters(user, &target)))
}
