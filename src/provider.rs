//! Provider listings (therapists and massage places) as stored in the backend.
//!
//! Provider documents are denormalized and written by several generations of
//! the dashboard, so the same field can arrive as a number, a numeric string,
//! an empty string or `null`. Deserialization here is deliberately lenient:
//! anything that cannot be read becomes absent, and the resolvers in
//! `status`, `pricing` and `geo` decide what absent means.

use crate::entity::Document;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// What kind of listing a provider is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Therapist,
    Place,
}

/// A therapist or place record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Provider {
    #[serde(alias = "$id")]
    pub id: String,
    pub name: String,
    pub kind: ProviderKind,

    // Availability
    pub status: Option<String>,
    pub availability: Option<String>,
    pub busy_until: Option<String>,
    /// Legacy busy marker, superseded by `busy_until`.
    pub booked_until: Option<String>,
    /// Newer schema: timestamp string set while available.
    pub available: Option<String>,
    /// Newer schema: timestamp string set while busy.
    pub busy: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_showcase_profile: bool,

    // Discount window
    #[serde(deserialize_with = "lenient_f64")]
    pub discount_percentage: Option<f64>,
    pub discount_end_time: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_discount_active: bool,

    // Pricing, in thousands of currency units
    #[serde(deserialize_with = "lenient_i64")]
    pub price60: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub price90: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub price120: Option<i64>,
    /// Legacy pricing blob, usually a JSON string like `{"60":200,"90":300}`.
    pub pricing: Option<Value>,

    // Location
    pub location: Option<String>,
    pub geopoint: Option<Value>,
    pub coordinates: Option<Value>,

    // Reputation
    #[serde(deserialize_with = "lenient_f64")]
    pub rating: Option<f64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub review_count: Option<i64>,
}

impl Provider {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Provider {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Rating shown on cards: the stored rating once there is at least one
    /// review, otherwise zero.
    pub fn display_rating(&self) -> f64 {
        match self.review_count {
            Some(count) if count > 0 => self.rating.unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// City part of the free-text location ("Ubud, Bali" -> "Ubud").
    pub fn city(&self) -> Option<&str> {
        self.location
            .as_deref()
            .and_then(|loc| loc.split(',').next())
            .map(str::trim)
            .filter(|city| !city.is_empty())
    }
}

impl Document for Provider {
    type Id = String;

    fn document_id(&self) -> Self::Id {
        self.id.clone()
    }

    fn collection() -> &'static str {
        "providers"
    }

    fn validate(&self) -> crate::Result<()> {
        if self.id.trim().is_empty() {
            return Err(crate::Error::ValidationError(
                "provider id must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 (`2026-01-01T10:00:00.000Z`), naive ISO timestamps
/// (interpreted as UTC) and epoch milliseconds. Anything else is `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis);
    }

    None
}

/// Leading-integer parse: `"250"` -> 250, `"250k"` -> 250, `"12.9"` -> 12.
pub(crate) fn parse_leading_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

pub(crate) fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_i64(&value))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_f64(&value))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}
