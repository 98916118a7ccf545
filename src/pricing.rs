//! Price resolution, discount windows and the commission split.
//!
//! Providers store prices in thousands of currency units, either as three
//! discrete fields or as a legacy JSON blob keyed by duration. The resolver
//! normalizes both into a `PriceTable` in base units.
//!
//! # Sources
//!
//! | Source | Used when | Scaling |
//! |--------|-----------|---------|
//! | **Discrete** | any of `price60/90/120` is a positive integer | ×1000, non-positive → 0 |
//! | **LegacyJson** | no positive discrete field, `pricing` parses | ×1000, missing → 0 |
//! | **Fallback** | neither of the above | configured defaults |
//!
//! An active discount then scales every entry by `1 - percentage/100`,
//! rounded to the nearest unit.

use crate::provider::{parse_timestamp, value_as_f64, Provider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Session durations offered by every provider, in minutes.
pub const DURATIONS: [u32; 3] = [60, 90, 120];

const UNIT_SCALE: i64 = 1000;

/// Prices for the three standard session lengths, in base currency units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceTable {
    pub min60: i64,
    pub min90: i64,
    pub min120: i64,
}

impl PriceTable {
    /// Defaults shown when a provider's pricing is unreadable.
    pub const FALLBACK: PriceTable = PriceTable {
        min60: 200_000,
        min90: 300_000,
        min120: 400_000,
    };

    pub const fn new(min60: i64, min90: i64, min120: i64) -> Self {
        PriceTable {
            min60,
            min90,
            min120,
        }
    }

    /// Price for a session length. `None` for lengths that are not offered.
    pub fn for_duration(&self, minutes: u32) -> Option<i64> {
        match minutes {
            60 => Some(self.min60),
            90 => Some(self.min90),
            120 => Some(self.min120),
            _ => None,
        }
    }

    /// True when no duration has a price.
    pub fn is_empty(&self) -> bool {
        self.min60 <= 0 && self.min90 <= 0 && self.min120 <= 0
    }

    /// Apply a percentage reduction to every entry.
    ///
    /// The percentage is clamped to `0..=100`.
    pub fn discounted(&self, percentage: f64) -> PriceTable {
        let factor = 1.0 - percentage.clamp(0.0, 100.0) / 100.0;
        let apply = |price: i64| (price as f64 * factor).round() as i64;

        PriceTable {
            min60: apply(self.min60),
            min90: apply(self.min90),
            min120: apply(self.min120),
        }
    }

    /// Serialize in the legacy stored shape, in thousands:
    /// `{"60":200,"90":300,"120":400}`.
    ///
    /// Feeding the result back through `parse_legacy_json` yields the same
    /// table.
    pub fn to_legacy_json(&self) -> String {
        let mut map = Map::new();
        for minutes in DURATIONS {
            let price = self.for_duration(minutes).unwrap_or(0);
            map.insert(minutes.to_string(), thousands_value(price));
        }
        Value::Object(map).to_string()
    }
}

fn thousands_value(price: i64) -> Value {
    if price % UNIT_SCALE == 0 {
        Value::from(price / UNIT_SCALE)
    } else {
        Number::from_f64(price as f64 / UNIT_SCALE as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Where a resolved price table came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    Discrete,
    LegacyJson,
    Fallback,
}

/// Outcome of price resolution for one provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPricing {
    /// Prices before any discount.
    pub base: PriceTable,
    /// Prices the customer pays right now.
    pub effective: PriceTable,
    /// Percentage applied, when a discount window is running.
    pub discount_percentage: Option<f64>,
    pub source: PriceSource,
}

impl ResolvedPricing {
    pub fn has_discount(&self) -> bool {
        self.discount_percentage.is_some()
    }
}

/// Whether the provider's discount window is running at `now`.
///
/// All three conditions must hold: a positive percentage, the active flag,
/// and an end time that parses and lies in the future.
pub fn is_discount_active(provider: &Provider, now: DateTime<Utc>) -> bool {
    active_discount(provider, now).is_some()
}

/// Percentage of the running discount, if any.
pub fn active_discount(provider: &Provider, now: DateTime<Utc>) -> Option<f64> {
    let percentage = provider.discount_percentage.filter(|p| *p > 0.0)?;
    if !provider.is_discount_active {
        return None;
    }
    let end = provider
        .discount_end_time
        .as_deref()
        .and_then(parse_timestamp)?;

    (now < end).then_some(percentage)
}

/// Resolve the undiscounted price table.
pub fn resolve_base_prices(provider: &Provider, fallback: &PriceTable) -> (PriceTable, PriceSource) {
    if let Some(table) = from_discrete_fields(provider) {
        return (table, PriceSource::Discrete);
    }

    match provider.pricing.as_ref() {
        Some(raw) => match parse_legacy_value(raw) {
            Some(table) => (table, PriceSource::LegacyJson),
            None => {
                warn!(
                    "Unreadable pricing for provider {}, using defaults",
                    provider.id
                );
                (*fallback, PriceSource::Fallback)
            }
        },
        None => (*fallback, PriceSource::Fallback),
    }
}

/// Resolve the prices a customer sees at `now`, discount included.
pub fn resolve_pricing(provider: &Provider, now: DateTime<Utc>, fallback: &PriceTable) -> ResolvedPricing {
    let (base, source) = resolve_base_prices(provider, fallback);
    let discount_percentage = active_discount(provider, now);
    let effective = match discount_percentage {
        Some(percentage) => base.discounted(percentage),
        None => base,
    };

    ResolvedPricing {
        base,
        effective,
        discount_percentage,
        source,
    }
}

/// Entries that are missing, non-positive or too large to scale count as
/// unpriced. `None` when no entry is left.
fn from_discrete_fields(provider: &Provider) -> Option<PriceTable> {
    let scale = |p: Option<i64>| {
        p.filter(|v| *v > 0)
            .and_then(|v| v.checked_mul(UNIT_SCALE))
            .unwrap_or(0)
    };
    let table = PriceTable {
        min60: scale(provider.price60),
        min90: scale(provider.price90),
        min120: scale(provider.price120),
    };

    (!table.is_empty()).then_some(table)
}

/// Parse the legacy pricing blob (`{"60":200,"90":300,"120":400}`).
///
/// Returns `None` if the text is not a JSON object.
pub fn parse_legacy_json(raw: &str) -> Option<PriceTable> {
    let value: Value = serde_json::from_str(raw).ok()?;
    table_from_object(&value)
}

fn parse_legacy_value(raw: &Value) -> Option<PriceTable> {
    match raw {
        Value::String(text) => parse_legacy_json(text),
        other => table_from_object(other),
    }
}

fn table_from_object(value: &Value) -> Option<PriceTable> {
    let object = value.as_object()?;
    let entry = |minutes: &str| {
        object
            .get(minutes)
            .and_then(value_as_f64)
            .map_or(0, |thousands| (thousands * UNIT_SCALE as f64).round() as i64)
    };

    Some(PriceTable {
        min60: entry("60"),
        min90: entry("90"),
        min120: entry("120"),
    })
}

/// Platform commission and provider payout for one booking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    pub price: i64,
    pub commission: i64,
    pub payout: i64,
}

/// Split `price` into platform commission and provider payout.
///
/// `commission = round(price × rate)`; the payout is the remainder, so the
/// two always add up to the price.
pub fn split_commission(price: i64, rate: f64) -> CommissionSplit {
    let commission = (price as f64 * rate).round() as i64;
    CommissionSplit {
        price,
        commission,
        payout: price - commission,
    }
}

/// Card label for a price: `Rp 250K`.
pub fn format_price(price: i64) -> String {
    format!("Rp {}K", (price as f64 / UNIT_SCALE as f64).round() as i64)
}
