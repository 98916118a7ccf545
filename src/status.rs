//! Availability status resolution.
//!
//! A provider record carries several overlapping availability signals. The
//! order of checks below fixes their precedence:
//!
//! 1. `busyUntil` in the future → Busy
//! 2. legacy `bookedUntil` in the future → Busy
//! 3. `availability ?? status ?? "Available"`, case-insensitive; unknown
//!    values resolve to Available so a transient data issue never hides a
//!    provider
//! 4. a showcase profile is always Busy
//! 5. only when step 3 gave Offline, the newer `available` / `busy` string
//!    fields may override it (Busy wins if both are set)

use crate::provider::{parse_timestamp, Provider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tri-state availability shown on every provider card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    #[default]
    Available,
    Busy,
    Offline,
}

impl AvailabilityStatus {
    /// Case-insensitive mapping of a stored status string.
    ///
    /// Returns `None` for values that are not one of the three statuses.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "available" => Some(AvailabilityStatus::Available),
            "busy" => Some(AvailabilityStatus::Busy),
            "offline" => Some(AvailabilityStatus::Offline),
            _ => None,
        }
    }

    /// Whether a book-now request may be sent.
    pub fn accepts_instant_booking(&self) -> bool {
        matches!(self, AvailabilityStatus::Available)
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityStatus::Available => write!(f, "Available"),
            AvailabilityStatus::Busy => write!(f, "Busy"),
            AvailabilityStatus::Offline => write!(f, "Offline"),
        }
    }
}

/// Resolve the display status of a provider at `now`. Never fails.
pub fn resolve_status(provider: &Provider, now: DateTime<Utc>) -> AvailabilityStatus {
    if provider.is_showcase_profile {
        debug!("Showcase profile {} forced to Busy", provider.id);
        return AvailabilityStatus::Busy;
    }

    if busy_window_end(provider, now).is_some() {
        return AvailabilityStatus::Busy;
    }

    let base = non_blank(&provider.availability)
        .or_else(|| non_blank(&provider.status))
        .unwrap_or("Available");

    let status = AvailabilityStatus::parse(base).unwrap_or_else(|| {
        debug!(
            "Unrecognized status '{}' for provider {}, showing Available",
            base, provider.id
        );
        AvailabilityStatus::Available
    });

    if status == AvailabilityStatus::Offline {
        return schema_field_fallback(provider).unwrap_or(status);
    }

    status
}

/// End of the provider's current busy window, if one is running at `now`.
///
/// `busyUntil` takes precedence over the legacy `bookedUntil`; a value that
/// does not parse counts as absent.
pub fn busy_window_end(provider: &Provider, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    future_timestamp(&provider.busy_until, now).or_else(|| future_timestamp(&provider.booked_until, now))
}

fn future_timestamp(raw: &Option<String>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    raw.as_deref()
        .and_then(parse_timestamp)
        .filter(|until| *until > now)
}

fn schema_field_fallback(provider: &Provider) -> Option<AvailabilityStatus> {
    let has_available = non_blank(&provider.available).is_some();
    let has_busy = non_blank(&provider.busy).is_some();

    match (has_available, has_busy) {
        (_, true) => Some(AvailabilityStatus::Busy),
        (true, false) => Some(AvailabilityStatus::Available),
        (false, false) => None,
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
