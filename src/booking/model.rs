//! Booking documents and creation parameters.

use super::state::{Actor, BookingState, StateTransition};
use crate::entity::Document;
use crate::error::{Error, Result};
use crate::geo::GeoPoint;
use crate::pricing::CommissionSplit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the customer asked for the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingType {
    /// Immediate request, provider answers within the response window.
    #[default]
    BookNow,
    /// Session at a later time.
    Scheduled { at: DateTime<Utc> },
}

/// Input to `BookingEngine::create_booking`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateBookingParams {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub provider_id: String,
    pub provider_name: String,
    pub service_type: String,
    pub duration_minutes: u32,
    /// Price in base currency units.
    pub total_price: i64,
    /// Blank or `None` falls back to the configured default zone.
    pub location_zone: Option<String>,
    pub coordinates: Option<GeoPoint>,
    pub booking_type: BookingType,
}

impl CreateBookingParams {
    /// Reject incomplete requests before any state is created.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        let required = [
            (&self.customer_id, "customer id"),
            (&self.provider_id, "provider id"),
            (&self.provider_name, "provider name"),
            (&self.customer_name, "customer name"),
        ];
        for (value, field) in required {
            if value.trim().is_empty() {
                return Err(Error::ValidationError(format!("{} required", field)));
            }
        }

        if self.total_price <= 0 {
            return Err(Error::ValidationError("valid price required".to_string()));
        }
        if self.duration_minutes == 0 {
            return Err(Error::ValidationError("valid duration required".to_string()));
        }
        if let BookingType::Scheduled { at } = self.booking_type {
            if at <= now {
                return Err(Error::ValidationError(format!(
                    "scheduled time {} is not in the future",
                    at
                )));
            }
        }
        Ok(())
    }
}

/// A booking and its full lifecycle record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub provider_id: String,
    pub provider_name: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub service_type: String,
    pub duration_minutes: u32,
    pub total_price: i64,
    pub location_zone: String,
    pub coordinates: Option<GeoPoint>,
    pub booking_type: BookingType,
    pub state: BookingState,
    pub response_deadline: DateTime<Utc>,
    pub confirmation_deadline: Option<DateTime<Utc>>,
    pub commission: CommissionSplit,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub history: Vec<StateTransition>,
    pub last_error: Option<String>,
    pub error_count: u32,
}

impl Booking {
    /// Move to `to`, appending a history entry.
    ///
    /// # Errors
    ///
    /// `Error::InvalidTransition` if the edge is not in the transition table;
    /// the booking is left untouched.
    pub fn transition(
        &mut self,
        to: BookingState,
        reason: impl Into<String>,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }

        let reason = reason.into();
        debug!(
            "Booking {}: {} -> {} by {} ({})",
            self.id, self.state, to, actor, reason
        );
        self.history.push(StateTransition {
            from: self.state,
            to,
            at: now,
            reason,
            actor,
        });
        self.state = to;
        self.updated_at = now;
        Ok(())
    }

    /// Note a failed operation without changing state.
    pub fn record_error(&mut self, code: &str, message: &str) {
        self.last_error = Some(format!("{}: {}", code, message));
        self.error_count += 1;
    }

    /// Deadline the booking is currently racing, if any.
    pub fn active_deadline(&self) -> Option<DateTime<Utc>> {
        match self.state {
            BookingState::PendingTherapist => Some(self.response_deadline),
            BookingState::Accepted => self.confirmation_deadline,
            _ => None,
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.active_deadline().is_some_and(|deadline| now >= deadline)
    }
}

impl Document for Booking {
    type Id = String;

    fn document_id(&self) -> Self::Id {
        self.id.clone()
    }

    fn collection() -> &'static str {
        "bookings"
    }

    fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::ValidationError("booking id must not be empty".to_string()));
        }
        if self.commission.commission + self.commission.payout != self.total_price {
            return Err(Error::ValidationError(format!(
                "booking {} commission split does not add up to its price",
                self.id
            )));
        }
        Ok(())
    }
}
