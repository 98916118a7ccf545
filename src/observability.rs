//! Metrics hooks for the booking lifecycle.
//!
//! Implement `BookingMetrics` to forward booking events to a monitoring
//! system:
//!
//! ```ignore
//! use indastreet_kit::observability::BookingMetrics;
//! use indastreet_kit::BookingState;
//!
//! struct PrometheusMetrics;
//!
//! impl BookingMetrics for PrometheusMetrics {
//!     fn record_transition(&self, _booking_id: &str, from: BookingState, to: BookingState) {
//!         // counter!("booking_transitions", "from" => from.as_str(), "to" => to.as_str()).inc();
//!     }
//! }
//!
//! let engine = BookingEngine::with_metrics(repository, config, Box::new(PrometheusMetrics))?;
//! ```
//!
//! Methods that are not overridden log through the `log` crate. The engine
//! defaults to `NoOpMetrics`, which records nothing.
//!
//! | Hook | Fired when |
//! |------|------------|
//! | `record_created` | a booking reached PENDING_THERAPIST |
//! | `record_transition` | any state change, creation steps included |
//! | `record_expired` | a response or confirmation deadline passed |
//! | `record_persist` | a booking write succeeded |
//! | `record_error` | an operation on a booking failed |

use crate::booking::BookingState;
use std::time::Duration;

/// Trait for booking metrics collection.
pub trait BookingMetrics: Send + Sync {
    /// A booking finished creation and is waiting for its provider.
    fn record_created(&self, booking_id: &str, duration: Duration) {
        info!("Booking CREATED: {} took {:?}", booking_id, duration);
    }

    /// A booking changed state.
    fn record_transition(&self, booking_id: &str, from: BookingState, to: BookingState) {
        debug!("Booking TRANSITION: {} {} -> {}", booking_id, from, to);
    }

    /// A booking ran out of time.
    fn record_expired(&self, booking_id: &str, state: BookingState) {
        info!("Booking EXPIRED: {} while {}", booking_id, state);
    }

    /// A booking was written to the repository.
    fn record_persist(&self, booking_id: &str, duration: Duration) {
        debug!("Booking PERSIST: {} took {:?}", booking_id, duration);
    }

    /// An operation failed.
    fn record_error(&self, booking_id: &str, error: &str) {
        warn!("Booking ERROR for {}: {}", booking_id, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl BookingMetrics for NoOpMetrics {
    fn record_created(&self, _booking_id: &str, _duration: Duration) {}
    fn record_transition(&self, _booking_id: &str, _from: BookingState, _to: BookingState) {}
    fn record_expired(&self, _booking_id: &str, _state: BookingState) {}
    fn record_persist(&self, _booking_id: &str, _duration: Duration) {}
    fn record_error(&self, _booking_id: &str, _error: &str) {}
}

/// Metrics that only log, using the trait defaults.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl BookingMetrics for LogMetrics {}
