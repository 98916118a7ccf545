//! Booking lifecycle: states, documents and the engine driving them.

pub mod engine;
pub mod model;
pub mod state;

pub use engine::{active_snapshot_key, BookingEngine, ExpirySweep};
pub use model::{Booking, BookingType, CreateBookingParams};
pub use state::{Actor, BookingState, StateTransition};
