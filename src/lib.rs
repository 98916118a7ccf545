//! # indastreet-kit
//!
//! Marketplace domain logic for a wellness booking platform: which providers
//! are available, what they cost right now, how far away they are, and the
//! lifecycle of a booking from request to completion.
//!
//! ## Features
//!
//! - **Status:** One canonical `Available | Busy | Offline` resolver over
//!   overlapping legacy and current availability fields
//! - **Pricing:** Discrete or legacy-JSON price tables, discount windows,
//!   platform commission split
//! - **Distance:** Haversine distance with tolerant coordinate decoding
//! - **Countdowns:** Remaining/overtime timers and deadline watchers on tokio,
//!   cancelled on drop
//! - **Bookings:** A state machine with transition history, response and
//!   confirmation deadlines and automatic expiry
//! - **Storage:** Async document repositories and a TTL session store with
//!   versioned snapshots
//!
//! ## Quick Start
//!
//! ```ignore
//! use indastreet_kit::{MarketplaceConfig, MarketplaceService};
//! use indastreet_kit::repository::InMemoryRepository;
//! use indastreet_kit::service::BookingRequest;
//!
//! let service = MarketplaceService::new(
//!     providers_repository,
//!     InMemoryRepository::new(),
//!     MarketplaceConfig::from_env()?,
//! )?;
//!
//! // Provider cards, nearest first
//! let cards = service.nearby(Some(&user_location), chrono::Utc::now()).await?;
//!
//! // Book the first one for 90 minutes
//! let booking = service
//!     .request_booking(BookingRequest {
//!         customer_id: "c_1".to_string(),
//!         customer_name: "Alice".to_string(),
//!         provider_id: cards[0].provider_id.clone(),
//!         duration_minutes: 90,
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! // The provider answers within the response window
//! service.engine().accept_booking(&booking.id, &booking.provider_id).await?;
//! ```

#[macro_use]
extern crate log;

pub mod booking;
pub mod config;
pub mod countdown;
pub mod entity;
pub mod error;
pub mod geo;
pub mod key;
pub mod observability;
pub mod pricing;
pub mod provider;
pub mod repository;
pub mod serialization;
pub mod service;
pub mod status;
pub mod storage;

// Re-exports for convenience
pub use booking::{Actor, Booking, BookingEngine, BookingState, CreateBookingParams};
pub use config::MarketplaceConfig;
pub use countdown::{CountdownSnapshot, CountdownTimer, DeadlineWatcher};
pub use entity::Document;
pub use error::{Error, Result};
pub use geo::GeoPoint;
pub use pricing::{CommissionSplit, PriceTable, ResolvedPricing};
pub use provider::Provider;
pub use repository::DocumentRepository;
pub use service::{MarketplaceService, ProviderListing};
pub use status::AvailabilityStatus;
pub use storage::KeyValueStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
