//! The booking engine: the one place booking state changes.
//!
//! Every mutation follows the same order: check and transition the booking in
//! memory under its map entry, re-arm or drop its deadline watcher, then write
//! it to the repository. A failed write moves the booking to FAILED when the
//! transition table allows it.
//!
//! Writes for one booking are serialized by a per-booking lock, and every
//! attempt (retries included) stores the booking as it is in memory at that
//! moment. A retry can therefore never put an older state back.
//!
//! Deadline watchers hold a weak handle to the engine, so dropping the last
//! engine clone aborts every pending expiry.

use super::model::{Booking, CreateBookingParams};
use super::state::{Actor, BookingState, StateTransition};
use crate::config::MarketplaceConfig;
use crate::countdown::DeadlineWatcher;
use crate::error::{Error, Result};
use crate::key::DocumentKey;
use crate::observability::{BookingMetrics, NoOpMetrics};
use crate::pricing::split_commission;
use crate::repository::DocumentRepository;
use crate::serialization::{decode_snapshot, encode_snapshot};
use crate::storage::KeyValueStore;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Session-store key holding the snapshot of open bookings.
pub fn active_snapshot_key() -> String {
    DocumentKey::build_composite(&["bookings", "active", "snapshot"])
}

struct EngineInner<R> {
    repository: R,
    config: MarketplaceConfig,
    metrics: Box<dyn BookingMetrics>,
    bookings: DashMap<String, Booking>,
    watchers: DashMap<String, DeadlineWatcher>,
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Outcome of one `expire_due` sweep.
///
/// Every due booking is expired in memory. `failed` lists those whose write
/// failed; they carry a `PERSIST_FAILED` error and moved on to FAILED where
/// allowed.
#[derive(Debug, Default, PartialEq)]
pub struct ExpirySweep {
    pub expired: Vec<String>,
    pub failed: Vec<(String, Error)>,
}

impl ExpirySweep {
    /// True when nothing was due.
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.failed.is_empty()
    }
}

/// Booking state machine backed by a document repository.
///
/// Cheap to clone; clones share bookings, watchers and the repository.
///
/// # Example
///
/// ```no_run
/// use indastreet_kit::booking::{BookingEngine, CreateBookingParams};
/// use indastreet_kit::repository::InMemoryRepository;
/// use indastreet_kit::MarketplaceConfig;
///
/// #[tokio::main]
/// async fn main() -> indastreet_kit::Result<()> {
///     let engine = BookingEngine::new(InMemoryRepository::new(), MarketplaceConfig::default())?;
///
///     let booking = engine
///         .create_booking(CreateBookingParams {
///             customer_id: "c_1".to_string(),
///             customer_name: "Alice".to_string(),
///             provider_id: "t_1".to_string(),
///             provider_name: "Budi".to_string(),
///             service_type: "balinese".to_string(),
///             duration_minutes: 60,
///             total_price: 200_000,
///             ..Default::default()
///         })
///         .await?;
///
///     engine.accept_booking(&booking.id, "t_1").await?;
///     engine.confirm_booking(&booking.id).await?;
///     Ok(())
/// }
/// ```
pub struct BookingEngine<R: DocumentRepository<Booking> + 'static> {
    inner: Arc<EngineInner<R>>,
}

impl<R: DocumentRepository<Booking> + 'static> Clone for BookingEngine<R> {
    fn clone(&self) -> Self {
        BookingEngine {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: DocumentRepository<Booking> + 'static> BookingEngine<R> {
    /// # Errors
    ///
    /// `Error::ConfigError` when `config` fails `validate()`.
    pub fn new(repository: R, config: MarketplaceConfig) -> Result<Self> {
        Self::with_metrics(repository, config, Box::new(NoOpMetrics))
    }

    /// Create an engine reporting to custom metrics.
    pub fn with_metrics(
        repository: R,
        config: MarketplaceConfig,
        metrics: Box<dyn BookingMetrics>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(BookingEngine {
            inner: Arc::new(EngineInner {
                repository,
                config,
                metrics,
                bookings: DashMap::new(),
                watchers: DashMap::new(),
                write_locks: DashMap::new(),
            }),
        })
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.inner.config
    }

    pub fn repository(&self) -> &R {
        &self.inner.repository
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Create a booking and start its provider response window.
    ///
    /// Walks IDLE → INITIATED → CREATED → PENDING_THERAPIST, snapshots the
    /// commission split, writes the booking and arms the expiry watcher.
    ///
    /// # Errors
    ///
    /// - `Error::ValidationError`: Missing or non-positive parameters
    /// - `Error::DuplicateBooking`: Same customer and provider already have an
    ///   open booking inside the duplicate window
    /// - `Error::RepositoryError`: The write failed after retries; the booking
    ///   is kept in FAILED state
    pub async fn create_booking(&self, params: CreateBookingParams) -> Result<Booking> {
        let timer = Instant::now();
        let now = Utc::now();

        if let Err(e) = params.validate(now) {
            warn!("Booking rejected for customer {}: {}", params.customer_id, e);
            self.inner.metrics.record_error(&params.customer_id, &e.to_string());
            return Err(e);
        }

        if let Some(existing) = self.find_duplicate(&params, now) {
            let e = Error::DuplicateBooking(existing);
            warn!("{}", e);
            self.inner.metrics.record_error(&params.customer_id, &e.to_string());
            return Err(e);
        }

        self.prune_terminal(now);

        let mut booking = self.new_booking(params, now);
        let steps = [
            (BookingState::Initiated, "Booking requested", Actor::Customer),
            (BookingState::Created, "Booking record created", Actor::System),
            (
                BookingState::PendingTherapist,
                "Waiting for therapist response",
                Actor::System,
            ),
        ];
        for (to, reason, actor) in steps {
            let from = booking.state;
            booking.transition(to, reason, actor, now)?;
            self.inner.metrics.record_transition(&booking.id, from, to);
        }

        self.inner
            .bookings
            .insert(booking.id.clone(), booking.clone());
        let booking = self.persist_or_fail(booking).await?;
        self.sync_watcher(&booking);

        info!(
            "Booking {} created for provider {}, respond by {}",
            booking.id, booking.provider_id, booking.response_deadline
        );
        self.inner
            .metrics
            .record_created(&booking.id, timer.elapsed());
        Ok(booking)
    }

    /// Provider accepts a pending booking; starts the confirmation window.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound`: Unknown booking
    /// - `Error::ProviderMismatch`: Booking belongs to another provider
    /// - `Error::InvalidTransition`: Booking is not PENDING_THERAPIST
    /// - `Error::DeadlinePassed`: Response window already closed
    pub async fn accept_booking(&self, booking_id: &str, provider_id: &str) -> Result<Booking> {
        self.ensure_loaded(booking_id).await?;
        let now = Utc::now();
        let confirmation_deadline = now + to_chrono(self.inner.config.confirmation_timeout);

        let booking = self.apply(
            booking_id,
            BookingState::Accepted,
            "Therapist accepted booking",
            Actor::Therapist,
            now,
            |booking| {
                ensure_provider(booking, provider_id)?;
                ensure_state(booking, &[BookingState::PendingTherapist], BookingState::Accepted)?;
                if now >= booking.response_deadline {
                    return Err(Error::DeadlinePassed(format!(
                        "booking {} response window closed at {}",
                        booking.id, booking.response_deadline
                    )));
                }
                Ok(())
            },
            |booking| booking.confirmation_deadline = Some(confirmation_deadline),
        )?;

        self.persist_or_fail(booking).await
    }

    /// Provider turns a booking down; it ends CANCELLED.
    pub async fn decline_booking(&self, booking_id: &str, provider_id: &str, reason: &str) -> Result<Booking> {
        self.ensure_loaded(booking_id).await?;
        let booking = self.apply(
            booking_id,
            BookingState::Cancelled,
            format!("Therapist declined: {}", reason),
            Actor::Therapist,
            Utc::now(),
            |booking| {
                ensure_provider(booking, provider_id)?;
                ensure_state(
                    booking,
                    &[BookingState::PendingTherapist, BookingState::Accepted],
                    BookingState::Cancelled,
                )
            },
            |_| {},
        )?;

        self.persist_or_fail(booking).await
    }

    /// Customer confirms an accepted booking.
    ///
    /// # Errors
    ///
    /// `Error::DeadlinePassed` once the confirmation window has closed.
    pub async fn confirm_booking(&self, booking_id: &str) -> Result<Booking> {
        self.ensure_loaded(booking_id).await?;
        let now = Utc::now();
        let booking = self.apply(
            booking_id,
            BookingState::Confirmed,
            "Customer confirmed booking",
            Actor::Customer,
            now,
            |booking| {
                ensure_state(booking, &[BookingState::Accepted], BookingState::Confirmed)?;
                match booking.confirmation_deadline {
                    Some(deadline) if now >= deadline => Err(Error::DeadlinePassed(format!(
                        "booking {} confirmation window closed at {}",
                        booking.id, deadline
                    ))),
                    _ => Ok(()),
                }
            },
            |_| {},
        )?;

        self.persist_or_fail(booking).await
    }

    /// Mark a confirmed booking as served.
    pub async fn complete_booking(&self, booking_id: &str) -> Result<Booking> {
        self.ensure_loaded(booking_id).await?;
        let booking = self.apply(
            booking_id,
            BookingState::Completed,
            "Service completed",
            Actor::Therapist,
            Utc::now(),
            |booking| ensure_state(booking, &[BookingState::Confirmed], BookingState::Completed),
            |_| {},
        )?;

        self.persist_or_fail(booking).await
    }

    /// Cancel a booking that has not reached a terminal state.
    pub async fn cancel_booking(&self, booking_id: &str, actor: Actor, reason: &str) -> Result<Booking> {
        self.ensure_loaded(booking_id).await?;
        let booking = self.apply(
            booking_id,
            BookingState::Cancelled,
            reason,
            actor,
            Utc::now(),
            |_| Ok(()),
            |_| {},
        )?;

        self.persist_or_fail(booking).await
    }

    /// Expire every booking whose active deadline is at or before `now`.
    ///
    /// A failed write does not stop the sweep; the booking is reported in
    /// `ExpirySweep::failed` and the rest are still processed. Calling it
    /// again with the same `now` changes nothing. Finished bookings past
    /// their retention are dropped from memory afterwards.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> ExpirySweep {
        let due: Vec<(String, BookingState)> = self
            .inner
            .bookings
            .iter()
            .filter(|entry| entry.is_overdue(now))
            .map(|entry| (entry.key().clone(), entry.state))
            .collect();

        let mut sweep = ExpirySweep::default();
        for (id, state) in due {
            let Some(booking) = self.expire_in_memory(&id, state, now) else {
                continue;
            };
            match self.persist_or_fail(booking).await {
                Ok(_) => sweep.expired.push(id),
                Err(e) => {
                    warn!("Expired booking {} could not be stored: {}", id, e);
                    sweep.failed.push((id, e));
                }
            }
        }

        self.prune_terminal(now);
        sweep
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get_booking(&self, booking_id: &str) -> Option<Booking> {
        self.inner
            .bookings
            .get(booking_id)
            .map(|entry| entry.value().clone())
    }

    pub fn get_booking_state(&self, booking_id: &str) -> Option<BookingState> {
        self.inner.bookings.get(booking_id).map(|entry| entry.state)
    }

    /// Transition log of a booking, oldest first.
    pub fn history(&self, booking_id: &str) -> Option<Vec<StateTransition>> {
        self.inner
            .bookings
            .get(booking_id)
            .map(|entry| entry.history.clone())
    }

    /// Bookings that have not reached a terminal state.
    pub fn active_bookings(&self) -> Vec<Booking> {
        self.inner
            .bookings
            .iter()
            .filter(|entry| !entry.state.is_terminal())
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Bookings held in memory, finished ones not yet pruned included.
    pub fn tracked_bookings(&self) -> usize {
        self.inner.bookings.len()
    }

    /// Number of deadline watchers currently armed.
    pub fn pending_watchers(&self) -> usize {
        self.inner.watchers.len()
    }

    /// Get a booking from memory, falling back to the repository.
    ///
    /// A booking found only in the repository is cached and its deadline
    /// watcher re-armed.
    pub async fn load_booking(&self, booking_id: &str) -> Result<Option<Booking>> {
        if let Some(booking) = self.get_booking(booking_id) {
            return Ok(Some(booking));
        }

        let fetched = self
            .inner
            .repository
            .fetch_by_id(&booking_id.to_string())
            .await?;
        if let Some(booking) = &fetched {
            debug!("Booking {} loaded from repository", booking_id);
            self.adopt(booking.clone());
        }
        Ok(fetched)
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Write all non-terminal bookings to the session store.
    ///
    /// Returns how many bookings were written.
    pub async fn persist_snapshot<S: KeyValueStore>(&self, store: &S, ttl: Option<Duration>) -> Result<usize> {
        let active = self.active_bookings();
        let bytes = encode_snapshot(&active)?;
        store.set(&active_snapshot_key(), bytes, ttl).await?;
        debug!("Persisted snapshot of {} active bookings", active.len());
        Ok(active.len())
    }

    /// Load bookings written by `persist_snapshot`, re-arming their watchers.
    ///
    /// Bookings already held in memory are kept as they are. A snapshot from
    /// another schema version is discarded and counts as empty.
    ///
    /// # Errors
    ///
    /// `Error::InvalidSnapshot` or `Error::DeserializationError` for corrupt
    /// bytes; the stored entry is deleted first.
    pub async fn restore_snapshot<S: KeyValueStore>(&self, store: &S) -> Result<usize> {
        let key = active_snapshot_key();
        let Some(bytes) = store.get(&key).await? else {
            return Ok(0);
        };

        let bookings: Vec<Booking> = match decode_snapshot(&bytes) {
            Ok(bookings) => bookings,
            Err(Error::VersionMismatch { expected, found }) => {
                warn!(
                    "Discarding booking snapshot v{} (current v{})",
                    found, expected
                );
                store.delete(&key).await?;
                return Ok(0);
            }
            Err(e) => {
                error!("Corrupt booking snapshot: {}", e);
                store.delete(&key).await?;
                return Err(e);
            }
        };

        let mut restored = 0;
        for booking in bookings {
            if self.inner.bookings.contains_key(&booking.id) {
                continue;
            }
            self.adopt(booking);
            restored += 1;
        }
        info!("Restored {} bookings from snapshot", restored);
        Ok(restored)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn new_booking(&self, params: CreateBookingParams, now: DateTime<Utc>) -> Booking {
        let config = &self.inner.config;
        let location_zone = params
            .location_zone
            .filter(|zone| !zone.trim().is_empty())
            .unwrap_or_else(|| config.default_zone.clone());

        Booking {
            id: format!("booking_{}", Uuid::now_v7().simple()),
            provider_id: params.provider_id,
            provider_name: params.provider_name,
            customer_id: params.customer_id,
            customer_name: params.customer_name.trim().to_string(),
            customer_phone: params.customer_phone,
            service_type: params.service_type,
            duration_minutes: params.duration_minutes,
            total_price: params.total_price,
            location_zone,
            coordinates: params.coordinates,
            booking_type: params.booking_type,
            state: BookingState::Idle,
            response_deadline: now + to_chrono(config.response_timeout),
            confirmation_deadline: None,
            commission: split_commission(params.total_price, config.commission_rate),
            created_at: now,
            updated_at: now,
            history: Vec::new(),
            last_error: None,
            error_count: 0,
        }
    }

    async fn ensure_loaded(&self, booking_id: &str) -> Result<()> {
        self.load_booking(booking_id).await.map(|_| ())
    }

    /// Drop finished bookings whose last transition is older than the
    /// retention, along with their idle write locks.
    fn prune_terminal(&self, now: DateTime<Utc>) {
        let retention = to_chrono(self.inner.config.terminal_retention);
        let before = self.inner.bookings.len();
        self.inner
            .bookings
            .retain(|_, booking| !booking.state.is_terminal() || now - booking.updated_at < retention);
        self.inner.write_locks.retain(|id, lock| {
            self.inner.bookings.contains_key(id) || Arc::strong_count(lock) > 1
        });

        let pruned = before.saturating_sub(self.inner.bookings.len());
        if pruned > 0 {
            debug!("Pruned {} finished bookings from memory", pruned);
        }
    }

    fn find_duplicate(&self, params: &CreateBookingParams, now: DateTime<Utc>) -> Option<String> {
        let window = to_chrono(self.inner.config.duplicate_window);
        self.inner
            .bookings
            .iter()
            .find(|entry| {
                entry.customer_id == params.customer_id
                    && entry.provider_id == params.provider_id
                    && entry.state.is_open()
                    && now - entry.created_at < window
            })
            .map(|entry| entry.key().clone())
    }

    /// Check and apply one transition under the booking's map entry.
    ///
    /// A failed check is recorded on the booking (`last_error`,
    /// `error_count`) without changing its state.
    #[allow(clippy::too_many_arguments)]
    fn apply<G, U>(
        &self,
        booking_id: &str,
        to: BookingState,
        reason: impl Into<String>,
        actor: Actor,
        now: DateTime<Utc>,
        guard: G,
        update: U,
    ) -> Result<Booking>
    where
        G: FnOnce(&Booking) -> Result<()>,
        U: FnOnce(&mut Booking),
    {
        let mut entry = self
            .inner
            .bookings
            .get_mut(booking_id)
            .ok_or_else(|| Error::NotFound(format!("booking {}", booking_id)))?;
        let booking = entry.value_mut();
        let from = booking.state;

        if let Err(e) = guard(booking).and_then(|_| booking.transition(to, reason, actor, now)) {
            warn!("Booking {} refused {}: {}", booking_id, to, e);
            booking.record_error(error_code(&e), &e.to_string());
            self.inner.metrics.record_error(booking_id, &e.to_string());
            return Err(e);
        }
        update(booking);

        let snapshot = booking.clone();
        drop(entry);

        self.inner.metrics.record_transition(booking_id, from, to);
        self.sync_watcher(&snapshot);
        Ok(snapshot)
    }

    fn expire_in_memory(&self, booking_id: &str, expected: BookingState, now: DateTime<Utc>) -> Option<Booking> {
        let reason = match expected {
            BookingState::PendingTherapist => "Response deadline exceeded",
            _ => "Confirmation deadline exceeded",
        };

        let mut entry = self.inner.bookings.get_mut(booking_id)?;
        if entry.state != expected {
            return None;
        }
        entry
            .value_mut()
            .transition(BookingState::Expired, reason, Actor::System, now)
            .ok()?;
        let booking = entry.value().clone();
        drop(entry);

        self.inner
            .metrics
            .record_transition(booking_id, expected, BookingState::Expired);
        self.inner.metrics.record_expired(booking_id, expected);
        self.inner.watchers.remove(booking_id);
        Some(booking)
    }

    /// Keep exactly one watcher per booking with a running deadline.
    fn sync_watcher(&self, booking: &Booking) {
        match booking.active_deadline() {
            Some(deadline) => self.arm_watcher(&booking.id, deadline, booking.state),
            None => {
                self.inner.watchers.remove(&booking.id);
            }
        }
    }

    fn arm_watcher(&self, booking_id: &str, deadline: DateTime<Utc>, expected: BookingState) {
        let weak: Weak<EngineInner<R>> = Arc::downgrade(&self.inner);
        let id = booking_id.to_string();

        let watcher = DeadlineWatcher::spawn(deadline, Utc::now(), move || {
            if let Some(inner) = weak.upgrade() {
                BookingEngine { inner }.on_deadline(&id, expected);
            }
        });
        self.inner
            .watchers
            .insert(booking_id.to_string(), watcher);
    }

    fn on_deadline(&self, booking_id: &str, expected: BookingState) {
        let Some(booking) = self.expire_in_memory(booking_id, expected, Utc::now()) else {
            return;
        };

        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.persist_or_fail(booking).await {
                error!("Failed to store expired booking: {}", e);
            }
        });
    }

    fn adopt(&self, booking: Booking) {
        let snapshot = booking.clone();
        self.inner.bookings.insert(booking.id.clone(), booking);
        self.sync_watcher(&snapshot);
    }

    /// Write a booking; on failure move it to FAILED and return the error.
    ///
    /// Returns `booking` as the caller's transition left it, even when a
    /// later transition is what reached the repository.
    async fn persist_or_fail(&self, booking: Booking) -> Result<Booking> {
        match self.persist(&booking).await {
            Ok(()) => Ok(booking),
            Err(e) => {
                self.fail(&booking.id, "PERSIST_FAILED", &e);
                Err(e)
            }
        }
    }

    fn write_lock(&self, booking_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(&self.inner.write_locks.entry(booking_id.to_string()).or_default())
    }

    /// Upsert with retry and exponential backoff on store errors.
    ///
    /// Each attempt runs under the booking's write lock and stores the
    /// current in-memory booking, falling back to `booking` once it has
    /// been pruned.
    async fn persist(&self, booking: &Booking) -> Result<()> {
        let max_attempts = self.inner.config.persist_retries + 1;
        let lock = self.write_lock(&booking.id);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let timer = Instant::now();

            let written = {
                let _guard = lock.lock().await;
                let current = self
                    .get_booking(&booking.id)
                    .unwrap_or_else(|| booking.clone());
                self.inner.repository.upsert(current).await
            };

            match written {
                Ok(()) => {
                    self.inner
                        .metrics
                        .record_persist(&booking.id, timer.elapsed());
                    return Ok(());
                }
                Err(e) => {
                    let retryable = matches!(e, Error::RepositoryError(_) | Error::StorageError(_));
                    if !retryable || attempts >= max_attempts {
                        return Err(e);
                    }

                    debug!(
                        "Booking write failed (attempt {}/{}), retrying...",
                        attempts, max_attempts
                    );
                    let delay = Duration::from_millis(100 * 2_u64.pow(attempts - 1));
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn fail(&self, booking_id: &str, code: &str, cause: &Error) {
        error!("Booking {} failed ({}): {}", booking_id, code, cause);
        self.inner.metrics.record_error(booking_id, &cause.to_string());

        let Some(mut entry) = self.inner.bookings.get_mut(booking_id) else {
            return;
        };
        let booking = entry.value_mut();
        booking.record_error(code, &cause.to_string());

        let from = booking.state;
        if from.can_transition_to(BookingState::Failed) {
            let now = Utc::now();
            if booking
                .transition(BookingState::Failed, cause.to_string(), Actor::System, now)
                .is_ok()
            {
                drop(entry);
                self.inner
                    .metrics
                    .record_transition(booking_id, from, BookingState::Failed);
                self.inner.watchers.remove(booking_id);
            }
        }
    }
}

fn ensure_provider(booking: &Booking, provider_id: &str) -> Result<()> {
    if booking.provider_id != provider_id {
        return Err(Error::ProviderMismatch {
            booking_id: booking.id.clone(),
            provider_id: provider_id.to_string(),
        });
    }
    Ok(())
}

fn ensure_state(booking: &Booking, allowed: &[BookingState], to: BookingState) -> Result<()> {
    if !allowed.contains(&booking.state) {
        return Err(Error::InvalidTransition {
            from: booking.state.to_string(),
            to: to.to_string(),
        });
    }
    Ok(())
}

fn error_code(error: &Error) -> &'static str {
    match error {
        Error::ValidationError(_) => "VALIDATION_FAILED",
        Error::ProviderMismatch { .. } => "THERAPIST_MISMATCH",
        Error::InvalidTransition { .. } => "INVALID_STATE",
        Error::DeadlinePassed(_) => "DEADLINE_PASSED",
        Error::DuplicateBooking(_) => "DUPLICATE_BOOKING",
        Error::RepositoryError(_) | Error::StorageError(_) => "PERSIST_FAILED",
        _ => "UNEXPECTED_ERROR",
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(duration.as_millis().min(i64::MAX as u128) as i64)
}
