//! Countdown timers, overtime counters and deadline watchers.
//!
//! The pure half ([`CountdownSnapshot`], [`format_remaining`]) computes what a
//! timer shows at a given instant. The async half owns one tokio task per
//! timer:
//!
//! - [`CountdownTimer`] ticks on an interval, publishes snapshots on a watch
//!   channel and runs its completion callback once, when it first reaches
//!   zero. Past the deadline it keeps counting up (overtime).
//! - [`DeadlineWatcher`] sleeps until a deadline and runs a callback once.
//!   It drives discount-expiry refreshes, busy-window ends and booking expiry.
//!
//! Both abort their task on drop, so a torn-down view never keeps firing.
//! Elapsed time is measured with `tokio::time::Instant`, which lets tests run
//! them on a paused clock.

use crate::pricing::active_discount;
use crate::provider::{parse_timestamp, Provider};
use crate::status::busy_window_end;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Label shown for a discount whose end time has passed.
pub const EXPIRED_LABEL: &str = "EXPIRED";

const MIN_TICK: Duration = Duration::from_millis(10);

/// Canonical time format: `Hh Mm` with hours, else `Mm Ss` with minutes,
/// else `Ss`.
///
/// ```
/// use indastreet_kit::countdown::format_remaining;
///
/// assert_eq!(format_remaining(125), "2m 5s");
/// assert_eq!(format_remaining(3661), "1h 1m");
/// assert_eq!(format_remaining(42), "42s");
/// ```
pub fn format_remaining(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// What a countdown shows at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CountdownSnapshot {
    /// Whole seconds left before the deadline.
    Remaining(u64),
    /// Whole seconds elapsed since the deadline.
    Overtime(u64),
}

impl CountdownSnapshot {
    /// Snapshot for a signed distance to the deadline, in milliseconds.
    /// Zero counts as overtime.
    pub fn from_millis(until_deadline_ms: i64) -> Self {
        if until_deadline_ms > 0 {
            CountdownSnapshot::Remaining((until_deadline_ms / 1000) as u64)
        } else {
            CountdownSnapshot::Overtime(until_deadline_ms.unsigned_abs() / 1000)
        }
    }

    pub fn at(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::from_millis((deadline - now).num_milliseconds())
    }

    /// Snapshot for a stored deadline string; `None` if it does not parse.
    pub fn from_deadline_str(raw: &str, now: DateTime<Utc>) -> Option<Self> {
        parse_timestamp(raw).map(|deadline| Self::at(deadline, now))
    }

    pub fn is_overtime(&self) -> bool {
        matches!(self, CountdownSnapshot::Overtime(_))
    }

    pub fn seconds(&self) -> u64 {
        match self {
            CountdownSnapshot::Remaining(s) | CountdownSnapshot::Overtime(s) => *s,
        }
    }

    /// Display text; overtime uses the same format counting up.
    pub fn label(&self) -> String {
        format_remaining(self.seconds())
    }
}

/// Discount countdown text for a provider card.
///
/// `None` when the provider has no discount configured, `"EXPIRED"` once the
/// end time has passed, otherwise the time left.
pub fn discount_label(provider: &Provider, now: DateTime<Utc>) -> Option<String> {
    if !provider.is_discount_active || !provider.discount_percentage.is_some_and(|p| p > 0.0) {
        return None;
    }
    let end = provider
        .discount_end_time
        .as_deref()
        .and_then(parse_timestamp)?;

    match CountdownSnapshot::at(end, now) {
        CountdownSnapshot::Remaining(secs) => Some(format_remaining(secs)),
        CountdownSnapshot::Overtime(_) => Some(EXPIRED_LABEL.to_string()),
    }
}

/// Live countdown to a deadline.
///
/// # Example
///
/// ```no_run
/// use indastreet_kit::countdown::CountdownTimer;
/// use chrono::{Duration as ChronoDuration, Utc};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let now = Utc::now();
///     let timer = CountdownTimer::start(now + ChronoDuration::minutes(5), now, Duration::from_secs(1), || {
///         println!("response window closed");
///     });
///     println!("{}", timer.label());
/// }
/// ```
pub struct CountdownTimer {
    state: watch::Receiver<CountdownSnapshot>,
    handle: JoinHandle<()>,
}

impl CountdownTimer {
    /// Start ticking towards `deadline`, measured from `now`.
    ///
    /// `on_complete` runs once, on the first tick at or past the deadline.
    /// A deadline already in the past completes on the first tick.
    pub fn start<F>(deadline: DateTime<Utc>, now: DateTime<Utc>, tick: Duration, on_complete: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let offset_ms = (deadline - now).num_milliseconds();
        let origin = Instant::now();
        let (tx, rx) = watch::channel(CountdownSnapshot::from_millis(offset_ms));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick.max(MIN_TICK));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut on_complete = Some(on_complete);

            loop {
                interval.tick().await;
                let elapsed_ms = origin.elapsed().as_millis() as i64;
                let snapshot = CountdownSnapshot::from_millis(offset_ms - elapsed_ms);

                if snapshot.is_overtime() {
                    if let Some(callback) = on_complete.take() {
                        debug!("Countdown reached zero");
                        callback();
                    }
                }

                if tx.send(snapshot).is_err() {
                    break;
                }
            }
        });

        CountdownTimer { state: rx, handle }
    }

    /// Start from a stored deadline string.
    ///
    /// Returns `None` (and starts nothing) if the deadline does not parse.
    pub fn start_from_str<F>(raw: &str, now: DateTime<Utc>, tick: Duration, on_complete: F) -> Option<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        match parse_timestamp(raw) {
            Some(deadline) => Some(Self::start(deadline, now, tick, on_complete)),
            None => {
                debug!("Countdown not started, unparseable deadline '{}'", raw);
                None
            }
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> CountdownSnapshot {
        *self.state.borrow()
    }

    pub fn label(&self) -> String {
        self.snapshot().label()
    }

    pub fn is_overtime(&self) -> bool {
        self.snapshot().is_overtime()
    }

    /// Receiver notified on every tick.
    pub fn subscribe(&self) -> watch::Receiver<CountdownSnapshot> {
        self.state.clone()
    }

    /// Stream of snapshots, one per tick, ending when the timer stops.
    pub fn ticks(&self) -> impl Stream<Item = CountdownSnapshot> + Send + 'static {
        futures::stream::unfold(self.state.clone(), |mut rx| async move {
            rx.changed().await.ok()?;
            let snapshot = *rx.borrow_and_update();
            Some((snapshot, rx))
        })
    }

    /// Stop ticking. Idempotent.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One-shot task that runs a callback when a deadline passes.
pub struct DeadlineWatcher {
    deadline: DateTime<Utc>,
    fired: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl DeadlineWatcher {
    /// Run `on_deadline` once `deadline` (relative to `now`) has passed.
    pub fn spawn<F>(deadline: DateTime<Utc>, now: DateTime<Utc>, on_deadline: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::spawn_async(deadline, now, async move { on_deadline() })
    }

    /// Like [`DeadlineWatcher::spawn`], awaiting `on_deadline` instead.
    pub fn spawn_async<Fut>(deadline: DateTime<Utc>, now: DateTime<Utc>, on_deadline: Fut) -> Self
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let wait = (deadline - now).to_std().unwrap_or(Duration::ZERO);
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            flag.store(true, Ordering::SeqCst);
            on_deadline.await;
        });

        DeadlineWatcher {
            deadline,
            fired,
            handle,
        }
    }

    /// Watch the end of a provider's running discount window.
    ///
    /// `None` if no discount is active at `now`.
    pub fn discount_expiry<F>(provider: &Provider, now: DateTime<Utc>, on_expired: F) -> Option<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        active_discount(provider, now)?;
        let end = provider
            .discount_end_time
            .as_deref()
            .and_then(parse_timestamp)?;
        debug!("Watching discount end for provider {} at {}", provider.id, end);
        Some(Self::spawn(end, now, on_expired))
    }

    /// Watch the end of a provider's busy window.
    ///
    /// `None` if the provider is not inside a busy window at `now`.
    pub fn busy_window<F>(provider: &Provider, now: DateTime<Utc>, on_free: F) -> Option<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let end = busy_window_end(provider, now)?;
        debug!("Watching busy window for provider {} until {}", provider.id, end);
        Some(Self::spawn(end, now, on_free))
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Whether the deadline has been reached and the callback started.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Stop watching. Idempotent.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for DeadlineWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
