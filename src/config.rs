//! Marketplace configuration.
//!
//! Defaults match production behaviour. Every value can be overridden from
//! the environment with an `INDASTREET_` prefixed variable, or in code with
//! the `with_*` builders.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `INDASTREET_COMMISSION_RATE` | `0.15` | Platform share of a booking price |
//! | `INDASTREET_RESPONSE_TIMEOUT_SECS` | `300` | Time a provider has to answer |
//! | `INDASTREET_CONFIRMATION_TIMEOUT_SECS` | `60` | Time a customer has to confirm |
//! | `INDASTREET_DUPLICATE_WINDOW_SECS` | `300` | Window for duplicate-booking detection |
//! | `INDASTREET_TICK_MILLIS` | `1000` | Countdown refresh period |
//! | `INDASTREET_DEFAULT_ZONE` | `Jakarta` | Zone used when a booking has none |
//! | `INDASTREET_PERSIST_RETRIES` | `2` | Extra attempts for a failed booking write |
//! | `INDASTREET_TERMINAL_RETENTION_SECS` | `600` | How long finished bookings stay in memory |

use crate::error::{Error, Result};
use crate::pricing::PriceTable;
use std::str::FromStr;
use std::time::Duration;

/// Default platform commission applied at booking submission.
pub const DEFAULT_COMMISSION_RATE: f64 = 0.15;

/// Default time a provider has to accept a booking.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default time a customer has to confirm an accepted booking.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);

const ENV_PREFIX: &str = "INDASTREET_";

/// Configuration shared by the pricing resolver, countdowns and the booking engine.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketplaceConfig {
    /// Fraction of the resolved price kept by the platform (0.0..=1.0).
    pub commission_rate: f64,
    /// Provider response deadline, counted from booking creation.
    pub response_timeout: Duration,
    /// Customer confirmation deadline, counted from acceptance.
    pub confirmation_timeout: Duration,
    /// A second booking for the same customer and provider inside this
    /// window is rejected while the first is still open.
    pub duplicate_window: Duration,
    /// Refresh period of countdown timers and watchers.
    pub tick_interval: Duration,
    /// Location zone used when the caller leaves it blank.
    pub default_zone: String,
    /// Prices used when a provider's pricing cannot be read at all.
    pub fallback_prices: PriceTable,
    /// Extra attempts, with exponential backoff, for a failed repository write.
    pub persist_retries: u32,
    /// Finished bookings are dropped from memory this long after their last
    /// transition. They stay readable through the repository.
    pub terminal_retention: Duration,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        MarketplaceConfig {
            commission_rate: DEFAULT_COMMISSION_RATE,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            duplicate_window: Duration::from_secs(5 * 60),
            tick_interval: Duration::from_millis(1000),
            default_zone: "Jakarta".to_string(),
            fallback_prices: PriceTable::FALLBACK,
            persist_retries: 2,
            terminal_retention: Duration::from_secs(10 * 60),
        }
    }
}

impl MarketplaceConfig {
    /// Build configuration from defaults plus `INDASTREET_*` overrides.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if a variable is present but unparseable,
    /// or if the resulting configuration fails `validate()`.
    pub fn from_env() -> Result<Self> {
        let mut config = MarketplaceConfig::default();

        if let Some(rate) = env_value::<f64>("COMMISSION_RATE")? {
            config.commission_rate = rate;
        }
        if let Some(secs) = env_value::<u64>("RESPONSE_TIMEOUT_SECS")? {
            config.response_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_value::<u64>("CONFIRMATION_TIMEOUT_SECS")? {
            config.confirmation_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_value::<u64>("DUPLICATE_WINDOW_SECS")? {
            config.duplicate_window = Duration::from_secs(secs);
        }
        if let Some(millis) = env_value::<u64>("TICK_MILLIS")? {
            config.tick_interval = Duration::from_millis(millis);
        }
        if let Some(zone) = env_value::<String>("DEFAULT_ZONE")? {
            config.default_zone = zone;
        }
        if let Some(retries) = env_value::<u32>("PERSIST_RETRIES")? {
            config.persist_retries = retries;
        }
        if let Some(secs) = env_value::<u64>("TERMINAL_RETENTION_SECS")? {
            config.terminal_retention = Duration::from_secs(secs);
        }

        config.validate()?;
        debug!("Loaded marketplace config: {:?}", config);
        Ok(config)
    }

    pub fn with_commission_rate(mut self, rate: f64) -> Self {
        self.commission_rate = rate;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn with_duplicate_window(mut self, window: Duration) -> Self {
        self.duplicate_window = window;
        self
    }

    pub fn with_tick_interval(mut self, tick: Duration) -> Self {
        self.tick_interval = tick;
        self
    }

    pub fn with_default_zone(mut self, zone: impl Into<String>) -> Self {
        self.default_zone = zone.into();
        self
    }

    pub fn with_fallback_prices(mut self, prices: PriceTable) -> Self {
        self.fallback_prices = prices;
        self
    }

    pub fn with_persist_retries(mut self, retries: u32) -> Self {
        self.persist_retries = retries;
        self
    }

    pub fn with_terminal_retention(mut self, retention: Duration) -> Self {
        self.terminal_retention = retention;
        self
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` for a commission rate outside `0.0..=1.0`,
    /// a zero tick interval, or a blank default zone.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.commission_rate) {
            return Err(Error::ConfigError(format!(
                "commission_rate must be within 0.0..=1.0, got {}",
                self.commission_rate
            )));
        }
        if self.tick_interval.is_zero() {
            return Err(Error::ConfigError(
                "tick_interval must be greater than zero".to_string(),
            ));
        }
        if self.default_zone.trim().is_empty() {
            return Err(Error::ConfigError(
                "default_zone must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_value<T: FromStr>(name: &str) -> Result<Option<T>> {
    let key = format!("{}{}", ENV_PREFIX, name);
    match std::env::var(&key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::ConfigError(format!("{} has invalid value '{}'", key, raw))),
        Err(_) => Ok(None),
    }
}
