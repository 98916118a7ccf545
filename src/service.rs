//! High-level marketplace service.
//!
//! Combines the provider collection with the booking engine behind one
//! `Clone` handle, so web handlers and background jobs can share it without
//! wrapping it in `Arc<Mutex<_>>`.

use crate::booking::{Booking, BookingEngine, BookingType, CreateBookingParams};
use crate::config::MarketplaceConfig;
use crate::countdown::{discount_label, CountdownSnapshot, CountdownTimer};
use crate::error::{Error, Result};
use crate::geo::{format_distance, haversine_meters, normalize_coordinates, GeoPoint};
use crate::pricing::{
    format_price, resolve_pricing, split_commission, CommissionSplit, ResolvedPricing, DURATIONS,
};
use crate::provider::{Provider, ProviderKind};
use crate::repository::DocumentRepository;
use crate::status::{busy_window_end, resolve_status, AvailabilityStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

/// Everything a provider card shows, resolved at one instant.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderListing {
    pub provider_id: String,
    pub name: String,
    pub kind: ProviderKind,
    pub status: AvailabilityStatus,
    pub pricing: ResolvedPricing,
    /// `Rp …K` labels for 60, 90 and 120 minutes.
    pub price_labels: Vec<String>,
    pub discount_label: Option<String>,
    pub distance_meters: Option<f64>,
    pub distance_label: Option<String>,
    /// Time left in the busy window, while one is running.
    pub busy_countdown: Option<String>,
    pub rating: f64,
    pub review_count: i64,
    pub city: Option<String>,
}

/// Resolve a provider into its card view.
pub fn build_listing(
    provider: &Provider,
    user: Option<&GeoPoint>,
    now: DateTime<Utc>,
    config: &MarketplaceConfig,
) -> ProviderListing {
    let pricing = resolve_pricing(provider, now, &config.fallback_prices);
    let price_labels = DURATIONS
        .iter()
        .filter_map(|minutes| pricing.effective.for_duration(*minutes))
        .map(format_price)
        .collect();

    let distance_meters = user
        .filter(|point| point.is_valid())
        .zip(normalize_coordinates(provider))
        .map(|(from, to)| haversine_meters(from, &to));

    let busy_countdown = busy_window_end(provider, now)
        .map(|end| CountdownSnapshot::at(end, now).label());

    ProviderListing {
        provider_id: provider.id.clone(),
        name: provider.name.clone(),
        kind: provider.kind,
        status: resolve_status(provider, now),
        pricing,
        price_labels,
        discount_label: discount_label(provider, now),
        distance_meters,
        distance_label: distance_meters.map(format_distance),
        busy_countdown,
        rating: provider.display_rating(),
        review_count: provider.review_count.unwrap_or(0).max(0),
        city: provider.city().map(str::to_string),
    }
}

/// A customer's request to book a provider at the current price.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookingRequest {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub provider_id: String,
    pub service_type: String,
    pub duration_minutes: u32,
    pub location_zone: Option<String>,
    pub coordinates: Option<GeoPoint>,
    pub booking_type: BookingType,
}

/// Price for one session length, with the commission split applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub duration_minutes: u32,
    pub split: CommissionSplit,
    pub discounted: bool,
}

/// Marketplace service over a provider collection and a booking collection.
///
/// # Example
///
/// ```ignore
/// use indastreet_kit::{MarketplaceConfig, MarketplaceService};
/// use indastreet_kit::repository::InMemoryRepository;
///
/// let service = MarketplaceService::new(
///     InMemoryRepository::new(),
///     InMemoryRepository::new(),
///     MarketplaceConfig::from_env()?,
/// )?;
///
/// let cards = service.nearby(Some(&user_location), chrono::Utc::now()).await?;
/// ```
pub struct MarketplaceService<P, B>
where
    P: DocumentRepository<Provider>,
    B: DocumentRepository<Booking> + 'static,
{
    providers: Arc<P>,
    engine: BookingEngine<B>,
}

impl<P, B> Clone for MarketplaceService<P, B>
where
    P: DocumentRepository<Provider>,
    B: DocumentRepository<Booking> + 'static,
{
    fn clone(&self) -> Self {
        MarketplaceService {
            providers: Arc::clone(&self.providers),
            engine: self.engine.clone(),
        }
    }
}

impl<P, B> MarketplaceService<P, B>
where
    P: DocumentRepository<Provider>,
    B: DocumentRepository<Booking> + 'static,
{
    /// # Errors
    ///
    /// `Error::ConfigError` when `config` fails `validate()`.
    pub fn new(providers: P, bookings: B, config: MarketplaceConfig) -> Result<Self> {
        Ok(Self::with_engine(providers, BookingEngine::new(bookings, config)?))
    }

    /// Use an engine built elsewhere, e.g. with custom metrics.
    pub fn with_engine(providers: P, engine: BookingEngine<B>) -> Self {
        MarketplaceService {
            providers: Arc::new(providers),
            engine,
        }
    }

    pub fn engine(&self) -> &BookingEngine<B> {
        &self.engine
    }

    pub fn providers(&self) -> &P {
        &self.providers
    }

    pub fn config(&self) -> &MarketplaceConfig {
        self.engine.config()
    }

    /// Card view for one provider; `Ok(None)` if it does not exist.
    pub async fn listing(
        &self,
        provider_id: &str,
        user: Option<&GeoPoint>,
        now: DateTime<Utc>,
    ) -> Result<Option<ProviderListing>> {
        let provider = self.providers.fetch_by_id(&provider_id.to_string()).await?;
        Ok(provider.map(|p| build_listing(&p, user, now, self.config())))
    }

    /// Card views for every provider, nearest first.
    ///
    /// Providers without a usable location come last, in name order.
    pub async fn nearby(&self, user: Option<&GeoPoint>, now: DateTime<Utc>) -> Result<Vec<ProviderListing>> {
        let providers = self.providers.fetch_all().await?;
        let mut listings: Vec<ProviderListing> = providers
            .iter()
            .map(|p| build_listing(p, user, now, self.config()))
            .collect();

        listings.sort_by(|a, b| match (a.distance_meters, b.distance_meters) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        });
        Ok(listings)
    }

    /// Current price of one session length.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound`: Unknown provider
    /// - `Error::ValidationError`: Duration not offered or priced at zero
    pub async fn quote(&self, provider_id: &str, duration_minutes: u32, now: DateTime<Utc>) -> Result<Quote> {
        let provider = self.require_provider(provider_id).await?;
        self.quote_for(&provider, duration_minutes, now)
    }

    /// Book a provider at the current effective price.
    ///
    /// Book-now requests need an Available provider; scheduled requests only
    /// need the provider to exist.
    pub async fn request_booking(&self, request: BookingRequest) -> Result<Booking> {
        let now = Utc::now();
        let provider = self.require_provider(&request.provider_id).await?;

        if request.booking_type == BookingType::BookNow {
            let status = resolve_status(&provider, now);
            if !status.accepts_instant_booking() {
                return Err(Error::ValidationError(format!(
                    "provider {} is {} and cannot take a book-now request",
                    provider.id, status
                )));
            }
        }

        let quote = self.quote_for(&provider, request.duration_minutes, now)?;
        self.engine
            .create_booking(CreateBookingParams {
                customer_id: request.customer_id,
                customer_name: request.customer_name,
                customer_phone: request.customer_phone,
                provider_id: provider.id.clone(),
                provider_name: provider.name.clone(),
                service_type: request.service_type,
                duration_minutes: request.duration_minutes,
                total_price: quote.split.price,
                location_zone: request.location_zone,
                coordinates: request.coordinates,
                booking_type: request.booking_type,
            })
            .await
    }

    /// Live countdown to the end of a provider's busy window.
    ///
    /// `None` if the provider is not busy at `now`.
    pub fn busy_timer<F>(&self, provider: &Provider, now: DateTime<Utc>, on_free: F) -> Option<CountdownTimer>
    where
        F: FnOnce() + Send + 'static,
    {
        let end = busy_window_end(provider, now)?;
        Some(CountdownTimer::start(end, now, self.config().tick_interval, on_free))
    }

    async fn require_provider(&self, provider_id: &str) -> Result<Provider> {
        self.providers
            .fetch_by_id(&provider_id.to_string())
            .await?
            .ok_or_else(|| Error::NotFound(format!("provider {}", provider_id)))
    }

    fn quote_for(&self, provider: &Provider, duration_minutes: u32, now: DateTime<Utc>) -> Result<Quote> {
        let pricing = resolve_pricing(provider, now, &self.config().fallback_prices);
        let price = pricing
            .effective
            .for_duration(duration_minutes)
            .filter(|price| *price > 0)
            .ok_or_else(|| {
                Error::ValidationError(format!(
                    "provider {} has no {}-minute price",
                    provider.id, duration_minutes
                ))
            })?;

        Ok(Quote {
            duration_minutes,
            split: split_commission(price, self.config().commission_rate),
            discounted: pricing.has_discount(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingState;
    use crate::pricing::PriceTable;
    use crate::repository::InMemoryRepository;
    use chrono::Duration;
    use serde_json::json;

    type Service = MarketplaceService<InMemoryRepository<Provider>, InMemoryRepository<Booking>>;

    const UBUD: GeoPoint = GeoPoint::new(-8.5069, 115.2625);

    fn provider(id: &str, name: &str) -> Provider {
        let mut p = Provider::new(id, name);
        p.status = Some("Available".to_string());
        p.price60 = Some(200);
        p.price90 = Some(300);
        p.price120 = Some(400);
        p
    }

    fn service(providers: Vec<Provider>) -> Service {
        let repo = InMemoryRepository::new();
        for p in providers {
            repo.insert(p);
        }
        MarketplaceService::new(repo, InMemoryRepository::new(), MarketplaceConfig::default()).unwrap()
    }

    fn request(provider_id: &str, minutes: u32) -> BookingRequest {
        BookingRequest {
            customer_id: "c_1".to_string(),
            customer_name: "Alice".to_string(),
            provider_id: provider_id.to_string(),
            service_type: "balinese".to_string(),
            duration_minutes: minutes,
            ..Default::default()
        }
    }

    #[test]
    fn test_build_listing() {
        let now = Utc::now();
        let mut p = provider("t_1", "Budi");
        p.coordinates = Some(json!([115.2625, -8.5109]));
        p.rating = Some(4.9);
        p.review_count = Some(12);
        p.location = Some("Ubud, Bali".to_string());
        p.discount_percentage = Some(10.0);
        p.is_discount_active = true;
        p.discount_end_time = Some((now + Duration::minutes(30)).to_rfc3339());

        let listing = build_listing(&p, Some(&UBUD), now, &MarketplaceConfig::default());

        assert_eq!(listing.status, AvailabilityStatus::Available);
        assert_eq!(listing.price_labels, vec!["Rp 180K", "Rp 270K", "Rp 360K"]);
        assert!(listing.discount_label.is_some());
        assert_eq!(listing.distance_label.as_deref(), Some("445m away"));
        assert_eq!(listing.rating, 4.9);
        assert_eq!(listing.city.as_deref(), Some("Ubud"));
        assert!(listing.busy_countdown.is_none());
    }

    #[test]
    fn test_listing_busy_countdown() {
        let now = Utc::now();
        let mut p = provider("t_1", "Budi");
        p.busy_until = Some((now + Duration::seconds(125)).to_rfc3339());

        let listing = build_listing(&p, None, now, &MarketplaceConfig::default());
        assert_eq!(listing.status, AvailabilityStatus::Busy);
        assert_eq!(listing.busy_countdown.as_deref(), Some("2m 5s"));
        assert!(listing.distance_label.is_none());
    }

    #[tokio::test]
    async fn test_nearby_orders_by_distance() {
        let mut near = provider("t_near", "Wayan");
        near.coordinates = Some(json!([115.2625, -8.5100]));
        let mut far = provider("t_far", "Ketut");
        far.coordinates = Some(json!([115.2126, -8.6705]));
        let nowhere = provider("t_none", "Agus");

        let service = service(vec![far, nowhere, near]);
        let listings = service.nearby(Some(&UBUD), Utc::now()).await.unwrap();

        let ids: Vec<_> = listings.iter().map(|l| l.provider_id.as_str()).collect();
        assert_eq!(ids, vec!["t_near", "t_far", "t_none"]);
    }

    #[tokio::test]
    async fn test_quote_and_request_booking() {
        let service = service(vec![provider("t_1", "Budi")]);

        let quote = service.quote("t_1", 90, Utc::now()).await.unwrap();
        assert_eq!(quote.split.price, 300_000);
        assert_eq!(quote.split.commission, 45_000);

        let booking = service.request_booking(request("t_1", 90)).await.unwrap();
        assert_eq!(booking.total_price, 300_000);
        assert_eq!(booking.provider_name, "Budi");
        assert_eq!(booking.state, BookingState::PendingTherapist);
        assert_eq!(
            service.engine().get_booking_state(&booking.id),
            Some(BookingState::PendingTherapist)
        );
    }

    #[tokio::test]
    async fn test_request_booking_rejections() {
        let mut busy = provider("t_busy", "Made");
        busy.status = Some("Busy".to_string());
        let mut unpriced = provider("t_unpriced", "Komang");
        unpriced.price120 = None;

        let service = service(vec![busy, unpriced]);

        assert!(matches!(
            service.request_booking(request("t_busy", 60)).await,
            Err(Error::ValidationError(_))
        ));
        assert!(matches!(
            service.request_booking(request("t_unpriced", 120)).await,
            Err(Error::ValidationError(_))
        ));
        assert!(matches!(
            service.request_booking(request("t_missing", 60)).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service.quote("t_unpriced", 45, Utc::now()).await,
            Err(Error::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_fallback_prices_from_config() {
        let repo = InMemoryRepository::new();
        repo.insert(Provider::new("t_1", "Nyoman"));
        let config = MarketplaceConfig::default().with_fallback_prices(PriceTable::new(150_000, 0, 0));
        let service = MarketplaceService::new(repo, InMemoryRepository::new(), config).unwrap();

        let listing = service
            .listing("t_1", None, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(listing.pricing.effective.min60, 150_000);
        assert!(service.listing("nope", None, Utc::now()).await.unwrap().is_none());
    }

    #[test]
    fn test_service_clone_shares_state() {
        let service1 = service(Vec::new());
        let service2 = service1.clone();
        assert!(Arc::ptr_eq(&service1.providers, &service2.providers));
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_timer() {
        let service = service(Vec::new());
        let now = Utc::now();
        let mut p = provider("t_1", "Budi");
        assert!(service.busy_timer(&p, now, || {}).is_none());

        p.busy_until = Some((now + Duration::seconds(90)).to_rfc3339());
        let timer = service.busy_timer(&p, now, || {}).unwrap();
        assert_eq!(timer.label(), "1m 30s");
    }
}
