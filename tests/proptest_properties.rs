//! Property-based tests for the marketplace rules.
//!
//! These tests use proptest (and quickcheck for the distance laws) to check
//! that the resolvers hold for arbitrary provider documents, not only the
//! shapes the unit tests pick.
//!
//! # Properties Tested
//!
//! 1. **Busy Window**: a future `busyUntil` always resolves to Busy
//! 2. **Legacy Pricing**: writing a table as legacy JSON and parsing it back
//!    is lossless, and re-parsing is idempotent
//! 3. **Expired Discount**: a discount past its end time prices exactly like
//!    no discount
//! 4. **Commission**: commission and payout always add up to the price
//! 5. **Distance**: haversine is zero on identical points and symmetric
//! 6. **Countdown**: labels match the `Hh Mm` / `Mm Ss` / `Ss` shapes
//! 7. **History**: every applied transition extends a contiguous chain, and
//!    terminal states accept nothing

use chrono::{DateTime, Duration, TimeZone, Utc};
use indastreet_kit::booking::{Actor, Booking, BookingState, BookingType};
use indastreet_kit::countdown::{format_remaining, CountdownSnapshot};
use indastreet_kit::geo::{haversine_meters, GeoPoint};
use indastreet_kit::pricing::{
    parse_legacy_json, resolve_pricing, split_commission, CommissionSplit, PriceTable,
};
use indastreet_kit::status::{resolve_status, AvailabilityStatus};
use indastreet_kit::Provider;
use proptest::prelude::*;
use quickcheck::{quickcheck, TestResult};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
}

// ============================================================================
// Strategies
// ============================================================================

fn arb_status_text() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("Available".to_string())),
        Just(Some("busy".to_string())),
        Just(Some("OFFLINE".to_string())),
        Just(Some("".to_string())),
        "[a-z]{1,10}".prop_map(Some),
    ]
}

fn arb_provider() -> impl Strategy<Value = Provider> {
    (
        arb_status_text(),
        arb_status_text(),
        any::<bool>(),
        proptest::option::of(0i64..2_000),
        proptest::option::of(0i64..2_000),
        proptest::option::of(0i64..2_000),
    )
        .prop_map(|(status, availability, showcase, p60, p90, p120)| {
            let mut provider = Provider::new("t_prop", "Prop");
            provider.status = status;
            provider.availability = availability;
            provider.is_showcase_profile = showcase;
            provider.price60 = p60;
            provider.price90 = p90;
            provider.price120 = p120;
            provider
        })
}

fn arb_price_table() -> impl Strategy<Value = PriceTable> {
    (0i64..10_000_000, 0i64..10_000_000, 0i64..10_000_000)
        .prop_map(|(a, b, c)| PriceTable::new(a, b, c))
}

fn arb_state() -> impl Strategy<Value = BookingState> {
    proptest::sample::select(BookingState::ALL.to_vec())
}

fn new_booking(now: DateTime<Utc>) -> Booking {
    Booking {
        id: "booking_prop".to_string(),
        provider_id: "t_prop".to_string(),
        provider_name: "Prop".to_string(),
        customer_id: "c_prop".to_string(),
        customer_name: "Alice".to_string(),
        customer_phone: String::new(),
        service_type: "balinese".to_string(),
        duration_minutes: 60,
        total_price: 200_000,
        location_zone: "bali".to_string(),
        coordinates: None,
        booking_type: BookingType::BookNow,
        state: BookingState::Idle,
        response_deadline: now + Duration::minutes(5),
        confirmation_deadline: None,
        commission: split_commission(200_000, 0.15),
        created_at: now,
        updated_at: now,
        history: Vec::new(),
        last_error: None,
        error_count: 0,
    }
}

// ============================================================================
// Status Properties
// ============================================================================

proptest! {
    /// Property: an unexpired busy window wins over every stored status
    #[test]
    fn prop_future_busy_until_is_busy(
        mut provider in arb_provider(),
        secs_ahead in 1i64..86_400 * 30,
    ) {
        let now = fixed_now();
        provider.busy_until = Some((now + Duration::seconds(secs_ahead)).to_rfc3339());

        prop_assert_eq!(resolve_status(&provider, now), AvailabilityStatus::Busy);
    }

    /// Property: showcase profiles never show Available
    #[test]
    fn prop_showcase_never_available(mut provider in arb_provider()) {
        provider.is_showcase_profile = true;
        prop_assert_eq!(resolve_status(&provider, fixed_now()), AvailabilityStatus::Busy);
    }

    /// Property: a busy window in the past has no effect
    #[test]
    fn prop_past_busy_until_is_ignored(
        provider in arb_provider(),
        secs_ago in 0i64..86_400 * 30,
    ) {
        let now = fixed_now();
        let mut expired = provider.clone();
        expired.busy_until = Some((now - Duration::seconds(secs_ago)).to_rfc3339());

        prop_assert_eq!(resolve_status(&expired, now), resolve_status(&provider, now));
    }
}

// ============================================================================
// Pricing Properties
// ============================================================================

proptest! {
    /// Property: to_legacy_json then parse_legacy_json returns the same table
    #[test]
    fn prop_legacy_json_roundtrip(table in arb_price_table()) {
        let json = table.to_legacy_json();
        prop_assert_eq!(parse_legacy_json(&json), Some(table), "json was {}", json);
    }

    /// Property: parsing is idempotent on its own output
    #[test]
    fn prop_legacy_json_reparse_idempotent(
        a in 0u32..5_000,
        b in 0u32..5_000,
        c in 0u32..5_000,
    ) {
        let raw = format!(r#"{{"60":{},"90":"{}","120":{}}}"#, a, b, c);
        let once = parse_legacy_json(&raw).unwrap();
        let twice = parse_legacy_json(&once.to_legacy_json()).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Property: an ended discount prices exactly like no discount
    #[test]
    fn prop_expired_discount_is_ignored(
        provider in arb_provider(),
        percentage in 1.0f64..100.0,
        ended_secs_ago in 0i64..86_400,
    ) {
        let now = fixed_now();
        let fallback = PriceTable::FALLBACK;

        let mut discounted = provider.clone();
        discounted.is_discount_active = true;
        discounted.discount_percentage = Some(percentage);
        discounted.discount_end_time =
            Some((now - Duration::seconds(ended_secs_ago)).to_rfc3339());

        let with_expired = resolve_pricing(&discounted, now, &fallback);
        let without = resolve_pricing(&provider, now, &fallback);

        prop_assert_eq!(with_expired.effective, without.effective);
        prop_assert!(!with_expired.has_discount());
    }

    /// Property: a running discount never raises a price
    #[test]
    fn prop_active_discount_never_raises(
        provider in arb_provider(),
        percentage in 0.0f64..=100.0,
    ) {
        let now = fixed_now();
        let mut discounted = provider;
        discounted.is_discount_active = true;
        discounted.discount_percentage = Some(percentage);
        discounted.discount_end_time = Some((now + Duration::hours(1)).to_rfc3339());

        let pricing = resolve_pricing(&discounted, now, &PriceTable::FALLBACK);
        prop_assert!(pricing.effective.min60 <= pricing.base.min60);
        prop_assert!(pricing.effective.min90 <= pricing.base.min90);
        prop_assert!(pricing.effective.min120 <= pricing.base.min120);
    }

    /// Property: any stored discrete price resolves without overflow
    #[test]
    fn prop_any_discrete_price_resolves(p60 in any::<i64>(), p90 in any::<i64>()) {
        let mut provider = Provider::new("t_prop", "Prop");
        provider.price60 = Some(p60);
        provider.price90 = Some(p90);

        let pricing = resolve_pricing(&provider, fixed_now(), &PriceTable::FALLBACK);
        prop_assert!(pricing.base.min60 >= 0);
        prop_assert!(pricing.base.min90 >= 0);
        prop_assert!(!pricing.base.is_empty());
    }

    /// Property: commission + payout == price for any rate
    #[test]
    fn prop_commission_split_sums(price in 0i64..100_000_000, rate in 0.0f64..=1.0) {
        let CommissionSplit { price: p, commission, payout } = split_commission(price, rate);
        prop_assert_eq!(p, price);
        prop_assert_eq!(commission + payout, price);
        prop_assert!(commission >= 0 && commission <= price);
    }
}

// ============================================================================
// Distance Properties
// ============================================================================

/// Map arbitrary integers onto valid coordinates, thousandths of a degree.
fn point(lat: i32, lng: i32) -> GeoPoint {
    GeoPoint::new(
        (lat % 90_000) as f64 / 1000.0,
        (lng % 180_000) as f64 / 1000.0,
    )
}

quickcheck! {
    fn qc_haversine_identity_is_zero(lat: i32, lng: i32) -> bool {
        let p = point(lat, lng);
        haversine_meters(&p, &p) == 0.0
    }

    fn qc_haversine_symmetric(a_lat: i32, a_lng: i32, b_lat: i32, b_lng: i32) -> bool {
        let a = point(a_lat, a_lng);
        let b = point(b_lat, b_lng);
        haversine_meters(&a, &b) == haversine_meters(&b, &a)
    }

    fn qc_haversine_bounded(a_lat: i32, a_lng: i32, b_lat: i32, b_lng: i32) -> TestResult {
        let a = point(a_lat, a_lng);
        let b = point(b_lat, b_lng);
        let d = haversine_meters(&a, &b);
        if !d.is_finite() {
            return TestResult::failed();
        }
        // Half the circumference, plus rounding slack
        TestResult::from_bool(d >= 0.0 && d <= 20_015_087.0)
    }
}

// ============================================================================
// Countdown Properties
// ============================================================================

proptest! {
    /// Property: labels take one of three shapes depending on magnitude
    #[test]
    fn prop_countdown_label_shape(secs in 0u64..400_000) {
        let label = format_remaining(secs);
        if secs >= 3600 {
            prop_assert_eq!(label, format!("{}h {}m", secs / 3600, (secs % 3600) / 60));
        } else if secs >= 60 {
            prop_assert_eq!(label, format!("{}m {}s", secs / 60, secs % 60));
        } else {
            prop_assert_eq!(label, format!("{}s", secs));
        }
    }

    /// Property: positive distance counts down, zero and below count up
    #[test]
    fn prop_countdown_sign(ms in -10_000_000i64..10_000_000) {
        let snapshot = CountdownSnapshot::from_millis(ms);
        prop_assert_eq!(snapshot.is_overtime(), ms <= 0);
        prop_assert_eq!(snapshot.seconds(), ms.unsigned_abs() / 1000);
    }
}

// ============================================================================
// Booking History Properties
// ============================================================================

proptest! {
    /// Property: whatever transitions are attempted, the history stays a
    /// contiguous chain of allowed edges starting at IDLE
    #[test]
    fn prop_history_is_contiguous(attempts in proptest::collection::vec(arb_state(), 0..20)) {
        let now = fixed_now();
        let mut booking = new_booking(now);

        for (i, to) in attempts.into_iter().enumerate() {
            let before = booking.state;
            let at = now + Duration::seconds(i as i64);
            match booking.transition(to, "prop", Actor::System, at) {
                Ok(()) => prop_assert_eq!(booking.state, to),
                Err(_) => {
                    prop_assert!(!before.can_transition_to(to));
                    prop_assert_eq!(booking.state, before);
                }
            }
        }

        let mut expected_from = BookingState::Idle;
        for entry in &booking.history {
            prop_assert_eq!(entry.from, expected_from);
            prop_assert!(entry.from.can_transition_to(entry.to));
            expected_from = entry.to;
        }
        prop_assert_eq!(booking.state, expected_from);
    }

    /// Property: terminal states reject every transition
    #[test]
    fn prop_terminal_states_are_final(to in arb_state()) {
        for terminal in BookingState::ALL.iter().filter(|s| s.is_terminal()) {
            let mut booking = new_booking(fixed_now());
            booking.state = *terminal;

            prop_assert!(booking.transition(to, "prop", Actor::Admin, fixed_now()).is_err());
            prop_assert_eq!(booking.state, *terminal);
            prop_assert!(booking.history.is_empty());
        }
    }
}
