//! Per-seat price computation.
//!
//! A ticket price is derived from three inputs, all fixed at booking time:
//!
//! ```text
//! price = show.base_price * (1 + premium_rate(seat.seat_type)) + seat.base_surcharge
//! ```
//!
//! Premium rates live in a [`PremiumTable`] keyed by seat type, so new
//! tiers are configuration, not code. The engine is a pure function of its
//! inputs: no I/O, no shared mutable state, deterministic.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Seat;
use crate::errors::{PricingError, PricingResult};
use crate::store::ShowRecord;
use crate::types::{Money, SeatType};

/// Errors from [`PremiumRate`] construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PremiumRateError {
    /// Rates are fractions of the base price and never negative.
    #[error("premium rate cannot be negative: {0}")]
    Negative(Decimal),

    /// Sanity cap; a tier costing more than 10x the base price is a
    /// configuration mistake.
    #[error("premium rate {0} exceeds the maximum of {1}")]
    ExceedsMaximum(Decimal, Decimal),
}

/// Upper bound on any premium rate.
pub const MAX_PREMIUM_RATE: Decimal = dec!(10.0);

/// A seat-type premium as a fraction of the base price.
///
/// `0.5` means "+50%". Zero is valid and means the tier sells at base
/// price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PremiumRate(Decimal);

impl PremiumRate {
    /// Validates and wraps a rate.
    pub fn new(rate: Decimal) -> Result<Self, PremiumRateError> {
        if rate.is_sign_negative() {
            return Err(PremiumRateError::Negative(rate));
        }
        if rate > MAX_PREMIUM_RATE {
            return Err(PremiumRateError::ExceedsMaximum(rate, MAX_PREMIUM_RATE));
        }
        Ok(Self(rate))
    }

    /// The zero premium.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// The underlying fraction.
    pub const fn rate(&self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for PremiumRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seat-type premium configuration.
///
/// Open-ended by design: adding a tier is one `with_rate` call when the
/// table is built, never a change to the engine. A seat whose type is
/// missing from the table is a configuration fault surfaced as
/// [`PricingError::UnknownSeatType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumTable {
    rates: HashMap<SeatType, PremiumRate>,
}

impl PremiumTable {
    /// The conventional table: regular seats at base price, VIP at +50%.
    pub fn standard() -> Self {
        Self::empty()
            .with_rate(SeatType::regular(), PremiumRate::zero())
            .with_rate(
                SeatType::vip(),
                PremiumRate::new(dec!(0.5)).expect("0.5 is a valid premium rate"),
            )
    }

    /// A table with no tiers configured.
    pub fn empty() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    /// Adds or replaces a tier's rate.
    #[must_use]
    pub fn with_rate(mut self, seat_type: SeatType, rate: PremiumRate) -> Self {
        self.rates.insert(seat_type, rate);
        self
    }

    /// Looks up a tier's rate.
    pub fn rate(&self, seat_type: &SeatType) -> Option<PremiumRate> {
        self.rates.get(seat_type).copied()
    }
}

impl Default for PremiumTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Derives sale prices from show base prices and seat metadata.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    premiums: PremiumTable,
}

impl PricingEngine {
    /// Builds an engine over a premium table.
    pub const fn new(premiums: PremiumTable) -> Self {
        Self { premiums }
    }

    /// The sale price of `seat` for `show`.
    ///
    /// Rounding policy: the raw product is rounded to the smallest currency
    /// unit (two decimal places) using round-half-up
    /// (`MidpointAwayFromZero`), so `15.015` becomes `15.02`. This is a
    /// revenue-affecting choice; reconciliation downstream assumes it.
    pub fn price_for(&self, show: &ShowRecord, seat: &Seat) -> PricingResult<Money> {
        let premium =
            self.premiums
                .rate(&seat.seat_type)
                .ok_or_else(|| PricingError::UnknownSeatType {
                    seat_type: seat.seat_type.clone(),
                })?;

        let factor = Decimal::ONE + premium.rate();
        let raw = show.base_price.amount() * factor + seat.base_surcharge.amount();
        let rounded = raw.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        Ok(Money::new(rounded)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ShowStatus;
    use crate::types::{FilmId, SeatId, SeatLabel, ShowId, ShowroomId, TimeSlot, Timestamp};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn show_with_base(base: Decimal) -> ShowRecord {
        let start = Timestamp::new(Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).single().unwrap());
        let end = Timestamp::new(Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).single().unwrap());
        ShowRecord {
            id: ShowId::new(),
            film_id: FilmId::try_new("film-1").unwrap(),
            showroom_id: ShowroomId::try_new("room-1").unwrap(),
            slot: TimeSlot::new(start, end).unwrap(),
            base_price: Money::new(base).unwrap(),
            status: ShowStatus::Scheduled,
            created_at: Timestamp::now(),
        }
    }

    fn seat_of(tier: SeatType, surcharge: Decimal) -> Seat {
        Seat {
            id: SeatId::try_new("seat-1").unwrap(),
            showroom_id: ShowroomId::try_new("room-1").unwrap(),
            label: SeatLabel::try_new("A1").unwrap(),
            seat_type: tier,
            base_surcharge: Money::new(surcharge).unwrap(),
        }
    }

    #[test]
    fn vip_premium_is_fifty_percent() {
        let engine = PricingEngine::default();
        let price = engine
            .price_for(
                &show_with_base(dec!(100.00)),
                &seat_of(SeatType::vip(), dec!(0.00)),
            )
            .unwrap();
        assert_eq!(price, Money::new(dec!(150.00)).unwrap());
    }

    #[test]
    fn regular_seats_sell_at_base_price() {
        let engine = PricingEngine::default();
        let price = engine
            .price_for(
                &show_with_base(dec!(12.40)),
                &seat_of(SeatType::regular(), dec!(0.00)),
            )
            .unwrap();
        assert_eq!(price, Money::new(dec!(12.40)).unwrap());
    }

    #[test]
    fn surcharge_is_added_after_the_premium() {
        let engine = PricingEngine::default();
        let price = engine
            .price_for(
                &show_with_base(dec!(100.00)),
                &seat_of(SeatType::vip(), dec!(2.50)),
            )
            .unwrap();
        assert_eq!(price, Money::new(dec!(152.50)).unwrap());
    }

    #[test]
    fn midpoints_round_away_from_zero() {
        let engine = PricingEngine::default();
        // 10.01 * 1.5 = 15.015, which must round up to 15.02.
        let price = engine
            .price_for(
                &show_with_base(dec!(10.01)),
                &seat_of(SeatType::vip(), dec!(0.00)),
            )
            .unwrap();
        assert_eq!(price, Money::new(dec!(15.02)).unwrap());
    }

    #[test]
    fn sub_midpoint_fractions_round_down() {
        let table = PremiumTable::standard().with_rate(
            SeatType::try_new("recliner").unwrap(),
            PremiumRate::new(dec!(0.172)).unwrap(),
        );
        let engine = PricingEngine::new(table);
        // 10.02 * 1.172 = 11.74344, which must round down to 11.74.
        let price = engine
            .price_for(
                &show_with_base(dec!(10.02)),
                &seat_of(SeatType::try_new("recliner").unwrap(), dec!(0.00)),
            )
            .unwrap();
        assert_eq!(price, Money::new(dec!(11.74)).unwrap());
    }

    #[test]
    fn unconfigured_tier_is_a_pricing_error() {
        let engine = PricingEngine::default();
        let result = engine.price_for(
            &show_with_base(dec!(10.00)),
            &seat_of(SeatType::try_new("couple-sofa").unwrap(), dec!(0.00)),
        );
        assert!(matches!(
            result,
            Err(PricingError::UnknownSeatType { seat_type }) if seat_type.as_ref() == "couple-sofa"
        ));
    }

    #[test]
    fn premium_rate_enforces_bounds() {
        assert!(PremiumRate::new(dec!(-0.1)).is_err());
        assert!(PremiumRate::new(dec!(0)).is_ok());
        assert!(PremiumRate::new(MAX_PREMIUM_RATE).is_ok());
        assert!(PremiumRate::new(MAX_PREMIUM_RATE + dec!(0.01)).is_err());
    }

    proptest! {
        #[test]
        fn pricing_is_deterministic(base_cents in 1u64..40_000_000u64) {
            let engine = PricingEngine::default();
            let show = show_with_base(Decimal::from(base_cents) / dec!(100));
            let seat = seat_of(SeatType::vip(), dec!(1.00));

            let first = engine.price_for(&show, &seat).unwrap();
            let second = engine.price_for(&show, &seat).unwrap();
            prop_assert_eq!(first, second);
            prop_assert!(first.amount() >= show.base_price.amount());
        }
    }
}
