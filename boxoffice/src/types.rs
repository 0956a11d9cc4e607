//! Core domain types for the `boxoffice` reservation library.
//!
//! Every identifier and amount is a smart-constructed newtype, following the
//! "parse, don't validate" principle: once a value exists, it is valid, and
//! no downstream code re-checks it.
//!
//! Catalog-owned identifiers (`FilmId`, `ShowroomId`, `SeatId`) are opaque
//! strings because the catalog is an external system with its own id scheme.
//! Identifiers minted by this library (`ShowId`, `BookingId`,
//! `BookingGroupId`) are UUIDv7, which sort by creation time.

use chrono::{DateTime, Utc};
use nutype::nutype;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a film in the external catalog.
///
/// Non-empty, trimmed, at most 64 characters. The format beyond that is the
/// catalog's business.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 64),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct FilmId(String);

/// Identifier of a showroom in the external catalog.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 64),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct ShowroomId(String);

/// Identifier of a physical seat in the external catalog.
///
/// Seats belong to exactly one showroom; the pairing is validated by the
/// reservation ledger, not by this type.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 64),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct SeatId(String);

/// Human-facing seat label, e.g. `"A1"` or `"K14"`, as printed on the
/// ticket.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 16),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct SeatLabel(String);

/// Seat tier, an open enumeration rather than a closed enum.
///
/// New tiers (couple sofas, recliners, ...) are introduced by the catalog and
/// priced through the premium table; no code change is required here.
/// Values are normalized to lowercase so `"VIP"` and `"vip"` are the same
/// tier.
#[nutype(
    sanitize(trim, lowercase),
    validate(not_empty, len_char_max = 32),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct SeatType(String);

impl SeatType {
    /// The standard seat tier.
    pub fn regular() -> Self {
        Self::try_new("regular").expect("\"regular\" is a valid seat type")
    }

    /// The VIP seat tier.
    pub fn vip() -> Self {
        Self::try_new("vip").expect("\"vip\" is a valid seat type")
    }
}

/// Identifier of a scheduled show, minted by the schedule planner.
#[nutype(
    validate(predicate = |id: &Uuid| id.get_version() == Some(uuid::Version::SortRand)),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct ShowId(Uuid);

impl ShowId {
    /// Mints a fresh show id.
    pub fn new() -> Self {
        Self::try_new(Uuid::now_v7()).expect("Uuid::now_v7() always returns a valid v7 UUID")
    }
}

impl Default for ShowId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of a single booking row (one seat, one show).
#[nutype(
    validate(predicate = |id: &Uuid| id.get_version() == Some(uuid::Version::SortRand)),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Mints a fresh booking id.
    pub fn new() -> Self {
        Self::try_new(Uuid::now_v7()).expect("Uuid::now_v7() always returns a valid v7 UUID")
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of a booking group: the bookings created by one atomic
/// reserve call, cancelled together and addressed together on receipts.
#[nutype(
    validate(predicate = |id: &Uuid| id.get_version() == Some(uuid::Version::SortRand)),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct BookingGroupId(Uuid);

impl BookingGroupId {
    /// Mints a fresh booking group id.
    pub fn new() -> Self {
        Self::try_new(Uuid::now_v7()).expect("Uuid::now_v7() always returns a valid v7 UUID")
    }
}

impl Default for BookingGroupId {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from [`Money`] construction and arithmetic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Monetary amounts are never negative in this domain.
    #[error("money amount cannot be negative: {0}")]
    Negative(Decimal),

    /// Amounts are denominated in the smallest currency unit (cents).
    #[error("money supports at most 2 decimal places, got: {0}")]
    TooManyDecimalPlaces(Decimal),

    /// Sanity cap so arithmetic bugs surface instead of silently producing
    /// absurd totals.
    #[error("money amount {0} exceeds the maximum of {1}")]
    ExceedsMaximum(Decimal, Decimal),
}

/// Upper bound on any single monetary amount handled by the core.
pub const MAX_MONEY_AMOUNT: Decimal = dec!(1_000_000.00);

/// A non-negative monetary amount with at most two decimal places.
///
/// Used for show base prices, per-seat surcharges, computed ticket prices
/// and receipt totals. The currency itself is implicit; the core never
/// converts between currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    /// Validates and wraps a decimal amount.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() {
            return Err(MoneyError::Negative(amount));
        }
        if amount.scale() > 2 {
            return Err(MoneyError::TooManyDecimalPlaces(amount));
        }
        if amount > MAX_MONEY_AMOUNT {
            return Err(MoneyError::ExceedsMaximum(amount, MAX_MONEY_AMOUNT));
        }
        Ok(Self(amount))
    }

    /// Builds an amount from a count of cents (`1050` becomes `10.50`).
    pub fn from_cents(cents: u64) -> Result<Self, MoneyError> {
        Self::new(Decimal::from(cents) / dec!(100))
    }

    /// The zero amount.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// The underlying decimal value.
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount as a count of cents.
    pub fn to_cents(&self) -> u64 {
        (self.0 * dec!(100)).to_u64().unwrap_or(0)
    }

    /// Checked addition; fails if the sum exceeds [`MAX_MONEY_AMOUNT`].
    pub fn add(&self, other: &Self) -> Result<Self, MoneyError> {
        Self::new(self.0 + other.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A timestamp in UTC.
///
/// One wrapper type everywhere keeps time handling uniform across show
/// intervals, booking rows and receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wraps a UTC `DateTime`.
    pub const fn new(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// The current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// The underlying `DateTime`.
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::new(datetime)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Error from [`TimeSlot`] construction.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlotError {
    /// A slot must satisfy `start < end`; zero-length and inverted
    /// intervals are rejected.
    #[error("time slot start {start} is not before end {end}")]
    Empty {
        /// The offending start.
        start: Timestamp,
        /// The offending end.
        end: Timestamp,
    },
}

/// A half-open time interval `[start, end)`.
///
/// Half-open semantics let back-to-back shows share a boundary instant: a
/// slot ending at 12:00 does not overlap one starting at 12:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    start: Timestamp,
    end: Timestamp,
}

impl TimeSlot {
    /// Validates `start < end` and builds the slot.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, TimeSlotError> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(TimeSlotError::Empty { start, end })
        }
    }

    /// Inclusive start of the interval.
    pub const fn start(&self) -> Timestamp {
        self.start
    }

    /// Exclusive end of the interval.
    pub const fn end(&self) -> Timestamp {
        self.end
    }

    /// Half-open interval intersection: true when the two slots share any
    /// instant. Touching boundaries do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::new(Utc.timestamp_opt(secs, 0).single().unwrap())
    }

    proptest! {
        #[test]
        fn catalog_ids_accept_reasonable_strings(s in "[a-zA-Z0-9_-]{1,64}") {
            prop_assert!(FilmId::try_new(s.clone()).is_ok());
            prop_assert!(ShowroomId::try_new(s.clone()).is_ok());
            prop_assert!(SeatId::try_new(s).is_ok());
        }

        #[test]
        fn catalog_ids_trim_whitespace(s in " {0,5}[a-zA-Z0-9_-]{1,50} {0,5}") {
            let id = SeatId::try_new(s.clone()).unwrap();
            prop_assert_eq!(id.as_ref(), s.trim());
        }

        #[test]
        fn catalog_ids_reject_blank(s in " {0,30}") {
            prop_assert!(FilmId::try_new(s).is_err());
        }

        #[test]
        fn catalog_ids_reject_overlong(s in "[a-z0-9]{65,120}") {
            prop_assert!(ShowroomId::try_new(s).is_err());
        }

        #[test]
        fn seat_type_normalizes_case(s in "[a-zA-Z]{1,20}") {
            let tier = SeatType::try_new(s.clone()).unwrap();
            let lowered = s.to_lowercase();
            prop_assert_eq!(tier.as_ref(), lowered.as_str());
        }

        #[test]
        fn slot_overlap_is_symmetric(
            a in 0i64..10_000,
            b in 1i64..10_000,
            c in 0i64..10_000,
            d in 1i64..10_000,
        ) {
            let first = TimeSlot::new(ts(a), ts(a + b)).unwrap();
            let second = TimeSlot::new(ts(c), ts(c + d)).unwrap();
            prop_assert_eq!(first.overlaps(&second), second.overlaps(&first));
        }

        #[test]
        fn slot_contained_in_another_overlaps(start in 0i64..1000, len in 2i64..1000) {
            let outer = TimeSlot::new(ts(start), ts(start + len + 2)).unwrap();
            let inner = TimeSlot::new(ts(start + 1), ts(start + len + 1)).unwrap();
            prop_assert!(outer.overlaps(&inner));
        }

        #[test]
        fn money_cents_roundtrip(cents in 0u64..100_000_000u64) {
            let money = Money::from_cents(cents).unwrap();
            prop_assert_eq!(money.to_cents(), cents);
        }

        #[test]
        fn money_serde_roundtrip(cents in 0u64..10_000_000u64) {
            let money = Money::from_cents(cents).unwrap();
            let json = serde_json::to_string(&money).unwrap();
            let back: Money = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(money, back);
        }
    }

    #[test]
    fn seat_type_constructors_are_normalized() {
        assert_eq!(SeatType::regular().as_ref(), "regular");
        assert_eq!(SeatType::vip().as_ref(), "vip");
        assert_eq!(SeatType::try_new("  VIP ").unwrap(), SeatType::vip());
    }

    #[test]
    fn generated_ids_are_v7_and_distinct() {
        let show = ShowId::new();
        assert_eq!(show.as_ref().get_version(), Some(uuid::Version::SortRand));
        assert_ne!(BookingId::new(), BookingId::new());
        assert_ne!(BookingGroupId::new(), BookingGroupId::new());
    }

    #[test]
    fn generated_ids_reject_other_uuid_versions() {
        let mut bytes = [0u8; 16];
        bytes[6] = (bytes[6] & 0x0F) | 0x40; // version 4
        bytes[8] = (bytes[8] & 0x3F) | 0x80;
        let v4 = Uuid::from_bytes(bytes);
        assert!(ShowId::try_new(v4).is_err());
        assert!(BookingId::try_new(Uuid::nil()).is_err());
        assert!(BookingGroupId::try_new(Uuid::max()).is_err());
    }

    #[test]
    fn money_validates_on_construction() {
        assert_eq!(Money::new(dec!(12.50)).unwrap().to_cents(), 1250);
        assert!(matches!(
            Money::new(dec!(-0.01)),
            Err(MoneyError::Negative(_))
        ));
        assert!(matches!(
            Money::new(dec!(1.999)),
            Err(MoneyError::TooManyDecimalPlaces(_))
        ));
        assert!(matches!(
            Money::new(MAX_MONEY_AMOUNT + dec!(0.01)),
            Err(MoneyError::ExceedsMaximum(_, _))
        ));
    }

    #[test]
    fn money_add_is_checked() {
        let a = Money::new(dec!(10.25)).unwrap();
        let b = Money::new(dec!(4.75)).unwrap();
        assert_eq!(a.add(&b).unwrap(), Money::new(dec!(15.00)).unwrap());

        let max = Money::new(MAX_MONEY_AMOUNT).unwrap();
        assert!(max.add(&b).is_err());
    }

    #[test]
    fn money_displays_two_decimal_places() {
        assert_eq!(Money::from_cents(150).unwrap().to_string(), "1.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn time_slot_rejects_empty_and_inverted() {
        assert!(TimeSlot::new(ts(100), ts(100)).is_err());
        assert!(TimeSlot::new(ts(200), ts(100)).is_err());
        assert!(TimeSlot::new(ts(100), ts(101)).is_ok());
    }

    #[test]
    fn touching_slots_do_not_overlap() {
        let morning = TimeSlot::new(ts(0), ts(100)).unwrap();
        let noon = TimeSlot::new(ts(100), ts(200)).unwrap();
        assert!(!morning.overlaps(&noon));
        assert!(!noon.overlaps(&morning));
    }
}
