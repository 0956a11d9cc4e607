//! Persistence port for shows and bookings.
//!
//! The core keeps its concurrency control in-process (per-show partition
//! locks); the store is the durable system of record behind it. Adapters
//! must nonetheless enforce the at-most-one-confirmed-booking rule on every
//! commit as a backstop, so a misbehaving caller or a second process cannot
//! double-sell a seat.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StoreResult;
use crate::types::{
    BookingGroupId, BookingId, FilmId, Money, SeatId, ShowId, ShowroomId, TimeSlot, Timestamp,
};

/// Lifecycle state of a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShowStatus {
    /// The show is on sale.
    Scheduled,
    /// The show was cancelled by its owner; it sells no seats and its slot
    /// no longer blocks the showroom.
    Cancelled,
}

/// Lifecycle state of a booking row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    /// The seat is sold for the show.
    Confirmed,
    /// The booking was released; the seat is available again.
    Cancelled,
}

/// A stored show: one film in one showroom for one time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowRecord {
    /// Identifier minted by the schedule planner.
    pub id: ShowId,
    /// The film being screened.
    pub film_id: FilmId,
    /// The showroom hosting the screening.
    pub showroom_id: ShowroomId,
    /// Half-open screening interval.
    pub slot: TimeSlot,
    /// Base ticket price before seat premiums and surcharges.
    pub base_price: Money,
    /// Current lifecycle state.
    pub status: ShowStatus,
    /// When the show was registered.
    pub created_at: Timestamp,
}

/// A stored booking: one seat sold for one show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    /// Identifier of this booking row.
    pub id: BookingId,
    /// The group this booking was reserved with.
    pub group_id: BookingGroupId,
    /// The show the seat is sold for.
    pub show_id: ShowId,
    /// The sold seat.
    pub seat_id: SeatId,
    /// Current lifecycle state.
    pub status: BookingStatus,
    /// The price charged when the booking was created. Never recomputed:
    /// later changes to the show's base price leave receipts untouched.
    pub price_paid: Money,
    /// When the booking was created.
    pub created_at: Timestamp,
}

/// The bookings created by one atomic reserve call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingGroupRecord {
    /// Group identifier, used for cancellation and receipts.
    pub id: BookingGroupId,
    /// The show all bookings in the group belong to.
    pub show_id: ShowId,
    /// The member bookings. Share one fate: all confirmed together, all
    /// cancelled together.
    pub bookings: Vec<BookingRecord>,
    /// When the group was reserved.
    pub created_at: Timestamp,
}

impl BookingGroupRecord {
    /// The seat ids covered by this group.
    pub fn seat_ids(&self) -> Vec<SeatId> {
        self.bookings.iter().map(|b| b.seat_id.clone()).collect()
    }

    /// Whether every member booking is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.bookings
            .iter()
            .all(|b| b.status == BookingStatus::Cancelled)
    }
}

/// Filter for show listings.
///
/// The time window applies to show start times, half-open: a show is listed
/// when `from <= start < to`. Cancelled shows are excluded unless
/// `include_cancelled` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowFilter {
    /// Restrict to one film.
    pub film_id: Option<FilmId>,
    /// Earliest start time, inclusive.
    pub from: Option<Timestamp>,
    /// Latest start time, exclusive.
    pub to: Option<Timestamp>,
    /// Also list cancelled shows.
    pub include_cancelled: bool,
}

impl ShowFilter {
    /// A filter that lists every non-cancelled show.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts the listing to one film.
    #[must_use]
    pub fn with_film(mut self, film_id: FilmId) -> Self {
        self.film_id = Some(film_id);
        self
    }

    /// Sets the inclusive lower bound on start times.
    #[must_use]
    pub fn with_from(mut self, from: Timestamp) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the exclusive upper bound on start times.
    #[must_use]
    pub fn with_to(mut self, to: Timestamp) -> Self {
        self.to = Some(to);
        self
    }

    /// Includes cancelled shows in the listing.
    #[must_use]
    pub fn with_cancelled(mut self) -> Self {
        self.include_cancelled = true;
        self
    }

    /// Whether a stored show passes this filter. Adapters share this so
    /// filtering behaves identically everywhere.
    pub fn matches(&self, show: &ShowRecord) -> bool {
        if !self.include_cancelled && show.status == ShowStatus::Cancelled {
            return false;
        }
        if let Some(film_id) = &self.film_id {
            if &show.film_id != film_id {
                return false;
            }
        }
        let start = show.slot.start();
        if let Some(from) = self.from {
            if start < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if start >= to {
                return false;
            }
        }
        true
    }
}

/// Result of cancelling a booking group at the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCancelOutcome {
    /// The show the group belonged to.
    pub show_id: ShowId,
    /// The seats released by this call (empty when the group was already
    /// cancelled).
    pub seats: Vec<SeatId>,
    /// True when a previous call had already cancelled the group and this
    /// call changed nothing.
    pub already_cancelled: bool,
}

/// Result of cancelling a show at the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowCancelOutcome {
    /// True when the show was already cancelled and this call changed
    /// nothing.
    pub already_cancelled: bool,
    /// Groups whose confirmed bookings this call cancelled, for the
    /// external refund/notification collaborator.
    pub affected_groups: Vec<BookingGroupId>,
}

/// Durable storage for shows and bookings.
///
/// Contract for implementations:
///
/// - `commit_group` is atomic: either every booking in the group is stored
///   as confirmed or the store is unchanged. It must refuse, with
///   [`crate::errors::StoreError::DuplicateConfirmed`], any group containing
///   a seat that already has a confirmed booking for the same show. This is
///   the uniqueness backstop; it must hold even if callers bypass the
///   ledger's locking.
/// - `cancel_show` is atomic: the status flip and the cascade over the
///   show's confirmed bookings are one commit, never observable half-done.
/// - Listings are ordered by slot start time (ties by show id) so output is
///   deterministic.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Stores a newly created show.
    async fn insert_show(&self, show: ShowRecord) -> StoreResult<()>;

    /// Fetches a show by id, regardless of status.
    async fn show(&self, id: &ShowId) -> StoreResult<Option<ShowRecord>>;

    /// All shows registered in a showroom, any status, ordered by start.
    async fn shows_in_showroom(&self, showroom_id: &ShowroomId) -> StoreResult<Vec<ShowRecord>>;

    /// Shows passing the filter, ordered by start.
    async fn list_shows(&self, filter: &ShowFilter) -> StoreResult<Vec<ShowRecord>>;

    /// Atomically stores a reserved booking group. See the trait contract.
    async fn commit_group(&self, group: BookingGroupRecord) -> StoreResult<()>;

    /// Fetches a booking group by id.
    async fn booking_group(&self, id: &BookingGroupId) -> StoreResult<Option<BookingGroupRecord>>;

    /// The seats currently confirmed for a show, as one consistent snapshot.
    async fn confirmed_seats(&self, show_id: &ShowId) -> StoreResult<HashSet<SeatId>>;

    /// Cancels every booking in a group. Idempotent: repeat calls report
    /// `already_cancelled` instead of failing. `None` for unknown groups.
    async fn cancel_group(&self, id: &BookingGroupId) -> StoreResult<Option<GroupCancelOutcome>>;

    /// Cancels a show and cascades over its confirmed bookings in one
    /// atomic commit. `None` for unknown shows.
    async fn cancel_show(&self, id: &ShowId) -> StoreResult<Option<ShowCancelOutcome>>;
}
