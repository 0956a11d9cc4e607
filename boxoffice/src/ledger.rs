//! The reservation ledger: the only authority on seat-booking state.
//!
//! Every mutation of a show's seats runs inside that show's exclusive
//! critical section (a lazily-created partition lock), so reserve and
//! cancel are linearizable per show. Operations on different shows never
//! contend. The persistence port re-checks uniqueness on commit as a
//! backstop, so even a bypassed lock cannot double-sell a seat.
//!
//! When two reserve calls race for the same seat, exactly one wins; which
//! one is not deterministic (first physical commit wins), but the loser
//! always learns precisely which seats it lost.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{CatalogStore, Seat};
use crate::config::ContentionConfig;
use crate::errors::{LedgerError, LedgerResult};
use crate::locks::PartitionLocks;
use crate::store::{
    BookingGroupRecord, BookingRecord, BookingStatus, ReservationStore, ShowRecord, ShowStatus,
};
use crate::types::{BookingGroupId, BookingId, Money, SeatId, ShowId, Timestamp};

/// Whether a seat can still be sold for a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatStatus {
    /// No confirmed booking holds this seat.
    Available,
    /// A confirmed booking holds this seat.
    Booked,
}

/// One seat of the show's showroom with its current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAvailability {
    /// The seat, with its catalog metadata.
    pub seat: Seat,
    /// Sold or not, at the snapshot instant.
    pub status: SeatStatus,
}

/// A consistent availability snapshot for one show.
///
/// Derived on every read, never stored. Seats appear in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowAvailability {
    /// The show the snapshot describes.
    pub show: ShowRecord,
    /// Every seat of the show's showroom.
    pub seats: Vec<SeatAvailability>,
}

impl ShowAvailability {
    /// Number of seats still sellable.
    pub fn seats_available(&self) -> usize {
        self.seats
            .iter()
            .filter(|s| s.status == SeatStatus::Available)
            .count()
    }

    /// Total seats in the showroom.
    pub fn seats_total(&self) -> usize {
        self.seats.len()
    }
}

/// One seat of a reserve request with the price to charge for it.
///
/// Prices are computed by the caller at booking time and stamped onto the
/// booking rows unchanged, so later price changes never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatCharge {
    /// The seat to reserve.
    pub seat_id: SeatId,
    /// The price to record as paid.
    pub price: Money,
}

/// Result of a booking-group cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// This call released the seats.
    Cancelled {
        /// The seats returned to availability.
        seats: Vec<SeatId>,
    },
    /// An earlier call had already cancelled the group; nothing changed.
    /// Deliberately not an error: repeating a cancellation is harmless.
    AlreadyCancelled,
}

/// Report of a show cancellation, for the external refund/notification
/// collaborator. The core itself performs no refunds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelledShow {
    /// The cancelled show.
    pub show_id: ShowId,
    /// Every booking group whose confirmed bookings the cascade cancelled.
    pub affected_groups: Vec<BookingGroupId>,
}

/// Tracks which seats of which show are sold and grants or denies booking
/// attempts atomically.
pub struct ReservationLedger<C, S> {
    catalog: Arc<C>,
    store: Arc<S>,
    locks: PartitionLocks<ShowId>,
    config: ContentionConfig,
}

impl<C, S> ReservationLedger<C, S>
where
    C: CatalogStore,
    S: ReservationStore,
{
    /// Builds a ledger over the injected catalog and store.
    pub fn new(catalog: Arc<C>, store: Arc<S>, config: ContentionConfig) -> Self {
        Self {
            catalog,
            store,
            locks: PartitionLocks::new(),
            config,
        }
    }

    /// A consistent availability snapshot for a show.
    ///
    /// Not linearizable with concurrent reserves, but read-your-writes: a
    /// caller whose reserve has returned sees those seats as booked. A
    /// cancelled show reports [`LedgerError::ShowNotFound`] like an unknown
    /// one.
    pub async fn availability(&self, show_id: &ShowId) -> LedgerResult<ShowAvailability> {
        let show = self.active_show(show_id).await?;
        let seats = self.catalog.seats(&show.showroom_id).await?;
        let booked = self.store.confirmed_seats(show_id).await?;

        let seats = seats
            .into_iter()
            .map(|seat| {
                let status = if booked.contains(&seat.id) {
                    SeatStatus::Booked
                } else {
                    SeatStatus::Available
                };
                SeatAvailability { seat, status }
            })
            .collect();

        Ok(ShowAvailability { show, seats })
    }

    /// Atomically reserves every requested seat for a show, or none.
    ///
    /// Runs under the show's exclusive critical section: the conflict check
    /// and the commit are one step, so two concurrent calls for overlapping
    /// seat sets cannot both succeed. A successful reserve is visible to
    /// every subsequent availability or reserve call for that show.
    ///
    /// On conflict, the error carries exactly the seats that were already
    /// sold so the caller can re-offer alternatives. A lock wait beyond the
    /// configured bound fails as [`LedgerError::Busy`] with no partial
    /// state; the request is as if it never started.
    pub async fn reserve(
        &self,
        show_id: &ShowId,
        charges: Vec<SeatCharge>,
    ) -> LedgerResult<BookingGroupRecord> {
        if charges.is_empty() {
            return Err(LedgerError::EmptySeatRequest);
        }
        let duplicates = duplicate_seats(&charges);
        if !duplicates.is_empty() {
            return Err(LedgerError::DuplicateSeatInRequest { seats: duplicates });
        }

        let _guard = self.lock_show(show_id).await?;

        let show = self.active_show(show_id).await?;
        let known: HashSet<SeatId> = self
            .catalog
            .seats(&show.showroom_id)
            .await?
            .into_iter()
            .map(|seat| seat.id)
            .collect();
        let mut foreign: Vec<SeatId> = charges
            .iter()
            .filter(|charge| !known.contains(&charge.seat_id))
            .map(|charge| charge.seat_id.clone())
            .collect();
        if !foreign.is_empty() {
            foreign.sort();
            return Err(LedgerError::SeatNotInShowroom {
                showroom_id: show.showroom_id,
                seats: foreign,
            });
        }

        let booked = self.store.confirmed_seats(show_id).await?;
        let mut conflicts: Vec<SeatId> = charges
            .iter()
            .filter(|charge| booked.contains(&charge.seat_id))
            .map(|charge| charge.seat_id.clone())
            .collect();
        if !conflicts.is_empty() {
            conflicts.sort();
            debug!(show = %show_id, conflicts = conflicts.len(), "reserve rejected: seats taken");
            return Err(LedgerError::SeatUnavailable {
                show_id: *show_id,
                seats: conflicts,
            });
        }

        let now = Timestamp::now();
        let group_id = BookingGroupId::new();
        let bookings = charges
            .into_iter()
            .map(|charge| BookingRecord {
                id: BookingId::new(),
                group_id,
                show_id: *show_id,
                seat_id: charge.seat_id,
                status: BookingStatus::Confirmed,
                price_paid: charge.price,
                created_at: now,
            })
            .collect::<Vec<_>>();
        let group = BookingGroupRecord {
            id: group_id,
            show_id: *show_id,
            bookings,
            created_at: now,
        };

        self.store.commit_group(group.clone()).await?;

        info!(
            group = %group.id,
            show = %show_id,
            seats = group.bookings.len(),
            "seats reserved"
        );
        Ok(group)
    }

    /// Cancels a booking group, releasing its seats.
    ///
    /// Idempotent: the first call releases and reports the seats, repeat
    /// calls report [`CancelOutcome::AlreadyCancelled`]. Only an unknown
    /// group id is an error.
    pub async fn cancel_group(&self, group_id: &BookingGroupId) -> LedgerResult<CancelOutcome> {
        let group = self
            .store
            .booking_group(group_id)
            .await?
            .ok_or(LedgerError::GroupNotFound(*group_id))?;

        let _guard = self.lock_show(&group.show_id).await?;

        let outcome = self
            .store
            .cancel_group(group_id)
            .await?
            .ok_or(LedgerError::GroupNotFound(*group_id))?;

        if outcome.already_cancelled {
            debug!(group = %group_id, "cancel repeated on cancelled group");
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        info!(
            group = %group_id,
            show = %outcome.show_id,
            seats = outcome.seats.len(),
            "booking group cancelled"
        );
        Ok(CancelOutcome::Cancelled {
            seats: outcome.seats,
        })
    }

    /// Cancels a show and cascades over its confirmed bookings.
    ///
    /// Runs in the show's critical section, and the store applies the
    /// status flip and the cascade as one atomic commit: no concurrent
    /// reserve can interleave, and no observer sees a cancelled show with
    /// live bookings. Repeating the call is an error
    /// ([`LedgerError::ShowAlreadyCancelled`]), unlike group cancellation.
    pub async fn cancel_show(&self, show_id: &ShowId) -> LedgerResult<CancelledShow> {
        let _guard = self.lock_show(show_id).await?;

        let outcome = self
            .store
            .cancel_show(show_id)
            .await?
            .ok_or(LedgerError::ShowNotFound(*show_id))?;

        if outcome.already_cancelled {
            return Err(LedgerError::ShowAlreadyCancelled(*show_id));
        }

        info!(
            show = %show_id,
            affected_groups = outcome.affected_groups.len(),
            "show cancelled, bookings cascaded"
        );
        Ok(CancelledShow {
            show_id: *show_id,
            affected_groups: outcome.affected_groups,
        })
    }

    /// Acquires the show's partition lock within the configured bound.
    async fn lock_show(
        &self,
        show_id: &ShowId,
    ) -> LedgerResult<tokio::sync::OwnedMutexGuard<()>> {
        let bound = self.config.lock_timeout();
        self.locks
            .acquire(show_id, bound.as_duration())
            .await
            .map_err(|_| {
                debug!(show = %show_id, timeout_ms = bound.as_millis(), "show lock wait expired");
                LedgerError::Busy {
                    show_id: *show_id,
                    timeout_ms: bound.as_millis(),
                }
            })
    }

    /// Fetches a show that is still selling seats. Cancelled and unknown
    /// shows are the same error by design.
    async fn active_show(&self, show_id: &ShowId) -> LedgerResult<ShowRecord> {
        let show = self
            .store
            .show(show_id)
            .await?
            .ok_or(LedgerError::ShowNotFound(*show_id))?;
        if show.status == ShowStatus::Cancelled {
            return Err(LedgerError::ShowNotFound(*show_id));
        }
        Ok(show)
    }
}

/// Seat ids that appear more than once, sorted and deduplicated.
fn duplicate_seats(charges: &[SeatCharge]) -> Vec<SeatId> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<SeatId> = charges
        .iter()
        .filter(|charge| !seen.insert(charge.seat_id.clone()))
        .map(|charge| charge.seat_id.clone())
        .collect();
    duplicates.sort();
    duplicates.dedup();
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn charge(seat: &str) -> SeatCharge {
        SeatCharge {
            seat_id: SeatId::try_new(seat).unwrap(),
            price: Money::new(dec!(10.00)).unwrap(),
        }
    }

    #[test]
    fn duplicate_detection_reports_each_seat_once() {
        let charges = vec![
            charge("a1"),
            charge("a2"),
            charge("a1"),
            charge("a1"),
            charge("a3"),
        ];
        assert_eq!(
            duplicate_seats(&charges),
            vec![SeatId::try_new("a1").unwrap()]
        );
    }

    #[test]
    fn unique_requests_have_no_duplicates() {
        let charges = vec![charge("a1"), charge("a2")];
        assert!(duplicate_seats(&charges).is_empty());
    }

    #[test]
    fn availability_counts_partition_the_room() {
        let seat = |id: &str, status| SeatAvailability {
            seat: Seat {
                id: SeatId::try_new(id).unwrap(),
                showroom_id: crate::types::ShowroomId::try_new("room-1").unwrap(),
                label: crate::types::SeatLabel::try_new(id).unwrap(),
                seat_type: crate::types::SeatType::regular(),
                base_surcharge: Money::zero(),
            },
            status,
        };
        let availability = ShowAvailability {
            show: ShowRecord {
                id: ShowId::new(),
                film_id: crate::types::FilmId::try_new("f").unwrap(),
                showroom_id: crate::types::ShowroomId::try_new("room-1").unwrap(),
                slot: crate::types::TimeSlot::new(
                    Timestamp::now(),
                    Timestamp::new(chrono::Utc::now() + chrono::Duration::hours(2)),
                )
                .unwrap(),
                base_price: Money::new(dec!(10.00)).unwrap(),
                status: ShowStatus::Scheduled,
                created_at: Timestamp::now(),
            },
            seats: vec![
                seat("a1", SeatStatus::Booked),
                seat("a2", SeatStatus::Available),
                seat("a3", SeatStatus::Available),
            ],
        };
        assert_eq!(availability.seats_total(), 3);
        assert_eq!(availability.seats_available(), 2);
    }
}
