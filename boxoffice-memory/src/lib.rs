//! In-memory adapters for the `boxoffice` reservation core.
//!
//! This crate provides an in-memory implementation of the `CatalogStore`
//! and `ReservationStore` ports from the boxoffice crate, useful for
//! testing and development scenarios where persistence is not required.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use boxoffice::catalog::{CatalogStore, Film, Seat, Showroom};
use boxoffice::errors::{CatalogError, CatalogResult, StoreError, StoreResult};
use boxoffice::store::{
    BookingGroupRecord, BookingStatus, GroupCancelOutcome, ReservationStore, ShowCancelOutcome,
    ShowFilter, ShowRecord, ShowStatus,
};
use boxoffice::types::{BookingGroupId, FilmId, SeatId, ShowId, ShowroomId};

/// Thread-safe in-memory catalog for testing.
///
/// Seeded through the `with_*` builders, then shared read-only with the
/// core. An outage can be injected to exercise `CatalogUnavailable`
/// handling.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    // Maps film ids to films
    films: Arc<RwLock<HashMap<FilmId, Film>>>,
    // Maps showroom ids to showrooms
    showrooms: Arc<RwLock<HashMap<ShowroomId, Showroom>>>,
    // Maps showroom ids to their seats, in layout order
    seats: Arc<RwLock<HashMap<ShowroomId, Vec<Seat>>>>,
    // When set, every call fails with this reason
    outage: Arc<RwLock<Option<String>>>,
}

impl InMemoryCatalog {
    /// Create a new empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a film.
    #[must_use]
    pub fn with_film(self, film: Film) -> Self {
        self.films
            .write()
            .expect("RwLock poisoned")
            .insert(film.id.clone(), film);
        self
    }

    /// Seeds a showroom and its seats, kept in the given order.
    #[must_use]
    pub fn with_showroom(self, showroom: Showroom, seats: Vec<Seat>) -> Self {
        let id = showroom.id().clone();
        self.showrooms
            .write()
            .expect("RwLock poisoned")
            .insert(id.clone(), showroom);
        self.seats.write().expect("RwLock poisoned").insert(id, seats);
        self
    }

    /// Makes every subsequent call fail with `CatalogUnavailable`.
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        *self.outage.write().expect("RwLock poisoned") = Some(reason.into());
    }

    /// Restores normal service after [`Self::set_unavailable`].
    pub fn set_available(&self) {
        *self.outage.write().expect("RwLock poisoned") = None;
    }

    fn check_outage(&self) -> CatalogResult<()> {
        match self.outage.read().expect("RwLock poisoned").as_ref() {
            Some(reason) => Err(CatalogError::Unavailable {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn film(&self, id: &FilmId) -> CatalogResult<Option<Film>> {
        self.check_outage()?;
        Ok(self.films.read().expect("RwLock poisoned").get(id).cloned())
    }

    async fn showroom(&self, id: &ShowroomId) -> CatalogResult<Option<Showroom>> {
        self.check_outage()?;
        Ok(self
            .showrooms
            .read()
            .expect("RwLock poisoned")
            .get(id)
            .cloned())
    }

    async fn seats(&self, showroom_id: &ShowroomId) -> CatalogResult<Vec<Seat>> {
        self.check_outage()?;
        Ok(self
            .seats
            .read()
            .expect("RwLock poisoned")
            .get(showroom_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct StoreInner {
    shows: HashMap<ShowId, ShowRecord>,
    groups: HashMap<BookingGroupId, BookingGroupRecord>,
    // Confirmed seats per show, the uniqueness backstop's source of truth
    confirmed: HashMap<ShowId, HashSet<SeatId>>,
}

/// Thread-safe in-memory reservation store for testing.
///
/// All tables live behind one lock so multi-row operations (group commits,
/// show-cancel cascades) are atomic under concurrent access.
#[derive(Clone, Default)]
pub struct InMemoryReservationStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryReservationStore {
    /// Create a new empty in-memory reservation store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_start(mut shows: Vec<ShowRecord>) -> Vec<ShowRecord> {
    shows.sort_by_key(|show| (show.slot.start(), show.id));
    shows
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn insert_show(&self, show: ShowRecord) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("RwLock poisoned");

        if inner.shows.contains_key(&show.id) {
            return Err(StoreError::ShowAlreadyExists(show.id));
        }
        inner.shows.insert(show.id, show);
        Ok(())
    }

    async fn show(&self, id: &ShowId) -> StoreResult<Option<ShowRecord>> {
        let inner = self.inner.read().expect("RwLock poisoned");

        Ok(inner.shows.get(id).cloned())
    }

    async fn shows_in_showroom(&self, showroom_id: &ShowroomId) -> StoreResult<Vec<ShowRecord>> {
        let inner = self.inner.read().expect("RwLock poisoned");

        let shows = inner
            .shows
            .values()
            .filter(|show| &show.showroom_id == showroom_id)
            .cloned()
            .collect();
        Ok(sorted_by_start(shows))
    }

    async fn list_shows(&self, filter: &ShowFilter) -> StoreResult<Vec<ShowRecord>> {
        let inner = self.inner.read().expect("RwLock poisoned");

        let shows = inner
            .shows
            .values()
            .filter(|show| filter.matches(show))
            .cloned()
            .collect();
        Ok(sorted_by_start(shows))
    }

    async fn commit_group(&self, group: BookingGroupRecord) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        let StoreInner {
            groups, confirmed, ..
        } = &mut *inner;

        // First, verify the whole group can be stored
        if groups.contains_key(&group.id) {
            return Err(StoreError::GroupAlreadyExists(group.id));
        }
        let taken = confirmed.entry(group.show_id).or_default();
        let mut duplicates: Vec<SeatId> = group
            .bookings
            .iter()
            .filter(|booking| {
                booking.status == BookingStatus::Confirmed && taken.contains(&booking.seat_id)
            })
            .map(|booking| booking.seat_id.clone())
            .collect();
        if !duplicates.is_empty() {
            duplicates.sort();
            return Err(StoreError::DuplicateConfirmed {
                show_id: group.show_id,
                seats: duplicates,
            });
        }

        // All seats free, proceed with the commit
        for booking in &group.bookings {
            if booking.status == BookingStatus::Confirmed {
                taken.insert(booking.seat_id.clone());
            }
        }
        groups.insert(group.id, group);
        Ok(())
    }

    async fn booking_group(&self, id: &BookingGroupId) -> StoreResult<Option<BookingGroupRecord>> {
        let inner = self.inner.read().expect("RwLock poisoned");

        Ok(inner.groups.get(id).cloned())
    }

    async fn confirmed_seats(&self, show_id: &ShowId) -> StoreResult<HashSet<SeatId>> {
        let inner = self.inner.read().expect("RwLock poisoned");

        Ok(inner.confirmed.get(show_id).cloned().unwrap_or_default())
    }

    async fn cancel_group(&self, id: &BookingGroupId) -> StoreResult<Option<GroupCancelOutcome>> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        let StoreInner {
            groups, confirmed, ..
        } = &mut *inner;

        let Some(group) = groups.get_mut(id) else {
            return Ok(None);
        };
        if group.is_cancelled() {
            return Ok(Some(GroupCancelOutcome {
                show_id: group.show_id,
                seats: Vec::new(),
                already_cancelled: true,
            }));
        }

        let mut seats = Vec::with_capacity(group.bookings.len());
        for booking in &mut group.bookings {
            booking.status = BookingStatus::Cancelled;
            seats.push(booking.seat_id.clone());
        }
        if let Some(taken) = confirmed.get_mut(&group.show_id) {
            for seat in &seats {
                taken.remove(seat);
            }
        }
        Ok(Some(GroupCancelOutcome {
            show_id: group.show_id,
            seats,
            already_cancelled: false,
        }))
    }

    async fn cancel_show(&self, id: &ShowId) -> StoreResult<Option<ShowCancelOutcome>> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        let StoreInner {
            shows,
            groups,
            confirmed,
        } = &mut *inner;

        let Some(show) = shows.get_mut(id) else {
            return Ok(None);
        };
        if show.status == ShowStatus::Cancelled {
            return Ok(Some(ShowCancelOutcome {
                already_cancelled: true,
                affected_groups: Vec::new(),
            }));
        }

        // One commit: status flip plus cascade over live groups
        show.status = ShowStatus::Cancelled;
        let mut affected = Vec::new();
        for group in groups.values_mut() {
            if group.show_id == *id && !group.is_cancelled() {
                for booking in &mut group.bookings {
                    booking.status = BookingStatus::Cancelled;
                }
                affected.push(group.id);
            }
        }
        affected.sort();
        confirmed.remove(id);

        Ok(Some(ShowCancelOutcome {
            already_cancelled: false,
            affected_groups: affected,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice::store::BookingRecord;
    use boxoffice::types::{BookingId, Money, TimeSlot, Timestamp};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::new(Utc.timestamp_opt(secs, 0).single().unwrap())
    }

    fn show_record(showroom: &str, start: i64, status: ShowStatus) -> ShowRecord {
        ShowRecord {
            id: ShowId::new(),
            film_id: FilmId::try_new("film-1").unwrap(),
            showroom_id: ShowroomId::try_new(showroom).unwrap(),
            slot: TimeSlot::new(ts(start), ts(start + 7200)).unwrap(),
            base_price: Money::new(dec!(10.00)).unwrap(),
            status,
            created_at: ts(0),
        }
    }

    fn group_record(show_id: ShowId, seats: &[&str]) -> BookingGroupRecord {
        let group_id = BookingGroupId::new();
        let bookings = seats
            .iter()
            .map(|seat| BookingRecord {
                id: BookingId::new(),
                group_id,
                show_id,
                seat_id: SeatId::try_new(*seat).unwrap(),
                status: BookingStatus::Confirmed,
                price_paid: Money::new(dec!(12.50)).unwrap(),
                created_at: ts(0),
            })
            .collect();
        BookingGroupRecord {
            id: group_id,
            show_id,
            bookings,
            created_at: ts(0),
        }
    }

    #[tokio::test]
    async fn test_new_store_is_empty() {
        let store = InMemoryReservationStore::new();
        assert!(store.inner.read().unwrap().shows.is_empty());
        assert!(store.inner.read().unwrap().groups.is_empty());
    }

    #[tokio::test]
    async fn test_clone_shares_storage() {
        let store1 = InMemoryReservationStore::new();
        let store2 = store1.clone();
        assert!(Arc::ptr_eq(&store1.inner, &store2.inner));
    }

    #[tokio::test]
    async fn test_insert_show_rejects_duplicate_id() {
        let store = InMemoryReservationStore::new();
        let show = show_record("room-1", 1000, ShowStatus::Scheduled);

        store.insert_show(show.clone()).await.unwrap();
        let err = store.insert_show(show.clone()).await.unwrap_err();
        assert_eq!(err, StoreError::ShowAlreadyExists(show.id));
    }

    #[tokio::test]
    async fn test_listings_are_ordered_by_start_time() {
        let store = InMemoryReservationStore::new();
        let late = show_record("room-1", 9000, ShowStatus::Scheduled);
        let early = show_record("room-1", 1000, ShowStatus::Scheduled);
        store.insert_show(late.clone()).await.unwrap();
        store.insert_show(early.clone()).await.unwrap();

        let listed = store.list_shows(&ShowFilter::all()).await.unwrap();
        assert_eq!(listed, vec![early, late]);
    }

    #[tokio::test]
    async fn test_commit_group_backstop_rejects_taken_seat() {
        let store = InMemoryReservationStore::new();
        let show = show_record("room-1", 1000, ShowStatus::Scheduled);
        store.insert_show(show.clone()).await.unwrap();

        store
            .commit_group(group_record(show.id, &["a1", "a2"]))
            .await
            .unwrap();

        // Straight to the store, no ledger lock involved
        let err = store
            .commit_group(group_record(show.id, &["a2", "a3"]))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateConfirmed {
                show_id: show.id,
                seats: vec![SeatId::try_new("a2").unwrap()],
            }
        );
    }

    #[tokio::test]
    async fn test_refused_commit_leaves_store_unchanged() {
        let store = InMemoryReservationStore::new();
        let show = show_record("room-1", 1000, ShowStatus::Scheduled);
        store.insert_show(show.clone()).await.unwrap();
        store
            .commit_group(group_record(show.id, &["a1"]))
            .await
            .unwrap();

        let refused = group_record(show.id, &["a1", "a3"]);
        assert!(store.commit_group(refused.clone()).await.is_err());

        // a3 was in the refused group and must not have been taken
        let confirmed = store.confirmed_seats(&show.id).await.unwrap();
        assert!(!confirmed.contains(&SeatId::try_new("a3").unwrap()));
        assert!(store.booking_group(&refused.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_group_releases_seats_then_reports_repeat() {
        let store = InMemoryReservationStore::new();
        let show = show_record("room-1", 1000, ShowStatus::Scheduled);
        store.insert_show(show.clone()).await.unwrap();
        let group = group_record(show.id, &["a1", "a2"]);
        store.commit_group(group.clone()).await.unwrap();

        let first = store.cancel_group(&group.id).await.unwrap().unwrap();
        assert!(!first.already_cancelled);
        assert_eq!(first.seats.len(), 2);
        assert!(store.confirmed_seats(&show.id).await.unwrap().is_empty());

        let second = store.cancel_group(&group.id).await.unwrap().unwrap();
        assert!(second.already_cancelled);
        assert!(second.seats.is_empty());

        assert!(store
            .cancel_group(&BookingGroupId::new())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_cancel_show_cascades_in_one_commit() {
        let store = InMemoryReservationStore::new();
        let show = show_record("room-1", 1000, ShowStatus::Scheduled);
        store.insert_show(show.clone()).await.unwrap();
        let g1 = group_record(show.id, &["a1"]);
        let g2 = group_record(show.id, &["a2"]);
        store.commit_group(g1.clone()).await.unwrap();
        store.commit_group(g2.clone()).await.unwrap();

        let outcome = store.cancel_show(&show.id).await.unwrap().unwrap();
        assert!(!outcome.already_cancelled);
        let mut expected = vec![g1.id, g2.id];
        expected.sort();
        assert_eq!(outcome.affected_groups, expected);

        let stored = store.show(&show.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ShowStatus::Cancelled);
        assert!(store.confirmed_seats(&show.id).await.unwrap().is_empty());
        assert!(store
            .booking_group(&g1.id)
            .await
            .unwrap()
            .unwrap()
            .is_cancelled());

        let repeat = store.cancel_show(&show.id).await.unwrap().unwrap();
        assert!(repeat.already_cancelled);
        assert!(repeat.affected_groups.is_empty());
    }

    #[tokio::test]
    async fn test_catalog_returns_seeded_entities_and_none_for_misses() {
        use boxoffice::catalog::{FilmName, ShowroomName};
        use boxoffice::types::{SeatLabel, SeatType};

        let room_id = ShowroomId::try_new("room-1").unwrap();
        let seat = Seat {
            id: SeatId::try_new("a1").unwrap(),
            showroom_id: room_id.clone(),
            label: SeatLabel::try_new("A1").unwrap(),
            seat_type: SeatType::regular(),
            base_surcharge: Money::zero(),
        };
        let catalog = InMemoryCatalog::new()
            .with_film(Film {
                id: FilmId::try_new("film-1").unwrap(),
                name: FilmName::try_new("Solaris").unwrap(),
                category: "sci-fi".to_string(),
                details: String::new(),
            })
            .with_showroom(
                Showroom::new(room_id.clone(), ShowroomName::try_new("Screen 1").unwrap(), 1, 0),
                vec![seat.clone()],
            );

        let film = catalog
            .film(&FilmId::try_new("film-1").unwrap())
            .await
            .unwrap();
        assert!(film.is_some());
        assert_eq!(catalog.seats(&room_id).await.unwrap(), vec![seat]);

        assert!(catalog
            .film(&FilmId::try_new("missing").unwrap())
            .await
            .unwrap()
            .is_none());
        assert!(catalog
            .seats(&ShowroomId::try_new("missing").unwrap())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_catalog_outage_fails_every_call_until_restored() {
        let catalog = InMemoryCatalog::new();
        catalog.set_unavailable("maintenance window");

        let err = catalog
            .film(&FilmId::try_new("film-1").unwrap())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::Unavailable {
                reason: "maintenance window".to_string()
            }
        );

        catalog.set_available();
        assert!(catalog
            .film(&FilmId::try_new("film-1").unwrap())
            .await
            .unwrap()
            .is_none());
    }
}
