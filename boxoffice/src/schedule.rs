//! Show registration, listing and lookup.
//!
//! The planner owns the show lifecycle up to cancellation (which runs
//! through the reservation ledger so it can coordinate with outstanding
//! bookings). Its one hard invariant: within a showroom, no two scheduled
//! shows overlap. The check-and-insert runs under the showroom's partition
//! lock, so two concurrent overlapping requests cannot both pass the check.

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::CatalogStore;
use crate::config::ContentionConfig;
use crate::errors::{ScheduleError, ScheduleResult};
use crate::locks::PartitionLocks;
use crate::store::{ReservationStore, ShowFilter, ShowRecord, ShowStatus};
use crate::types::{FilmId, Money, ShowId, ShowroomId, TimeSlot, Timestamp};

/// Validates and registers shows against the catalog and the existing
/// schedule.
pub struct SchedulePlanner<C, S> {
    catalog: Arc<C>,
    store: Arc<S>,
    locks: PartitionLocks<ShowroomId>,
    config: ContentionConfig,
}

impl<C, S> SchedulePlanner<C, S>
where
    C: CatalogStore,
    S: ReservationStore,
{
    /// Builds a planner over the injected catalog and store.
    pub fn new(catalog: Arc<C>, store: Arc<S>, config: ContentionConfig) -> Self {
        Self {
            catalog,
            store,
            locks: PartitionLocks::new(),
            config,
        }
    }

    /// Registers a new show.
    ///
    /// Validates that the interval is non-empty, that film and showroom
    /// exist, and that the interval does not overlap any scheduled show in
    /// the same showroom. Overlap uses half-open intersection, so a show
    /// may start exactly when the previous one ends. Cancelled shows no
    /// longer block their slot.
    ///
    /// Two concurrent calls with overlapping intervals on one showroom
    /// never both succeed; the loser either sees the winner's show in its
    /// conflict check or fails as busy if the lock wait exceeds the
    /// configured bound.
    pub async fn create_show(
        &self,
        film_id: FilmId,
        showroom_id: ShowroomId,
        start: Timestamp,
        end: Timestamp,
        base_price: Money,
    ) -> ScheduleResult<ShowId> {
        let slot = TimeSlot::new(start, end)?;

        if self.catalog.film(&film_id).await?.is_none() {
            return Err(ScheduleError::FilmNotFound(film_id));
        }
        if self.catalog.showroom(&showroom_id).await?.is_none() {
            return Err(ScheduleError::ShowroomNotFound(showroom_id));
        }

        let bound = self.config.lock_timeout();
        let _guard = self
            .locks
            .acquire(&showroom_id, bound.as_duration())
            .await
            .map_err(|_| ScheduleError::Busy {
                showroom_id: showroom_id.clone(),
                timeout_ms: bound.as_millis(),
            })?;

        let existing = self.store.shows_in_showroom(&showroom_id).await?;
        let conflicting: Vec<ShowId> = existing
            .iter()
            .filter(|other| other.status == ShowStatus::Scheduled && other.slot.overlaps(&slot))
            .map(|other| other.id)
            .collect();
        if !conflicting.is_empty() {
            debug!(
                showroom = %showroom_id,
                conflicts = conflicting.len(),
                "show rejected: schedule overlap"
            );
            return Err(ScheduleError::Overlap {
                showroom_id,
                conflicting,
            });
        }

        let show = ShowRecord {
            id: ShowId::new(),
            film_id,
            showroom_id,
            slot,
            base_price,
            status: ShowStatus::Scheduled,
            created_at: Timestamp::now(),
        };
        self.store.insert_show(show.clone()).await?;

        info!(
            show = %show.id,
            film = %show.film_id,
            showroom = %show.showroom_id,
            start = %show.slot.start(),
            "show scheduled"
        );
        Ok(show.id)
    }

    /// Shows passing the filter, ordered by start time. Cancelled shows
    /// are excluded unless the filter says otherwise.
    pub async fn list_shows(&self, filter: &ShowFilter) -> ScheduleResult<Vec<ShowRecord>> {
        Ok(self.store.list_shows(filter).await?)
    }

    /// Fetches one show by id, regardless of status.
    pub async fn get_show(&self, show_id: &ShowId) -> ScheduleResult<ShowRecord> {
        self.store
            .show(show_id)
            .await?
            .ok_or(ScheduleError::ShowNotFound(*show_id))
    }
}
