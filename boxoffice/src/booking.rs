//! The booking service: the user-facing orchestration layer.
//!
//! Composes the schedule planner, the pricing engine and the reservation
//! ledger into the operations a box-office front end actually calls. The
//! service computes prices and shapes responses; every seat-state decision
//! is delegated to the ledger, and no new error kinds are introduced here.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{CatalogStore, Seat};
use crate::config::ContentionConfig;
use crate::errors::{BookingResult, LedgerError, PricingError};
use crate::ledger::{
    CancelOutcome, CancelledShow, ReservationLedger, SeatCharge, SeatStatus, ShowAvailability,
};
use crate::pricing::PricingEngine;
use crate::schedule::SchedulePlanner;
use crate::store::{ReservationStore, ShowFilter, ShowRecord};
use crate::types::{
    BookingGroupId, FilmId, Money, SeatId, SeatLabel, SeatType, ShowId, Timestamp,
};

/// Filters for listing shows.
///
/// All criteria are optional and combine conjunctively. Time bounds apply
/// to the show's start, half-open: `from <= start < to`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowQuery {
    film_id: Option<FilmId>,
    from: Option<Timestamp>,
    to: Option<Timestamp>,
    hide_sold_out: bool,
}

impl ShowQuery {
    /// Every scheduled show.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to shows of one film.
    #[must_use]
    pub fn with_film(mut self, film_id: FilmId) -> Self {
        self.film_id = Some(film_id);
        self
    }

    /// Keeps shows starting at or after this instant.
    #[must_use]
    pub const fn with_from(mut self, from: Timestamp) -> Self {
        self.from = Some(from);
        self
    }

    /// Keeps shows starting strictly before this instant.
    #[must_use]
    pub const fn with_to(mut self, to: Timestamp) -> Self {
        self.to = Some(to);
        self
    }

    /// Drops shows with no seat left to sell.
    #[must_use]
    pub const fn hide_sold_out(mut self) -> Self {
        self.hide_sold_out = true;
        self
    }

    /// The store-level filter for this query. Cancelled shows are never
    /// listed to the public.
    fn store_filter(&self) -> ShowFilter {
        let mut filter = ShowFilter::all();
        if let Some(film_id) = &self.film_id {
            filter = filter.with_film(film_id.clone());
        }
        if let Some(from) = self.from {
            filter = filter.with_from(from);
        }
        if let Some(to) = self.to {
            filter = filter.with_to(to);
        }
        filter
    }
}

/// One show in a listing, with its seat counts at the snapshot instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowListing {
    /// The show.
    pub show: ShowRecord,
    /// Total seats in the show's showroom.
    pub seats_total: usize,
    /// Seats still sellable.
    pub seats_available: usize,
}

impl ShowListing {
    /// Whether every seat is taken.
    pub const fn is_sold_out(&self) -> bool {
        self.seats_available == 0
    }
}

/// One seat in a seat map: sellable with a price, or already taken.
///
/// Booked seats carry no price; what the current holder paid is their
/// business, and the next price may differ anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatOffer {
    /// The seat can be bought at this price.
    Available {
        /// The seat.
        seat: Seat,
        /// The price a booking made now would pay.
        price: Money,
    },
    /// A confirmed booking holds the seat.
    Booked {
        /// The seat.
        seat: Seat,
    },
}

impl SeatOffer {
    /// The seat this offer describes.
    pub const fn seat(&self) -> &Seat {
        match self {
            Self::Available { seat, .. } | Self::Booked { seat } => seat,
        }
    }

    /// The offered price, if the seat is sellable.
    pub const fn price(&self) -> Option<Money> {
        match self {
            Self::Available { price, .. } => Some(*price),
            Self::Booked { .. } => None,
        }
    }
}

/// A show's full seat map with per-seat prices, derived on every read.
///
/// Seats appear in catalog order. Prices reflect the show's base price and
/// the seat premiums at the snapshot instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatMap {
    /// The show the map describes.
    pub show: ShowRecord,
    /// Every seat of the showroom as an offer.
    pub offers: Vec<SeatOffer>,
}

/// One sold seat on a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedSeat {
    /// The seat's catalog id.
    pub seat_id: SeatId,
    /// The human-facing seat label.
    pub label: SeatLabel,
    /// The seat's tier.
    pub seat_type: SeatType,
    /// The price charged for this seat.
    pub price: Money,
}

/// The customer-facing record of a successful booking.
///
/// Prices on the receipt are exactly the prices stamped onto the booking
/// rows; later changes to the show's base price never alter them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReceipt {
    /// Handle for cancelling the whole purchase.
    pub group_id: BookingGroupId,
    /// The show the seats were bought for.
    pub show_id: ShowId,
    /// The sold seats, in request order.
    pub seats: Vec<PricedSeat>,
    /// Sum of the per-seat prices.
    pub total: Money,
    /// When the booking was confirmed.
    pub created_at: Timestamp,
}

/// Orchestrates scheduling, pricing and reservation behind one API.
pub struct BookingService<C, S> {
    planner: SchedulePlanner<C, S>,
    pricing: PricingEngine,
    ledger: ReservationLedger<C, S>,
}

impl<C, S> BookingService<C, S>
where
    C: CatalogStore,
    S: ReservationStore,
{
    /// Wires the service over the injected catalog and store.
    pub fn new(
        catalog: Arc<C>,
        store: Arc<S>,
        pricing: PricingEngine,
        config: ContentionConfig,
    ) -> Self {
        Self {
            planner: SchedulePlanner::new(Arc::clone(&catalog), Arc::clone(&store), config),
            pricing,
            ledger: ReservationLedger::new(catalog, store, config),
        }
    }

    /// The schedule planner, for owner-facing show management.
    pub const fn planner(&self) -> &SchedulePlanner<C, S> {
        &self.planner
    }

    /// Lists scheduled shows matching the query, ordered by start time,
    /// each with its current seat counts.
    pub async fn list_shows(&self, query: &ShowQuery) -> BookingResult<Vec<ShowListing>> {
        let shows = self.planner.list_shows(&query.store_filter()).await?;

        let mut listings = Vec::with_capacity(shows.len());
        for show in shows {
            // A show cancelled between the listing and the count simply
            // drops out, like any other cancelled show.
            let availability = match self.ledger.availability(&show.id).await {
                Ok(availability) => availability,
                Err(LedgerError::ShowNotFound(_)) => continue,
                Err(error) => return Err(error.into()),
            };
            let listing = ShowListing {
                seats_total: availability.seats_total(),
                seats_available: availability.seats_available(),
                show,
            };
            if query.hide_sold_out && listing.is_sold_out() {
                continue;
            }
            listings.push(listing);
        }

        debug!(shows = listings.len(), "listed shows");
        Ok(listings)
    }

    /// The priced seat map for a show.
    pub async fn seat_map(&self, show_id: &ShowId) -> BookingResult<SeatMap> {
        let ShowAvailability { show, seats } = self.ledger.availability(show_id).await?;

        let mut offers = Vec::with_capacity(seats.len());
        for entry in seats {
            let offer = match entry.status {
                SeatStatus::Available => {
                    let price = self.pricing.price_for(&show, &entry.seat)?;
                    SeatOffer::Available {
                        seat: entry.seat,
                        price,
                    }
                }
                SeatStatus::Booked => SeatOffer::Booked { seat: entry.seat },
            };
            offers.push(offer);
        }

        Ok(SeatMap { show, offers })
    }

    /// Books the requested seats for a show, all or nothing.
    ///
    /// Prices are computed here, from the show's base price and the seat
    /// premiums in force right now, and stamped onto the booking rows by
    /// the ledger. On a seat conflict the error names exactly the seats
    /// that were already sold.
    pub async fn book(
        &self,
        show_id: &ShowId,
        seat_ids: &[SeatId],
    ) -> BookingResult<BookingReceipt> {
        let ShowAvailability { show, seats } = self.ledger.availability(show_id).await?;
        let by_id: HashMap<&SeatId, &Seat> = seats
            .iter()
            .map(|entry| (&entry.seat.id, &entry.seat))
            .collect();

        let mut unknown: Vec<SeatId> = Vec::new();
        let mut charges = Vec::with_capacity(seat_ids.len());
        let mut priced = Vec::with_capacity(seat_ids.len());
        let mut total = Money::zero();
        for seat_id in seat_ids {
            match by_id.get(seat_id) {
                Some(seat) => {
                    let price = self.pricing.price_for(&show, seat)?;
                    charges.push(SeatCharge {
                        seat_id: seat_id.clone(),
                        price,
                    });
                    priced.push(PricedSeat {
                        seat_id: seat_id.clone(),
                        label: seat.label.clone(),
                        seat_type: seat.seat_type.clone(),
                        price,
                    });
                    total = total.add(&price).map_err(PricingError::from)?;
                }
                None => unknown.push(seat_id.clone()),
            }
        }
        if !unknown.is_empty() {
            unknown.sort();
            unknown.dedup();
            return Err(LedgerError::SeatNotInShowroom {
                showroom_id: show.showroom_id,
                seats: unknown,
            }
            .into());
        }

        // The ledger re-validates everything under the show's critical
        // section; the pricing pass above worked on an unlocked snapshot.
        let group = self.ledger.reserve(show_id, charges).await?;

        let receipt = BookingReceipt {
            group_id: group.id,
            show_id: *show_id,
            seats: priced,
            total,
            created_at: group.created_at,
        };
        info!(group = %receipt.group_id, total = %receipt.total, "booking receipt issued");
        Ok(receipt)
    }

    /// Cancels a booking group, releasing its seats. Idempotent.
    pub async fn cancel_booking(&self, group_id: &BookingGroupId) -> BookingResult<CancelOutcome> {
        Ok(self.ledger.cancel_group(group_id).await?)
    }

    /// Cancels a show, cascading over its confirmed bookings, and reports
    /// the affected booking groups for downstream refund handling.
    pub async fn cancel_show(&self, show_id: &ShowId) -> BookingResult<CancelledShow> {
        Ok(self.ledger.cancel_show(show_id).await?)
    }
}
