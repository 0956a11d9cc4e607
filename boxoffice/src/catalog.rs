//! Read-only boundary to the external film/showroom catalog.
//!
//! The core never mutates catalog data. Films, showrooms and seat layouts
//! are fetched through the [`CatalogStore`] port, which every component
//! receives at construction (no ambient globals). Seats are created with
//! their showroom and are immutable afterwards; changing a layout means
//! introducing a new showroom, not editing seats under active shows.

use async_trait::async_trait;
use nutype::nutype;
use serde::{Deserialize, Serialize};

use crate::errors::CatalogResult;
use crate::types::{FilmId, Money, SeatId, SeatLabel, SeatType, ShowroomId};

/// Film title as displayed to moviegoers.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct FilmName(String);

/// Showroom name, e.g. `"Screen 1"`.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 100),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct ShowroomName(String);

/// A film in the catalog.
///
/// Immutable once a show references it; edits on the catalog side are
/// expected to produce a new film id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    /// Catalog identifier.
    pub id: FilmId,
    /// Display title.
    pub name: FilmName,
    /// Genre or marketing category; free text from the catalog.
    pub category: String,
    /// Free-text synopsis or notes.
    pub details: String,
}

/// A showroom with its fixed seat counts.
///
/// The seat-count invariant (`standard + vip = total`) holds by
/// construction: the total is derived, never stored separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Showroom {
    id: ShowroomId,
    name: ShowroomName,
    standard_seats: u32,
    vip_seats: u32,
}

impl Showroom {
    /// Builds a showroom from its per-tier seat counts.
    pub const fn new(
        id: ShowroomId,
        name: ShowroomName,
        standard_seats: u32,
        vip_seats: u32,
    ) -> Self {
        Self {
            id,
            name,
            standard_seats,
            vip_seats,
        }
    }

    /// Catalog identifier.
    pub const fn id(&self) -> &ShowroomId {
        &self.id
    }

    /// Display name.
    pub const fn name(&self) -> &ShowroomName {
        &self.name
    }

    /// Number of standard-tier seats.
    pub const fn standard_seats(&self) -> u32 {
        self.standard_seats
    }

    /// Number of VIP-tier seats.
    pub const fn vip_seats(&self) -> u32 {
        self.vip_seats
    }

    /// Total capacity; always `standard_seats + vip_seats`.
    pub const fn total_seats(&self) -> u32 {
        self.standard_seats + self.vip_seats
    }
}

/// A fixed physical seat in a showroom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Catalog identifier.
    pub id: SeatId,
    /// The showroom this seat belongs to.
    pub showroom_id: ShowroomId,
    /// Ticket-facing label, e.g. `"A1"`.
    pub label: SeatLabel,
    /// Tier used for premium lookup.
    pub seat_type: SeatType,
    /// Flat per-seat surcharge added on top of the premium-adjusted base
    /// price. Zero for most seats.
    pub base_surcharge: Money,
}

/// The read-only catalog port consumed by the core.
///
/// Adapters decide where the data lives (another service, a database, a
/// fixture). Lookup misses are `Ok(None)` / empty collections; only genuine
/// collaborator failures surface as [`crate::errors::CatalogError`].
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetches a film by id. `None` when the id is unknown.
    async fn film(&self, id: &FilmId) -> CatalogResult<Option<Film>>;

    /// Fetches a showroom by id. `None` when the id is unknown.
    async fn showroom(&self, id: &ShowroomId) -> CatalogResult<Option<Showroom>>;

    /// All seats of a showroom, in the catalog's display order (typically
    /// label order). Empty for an unknown showroom.
    async fn seats(&self, showroom_id: &ShowroomId) -> CatalogResult<Vec<Seat>>;
}
