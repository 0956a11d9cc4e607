//! Error types for the `boxoffice` reservation core.
//!
//! One error enum per subsystem, convertible upward toward the booking
//! service, which aggregates but never invents new failure kinds:
//!
//! - [`CatalogError`]: the external catalog collaborator failed
//! - [`StoreError`]: the persistence port failed or refused a commit
//! - [`ScheduleError`]: show creation, listing and lookup failures
//! - [`PricingError`]: premium-table and amount computation failures
//! - [`LedgerError`]: seat reservation and cancellation failures
//! - [`BookingError`]: any of the above, surfaced by the booking service
//!
//! Every error classifies itself into the five-way [`ErrorKind`] taxonomy so
//! callers can decide mechanically whether to retry, re-offer seats, or give
//! up.

use thiserror::Error;

use crate::types::{
    BookingGroupId, FilmId, MoneyError, SeatId, SeatType, ShowId, ShowroomId, TimeSlotError,
    Timestamp,
};

/// Coarse classification of every failure the core can produce.
///
/// `Busy` is the only kind callers should retry automatically (see
/// [`crate::retry::retry_on_busy`]); `CatalogUnavailable` may be retried
/// with backoff at the caller's discretion; everything else needs a
/// different request or is a configuration fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An id (film, showroom, seat, show, booking group) is unknown.
    NotFound,
    /// The request lost to existing state: schedule overlap or seats
    /// already sold. Carries the conflicting ids on the concrete error.
    Conflict,
    /// A partition lock could not be acquired within the configured bound.
    /// The system is congested; nothing about the request is wrong.
    Busy,
    /// The request itself is malformed: empty interval, duplicate seats,
    /// unknown seat type.
    InvalidInput,
    /// A consumed collaborator (catalog or persistence) failed.
    CatalogUnavailable,
}

impl ErrorKind {
    /// Whether an automatic retry of the same request is appropriate.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotFound => "not-found",
            Self::Conflict => "conflict",
            Self::Busy => "busy",
            Self::InvalidInput => "invalid-input",
            Self::CatalogUnavailable => "catalog-unavailable",
        };
        f.write_str(name)
    }
}

/// Classification into the [`ErrorKind`] taxonomy.
///
/// Implemented by every error enum in this crate; the retry helper is
/// generic over it.
pub trait Classify {
    /// The taxonomy kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// Failures of the external catalog collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The catalog could not be reached or answered with a failure.
    #[error("Catalog unavailable: {reason}")]
    Unavailable {
        /// Human-readable cause reported by the adapter.
        reason: String,
    },
}

impl Classify for CatalogError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable { .. } => ErrorKind::CatalogUnavailable,
        }
    }
}

/// Failures of the persistence port.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A show with this id is already stored.
    #[error("Show '{0}' already exists")]
    ShowAlreadyExists(ShowId),

    /// A booking group with this id is already stored.
    #[error("Booking group '{0}' already exists")]
    GroupAlreadyExists(BookingGroupId),

    /// The uniqueness backstop refused a commit that would have created a
    /// second confirmed booking for one of these seats.
    #[error("Seats already confirmed for show '{show_id}': {seats:?}")]
    DuplicateConfirmed {
        /// The show the commit targeted.
        show_id: ShowId,
        /// The seats that are already confirmed.
        seats: Vec<SeatId>,
    },

    /// The storage backend could not be reached or answered with a failure.
    #[error("Storage unavailable: {reason}")]
    Unavailable {
        /// Human-readable cause reported by the adapter.
        reason: String,
    },
}

impl Classify for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::ShowAlreadyExists(_) | Self::GroupAlreadyExists(_) => ErrorKind::Conflict,
            Self::DuplicateConfirmed { .. } => ErrorKind::Conflict,
            Self::Unavailable { .. } => ErrorKind::CatalogUnavailable,
        }
    }
}

/// Failures raised by the schedule planner.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// The film id is not in the catalog.
    #[error("Film not found: {0}")]
    FilmNotFound(FilmId),

    /// The showroom id is not in the catalog.
    #[error("Showroom not found: {0}")]
    ShowroomNotFound(ShowroomId),

    /// The show id is unknown.
    #[error("Show not found: {0}")]
    ShowNotFound(ShowId),

    /// The requested interval is empty or inverted.
    #[error("Invalid interval: start {start} is not before end {end}")]
    InvalidInterval {
        /// The requested start.
        start: Timestamp,
        /// The requested end.
        end: Timestamp,
    },

    /// The requested interval overlaps existing shows in the same showroom.
    #[error("Schedule conflict in showroom '{showroom_id}' with shows: {conflicting:?}")]
    Overlap {
        /// The showroom whose schedule was contended.
        showroom_id: ShowroomId,
        /// Every existing show whose interval intersects the request.
        conflicting: Vec<ShowId>,
    },

    /// The showroom's schedule lock could not be acquired in time.
    #[error("Showroom '{showroom_id}' is busy: lock not acquired within {timeout_ms}ms")]
    Busy {
        /// The contended showroom.
        showroom_id: ShowroomId,
        /// The bound that expired.
        timeout_ms: u64,
    },

    /// The catalog collaborator failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The persistence port failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<TimeSlotError> for ScheduleError {
    fn from(err: TimeSlotError) -> Self {
        match err {
            TimeSlotError::Empty { start, end } => Self::InvalidInterval { start, end },
        }
    }
}

impl Classify for ScheduleError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::FilmNotFound(_) | Self::ShowroomNotFound(_) | Self::ShowNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidInterval { .. } => ErrorKind::InvalidInput,
            Self::Overlap { .. } => ErrorKind::Conflict,
            Self::Busy { .. } => ErrorKind::Busy,
            Self::Catalog(err) => err.kind(),
            Self::Store(err) => err.kind(),
        }
    }
}

/// Failures raised by the pricing engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PricingError {
    /// The seat's type has no premium configured. A catalog/configuration
    /// consistency fault, never transient.
    #[error("No premium configured for seat type '{seat_type}'")]
    UnknownSeatType {
        /// The unconfigured seat type.
        seat_type: SeatType,
    },

    /// The computed amount violated the money invariants.
    #[error("Computed price is not a valid amount: {0}")]
    InvalidAmount(#[from] MoneyError),
}

impl Classify for PricingError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownSeatType { .. } | Self::InvalidAmount(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Failures raised by the reservation ledger.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The show id is unknown, or the show has been cancelled. Cancelled
    /// shows are deliberately indistinguishable from unknown ones here:
    /// neither sells seats.
    #[error("Show not found: {0}")]
    ShowNotFound(ShowId),

    /// Requested seats do not belong to the show's showroom.
    #[error("Seats not in showroom '{showroom_id}': {seats:?}")]
    SeatNotInShowroom {
        /// The show's showroom.
        showroom_id: ShowroomId,
        /// The foreign seat ids, sorted.
        seats: Vec<SeatId>,
    },

    /// Requested seats are already confirmed for this show. Carries exactly
    /// the conflicting subset so the caller can re-offer alternatives.
    #[error("Seats unavailable for show '{show_id}': {seats:?}")]
    SeatUnavailable {
        /// The contended show.
        show_id: ShowId,
        /// The already-sold seats, sorted.
        seats: Vec<SeatId>,
    },

    /// The same seat id appeared more than once in one reserve call.
    #[error("Duplicate seat ids in request: {seats:?}")]
    DuplicateSeatInRequest {
        /// The repeated seat ids, sorted.
        seats: Vec<SeatId>,
    },

    /// A reserve call must name at least one seat.
    #[error("Reserve called with an empty seat set")]
    EmptySeatRequest,

    /// The booking group id is unknown.
    #[error("Booking group not found: {0}")]
    GroupNotFound(BookingGroupId),

    /// The show was already cancelled by an earlier call.
    #[error("Show '{0}' is already cancelled")]
    ShowAlreadyCancelled(ShowId),

    /// The show's partition lock could not be acquired in time.
    #[error("Show '{show_id}' is busy: lock not acquired within {timeout_ms}ms")]
    Busy {
        /// The contended show.
        show_id: ShowId,
        /// The bound that expired.
        timeout_ms: u64,
    },

    /// The catalog collaborator failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The persistence port failed.
    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            // The store's uniqueness backstop and the ledger's own conflict
            // check report the same fact; surface one error shape for both.
            StoreError::DuplicateConfirmed { show_id, seats } => {
                Self::SeatUnavailable { show_id, seats }
            }
            other => Self::Store(other),
        }
    }
}

impl Classify for LedgerError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::ShowNotFound(_) | Self::GroupNotFound(_) | Self::SeatNotInShowroom { .. } => {
                ErrorKind::NotFound
            }
            Self::SeatUnavailable { .. } | Self::ShowAlreadyCancelled(_) => ErrorKind::Conflict,
            Self::DuplicateSeatInRequest { .. } | Self::EmptySeatRequest => ErrorKind::InvalidInput,
            Self::Busy { .. } => ErrorKind::Busy,
            Self::Catalog(err) => err.kind(),
            Self::Store(err) => err.kind(),
        }
    }
}

/// Failures surfaced by the booking service.
///
/// The service aggregates component errors without adding kinds of its own.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BookingError {
    /// A schedule planner failure.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// A pricing engine failure.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A reservation ledger failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl Classify for BookingError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Schedule(err) => err.kind(),
            Self::Pricing(err) => err.kind(),
            Self::Ledger(err) => err.kind(),
        }
    }
}

/// Type alias for catalog results.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Type alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;

/// Type alias for schedule planner results.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Type alias for pricing engine results.
pub type PricingResult<T> = Result<T, PricingError>;

/// Type alias for reservation ledger results.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Type alias for booking service results.
pub type BookingResult<T> = Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(id: &str) -> SeatId {
        SeatId::try_new(id).unwrap()
    }

    #[test]
    fn ledger_error_messages_are_descriptive() {
        let show_id = ShowId::new();
        let err = LedgerError::ShowNotFound(show_id);
        assert_eq!(err.to_string(), format!("Show not found: {show_id}"));

        let err = LedgerError::SeatUnavailable {
            show_id,
            seats: vec![seat("s-1"), seat("s-2")],
        };
        assert!(err.to_string().contains("Seats unavailable"));
        assert!(err.to_string().contains("s-1"));

        let err = LedgerError::Busy {
            show_id,
            timeout_ms: 250,
        };
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn schedule_error_messages_are_descriptive() {
        let room = ShowroomId::try_new("room-1").unwrap();
        let err = ScheduleError::Overlap {
            showroom_id: room,
            conflicting: vec![ShowId::new()],
        };
        assert!(err.to_string().contains("Schedule conflict"));
        assert!(err.to_string().contains("room-1"));

        let err = ScheduleError::FilmNotFound(FilmId::try_new("ghost").unwrap());
        assert_eq!(err.to_string(), "Film not found: ghost");
    }

    #[test]
    fn pricing_error_names_the_seat_type() {
        let err = PricingError::UnknownSeatType {
            seat_type: SeatType::try_new("recliner").unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "No premium configured for seat type 'recliner'"
        );
    }

    #[test]
    fn store_duplicate_maps_to_seat_unavailable() {
        let show_id = ShowId::new();
        let store_err = StoreError::DuplicateConfirmed {
            show_id,
            seats: vec![seat("a")],
        };
        let ledger_err: LedgerError = store_err.into();
        assert!(matches!(
            ledger_err,
            LedgerError::SeatUnavailable { seats, .. } if seats == vec![seat("a")]
        ));
    }

    #[test]
    fn store_unavailable_stays_a_store_error() {
        let store_err = StoreError::Unavailable {
            reason: "disk on fire".to_string(),
        };
        let ledger_err: LedgerError = store_err.into();
        assert!(matches!(ledger_err, LedgerError::Store(_)));
        assert_eq!(ledger_err.kind(), ErrorKind::CatalogUnavailable);
    }

    #[test]
    fn kinds_follow_the_taxonomy() {
        let show_id = ShowId::new();
        assert_eq!(
            LedgerError::ShowNotFound(show_id).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            LedgerError::SeatUnavailable {
                show_id,
                seats: vec![]
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(LedgerError::EmptySeatRequest.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            LedgerError::Busy {
                show_id,
                timeout_ms: 1
            }
            .kind(),
            ErrorKind::Busy
        );
        assert_eq!(
            ScheduleError::Catalog(CatalogError::Unavailable {
                reason: "down".to_string()
            })
            .kind(),
            ErrorKind::CatalogUnavailable
        );
    }

    #[test]
    fn only_busy_is_auto_retryable() {
        assert!(ErrorKind::Busy.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
        assert!(!ErrorKind::Conflict.is_retryable());
        assert!(!ErrorKind::InvalidInput.is_retryable());
        assert!(!ErrorKind::CatalogUnavailable.is_retryable());
    }

    #[test]
    fn booking_error_is_transparent_over_components() {
        let inner = LedgerError::EmptySeatRequest;
        let outer: BookingError = inner.clone().into();
        assert_eq!(outer.to_string(), inner.to_string());
        assert_eq!(outer.kind(), inner.kind());
    }
}
