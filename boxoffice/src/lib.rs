//! `Boxoffice` - Seat reservation and show scheduling core for a
//! single-cinema box office.
//!
//! This library decides, under concurrent demand, which seats of which
//! show are sold, at what price, without double-selling a seat or
//! double-booking a showroom. Catalog data (films, showrooms, seat
//! layouts) is consumed read-only through an injected port; booking
//! decisions and priced seat maps come out.
//!
//! # Overview
//!
//! - [`catalog`] - read-only port to the external film/showroom/seat
//!   catalog
//! - [`schedule`] - registers shows and rejects overlapping time slots
//!   per showroom
//! - [`pricing`] - derives per-seat prices from a show's base price and
//!   seat-type premiums
//! - [`ledger`] - the seat-allocation core: grants or denies bookings
//!   atomically, per show
//! - [`booking`] - the orchestration layer serving listings, seat maps,
//!   purchases and cancellations
//! - [`store`] - persistence port for show and booking records
//!
//! # Concurrency model
//!
//! Mutations are partitioned: each show (for reservations) and each
//! showroom (for scheduling) has its own lazily-created critical section,
//! so independent resources never contend. Within one show, reserve and
//! cancel are linearizable; two concurrent attempts at the same seat
//! resolve to exactly one winner. Lock waits are bounded and expire as a
//! retryable `Busy` error, the only kind callers should retry
//! automatically (see [`retry`]).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod booking;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod ledger;
pub mod locks;
pub mod pricing;
pub mod retry;
pub mod schedule;
pub mod store;
pub mod types;
