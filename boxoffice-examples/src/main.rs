//! Box-office demo application
//!
//! This example walks one evening at a small cinema through the core:
//! - Scheduling shows, including an overlap rejection
//! - Priced seat maps
//! - Atomic group booking with a receipt
//! - Double-booking rejection naming the contested seats
//! - Cancellation, re-booking, and a show-cancel cascade

use std::sync::Arc;

use anyhow::Result;
use boxoffice::booking::{BookingService, ShowQuery};
use boxoffice::catalog::{Film, FilmName, Seat, Showroom, ShowroomName};
use boxoffice::config::{ContentionConfig, RetryConfig};
use boxoffice::ledger::CancelOutcome;
use boxoffice::pricing::PricingEngine;
use boxoffice::retry::retry_on_busy;
use boxoffice::types::{FilmId, Money, SeatId, SeatLabel, SeatType, ShowroomId, Timestamp};
use boxoffice_memory::{InMemoryCatalog, InMemoryReservationStore};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn seat(room: &ShowroomId, label: &str, tier: SeatType, surcharge: Money) -> Result<Seat> {
    Ok(Seat {
        id: SeatId::try_new(label.to_lowercase())?,
        showroom_id: room.clone(),
        label: SeatLabel::try_new(label)?,
        seat_type: tier,
        base_surcharge: surcharge,
    })
}

/// Two films and one ten-seat screen: two rows of four, plus a VIP pair
/// with a small surcharge.
fn seed_catalog(screen: &ShowroomId) -> Result<InMemoryCatalog> {
    let mut seats = Vec::new();
    for row in ["A", "B"] {
        for number in 1..=4 {
            seats.push(seat(
                screen,
                &format!("{row}{number}"),
                SeatType::regular(),
                Money::zero(),
            )?);
        }
    }
    for number in 1..=2 {
        seats.push(seat(
            screen,
            &format!("V{number}"),
            SeatType::vip(),
            Money::new(dec!(1.50))?,
        )?);
    }

    Ok(InMemoryCatalog::new()
        .with_film(Film {
            id: FilmId::try_new("solaris-1972")?,
            name: FilmName::try_new("Solaris")?,
            category: "Science Fiction".to_string(),
            details: "1972, dir. Andrei Tarkovsky".to_string(),
        })
        .with_film(Film {
            id: FilmId::try_new("stalker-1979")?,
            name: FilmName::try_new("Stalker")?,
            category: "Science Fiction".to_string(),
            details: "1979, dir. Andrei Tarkovsky".to_string(),
        })
        .with_showroom(
            Showroom::new(screen.clone(), ShowroomName::try_new("Screen One")?, 8, 2),
            seats,
        ))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting box-office demo");

    let screen = ShowroomId::try_new("screen-1")?;
    let catalog = Arc::new(seed_catalog(&screen)?);
    let store = Arc::new(InMemoryReservationStore::new());
    let service = BookingService::new(
        catalog,
        store,
        PricingEngine::default(),
        ContentionConfig::default(),
    );

    // Tonight's programme: two screenings, back to back
    let doors = Timestamp::new(Utc::now() + Duration::hours(1));
    let changeover = Timestamp::new(Utc::now() + Duration::hours(4));
    let close = Timestamp::new(Utc::now() + Duration::hours(7));

    info!("Scheduling Solaris and Stalker on Screen One");
    let solaris = service
        .planner()
        .create_show(
            FilmId::try_new("solaris-1972")?,
            screen.clone(),
            doors,
            changeover,
            Money::new(dec!(9.50))?,
        )
        .await?;
    let stalker = service
        .planner()
        .create_show(
            FilmId::try_new("stalker-1979")?,
            screen.clone(),
            changeover,
            close,
            Money::new(dec!(11.00))?,
        )
        .await?;

    // A slot in the middle of Solaris must be refused
    info!("Attempting an overlapping screening");
    let mid_solaris = Timestamp::new(Utc::now() + Duration::hours(2));
    match service
        .planner()
        .create_show(
            FilmId::try_new("stalker-1979")?,
            screen.clone(),
            mid_solaris,
            close,
            Money::new(dec!(11.00))?,
        )
        .await
    {
        Ok(_) => panic!("Overlapping show should have been rejected"),
        Err(e) => info!("Overlap correctly rejected: {e}"),
    }

    info!("Tonight's listings:");
    for listing in service.list_shows(&ShowQuery::all()).await? {
        info!(
            "  {} at {} - {} of {} seats free",
            listing.show.film_id,
            listing.show.slot.start(),
            listing.seats_available,
            listing.seats_total
        );
    }

    info!("Seat map for Solaris:");
    let map = service.seat_map(&solaris).await?;
    for offer in &map.offers {
        match offer.price() {
            Some(price) => info!("  {} ({}): {}", offer.seat().label, offer.seat().seat_type, price),
            None => info!("  {}: taken", offer.seat().label),
        }
    }

    // Book three seats in one atomic purchase; retry only if contended
    info!("Booking A1, A2 and V1 for Solaris");
    let family_seats = [
        SeatId::try_new("a1")?,
        SeatId::try_new("a2")?,
        SeatId::try_new("v1")?,
    ];
    let retry = RetryConfig::default();
    let receipt = retry_on_busy(&retry, || service.book(&solaris, &family_seats)).await?;
    info!("Receipt:\n{}", serde_json::to_string_pretty(&receipt)?);

    // The VIP seat is gone now, including as part of a larger group
    info!("Attempting to book V1 and V2 together");
    match service
        .book(&solaris, &[SeatId::try_new("v1")?, SeatId::try_new("v2")?])
        .await
    {
        Ok(_) => panic!("Double booking should have failed"),
        Err(e) => info!("Double booking correctly rejected: {e}"),
    }

    // A change of plans frees all three seats at once
    info!("Cancelling the booking");
    match service.cancel_booking(&receipt.group_id).await? {
        CancelOutcome::Cancelled { seats } => info!("Released seats: {seats:?}"),
        CancelOutcome::AlreadyCancelled => panic!("First cancellation cannot be a repeat"),
    }
    let rebooked = service.book(&solaris, &[SeatId::try_new("v1")?]).await?;
    info!("V1 rebooked for {}", rebooked.total);

    // The late screening is called off; its bookings cascade to cancelled
    info!("Selling two groups for Stalker, then cancelling the show");
    service.book(&stalker, &[SeatId::try_new("b1")?]).await?;
    service
        .book(&stalker, &[SeatId::try_new("b2")?, SeatId::try_new("b3")?])
        .await?;
    let cancelled = service.cancel_show(&stalker).await?;
    info!(
        "Stalker cancelled; {} booking groups to refund",
        cancelled.affected_groups.len()
    );

    match service.book(&stalker, &[SeatId::try_new("b4")?]).await {
        Ok(_) => panic!("Cancelled show should not sell seats"),
        Err(e) => info!("Sale on cancelled show correctly rejected: {e}"),
    }

    info!("Box-office demo completed successfully");
    Ok(())
}
