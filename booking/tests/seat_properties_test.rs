//! Properties of seat maps, seat selection and booking totals.

use busline::api::InMemoryBackend;
use busline::inventory::{RandomSeatInventory, SeatInventory};
use busline::reducers::{BookingAction, BookingReducer, BookingState};
use busline::types::{BusListing, Money, Passenger, ScheduleId};
use busline::{AppEnvironment, demo};
use busline_core::reducer::Reducer;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn passenger() -> Passenger {
    Passenger {
        name: "Amina Nakato".into(),
        email: "amina@example.com".into(),
        phone: "+256772000111".into(),
    }
}

proptest! {
    #[test]
    fn seat_map_has_requested_size_and_unique_ids(
        count in 1u32..80,
        availability in 0.0f64..=1.0,
        seed in any::<u64>(),
        bus in 1u64..1_000,
    ) {
        let inventory = RandomSeatInventory::seeded(count, availability, seed).unwrap();
        let seats = inventory.seats_for(ScheduleId::new(bus));

        prop_assert_eq!(seats.len(), count as usize);
        let ids: HashSet<_> = seats.iter().map(|s| s.id.clone()).collect();
        prop_assert_eq!(ids.len(), seats.len());
        prop_assert!(seats.iter().all(|s| !s.is_selected));
        prop_assert_eq!(seats[0].number.as_str(), "01");
        let expected_first = format!("seat-{bus}-01");
        prop_assert_eq!(seats[0].id.as_str(), expected_first.as_str());
    }

    #[test]
    fn toggling_never_selects_unavailable_seats(
        seed in any::<u64>(),
        toggles in proptest::collection::vec(0usize..40, 0..60),
    ) {
        let inventory = RandomSeatInventory::seeded(40, 0.5, seed).unwrap();
        let mut seats = inventory.seats_for(ScheduleId::new(1));

        for index in toggles {
            seats[index].toggle();
        }

        prop_assert!(seats.iter().filter(|s| s.is_selected).all(|s| s.is_available));
    }

    #[test]
    fn double_toggle_restores_seat(seed in any::<u64>(), index in 0usize..40) {
        let inventory = RandomSeatInventory::seeded(40, 0.7, seed).unwrap();
        let mut seats = inventory.seats_for(ScheduleId::new(1));
        let before = seats[index].clone();

        seats[index].toggle();
        seats[index].toggle();

        prop_assert_eq!(&seats[index], &before);
    }

    #[test]
    fn created_booking_totals_fare_times_selected_seats(
        seed in any::<u64>(),
        shillings in 1u64..10_000_000,
        toggles in proptest::collection::vec(0usize..40, 0..60),
    ) {
        let inventory = RandomSeatInventory::seeded(40, 0.7, seed).unwrap();
        let env = AppEnvironment::offline(
            InMemoryBackend::new(demo::schedules(), demo::user()),
            Arc::new(inventory),
        );
        let fare = Money::checked_from_shillings(shillings).unwrap();
        let reducer = BookingReducer::new();

        let mut state = BookingState::default();
        let mut listing = BusListing::from_schedule(&demo::schedules()[0], demo::ASSET_URL);
        listing.price = fare;
        let bus_id = listing.id;
        reducer.reduce(&mut state, BookingAction::SelectBus(listing), &env);
        reducer.reduce(&mut state, BookingAction::LoadSeats { bus_id }, &env);

        for index in toggles {
            let seat = state.seats[index].id.clone();
            reducer.reduce(&mut state, BookingAction::ToggleSeat(seat), &env);
        }
        let expected_seats: Vec<String> = state
            .seats
            .iter()
            .filter(|s| s.is_selected)
            .map(|s| s.number.clone())
            .collect();

        reducer.reduce(&mut state, BookingAction::CreateBooking { passenger: passenger() }, &env);

        match state.draft {
            Some(draft) => {
                let count = draft.selected_seats.len() as u64;
                prop_assert_eq!(Some(draft.total_amount), fare.checked_mul(count));
                prop_assert_eq!(draft.selected_seats, expected_seats);
            },
            None => prop_assert!(expected_seats.is_empty()),
        }
    }
}

#[test]
fn out_of_range_inventory_is_rejected() {
    assert!(RandomSeatInventory::seeded(0, 0.5, 1).is_err());
    assert!(RandomSeatInventory::seeded(40, 1.5, 1).is_err());
    assert!(RandomSeatInventory::seeded(40, -0.1, 1).is_err());
}
