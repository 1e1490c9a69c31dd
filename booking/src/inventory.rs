//! Seat inventory providers.
//!
//! The backend does not track seats, so the seat map is generated on the
//! client each time a bus is opened. Availability is random per view and
//! carries no reservation: two customers can pick the same seat.

use crate::config::SeatConfig;
use crate::error::InventoryError;
use crate::types::{ScheduleId, Seat, SeatId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Source of seat maps
pub trait SeatInventory: Send + Sync {
    /// Seat map for one listing, numbered from `"01"` in order
    fn seats_for(&self, bus: ScheduleId) -> Vec<Seat>;
}

/// Fixed-size seat map with independently random availability
#[derive(Debug)]
pub struct RandomSeatInventory {
    seat_count: u32,
    availability: f64,
    rng: Mutex<StdRng>,
}

impl RandomSeatInventory {
    /// Entropy-seeded inventory
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] for zero seats or an availability outside `[0, 1]`.
    pub fn new(seat_count: u32, availability: f64) -> Result<Self, InventoryError> {
        Self::with_rng(seat_count, availability, StdRng::from_entropy())
    }

    /// Deterministic inventory for tests
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] for zero seats or an availability outside `[0, 1]`.
    pub fn seeded(seat_count: u32, availability: f64, seed: u64) -> Result<Self, InventoryError> {
        Self::with_rng(seat_count, availability, StdRng::seed_from_u64(seed))
    }

    /// Inventory from loaded configuration
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] when the configuration is out of range.
    pub fn from_config(config: &SeatConfig) -> Result<Self, InventoryError> {
        Self::new(config.count, config.availability)
    }

    fn with_rng(seat_count: u32, availability: f64, rng: StdRng) -> Result<Self, InventoryError> {
        if seat_count == 0 {
            return Err(InventoryError::NoSeats);
        }
        if !(0.0..=1.0).contains(&availability) {
            return Err(InventoryError::InvalidAvailability(availability));
        }
        Ok(Self {
            seat_count,
            availability,
            rng: Mutex::new(rng),
        })
    }

    /// Seats per map
    #[must_use]
    pub const fn seat_count(&self) -> u32 {
        self.seat_count
    }
}

impl SeatInventory for RandomSeatInventory {
    fn seats_for(&self, bus: ScheduleId) -> Vec<Seat> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        (1..=self.seat_count)
            .map(|n| {
                let number = format!("{n:02}");
                Seat {
                    id: SeatId::new(bus, &number),
                    number,
                    is_available: rng.gen_bool(self.availability),
                    is_selected: false,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_has_forty_numbered_seats() {
        let inventory = RandomSeatInventory::seeded(40, 0.7, 7).unwrap();
        let seats = inventory.seats_for(ScheduleId::new(12));

        assert_eq!(seats.len(), 40);
        assert_eq!(seats[0].number, "01");
        assert_eq!(seats[39].number, "40");
        assert_eq!(seats[8].id.as_str(), "seat-12-09");
        assert!(seats.iter().all(|s| !s.is_selected));
    }

    #[test]
    fn same_seed_same_availability() {
        let a = RandomSeatInventory::seeded(40, 0.7, 99).unwrap();
        let b = RandomSeatInventory::seeded(40, 0.7, 99).unwrap();
        assert_eq!(a.seats_for(ScheduleId::new(1)), b.seats_for(ScheduleId::new(1)));
    }

    #[test]
    fn extreme_ratios() {
        let full = RandomSeatInventory::seeded(10, 1.0, 1).unwrap();
        assert!(full.seats_for(ScheduleId::new(1)).iter().all(|s| s.is_available));

        let sold_out = RandomSeatInventory::seeded(10, 0.0, 1).unwrap();
        assert!(sold_out.seats_for(ScheduleId::new(1)).iter().all(|s| !s.is_available));
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert_eq!(RandomSeatInventory::new(0, 0.7).unwrap_err(), InventoryError::NoSeats);
        assert!(matches!(
            RandomSeatInventory::new(40, -0.1),
            Err(InventoryError::InvalidAvailability(_))
        ));
    }
}
