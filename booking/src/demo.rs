//! Built-in catalog for offline runs and tests

use crate::types::{Bus, BusId, Money, Role, Route, RouteId, Schedule, ScheduleId, User, UserId};

/// Asset base URL used by the offline catalog
pub const ASSET_URL: &str = "https://assets.busline.test/buses";

fn route(id: u64, origin: &str, destination: &str, distance: &str, shillings: u64) -> Route {
    Route {
        id: RouteId::new(id),
        origin: origin.to_string(),
        destination: destination.to_string(),
        distance: Some(distance.to_string()),
        base_price: Money::from_cents(shillings * 100),
    }
}

fn bus(id: u64, name: &str, plate: &str, pic: Option<&str>) -> Bus {
    Bus {
        id: BusId::new(id),
        name: name.to_string(),
        number_plate: plate.to_string(),
        total_seats: 40,
        amenities: Some("WiFi, AC".to_string()),
        bus_pic: pic.map(str::to_string),
    }
}

fn schedule(id: u64, departure: &str, arrival: &str, bus: Bus, route: Route) -> Schedule {
    Schedule {
        id: ScheduleId::new(id),
        departure_time: departure.to_string(),
        arrival_time: arrival.to_string(),
        status: Some("scheduled".to_string()),
        bus,
        route,
    }
}

/// Four departures: two Kampala to Gulu, one Kampala to Mbarara, one Jinja to Mbale
#[must_use]
pub fn schedules() -> Vec<Schedule> {
    let gulu = route(1, "Kampala", "Gulu", "340 km", 45_000);
    vec![
        schedule(
            1,
            "2025-01-02 07:00:00",
            "2025-01-02 13:00:00",
            bus(1, "Gateway Express", "UAX 123A", Some("gateway.jpg")),
            gulu.clone(),
        ),
        schedule(
            2,
            "2025-01-02 14:00:00",
            "2025-01-02 20:00:00",
            bus(2, "Nile Star", "UBB 456B", None),
            gulu,
        ),
        schedule(
            3,
            "2025-01-02 08:30:00",
            "2025-01-02 13:30:00",
            bus(3, "Western Link", "UBC 789C", Some("western.jpg")),
            route(2, "Kampala", "Mbarara", "270 km", 35_000),
        ),
        schedule(
            4,
            "2025-01-02 09:00:00",
            "2025-01-02 12:00:00",
            bus(4, "Eastern Coach", "UBD 012D", None),
            route(3, "Jinja", "Mbale", "140 km", 20_000),
        ),
    ]
}

/// Account the offline backend signs everyone in as
#[must_use]
pub fn user() -> User {
    User {
        id: UserId::new(1),
        name: "Demo Traveller".to_string(),
        email: "demo@busline.test".to_string(),
        phone: Some("+256700000000".to_string()),
        role: Some(Role::Customer),
    }
}
