//! Domain types for the booking client.
//!
//! Wire types (`Route`, `Bus`, `Schedule`, `ConfirmedBooking`, `User`) mirror the
//! backend's JSON. View types (`BusListing`, `Seat`, `BookingDraft`) are what the
//! reducers hold.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a backend id
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// The raw backend id
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Backend id of a schedule (one departure). Also identifies a `BusListing`.
    ScheduleId
);
numeric_id!(
    /// Backend id of a bus
    BusId
);
numeric_id!(
    /// Backend id of a route
    RouteId
);
numeric_id!(
    /// Backend id of a confirmed booking
    BookingId
);
numeric_id!(
    /// Backend id of a user
    UserId
);

/// Seat identifier, `seat-<busId>-<NN>`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatId(String);

impl SeatId {
    /// Id of seat `number` on the listing `bus`
    #[must_use]
    pub fn new(bus: ScheduleId, number: &str) -> Self {
        Self(format!("seat-{bus}-{number}"))
    }

    /// The id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SeatId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Money
// ============================================================================

/// Amount of Ugandan shillings in cents
///
/// The backend sends prices as decimal strings (`"45000.00"`); they are parsed
/// without going through floating point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

/// A price string that is not a non-negative amount with at most two decimals
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount: {0:?}")]
pub struct ParseMoneyError(String);

impl Money {
    /// Zero shillings
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole shillings, `None` on overflow
    #[must_use]
    pub const fn checked_from_shillings(shillings: u64) -> Option<Self> {
        match shillings.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in whole shillings (rounded down)
    #[must_use]
    pub const fn shillings(&self) -> u64 {
        self.0 / 100
    }

    /// Multiplies by a seat count, `None` on overflow
    #[must_use]
    pub const fn checked_mul(self, count: u64) -> Option<Self> {
        match self.0.checked_mul(count) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Parse a decimal string such as `"45000"`, `"45000.5"` or `"45000.00"`
    ///
    /// Digits past the second decimal place are accepted only when they are zero.
    ///
    /// # Errors
    ///
    /// Returns [`ParseMoneyError`] for empty, negative or non-numeric input,
    /// sub-cent precision, or amounts that overflow.
    pub fn parse_decimal(input: &str) -> Result<Self, ParseMoneyError> {
        let invalid = || ParseMoneyError(input.to_string());
        let trimmed = input.trim();

        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let (cents_part, rest) = fraction.split_at(fraction.len().min(2));
        if rest.chars().any(|c| c != '0') {
            return Err(invalid());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let cents: u64 = match cents_part.len() {
            0 => 0,
            1 => cents_part.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => cents_part.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(cents))
            .map(Self)
            .ok_or_else(invalid)
    }

    /// Decimal string with two places, as the backend expects (`"90000.00"`)
    #[must_use]
    pub fn to_decimal_string(&self) -> String {
        format!("{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Displays as whole shillings with thousands separators: `UGX 45,000`
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.shillings().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        write!(f, "UGX {grouped}")
    }
}

/// Serde adapter for money that travels as a decimal string or JSON number
pub mod decimal {
    use super::Money;
    use serde::{Deserialize, Deserializer, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    /// Serialize as a two-place decimal string
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&money.to_decimal_string())
    }

    /// Deserialize from `"45000.00"` or `45000`
    ///
    /// # Errors
    ///
    /// Fails when the value is not a valid amount.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Number(number) => number.to_string(),
        };
        Money::parse_decimal(&text).map_err(de::Error::custom)
    }
}

// ============================================================================
// Catalog (wire)
// ============================================================================

/// An origin/destination pair with a base fare
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Route id (absent when the route is embedded in a schedule)
    #[serde(default)]
    pub id: RouteId,
    /// Departure town
    pub origin: String,
    /// Arrival town
    pub destination: String,
    /// Distance as the backend formats it
    #[serde(default)]
    pub distance: Option<String>,
    /// Fare per seat
    #[serde(with = "decimal")]
    pub base_price: Money,
}

/// A bus in the fleet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bus {
    /// Bus id
    pub id: BusId,
    /// Operator/company name shown to customers
    pub name: String,
    /// Registration plate
    pub number_plate: String,
    /// Seat capacity
    pub total_seats: u32,
    /// Free-text amenities
    #[serde(default)]
    pub amenities: Option<String>,
    /// Picture file name, relative to the asset base URL
    #[serde(default)]
    pub bus_pic: Option<String>,
}

/// One departure of a bus on a route
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Schedule id
    pub id: ScheduleId,
    /// Departure timestamp, verbatim
    pub departure_time: String,
    /// Arrival timestamp, verbatim
    pub arrival_time: String,
    /// Backend status (`scheduled`, `cancelled`, ...)
    #[serde(default)]
    pub status: Option<String>,
    /// The bus running this departure
    pub bus: Bus,
    /// The route it runs
    pub route: Route,
}

// ============================================================================
// Search and seat selection
// ============================================================================

/// What the customer is searching for
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Departure town
    pub origin: String,
    /// Arrival town
    pub destination: String,
    /// Travel date; `None` searches all dates
    pub date: Option<NaiveDate>,
}

impl SearchParams {
    /// Search for `origin` → `destination` on any date
    #[must_use]
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            date: None,
        }
    }

    /// Restrict the search to one travel date
    #[must_use]
    pub const fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Both towns must be given before a search is sent
    ///
    /// # Errors
    ///
    /// Returns the user-facing message when either town is blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.origin.trim().is_empty() || self.destination.trim().is_empty() {
            return Err("Please select both origin and destination".to_string());
        }
        Ok(())
    }
}

/// A bookable departure as shown in search results
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusListing {
    /// Schedule id
    pub id: ScheduleId,
    /// Departure town
    pub origin: String,
    /// Arrival town
    pub destination: String,
    /// Departure timestamp
    pub departure_time: String,
    /// Arrival timestamp
    pub arrival_time: String,
    /// Fare per seat
    pub price: Money,
    /// Seat capacity
    pub available_seats: u32,
    /// Registration plate
    pub bus_number: String,
    /// Operator name
    pub company_name: String,
    /// Absolute URL of the bus picture
    pub bus_pic: Option<String>,
    /// Intermediate stops, when known
    #[serde(default)]
    pub stops: Vec<String>,
}

impl BusListing {
    /// Project a schedule into a listing, resolving the picture against `asset_url`
    #[must_use]
    pub fn from_schedule(schedule: &Schedule, asset_url: &str) -> Self {
        let bus_pic = schedule
            .bus
            .bus_pic
            .as_deref()
            .filter(|pic| !pic.is_empty())
            .map(|pic| {
                if pic.starts_with("http://") || pic.starts_with("https://") {
                    pic.to_string()
                } else {
                    format!("{}/{}", asset_url.trim_end_matches('/'), pic)
                }
            });

        Self {
            id: schedule.id,
            origin: schedule.route.origin.clone(),
            destination: schedule.route.destination.clone(),
            departure_time: schedule.departure_time.clone(),
            arrival_time: schedule.arrival_time.clone(),
            price: schedule.route.base_price,
            available_seats: schedule.bus.total_seats,
            bus_number: schedule.bus.number_plate.clone(),
            company_name: schedule.bus.name.clone(),
            bus_pic,
            stops: Vec::new(),
        }
    }
}

/// One seat on the seat map
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// `seat-<busId>-<NN>`
    pub id: SeatId,
    /// Two-digit seat number, `"01"`..
    pub number: String,
    /// Fixed when the map is generated
    pub is_available: bool,
    /// Toggled by the customer
    pub is_selected: bool,
}

impl Seat {
    /// Flip the selection; unavailable seats are left alone
    pub fn toggle(&mut self) {
        if self.is_available {
            self.is_selected = !self.is_selected;
        }
    }
}

/// Passenger contact details
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    /// Full name
    pub name: String,
    /// Email address (the e-ticket is sent here)
    pub email: String,
    /// Phone number
    pub phone: String,
}

impl Passenger {
    /// All three fields are required
    ///
    /// # Errors
    ///
    /// Returns the user-facing message when any field is blank.
    pub fn validate(&self) -> Result<(), String> {
        if [&self.name, &self.email, &self.phone]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err("Please fill in all passenger details".to_string());
        }
        Ok(())
    }
}

/// A booking assembled on the client, before payment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    /// `ECO-` reference
    pub booking_id: String,
    /// The listing being booked
    pub bus_id: ScheduleId,
    /// Seat numbers, in seat-map order
    pub selected_seats: Vec<String>,
    /// Who is travelling
    pub passenger: Passenger,
    /// Fare × seat count
    pub total_amount: Money,
    /// When the draft was assembled
    pub booking_date: DateTime<Utc>,
    /// Day of travel
    pub travel_date: NaiveDate,
}

// ============================================================================
// Checkout (wire)
// ============================================================================

/// How the customer pays
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Debit/credit card
    #[default]
    Card,
    /// Mobile money
    Momo,
    /// `PayPal`
    Paypal,
}

impl PaymentMethod {
    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Momo => "momo",
            Self::Paypal => "paypal",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "momo" => Ok(Self::Momo),
            "paypal" => Ok(Self::Paypal),
            other => Err(format!("unknown payment method {other:?} (card, momo, paypal)")),
        }
    }
}

/// A booking accepted by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedBooking {
    /// Booking id (used for the ticket PDF)
    pub id: BookingId,
    /// Owner
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Booked departure
    pub schedule_id: ScheduleId,
    /// Backend-assigned reference
    #[serde(default)]
    pub booking_reference: Option<String>,
    /// Amount charged
    #[serde(with = "decimal")]
    pub price: Money,
    /// Booking status
    #[serde(default)]
    pub status: Option<String>,
    /// Payment method recorded by the backend
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// Payment status
    #[serde(default)]
    pub payment_status: Option<String>,
    /// The departure, when the backend embeds it
    #[serde(default)]
    pub schedule: Option<Schedule>,
}

// ============================================================================
// Session
// ============================================================================

/// Account role
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Back-office user
    Admin,
    /// Regular customer
    Customer,
}

/// A registered user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Role, if the backend assigned one
    #[serde(rename = "is_role", default)]
    pub role: Option<Role>,
}

/// An authenticated session: bearer token plus the user it belongs to
///
/// Passed explicitly to every backend call that needs authentication.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token
    pub token: String,
    /// Signed-in user
    pub user: User,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}
