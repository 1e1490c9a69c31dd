//! Search, bus selection, seat selection and booking assembly.
//!
//! This slice holds everything between typing a search and having a
//! [`BookingDraft`] ready for checkout:
//!
//! 1. `SetSearchParams` / `Search` query the catalog. Each search bumps a
//!    generation counter and responses for older generations are dropped, so a
//!    slow response never overwrites fresher results.
//! 2. `SelectBus` picks a listing and snapshots it to storage.
//! 3. `LoadSeats` generates the seat map, restoring the snapshot first when the
//!    requested bus is not the selected one.
//! 4. `ToggleSeat` flips available seats.
//! 5. `CreateBooking` validates and assembles the draft.

use crate::environment::AppEnvironment;
use crate::notify::{Notice, notify};
use crate::search::filter_schedules;
use crate::types::{BookingDraft, BusListing, Passenger, Schedule, ScheduleId, SearchParams, Seat, SeatId};
use busline_core::{SmallVec, async_effect, effect::Effect, reducer::Reducer, smallvec};

/// Booking slice
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookingState {
    /// Current search, replaced wholesale
    pub search: SearchParams,
    /// Generation of the most recent search request
    pub search_generation: u64,
    /// A search request is in flight
    pub searching: bool,
    /// At least one search has completed
    pub has_searched: bool,
    /// Listings matching the last completed search
    pub found: Vec<BusListing>,
    /// Bus being booked
    pub selected_bus: Option<BusListing>,
    /// Seat map for the selected bus
    pub seats: Vec<Seat>,
    /// Assembled booking
    pub draft: Option<BookingDraft>,
    /// Last failure message
    pub last_error: Option<String>,
}

impl BookingState {
    /// Seat numbers currently selected, in seat-map order
    #[must_use]
    pub fn selected_seat_numbers(&self) -> Vec<String> {
        self.seats
            .iter()
            .filter(|s| s.is_selected)
            .map(|s| s.number.clone())
            .collect()
    }

    /// Whether the last completed search found nothing
    #[must_use]
    pub fn no_buses_found(&self) -> bool {
        self.has_searched && !self.searching && self.found.is_empty()
    }
}

/// Booking actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingAction {
    // Commands
    /// Replace the search parameters
    SetSearchParams(SearchParams),
    /// Run the current search
    Search,
    /// Choose a listing to book
    SelectBus(BusListing),
    /// Generate the seat map for a listing
    LoadSeats {
        /// Listing whose seats to show
        bus_id: ScheduleId,
    },
    /// Flip one seat
    ToggleSeat(SeatId),
    /// Assemble the draft from the selection
    CreateBooking {
        /// Passenger details
        passenger: Passenger,
    },
    /// Clear selected bus, seats and draft
    Reset,

    // Events
    /// Schedules response for a search
    SearchCompleted {
        /// Generation the request was sent with
        generation: u64,
        /// Schedules, or a user-facing message
        result: Result<Vec<Schedule>, String>,
    },
    /// Snapshot read for a `LoadSeats` on an unselected bus
    SnapshotRestored {
        /// Requested listing
        bus_id: ScheduleId,
        /// Snapshot found in storage
        bus: Option<BusListing>,
    },
}

/// Reducer for the booking slice
#[derive(Clone, Debug, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Creates a new `BookingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a `CreateBooking` command against the current selection
    fn validate_create_booking(state: &BookingState, passenger: &Passenger) -> Result<(), Notice> {
        if state.selected_bus.is_none() {
            return Err(Notice::error("No bus selected", "Please choose a bus before booking"));
        }
        if !state.seats.iter().any(|s| s.is_selected) {
            return Err(Notice::error(
                "No seats selected",
                "Please select at least one seat to continue",
            ));
        }
        passenger
            .validate()
            .map_err(|description| Notice::error("Missing information", description))
    }

    fn fail(state: &mut BookingState, env: &AppEnvironment, notice: Notice) -> SmallVec<[Effect<BookingAction>; 4]> {
        tracing::debug!(title = %notice.title, "Booking command rejected");
        state.last_error = Some(notice.description.clone());
        smallvec![notify(&env.notifier, notice)]
    }

    fn open_seat_map(state: &mut BookingState, env: &AppEnvironment, bus_id: ScheduleId) {
        state.seats = env.inventory.seats_for(bus_id);
        tracing::debug!(
            %bus_id,
            available = state.seats.iter().filter(|s| s.is_available).count(),
            "Seat map generated"
        );
    }
}

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = AppEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            BookingAction::SetSearchParams(params) => {
                state.search = params;
                SmallVec::new()
            },

            BookingAction::Search => {
                if let Err(description) = state.search.validate() {
                    return Self::fail(state, env, Notice::error("Search Error", description));
                }

                state.search_generation += 1;
                state.searching = true;
                state.last_error = None;

                let generation = state.search_generation;
                let query = state.search.clone();
                let catalog = env.catalog.clone();
                tracing::debug!(generation, origin = %query.origin, destination = %query.destination, "Searching");

                smallvec![async_effect! {
                    let result = catalog
                        .schedules(&query)
                        .await
                        .map_err(|e| e.user_message("Failed to load schedules"));
                    Some(BookingAction::SearchCompleted { generation, result })
                }]
            },

            BookingAction::SelectBus(bus) => {
                let sessions = env.sessions.clone();
                let snapshot = bus.clone();

                state.selected_bus = Some(bus);
                state.seats.clear();
                state.draft = None;

                smallvec![busline_core::fire_and_forget! {
                    if let Err(error) = sessions.save_selected_bus(&snapshot) {
                        tracing::warn!(%error, "Could not save selected bus");
                    }
                }]
            },

            BookingAction::LoadSeats { bus_id } => {
                if state.selected_bus.as_ref().is_some_and(|b| b.id == bus_id) {
                    Self::open_seat_map(state, env, bus_id);
                    return SmallVec::new();
                }

                let sessions = env.sessions.clone();
                smallvec![async_effect! {
                    Some(BookingAction::SnapshotRestored { bus_id, bus: sessions.selected_bus() })
                }]
            },

            BookingAction::ToggleSeat(seat_id) => {
                if let Some(seat) = state.seats.iter_mut().find(|s| s.id == seat_id) {
                    seat.toggle();
                }
                SmallVec::new()
            },

            BookingAction::CreateBooking { passenger } => {
                if let Err(notice) = Self::validate_create_booking(state, &passenger) {
                    return Self::fail(state, env, notice);
                }
                let Some(bus) = state.selected_bus.as_ref() else {
                    return SmallVec::new();
                };

                let selected_seats = state.selected_seat_numbers();
                let seat_count = selected_seats.len() as u64;
                let Some(total_amount) = bus.price.checked_mul(seat_count) else {
                    return Self::fail(
                        state,
                        env,
                        Notice::error("Booking Error", "Booking total is out of range"),
                    );
                };

                let now = env.clock.now();
                let draft = BookingDraft {
                    booking_id: env.references.next_reference(),
                    bus_id: bus.id,
                    selected_seats,
                    passenger,
                    total_amount,
                    booking_date: now,
                    travel_date: state.search.date.unwrap_or_else(|| now.date_naive()),
                };
                tracing::debug!(booking_id = %draft.booking_id, total = %draft.total_amount, "Booking draft created");

                state.draft = Some(draft);
                state.last_error = None;
                SmallVec::new()
            },

            BookingAction::Reset => {
                state.selected_bus = None;
                state.seats.clear();
                state.draft = None;
                state.last_error = None;
                SmallVec::new()
            },

            // ========== Events ==========
            BookingAction::SearchCompleted { generation, result } => {
                if generation != state.search_generation {
                    tracing::warn!(
                        generation,
                        current = state.search_generation,
                        "Dropping stale search response"
                    );
                    return SmallVec::new();
                }

                state.searching = false;
                state.has_searched = true;

                match result {
                    Ok(schedules) => {
                        state.found = filter_schedules(&schedules, &state.search)
                            .iter()
                            .map(|s| BusListing::from_schedule(s, &env.asset_url))
                            .collect();
                        tracing::debug!(found = state.found.len(), "Search completed");
                        SmallVec::new()
                    },
                    Err(error) => {
                        state.found.clear();
                        Self::fail(state, env, Notice::error("Search Error", error))
                    },
                }
            },

            BookingAction::SnapshotRestored { bus_id, bus } => match bus {
                Some(bus) if bus.id == bus_id => {
                    tracing::debug!(%bus_id, "Restored selected bus from snapshot");
                    state.selected_bus = Some(bus);
                    state.draft = None;
                    Self::open_seat_map(state, env, bus_id);
                    SmallVec::new()
                },
                _ => Self::fail(
                    state,
                    env,
                    Notice::error("Bus not found", "Please pick a bus from the search results"),
                ),
            },
        }
    }
}
