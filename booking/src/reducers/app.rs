//! Application root: every slice scoped into one state tree

use super::auth::{AuthAction, AuthReducer, AuthState};
use super::booking::{BookingAction, BookingReducer, BookingState};
use super::catalog::{CatalogAction, CatalogReducer, CatalogState};
use super::checkout::{CheckoutAction, CheckoutReducer, CheckoutState};
use crate::environment::AppEnvironment;
use crate::types::{Passenger, ScheduleId, SearchParams, SeatId};
use busline_core::composition::{CombinedReducer, combine_reducers, scope_reducer};
use busline_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Whole client state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
    /// Session
    pub auth: AuthState,
    /// Routes and buses
    pub catalog: CatalogState,
    /// Search, seats and draft
    pub booking: BookingState,
    /// Payment and confirmation
    pub checkout: CheckoutState,
}

impl AppState {
    /// Checkout command for the current draft, if signed in with a draft ready
    #[must_use]
    pub fn checkout_action(&self) -> Option<AppAction> {
        let session = self.auth.session.clone()?;
        let draft = self.booking.draft.clone()?;
        Some(AppAction::Checkout(CheckoutAction::Submit { session, draft }))
    }
}

/// Every action the client understands
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppAction {
    /// Session actions
    Auth(AuthAction),
    /// Catalog actions
    Catalog(CatalogAction),
    /// Booking actions
    Booking(BookingAction),
    /// Checkout actions
    Checkout(CheckoutAction),
}

impl AppAction {
    /// Replace the search and run it
    #[must_use]
    pub fn search(params: SearchParams) -> [Self; 2] {
        [
            Self::Booking(BookingAction::SetSearchParams(params)),
            Self::Booking(BookingAction::Search),
        ]
    }

    /// Open the seat map of a listing
    #[must_use]
    pub const fn load_seats(bus_id: ScheduleId) -> Self {
        Self::Booking(BookingAction::LoadSeats { bus_id })
    }

    /// Flip one seat
    #[must_use]
    pub const fn toggle_seat(seat: SeatId) -> Self {
        Self::Booking(BookingAction::ToggleSeat(seat))
    }

    /// Assemble the draft
    #[must_use]
    pub const fn create_booking(passenger: Passenger) -> Self {
        Self::Booking(BookingAction::CreateBooking { passenger })
    }
}

fn auth(state: &mut AppState) -> &mut AuthState {
    &mut state.auth
}

fn catalog(state: &mut AppState) -> &mut CatalogState {
    &mut state.catalog
}

fn booking(state: &mut AppState) -> &mut BookingState {
    &mut state.booking
}

fn checkout(state: &mut AppState) -> &mut CheckoutState {
    &mut state.checkout
}

fn auth_action(action: AppAction) -> Option<AuthAction> {
    match action {
        AppAction::Auth(action) => Some(action),
        _ => None,
    }
}

fn catalog_action(action: AppAction) -> Option<CatalogAction> {
    match action {
        AppAction::Catalog(action) => Some(action),
        _ => None,
    }
}

/// A confirmed checkout also resets seat selection
fn booking_action(action: AppAction) -> Option<BookingAction> {
    match action {
        AppAction::Booking(action) => Some(action),
        AppAction::Checkout(CheckoutAction::Confirmed { .. }) => Some(BookingAction::Reset),
        _ => None,
    }
}

fn checkout_action(action: AppAction) -> Option<CheckoutAction> {
    match action {
        AppAction::Checkout(action) => Some(action),
        _ => None,
    }
}

/// Root reducer
pub struct AppReducer {
    inner: CombinedReducer<AppState, AppAction, AppEnvironment>,
}

impl AppReducer {
    /// All four slices, each scoped to its part of [`AppState`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: combine_reducers(vec![
                Box::new(scope_reducer(AuthReducer::new(), auth, auth_action, AppAction::Auth)),
                Box::new(scope_reducer(
                    CatalogReducer::new(),
                    catalog,
                    catalog_action,
                    AppAction::Catalog,
                )),
                Box::new(scope_reducer(
                    BookingReducer::new(),
                    booking,
                    booking_action,
                    AppAction::Booking,
                )),
                Box::new(scope_reducer(
                    CheckoutReducer::new(),
                    checkout,
                    checkout_action,
                    AppAction::Checkout,
                )),
            ]),
        }
    }
}

impl Default for AppReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.inner.reduce(state, action, env)
    }
}
