//! Route and bus lists

use crate::environment::AppEnvironment;
use crate::notify::{Notice, notify};
use crate::search::{unique_destinations, unique_origins};
use crate::types::{Bus, Route};
use busline_core::{SmallVec, async_effect, effect::Effect, reducer::Reducer, smallvec};

/// Catalog slice
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogState {
    /// All routes
    pub routes: Vec<Route>,
    /// All buses
    pub buses: Vec<Bus>,
    /// Origin pick list, first-seen order
    pub origins: Vec<String>,
    /// Destination pick list, first-seen order
    pub destinations: Vec<String>,
    /// Routes request in flight
    pub routes_loading: bool,
    /// Buses request in flight
    pub buses_loading: bool,
    /// Last failure message
    pub last_error: Option<String>,
}

/// Catalog actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogAction {
    /// Fetch routes
    LoadRoutes,
    /// Fetch buses
    LoadBuses,
    /// Routes response
    RoutesLoaded(Result<Vec<Route>, String>),
    /// Buses response
    BusesLoaded(Result<Vec<Bus>, String>),
}

/// Reducer for the catalog slice
#[derive(Clone, Debug, Default)]
pub struct CatalogReducer;

impl CatalogReducer {
    /// Creates a new `CatalogReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CatalogReducer {
    type State = CatalogState;
    type Action = CatalogAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CatalogAction::LoadRoutes => {
                state.routes_loading = true;
                state.last_error = None;
                let catalog = env.catalog.clone();
                smallvec![async_effect! {
                    let result = catalog.routes().await.map_err(|e| e.user_message("Failed to load routes"));
                    Some(CatalogAction::RoutesLoaded(result))
                }]
            },

            CatalogAction::LoadBuses => {
                state.buses_loading = true;
                state.last_error = None;
                let catalog = env.catalog.clone();
                smallvec![async_effect! {
                    let result = catalog.buses().await.map_err(|e| e.user_message("Could not load buses"));
                    Some(CatalogAction::BusesLoaded(result))
                }]
            },

            CatalogAction::RoutesLoaded(result) => {
                state.routes_loading = false;
                match result {
                    Ok(routes) => {
                        tracing::debug!(count = routes.len(), "Routes loaded");
                        state.origins = unique_origins(&routes);
                        state.destinations = unique_destinations(&routes);
                        state.routes = routes;
                        SmallVec::new()
                    },
                    Err(error) => {
                        state.last_error = Some(error.clone());
                        smallvec![notify(&env.notifier, Notice::error("Failed to load routes", error))]
                    },
                }
            },

            CatalogAction::BusesLoaded(result) => {
                state.buses_loading = false;
                match result {
                    Ok(buses) => {
                        tracing::debug!(count = buses.len(), "Buses loaded");
                        state.buses = buses;
                        SmallVec::new()
                    },
                    Err(error) => {
                        state.last_error = Some(error.clone());
                        smallvec![notify(&env.notifier, Notice::error("Could not load buses", error))]
                    },
                }
            },
        }
    }
}
