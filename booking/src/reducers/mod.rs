//! Reducers for each slice of the client, plus the root that combines them

pub mod app;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod checkout;

pub use app::{AppAction, AppReducer, AppState};
pub use auth::{AuthAction, AuthReducer, AuthState};
pub use booking::{BookingAction, BookingReducer, BookingState};
pub use catalog::{CatalogAction, CatalogReducer, CatalogState};
pub use checkout::{CheckoutAction, CheckoutReducer, CheckoutState};
