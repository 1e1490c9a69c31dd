//! Backend interfaces.
//!
//! Each backend concern is a trait so reducers can be driven by the real
//! [`ApiClient`] or by the [`InMemoryBackend`] used in tests and demos.

use crate::error::ApiError;
use crate::types::{BookingId, Bus, Route, Schedule, SearchParams, Session};
use std::future::Future;
use std::pin::Pin;

pub mod client;
pub mod mock;
pub mod wire;

pub use client::ApiClient;
pub use mock::{Endpoint, InMemoryBackend};
pub use wire::{AuthResponse, BookingRequest, BookingResponse, Credentials, Registration};

/// Future returned by every backend call
pub type BackendFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

/// Credential exchange
pub trait AuthBackend: Send + Sync {
    /// Exchange email and password for a session
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for rejected credentials.
    fn login(&self, credentials: Credentials) -> BackendFuture<AuthResponse>;

    /// Create an account and sign in
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] with the backend's validation message.
    fn register(&self, registration: Registration) -> BackendFuture<AuthResponse>;

    /// Revoke the session's token
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or a rejected token.
    fn logout(&self, session: &Session) -> BackendFuture<()>;
}

/// Routes, buses and schedules
pub trait CatalogBackend: Send + Sync {
    /// All routes
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or undecodable responses.
    fn routes(&self) -> BackendFuture<Vec<Route>>;

    /// All buses
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or undecodable responses.
    fn buses(&self) -> BackendFuture<Vec<Bus>>;

    /// Schedules for a search; callers still filter the result
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or undecodable responses.
    fn schedules(&self, query: &SearchParams) -> BackendFuture<Vec<Schedule>>;
}

/// Booking creation and tickets
pub trait BookingBackend: Send + Sync {
    /// Create a paid booking
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the session has expired.
    fn create_booking(&self, session: &Session, request: BookingRequest) -> BackendFuture<BookingResponse>;

    /// Where the ticket PDF for `booking` can be fetched
    fn ticket_url(&self, booking: BookingId) -> String;

    /// Fetch the ticket PDF
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or a missing booking.
    fn download_ticket(&self, session: &Session, booking: BookingId) -> BackendFuture<Vec<u8>>;
}
