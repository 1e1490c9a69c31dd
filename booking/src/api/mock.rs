//! In-memory backend for tests and offline demos.
//!
//! Serves a fixed catalog, signs in any credentials, and accepts every booking
//! unless a failure has been scripted for that endpoint.

use super::{
    AuthBackend, AuthResponse, BackendFuture, BookingBackend, BookingRequest, BookingResponse,
    CatalogBackend, Credentials, Registration,
};
use crate::error::ApiError;
use crate::types::{BookingId, Bus, ConfirmedBooking, Route, Schedule, SearchParams, Session, User};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Backend endpoints, for scripting failures and inspecting calls
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /login`
    Login,
    /// `POST /register`
    Register,
    /// `POST /logout`
    Logout,
    /// `GET /routes`
    Routes,
    /// `GET /buses`
    Buses,
    /// `GET /schedules`
    Schedules,
    /// `POST /bookings`
    Bookings,
    /// `GET /bookings/generate_pdf/:id`
    Ticket,
}

#[derive(Default)]
struct Script {
    failures: HashMap<Endpoint, ApiError>,
    delays: HashMap<Endpoint, VecDeque<Duration>>,
    calls: Vec<Endpoint>,
    bookings: Vec<BookingRequest>,
}

/// In-memory implementation of every backend trait
#[derive(Clone)]
pub struct InMemoryBackend {
    routes: Vec<Route>,
    buses: Vec<Bus>,
    schedules: Vec<Schedule>,
    user: User,
    next_booking: Arc<AtomicU64>,
    script: Arc<Mutex<Script>>,
}

impl InMemoryBackend {
    /// Serve `schedules`, deriving routes and buses from them
    #[must_use]
    pub fn new(schedules: Vec<Schedule>, user: User) -> Self {
        let mut routes: Vec<Route> = Vec::new();
        let mut buses: Vec<Bus> = Vec::new();
        for schedule in &schedules {
            if !routes.contains(&schedule.route) {
                routes.push(schedule.route.clone());
            }
            if !buses.iter().any(|b| b.id == schedule.bus.id) {
                buses.push(schedule.bus.clone());
            }
        }

        Self {
            routes,
            buses,
            schedules,
            user,
            next_booking: Arc::new(AtomicU64::new(1)),
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    /// Make every call to `endpoint` fail with `error`
    pub fn fail(&self, endpoint: Endpoint, error: ApiError) {
        self.script().failures.insert(endpoint, error);
    }

    /// Delay the next call to `endpoint`; queued delays apply in call order
    pub fn delay_next(&self, endpoint: Endpoint, delay: Duration) {
        self.script().delays.entry(endpoint).or_default().push_back(delay);
    }

    /// Endpoints called so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<Endpoint> {
        self.script().calls.clone()
    }

    /// Booking requests received so far
    #[must_use]
    pub fn booking_requests(&self) -> Vec<BookingRequest> {
        self.script().bookings.clone()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call and build a future that honours scripted delay/failure
    fn respond<T>(&self, endpoint: Endpoint, value: T) -> BackendFuture<T>
    where
        T: Send + 'static,
    {
        let (delay, failure) = {
            let mut script = self.script();
            script.calls.push(endpoint);
            let delay = script
                .delays
                .get_mut(&endpoint)
                .and_then(VecDeque::pop_front);
            (delay, script.failures.get(&endpoint).cloned())
        };

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            failure.map_or(Ok(value), Err)
        })
    }

    fn sign_in(&self, email: &str) -> AuthResponse {
        let mut user = self.user.clone();
        if !email.is_empty() {
            user.email = email.to_string();
        }
        AuthResponse {
            token: format!("token-{}", user.id),
            user,
        }
    }
}

impl AuthBackend for InMemoryBackend {
    fn login(&self, credentials: Credentials) -> BackendFuture<AuthResponse> {
        self.respond(Endpoint::Login, self.sign_in(&credentials.email))
    }

    fn register(&self, registration: Registration) -> BackendFuture<AuthResponse> {
        let mut response = self.sign_in(&registration.email);
        response.user.name = registration.name;
        response.user.phone = registration.phone;
        self.respond(Endpoint::Register, response)
    }

    fn logout(&self, _session: &Session) -> BackendFuture<()> {
        self.respond(Endpoint::Logout, ())
    }
}

impl CatalogBackend for InMemoryBackend {
    fn routes(&self) -> BackendFuture<Vec<Route>> {
        self.respond(Endpoint::Routes, self.routes.clone())
    }

    fn buses(&self) -> BackendFuture<Vec<Bus>> {
        self.respond(Endpoint::Buses, self.buses.clone())
    }

    /// Returns every schedule, like a backend that ignores the query
    fn schedules(&self, _query: &SearchParams) -> BackendFuture<Vec<Schedule>> {
        self.respond(Endpoint::Schedules, self.schedules.clone())
    }
}

impl BookingBackend for InMemoryBackend {
    fn create_booking(&self, session: &Session, request: BookingRequest) -> BackendFuture<BookingResponse> {
        let id = BookingId::new(self.next_booking.fetch_add(1, Ordering::SeqCst));
        let schedule = self
            .schedules
            .iter()
            .find(|s| s.id == request.schedule_id)
            .cloned();

        let response = BookingResponse {
            message: Some("Booking created successfully".to_string()),
            booking: ConfirmedBooking {
                id,
                user_id: Some(session.user.id),
                schedule_id: request.schedule_id,
                booking_reference: Some(format!("BK-{:06}", id.get())),
                price: request.price,
                status: Some("confirmed".to_string()),
                payment_method: Some(request.payment_method),
                payment_status: Some("paid".to_string()),
                schedule,
            },
        };

        self.script().bookings.push(request);
        self.respond(Endpoint::Bookings, response)
    }

    fn ticket_url(&self, booking: BookingId) -> String {
        format!("memory://bookings/generate_pdf/{booking}")
    }

    fn download_ticket(&self, _session: &Session, booking: BookingId) -> BackendFuture<Vec<u8>> {
        self.respond(Endpoint::Ticket, format!("%PDF-1.4 ticket {booking}").into_bytes())
    }
}
