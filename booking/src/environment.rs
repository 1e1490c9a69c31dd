//! Injected dependencies shared by every reducer

use crate::api::{ApiClient, AuthBackend, BookingBackend, CatalogBackend, InMemoryBackend};
use crate::config::Config;
use crate::demo;
use crate::inventory::{RandomSeatInventory, SeatInventory};
use crate::notify::{Notifier, TracingNotifier};
use crate::references::RandomReferences;
use crate::storage::{FileStorage, SessionStore};
use busline_core::environment::{Clock, ReferenceGenerator, SystemClock};
use std::sync::Arc;

/// Environment dependencies for the booking reducers
#[derive(Clone)]
pub struct AppEnvironment {
    /// Login, registration, logout
    pub auth: Arc<dyn AuthBackend>,
    /// Routes, buses, schedules
    pub catalog: Arc<dyn CatalogBackend>,
    /// Booking creation and tickets
    pub bookings: Arc<dyn BookingBackend>,
    /// Seat map provider
    pub inventory: Arc<dyn SeatInventory>,
    /// Persisted session and bus snapshot
    pub sessions: SessionStore,
    /// Notice channel
    pub notifier: Arc<dyn Notifier>,
    /// Clock for booking and travel dates
    pub clock: Arc<dyn Clock>,
    /// Booking reference generator
    pub references: Arc<dyn ReferenceGenerator>,
    /// Base URL for bus pictures
    pub asset_url: String,
}

impl AppEnvironment {
    /// Production wiring: REST backend, file storage, random seats, log notices
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client, storage directory or seat inventory cannot be set up.
    pub fn production(config: &Config) -> anyhow::Result<Self> {
        let api = Arc::new(ApiClient::new(&config.api)?);
        let storage = Arc::new(FileStorage::open(&config.storage.dir)?);
        let inventory = Arc::new(RandomSeatInventory::from_config(&config.seats)?);

        Ok(Self {
            auth: api.clone(),
            catalog: api.clone(),
            bookings: api,
            inventory,
            sessions: SessionStore::new(storage),
            notifier: Arc::new(TracingNotifier),
            clock: Arc::new(SystemClock),
            references: Arc::new(RandomReferences),
            asset_url: config.api.asset_url.clone(),
        })
    }

    /// Offline wiring: one in-memory backend behind every trait, in-memory storage
    #[must_use]
    pub fn offline(backend: InMemoryBackend, inventory: Arc<dyn SeatInventory>) -> Self {
        let backend = Arc::new(backend);
        Self {
            auth: backend.clone(),
            catalog: backend.clone(),
            bookings: backend,
            inventory,
            sessions: SessionStore::in_memory(),
            notifier: Arc::new(TracingNotifier),
            clock: Arc::new(SystemClock),
            references: Arc::new(RandomReferences),
            asset_url: demo::ASSET_URL.to_string(),
        }
    }
}
