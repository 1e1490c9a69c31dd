//! # Busline
//!
//! Client core for booking intercity bus tickets.
//!
//! The client is a set of reducers driven by a [`busline_runtime::Store`]:
//!
//! - [`reducers::auth`]: restore, login, register and logout
//! - [`reducers::catalog`]: routes, buses and the origin/destination pick lists
//! - [`reducers::booking`]: search, bus selection, seat map and booking draft
//! - [`reducers::checkout`]: payment method, booking creation and e-ticket
//!
//! Every side effect goes through [`environment::AppEnvironment`], so the same
//! reducers run against the REST backend ([`api::ApiClient`]) or fully offline
//! ([`api::InMemoryBackend`] over the [`demo`] catalog).
//!
//! ## Example
//!
//! ```no_run
//! use busline::api::InMemoryBackend;
//! use busline::environment::AppEnvironment;
//! use busline::inventory::RandomSeatInventory;
//! use busline::reducers::{AppAction, AppReducer, AppState};
//! use busline::types::SearchParams;
//! use busline::demo;
//! use busline_runtime::Store;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let backend = InMemoryBackend::new(demo::schedules(), demo::user());
//! let inventory = Arc::new(RandomSeatInventory::new(40, 0.7)?);
//! let store = Store::new(
//!     AppState::default(),
//!     AppReducer::new(),
//!     AppEnvironment::offline(backend, inventory),
//! );
//!
//! for action in AppAction::search(SearchParams::new("Kampala", "Gulu")) {
//!     store.send_cascading(action).await?.wait().await;
//! }
//! let found = store.state(|s| s.booking.found.len()).await;
//! # let _ = found;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod demo;
pub mod environment;
pub mod error;
pub mod inventory;
pub mod notify;
pub mod references;
pub mod reducers;
pub mod search;
pub mod storage;
pub mod types;

pub use config::Config;
pub use environment::AppEnvironment;
pub use error::{ApiError, ConfigError, InventoryError, StorageError};
pub use reducers::{AppAction, AppReducer, AppState};
