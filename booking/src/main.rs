//! Command-line front end for the booking client.
//!
//! ```text
//! busline routes
//! busline buses
//! busline search --from Kampala --to Gulu --date 2025-03-14
//! busline book --from Kampala --to Gulu --seats 2 --payment momo --ticket ticket.pdf
//! busline logout
//! ```
//!
//! `--offline` swaps the REST backend for the built-in demo catalog.

use anyhow::{Context, bail};
use busline::api::{Credentials, InMemoryBackend};
use busline::inventory::RandomSeatInventory;
use busline::reducers::{
    AppAction, AppReducer, AppState, AuthAction, BookingAction, CatalogAction, CheckoutAction,
};
use busline::types::{BusListing, Passenger, PaymentMethod, ScheduleId, SearchParams, Session};
use busline::{AppEnvironment, Config, demo};
use busline_runtime::Store;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

type AppStore = Store<AppState, AppAction, AppEnvironment, AppReducer>;

#[derive(Debug, Parser)]
#[command(name = "busline", version, about = "Search and book intercity bus tickets")]
struct Cli {
    /// Use the built-in demo catalog instead of the REST backend
    #[arg(long, global = true)]
    offline: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the towns buses leave from and go to
    Routes,
    /// List the fleet
    Buses,
    /// Find departures between two towns
    Search(SearchArgs),
    /// Book seats on a departure and pay for them
    Book(BookArgs),
    /// Sign out and forget the stored session
    Logout,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Departure town
    #[arg(long)]
    from: String,
    /// Arrival town
    #[arg(long)]
    to: String,
    /// Travel date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
struct BookArgs {
    #[command(flatten)]
    search: SearchArgs,

    /// Departure to book; defaults to the first match
    #[arg(long)]
    bus: Option<u64>,

    /// Number of seats
    #[arg(long, default_value_t = 1)]
    seats: usize,

    /// card, momo or paypal
    #[arg(long, default_value = "card")]
    payment: PaymentMethod,

    /// Passenger name; defaults to the signed-in user
    #[arg(long)]
    name: Option<String>,
    /// Passenger email; defaults to the signed-in user
    #[arg(long)]
    passenger_email: Option<String>,
    /// Passenger phone; defaults to the signed-in user
    #[arg(long)]
    phone: Option<String>,

    /// Login email, used when no session is stored
    #[arg(long, env = "BUSLINE_EMAIL")]
    email: Option<String>,
    /// Login password, used when no session is stored
    #[arg(long, env = "BUSLINE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Save the e-ticket PDF here
    #[arg(long)]
    ticket: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = Config::from_env();
    init_tracing(&config.log_level, cli.verbose);
    config.validate().context("invalid configuration")?;

    let environment = if cli.offline {
        tracing::info!("Running against the offline demo catalog");
        let inventory = RandomSeatInventory::from_config(&config.seats)?;
        AppEnvironment::offline(
            InMemoryBackend::new(demo::schedules(), demo::user()),
            Arc::new(inventory),
        )
    } else {
        AppEnvironment::production(&config)?
    };

    let settle = Duration::from_secs(config.api.timeout_secs.saturating_add(5));
    let store = Store::new(AppState::default(), AppReducer::new(), environment);
    dispatch(&store, AppAction::Auth(AuthAction::Restore), settle).await?;

    let result = match cli.command {
        Command::Routes => routes(&store, settle).await,
        Command::Buses => buses(&store, settle).await,
        Command::Search(args) => search(&store, &args, settle).await.map(|found| {
            print_listings(&found);
        }),
        Command::Book(args) => book(&store, args, cli.offline, settle).await,
        Command::Logout => logout(&store, settle).await,
    };

    store
        .shutdown(Duration::from_secs(5))
        .await
        .context("store did not shut down cleanly")?;
    result
}

fn init_tracing(default_filter: &str, verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        1 => EnvFilter::new("busline=debug"),
        _ => EnvFilter::new("busline=trace,busline_runtime=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Send `action` and wait for every follow-up action it causes
async fn dispatch(store: &AppStore, action: AppAction, settle: Duration) -> anyhow::Result<()> {
    store
        .send_cascading(action)
        .await?
        .wait_with_timeout(settle)
        .await?;
    Ok(())
}

async fn routes(store: &AppStore, settle: Duration) -> anyhow::Result<()> {
    dispatch(store, AppAction::Catalog(CatalogAction::LoadRoutes), settle).await?;
    let catalog = store.state(|s| s.catalog.clone()).await;
    if let Some(error) = catalog.last_error {
        bail!(error);
    }

    println!("From: {}", catalog.origins.join(", "));
    println!("To:   {}", catalog.destinations.join(", "));
    Ok(())
}

async fn buses(store: &AppStore, settle: Duration) -> anyhow::Result<()> {
    dispatch(store, AppAction::Catalog(CatalogAction::LoadBuses), settle).await?;
    let catalog = store.state(|s| s.catalog.clone()).await;
    if let Some(error) = catalog.last_error {
        bail!(error);
    }

    for bus in &catalog.buses {
        println!(
            "{:<20} {:<10} {:>3} seats  {}",
            bus.name,
            bus.number_plate,
            bus.total_seats,
            bus.amenities.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

async fn search(store: &AppStore, args: &SearchArgs, settle: Duration) -> anyhow::Result<Vec<BusListing>> {
    let mut params = SearchParams::new(&args.from, &args.to);
    if let Some(date) = args.date {
        params = params.on(date);
    }

    for action in AppAction::search(params) {
        dispatch(store, action, settle).await?;
    }

    let booking = store.state(|s| s.booking.clone()).await;
    if let Some(error) = booking.last_error {
        bail!(error);
    }
    Ok(booking.found)
}

fn print_listings(found: &[BusListing]) {
    if found.is_empty() {
        println!("No buses found for this route.");
        return;
    }
    for bus in found {
        println!(
            "#{:<4} {} -> {}  {}  {}  {} ({})  {} seats",
            bus.id.get(),
            bus.origin,
            bus.destination,
            bus.departure_time,
            bus.price,
            bus.company_name,
            bus.bus_number,
            bus.available_seats,
        );
    }
}

async fn sign_in(store: &AppStore, args: &BookArgs, offline: bool, settle: Duration) -> anyhow::Result<Session> {
    if let Some(session) = store.state(|s| s.auth.session.clone()).await {
        return Ok(session);
    }

    let credentials = match (&args.email, &args.password) {
        (Some(email), Some(password)) => Credentials {
            email: email.clone(),
            password: password.clone(),
        },
        _ if offline => Credentials {
            email: demo::user().email,
            password: "demo".to_string(),
        },
        _ => bail!("Not signed in: pass --email and --password (or set BUSLINE_EMAIL / BUSLINE_PASSWORD)"),
    };

    dispatch(store, AppAction::Auth(AuthAction::Login { credentials }), settle).await?;
    let auth = store.state(|s| s.auth.clone()).await;
    match auth.session {
        Some(session) => Ok(session),
        None => bail!(auth.last_error.unwrap_or_else(|| "Login failed".to_string())),
    }
}

async fn book(store: &AppStore, args: BookArgs, offline: bool, settle: Duration) -> anyhow::Result<()> {
    let session = sign_in(store, &args, offline, settle).await?;

    let found = search(store, &args.search, settle).await?;
    let listing = match args.bus {
        Some(id) => found.into_iter().find(|b| b.id == ScheduleId::new(id)),
        None => found.into_iter().next(),
    }
    .context("No buses found for this route")?;
    let bus_id = listing.id;

    dispatch(store, AppAction::Booking(BookingAction::SelectBus(listing)), settle).await?;
    dispatch(store, AppAction::load_seats(bus_id), settle).await?;

    let free: Vec<_> = store
        .state(|s| {
            s.booking
                .seats
                .iter()
                .filter(|seat| seat.is_available)
                .map(|seat| seat.id.clone())
                .collect()
        })
        .await;
    if free.len() < args.seats {
        bail!("Only {} seats are available on bus #{bus_id}", free.len());
    }
    for seat in free.into_iter().take(args.seats) {
        dispatch(store, AppAction::toggle_seat(seat), settle).await?;
    }

    let passenger = Passenger {
        name: args.name.unwrap_or_else(|| session.user.name.clone()),
        email: args.passenger_email.unwrap_or_else(|| session.user.email.clone()),
        phone: args
            .phone
            .or_else(|| session.user.phone.clone())
            .unwrap_or_default(),
    };
    dispatch(store, AppAction::create_booking(passenger), settle).await?;

    let state = store.state(Clone::clone).await;
    let Some(draft) = state.booking.draft.clone() else {
        bail!(state.booking.last_error.unwrap_or_else(|| "Could not create booking".to_string()));
    };
    println!(
        "Draft {}: seats {} on bus #{}, total {}",
        draft.booking_id,
        draft.selected_seats.join(", "),
        draft.bus_id,
        draft.total_amount,
    );

    dispatch(
        store,
        AppAction::Checkout(CheckoutAction::SelectPaymentMethod(args.payment)),
        settle,
    )
    .await?;
    let submit = state.checkout_action().context("Not signed in")?;
    dispatch(store, submit, settle).await?;

    let checkout = store.state(|s| s.checkout.clone()).await;
    let Some(confirmed) = checkout.confirmed else {
        bail!(checkout.last_error.unwrap_or_else(|| "Failed to create booking".to_string()));
    };
    println!(
        "Confirmed booking #{} ({}), paid {} by {}",
        confirmed.id,
        confirmed.booking_reference.as_deref().unwrap_or("no reference"),
        confirmed.price,
        args.payment,
    );
    if let Some(url) = &checkout.ticket_url {
        println!("E-ticket: {url}");
    }

    if let Some(path) = args.ticket {
        dispatch(store, AppAction::Checkout(CheckoutAction::DownloadTicket { session }), settle).await?;
        let checkout = store.state(|s| s.checkout.clone()).await;
        let Some(pdf) = checkout.ticket_pdf else {
            bail!(checkout.last_error.unwrap_or_else(|| "Could not download ticket".to_string()));
        };
        tokio::fs::write(&path, pdf)
            .await
            .with_context(|| format!("writing ticket to {}", path.display()))?;
        println!("Saved ticket to {}", path.display());
    }

    Ok(())
}

async fn logout(store: &AppStore, settle: Duration) -> anyhow::Result<()> {
    if !store.state(|s| s.auth.is_authenticated()).await {
        println!("Not signed in.");
        return Ok(());
    }

    dispatch(store, AppAction::Auth(AuthAction::Logout), settle).await?;
    match store.state(|s| s.auth.last_error.clone()).await {
        Some(error) => println!("Signed out locally ({error})."),
        None => println!("Signed out."),
    }
    Ok(())
}
