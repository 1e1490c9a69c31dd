//! Payment and booking confirmation

use crate::api::BookingRequest;
use crate::environment::AppEnvironment;
use crate::notify::{Notice, notify};
use crate::types::{BookingDraft, BookingId, ConfirmedBooking, PaymentMethod, Session};
use busline_core::{SmallVec, async_effect, effect::Effect, reducer::Reducer, smallvec};

/// Checkout slice
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckoutState {
    /// Chosen payment method
    pub payment_method: PaymentMethod,
    /// A booking request is in flight
    pub submitting: bool,
    /// Booking accepted by the backend
    pub confirmed: Option<ConfirmedBooking>,
    /// Where the ticket PDF can be fetched
    pub ticket_url: Option<String>,
    /// Downloaded ticket PDF
    pub ticket_pdf: Option<Vec<u8>>,
    /// Last failure message
    pub last_error: Option<String>,
}

/// Checkout actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutAction {
    // Commands
    /// Pick how to pay
    SelectPaymentMethod(PaymentMethod),
    /// Pay for `draft`; ignored while a submission is in flight
    Submit {
        /// Signed-in session
        session: Session,
        /// Draft to pay for
        draft: BookingDraft,
    },
    /// Fetch the ticket PDF of the confirmed booking
    DownloadTicket {
        /// Signed-in session
        session: Session,
    },

    // Events
    /// Backend accepted the booking
    Confirmed {
        /// Stored booking
        booking: ConfirmedBooking,
        /// Backend status line
        message: Option<String>,
    },
    /// Backend rejected the booking
    Failed {
        /// User-facing message
        error: String,
    },
    /// Ticket PDF fetched
    TicketDownloaded {
        /// Booking the ticket belongs to
        booking_id: BookingId,
        /// Ticket bytes, or a user-facing message
        result: Result<Vec<u8>, String>,
    },
}

/// Reducer for the checkout slice
#[derive(Clone, Debug, Default)]
pub struct CheckoutReducer;

impl CheckoutReducer {
    /// Creates a new `CheckoutReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CheckoutReducer {
    type State = CheckoutState;
    type Action = CheckoutAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            CheckoutAction::SelectPaymentMethod(method) => {
                state.payment_method = method;
                SmallVec::new()
            },

            CheckoutAction::Submit { session, draft } => {
                if state.submitting {
                    tracing::debug!(booking_id = %draft.booking_id, "Checkout already in flight, ignoring submit");
                    return SmallVec::new();
                }

                state.submitting = true;
                state.last_error = None;
                state.confirmed = None;
                state.ticket_url = None;
                state.ticket_pdf = None;

                let request = BookingRequest {
                    schedule_id: draft.bus_id,
                    payment_method: state.payment_method,
                    price: draft.total_amount,
                };
                let bookings = env.bookings.clone();
                tracing::debug!(booking_id = %draft.booking_id, total = %draft.total_amount, "Submitting booking");

                smallvec![async_effect! {
                    match bookings.create_booking(&session, request).await {
                        Ok(response) => Some(CheckoutAction::Confirmed {
                            booking: response.booking,
                            message: response.message,
                        }),
                        Err(error) => Some(CheckoutAction::Failed {
                            error: error.user_message("Failed to create booking"),
                        }),
                    }
                }]
            },

            CheckoutAction::DownloadTicket { session } => {
                let Some(booking_id) = state.confirmed.as_ref().map(|b| b.id) else {
                    return smallvec![notify(
                        &env.notifier,
                        Notice::error("No ticket", "There is no confirmed booking to download")
                    )];
                };

                let bookings = env.bookings.clone();
                smallvec![async_effect! {
                    let result = bookings
                        .download_ticket(&session, booking_id)
                        .await
                        .map_err(|e| e.user_message("Could not download ticket"));
                    Some(CheckoutAction::TicketDownloaded { booking_id, result })
                }]
            },

            // ========== Events ==========
            CheckoutAction::Confirmed { booking, message } => {
                tracing::info!(
                    booking_id = %booking.id,
                    reference = booking.booking_reference.as_deref().unwrap_or_default(),
                    message = message.as_deref().unwrap_or_default(),
                    "Booking confirmed"
                );
                state.submitting = false;
                state.ticket_url = Some(env.bookings.ticket_url(booking.id));
                state.confirmed = Some(booking);

                smallvec![notify(
                    &env.notifier,
                    Notice::success("Booking Confirmed!", "Check your email for your e-ticket.")
                )]
            },

            CheckoutAction::Failed { error } => {
                tracing::warn!(%error, "Booking failed");
                state.submitting = false;
                state.last_error = Some(error.clone());
                smallvec![notify(&env.notifier, Notice::error("Booking Failed", error))]
            },

            CheckoutAction::TicketDownloaded { booking_id, result } => match result {
                Ok(pdf) => {
                    tracing::debug!(%booking_id, bytes = pdf.len(), "Ticket downloaded");
                    state.ticket_pdf = Some(pdf);
                    SmallVec::new()
                },
                Err(error) => {
                    state.last_error = Some(error.clone());
                    smallvec![notify(&env.notifier, Notice::error("Ticket Error", error))]
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BookingBackend, Endpoint};
    use crate::error::ApiError;
    use crate::reducers::fixtures::{draft, session, test_env};
    use crate::types::{Money, ScheduleId};
    use busline_testing::{ReducerTest, assertions, helpers};

    #[test]
    fn submit_while_in_flight_is_ignored() {
        let (env, _, _) = test_env();

        ReducerTest::new(CheckoutReducer::new())
            .with_env(env)
            .given_state(CheckoutState {
                submitting: true,
                ..CheckoutState::default()
            })
            .when_action(CheckoutAction::Submit {
                session: session(),
                draft: draft(),
            })
            .then_state(|state| assert!(state.submitting))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn submit_posts_schedule_method_and_total() {
        let (env, _, backend) = test_env();
        let mut state = CheckoutState::default();

        let _ = CheckoutReducer.reduce(&mut state, CheckoutAction::SelectPaymentMethod(PaymentMethod::Momo), &env);
        let effects = CheckoutReducer.reduce(
            &mut state,
            CheckoutAction::Submit {
                session: session(),
                draft: draft(),
            },
            &env,
        );
        assert!(state.submitting);

        let actions = helpers::collect_actions(effects.into_vec()).await;
        assert!(matches!(actions.as_slice(), [CheckoutAction::Confirmed { .. }]));

        let requests = backend.booking_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].schedule_id, ScheduleId::new(1));
        assert_eq!(requests[0].payment_method, PaymentMethod::Momo);
        assert_eq!(requests[0].price, Money::from_cents(9_000_000));
    }

    #[tokio::test]
    async fn confirmation_records_ticket_url_and_notifies() {
        let (env, notices, backend) = test_env();
        let mut state = CheckoutState {
            submitting: true,
            ..CheckoutState::default()
        };

        let response = backend.create_booking(&session(), BookingRequest {
            schedule_id: ScheduleId::new(1),
            payment_method: PaymentMethod::Card,
            price: Money::from_cents(4_500_000),
        });
        let booking = response.await.unwrap().booking;
        let booking_id = booking.id;

        let effects = CheckoutReducer.reduce(
            &mut state,
            CheckoutAction::Confirmed { booking, message: None },
            &env,
        );
        let _ = helpers::collect_actions(effects.into_vec()).await;

        assert!(!state.submitting);
        assert_eq!(
            state.ticket_url,
            Some(format!("memory://bookings/generate_pdf/{booking_id}"))
        );
        assert_eq!(notices.titles(), vec!["Booking Confirmed!".to_string()]);
    }

    #[tokio::test]
    async fn backend_message_is_surfaced_on_failure() {
        let (env, notices, backend) = test_env();
        backend.fail(
            Endpoint::Bookings,
            ApiError::Api {
                status: 422,
                message: Some("Schedule is fully booked".into()),
            },
        );
        let mut state = CheckoutState::default();

        let effects = CheckoutReducer.reduce(
            &mut state,
            CheckoutAction::Submit {
                session: session(),
                draft: draft(),
            },
            &env,
        );
        for action in helpers::collect_actions(effects.into_vec()).await {
            let effects = CheckoutReducer.reduce(&mut state, action, &env);
            let _ = helpers::collect_actions(effects.into_vec()).await;
        }

        assert!(!state.submitting);
        assert!(state.confirmed.is_none());
        assert_eq!(state.last_error.as_deref(), Some("Schedule is fully booked"));
        assert_eq!(notices.notices()[0].description, "Schedule is fully booked");
    }

    #[test]
    fn download_without_confirmation_is_rejected() {
        let (env, _, _) = test_env();

        ReducerTest::new(CheckoutReducer::new())
            .with_env(env)
            .given_state(CheckoutState::default())
            .when_action(CheckoutAction::DownloadTicket { session: session() })
            .then_state(|state| assert!(state.ticket_pdf.is_none()))
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }
}
