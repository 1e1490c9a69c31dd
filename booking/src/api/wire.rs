//! Request and response bodies exchanged with the backend

use crate::types::{ConfirmedBooking, Money, PaymentMethod, ScheduleId, Session, User, decimal};
use serde::{Deserialize, Serialize};

/// `POST /login`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email
    pub email: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Both fields must be filled in
    ///
    /// # Errors
    ///
    /// Returns the user-facing message when either field is blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err("Email and password are required".to_string());
        }
        Ok(())
    }
}

/// `POST /register`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Password
    pub password: String,
    /// Repeated password
    pub password_confirmation: String,
}

impl Registration {
    /// Checked locally before anything is sent
    ///
    /// # Errors
    ///
    /// Returns the user-facing message for blank required fields or a
    /// password mismatch.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty() {
            return Err("Name, email and password are required".to_string());
        }
        if self.password != self.password_confirmation {
            return Err("Passwords do not match".to_string());
        }
        Ok(())
    }
}

/// Body returned by both `/login` and `/register`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Signed-in user
    pub user: User,
    /// Bearer token
    pub token: String,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Self {
            token: response.token,
            user: response.user,
        }
    }
}

/// `POST /bookings`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Departure being booked
    pub schedule_id: ScheduleId,
    /// How the customer pays
    pub payment_method: PaymentMethod,
    /// Total for all selected seats
    #[serde(with = "decimal")]
    pub price: Money,
}

/// Body returned by `POST /bookings`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingResponse {
    /// Human-readable status line
    #[serde(default)]
    pub message: Option<String>,
    /// The stored booking
    pub booking: ConfirmedBooking,
}

/// Error body; only `message` is read
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
