//! REST client for the booking backend

use super::wire::ErrorBody;
use super::{
    AuthBackend, AuthResponse, BackendFuture, BookingBackend, BookingRequest, BookingResponse,
    CatalogBackend, Credentials, Registration,
};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::types::{BookingId, Bus, Route, Schedule, SearchParams, Session};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Booking backend client
///
/// Holds no credentials: authenticated calls take the [`Session`] explicitly.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientSetup`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::ClientSetup(e.to_string()))?;

        Ok(Self::with_client(client, &config.base_url))
    }

    /// Create a client around an existing `reqwest::Client`
    #[must_use]
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `POST /login`
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, rejected credentials, or parsing failures.
    #[tracing::instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let request = self.client.post(self.url("login")).json(credentials);
        Self::json(Self::send(request).await?).await
    }

    /// `POST /register`
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, validation failures, or parsing failures.
    #[tracing::instrument(skip_all, fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let request = self.client.post(self.url("register")).json(registration);
        Self::json(Self::send(request).await?).await
    }

    /// `POST /logout`
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or a rejected token.
    #[tracing::instrument(skip_all)]
    pub async fn logout(&self, session: &Session) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url("logout"))
            .bearer_auth(&session.token);
        Self::send(request).await.map(|_| ())
    }

    /// `GET /routes`
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or parsing failures.
    pub async fn routes(&self) -> Result<Vec<Route>, ApiError> {
        self.get_json("routes", &[]).await
    }

    /// `GET /buses`
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or parsing failures.
    pub async fn buses(&self) -> Result<Vec<Bus>, ApiError> {
        self.get_json("buses", &[]).await
    }

    /// `GET /schedules?origin=&destination=&date=`
    ///
    /// `date` is omitted when the search has none.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or parsing failures.
    #[tracing::instrument(skip_all, fields(origin = %query.origin, destination = %query.destination))]
    pub async fn schedules(&self, query: &SearchParams) -> Result<Vec<Schedule>, ApiError> {
        let mut params = vec![
            ("origin", query.origin.trim().to_string()),
            ("destination", query.destination.trim().to_string()),
        ];
        if let Some(date) = query.date {
            params.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        self.get_json("schedules", &params).await
    }

    /// `POST /bookings`
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, an expired session, or parsing failures.
    #[tracing::instrument(skip_all, fields(schedule_id = %request.schedule_id))]
    pub async fn create_booking(
        &self,
        session: &Session,
        request: &BookingRequest,
    ) -> Result<BookingResponse, ApiError> {
        let builder = self
            .client
            .post(self.url("bookings"))
            .bearer_auth(&session.token)
            .json(request);
        Self::json(Self::send(builder).await?).await
    }

    /// URL of the ticket PDF for a confirmed booking
    #[must_use]
    pub fn ticket_url(&self, booking: BookingId) -> String {
        self.url(&format!("bookings/generate_pdf/{booking}"))
    }

    /// `GET /bookings/generate_pdf/:id`
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or a missing booking.
    pub async fn download_ticket(&self, session: &Session, booking: BookingId) -> Result<Vec<u8>, ApiError> {
        let request = self
            .client
            .get(self.ticket_url(booking))
            .bearer_auth(&session.token);
        let response = Self::send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self.client.get(self.url(path)).query(query);
        Self::json(Self::send(request).await?).await
    }

    /// Send a request and map non-success statuses to [`ApiError`]
    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);

        tracing::debug!(status = status.as_u16(), ?message, "Backend returned an error");

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized { message }),
            status => Err(ApiError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))
    }
}

impl AuthBackend for ApiClient {
    fn login(&self, credentials: Credentials) -> BackendFuture<AuthResponse> {
        let client = self.clone();
        Box::pin(async move { client.login(&credentials).await })
    }

    fn register(&self, registration: Registration) -> BackendFuture<AuthResponse> {
        let client = self.clone();
        Box::pin(async move { client.register(&registration).await })
    }

    fn logout(&self, session: &Session) -> BackendFuture<()> {
        let client = self.clone();
        let session = session.clone();
        Box::pin(async move { client.logout(&session).await })
    }
}

impl CatalogBackend for ApiClient {
    fn routes(&self) -> BackendFuture<Vec<Route>> {
        let client = self.clone();
        Box::pin(async move { client.routes().await })
    }

    fn buses(&self) -> BackendFuture<Vec<Bus>> {
        let client = self.clone();
        Box::pin(async move { client.buses().await })
    }

    fn schedules(&self, query: &SearchParams) -> BackendFuture<Vec<Schedule>> {
        let client = self.clone();
        let query = query.clone();
        Box::pin(async move { client.schedules(&query).await })
    }
}

impl BookingBackend for ApiClient {
    fn create_booking(&self, session: &Session, request: BookingRequest) -> BackendFuture<BookingResponse> {
        let client = self.clone();
        let session = session.clone();
        Box::pin(async move { client.create_booking(&session, &request).await })
    }

    fn ticket_url(&self, booking: BookingId) -> String {
        Self::ticket_url(self, booking)
    }

    fn download_ticket(&self, session: &Session, booking: BookingId) -> BackendFuture<Vec<u8>> {
        let client = self.clone();
        let session = session.clone();
        Box::pin(async move { client.download_ticket(&session, booking).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_url_joins_base_and_id() {
        let client = ApiClient::with_client(Client::new(), "http://localhost:8000/api/");
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(
            client.ticket_url(BookingId::new(17)),
            "http://localhost:8000/api/bookings/generate_pdf/17"
        );
    }
}
