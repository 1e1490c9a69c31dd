// REST client against a wiremock backend.

use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, body_partial_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use busline::api::{ApiClient, BookingRequest, Credentials};
use busline::types::{BookingId, Money, PaymentMethod, Role, ScheduleId, SearchParams, Session, User, UserId};
use busline::ApiError;
use chrono::NaiveDate;

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::with_client(reqwest::Client::new(), &format!("{}/api/", server.uri()));
    (server, client)
}

fn session() -> Session {
    Session {
        token: "secret-token".into(),
        user: User {
            id: UserId::new(9),
            name: "Amina".into(),
            email: "amina@example.com".into(),
            phone: None,
            role: Some(Role::Customer),
        },
    }
}

fn schedule_json(id: u64, price: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "departure_time": "2025-03-14 07:00:00",
        "arrival_time": "2025-03-14 13:00:00",
        "status": "scheduled",
        "bus": {
            "id": 4,
            "name": "Gateway Express",
            "number_plate": "UAX 123A",
            "total_seats": 40,
            "amenities": null,
            "bus_pic": "gateway.jpg"
        },
        "route": {
            "origin": "Kampala",
            "destination": "Gulu",
            "base_price": price
        }
    })
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn login_returns_user_and_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({ "email": "amina@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc123",
            "user": { "id": 9, "name": "Amina", "email": "amina@example.com", "is_role": "customer" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client
        .login(&Credentials {
            email: "amina@example.com".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();

    let session = Session::from(response);
    assert_eq!(session.token, "abc123");
    assert_eq!(session.user.id, UserId::new(9));
    assert_eq!(session.user.role, Some(Role::Customer));
}

#[tokio::test]
async fn schedules_query_includes_date_when_set() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/schedules"))
        .and(query_param("origin", "Kampala"))
        .and(query_param("destination", "Gulu"))
        .and(query_param("date", "2025-03-14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            schedule_json(1, json!("45000.00")),
            schedule_json(2, json!(38000)),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let schedules = client
        .schedules(&SearchParams::new("Kampala", "Gulu").on(date))
        .await
        .unwrap();

    assert_eq!(schedules.len(), 2);
    assert_eq!(schedules[0].route.base_price, Money::from_cents(4_500_000));
    assert_eq!(schedules[1].route.base_price, Money::from_cents(3_800_000));
    assert_eq!(schedules[0].bus.bus_pic.as_deref(), Some("gateway.jpg"));
}

#[tokio::test]
async fn schedules_query_omits_missing_date() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/schedules"))
        .and(query_param_is_missing("date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let schedules = client.schedules(&SearchParams::new("Kampala", "Gulu")).await.unwrap();
    assert!(schedules.is_empty());
}

#[tokio::test]
async fn schedules_query_trims_towns() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/schedules"))
        .and(query_param("origin", "Kampala"))
        .and(query_param("destination", "Gulu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client.schedules(&SearchParams::new(" Kampala ", "Gulu\n")).await.unwrap();
}

#[tokio::test]
async fn create_booking_sends_bearer_and_decimal_price() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .and(bearer_token("secret-token"))
        .and(body_partial_json(json!({
            "schedule_id": 1,
            "payment_method": "momo",
            "price": "90000.00"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Booking created successfully",
            "booking": {
                "id": 31,
                "user_id": 9,
                "schedule_id": 1,
                "booking_reference": "BK-000031",
                "price": "90000.00",
                "status": "confirmed",
                "payment_method": "momo",
                "payment_status": "paid"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client
        .create_booking(
            &session(),
            &BookingRequest {
                schedule_id: ScheduleId::new(1),
                payment_method: PaymentMethod::Momo,
                price: Money::from_cents(9_000_000),
            },
        )
        .await
        .unwrap();

    assert_eq!(response.message.as_deref(), Some("Booking created successfully"));
    assert_eq!(response.booking.id, BookingId::new(31));
    assert_eq!(response.booking.price, Money::from_cents(9_000_000));
    assert_eq!(response.booking.payment_method, Some(PaymentMethod::Momo));
}

#[tokio::test]
async fn download_ticket_returns_pdf_bytes() {
    let (server, client) = setup().await;
    let pdf = b"%PDF-1.4 ticket".to_vec();

    Mock::given(method("GET"))
        .and(path("/api/bookings/generate_pdf/31"))
        .and(bearer_token("secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf.clone()))
        .mount(&server)
        .await;

    let bytes = client.download_ticket(&session(), BookingId::new(31)).await.unwrap();
    assert_eq!(bytes, pdf);
    assert_eq!(
        client.ticket_url(BookingId::new(31)),
        format!("{}/api/bookings/generate_pdf/31", server.uri())
    );
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn unauthorized_carries_backend_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })))
        .mount(&server)
        .await;

    let err = client
        .login(&Credentials {
            email: "amina@example.com".into(),
            password: "nope".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Unauthorized {
            message: Some("Invalid credentials".into())
        }
    );
    assert_eq!(err.user_message("Login failed"), "Invalid credentials");
}

#[tokio::test]
async fn server_error_without_body_falls_back() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/routes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.routes().await.unwrap_err();
    assert_eq!(err, ApiError::Api { status: 500, message: None });
    assert_eq!(err.user_message("Failed to load routes"), "Failed to load routes");
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/buses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let err = client.buses().await.unwrap_err();
    assert!(matches!(err, ApiError::ResponseParseFailed(_)));
}

#[tokio::test]
async fn logout_sends_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .and(bearer_token("secret-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.logout(&session()).await.unwrap();
}
